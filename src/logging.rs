use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber for the binaries.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Diagnostics go to
/// stderr so stdout carries only the report. Calling it twice is harmless.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

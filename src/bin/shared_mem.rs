use anyhow::{bail, Context, Result};
use tracing::info;

use csa_bench::config::{RunConfig, CONFIG_PATH};
use csa_bench::gpu::{open_default_backend, ComputeBackend};
use csa_bench::logging;
use csa_bench::report::Report;
use csa_bench::shared_mem::run_shared_mem;
use csa_bench::types::ExecutionSurface;

fn main() -> Result<()> {
    logging::init();

    let run = RunConfig::from_file(CONFIG_PATH).context("Failed to load run configuration")?;
    if run.surface != ExecutionSurface::Device {
        bail!("the shared-memory benchmark only runs on the device surface, got {}", run.surface);
    }

    let backend = open_default_backend(run.device_id)
        .with_context(|| format!("Failed to initialize device {}", run.device_id))?;
    info!("{}", backend.device_info()?);
    let report = run_shared_mem(&backend, run.shared_mem_repeats).context("Shared-memory benchmark failed")?;
    backend.finalize().context("Failed to finalize device")?;

    report.print();
    if let Some(path) = &run.report_json {
        report.write_json(path)?;
    }
    Ok(())
}

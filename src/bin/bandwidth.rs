use anyhow::{Context, Result};
use tracing::info;

use csa_bench::bandwidth::{run_bandwidth_on_device, run_bandwidth_on_host};
use csa_bench::config::{RunConfig, CONFIG_PATH};
use csa_bench::gpu::{open_default_backend, ComputeBackend};
use csa_bench::logging;
use csa_bench::report::Report;
use csa_bench::types::ExecutionSurface;

fn main() -> Result<()> {
    logging::init();

    let run = RunConfig::from_file(CONFIG_PATH).context("Failed to load run configuration")?;

    let report = match run.surface {
        ExecutionSurface::Device => {
            let backend = open_default_backend(run.device_id)
                .with_context(|| format!("Failed to initialize device {}", run.device_id))?;
            info!("{}", backend.device_info()?);
            let report = run_bandwidth_on_device(&backend, &run).context("Copy benchmark failed")?;
            backend.finalize().context("Failed to finalize device")?;
            report
        }
        surface => run_bandwidth_on_host(surface, &run).context("Copy benchmark failed")?,
    };

    report.print();
    if let Some(path) = &run.report_json {
        report.write_json(path)?;
    }
    Ok(())
}

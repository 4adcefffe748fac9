use anyhow::{Context, Result};
use tracing::info;

use csa_bench::config::{ProblemParams, RunConfig, CONFIG_PATH, PARAMS_PATH};
use csa_bench::gpu::{open_default_backend, ComputeBackend};
use csa_bench::harness::{run_csa_on_device, run_csa_on_host};
use csa_bench::logging;
use csa_bench::report::Report;
use csa_bench::types::ExecutionSurface;

fn main() -> Result<()> {
    logging::init();

    let params = ProblemParams::from_file(PARAMS_PATH).context("Failed to load problem description")?;
    let run = RunConfig::from_file(CONFIG_PATH).context("Failed to load run configuration")?;
    let problem = params.problem();

    let report = match run.surface {
        ExecutionSurface::Device => {
            let backend = open_default_backend(run.device_id)
                .with_context(|| format!("Failed to initialize device {}", run.device_id))?;
            info!("{}", backend.device_info()?);
            let report = run_csa_on_device(&backend, &problem, &run).context("Device benchmark failed")?;
            backend.finalize().context("Failed to finalize device")?;
            report
        }
        surface => run_csa_on_host(surface, &problem, &run).context("Host benchmark failed")?,
    };

    report.print();
    if let Some(path) = &run.report_json {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }
    Ok(())
}

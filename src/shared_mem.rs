//! Shared-memory round-trip benchmark
//!
//! A single work-group of one hardware lane group stores a known value into
//! local memory and loads it back many times. The final value of every lane is
//! checked on the host.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::gpu::constants::SHARED_MEM_MAGIC;
use crate::gpu::{ComputeBackend, LaunchConfig};
use crate::report::Report;
use crate::timer::StopWatch;
use crate::types::Real;

/// Bytes per terabyte as the report counts them
pub const TIB: f64 = 1024.0 * 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, Serialize)]
pub struct SharedMemReport {
    pub device: String,
    pub lane_size: usize,
    pub repeats: u32,
    /// Host wall clock around the launch and synchronize, launch overhead
    /// included
    pub elapsed_ns: f64,
    pub transferred_tb: f64,
    pub bandwidth_tb_s: f64,
    /// Lanes whose final value was not the stored one
    pub mismatches: Vec<usize>,
}

impl Report for SharedMemReport {
    fn lines(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Device", self.device.clone()),
            ("Lane size", self.lane_size.to_string()),
            ("Num. Repeats", self.repeats.to_string()),
            ("Wall time incl. launch, ms", format!("{:.3}", self.elapsed_ns / 1e6)),
            ("Transferred, TB", format!("{:e}", self.transferred_tb)),
            ("Bandwidth (wall clock), TB/s", format!("{:.6}", self.bandwidth_tb_s)),
            ("Mismatches", self.mismatches.len().to_string()),
        ]
    }
}

/// Bytes moved through local memory: one store and one load per lane and repeat
pub fn shared_mem_bytes(repeats: u32, lane_size: usize) -> f64 {
    repeats as f64 * lane_size as f64 * std::mem::size_of::<Real>() as f64 * 2.0
}

/// Lanes of `scratch` that do not hold `magic`
pub fn check_scratch(scratch: &[Real], magic: Real) -> Vec<usize> {
    let mismatches: Vec<usize> = scratch
        .iter()
        .enumerate()
        .filter(|(_, value)| **value != magic)
        .map(|(lane, _)| lane)
        .collect();
    for &lane in &mismatches {
        warn!(lane, value = scratch[lane], expected = magic, "shared-memory value mismatch");
    }
    mismatches
}

pub fn run_shared_mem<B: ComputeBackend>(backend: &B, repeats: u32) -> Result<SharedMemReport> {
    let lane_size = backend.lane_size();
    let mut scratch = backend.allocate(lane_size)?;
    let kernel = backend.shared_mem_kernel(&mut scratch, SHARED_MEM_MAGIC, repeats)?;
    let launch = LaunchConfig { grid: 1, block: lane_size };
    info!(lane_size, repeats, "shared-memory round trip");

    let mut watch = StopWatch::new();
    watch.start();
    backend.launch(&kernel, launch)?;
    backend.synchronize()?;
    watch.stop();

    let mut host = vec![0.0; lane_size];
    backend.copy_to_host(&mut host, &scratch)?;
    let mismatches = check_scratch(&host, SHARED_MEM_MAGIC);

    let transferred_tb = shared_mem_bytes(repeats, lane_size) / TIB;
    let seconds = watch.elapsed().as_secs_f64();
    Ok(SharedMemReport {
        device: format!("{:?}", backend.device_type()),
        lane_size,
        repeats,
        elapsed_ns: watch.elapsed_ns(),
        transferred_tb,
        bandwidth_tb_s: if seconds > 0.0 { transferred_tb / seconds } else { 0.0 },
        mismatches,
    })
}

//! Memory-copy bandwidth benchmark
//!
//! Copies one buffer of `allocate_mem` gigabytes into another, `num_repeats`
//! times. Every element is read once and written once per repeat.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::error::{BenchError, Result};
use crate::gpu::constants::COPY_BLOCK_SIZE;
use crate::gpu::memory::{bytes_from_gb, try_host_buffer};
use crate::gpu::{ComputeBackend, LaunchConfig};
use crate::harness::{seeded_buffer, SEED_A};
use crate::report::Report;
use crate::timer::{per_ns, StopWatch};
use crate::types::{ExecutionSurface, Real};

/// Values per rayon task on the parallel host surface
const HOST_COPY_CHUNK: usize = 1 << 16;

#[derive(Debug, Clone, Serialize)]
pub struct BandwidthReport {
    pub surface: ExecutionSurface,
    pub device: Option<String>,
    pub allocated_mem_gb: f64,
    pub num_elements: usize,
    pub num_repeats: usize,
    pub elapsed_ns: f64,
    pub avg_time_ns: f64,
    pub bandwidth_gb_s: f64,
    /// Whether the destination matched the source after the run
    pub verified: bool,
}

impl BandwidthReport {
    fn new(surface: ExecutionSurface, run: &RunConfig, num_elements: usize, elapsed_ns: f64, verified: bool) -> Self {
        let avg_time_ns = elapsed_ns / run.num_repeats as f64;
        let bytes = (2 * num_elements * std::mem::size_of::<Real>()) as f64;
        Self {
            surface,
            device: None,
            allocated_mem_gb: run.allocate_mem,
            num_elements,
            num_repeats: run.num_repeats,
            elapsed_ns,
            avg_time_ns,
            bandwidth_gb_s: per_ns(bytes, avg_time_ns),
            verified,
        }
    }
}

impl Report for BandwidthReport {
    fn lines(&self) -> Vec<(&'static str, String)> {
        let mut lines = Vec::new();
        if let Some(device) = &self.device {
            lines.push(("Device", device.clone()));
        }
        lines.extend([
            ("Surface", self.surface.to_string()),
            ("Allocated Mem, GB", format!("{}", self.allocated_mem_gb)),
            ("Time, ms", format!("{:.3}", self.elapsed_ns / 1e6)),
            ("Num. Repeats", self.num_repeats.to_string()),
            ("Num. Elements", self.num_elements.to_string()),
            ("Achieved bandwidth, GB/s", format!("{:.3}", self.bandwidth_gb_s)),
            ("Verified", self.verified.to_string()),
        ]);
        lines
    }
}

/// Values of one copy buffer: the whole budget, per buffer
pub fn copy_num_elements(allocate_mem: f64) -> Result<usize> {
    let num_elements = (bytes_from_gb(allocate_mem) / std::mem::size_of::<Real>() as u64) as usize;
    if num_elements == 0 {
        return Err(BenchError::config(
            "allocate_mem".to_string(),
            format!("{} GB does not hold a single value", allocate_mem),
        ));
    }
    Ok(num_elements)
}

fn zeroed(len: usize) -> Result<Vec<Real>> {
    let mut buffer = try_host_buffer(len)?;
    buffer.resize(len, 0.0);
    Ok(buffer)
}

fn par_copy(to: &mut [Real], from: &[Real]) {
    to.par_chunks_mut(HOST_COPY_CHUNK)
        .zip(from.par_chunks(HOST_COPY_CHUNK))
        .for_each(|(to, from)| to.copy_from_slice(from));
}

fn report_verification(verified: bool) {
    if !verified {
        warn!("destination buffer differs from the source after copying");
    }
}

/// Copy bandwidth of the host memory system, sequentially or on the rayon pool
pub fn run_bandwidth_on_host(surface: ExecutionSurface, run: &RunConfig) -> Result<BandwidthReport> {
    let copy: fn(&mut [Real], &[Real]) = match surface {
        ExecutionSurface::Sequential => <[Real]>::copy_from_slice,
        ExecutionSurface::Parallel => par_copy,
        ExecutionSurface::Device => {
            return Err(BenchError::invalid_parameter(
                "surface",
                "the device surface runs through run_bandwidth_on_device",
            ))
        }
    };

    let num_elements = copy_num_elements(run.allocate_mem)?;
    info!(num_elements, %surface, "host copy sized");
    let from = seeded_buffer(num_elements, SEED_A)?;
    let mut to = zeroed(num_elements)?;

    let mut watch = StopWatch::new();
    watch.start();
    for _ in 0..run.num_repeats {
        copy(&mut to, &from);
    }
    watch.stop();

    let verified = to == from;
    report_verification(verified);
    Ok(BandwidthReport::new(surface, run, num_elements, watch.elapsed_ns(), verified))
}

/// Copy bandwidth of device global memory, one lane per value
pub fn run_bandwidth_on_device<B: ComputeBackend>(backend: &B, run: &RunConfig) -> Result<BandwidthReport> {
    let num_elements = copy_num_elements(run.allocate_mem)?;
    let host = seeded_buffer(num_elements, SEED_A)?;

    let mut from = backend.allocate(num_elements)?;
    let mut to = backend.allocate(num_elements)?;
    backend.copy_to_device(&mut from, &host)?;

    let kernel = backend.copy_kernel(&mut to, &from, num_elements)?;
    let launch = LaunchConfig::cover(num_elements, COPY_BLOCK_SIZE.min(backend.max_work_group_size()))?;
    debug!(grid = launch.grid, block = launch.block, num_elements, "copy launch geometry");

    let mut watch = StopWatch::new();
    watch.start();
    for _ in 0..run.num_repeats {
        backend.launch(&kernel, launch)?;
    }
    backend.synchronize()?;
    watch.stop();

    let mut copied = zeroed(num_elements)?;
    backend.copy_to_host(&mut copied, &to)?;
    let verified = copied == host;
    report_verification(verified);

    let mut report = BandwidthReport::new(ExecutionSurface::Device, run, num_elements, watch.elapsed_ns(), verified);
    report.device = Some(format!("{:?}", backend.device_type()));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::memory::GIB;
    use crate::gpu::MockGpuBackend;

    #[test]
    fn test_copy_buffer_sized_by_precision() {
        assert_eq!(copy_num_elements(1.0).unwrap() * std::mem::size_of::<Real>(), 1 << 30);
        assert!(copy_num_elements(1e-12).is_err());
    }

    fn run_config(values: usize) -> RunConfig {
        let gb = (values * std::mem::size_of::<Real>()) as f64 / GIB;
        RunConfig::from_yaml_str(&format!("allocate_mem: {}\nnum_repeats: 2\n", gb)).unwrap()
    }

    #[test]
    fn test_copy_num_elements_per_buffer() {
        let expected = (1usize << 30) / std::mem::size_of::<Real>();
        assert_eq!(copy_num_elements(1.0).unwrap(), expected);
        assert!(copy_num_elements(1e-12).is_err());
    }

    #[test]
    fn test_host_copies_verify() {
        for surface in [ExecutionSurface::Sequential, ExecutionSurface::Parallel] {
            let report = run_bandwidth_on_host(surface, &run_config(200_000)).unwrap();
            assert_eq!(report.num_elements, 200_000);
            assert!(report.verified);
        }
    }

    #[test]
    fn test_device_copy_on_mock() {
        let backend = MockGpuBackend::new(0).unwrap();
        let report = run_bandwidth_on_device(&backend, &run_config(3000)).unwrap();
        assert!(report.verified);
        let stats = backend.stats();
        // 3000 values in groups of 1024: three groups, 72 idle lanes per launch
        assert_eq!(stats.launches, 2);
        assert_eq!(stats.active_lanes, 6000);
        assert_eq!(stats.idle_lanes, 144);
    }

    #[test]
    fn test_bandwidth_counts_read_and_write() {
        let run = run_config(1000);
        let report = BandwidthReport::new(ExecutionSurface::Sequential, &run, 1000, 2000.0, true);
        assert_eq!(report.avg_time_ns, 1000.0);
        assert_eq!(report.bandwidth_gb_s, (2 * 1000 * std::mem::size_of::<Real>()) as f64 / 1000.0);
    }
}

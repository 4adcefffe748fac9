//! Execution harness for the batched scale-accumulate benchmark
//!
//! Sizes the batch to the memory budget, seeds both operand buffers, runs the
//! engine `num_repeats` times back to back on the configured surface and turns
//! the elapsed time into throughput figures.

use rand::distributions::Uniform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{CsaProblem, RunConfig};
use crate::csa::{batch_csa, par_batch_csa, single_csa_with, BatchMut, BatchRef, DeviceAddressing};
use crate::error::{BenchError, Result};
use crate::gpu::memory::try_host_buffer;
use crate::gpu::{estimate_num_elements, ComputeBackend, CsaKernelArgs, DeviceBatch, LaunchConfig};
use crate::matrix::{col_major_view, CsaParams};
use crate::report::Report;
use crate::timer::{per_ns, StopWatch};
use crate::types::{Addressing, ExecutionSurface, Real};

/// Seed of the A operands
pub const SEED_A: u64 = 0x5eed_a;
/// Seed of the B operands
pub const SEED_B: u64 = 0x5eed_b;

/// Memory accesses per updated cell: read A, read B, write B
const ACCESSES_PER_CELL: usize = 3;

type Engine = fn(&CsaParams, &BatchRef<'_>, &mut BatchMut<'_>, usize);

/// Floating-point operations charged per updated cell.
///
/// Scaling by 0 or 1 is free, and the sum only counts when both terms
/// contribute. The kernel still performs the full multiply-add; this is
/// accounting only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlopCount {
    pub scale_a: bool,
    pub scale_b: bool,
    pub add: bool,
}

impl FlopCount {
    pub fn new(alpha: Real, beta: Real) -> Self {
        Self {
            scale_a: alpha != 0.0 && alpha != 1.0,
            scale_b: beta != 0.0 && beta != 1.0,
            add: alpha != 0.0 && beta != 0.0,
        }
    }

    pub fn per_cell(&self) -> u64 {
        self.scale_a as u64 + self.scale_b as u64 + self.add as u64
    }

    /// Operations for one batch element of `params`
    pub fn per_element(&self, params: &CsaParams) -> u64 {
        self.per_cell() * params.cells() as u64
    }

    /// Operations for `repeats` passes over `num_elements` elements
    pub fn total(&self, params: &CsaParams, num_elements: usize, repeats: usize) -> f64 {
        self.per_element(params) as f64 * num_elements as f64 * repeats as f64
    }
}

/// Result of one scale-accumulate benchmark run
#[derive(Debug, Clone, Serialize)]
pub struct CsaReport {
    pub surface: ExecutionSurface,
    pub addressing: Addressing,
    pub device: Option<String>,
    pub allocated_mem_gb: f64,
    pub num_elements: usize,
    pub num_repeats: usize,
    pub flops: FlopCount,
    pub computed_flops: f64,
    pub elapsed_ns: f64,
    pub latency_ns: f64,
    pub gflops: f64,
    pub bandwidth_gb_s: f64,
    /// Validated elements whose result differs from the reference, if
    /// validation ran
    pub mismatches: Option<Vec<usize>>,
}

impl CsaReport {
    fn new(
        surface: ExecutionSurface,
        problem: &CsaProblem,
        run: &RunConfig,
        num_elements: usize,
        elapsed_ns: f64,
        mismatches: Option<Vec<usize>>,
    ) -> Self {
        let params = &problem.params;
        let flops = FlopCount::new(params.alpha, params.beta);
        let computed_flops = flops.total(params, num_elements, run.num_repeats);
        let bytes = (params.cells() * ACCESSES_PER_CELL * std::mem::size_of::<Real>()) as f64
            * num_elements as f64
            * run.num_repeats as f64;

        Self {
            surface,
            addressing: run.addressing,
            device: None,
            allocated_mem_gb: run.allocate_mem,
            num_elements,
            num_repeats: run.num_repeats,
            flops,
            computed_flops,
            elapsed_ns,
            latency_ns: elapsed_ns / run.num_repeats as f64,
            gflops: per_ns(computed_flops, elapsed_ns),
            bandwidth_gb_s: per_ns(bytes, elapsed_ns),
            mismatches,
        }
    }
}

impl Report for CsaReport {
    fn lines(&self) -> Vec<(&'static str, String)> {
        let mut lines = Vec::new();
        if let Some(device) = &self.device {
            lines.push(("Device", device.clone()));
        }
        lines.extend([
            ("Surface", self.surface.to_string()),
            ("Addressing", self.addressing.to_string()),
            ("Allocated Mem, GB", format!("{}", self.allocated_mem_gb)),
            ("Num elements", self.num_elements.to_string()),
            ("Num repeats", self.num_repeats.to_string()),
            ("Computed Flops", format!("{:e}", self.computed_flops)),
            ("Spent time, ms", format!("{:.3}", self.elapsed_ns / 1e6)),
            ("Latency per repeat, us", format!("{:.3}", self.latency_ns / 1e3)),
            ("GFLOPS", format!("{:.3}", self.gflops)),
            ("Bandwidth, GB/s", format!("{:.3}", self.bandwidth_gb_s)),
        ]);
        if let Some(mismatches) = &self.mismatches {
            lines.push(("Mismatches", mismatches.len().to_string()));
        }
        lines
    }
}

/// Number of batch elements that fit the memory budget; a budget too small
/// for a single element is a configuration error
pub fn plan_num_elements(problem: &CsaProblem, run: &RunConfig) -> Result<usize> {
    let num_elements = estimate_num_elements(problem.offset_a, problem.offset_b, run.allocate_mem);
    if num_elements == 0 {
        return Err(BenchError::config(
            "allocate_mem".to_string(),
            format!(
                "{} GB does not hold one element of {} values",
                run.allocate_mem,
                problem.offset_a + problem.offset_b
            ),
        ));
    }
    info!(
        num_elements,
        m = problem.params.m,
        n = problem.params.n,
        budget_gb = run.allocate_mem,
        "batch sized"
    );
    Ok(num_elements)
}

/// `len` uniformly distributed values in `[-1, 1)`, reproducible from `seed`
pub fn seeded_buffer(len: usize, seed: u64) -> Result<Vec<Real>> {
    let mut buffer = try_host_buffer(len)?;
    let rng = StdRng::seed_from_u64(seed);
    buffer.extend(rng.sample_iter(Uniform::<Real>::new(-1.0, 1.0)).take(len));
    Ok(buffer)
}

fn seeded_operands(problem: &CsaProblem, num_elements: usize) -> Result<(Vec<Real>, Vec<Real>)> {
    let a = seeded_buffer(problem.offset_a * num_elements, SEED_A)?;
    let b = seeded_buffer(problem.offset_b * num_elements, SEED_B)?;
    Ok((a, b))
}

/// Host batches over the seeded storage, each element starting at its
/// block's first cell. Indirect batches list the storage slots in reverse so
/// resolution actually goes through the table.
fn host_batches<'a>(
    addressing: Addressing,
    problem: &CsaProblem,
    a: &'a [Real],
    b: &'a mut [Real],
    num_elements: usize,
) -> (BatchRef<'a>, BatchMut<'a>) {
    let a = &a[problem.first_a..];
    let b = &mut b[problem.first_b..];
    match addressing {
        Addressing::Strided => (BatchRef::strided(a, problem.offset_a), BatchMut::strided(b, problem.offset_b)),
        Addressing::Indirect => {
            let mut elements_a: Vec<&[Real]> = a.chunks(problem.offset_a).take(num_elements).collect();
            let mut elements_b: Vec<&mut [Real]> = b.chunks_mut(problem.offset_b).take(num_elements).collect();
            elements_a.reverse();
            elements_b.reverse();
            (BatchRef::indirect(elements_a), BatchMut::indirect(elements_b))
        }
    }
}

/// Device-side addressing for `num_elements` elements over the full storage
/// buffers. Bases point at each block's first cell; indirect tables are
/// reversed like the host's indirect batches.
pub fn device_addressing(addressing: Addressing, problem: &CsaProblem, num_elements: usize) -> Result<DeviceAddressing> {
    match addressing {
        Addressing::Strided => Ok(DeviceAddressing::Strided {
            first_a: problem.first_a,
            first_b: problem.first_b,
            offset_a: problem.offset_a,
            offset_b: problem.offset_b,
        }),
        Addressing::Indirect => Ok(DeviceAddressing::Indirect {
            bases_a: index_table(problem.first_a, problem.offset_a, num_elements)?,
            bases_b: index_table(problem.first_b, problem.offset_b, num_elements)?,
        }),
    }
}

fn index_table(first: usize, offset: usize, num_elements: usize) -> Result<Vec<u32>> {
    (0..num_elements)
        .rev()
        .map(|slot| {
            let base = first + slot * offset;
            u32::try_from(base).map_err(|_| {
                BenchError::invalid_parameter(
                    "addressing".to_string(),
                    format!("element base {} does not fit a 32-bit index table", base),
                )
            })
        })
        .collect()
}

/// Apply the single-pair reference to every storage slot of `b`
pub fn reference_batch(problem: &CsaProblem, a: &[Real], b: &mut [Real], num_elements: usize) {
    for slot in 0..num_elements {
        single_csa_with(
            &problem.params,
            &a[problem.first_a + slot * problem.offset_a..],
            &mut b[problem.first_b + slot * problem.offset_b..],
        );
    }
}

/// Storage slots whose contents differ from `expected`.
///
/// The whole slot is compared, so writes outside the bounding box are caught
/// as well as wrong values inside it.
pub fn compare_batches(
    problem: &CsaProblem,
    actual: &[Real],
    expected: &[Real],
    num_elements: usize,
) -> Result<Vec<usize>> {
    let params = &problem.params;
    let mut mismatches = Vec::new();
    for slot in 0..num_elements {
        let slot_range = slot * problem.offset_b..(slot + 1) * problem.offset_b;
        let block = problem.first_b + slot_range.start;
        let got = col_major_view(&actual[block..], params.m, params.n, params.ldb)?;
        let want = col_major_view(&expected[block..], params.m, params.n, params.ldb)?;
        if got != want {
            warn!(element = slot, "result differs from the single-pair reference");
            mismatches.push(slot);
        } else if actual[slot_range.clone()] != expected[slot_range] {
            warn!(element = slot, "cells outside the bounding box were modified");
            mismatches.push(slot);
        }
    }
    if mismatches.is_empty() {
        info!(num_elements, "validation passed");
    } else {
        warn!(count = mismatches.len(), num_elements, "validation found mismatching elements");
    }
    Ok(mismatches)
}

/// Run the benchmark on a host surface (sequential loop or rayon pool)
pub fn run_csa_on_host(surface: ExecutionSurface, problem: &CsaProblem, run: &RunConfig) -> Result<CsaReport> {
    let engine: Engine = match surface {
        ExecutionSurface::Sequential => batch_csa,
        ExecutionSurface::Parallel => par_batch_csa,
        ExecutionSurface::Device => {
            return Err(BenchError::invalid_parameter(
                "surface",
                "the device surface runs through run_csa_on_device",
            ))
        }
    };
    problem.validate()?;

    let num_elements = plan_num_elements(problem, run)?;
    let (a, mut b) = seeded_operands(problem, num_elements)?;

    let mismatches = if run.validate {
        let mut expected = b.clone();
        reference_batch(problem, &a, &mut expected, num_elements);
        {
            let (batch_a, mut batch_b) = host_batches(run.addressing, problem, &a, &mut b, num_elements);
            engine(&problem.params, &batch_a, &mut batch_b, num_elements);
        }
        Some(compare_batches(problem, &b, &expected, num_elements)?)
    } else {
        None
    };

    let (batch_a, mut batch_b) = host_batches(run.addressing, problem, &a, &mut b, num_elements);
    let mut watch = StopWatch::new();
    watch.start();
    for _ in 0..run.num_repeats {
        engine(&problem.params, &batch_a, &mut batch_b, num_elements);
    }
    watch.stop();

    Ok(CsaReport::new(surface, problem, run, num_elements, watch.elapsed_ns(), mismatches))
}

/// Run the benchmark on an accelerator: one lane per batch element, launches
/// queued back to back and a single synchronization at the end
pub fn run_csa_on_device<B: ComputeBackend>(backend: &B, problem: &CsaProblem, run: &RunConfig) -> Result<CsaReport> {
    problem.validate()?;

    let num_elements = plan_num_elements(problem, run)?;
    let (a, b) = seeded_operands(problem, num_elements)?;

    let mut batch = DeviceBatch::upload(backend, &a, &b)?;
    let args = CsaKernelArgs {
        params: problem.params,
        addressing: device_addressing(run.addressing, problem, num_elements)?,
        num_elements,
    };
    let kernel = backend.csa_kernel(&args, &batch.a, &mut batch.b)?;
    let launch = LaunchConfig::cover(num_elements, run.block_size)?;
    debug!(grid = launch.grid, block = launch.block, bytes = batch.bytes(), "csa launch geometry");

    let mismatches = if run.validate {
        backend.launch(&kernel, launch)?;
        backend.synchronize()?;
        let mut actual = try_host_buffer(b.len())?;
        actual.resize(b.len(), 0.0);
        batch.download_b(backend, &mut actual)?;

        let mut expected = b;
        reference_batch(problem, &a, &mut expected, num_elements);
        Some(compare_batches(problem, &actual, &expected, num_elements)?)
    } else {
        None
    };

    let mut watch = StopWatch::new();
    watch.start();
    for _ in 0..run.num_repeats {
        backend.launch(&kernel, launch)?;
    }
    backend.synchronize()?;
    watch.stop();

    let mut report = CsaReport::new(
        ExecutionSurface::Device,
        problem,
        run,
        num_elements,
        watch.elapsed_ns(),
        mismatches,
    );
    report.device = Some(format!("{:?}", backend.device_type()));
    Ok(report)
}

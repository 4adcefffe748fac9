//! # csa-bench - Batched Scale-Accumulate Microbenchmarks
//!
//! Measures the throughput of `B_i := alpha * A_i + beta * B_i` over a batch of
//! small column-major matrix pairs, on a sequential host loop, the rayon thread
//! pool, or an accelerator (OpenCL with the `gpu` feature, a host emulation
//! otherwise).
//!
//! ## Key Features
//!
//! - **Reference kernel**: single-pair scale-accumulate with leading dimensions
//! - **Addressing modes**: strided batches and indirect (per-element table) batches
//! - **Execution surfaces**: sequential, rayon-parallel, and device launches
//! - **Cost accounting**: FLOP counts that skip scaling by 0 or 1
//! - **Companion benchmarks**: global-memory copy bandwidth and shared-memory round trips
//!
//! ## Quick Start
//!
//! ```rust
//! use csa_bench::csa::{batch_csa, BatchMut, BatchRef};
//! use csa_bench::matrix::CsaParams;
//!
//! // Two 2x2 elements stored back to back
//! let a = [1.0, 3.0, 2.0, 4.0, 1.0, 3.0, 2.0, 4.0];
//! let mut b = [5.0, 7.0, 6.0, 8.0, 5.0, 7.0, 6.0, 8.0];
//!
//! let params = CsaParams::new(2, 2, 2.0, 1.0);
//! batch_csa(&params, &BatchRef::strided(&a, 4), &mut BatchMut::strided(&mut b, 4), 2);
//! assert_eq!(b, [7.0, 13.0, 10.0, 16.0, 7.0, 13.0, 10.0, 16.0]);
//! ```
//!
//! ## Module Organization
//!
//! - [`csa`] - Single-pair kernel, batch address resolution and the batched engine
//! - [`harness`] - Batch sizing, timed repeat loops and throughput reporting
//! - [`gpu`] - Accelerator backends and launch geometry
//! - [`bandwidth`] - Memory-copy bandwidth benchmark
//! - [`shared_mem`] - Shared-memory round-trip benchmark
//! - [`config`] - `params.yaml` and `config.yaml` loading
//! - [`error`] - Error types and result handling
//! - [`matrix`] - Problem shape and column-major views
//! - [`types`] - Precision, layout tags and run options

pub mod bandwidth;
pub mod config;
pub mod csa;
pub mod error;
pub mod gpu;
pub mod harness;
pub mod logging;
pub mod matrix;
pub mod report;
pub mod shared_mem;
pub mod timer;
pub mod types;

//! Batched scale-accumulate (`B := alpha * A + beta * B`)
//!
//! - [`kernel`] - the single-pair reference kernel
//! - [`resolver`] - strided and indirect batch addressing
//! - [`batch`] - sequential and parallel batch engines

pub mod batch;
pub mod kernel;
pub mod resolver;

pub use batch::{batch_csa, par_batch_csa};
pub use kernel::{single_csa, single_csa_with};
pub use resolver::{BatchMut, BatchRef, DeviceAddressing};

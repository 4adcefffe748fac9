//! Accelerator support for the benchmarks
//!
//! [`ComputeBackend`] is the runtime interface the harness drives. The OpenCL
//! implementation needs the `gpu` feature; the mock backend emulates a device
//! on the host and is always available.

pub mod constants;
pub mod device;
pub mod lanes;
pub mod memory;
pub mod mock_backend;

#[cfg(feature = "gpu")]
pub mod backend;

pub use device::{ComputeBackend, CsaKernelArgs, DeviceType, LaunchConfig};
pub use memory::{estimate_num_elements, DeviceBatch, MemoryLedger};
pub use mock_backend::{LaunchStats, MockGpuBackend};

#[cfg(feature = "gpu")]
pub use backend::{GpuBackend, GpuBuffer};

use crate::error::Result;

/// Backend the binaries run on: OpenCL with the `gpu` feature, the host
/// emulation otherwise
#[cfg(feature = "gpu")]
pub type DefaultBackend = GpuBackend;

#[cfg(not(feature = "gpu"))]
pub type DefaultBackend = MockGpuBackend;

/// Select and initialize device `device_id` on the default backend
pub fn open_default_backend(device_id: usize) -> Result<DefaultBackend> {
    DefaultBackend::new(device_id)
}

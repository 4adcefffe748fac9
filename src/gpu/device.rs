//! Accelerator runtime interface shared by the OpenCL and mock backends

use crate::csa::DeviceAddressing;
use crate::error::{BenchError, Result};
use crate::gpu::constants::{AMD_LANE_SIZE, INTEL_LANE_SIZE, NVIDIA_LANE_SIZE};
use crate::matrix::CsaParams;
use crate::types::Real;

/// Supported device types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Cpu,
    IntelGpu,
    NvidiaGpu,
    AmdGpu,
    /// Host emulation of a device
    Mock,
}

impl DeviceType {
    /// Lanes that execute in lockstep on this kind of device
    pub fn lane_size(&self) -> usize {
        match self {
            DeviceType::NvidiaGpu | DeviceType::Mock => NVIDIA_LANE_SIZE,
            DeviceType::AmdGpu => AMD_LANE_SIZE,
            DeviceType::IntelGpu => INTEL_LANE_SIZE,
            DeviceType::Cpu => 1,
        }
    }
}

/// Launch geometry: `grid` work-groups of `block` lanes each
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchConfig {
    pub grid: usize,
    pub block: usize,
}

impl LaunchConfig {
    /// Smallest grid of `block`-sized groups covering `num_lanes` lanes.
    ///
    /// The grid is rounded up, so up to `block - 1` trailing lanes have no
    /// work; kernels guard against them. At least one group is launched.
    pub fn cover(num_lanes: usize, block: usize) -> Result<Self> {
        if block == 0 {
            return Err(BenchError::invalid_parameter("block_size", "must be at least 1"));
        }
        let grid = num_lanes.div_ceil(block).max(1);
        Ok(Self { grid, block })
    }

    /// Total lanes launched, `grid * block`
    pub fn total_lanes(&self) -> usize {
        self.grid * self.block
    }

    /// Rejects geometries the device cannot run
    pub fn check(&self, max_work_group_size: usize) -> Result<()> {
        if self.block == 0 || self.grid == 0 {
            return Err(BenchError::Launch(format!(
                "empty launch geometry: grid {}, block {}",
                self.grid, self.block
            )));
        }
        if self.block > max_work_group_size {
            return Err(BenchError::Launch(format!(
                "work-group size {} exceeds device maximum {}",
                self.block, max_work_group_size
            )));
        }
        if self.grid.checked_mul(self.block).is_none() {
            return Err(BenchError::Launch(format!(
                "grid {} x block {} overflows the lane index",
                self.grid, self.block
            )));
        }
        Ok(())
    }
}

/// Arguments of the batched scale-accumulate kernel
#[derive(Debug, Clone, PartialEq)]
pub struct CsaKernelArgs {
    pub params: CsaParams,
    pub addressing: DeviceAddressing,
    pub num_elements: usize,
}

/// Trait for compute backends
///
/// A backend value is the device context: constructing it selects and
/// initializes a device, [`ComputeBackend::finalize`] tears it down. Buffers
/// are freed when dropped. Launches are queued in order and may return before
/// the work completes; [`ComputeBackend::synchronize`] waits for all of it.
pub trait ComputeBackend {
    /// Device allocation of `Real` values
    type Buffer;
    /// A kernel with its arguments bound, ready to launch repeatedly
    type Kernel;

    /// Get device type
    fn device_type(&self) -> DeviceType;

    /// Human-readable device description
    fn device_info(&self) -> Result<String>;

    /// Lanes per hardware execution group
    fn lane_size(&self) -> usize;

    fn max_work_group_size(&self) -> usize;

    /// Allocate `len` values of device memory
    fn allocate(&self, len: usize) -> Result<Self::Buffer>;

    /// Blocking host-to-device copy of `src` into the start of `dst`
    fn copy_to_device(&self, dst: &mut Self::Buffer, src: &[Real]) -> Result<()>;

    /// Blocking device-to-host copy of the start of `src` into `dst`
    fn copy_to_host(&self, dst: &mut [Real], src: &Self::Buffer) -> Result<()>;

    /// Batched scale-accumulate kernel over `a` and `b`, one lane per element
    fn csa_kernel(&self, args: &CsaKernelArgs, a: &Self::Buffer, b: &mut Self::Buffer) -> Result<Self::Kernel>;

    /// Element-wise copy `to[i] = from[i]` for `i < len`, one lane per element
    fn copy_kernel(&self, to: &mut Self::Buffer, from: &Self::Buffer, len: usize) -> Result<Self::Kernel>;

    /// Shared-memory round trip: every lane stores `magic` in fast local
    /// memory and loads it back `repeats` times, then writes it to `scratch`
    fn shared_mem_kernel(&self, scratch: &mut Self::Buffer, magic: Real, repeats: u32) -> Result<Self::Kernel>;

    /// Enqueue `kernel` with the given geometry
    fn launch(&self, kernel: &Self::Kernel, config: LaunchConfig) -> Result<()>;

    /// Wait for all queued work to complete
    fn synchronize(&self) -> Result<()>;

    /// Drain the queue and release the device
    fn finalize(self) -> Result<()>
    where
        Self: Sized;
}

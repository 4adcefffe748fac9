//! Constants for GPU operations

use crate::types::Real;

/// Default lanes per work-group for the scale-accumulate kernel
pub const DEFAULT_BLOCK_SIZE: usize = 64;

/// Lanes per work-group for the memory-copy kernel
pub const COPY_BLOCK_SIZE: usize = 1024;

/// Kernel entry points in `kernels.cl`
pub const CSA_STRIDED_KERNEL: &str = "csa_strided";
pub const CSA_INDIRECT_KERNEL: &str = "csa_indirect";
pub const COPY_KERNEL: &str = "copy_data";
pub const SHARED_MEM_KERNEL: &str = "shr_mem_round_trip";

/// Value written through shared memory by the round-trip benchmark
pub const SHARED_MEM_MAGIC: Real = 3.25;

/// Mock GPU specifications
pub const MOCK_GPU_DEVICE_COUNT: usize = 1;
pub const MOCK_GPU_COMPUTE_UNITS: u32 = 96;
pub const MOCK_GPU_MAX_WORK_GROUP_SIZE: usize = 1024;
pub const MOCK_GPU_GLOBAL_MEMORY_MB: u64 = 16384;
pub const MOCK_GPU_LANE_SIZE: usize = 32;

/// Lane widths used when sizing single-group launches
pub const NVIDIA_LANE_SIZE: usize = 32;
pub const AMD_LANE_SIZE: usize = 64;
pub const INTEL_LANE_SIZE: usize = 16;

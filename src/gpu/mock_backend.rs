use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, warn};

use super::constants::{
    MOCK_GPU_COMPUTE_UNITS, MOCK_GPU_DEVICE_COUNT, MOCK_GPU_GLOBAL_MEMORY_MB, MOCK_GPU_LANE_SIZE,
    MOCK_GPU_MAX_WORK_GROUP_SIZE,
};
use super::device::{ComputeBackend, CsaKernelArgs, DeviceType, LaunchConfig};
use super::lanes::{copy_lane, csa_lane, shared_mem_lane};
use super::memory::{MemoryLedger, Reservation};
use crate::error::{BenchError, Result};
use crate::types::Real;

type Storage = Rc<RefCell<Vec<Real>>>;

/// Counters accumulated over every launch on a [`MockGpuBackend`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaunchStats {
    pub launches: u64,
    /// Lanes that accessed memory
    pub active_lanes: u64,
    /// Lanes that exited at the bounds guard
    pub idle_lanes: u64,
}

/// Mock GPU backend for running the device path when real GPU is not available
///
/// Every launched lane is executed on the calling thread, in lane order,
/// through the same lane bodies the device kernels implement. Launches
/// complete before returning, which trivially preserves queue order.
pub struct MockGpuBackend {
    device_id: usize,
    ledger: MemoryLedger,
    max_work_group_size: usize,
    lane_size: usize,
    stats: Cell<LaunchStats>,
}

/// Device buffer of the mock backend; freed when dropped
pub struct MockBuffer {
    data: Storage,
    _reservation: Reservation,
}

impl MockBuffer {
    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Kernel bound to its mock buffers
pub enum MockKernel {
    Csa {
        args: CsaKernelArgs,
        a: Storage,
        b: Storage,
    },
    Copy {
        to: Storage,
        from: Storage,
        len: usize,
    },
    SharedMem {
        scratch: Storage,
        magic: Real,
        repeats: u32,
    },
}

impl MockGpuBackend {
    /// Select and initialize mock device `device_id`
    pub fn new(device_id: usize) -> Result<Self> {
        if device_id >= MOCK_GPU_DEVICE_COUNT {
            return Err(BenchError::DeviceInit(format!(
                "device {} not found ({} mock device(s) available)",
                device_id, MOCK_GPU_DEVICE_COUNT
            )));
        }
        warn!("Using mock GPU backend; kernels are emulated on the host");
        Ok(Self {
            device_id,
            ledger: MemoryLedger::new(MOCK_GPU_GLOBAL_MEMORY_MB * 1024 * 1024),
            max_work_group_size: MOCK_GPU_MAX_WORK_GROUP_SIZE,
            lane_size: MOCK_GPU_LANE_SIZE,
            stats: Cell::new(LaunchStats::default()),
        })
    }

    /// Override the simulated global memory size; call before allocating
    pub fn with_global_memory(mut self, bytes: u64) -> Self {
        self.ledger = MemoryLedger::new(bytes);
        self
    }

    /// Override the simulated work-group limit
    pub fn with_max_work_group_size(mut self, size: usize) -> Self {
        self.max_work_group_size = size;
        self
    }

    pub fn stats(&self) -> LaunchStats {
        self.stats.get()
    }

    pub fn reset_stats(&self) {
        self.stats.set(LaunchStats::default());
    }

    /// Bytes currently held by live buffers
    pub fn allocated_bytes(&self) -> u64 {
        self.ledger.in_use()
    }

    fn record(&self, active: u64, idle: u64) {
        let mut stats = self.stats.get();
        stats.launches += 1;
        stats.active_lanes += active;
        stats.idle_lanes += idle;
        self.stats.set(stats);
    }
}

impl ComputeBackend for MockGpuBackend {
    type Buffer = MockBuffer;
    type Kernel = MockKernel;

    fn device_type(&self) -> DeviceType {
        DeviceType::Mock
    }

    fn device_info(&self) -> Result<String> {
        Ok(format!(
            "Device: Mock GPU {} (Emulated)\n\
             Vendor: Host\n\
             Compute Units: {}\n\
             Max Work Group Size: {}\n\
             Global Memory: {} MB",
            self.device_id,
            MOCK_GPU_COMPUTE_UNITS,
            self.max_work_group_size,
            self.ledger.capacity() / (1024 * 1024)
        ))
    }

    fn lane_size(&self) -> usize {
        self.lane_size
    }

    fn max_work_group_size(&self) -> usize {
        self.max_work_group_size
    }

    fn allocate(&self, len: usize) -> Result<MockBuffer> {
        let bytes = (len * std::mem::size_of::<Real>()) as u64;
        let reservation = self.ledger.reserve(bytes)?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|e| BenchError::resource_exhausted(bytes, e.to_string()))?;
        data.resize(len, 0.0);

        debug!(len, bytes, "mock allocation");
        Ok(MockBuffer {
            data: Rc::new(RefCell::new(data)),
            _reservation: reservation,
        })
    }

    fn copy_to_device(&self, dst: &mut MockBuffer, src: &[Real]) -> Result<()> {
        let mut data = dst.data.borrow_mut();
        if src.len() > data.len() {
            return Err(BenchError::dimension_mismatch(
                format!("at most {} values", data.len()),
                format!("{}", src.len()),
            ));
        }
        data[..src.len()].copy_from_slice(src);
        Ok(())
    }

    fn copy_to_host(&self, dst: &mut [Real], src: &MockBuffer) -> Result<()> {
        let data = src.data.borrow();
        if dst.len() > data.len() {
            return Err(BenchError::dimension_mismatch(
                format!("at most {} values", data.len()),
                format!("{}", dst.len()),
            ));
        }
        dst.copy_from_slice(&data[..dst.len()]);
        Ok(())
    }

    fn csa_kernel(&self, args: &CsaKernelArgs, a: &MockBuffer, b: &mut MockBuffer) -> Result<MockKernel> {
        Ok(MockKernel::Csa {
            args: args.clone(),
            a: Rc::clone(&a.data),
            b: Rc::clone(&b.data),
        })
    }

    fn copy_kernel(&self, to: &mut MockBuffer, from: &MockBuffer, len: usize) -> Result<MockKernel> {
        Ok(MockKernel::Copy {
            to: Rc::clone(&to.data),
            from: Rc::clone(&from.data),
            len,
        })
    }

    fn shared_mem_kernel(&self, scratch: &mut MockBuffer, magic: Real, repeats: u32) -> Result<MockKernel> {
        Ok(MockKernel::SharedMem {
            scratch: Rc::clone(&scratch.data),
            magic,
            repeats,
        })
    }

    fn launch(&self, kernel: &MockKernel, config: LaunchConfig) -> Result<()> {
        config.check(self.max_work_group_size)?;
        let lanes = config.total_lanes();
        let mut active = 0u64;

        match kernel {
            MockKernel::Csa { args, a, b } => {
                let a = a.borrow();
                let mut b = b.borrow_mut();
                for lane in 0..lanes {
                    if csa_lane(lane, args, &a, &mut b) {
                        active += 1;
                    }
                }
            }
            MockKernel::Copy { to, from, len } => {
                let from = from.borrow();
                let mut to = to.borrow_mut();
                for lane in 0..lanes {
                    if copy_lane(lane, &mut to, &from, *len) {
                        active += 1;
                    }
                }
            }
            MockKernel::SharedMem { scratch, magic, repeats } => {
                let mut scratch = scratch.borrow_mut();
                // Local memory is per work-group
                for group in 0..config.grid {
                    let base = group * config.block;
                    if base >= scratch.len() {
                        continue;
                    }
                    let mut shared = vec![0.0; config.block];
                    let group_scratch = &mut scratch[base..];
                    for local in 0..config.block {
                        if shared_mem_lane(local, &mut shared, group_scratch, *magic, *repeats) {
                            active += 1;
                        }
                    }
                }
            }
        }

        self.record(active, lanes as u64 - active);
        Ok(())
    }

    fn synchronize(&self) -> Result<()> {
        Ok(())
    }

    fn finalize(self) -> Result<()> {
        debug!(device = self.device_id, stats = ?self.stats.get(), "mock device finalized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_device_fails_to_initialize() {
        assert!(matches!(MockGpuBackend::new(MOCK_GPU_DEVICE_COUNT), Err(BenchError::DeviceInit(_))));
    }

    #[test]
    fn test_round_trip_copy() {
        let backend = MockGpuBackend::new(0).unwrap();
        let mut buffer = backend.allocate(4).unwrap();
        backend.copy_to_device(&mut buffer, &[1.0, 2.0, 3.0]).unwrap();
        let mut host = [0.0; 4];
        backend.copy_to_host(&mut host, &buffer).unwrap();
        assert_eq!(host, [1.0, 2.0, 3.0, 0.0]);
    }

    #[test]
    fn test_dropping_buffer_frees_memory() {
        let backend = MockGpuBackend::new(0).unwrap();
        let buffer = backend.allocate(256).unwrap();
        assert_eq!(backend.allocated_bytes(), (256 * std::mem::size_of::<Real>()) as u64);
        drop(buffer);
        assert_eq!(backend.allocated_bytes(), 0);
    }

    #[test]
    fn test_oversized_copy_is_rejected() {
        let backend = MockGpuBackend::new(0).unwrap();
        let mut buffer = backend.allocate(2).unwrap();
        assert!(backend.copy_to_device(&mut buffer, &[1.0, 2.0, 3.0]).is_err());
    }
}

//! Memory budgeting and device-resident batch storage

use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

use super::device::ComputeBackend;
use crate::error::{BenchError, Result};
use crate::types::Real;

/// Bytes per gigabyte as the configuration counts them
pub const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Converts a budget in (binary) gigabytes to bytes, rounding down
pub fn bytes_from_gb(gb: f64) -> u64 {
    (gb * GIB) as u64
}

/// Number of batch elements whose A and B storage (`size_a + size_b` values
/// each) fits into `allowed_gb` gigabytes
pub fn estimate_num_elements(size_a: usize, size_b: usize, allowed_gb: f64) -> usize {
    let element_bytes = ((size_a + size_b) * std::mem::size_of::<Real>()) as u64;
    if element_bytes == 0 {
        return 0;
    }
    (bytes_from_gb(allowed_gb) / element_bytes) as usize
}

/// Allocates a host vector of `len` values, reporting allocation failure
/// instead of aborting
pub fn try_host_buffer(len: usize) -> Result<Vec<Real>> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).map_err(|e| {
        BenchError::resource_exhausted((len * std::mem::size_of::<Real>()) as u64, format!("host allocation failed: {}", e))
    })?;
    Ok(buffer)
}

/// Running total of device memory held by live buffers, checked against the
/// device's global memory size
#[derive(Debug, Clone)]
pub struct MemoryLedger {
    capacity: u64,
    in_use: Rc<Cell<u64>>,
}

/// Bytes reserved on a [`MemoryLedger`]; released when dropped
#[derive(Debug)]
pub struct Reservation {
    bytes: u64,
    in_use: Rc<Cell<u64>>,
}

impl MemoryLedger {
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity,
            in_use: Rc::new(Cell::new(0)),
        }
    }

    /// Reserves `bytes`, failing when they exceed the memory still free
    pub fn reserve(&self, bytes: u64) -> Result<Reservation> {
        let in_use = self.in_use.get();
        let free = self.capacity.saturating_sub(in_use);
        if bytes > free {
            return Err(BenchError::resource_exhausted(
                bytes,
                format!("{} of {} bytes of device memory free", free, self.capacity),
            ));
        }
        self.in_use.set(in_use + bytes);
        Ok(Reservation {
            bytes,
            in_use: Rc::clone(&self.in_use),
        })
    }

    pub fn in_use(&self) -> u64 {
        self.in_use.get()
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }
}

impl Reservation {
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.in_use.set(self.in_use.get().saturating_sub(self.bytes));
    }
}

/// The two device buffers holding every A and every B operand of a batch
pub struct DeviceBatch<B: ComputeBackend> {
    pub a: B::Buffer,
    pub b: B::Buffer,
    len_a: usize,
    len_b: usize,
}

impl<B: ComputeBackend> std::fmt::Debug for DeviceBatch<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceBatch")
            .field("len_a", &self.len_a)
            .field("len_b", &self.len_b)
            .finish_non_exhaustive()
    }
}

impl<B: ComputeBackend> DeviceBatch<B> {
    /// Allocates both buffers; fails without allocating B if A does not fit
    pub fn allocate(backend: &B, len_a: usize, len_b: usize) -> Result<Self> {
        let a = backend.allocate(len_a)?;
        let b = backend.allocate(len_b)?;
        debug!(len_a, len_b, "device batch allocated");
        Ok(Self { a, b, len_a, len_b })
    }

    /// Allocates and uploads host copies of the A and B storage
    pub fn upload(backend: &B, host_a: &[Real], host_b: &[Real]) -> Result<Self> {
        let mut batch = Self::allocate(backend, host_a.len(), host_b.len())?;
        backend.copy_to_device(&mut batch.a, host_a)?;
        backend.copy_to_device(&mut batch.b, host_b)?;
        Ok(batch)
    }

    /// Reads the B storage back into `dst`
    pub fn download_b(&self, backend: &B, dst: &mut [Real]) -> Result<()> {
        if dst.len() != self.len_b {
            return Err(BenchError::dimension_mismatch(
                format!("{} values", self.len_b),
                format!("{}", dst.len()),
            ));
        }
        backend.copy_to_host(dst, &self.b)
    }

    /// Bytes held on the device
    pub fn bytes(&self) -> u64 {
        ((self.len_a + self.len_b) * std::mem::size_of::<Real>()) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_num_elements_floors() {
        let real = std::mem::size_of::<Real>();
        // One element = (4 + 4) values
        let one_element_gb = (8 * real) as f64 / GIB;
        assert_eq!(estimate_num_elements(4, 4, one_element_gb * 10.5), 10);
        assert_eq!(estimate_num_elements(4, 4, one_element_gb * 0.5), 0);
    }

    #[test]
    fn test_estimate_num_elements_one_gigabyte() {
        let real = std::mem::size_of::<Real>();
        let expected = (1usize << 30) / ((64 + 64) * real);
        assert_eq!(estimate_num_elements(64, 64, 1.0), expected);
    }

    #[test]
    fn test_zero_sized_elements() {
        assert_eq!(estimate_num_elements(0, 0, 1.0), 0);
    }

    #[test]
    fn test_ledger_rejects_combined_overcommit() {
        let ledger = MemoryLedger::new(1000);
        let first = ledger.reserve(600).unwrap();
        // Fits on its own, not next to the first reservation
        let err = ledger.reserve(600).unwrap_err();
        assert!(matches!(err, BenchError::ResourceExhausted { requested: 600, .. }));
        assert_eq!(ledger.in_use(), 600);
        drop(first);
        assert_eq!(ledger.in_use(), 0);
        assert!(ledger.reserve(600).is_ok());
    }

    #[test]
    fn test_ledger_accepts_exact_fit() {
        let ledger = MemoryLedger::new(1000);
        let _a = ledger.reserve(400).unwrap();
        let b = ledger.reserve(600).unwrap();
        assert_eq!(b.bytes(), 600);
        assert_eq!(ledger.in_use(), ledger.capacity());
        assert!(ledger.reserve(1).is_err());
    }
}

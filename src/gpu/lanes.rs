//! Host mirrors of the per-lane kernel bodies in `kernels.cl`
//!
//! Each function runs one lane and reports whether it touched memory.

use std::hint::black_box;

use super::device::CsaKernelArgs;
use crate::csa::single_csa_with;
use crate::types::Real;

/// One lane of the batched scale-accumulate kernel; lane `i` owns batch
/// element `i`
#[inline]
pub fn csa_lane(lane: usize, args: &CsaKernelArgs, a: &[Real], b: &mut [Real]) -> bool {
    if lane >= args.num_elements {
        return false;
    }
    let (base_a, base_b) = args.addressing.resolve(lane);
    single_csa_with(&args.params, &a[base_a..], &mut b[base_b..]);
    true
}

/// One lane of the memory-copy kernel
#[inline]
pub fn copy_lane(lane: usize, to: &mut [Real], from: &[Real], len: usize) -> bool {
    if lane >= len {
        return false;
    }
    to[lane] = from[lane];
    true
}

/// One lane of the shared-memory round trip; `shared` stands in for the
/// work-group's local memory
#[inline]
pub fn shared_mem_lane(lane: usize, shared: &mut [Real], scratch: &mut [Real], magic: Real, repeats: u32) -> bool {
    if lane >= shared.len() || lane >= scratch.len() {
        return false;
    }
    let mut value = 0.0;
    for _ in 0..repeats {
        shared[lane] = black_box(magic);
        value = black_box(shared[lane]);
    }
    scratch[lane] = value;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csa::DeviceAddressing;
    use crate::matrix::CsaParams;

    #[test]
    fn test_lane_past_batch_end_is_idle() {
        let args = CsaKernelArgs {
            params: CsaParams::new(2, 2, 2.0, 1.0),
            addressing: DeviceAddressing::strided(4, 4),
            num_elements: 1,
        };
        // Storage for one element only: lane 1 would read out of bounds
        let a = [1.0, 3.0, 2.0, 4.0];
        let mut b = [5.0, 7.0, 6.0, 8.0];
        assert!(!csa_lane(1, &args, &a, &mut b));
        assert_eq!(b, [5.0, 7.0, 6.0, 8.0]);
        assert!(csa_lane(0, &args, &a, &mut b));
        assert_eq!(b, [7.0, 13.0, 10.0, 16.0]);
    }

    #[test]
    fn test_copy_lane_guard() {
        let from = [1.0, 2.0];
        let mut to = [0.0, 0.0];
        assert!(copy_lane(1, &mut to, &from, 2));
        assert!(!copy_lane(2, &mut to, &from, 2));
        assert_eq!(to, [0.0, 2.0]);
    }

    #[test]
    fn test_shared_mem_lane_round_trip() {
        let mut shared = [0.0; 4];
        let mut scratch = [0.0; 4];
        assert!(shared_mem_lane(2, &mut shared, &mut scratch, 1.5, 10));
        assert_eq!(scratch, [0.0, 0.0, 1.5, 0.0]);
        assert!(!shared_mem_lane(4, &mut shared, &mut scratch, 1.5, 10));
    }
}

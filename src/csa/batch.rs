//! Batched scale-accumulate engine
//!
//! Batch members are independent, so the engine is free to visit them in any
//! order. The sequential path is the reference; the parallel path hands one
//! batch index to each rayon task.

use rayon::prelude::*;

use super::kernel::single_csa_with;
use super::resolver::{BatchMut, BatchRef};
use crate::matrix::CsaParams;

/// Applies `B_i := alpha * A_i + beta * B_i` for every `i < num_elements`,
/// one element after the other.
///
/// No validation is performed: offsets smaller than an operand's span, or a
/// batch shorter than `num_elements`, panic on out-of-bounds slicing.
pub fn batch_csa(params: &CsaParams, a: &BatchRef<'_>, b: &mut BatchMut<'_>, num_elements: usize) {
    for index in 0..num_elements {
        let matrix_a = a.resolve(index);
        let matrix_b = b.resolve_mut(index);
        single_csa_with(params, matrix_a, matrix_b);
    }
}

/// Parallel counterpart of [`batch_csa`], one task per batch element.
///
/// Produces bit-identical results to the sequential engine: every cell is
/// written by exactly one task with the same arithmetic.
pub fn par_batch_csa(params: &CsaParams, a: &BatchRef<'_>, b: &mut BatchMut<'_>, num_elements: usize) {
    if params.is_empty() || num_elements == 0 {
        return;
    }

    match b {
        BatchMut::Strided { data, offset } => {
            data.par_chunks_mut(*offset)
                .take(num_elements)
                .enumerate()
                .for_each(|(index, matrix_b)| {
                    single_csa_with(params, a.resolve(index), matrix_b);
                });
        }
        BatchMut::Indirect { elements } => {
            elements
                .par_iter_mut()
                .take(num_elements)
                .enumerate()
                .for_each(|(index, matrix_b)| {
                    single_csa_with(params, a.resolve(index), matrix_b);
                });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Real;

    fn scenario() -> (Vec<Real>, Vec<Real>) {
        (vec![1.0, 3.0, 2.0, 4.0], vec![5.0, 7.0, 6.0, 8.0])
    }

    #[test]
    fn test_batch_of_two_strided() {
        let (a, b) = scenario();
        let a2: Vec<Real> = a.iter().chain(a.iter()).copied().collect();
        let mut b2: Vec<Real> = b.iter().chain(b.iter()).copied().collect();

        let params = CsaParams::new(2, 2, 2.0, 1.0);
        let batch_a = BatchRef::strided(&a2, 4);
        let mut batch_b = BatchMut::strided(&mut b2, 4);
        batch_csa(&params, &batch_a, &mut batch_b, 2);

        assert_eq!(b2, vec![7.0, 13.0, 10.0, 16.0, 7.0, 13.0, 10.0, 16.0]);
    }

    #[test]
    fn test_only_first_elements_are_computed() {
        let (a, b) = scenario();
        let a2: Vec<Real> = a.iter().chain(a.iter()).copied().collect();
        let mut b2: Vec<Real> = b.iter().chain(b.iter()).copied().collect();

        let params = CsaParams::new(2, 2, 2.0, 1.0);
        let batch_a = BatchRef::strided(&a2, 4);
        let mut batch_b = BatchMut::strided(&mut b2, 4);
        par_batch_csa(&params, &batch_a, &mut batch_b, 1);

        assert_eq!(&b2[..4], &[7.0, 13.0, 10.0, 16.0]);
        assert_eq!(&b2[4..], &b[..]);
    }

    #[test]
    fn test_indirect_elements_in_any_order() {
        let (a, b) = scenario();
        let mut b_first = b.clone();
        let mut b_second = vec![0.0; 4];

        let params = CsaParams::new(2, 2, 2.0, 1.0);
        let batch_a = BatchRef::indirect(vec![&a[..], &a[..]]);
        let mut batch_b = BatchMut::indirect(vec![&mut b_second[..], &mut b_first[..]]);
        par_batch_csa(&params, &batch_a, &mut batch_b, 2);

        assert_eq!(b_first, vec![7.0, 13.0, 10.0, 16.0]);
        assert_eq!(b_second, vec![2.0, 6.0, 4.0, 8.0]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let params = CsaParams::new(5, 3, 0.75, -1.5).with_lds(6, 7);
        let offset = 7 * 3;
        let count = 17;
        let a: Vec<Real> = (0..offset * count).map(|i| (i % 13) as Real * 0.1).collect();
        let b0: Vec<Real> = (0..offset * count).map(|i| (i % 7) as Real - 3.0).collect();

        let mut sequential = b0.clone();
        batch_csa(&params, &BatchRef::strided(&a, offset), &mut BatchMut::strided(&mut sequential, offset), count);

        let mut parallel = b0.clone();
        par_batch_csa(&params, &BatchRef::strided(&a, offset), &mut BatchMut::strided(&mut parallel, offset), count);

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_empty_matrix_is_noop() {
        let a: Vec<Real> = vec![1.0; 8];
        let mut b: Vec<Real> = vec![2.0; 8];
        let params = CsaParams::new(0, 2, 3.0, 3.0);
        par_batch_csa(&params, &BatchRef::strided(&a, 0), &mut BatchMut::strided(&mut b, 0), 4);
        batch_csa(&params, &BatchRef::strided(&a, 0), &mut BatchMut::strided(&mut b, 0), 4);
        assert!(b.iter().all(|&x| x == 2.0));
    }
}

//! Single-pair scale-accumulate reference kernel

use crate::matrix::CsaParams;
use crate::types::{Real, Transpose};

/// Single-pair scale-accumulate: `B := alpha * A + beta * B`
///
/// `A` and `B` are column-major `m x n` blocks with leading dimensions `lda`
/// and `ldb`. Every cell gets the full multiply-add regardless of the value of
/// `alpha` or `beta`, so results are bit-identical to any other traversal.
///
/// # Panics
///
/// Panics if `a` or `b` is shorter than `ld * (n - 1) + m` for its side.
#[allow(clippy::too_many_arguments)]
pub fn single_csa(
    layout_a: Transpose,
    layout_b: Transpose,
    m: usize,
    n: usize,
    alpha: Real,
    a: &[Real],
    lda: usize,
    b: &mut [Real],
    ldb: usize,
    beta: Real,
) {
    if m == 0 || n == 0 {
        return;
    }
    match (layout_a, layout_b) {
        (Transpose::NoTrans, Transpose::NoTrans) => {
            for col in 0..n {
                let a_col = &a[col * lda..];
                let b_col = &mut b[col * ldb..];
                for row in 0..m {
                    b_col[row] = alpha * a_col[row] + beta * b_col[row];
                }
            }
        }
        _ => {
            // Operands are pre-laid-out to match the tags; sweep along rows
            for row in 0..m {
                for col in 0..n {
                    let dst = row + col * ldb;
                    b[dst] = alpha * a[row + col * lda] + beta * b[dst];
                }
            }
        }
    }
}

/// [`single_csa`] with shape and coefficients taken from `params`
#[inline]
pub fn single_csa_with(params: &CsaParams, a: &[Real], b: &mut [Real]) {
    single_csa(
        params.layout_a,
        params.layout_b,
        params.m,
        params.n,
        params.alpha,
        a,
        params.lda,
        b,
        params.ldb,
        params.beta,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_by_two_scenario() {
        let a = [1.0, 3.0, 2.0, 4.0];
        let mut b = [5.0, 7.0, 6.0, 8.0];
        single_csa(Transpose::NoTrans, Transpose::NoTrans, 2, 2, 2.0, &a, 2, &mut b, 2, 1.0);
        assert_eq!(b, [7.0, 13.0, 10.0, 16.0]);
    }

    #[test]
    fn test_padding_rows_untouched() {
        // m = 2 inside ld = 3; row 2 of every column is padding
        let a = [1.0, 1.0, 100.0, 1.0, 1.0];
        let mut b = [0.0, 0.0, -1.0, 0.0, 0.0];
        single_csa(Transpose::NoTrans, Transpose::NoTrans, 2, 2, 3.0, &a, 3, &mut b, 3, 1.0);
        assert_eq!(b, [3.0, 3.0, -1.0, 3.0, 3.0]);
    }

    #[test]
    fn test_different_leading_dimensions() {
        // A packed (lda = 2), B padded (ldb = 4)
        let a = [1.0, 2.0, 3.0, 4.0];
        let mut b = [10.0, 20.0, 9.0, 9.0, 30.0, 40.0];
        single_csa(Transpose::NoTrans, Transpose::NoTrans, 2, 2, 1.0, &a, 2, &mut b, 4, 1.0);
        assert_eq!(b, [11.0, 22.0, 9.0, 9.0, 33.0, 44.0]);
    }

    #[test]
    fn test_transposed_tag_matches_reference() {
        let a: Vec<Real> = (0..12).map(|i| i as Real * 0.37 - 1.5).collect();
        let b0: Vec<Real> = (0..12).map(|i| 2.0 - i as Real * 0.11).collect();

        let mut reference = b0.clone();
        single_csa(Transpose::NoTrans, Transpose::NoTrans, 3, 4, 1.25, &a, 3, &mut reference, 3, -0.5);

        for (ta, tb) in [
            (Transpose::Trans, Transpose::NoTrans),
            (Transpose::NoTrans, Transpose::Trans),
            (Transpose::Trans, Transpose::Trans),
        ] {
            let mut b = b0.clone();
            single_csa(ta, tb, 3, 4, 1.25, &a, 3, &mut b, 3, -0.5);
            assert_eq!(b, reference, "layouts {:?}/{:?}", ta, tb);
        }
    }

    #[test]
    fn test_params_wrapper() {
        let params = CsaParams::new(2, 2, 2.0, 1.0);
        let a = [1.0, 3.0, 2.0, 4.0];
        let mut b = [5.0, 7.0, 6.0, 8.0];
        single_csa_with(&params, &a, &mut b);
        assert_eq!(b, [7.0, 13.0, 10.0, 16.0]);
    }
}

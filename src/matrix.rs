//! Matrix shape bookkeeping shared by the kernels and the harness

use ndarray::{ArrayView2, ShapeBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};
use crate::types::{Real, Transpose};

/// Shape, leading dimensions, coefficients and layout tags shared by every
/// element of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CsaParams {
    pub layout_a: Transpose,
    pub layout_b: Transpose,
    pub m: usize,
    pub n: usize,
    pub alpha: Real,
    pub beta: Real,
    pub lda: usize,
    pub ldb: usize,
}

impl CsaParams {
    /// Tightly packed `m x n` operands (`lda = ldb = m`), no transposition
    pub fn new(m: usize, n: usize, alpha: Real, beta: Real) -> Self {
        Self {
            layout_a: Transpose::NoTrans,
            layout_b: Transpose::NoTrans,
            m,
            n,
            alpha,
            beta,
            lda: m,
            ldb: m,
        }
    }

    pub fn with_lds(mut self, lda: usize, ldb: usize) -> Self {
        self.lda = lda;
        self.ldb = ldb;
        self
    }

    pub fn with_layouts(mut self, layout_a: Transpose, layout_b: Transpose) -> Self {
        self.layout_a = layout_a;
        self.layout_b = layout_b;
        self
    }

    /// True when the operation touches no cell
    pub fn is_empty(&self) -> bool {
        self.m == 0 || self.n == 0
    }

    /// Number of cells updated per batch element
    pub fn cells(&self) -> usize {
        self.m * self.n
    }

    /// Elements an A operand must span: `lda * (n - 1) + m`
    pub fn span_a(&self) -> usize {
        span(self.m, self.n, self.lda)
    }

    /// Elements a B operand must span: `ldb * (n - 1) + m`
    pub fn span_b(&self) -> usize {
        span(self.m, self.n, self.ldb)
    }

    /// Checks `lda >= m` and `ldb >= m`.
    ///
    /// The kernels never call this; it is for callers assembling a batch.
    pub fn validate(&self) -> Result<()> {
        if self.lda < self.m {
            return Err(BenchError::invalid_parameter(
                "lda".to_string(),
                format!("leading dimension {} smaller than row count {}", self.lda, self.m),
            ));
        }
        if self.ldb < self.m {
            return Err(BenchError::invalid_parameter(
                "ldb".to_string(),
                format!("leading dimension {} smaller than row count {}", self.ldb, self.m),
            ));
        }
        Ok(())
    }
}

fn span(m: usize, n: usize, ld: usize) -> usize {
    if m == 0 || n == 0 {
        0
    } else {
        ld * (n - 1) + m
    }
}

/// Column-major `m x n` view with leading dimension `ld` over `data`
pub fn col_major_view(data: &[Real], m: usize, n: usize, ld: usize) -> Result<ArrayView2<'_, Real>> {
    if m > 0 && n > 0 && ld < m {
        return Err(BenchError::dimension_mismatch(
            format!("leading dimension >= {}", m),
            format!("{}", ld),
        ));
    }
    let len = span(m, n, ld).min(data.len());
    ArrayView2::from_shape((m, n).strides((1, ld.max(1))), &data[..len]).map_err(|e| {
        BenchError::dimension_mismatch(
            format!("{} elements for a {}x{} view with ld {}", span(m, n, ld), m, n, ld),
            format!("{} ({})", data.len(), e),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_accounts_for_padding() {
        let params = CsaParams::new(3, 4, 1.0, 1.0).with_lds(5, 7);
        assert_eq!(params.span_a(), 5 * 3 + 3);
        assert_eq!(params.span_b(), 7 * 3 + 3);
        assert_eq!(params.cells(), 12);
    }

    #[test]
    fn test_empty_shapes_have_zero_span() {
        assert_eq!(CsaParams::new(0, 4, 1.0, 1.0).span_a(), 0);
        assert_eq!(CsaParams::new(4, 0, 1.0, 1.0).span_b(), 0);
        assert!(CsaParams::new(0, 4, 1.0, 1.0).is_empty());
    }

    #[test]
    fn test_validate_rejects_short_leading_dimension() {
        let params = CsaParams::new(4, 2, 1.0, 1.0).with_lds(3, 4);
        assert!(params.validate().is_err());
        let params = CsaParams::new(4, 2, 1.0, 1.0).with_lds(4, 3);
        assert!(params.validate().is_err());
        assert!(CsaParams::new(4, 2, 1.0, 1.0).validate().is_ok());
    }

    #[test]
    fn test_col_major_view_reads_columns() {
        // 2x2 with ld 3: column 0 = {1, 3}, column 1 = {2, 4}, padding 9
        let data = [1.0, 3.0, 9.0, 2.0, 4.0];
        let view = col_major_view(&data, 2, 2, 3).unwrap();
        assert_eq!(view[[0, 0]], 1.0);
        assert_eq!(view[[1, 0]], 3.0);
        assert_eq!(view[[0, 1]], 2.0);
        assert_eq!(view[[1, 1]], 4.0);
    }

    #[test]
    fn test_col_major_view_rejects_short_storage() {
        let data = [1.0, 2.0, 3.0];
        assert!(col_major_view(&data, 2, 2, 2).is_err());
    }
}

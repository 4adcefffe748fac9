//! Shared scalar and tag types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Floating-point precision of every kernel in the process
#[cfg(not(feature = "double"))]
pub type Real = f32;

/// Floating-point precision of every kernel in the process
#[cfg(feature = "double")]
pub type Real = f64;

/// OpenCL spelling of [`Real`]
#[cfg(not(feature = "double"))]
pub const REAL_CL_NAME: &str = "float";

#[cfg(feature = "double")]
pub const REAL_CL_NAME: &str = "double";

/// Logical layout tag of an operand.
///
/// The tag only picks a kernel code path. Storage is always column-major and
/// already laid out by the caller to match the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Transpose {
    #[default]
    NoTrans,
    Trans,
}

/// How batch elements are located in storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Addressing {
    /// One contiguous allocation, elements a fixed offset apart
    #[default]
    Strided,
    /// A table of per-element bases
    Indirect,
}

/// Where the benchmark executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionSurface {
    /// Plain loop on the calling thread
    Sequential,
    /// Host thread pool, one task per batch element
    Parallel,
    /// Accelerator through a [`crate::gpu::ComputeBackend`]
    #[default]
    Device,
}

impl fmt::Display for Addressing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Addressing::Strided => write!(f, "strided"),
            Addressing::Indirect => write!(f, "indirect"),
        }
    }
}

impl fmt::Display for ExecutionSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionSurface::Sequential => write!(f, "sequential"),
            ExecutionSurface::Parallel => write!(f, "parallel"),
            ExecutionSurface::Device => write!(f, "device"),
        }
    }
}

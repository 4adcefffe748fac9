//! YAML configuration: the problem description (`params.yaml`) and the run
//! settings (`config.yaml`)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BenchError, Result};
use crate::gpu::constants::DEFAULT_BLOCK_SIZE;
use crate::matrix::CsaParams;
use crate::types::{Addressing, ExecutionSurface, Real, Transpose};

/// Fixed location of the problem description
pub const PARAMS_PATH: &str = "./params.yaml";

/// Fixed location of the run settings
pub const CONFIG_PATH: &str = "./config.yaml";

/// Dimensions of one operand and the bounding box of the block to update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixSpec {
    pub num_rows: usize,
    pub num_cols: usize,
    /// `[first_row, first_col, end_row, end_col]`
    pub bbox: Vec<usize>,
}

/// Contents of `params.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemParams {
    #[serde(rename = "MatA")]
    pub mat_a: MatrixSpec,
    #[serde(rename = "MatB")]
    pub mat_b: MatrixSpec,
    pub alpha: Real,
    pub beta: Real,
    #[serde(default)]
    pub trans_a: bool,
    #[serde(default)]
    pub trans_b: bool,
}

/// Contents of `config.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Memory budget in gigabytes
    #[serde(alias = "allocated_mem")]
    pub allocate_mem: f64,
    pub num_repeats: usize,
    #[serde(default)]
    pub device_id: usize,
    #[serde(default)]
    pub surface: ExecutionSurface,
    #[serde(default)]
    pub addressing: Addressing,
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    #[serde(default)]
    pub validate: bool,
    #[serde(default)]
    pub report_json: Option<PathBuf>,
    #[serde(default = "default_shared_mem_repeats")]
    pub shared_mem_repeats: u32,
}

fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

fn default_shared_mem_repeats() -> u32 {
    1_000_000
}

/// Batch geometry derived from [`ProblemParams`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CsaProblem {
    pub params: CsaParams,
    /// Values between consecutive A operands (`num_rows * num_cols` of A)
    pub offset_a: usize,
    /// Values between consecutive B operands (`num_rows * num_cols` of B)
    pub offset_b: usize,
    /// Storage index of the first updated cell of every A operand
    pub first_a: usize,
    /// Storage index of the first updated cell of every B operand
    pub first_b: usize,
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| BenchError::config(path.display().to_string(), format!("cannot read: {}", e)))
}

fn parse<T: for<'de> Deserialize<'de>>(source: &str, yaml: &str) -> Result<T> {
    serde_yaml::from_str(yaml).map_err(|e| BenchError::config(source.to_string(), e.to_string()))
}

impl MatrixSpec {
    fn validate(&self, name: &str) -> Result<()> {
        if self.num_rows == 0 || self.num_cols == 0 {
            return Err(BenchError::config(
                format!("{}.num_rows/num_cols", name),
                "matrix storage must be non-empty".to_string(),
            ));
        }
        if self.bbox.len() != 4 {
            return Err(BenchError::config(
                format!("{}.bbox", name),
                format!("expected 4 entries, got {}", self.bbox.len()),
            ));
        }
        if self.bbox[2] < self.bbox[0] || self.bbox[3] < self.bbox[1] {
            return Err(BenchError::config(
                format!("{}.bbox", name),
                format!("inverted bounding box {:?}", self.bbox),
            ));
        }
        if self.bbox[2] > self.num_rows || self.bbox[3] > self.num_cols {
            return Err(BenchError::config(
                format!("{}.bbox", name),
                format!(
                    "bounding box {:?} reaches outside {}x{} storage",
                    self.bbox, self.num_rows, self.num_cols
                ),
            ));
        }
        Ok(())
    }

    /// Column-major storage index of the bounding box's first cell
    pub fn first(&self) -> usize {
        self.num_rows * self.bbox[1] + self.bbox[0]
    }

    /// Rows and columns spanned by the bounding box
    pub fn extent(&self) -> (usize, usize) {
        (self.bbox[2] - self.bbox[0], self.bbox[3] - self.bbox[1])
    }

    pub fn size(&self) -> usize {
        self.num_rows * self.num_cols
    }
}

impl ProblemParams {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let params: Self = parse(&path.display().to_string(), &read(path)?)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let params: Self = parse("params", yaml)?;
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> Result<()> {
        self.mat_a.validate("MatA")?;
        self.mat_b.validate("MatB")?;
        let (m, n) = self.mat_a.extent();
        let (m_b, n_b) = self.mat_b.extent();
        if (m, n) != (m_b, n_b) {
            return Err(BenchError::config(
                "MatB.bbox".to_string(),
                format!("{}x{} block does not match the {}x{} block of MatA", m_b, n_b, m, n),
            ));
        }
        if !self.alpha.is_finite() || !self.beta.is_finite() {
            return Err(BenchError::config(
                "alpha/beta".to_string(),
                "coefficients must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Shape of the update: block size from the bounding boxes, leading
    /// dimensions from the storage row counts, each operand's block starting
    /// at its own bounding-box origin
    pub fn problem(&self) -> CsaProblem {
        let (m, n) = self.mat_a.extent();
        let layout = |trans: bool| if trans { Transpose::Trans } else { Transpose::NoTrans };
        let params = CsaParams::new(m, n, self.alpha, self.beta)
            .with_lds(self.mat_a.num_rows, self.mat_b.num_rows)
            .with_layouts(layout(self.trans_a), layout(self.trans_b));
        CsaProblem {
            params,
            offset_a: self.mat_a.size(),
            offset_b: self.mat_b.size(),
            first_a: self.mat_a.first(),
            first_b: self.mat_b.first(),
        }
    }
}

impl CsaProblem {
    /// Checks the leading dimensions and that every element's block, from
    /// its first cell, stays inside the element's own storage slot
    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;
        let sides = [
            ("A", self.first_a, self.params.span_a(), self.offset_a),
            ("B", self.first_b, self.params.span_b(), self.offset_b),
        ];
        for (side, first, span, offset) in sides {
            if first + span > offset {
                return Err(BenchError::invalid_parameter(
                    format!("offset_{}", side.to_lowercase()),
                    format!("block spanning {} values from index {} overruns a {}-value slot", span, first, offset),
                ));
            }
        }
        Ok(())
    }
}

impl RunConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config: Self = parse(&path.display().to_string(), &read(path)?)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = parse("config", yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(self.allocate_mem.is_finite() && self.allocate_mem > 0.0) {
            return Err(BenchError::config(
                "allocate_mem".to_string(),
                format!("must be a positive number of gigabytes, got {}", self.allocate_mem),
            ));
        }
        if self.num_repeats == 0 {
            return Err(BenchError::config("num_repeats", "must be at least 1"));
        }
        if self.block_size == 0 {
            return Err(BenchError::config("block_size", "must be at least 1"));
        }
        if self.shared_mem_repeats == 0 {
            return Err(BenchError::config("shared_mem_repeats", "must be at least 1"));
        }
        Ok(())
    }
}

//! Textual and JSON output of benchmark results

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;

/// A benchmark result that prints as `key: value` lines
pub trait Report: Serialize {
    fn lines(&self) -> Vec<(&'static str, String)>;

    /// Render the lines, one per row, aligned on the colon
    fn render(&self) -> String {
        let lines = self.lines();
        let width = lines.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
        lines
            .iter()
            .map(|(key, value)| format!("{:<width$}: {}\n", key, value, width = width))
            .collect()
    }

    fn print(&self) {
        print!("{}", self.render());
    }

    /// Write the result as pretty JSON
    fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

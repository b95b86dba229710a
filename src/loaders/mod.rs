//! Data sources feeding the pipeline.
//!
//! The primary loader turns size-tool output into rows; the symbol table
//! and the linker map only enrich rows that already exist.

use std::path::Path;

use crate::error::Result;
use crate::row::DataRow;

pub mod bloaty;
pub mod build_definitions;
pub mod map_file;
pub mod tool;

pub use bloaty::BloatyLoader;
pub use build_definitions::BuildDefinitionLoader;

/// Source of raw rows. `sections` restricts the result when given.
pub trait RowDataLoader {
    fn load_from_file(&self, bin_file: &Path, sections: Option<&[String]>) -> Result<Vec<DataRow>>;

    fn load_from_csv(&self, csv: &str, sections: Option<&[String]>) -> Result<Vec<DataRow>>;
}

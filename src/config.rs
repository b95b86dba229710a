//! Configuration for the size-attribution pipeline.
//!
//! Provides centralized configuration with defaults matching a firmware
//! `core/` checkout, loadable from a JSON file and overridable from the CLI.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BinSizeError, Result};

/// Where source files live, used to turn symbols into module paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceLayout {
    /// Root directory all module paths are relative to.
    pub core_dir: PathBuf,
    /// Source root of the compiled systems-language crate, relative to `core_dir`.
    pub rust_source_root: String,
    /// Crate name that prefixes every symbol of the firmware crate.
    pub rust_crate_name: String,
    /// Source root of frozen bytecode modules, relative to `core_dir`.
    pub mpy_source_root: String,
    /// Prefix put in front of module paths that do not exist on disk.
    pub unresolved_marker: String,
}

impl Default for SourceLayout {
    fn default() -> Self {
        Self {
            core_dir: PathBuf::from("."),
            rust_source_root: "embed/rust/src".to_string(),
            rust_crate_name: "trezor_lib".to_string(),
            mpy_source_root: "src".to_string(),
            unresolved_marker: "--invalid_file--".to_string(),
        }
    }
}

impl SourceLayout {
    /// Layout rooted at `core_dir` with all other fields defaulted.
    pub fn with_core_dir(core_dir: impl Into<PathBuf>) -> Self {
        Self {
            core_dir: core_dir.into(),
            ..Self::default()
        }
    }

    /// Absolute (or cwd-relative) location of a module path.
    pub fn resolve(&self, module_path: &str) -> PathBuf {
        self.core_dir.join(module_path)
    }

    pub fn exists(&self, module_path: &str) -> bool {
        self.resolve(module_path).is_file()
    }

    pub fn mark_unresolved(&self, module_path: &str) -> String {
        format!("{}{}", self.unresolved_marker, module_path)
    }

    pub fn is_unresolved(&self, module_path: &str) -> bool {
        module_path.starts_with(&self.unresolved_marker)
    }
}

/// Master configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinSizeConfig {
    pub layout: SourceLayout,
    /// Stripped from symbol-table file paths to make them repository-relative.
    pub repo_root_marker: String,
    /// Primary size-analysis tool.
    pub bloaty_program: String,
    /// Symbol-table extraction tool.
    pub nm_program: String,
    /// CSV column holding the size of a row.
    pub size_column: String,
    /// Sections analysed when none are given explicitly.
    pub sections: Vec<String>,
    /// Persisted definition cache.
    pub cache_file: PathBuf,
}

impl Default for BinSizeConfig {
    fn default() -> Self {
        Self {
            layout: SourceLayout::default(),
            repo_root_marker: "trezor-firmware/core/".to_string(),
            bloaty_program: "bloaty".to_string(),
            nm_program: "arm-none-eabi-nm".to_string(),
            size_column: "filesize".to_string(),
            sections: vec![".flash".to_string(), ".flash2".to_string()],
            cache_file: PathBuf::from("DEFINITIONS_CACHE.json"),
        }
    }
}

impl BinSizeConfig {
    /// Load a configuration file; missing fields fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            BinSizeError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| BinSizeError::Config(e.to_string()))
    }
}

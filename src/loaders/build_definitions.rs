//! `symbol -> file:line` from the symbol table of the binary.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Path;

use tracing::{debug, info};

use super::tool::run_tool;
use crate::config::BinSizeConfig;
use crate::error::Result;
use crate::row::DataRow;

#[derive(Debug, Clone, Default)]
pub struct BuildDefinitionLoader {
    program: String,
    repo_root_marker: String,
    definitions: HashMap<String, String>,
}

impl BuildDefinitionLoader {
    pub fn new(program: impl Into<String>, repo_root_marker: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            repo_root_marker: repo_root_marker.into(),
            definitions: HashMap::new(),
        }
    }

    pub fn from_config(config: &BinSizeConfig) -> Self {
        Self::new(&config.nm_program, &config.repo_root_marker)
    }

    /// Run the symbol-table tool on `bin_file` and collect its definitions.
    pub fn load(&mut self, bin_file: &Path) -> Result<()> {
        let mut args: Vec<OsString> = ["--line-numbers", "--radix=dec", "--size-sort"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(bin_file.as_os_str().to_os_string());
        let output = run_tool(&self.program, &args)?;
        self.load_nm_output(&output);
        info!(definitions = self.definitions.len(), "Loaded build definitions");
        Ok(())
    }

    /// Collect `size type symbol file:line` lines; anything else is ignored.
    pub fn load_nm_output(&mut self, output: &str) {
        for line in output.lines() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let &[_size, _kind, symbol, definition] = tokens.as_slice() else {
                continue;
            };
            let definition = match definition.split_once(self.repo_root_marker.as_str()) {
                Some((_, relative)) if !self.repo_root_marker.is_empty() => relative,
                _ => definition,
            };
            self.definitions.insert(symbol.to_string(), definition.to_string());
        }
        debug!(definitions = self.definitions.len(), "Parsed symbol table");
    }

    pub fn get(&self, symbol: &str) -> Option<&str> {
        self.definitions.get(symbol).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Fill `build_definition` of every row the symbol table knows about.
    pub fn apply(&self, rows: &mut [DataRow]) {
        for row in rows {
            if let Some(definition) = self.get(&row.symbol_name) {
                row.build_definition = definition.to_string();
            }
        }
    }
}

//! The size-attribution record and its identity rule.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BinSizeError;

/// Source language a symbol was emitted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    /// Native C code (the default for anything not matching another convention)
    Native,
    /// Compiled systems-language (Rust) code
    Rust,
    /// Frozen bytecode of the embedded MicroPython runtime
    MicroPython,
    /// Not classified yet, or classification failed
    #[default]
    Unknown,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Native => "C",
            Language::Rust => "Rust",
            Language::MicroPython => "mpy",
            Language::Unknown => "",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = BinSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "c" | "native" => Ok(Language::Native),
            "rust" => Ok(Language::Rust),
            "mpy" | "micropython" => Ok(Language::MicroPython),
            "unknown" => Ok(Language::Unknown),
            other => Err(BinSizeError::InvalidInput(format!(
                "unknown language `{other}` (expected C, Rust or mpy)"
            ))),
        }
    }
}

/// One symbol (or an aggregate of alike symbols) with its size.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataRow {
    /// Raw symbol as reported by the size-analysis tool
    pub symbol_name: String,
    pub section: String,
    pub size: u64,

    // Filled by classification
    pub language: Language,
    /// Function, possibly qualified by its owning type
    pub function_name: String,
    /// Source file candidate the symbol comes from
    pub module_name: String,

    /// `file:line` reported by the symbol-table tool
    pub build_definition: String,
    /// `file:line` found by searching the source text
    pub source_definition: String,
}

impl DataRow {
    pub fn new(symbol_name: impl Into<String>, section: impl Into<String>, size: u64) -> Self {
        Self {
            symbol_name: symbol_name.into(),
            section: section.into(),
            size,
            ..Self::default()
        }
    }

    /// Identity used when aggregating alike rows.
    ///
    /// Rows without any classification info are always distinct by their
    /// raw symbol.
    pub fn id(&self) -> String {
        if !self.module_name.is_empty() && !self.function_name.is_empty() {
            format!("{}::{}", self.module_name, self.function_name)
        } else if !self.function_name.is_empty() {
            self.function_name.clone()
        } else {
            self.symbol_name.clone()
        }
    }

    /// Best available human-readable name.
    pub fn display_name(&self) -> String {
        if !self.source_definition.is_empty() {
            format!("{:<60} {}", self.source_definition, self.function_name)
        } else if !self.module_name.is_empty() {
            format!("{:<60} {}", self.module_name, self.function_name)
        } else if !self.function_name.is_empty() {
            self.function_name.clone()
        } else {
            self.symbol_name.clone()
        }
    }

    /// One report line; `debug` appends the raw symbol.
    pub fn format(&self, debug: bool) -> String {
        let size = group_thousands(self.size);
        let name = self.display_name();
        if debug {
            format!(
                "{:<10} {:<7} {:<100} {}",
                self.section, size, name, self.symbol_name
            )
        } else {
            format!("{:<10} {:<7} {}", self.section, size, name)
        }
    }
}

impl fmt::Display for DataRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {} {}",
            self.symbol_name,
            self.section,
            self.size,
            self.language,
            self.function_name,
            self.module_name,
            self.build_definition,
            self.source_definition
        )
    }
}

/// `1234567` -> `1_234_567`
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('_');
        }
        out.push(ch);
    }
    out
}

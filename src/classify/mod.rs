//! # Classify Module
//!
//! Maps raw symbols to a source language, module and function. Which
//! handler applies is decided purely from the symbol's naming convention;
//! every handler then fills the row in place and knows how to locate the
//! symbol's definition in source text.

use crate::config::SourceLayout;
use crate::row::{DataRow, Language};

pub mod micropython;
pub mod native;
pub mod patterns;
pub mod rust;

/// The closed set of per-language handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolHandler {
    Native,
    Rust,
    MicroPython,
}

impl SymbolHandler {
    /// Pick the handler by naming convention; anything unrecognised is native.
    pub fn for_symbol(symbol: &str) -> Self {
        if micropython::is_mpy_symbol(symbol) {
            SymbolHandler::MicroPython
        } else if rust::is_rust_symbol(symbol) {
            SymbolHandler::Rust
        } else {
            SymbolHandler::Native
        }
    }

    pub fn for_row(row: &DataRow) -> Self {
        Self::for_symbol(&row.symbol_name)
    }

    pub fn language(self) -> Language {
        match self {
            SymbolHandler::Native => Language::Native,
            SymbolHandler::Rust => Language::Rust,
            SymbolHandler::MicroPython => Language::MicroPython,
        }
    }

    /// Fill language, module and function. Size is never touched.
    pub fn add_basic_info(self, row: &mut DataRow, layout: &SourceLayout) {
        match self {
            SymbolHandler::Native => native::add_basic_info(row),
            SymbolHandler::Rust => rust::add_basic_info(row, layout),
            SymbolHandler::MicroPython => micropython::add_basic_info(row, layout),
        }
    }

    /// `file:line` of the definition, empty when it cannot be found.
    pub fn find_definition(self, row: &DataRow, layout: &SourceLayout) -> String {
        match self {
            SymbolHandler::Native => native::find_definition(row),
            SymbolHandler::Rust => rust::find_definition(row, layout),
            SymbolHandler::MicroPython => micropython::find_definition(row, layout),
        }
    }
}

/// Classify one row in place.
pub fn classify_row(row: &mut DataRow, layout: &SourceLayout) {
    SymbolHandler::for_row(row).add_basic_info(row, layout);
}

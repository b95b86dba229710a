//! Handler for native C symbols, the default for everything else.
//!
//! C symbols are not mangled; where they come from is only known through
//! the build definition reported by the symbol-table tool, which for C is
//! also the source definition.

use crate::classify::patterns::RE_BUCKET_SYMBOL;
use crate::definitions::file_of_definition;
use crate::row::{DataRow, Language};

pub fn is_bucket_symbol(symbol: &str) -> bool {
    RE_BUCKET_SYMBOL.is_match(symbol)
}

pub fn add_basic_info(row: &mut DataRow) {
    // Bytes the size tool could not attribute to any symbol
    if is_bucket_symbol(&row.symbol_name) {
        row.language = Language::Unknown;
        return;
    }
    row.language = Language::Native;
    row.function_name = row.symbol_name.clone();
    if !row.build_definition.is_empty() {
        row.module_name = file_of_definition(&row.build_definition).to_string();
    }
}

pub fn find_definition(row: &DataRow) -> String {
    row.build_definition.clone()
}

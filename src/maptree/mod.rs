//! # Map Tree
//!
//! Independent view of a linker map: input sections of the selected output
//! sections are arranged in a path-compressed character trie so that common
//! prefixes (`.text.#Rust#trezor_lib::ui::...`) roll up into subtotals.

pub mod parse;
pub mod trie;

pub use parse::{parse_map, Entry, MemoryMap, Section};
pub use trie::{SectionTrie, TrieNode};

use tracing::info;

use crate::error::Result;

/// Output sections reported when none are requested.
pub const DEFAULT_SECTIONS: &[&str] = &[".flash", ".data"];

/// Pruned trie over the input sections of `sections`.
pub fn build_tree(map_text: &str, sections: &[String]) -> Result<SectionTrie> {
    let map = parse_map(map_text)?;
    let selected = map.select(sections)?;
    info!(sections = ?sections, input_sections = selected.len(), "Building map tree");
    Ok(SectionTrie::build(selected).prune())
}

/// Rendered nested size report for `sections` of a linker map.
pub fn map_tree_report(map_text: &str, sections: &[String]) -> Result<String> {
    Ok(build_tree(map_text, sections)?.render())
}

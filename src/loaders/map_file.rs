//! Recovering symbols the size tool folded into `[section X]` bucket rows.
//!
//! The linker map lists every input section, so symbols present there but
//! absent from the loaded rows get their own row, and the bucket row of the
//! section shrinks by the same amount. Section totals never change.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::classify::patterns::{RE_DEMANGLED_RUST_HASH, RE_MANGLED_RUST_HASH};
use crate::error::Result;
use crate::maptree::parse::{parse_map, Section};
use crate::row::DataRow;

/// Input-section prefixes in front of the symbol name.
const INPUT_SECTION_PREFIXES: &[&str] = &[".text.", ".rodata.", ".data.", ".bss.", ".sdata.", ".sbss."];

pub fn bucket_symbol(section: &str) -> String {
    format!("[section {section}]")
}

/// `.text.foo` -> `foo`; `None` for sections not named after a symbol.
pub fn symbol_of_input_section(raw_name: &str) -> Option<&str> {
    INPUT_SECTION_PREFIXES
        .iter()
        .find_map(|prefix| raw_name.strip_prefix(prefix))
        .filter(|symbol| !symbol.is_empty())
}

/// Summed size of every symbol of one output section.
pub fn symbol_sizes(sections: &[Section]) -> IndexMap<String, u64> {
    let mut sizes: IndexMap<String, u64> = IndexMap::new();
    for section in sections {
        let Some(symbol) = symbol_of_input_section(&section.raw_name) else {
            continue;
        };
        sizes
            .entry(symbol.to_string())
            .and_modify(|size| *size += section.total_size())
            .or_insert(section.total_size());
    }
    sizes
}

fn mangled_hash(symbol: &str) -> Option<&str> {
    RE_MANGLED_RUST_HASH
        .captures(symbol)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn demangled_hash(symbol: &str) -> Option<&str> {
    RE_DEMANGLED_RUST_HASH
        .captures(symbol)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Map symbols of `section` that no row accounts for.
pub fn symbols_we_miss(
    rows: &[DataRow],
    map_sizes: &IndexMap<String, u64>,
    section: &str,
) -> HashSet<String> {
    let in_section = rows.iter().filter(|row| row.section == section);
    let mut names: HashSet<&str> = HashSet::new();
    let mut hashes: HashSet<&str> = HashSet::new();
    for row in in_section {
        names.insert(&row.symbol_name);
        if let Some(hash) = demangled_hash(&row.symbol_name) {
            hashes.insert(hash);
        }
    }

    map_sizes
        .keys()
        .filter(|symbol| !names.contains(symbol.as_str()))
        .filter(|symbol| mangled_hash(symbol).map_or(true, |hash| !hashes.contains(hash)))
        .cloned()
        .collect()
}

/// Append a row per missing symbol, largest first; returns the bytes added.
pub fn add_map_file_info(
    rows: &mut Vec<DataRow>,
    map_sizes: &IndexMap<String, u64>,
    missing: &HashSet<String>,
    section: &str,
) -> u64 {
    let mut found: Vec<(&str, u64)> = missing
        .iter()
        .filter_map(|symbol| {
            let size = *map_sizes.get(symbol)?;
            (size > 0).then_some((symbol.as_str(), size))
        })
        .collect();
    found.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut added = 0;
    for (symbol, size) in found {
        rows.push(DataRow::new(symbol, section, size));
        added += size;
    }
    added
}

/// Shrink the bucket row of `section`; `false` when there is none.
pub fn decrease_bucket_size(rows: &mut [DataRow], section: &str, added_size: u64) -> bool {
    let bucket = bucket_symbol(section);
    match rows
        .iter_mut()
        .find(|row| row.section == section && row.symbol_name == bucket)
    {
        Some(row) => {
            row.size = row.size.saturating_sub(added_size);
            true
        }
        None => false,
    }
}

/// Move bytes out of the bucket rows of `sections` into per-symbol rows.
pub fn include_map_file(rows: &mut Vec<DataRow>, map_text: &str, sections: &[String]) -> Result<()> {
    let map = parse_map(map_text)?;

    for section in sections {
        let Some(map_sections) = map.super_section(section) else {
            warn!(section = %section, "Section not in map file, skipping");
            continue;
        };
        let bucket = bucket_symbol(section);
        let Some(bucket_size) = rows
            .iter()
            .find(|row| row.section == *section && row.symbol_name == bucket)
            .map(|row| row.size)
        else {
            info!(section = %section, "No bucket row, nothing to recover");
            continue;
        };

        let sizes = symbol_sizes(map_sections);
        let missing = symbols_we_miss(rows, &sizes, section);
        let reclaimable: u64 = missing.iter().filter_map(|s| sizes.get(s)).sum();
        if reclaimable > bucket_size {
            warn!(
                section = %section,
                reclaimable,
                bucket_size,
                "Map accounts for more than the bucket row holds, skipping section"
            );
            continue;
        }

        let added = add_map_file_info(rows, &sizes, &missing, section);
        decrease_bucket_size(rows, section, added);
        info!(section = %section, symbols = missing.len(), bytes = added, "Recovered symbols from map file");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_data() -> Vec<DataRow> {
        vec![
            DataRow::new("[section .flash]", ".flash", 14),
            DataRow::new("aaa", ".flash", 2),
            DataRow::new("bbb", ".flash", 2),
            DataRow::new("ccc", ".flash", 2),
            DataRow::new("ddd", ".flash", 2),
            DataRow::new(
                "core::option::Option$LT$T$GT$::map_or_else::hee63c66131f899de",
                ".flash",
                4,
            ),
            DataRow::new("[section .flash2]", ".flash2", 14),
            DataRow::new("eee", ".flash2", 2),
            DataRow::new("fff", ".flash2", 2),
        ]
    }

    fn map_symbol_sizes() -> IndexMap<String, u64> {
        [
            ("aaa", 1),
            ("bbb.str1.1", 2),
            ("zzz", 3),
            ("_ZN4core6option15Option<T>11map_or_else17hee63c66131f899deE", 4),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    fn missing() -> HashSet<String> {
        ["bbb.str1.1", "zzz"].into_iter().map(String::from).collect()
    }

    #[test]
    fn test_symbols_we_miss() {
        let res = symbols_we_miss(&row_data(), &map_symbol_sizes(), ".flash");
        assert_eq!(res, missing());
    }

    #[test]
    fn test_add_map_file_info() {
        let mut rows = row_data();
        let added = add_map_file_info(&mut rows, &map_symbol_sizes(), &missing(), ".flash");
        assert_eq!(added, 5);
        assert_eq!(rows.len(), 11);
        assert_eq!(rows[..9], row_data()[..]);
        assert_eq!(rows[9], DataRow::new("zzz", ".flash", 3));
        assert_eq!(rows[10], DataRow::new("bbb.str1.1", ".flash", 2));
    }

    #[test]
    fn test_decrease_bucket_size() {
        let mut rows = row_data();
        assert!(decrease_bucket_size(&mut rows, ".flash", 5));
        assert_eq!(rows.len(), 9);
        assert_eq!(rows[0], DataRow::new("[section .flash]", ".flash", 9));
        assert_eq!(rows[1..], row_data()[1..]);
        assert!(!decrease_bucket_size(&mut rows, ".bss", 5));
    }

    #[test]
    fn test_symbol_of_input_section() {
        assert_eq!(symbol_of_input_section(".text.aaa"), Some("aaa"));
        assert_eq!(symbol_of_input_section(".rodata.bbb.str1.1"), Some("bbb.str1.1"));
        assert_eq!(symbol_of_input_section(".text"), None);
        assert_eq!(symbol_of_input_section("*(.text*)"), None);
    }

    const MAP: &str = "\
Linker script and memory map

.flash          0x08000000       0x20
 .text.aaa      0x08000000        0x1 a.o
 .rodata.bbb.str1.1
                0x08000001        0x2 b.o
 .text.zzz      0x08000003        0x3 z.o
 .text._ZN4core6option15Option<T>11map_or_else17hee63c66131f899deE
                0x08000008        0x4 core.o
.flash2         0x08100000       0x10
 .text.eee      0x08100000        0x2 e.o
";

    #[test]
    fn test_include_map_file_keeps_section_total() {
        let mut rows = row_data();
        let total_before: u64 = rows.iter().filter(|r| r.section == ".flash").map(|r| r.size).sum();

        include_map_file(&mut rows, MAP, &[".flash".to_string(), ".flash2".to_string()]).unwrap();

        let total_after: u64 = rows.iter().filter(|r| r.section == ".flash").map(|r| r.size).sum();
        assert_eq!(total_before, total_after);
        assert_eq!(rows[0].size, 9);
        assert_eq!(rows.len(), 11);
        // .flash2 has nothing missing
        assert_eq!(rows[6].size, 14);
    }

    #[test]
    fn test_oversized_map_leaves_rows_alone() {
        let mut rows = vec![DataRow::new("[section .flash]", ".flash", 1)];
        include_map_file(&mut rows, MAP, &[".flash".to_string()]).unwrap();
        assert_eq!(rows, vec![DataRow::new("[section .flash]", ".flash", 1)]);
    }
}

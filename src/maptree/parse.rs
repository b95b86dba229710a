//! GNU ld memory-map parser.
//!
//! Only the region after the `Linker script and memory map` banner is read.
//! Unindented lines starting with `.` open an output (super-)section;
//! indented lines either name a new input section or carry an
//! `address size comment` entry for the current one.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::classify::rust::{split_path, strip_hash_suffix};
use crate::error::{BinSizeError, Result};

pub const LINKER_SCRIPT_START: &str = "Linker script and memory map";

/// Escapes left behind by demanglers that do not know the legacy Rust scheme.
const REPLACEMENTS: &[(&str, &str)] = &[
    ("$LT$", "<"),
    ("$GT$", ">"),
    ("$u20$", " "),
    ("$RF$", "&"),
    ("..", "::"),
];

/// `.text._ZN...` -> (`.text.`, `_ZN...`)
static RE_MANGLED_INPUT_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\..*?)(_Z.*)$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub address: u64,
    pub size: u64,
    pub comment: String,
}

/// One input section of the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Display name, Rust paths demangled and truncated to their owner
    pub name: String,
    /// Name exactly as it appears in the map
    pub raw_name: String,
    pub entries: Vec<Entry>,
}

impl Section {
    pub fn new(raw_name: &str) -> Self {
        Self {
            name: demangle_section_name(raw_name),
            raw_name: raw_name.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }
}

/// Parsed memory map: output section name -> its input sections, in map order.
#[derive(Debug, Clone, Default)]
pub struct MemoryMap {
    super_sections: IndexMap<String, Vec<Section>>,
}

impl MemoryMap {
    pub fn super_section(&self, name: &str) -> Option<&[Section]> {
        self.super_sections.get(name).map(Vec::as_slice)
    }

    pub fn super_section_names(&self) -> impl Iterator<Item = &str> {
        self.super_sections.keys().map(String::as_str)
    }

    /// Input sections of all the named output sections, concatenated.
    pub fn select(&self, names: &[String]) -> Result<Vec<&Section>> {
        let mut selected = Vec::new();
        for name in names {
            let sections = self.super_section(name).ok_or_else(|| {
                BinSizeError::MapFile(format!("section `{name}` not found in map"))
            })?;
            selected.extend(sections.iter());
        }
        Ok(selected)
    }
}

/// Readable name for an input section.
///
/// `.text._ZN4core3fmt5write17h0123456789abcdefE` becomes
/// `.text.#Rust#core::fmt`; names that are not mangled are returned as is.
pub fn demangle_section_name(name: &str) -> String {
    let Some(caps) = RE_MANGLED_INPUT_SECTION.captures(name) else {
        return name.to_string();
    };
    let (prefix, mangled) = (&caps[1], &caps[2]);

    let mut demangled = match rustc_demangle::try_demangle(mangled) {
        Ok(dm) => dm.to_string(),
        Err(_) => match cpp_demangle::Symbol::new(mangled) {
            Ok(sym) => sym.to_string(),
            Err(_) => return name.to_string(),
        },
    };
    for (from, to) in REPLACEMENTS {
        demangled = demangled.replace(from, to);
    }

    let path = strip_hash_suffix(&demangled);
    let segments = split_path(path);
    let owner = match segments.split_last() {
        Some((_, owner)) if !owner.is_empty() => owner.join("::"),
        _ => path.to_string(),
    };
    format!("{prefix}#Rust#{owner}")
}

fn parse_hex(token: &str) -> Option<u64> {
    let digits = token.strip_prefix("0x")?;
    u64::from_str_radix(digits, 16).ok()
}

/// `address size comment...`, tolerant of informational lines.
fn parse_entry(tokens: &[&str]) -> Entry {
    let mut rest = tokens;
    let mut unparsed: Vec<&str> = Vec::new();

    let address = match rest.split_first() {
        Some((first, tail)) => {
            rest = tail;
            parse_hex(first).unwrap_or_else(|| {
                unparsed.push(first);
                0
            })
        }
        None => 0,
    };
    let size = match rest.split_first() {
        Some((first, tail)) => {
            rest = tail;
            parse_hex(first).unwrap_or_else(|| {
                unparsed.push(first);
                0
            })
        }
        None => 0,
    };
    unparsed.extend_from_slice(rest);

    Entry {
        address,
        size,
        comment: unparsed.join(" "),
    }
}

/// Parse the memory-map region of linker map text.
pub fn parse_map(text: &str) -> Result<MemoryMap> {
    let mut lines = text.lines();
    if !lines.by_ref().any(|line| line.trim() == LINKER_SCRIPT_START) {
        return Err(BinSizeError::MapFile(format!(
            "map does not contain `{LINKER_SCRIPT_START}`"
        )));
    }

    let mut map = MemoryMap::default();
    let mut current_super: Option<String> = None;
    let mut have_section = false;

    for line in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();

        if line.starts_with('.') {
            let Some(name) = tokens.first() else { continue };
            map.super_sections.insert(name.to_string(), Vec::new());
            current_super = Some(name.to_string());
            have_section = false;
            continue;
        }
        if !line.starts_with(' ') || tokens.is_empty() {
            continue;
        }
        let Some(sections) = current_super
            .as_ref()
            .and_then(|name| map.super_sections.get_mut(name))
        else {
            continue;
        };

        let mut entry_tokens = tokens.as_slice();
        if !tokens[0].starts_with("0x") {
            sections.push(Section::new(tokens[0]));
            have_section = true;
            entry_tokens = &tokens[1..];
        }
        if entry_tokens.is_empty() || !have_section {
            continue;
        }
        if let Some(section) = sections.last_mut() {
            let entry = parse_entry(entry_tokens);
            if entry.size == 0 && !entry.comment.is_empty() {
                debug!(section = %section.raw_name, line = line.trim(), "Unsized map line");
            }
            section.entries.push(entry);
        }
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = "\
Archive member included to satisfy reference by file (symbol)

Memory Configuration

Linker script and memory map

LOAD build/firmware/main.o

.flash          0x08040000    0x10000
 *(.text*)
 .text.aaa      0x08040000        0x8 build/firmware/a.o
 .text.bbb      0x08040008       0x10 build/firmware/b.o
                0x08040008                bbb
 .text._ZN4core3fmt5write17h0123456789abcdefE
                0x08040018       0x20 libtrezor_lib.a(core.o)
                0x08040038                . = ALIGN (0x4)

.data           0x20000000      0x100
 .data.counter  0x20000000        0x4 build/firmware/c.o
";

    #[test]
    fn test_requires_banner() {
        let err = parse_map(".flash 0x0 0x0\n").unwrap_err();
        assert!(matches!(err, BinSizeError::MapFile(_)));
    }

    #[test]
    fn test_super_sections_and_entries() {
        let map = parse_map(MAP).unwrap();
        let names: Vec<&str> = map.super_section_names().collect();
        assert_eq!(names, vec![".flash", ".data"]);

        let flash = map.super_section(".flash").unwrap();
        let raw: Vec<&str> = flash.iter().map(|s| s.raw_name.as_str()).collect();
        assert_eq!(
            raw,
            vec![
                "*(.text*)",
                ".text.aaa",
                ".text.bbb",
                ".text._ZN4core3fmt5write17h0123456789abcdefE"
            ]
        );
        assert_eq!(flash[0].total_size(), 0);
        assert_eq!(flash[1].total_size(), 8);
        assert_eq!(flash[1].entries[0].address, 0x08040000);
        assert_eq!(flash[1].entries[0].comment, "build/firmware/a.o");

        // symbol line folds into the comment with size 0
        assert_eq!(flash[2].total_size(), 0x10);
        assert_eq!(flash[2].entries[1].size, 0);
        assert_eq!(flash[2].entries[1].comment, "bbb");

        // name and entry on separate lines
        assert_eq!(flash[3].total_size(), 0x20);
        assert_eq!(flash[3].name, ".text.#Rust#core::fmt");

        assert_eq!(map.super_section(".data").unwrap()[0].total_size(), 4);
    }

    #[test]
    fn test_select_unknown_section_fails() {
        let map = parse_map(MAP).unwrap();
        assert_eq!(map.select(&[".data".to_string()]).unwrap().len(), 1);
        assert!(map.select(&[".nope".to_string()]).is_err());
    }

    #[test]
    fn test_demangle_section_name() {
        assert_eq!(demangle_section_name(".text.aaa"), ".text.aaa");
        assert_eq!(
            demangle_section_name(".text._ZN4core3fmt5write17h0123456789abcdefE"),
            ".text.#Rust#core::fmt"
        );
        assert_eq!(
            demangle_section_name(".rodata._ZN10trezor_lib2ui6layout3obj8LAYOUT_017h0123456789abcdefE"),
            ".rodata.#Rust#trezor_lib::ui::layout::obj"
        );
        // Last segment is cut at bracket depth 0 only
        assert_eq!(
            demangle_section_name(
                ".text._ZN105_$LT$trezor_lib..protobuf..encode..BufferStream$u20$as$u20$trezor_lib..protobuf..encode..OutputStream$GT$5write17h0123456789abcdefE"
            ),
            ".text.#Rust#<trezor_lib::protobuf::encode::BufferStream as trezor_lib::protobuf::encode::OutputStream>"
        );
    }

    #[test]
    fn test_entry_tolerates_garbage() {
        let entry = parse_entry(&["PROVIDE", "(end", "=", ".)"]);
        assert_eq!(entry.address, 0);
        assert_eq!(entry.size, 0);
        assert_eq!(entry.comment, "PROVIDE (end = .)");
    }
}

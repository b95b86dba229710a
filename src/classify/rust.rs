//! Handler for symbols of the firmware's Rust crate.
//!
//! Demangled Rust paths map almost one-to-one onto source files:
//! `trezor_lib::protobuf::decode::Decoder::decode_field::h<hash>` lives in
//! `embed/rust/src/protobuf/decode.rs` as `Decoder::decode_field()`.

use std::borrow::Cow;

use crate::classify::patterns;
use crate::config::SourceLayout;
use crate::definitions::search;
use crate::row::{DataRow, Language};

/// Length of the legacy symbol hash (`h` + 16 hex digits).
pub const HASH_SUFFIX_LEN: usize = 16;

/// Whether a symbol looks like it came out of rustc.
pub fn is_rust_symbol(symbol: &str) -> bool {
    symbol.contains("::") || rustc_demangle::try_demangle(symbol).is_ok()
}

/// Demangled form of a still-mangled symbol, the symbol itself otherwise.
pub fn demangled(symbol: &str) -> Cow<'_, str> {
    match rustc_demangle::try_demangle(symbol) {
        Ok(dm) => Cow::Owned(dm.to_string()),
        Err(_) => Cow::Borrowed(symbol),
    }
}

/// Drop a trailing hex hash (and the `::h` in front of it) when present.
///
/// Matching functions that differ only in their hash (the same function
/// emitted twice) requires this.
pub fn strip_hash_suffix(name: &str) -> &str {
    if name.len() < HASH_SUFFIX_LEN {
        return name;
    }
    let split = name.len() - HASH_SUFFIX_LEN;
    if !name.is_char_boundary(split) {
        return name;
    }
    let (head, tail) = name.split_at(split);
    if !tail.bytes().all(|b| b.is_ascii_hexdigit()) || u64::from_str_radix(tail, 16).is_err() {
        return name;
    }
    head.strip_suffix("::h").unwrap_or(head)
}

/// Split a demangled path on `::` outside of `<...>` groups.
///
/// `a::<impl X for b::Y>::f` yields `a`, `<impl X for b::Y>`, `f`.
pub fn split_path(path: &str) -> Vec<&str> {
    let bytes = path.as_bytes();
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' => depth += 1,
            // `->` of fn pointer types is not a closing bracket
            b'>' if i == 0 || bytes[i - 1] != b'-' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                segments.push(&path[start..i]);
                i += 2;
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    segments.push(&path[start..]);
    segments
}

/// Path segments that are not path components of a source file.
fn is_relevant_segment(segment: &str, crate_name: &str) -> bool {
    // Crate root, also embedded in `_$LT$impl$u20$trezor_lib..x..y$GT$`
    if !crate_name.is_empty() && segment.contains(crate_name) {
        return false;
    }
    // Escaped generics/closures/lifetimes: `_$u7b$$u7b$closure$u7d$$u7d$`,
    // and their demangled forms `<impl X for Y>`, `drop_in_place<T>`
    if segment.contains('$') || segment.contains('{') || segment.contains('<') {
        return false;
    }
    // Local statics like `TYPE` inside a function body
    if segment.chars().all(char::is_uppercase) {
        return false;
    }
    true
}

/// Split a demangled path into `(module_path, function)`.
///
/// Returns `None` when fewer than two meaningful segments remain.
pub fn module_and_function(symbol: &str, layout: &SourceLayout) -> Option<(String, String)> {
    let symbol = demangled(symbol);
    let stripped = strip_hash_suffix(&symbol);
    let mut items: Vec<&str> = split_path(stripped)
        .into_iter()
        .filter(|segment| is_relevant_segment(segment, &layout.rust_crate_name))
        .collect();

    if items.len() < 2 {
        return None;
    }

    let function = items.pop()?;
    let owner = match items.last() {
        Some(last) if last.chars().next().is_some_and(char::is_uppercase) => items.pop(),
        _ => None,
    };

    let mut file_path = layout.rust_source_root.clone();
    for item in &items {
        file_path.push('/');
        file_path.push_str(item);
    }
    file_path.push_str(".rs");

    if !layout.exists(&file_path) {
        file_path = layout.mark_unresolved(&file_path);
    }

    let function = match owner {
        Some(owner) => format!("{owner}::{function}()"),
        None => format!("{function}()"),
    };
    Some((file_path, function))
}

pub fn add_basic_info(row: &mut DataRow, layout: &SourceLayout) {
    match module_and_function(&row.symbol_name, layout) {
        Some((module, function)) => {
            row.language = Language::Rust;
            row.module_name = module;
            row.function_name = function;
        }
        None => {
            row.language = Language::Unknown;
            row.module_name.clear();
            row.function_name.clear();
        }
    }
}

/// `module:line` of the function definition.
pub fn find_definition(row: &DataRow, layout: &SourceLayout) -> String {
    // Only a module, nothing to locate inside it
    if row.function_name.is_empty() {
        return row.module_name.clone();
    }
    if row.module_name.is_empty() || layout.is_unresolved(&row.module_name) {
        return String::new();
    }

    let unqualified = row.function_name.replace("()", "");
    let name = unqualified.rsplit("::").next().unwrap_or(&unqualified);
    match patterns::rust_fn_definition(name) {
        Some(pattern) => search::definition_in(&layout.core_dir, &row.module_name, &pattern),
        None => String::new(),
    }
}

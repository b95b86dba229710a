//! Precompiled regex patterns for symbol classification.

use once_cell::sync::Lazy;
use regex::Regex;

/// Pseudo-symbols the size tool emits for bytes it cannot attribute,
/// e.g. `[section .flash]` or `[Unmapped]`.
pub static RE_BUCKET_SYMBOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[.*\]$").expect("valid bucket symbol regex"));

/// Frozen MicroPython objects: `fun_data_`, `raw_code_`, `const_obj_` ...
pub static RE_MPY_SYMBOL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:fun_data|const_table_data|raw_code|const_obj|const_qstr_table_data|const_str)_(.+)$")
        .expect("valid mpy symbol regex")
});

/// Legacy Rust symbol hash as it appears in a mangled name (`17h<hash>E`).
pub static RE_MANGLED_RUST_HASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"17(h[0-9a-f]{16})E$").expect("valid mangled hash regex"));

/// Legacy Rust symbol hash as it appears in a demangled name (`::h<hash>`).
pub static RE_DEMANGLED_RUST_HASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"::(h[0-9a-f]{16})$").expect("valid demangled hash regex"));

/// Definition line for a function of a given name.
pub fn rust_fn_definition(name: &str) -> Option<Regex> {
    Regex::new(&format!(r"fn {}[(<]", regex::escape(name))).ok()
}

/// Definition line for a Python function or class of a given name.
pub fn python_definition(name: &str) -> Option<Regex> {
    let name = regex::escape(name);
    Regex::new(&format!(r"^\s*(?:async\s+)?def {name}\(|^\s*class {name}\b")).ok()
}

//! Symbol definitions: where in the source tree a symbol is defined.
//!
//! Searching source text is slow, so results are kept in a
//! [`DefinitionCache`] that survives between runs.

pub mod cache;
pub mod search;

pub use cache::{DefinitionCache, JsonDefinitionCache, MemoryDefinitionCache};

/// `vendor/trezor-crypto/nist256p1.c:26` -> `vendor/trezor-crypto/nist256p1.c`
pub fn file_of_definition(definition: &str) -> &str {
    match definition.rsplit_once(':') {
        Some((file, line)) if !line.is_empty() && line.bytes().all(|b| b.is_ascii_digit()) => file,
        _ => definition,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_of_definition() {
        assert_eq!(file_of_definition("a/b.c:10"), "a/b.c");
        assert_eq!(file_of_definition("a/b.c"), "a/b.c");
        assert_eq!(file_of_definition("C:/x.c:3"), "C:/x.c");
        assert_eq!(file_of_definition("a/b.c:"), "a/b.c:");
    }
}

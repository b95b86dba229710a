//! First-match definition lookup in source text.
//!
//! Only the first matching line is reported. Two functions with the same
//! name in one file (e.g. methods of different types) resolve to the
//! earlier one.

use std::path::Path;

use regex::Regex;
use tracing::debug;

/// 1-based line number of the first line matching `pattern`.
pub fn first_matching_line(path: &Path, pattern: &Regex) -> Option<usize> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "source file not readable");
            return None;
        }
    };
    let text = String::from_utf8_lossy(&data);
    text.lines()
        .position(|line| pattern.is_match(line))
        .map(|index| index + 1)
}

/// `"module:line"` for the first match, empty when nothing matches.
pub fn definition_in(core_dir: &Path, module_path: &str, pattern: &Regex) -> String {
    match first_matching_line(&core_dir.join(module_path), pattern) {
        Some(line) => format!("{module_path}:{line}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::patterns::rust_fn_definition;

    #[test]
    fn test_reports_first_match_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("lib.rs"),
            "// header\nimpl A {\n    fn run(&self) {}\n}\nimpl B {\n    fn run(&self) {}\n}\n",
        )
        .unwrap();

        let re = rust_fn_definition("run").unwrap();
        assert_eq!(first_matching_line(&dir.path().join("lib.rs"), &re), Some(3));
        assert_eq!(definition_in(dir.path(), "lib.rs", &re), "lib.rs:3");
    }

    #[test]
    fn test_missing_file_or_name_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("lib.rs"), "fn other() {}\n").unwrap();
        let re = rust_fn_definition("run").unwrap();
        assert_eq!(definition_in(dir.path(), "lib.rs", &re), "");
        assert_eq!(definition_in(dir.path(), "missing.rs", &re), "");
    }
}

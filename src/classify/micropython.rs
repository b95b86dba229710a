//! Handler for frozen MicroPython bytecode.
//!
//! Frozen modules are emitted into C with names such as
//! `fun_data_apps_workflow_handlers__lt_module_gt__find_message_handler_module`:
//! an object-kind prefix, the module path with `/` turned into `_`, the
//! `<module>` marker and the function. Underscores in the module path are
//! ambiguous, so the path is recovered by walking the source tree.

use std::path::Path;

use crate::classify::patterns::{self, RE_MPY_SYMBOL};
use crate::config::SourceLayout;
use crate::definitions::search;
use crate::row::{DataRow, Language};

const MODULE_MARKER: &str = "__lt_module_gt_";

pub fn is_mpy_symbol(symbol: &str) -> bool {
    RE_MPY_SYMBOL.is_match(symbol)
}

/// Walk `dir` consuming `tokens`, longest directory entry first.
///
/// With `require_all` the module file has to consume every token; otherwise
/// the first module file found wins and the number of consumed tokens is
/// returned alongside its path.
fn walk(
    dir: &Path,
    rel: &str,
    tokens: &[&str],
    require_all: bool,
) -> Option<(String, usize)> {
    for end in (1..=tokens.len()).rev() {
        let name = tokens[..end].join("_");
        let rel_name = format!("{rel}/{name}");
        let is_last = end == tokens.len();

        if (is_last || !require_all) && dir.join(format!("{name}.py")).is_file() {
            return Some((format!("{rel_name}.py"), end));
        }

        let sub_dir = dir.join(&name);
        if sub_dir.is_dir() {
            if is_last {
                if sub_dir.join("__init__.py").is_file() {
                    return Some((format!("{rel_name}/__init__.py"), end));
                }
                continue;
            }
            if let Some((path, consumed)) = walk(&sub_dir, &rel_name, &tokens[end..], require_all)
            {
                return Some((path, end + consumed));
            }
        }
    }
    None
}

/// Find the module file for underscore-joined `tokens` below the bytecode root.
pub fn resolve_module(
    layout: &SourceLayout,
    tokens: &[&str],
    require_all: bool,
) -> Option<(String, usize)> {
    if tokens.is_empty() {
        return None;
    }
    let root = layout.resolve(&layout.mpy_source_root);
    walk(&root, &layout.mpy_source_root, tokens, require_all)
}

/// `Class.method()` / `function()` from the tokens following the module.
///
/// Numeric remainders name constants, not functions.
fn function_from_tokens(tokens: &[&str]) -> String {
    let joined = tokens.join("_");
    if joined.is_empty() || joined.bytes().all(|b| b.is_ascii_digit()) {
        return String::new();
    }
    match tokens.split_first() {
        Some((first, rest))
            if !rest.is_empty() && first.chars().next().is_some_and(char::is_uppercase) =>
        {
            format!("{}.{}()", first, rest.join("_"))
        }
        _ => format!("{joined}()"),
    }
}

fn tokens_of(text: &str) -> Vec<&str> {
    text.split('_').filter(|t| !t.is_empty()).collect()
}

/// Split a frozen-module symbol into `(module_path, function)`.
pub fn module_and_function(symbol: &str, layout: &SourceLayout) -> Option<(String, String)> {
    let rest = RE_MPY_SYMBOL.captures(symbol)?.get(1)?.as_str();

    if let Some(index) = rest.find(MODULE_MARKER) {
        let module_tokens = tokens_of(&rest[..index]);
        let remainder = tokens_of(&rest[index + MODULE_MARKER.len()..]);
        let module = match resolve_module(layout, &module_tokens, true) {
            Some((path, _)) => path,
            None => layout.mark_unresolved(&format!(
                "{}/{}.py",
                layout.mpy_source_root,
                module_tokens.join("/")
            )),
        };
        return Some((module, function_from_tokens(&remainder)));
    }

    let tokens = tokens_of(rest);
    match resolve_module(layout, &tokens, false) {
        Some((path, consumed)) => Some((path, function_from_tokens(&tokens[consumed..]))),
        None => Some((String::new(), rest.to_string())),
    }
}

pub fn add_basic_info(row: &mut DataRow, layout: &SourceLayout) {
    row.language = Language::MicroPython;
    if let Some((module, function)) = module_and_function(&row.symbol_name, layout) {
        row.module_name = module;
        row.function_name = function;
    }
}

/// `module:line` of the `def`/`class`, or the module itself for module-level objects.
pub fn find_definition(row: &DataRow, layout: &SourceLayout) -> String {
    if row.module_name.is_empty() || layout.is_unresolved(&row.module_name) {
        return String::new();
    }
    if row.function_name.is_empty() {
        return row.module_name.clone();
    }

    let unqualified = row.function_name.trim_end_matches("()");
    let name = unqualified.rsplit('.').next().unwrap_or(unqualified);
    match patterns::python_definition(name) {
        Some(pattern) => search::definition_in(&layout.core_dir, &row.module_name, &pattern),
        None => String::new(),
    }
}

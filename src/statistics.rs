//! Category rollups over processed rows.
//!
//! A categorizer maps a row to at most one category. [`CategoryRules`]
//! evaluates its rules in order and stops at the first match, so
//! overlapping rules never count a row twice.

use std::path::Path;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::error::{BinSizeError, Result};
use crate::row::{group_thousands, DataRow};

/// Category of rows no rule claims.
pub const NONE_CATEGORY: &str = "None";

static RE_APP_DIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^src/apps/(\w+)/").expect("valid apps regex"));

/// Directory name below `src/apps/` of the row's module.
pub fn apps_category(row: &DataRow) -> Option<String> {
    RE_APP_DIR
        .captures(&row.module_name)
        .map(|caps| caps[1].to_string())
}

type Predicate = Box<dyn Fn(&DataRow) -> bool + Send + Sync>;

/// Ordered `(category, predicate)` pairs; first match wins.
#[derive(Default)]
pub struct CategoryRules {
    rules: Vec<(String, Predicate)>,
}

impl std::fmt::Debug for CategoryRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.rules.iter().map(|(name, _)| name)).finish()
    }
}

#[derive(Debug, Deserialize)]
struct RuleSpec {
    name: String,
    prefixes: Vec<String>,
}

impl CategoryRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&DataRow) -> bool + Send + Sync + 'static,
    {
        self.rules.push((name.into(), Box::new(predicate)));
        self
    }

    /// Rule matching rows whose source definition (or, lacking one, module)
    /// starts with any of `prefixes`.
    pub fn with_prefix_rule(self, name: impl Into<String>, prefixes: Vec<String>) -> Self {
        self.with_rule(name, move |row| {
            let location = if row.source_definition.is_empty() {
                &row.module_name
            } else {
                &row.source_definition
            };
            prefixes.iter().any(|prefix| location.starts_with(prefix.as_str()))
        })
    }

    /// `[{"name": "Crypto", "prefixes": ["vendor/trezor-crypto/"]}, ...]`
    pub fn from_json(text: &str) -> Result<Self> {
        let specs: Vec<RuleSpec> =
            serde_json::from_str(text).map_err(|e| BinSizeError::Config(e.to_string()))?;
        Ok(specs
            .into_iter()
            .fold(Self::new(), |rules, rule| rules.with_prefix_rule(rule.name, rule.prefixes)))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            BinSizeError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn categorize(&self, row: &DataRow) -> Option<String> {
        self.rules
            .iter()
            .find(|(_, predicate)| predicate(row))
            .map(|(name, _)| name.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStat {
    pub name: String,
    pub size: u64,
    /// Share of the size of all rows, categorized or not
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub categories: Vec<CategoryStat>,
    pub total_size: u64,
}

fn category_of<F>(row: &DataRow, categorize: &F, include_none: bool) -> Option<String>
where
    F: Fn(&DataRow) -> Option<String>,
{
    match categorize(row) {
        Some(category) => Some(category),
        None if include_none => Some(NONE_CATEGORY.to_string()),
        None => None,
    }
}

impl Statistics {
    /// Per-category sizes, largest first.
    pub fn compute<F>(rows: &[DataRow], categorize: F, include_none: bool) -> Self
    where
        F: Fn(&DataRow) -> Option<String>,
    {
        let total_size: u64 = rows.iter().map(|row| row.size).sum();
        let mut sizes: IndexMap<String, u64> = IndexMap::new();
        for row in rows {
            if let Some(category) = category_of(row, &categorize, include_none) {
                *sizes.entry(category).or_insert(0) += row.size;
            }
        }

        let mut categories: Vec<CategoryStat> = sizes
            .into_iter()
            .map(|(name, size)| CategoryStat {
                percentage: if total_size == 0 {
                    0.0
                } else {
                    size as f64 * 100.0 / total_size as f64
                },
                name,
                size,
            })
            .collect();
        categories.sort_by(|a, b| b.size.cmp(&a.size));
        debug!(categories = categories.len(), total_size, "Computed statistics");

        Self {
            categories,
            total_size,
        }
    }

    pub fn categorized_size(&self) -> u64 {
        self.categories.iter().map(|c| c.size).sum()
    }

    pub fn render(&self) -> String {
        let width = self
            .categories
            .iter()
            .map(|c| c.name.len())
            .max()
            .unwrap_or(0)
            .max(10);
        let mut lines: Vec<String> = self
            .categories
            .iter()
            .map(|c| {
                format!(
                    "{:<width$} {:>12} {:>6.2} %",
                    c.name,
                    group_thousands(c.size),
                    c.percentage
                )
            })
            .collect();
        lines.push(format!(
            "STATISTICS: {} categories, {} of {} bytes categorized.",
            self.categories.len(),
            group_thousands(self.categorized_size()),
            group_thousands(self.total_size)
        ));
        lines.join("\n")
    }
}

/// Every categorized row tagged with its category, largest rows first.
pub fn rows_with_categories<'a, F>(
    rows: &'a [DataRow],
    categorize: F,
    include_none: bool,
) -> Vec<(String, &'a DataRow)>
where
    F: Fn(&DataRow) -> Option<String>,
{
    let mut tagged: Vec<(String, &DataRow)> = rows
        .iter()
        .filter_map(|row| category_of(row, &categorize, include_none).map(|c| (c, row)))
        .collect();
    tagged.sort_by(|a, b| b.1.size.cmp(&a.1.size));
    tagged
}

pub fn render_rows_with_categories(tagged: &[(String, &DataRow)]) -> String {
    tagged
        .iter()
        .map(|(category, row)| format!("{:<15} {}", category, row.format(false)))
        .collect::<Vec<_>>()
        .join("\n")
}

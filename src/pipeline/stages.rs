//! Pure stage functions: each takes the rows by value and hands them back.

use std::cmp::Ordering;
use std::collections::HashMap;

use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::classify::{classify_row, SymbolHandler};
use crate::config::SourceLayout;
use crate::definitions::DefinitionCache;
use crate::error::Result;
use crate::row::DataRow;

/// Merge rows sharing an identity, summing their sizes.
///
/// The first row of a group keeps all its other fields; groups come out in
/// the order their first row appeared.
pub fn aggregate(rows: Vec<DataRow>) -> Vec<DataRow> {
    let before = rows.len();
    let mut groups: IndexMap<String, DataRow> = IndexMap::with_capacity(rows.len());
    for row in rows {
        match groups.entry(row.id()) {
            Entry::Occupied(mut occupied) => occupied.get_mut().size += row.size,
            Entry::Vacant(vacant) => {
                vacant.insert(row);
            }
        }
    }
    let aggregated: Vec<DataRow> = groups.into_values().collect();
    debug!(before, after = aggregated.len(), "Aggregated rows");
    aggregated
}

pub fn add_basic_info(mut rows: Vec<DataRow>, layout: &SourceLayout) -> Vec<DataRow> {
    for row in &mut rows {
        classify_row(row, layout);
    }
    rows
}

/// Fill `source_definition` of the rows accepted by `condition`.
///
/// Each identity is looked up at most once; the cache is consulted before
/// searching and flushed at the end.
pub fn add_definitions(
    mut rows: Vec<DataRow>,
    layout: &SourceLayout,
    cache: &mut dyn DefinitionCache,
    condition: Option<&dyn Fn(&DataRow) -> bool>,
) -> Result<Vec<DataRow>> {
    info!("Adding definitions... this can take a long time if results are not cached");

    let mut resolved: HashMap<String, String> = HashMap::new();
    let (mut hits, mut searched) = (0usize, 0usize);

    for row in &mut rows {
        if condition.is_some_and(|accept| !accept(row)) {
            continue;
        }
        let id = row.id();
        if let Some(definition) = resolved.get(&id) {
            row.source_definition = definition.clone();
            continue;
        }

        let definition = match cache.get(&row.symbol_name) {
            Some(definition) if !cache.is_invalidated(&row.symbol_name) => {
                hits += 1;
                definition
            }
            _ => {
                searched += 1;
                let definition = SymbolHandler::for_row(row).find_definition(row, layout);
                debug!(symbol = %row.symbol_name, definition = %definition, "Searched definition");
                cache.add(&row.symbol_name, &definition);
                definition
            }
        };
        row.source_definition = definition.clone();
        resolved.insert(id, definition);
    }

    cache.flush()?;
    info!(cache_hits = hits, searched, "Definitions added");
    Ok(rows)
}

pub fn filter<F>(rows: Vec<DataRow>, predicate: F) -> Vec<DataRow>
where
    F: Fn(&DataRow) -> bool,
{
    rows.into_iter().filter(|row| predicate(row)).collect()
}

/// Stable sort; equal rows keep their relative order.
pub fn sort_by<F>(mut rows: Vec<DataRow>, compare: F) -> Vec<DataRow>
where
    F: FnMut(&DataRow, &DataRow) -> Ordering,
{
    rows.sort_by(compare);
    rows
}

/// Largest rows first.
pub fn by_size_descending(a: &DataRow, b: &DataRow) -> Ordering {
    b.size.cmp(&a.size)
}

//! Textual size report.

use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::row::{group_thousands, DataRow};

/// Where the summary line goes. Files are read from the top, terminals
/// from the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryPlacement {
    Top,
    #[default]
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportOptions {
    /// Append the raw symbol to every line
    pub debug: bool,
    pub placement: SummaryPlacement,
}

/// Replaces the built-in rendering entirely.
pub type RowFormatter<'a> = &'a dyn Fn(&[DataRow]) -> String;

pub fn total_size(rows: &[DataRow]) -> u64 {
    rows.iter().map(|row| row.size).sum()
}

pub fn summary_line(rows: &[DataRow]) -> String {
    format!(
        "SUMMARY: {} rows, {} bytes in total.",
        group_thousands(rows.len() as u64),
        group_thousands(total_size(rows))
    )
}

pub fn render(rows: &[DataRow], options: &ReportOptions) -> String {
    let summary = summary_line(rows);
    let body = rows
        .iter()
        .map(|row| row.format(options.debug))
        .collect::<Vec<_>>()
        .join("\n");
    match options.placement {
        SummaryPlacement::Top => format!("{summary}\n{body}"),
        SummaryPlacement::Bottom => format!("{body}\n{summary}"),
    }
}

/// Write the report to `path`, or print it to stdout.
pub fn show(
    rows: &[DataRow],
    path: Option<&Path>,
    debug: bool,
    formatter: Option<RowFormatter<'_>>,
) -> Result<()> {
    let placement = if path.is_some() {
        SummaryPlacement::Top
    } else {
        SummaryPlacement::Bottom
    };
    let output = match formatter {
        Some(format) => format(rows),
        None => render(rows, &ReportOptions { debug, placement }),
    };

    match path {
        Some(path) => {
            info!(path = %path.display(), "Saving report");
            std::fs::write(path, output)?;
        }
        None => println!("{output}"),
    }
    Ok(())
}

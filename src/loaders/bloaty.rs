//! Primary size data from `bloaty -d sections,symbols --csv`.

use std::ffi::OsString;
use std::path::Path;

use tracing::{debug, info};

use super::tool::run_tool;
use super::RowDataLoader;
use crate::config::BinSizeConfig;
use crate::error::{BinSizeError, Result};
use crate::row::DataRow;

const SECTION_COLUMN: &str = "sections";
const SYMBOL_COLUMN: &str = "symbols";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloatyLoader {
    pub program: String,
    /// `vmsize` or `filesize`
    pub size_column: String,
}

impl Default for BloatyLoader {
    fn default() -> Self {
        Self::from_config(&BinSizeConfig::default())
    }
}

impl BloatyLoader {
    pub fn new(program: impl Into<String>, size_column: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            size_column: size_column.into(),
        }
    }

    pub fn from_config(config: &BinSizeConfig) -> Self {
        Self::new(&config.bloaty_program, &config.size_column)
    }

    /// Parse bloaty CSV, keeping only rows of `sections` when given.
    pub fn parse_csv(&self, csv: &str, sections: Option<&[String]>) -> Result<Vec<DataRow>> {
        let mut lines = csv
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let Some((header_index, header_line)) = lines.next() else {
            return Ok(Vec::new());
        };
        let header = split_csv_line(header_line).map_err(|message| BinSizeError::InvalidCsv {
            line: header_index + 1,
            message,
        })?;
        let column = |name: &str| {
            header
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| BinSizeError::MissingColumn(name.to_string()))
        };
        let section_idx = column(SECTION_COLUMN)?;
        let symbol_idx = column(SYMBOL_COLUMN)?;
        let size_idx = column(&self.size_column)?;

        let mut rows = Vec::new();
        for (index, line) in lines {
            let line_no = index + 1;
            let fields = split_csv_line(line)
                .map_err(|message| BinSizeError::InvalidCsv { line: line_no, message })?;
            let field = |idx: usize| {
                fields.get(idx).ok_or_else(|| BinSizeError::InvalidCsv {
                    line: line_no,
                    message: format!("expected at least {} fields, got {}", idx + 1, fields.len()),
                })
            };

            let section = field(section_idx)?;
            if let Some(wanted) = sections {
                if !wanted.iter().any(|s| s == section) {
                    continue;
                }
            }
            let symbol = field(symbol_idx)?;
            let size_text = field(size_idx)?;
            let size = size_text.trim().parse::<u64>().map_err(|_| BinSizeError::InvalidCsv {
                line: line_no,
                message: format!("size `{size_text}` is not a non-negative integer"),
            })?;

            rows.push(DataRow::new(symbol.as_str(), section.as_str(), size));
        }

        debug!(rows = rows.len(), "Parsed size table");
        Ok(rows)
    }
}

impl RowDataLoader for BloatyLoader {
    fn load_from_file(&self, bin_file: &Path, sections: Option<&[String]>) -> Result<Vec<DataRow>> {
        info!(file = %bin_file.display(), "Loading size data");
        let mut args: Vec<OsString> = ["-d", "sections,symbols", "-n", "0", "--csv"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(bin_file.as_os_str().to_os_string());
        let csv = run_tool(&self.program, &args)?;
        self.parse_csv(&csv, sections)
    }

    fn load_from_csv(&self, csv: &str, sections: Option<&[String]>) -> Result<Vec<DataRow>> {
        self.parse_csv(csv, sections)
    }
}

/// Split one CSV record, honouring `"..."` quoting and `""` escapes.
fn split_csv_line(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches('\r').chars().peekable();

    while let Some(ch) = chars.next() {
        match (ch, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            ('"', true) => in_quotes = false,
            ('"', false) if field.is_empty() => in_quotes = true,
            (',', false) => fields.push(std::mem::take(&mut field)),
            (c, _) => field.push(c),
        }
    }
    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(field);
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
sections,symbols,vmsize,filesize
.flash,[section .flash],14,14
.flash,\"trezor_lib::ui::layout::obj::<impl core::fmt::Debug for LayoutObj>::fmt::h0123456789abcdef\",120,120
.flash2,nist256p1,0,96
.bss,buffer,1024,0
";

    #[test]
    fn test_parse_all_sections() {
        let rows = BloatyLoader::default().parse_csv(CSV, None).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].symbol_name, "[section .flash]");
        assert_eq!(rows[0].size, 14);
        assert!(rows[1].symbol_name.contains("core::fmt::Debug for LayoutObj"));
        assert_eq!(rows[2].size, 96);
        assert_eq!(rows[3].size, 0);
    }

    #[test]
    fn test_section_filter_and_size_column() {
        let loader = BloatyLoader::new("bloaty", "vmsize");
        let sections = vec![".flash2".to_string(), ".bss".to_string()];
        let rows = loader.parse_csv(CSV, Some(sections.as_slice())).unwrap();
        let sizes: Vec<(&str, u64)> = rows.iter().map(|r| (r.section.as_str(), r.size)).collect();
        assert_eq!(sizes, vec![(".flash2", 0), (".bss", 1024)]);
    }

    #[test]
    fn test_missing_column() {
        let err = BloatyLoader::default()
            .parse_csv("sections,symbols,vmsize\n.flash,a,1\n", None)
            .unwrap_err();
        assert!(matches!(err, BinSizeError::MissingColumn(c) if c == "filesize"));
    }

    #[test]
    fn test_bad_size_reports_line() {
        let err = BloatyLoader::default()
            .parse_csv("sections,symbols,vmsize,filesize\n.flash,a,1,-5\n", None)
            .unwrap_err();
        assert!(matches!(err, BinSizeError::InvalidCsv { line: 2, .. }));
    }

    #[test]
    fn test_split_quoted_fields() {
        assert_eq!(
            split_csv_line(r#"a,"b,c","say ""hi""",d"#).unwrap(),
            vec!["a", "b,c", "say \"hi\"", "d"]
        );
        assert!(split_csv_line(r#"a,"open"#).is_err());
    }
}

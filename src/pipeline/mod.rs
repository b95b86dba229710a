//! # Pipeline
//!
//! [`BinarySize`] threads one row collection through the processing stages:
//!
//! ```text
//! load -> [use_map_file] -> [add_basic_info] -> [aggregate] -> [add_definitions]
//!      -> (filter | sort)* -> show
//! ```
//!
//! Exactly one load is allowed; every other stage fails with
//! [`BinSizeError::NotLoaded`] until it has happened.

use std::cmp::Ordering;
use std::path::Path;

use crate::config::{BinSizeConfig, SourceLayout};
use crate::definitions::DefinitionCache;
use crate::error::{BinSizeError, Result};
use crate::loaders::{map_file, BloatyLoader, BuildDefinitionLoader, RowDataLoader};
use crate::report::{self, ReportOptions, RowFormatter};
use crate::row::DataRow;

pub mod stages;

#[derive(Debug)]
pub struct BinarySize<L: RowDataLoader = BloatyLoader> {
    loader: L,
    build_definitions: Option<BuildDefinitionLoader>,
    layout: SourceLayout,
    rows: Option<Vec<DataRow>>,
    basic_info_added: bool,
}

impl BinarySize<BloatyLoader> {
    /// Pipeline with the size and symbol-table tools named in `config`.
    pub fn from_config(config: &BinSizeConfig) -> Self {
        Self::with_loader(BloatyLoader::from_config(config), config.layout.clone())
            .with_build_definitions(Some(BuildDefinitionLoader::from_config(config)))
    }
}

impl<L: RowDataLoader> BinarySize<L> {
    pub fn with_loader(loader: L, layout: SourceLayout) -> Self {
        Self {
            loader,
            build_definitions: None,
            layout,
            rows: None,
            basic_info_added: false,
        }
    }

    /// Symbol-table source used by [`load_file`](Self::load_file).
    pub fn with_build_definitions(mut self, loader: Option<BuildDefinitionLoader>) -> Self {
        self.build_definitions = loader;
        self
    }

    fn set_rows(mut self, rows: Vec<DataRow>) -> Result<Self> {
        if self.rows.is_some() {
            return Err(BinSizeError::AlreadyLoaded);
        }
        self.rows = Some(rows);
        Ok(self)
    }

    fn ensure_not_loaded(&self) -> Result<()> {
        match self.rows {
            Some(_) => Err(BinSizeError::AlreadyLoaded),
            None => Ok(()),
        }
    }

    fn take_rows(&mut self) -> Result<Vec<DataRow>> {
        self.rows.take().ok_or(BinSizeError::NotLoaded)
    }

    /// Run the size tool on a binary, then attach build definitions.
    pub fn load_file(mut self, bin_file: &Path, sections: Option<&[String]>) -> Result<Self> {
        self.ensure_not_loaded()?;
        let mut rows = self.loader.load_from_file(bin_file, sections)?;
        if let Some(build_definitions) = self.build_definitions.as_mut() {
            build_definitions.load(bin_file)?;
            build_definitions.apply(&mut rows);
        }
        self.set_rows(rows)
    }

    pub fn load_csv(self, csv: &str, sections: Option<&[String]>) -> Result<Self> {
        self.ensure_not_loaded()?;
        let rows = self.loader.load_from_csv(csv, sections)?;
        self.set_rows(rows)
    }

    pub fn load_rows(self, rows: Vec<DataRow>) -> Result<Self> {
        self.set_rows(rows)
    }

    /// Split bucket rows of `sections` using the linker map.
    pub fn use_map_file(mut self, map_text: &str, sections: &[String]) -> Result<Self> {
        let rows = self.rows.as_mut().ok_or(BinSizeError::NotLoaded)?;
        map_file::include_map_file(rows, map_text, sections)?;
        Ok(self)
    }

    pub fn add_basic_info(mut self) -> Result<Self> {
        let rows = self.take_rows()?;
        self.rows = Some(stages::add_basic_info(rows, &self.layout));
        self.basic_info_added = true;
        Ok(self)
    }

    pub fn aggregate(mut self) -> Result<Self> {
        let rows = self.take_rows()?;
        self.rows = Some(stages::aggregate(rows));
        Ok(self)
    }

    /// Look up source definitions, classifying first if that was skipped.
    pub fn add_definitions(
        mut self,
        cache: &mut dyn DefinitionCache,
        condition: Option<&dyn Fn(&DataRow) -> bool>,
    ) -> Result<Self> {
        if !self.basic_info_added {
            self = self.add_basic_info()?;
        }
        let rows = self.take_rows()?;
        self.rows = Some(stages::add_definitions(rows, &self.layout, cache, condition)?);
        Ok(self)
    }

    pub fn filter<F>(mut self, predicate: F) -> Result<Self>
    where
        F: Fn(&DataRow) -> bool,
    {
        let rows = self.take_rows()?;
        self.rows = Some(stages::filter(rows, predicate));
        Ok(self)
    }

    /// Largest rows first.
    pub fn sort(self) -> Result<Self> {
        self.sort_by(stages::by_size_descending)
    }

    pub fn sort_by<F>(mut self, compare: F) -> Result<Self>
    where
        F: FnMut(&DataRow, &DataRow) -> Ordering,
    {
        let rows = self.take_rows()?;
        self.rows = Some(stages::sort_by(rows, compare));
        Ok(self)
    }

    pub fn rows(&self) -> Result<&[DataRow]> {
        self.rows.as_deref().ok_or(BinSizeError::NotLoaded)
    }

    pub fn into_rows(mut self) -> Result<Vec<DataRow>> {
        self.take_rows()
    }

    pub fn total_size(&self) -> Result<u64> {
        Ok(report::total_size(self.rows()?))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.rows()?.len())
    }

    pub fn render(&self, options: &ReportOptions) -> Result<String> {
        Ok(report::render(self.rows()?, options))
    }

    pub fn show(
        &self,
        path: Option<&Path>,
        debug: bool,
        formatter: Option<RowFormatter<'_>>,
    ) -> Result<()> {
        report::show(self.rows()?, path, debug, formatter)
    }
}

//! Size attribution for firmware binaries.
//!
//! Size-tool output is turned into [`row::DataRow`]s, classified per source
//! language, enriched with build and source definitions, aggregated and
//! reported. [`maptree`] is an independent view over raw linker maps.

pub mod classify;
pub mod config;
pub mod definitions;
pub mod error;
pub mod hashing;
pub mod loaders;
pub mod logging;
pub mod maptree;
pub mod pipeline;
pub mod report;
pub mod row;
pub mod statistics;

pub use config::{BinSizeConfig, SourceLayout};
pub use error::{BinSizeError, Result};
pub use pipeline::BinarySize;
pub use row::{DataRow, Language};

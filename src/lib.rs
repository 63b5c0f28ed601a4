//! Exploratory analysis for CSV and Excel datasets.
//!
//! The pipeline: [`loader`] parses an uploaded file into a polars DataFrame
//! and runs the datetime inference pass; [`session`] owns the loaded frame
//! and exposes one request handler per user action (overview, missing
//! values, univariate, bivariate, correlation, download); [`chart`] renders
//! handler results to PNG and [`report`] to plain text. [`cache`] memoizes
//! loads by content hash so repeated requests with identical inputs skip
//! the parse.

pub mod cache;
pub mod chart;
pub mod classify;
pub mod cli;
pub mod color;
pub mod config;
pub mod error;
pub mod export;
pub mod loader;
pub mod report;
pub mod session;
pub mod statistics;

pub use cache::LoadCache;
pub use classify::ColumnKind;
pub use config::{AppConfig, ConfigManager};
pub use error::LoadError;
pub use export::DownloadArtifact;
pub use loader::{Delimiter, FileFormat, LoadOptions};
pub use session::{Overview, Session, UnivariateAnalysis};

//! Walking service areas for GPS tracks.
//!
//! Facade over [`walkshed_core`]: a long-lived [`Analyzer`] with a
//! swappable road network, JSON reports, GeoJSON and WKT exports, and
//! parallel batch analysis.

mod analyzer;
pub mod batch;
mod error;
pub mod geojson_export;
pub mod report;
pub mod wkt_export;

pub use analyzer::Analyzer;
pub use batch::{analyze_batch, report_batch};
pub use error::ReportError;
pub use report::AnalysisReport;

pub use walkshed_core;

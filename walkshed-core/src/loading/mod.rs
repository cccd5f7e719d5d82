//! This module is responsible for reading road and census layers, turning
//! raw road segments into a routable network and holding analysis
//! configuration.

mod builder;
mod config;
mod features;
mod roads;
mod zones;

pub use builder::{BuildReport, COORDINATE_CONFLICT_TOLERANCE, build_road_network};
pub use config::{AnalysisConfig, FieldFallbacks, ReachabilityMode};
pub use roads::{read_road_segments, read_road_segments_file};
pub use zones::{CensusTable, read_zones, read_zones_file};

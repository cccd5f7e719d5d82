//! Road network alignment and walking reachability for GPS tracks.
//!
//! The crate builds a routable graph from projected road segments, matches
//! a track onto those segments, and computes the part of the network that
//! can be reached on foot from the track. Zones carrying census counts are
//! then split into served and unserved sets.
//!
//! All geometry is expected in a planar, meter-based coordinate reference
//! system. Reprojection is left to the caller.

pub mod algo;
mod error;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod routing;
pub mod session;

pub use error::Error;

pub use algo::coverage::{
    CoverageParams, CoverageResult, PopulationStats, classify_zones, classify_zones_straight_line,
    find_region,
};
pub use algo::localities::{LocalityReport, detect_localities, detect_localities_straight_line};
pub use algo::map_matching::{MatchResult, MatchStats, PointMatch, match_track};
pub use algo::road_attributes::{RoadAttributeSummary, classify_matched_roads};
pub use algo::service_area::{Reach, ReachabilityParams, ServiceArea, compute_service_area};
pub use algo::track_metrics::TrackMetrics;
pub use loading::{
    AnalysisConfig, BuildReport, CensusTable, FieldFallbacks, ReachabilityMode, build_road_network,
    read_road_segments, read_road_segments_file, read_zones, read_zones_file,
};
pub use model::{
    AttributeRecord, Demographics, DemographicLayout, RoadAttributes, RoadNetwork, RoadSegment,
    Settlement, Track, TrackPoint, Zone, ZoneKind,
};
pub use session::{NetworkHandle, TrackAnalysis, ZoneSet, analyze_track};

/// Identifier of a network junction, as carried by the source network
pub type NodeId = u64;
/// Identifier of a road segment, as carried by the source network
pub type SegmentId = u64;
/// Planar distance in meters
pub type Meters = f64;

pub use crate::Error;

// Re-export key components
pub use crate::algo::coverage::{CoverageParams, CoverageResult, PopulationStats, classify_zones};
pub use crate::algo::localities::{LocalityReport, detect_localities};
pub use crate::algo::map_matching::{MatchResult, PointMatch, match_track};
pub use crate::algo::road_attributes::{RoadAttributeSummary, classify_matched_roads};
pub use crate::algo::service_area::{Reach, ReachabilityParams, ServiceArea, compute_service_area};
pub use crate::algo::track_metrics::TrackMetrics;
pub use crate::loading::{
    AnalysisConfig, CensusTable, ReachabilityMode, build_road_network, read_road_segments_file,
    read_zones_file,
};
pub use crate::model::{RoadNetwork, RoadSegment, Track, TrackPoint, Zone};
pub use crate::session::{NetworkHandle, TrackAnalysis, ZoneSet, analyze_track};

// Core identifier types
pub use crate::Meters;
pub use crate::NodeId;
pub use crate::SegmentId;

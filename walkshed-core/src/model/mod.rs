//! Data model for road network alignment and reachability
//!
//! Contains the road network, tracks and census zones.

pub mod roads;
pub mod track;
pub mod zone;

pub use roads::{AttributeRecord, RoadAttributes, RoadEdge, RoadNetwork, RoadNode, RoadSegment};
pub use track::{Track, TrackPoint};
pub use zone::{DemographicLayout, Demographics, Settlement, Zone, ZoneKind};

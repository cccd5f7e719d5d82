//! Road network model - segments, graph components and spatial indices

pub mod components;
pub mod network;
pub mod segment;

pub use components::{RoadEdge, RoadNode};
pub use network::{IndexedPoint, IndexedSegment, RoadNetwork};
pub use segment::{AttributeRecord, RoadAttributes, RoadSegment};

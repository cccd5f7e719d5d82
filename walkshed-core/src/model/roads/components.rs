//! Road graph components - junction nodes and segment edges

use geo::{LineString, Point};

use crate::{Meters, NodeId, SegmentId};

/// Road graph node
#[derive(Debug, Clone)]
pub struct RoadNode {
    /// Junction identifier from the source network
    pub id: NodeId,
    /// Node coordinates (projected, meters)
    pub geometry: Point<f64>,
}

/// Road graph edge (one road segment)
#[derive(Debug, Clone)]
pub struct RoadEdge {
    /// Identifier of the segment this edge was built from
    pub segment: SegmentId,
    /// Walking distance along the segment in meters
    pub length: Meters,
    /// Segment geometry, used to rebuild service area polygons
    pub geometry: LineString<f64>,
}

impl RoadEdge {
    pub fn walking_distance(&self) -> Meters {
        self.length
    }
}

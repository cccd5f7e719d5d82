//! Routable road graph with spatial indices

use geo::Point;
use hashbrown::HashMap;
use petgraph::graph::{NodeIndex, UnGraph};
use rstar::{
    AABB, PointDistance, RTree,
    primitives::{GeomWithData, Rectangle},
};

use super::{RoadEdge, RoadNode, RoadSegment};
use crate::{Meters, NodeId, SegmentId, loading::BuildReport};

/// Node coordinate stored in the R-tree together with its graph index
pub type IndexedPoint = GeomWithData<[f64; 2], NodeIndex>;
/// Segment bounding box stored in the R-tree together with its position
/// in the segment table
pub type IndexedSegment = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// Road network graph.
///
/// Built once per dataset by [`crate::build_road_network`] and read-only
/// afterwards. Nodes are keyed by the source junction identifier, edges
/// carry segment length and geometry, and parallel edges are kept.
#[derive(Debug, Clone)]
pub struct RoadNetwork {
    pub graph: UnGraph<RoadNode, RoadEdge>,
    pub(crate) node_lookup: HashMap<NodeId, NodeIndex>,
    pub(crate) node_rtree: RTree<IndexedPoint>,
    pub(crate) segments: Vec<RoadSegment>,
    pub(crate) segment_lookup: HashMap<SegmentId, usize>,
    pub(crate) segment_rtree: RTree<IndexedSegment>,
    pub(crate) report: BuildReport,
}

impl RoadNetwork {
    pub(crate) fn from_parts(
        graph: UnGraph<RoadNode, RoadEdge>,
        node_lookup: HashMap<NodeId, NodeIndex>,
        segments: Vec<RoadSegment>,
        report: BuildReport,
    ) -> Self {
        let node_rtree = build_node_rtree(&graph);
        let segment_rtree = build_segment_rtree(&segments);
        let segment_lookup = segments
            .iter()
            .enumerate()
            .map(|(idx, segment)| (segment.id, idx))
            .collect();

        Self {
            graph,
            node_lookup,
            node_rtree,
            segments,
            segment_lookup,
            segment_rtree,
            report,
        }
    }

    /// Finds the closest junction to a point and the straight-line distance
    /// to it.
    pub fn nearest_node(&self, point: &Point<f64>) -> Option<(NodeId, Meters)> {
        self.nearest_node_index(point)
            .map(|(idx, distance)| (self.graph[idx].id, distance))
    }

    pub(crate) fn nearest_node_index(&self, point: &Point<f64>) -> Option<(NodeIndex, Meters)> {
        let query = [point.x(), point.y()];
        self.node_rtree
            .nearest_neighbor(&query)
            .map(|nearest| (nearest.data, nearest.distance_2(&query).sqrt()))
    }

    pub fn node(&self, id: NodeId) -> Option<&RoadNode> {
        self.node_index(id).map(|idx| &self.graph[idx])
    }

    pub(crate) fn node_index(&self, id: NodeId) -> Option<NodeIndex> {
        self.node_lookup.get(&id).copied()
    }

    pub fn segment(&self, id: SegmentId) -> Option<&RoadSegment> {
        self.segment_lookup.get(&id).map(|&idx| &self.segments[idx])
    }

    pub fn segments(&self) -> &[RoadSegment] {
        &self.segments
    }

    /// Segments whose bounding box lies within `radius` of the point, with
    /// each segment's position in load order.
    ///
    /// This is an envelope pre-filter; callers measure the true distance.
    pub(crate) fn segment_candidates(
        &self,
        point: &Point<f64>,
        radius: Meters,
    ) -> impl Iterator<Item = (usize, &RoadSegment)> {
        self.segment_rtree
            .locate_in_envelope_intersecting(&search_envelope(point, radius))
            .map(|item| (item.data, &self.segments[item.data]))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Summary of the load that produced this network
    pub fn build_report(&self) -> &BuildReport {
        &self.report
    }
}

fn search_envelope(point: &Point<f64>, radius: Meters) -> AABB<[f64; 2]> {
    AABB::from_corners(
        [point.x() - radius, point.y() - radius],
        [point.x() + radius, point.y() + radius],
    )
}

fn build_node_rtree(graph: &UnGraph<RoadNode, RoadEdge>) -> RTree<IndexedPoint> {
    let points = graph
        .node_indices()
        .map(|idx| {
            let geometry = graph[idx].geometry;
            GeomWithData::new([geometry.x(), geometry.y()], idx)
        })
        .collect();

    RTree::bulk_load(points)
}

fn build_segment_rtree(segments: &[RoadSegment]) -> RTree<IndexedSegment> {
    let boxes = segments
        .iter()
        .enumerate()
        .filter_map(|(idx, segment)| {
            segment.envelope().map(|rect| {
                let envelope = Rectangle::from_corners(
                    [rect.min().x, rect.min().y],
                    [rect.max().x, rect.max().y],
                );
                GeomWithData::new(envelope, idx)
            })
        })
        .collect();

    RTree::bulk_load(boxes)
}

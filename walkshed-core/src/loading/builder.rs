use geo::Point;
use hashbrown::{HashMap, HashSet, hash_map::Entry};
use log::{debug, info, warn};
use petgraph::graph::{NodeIndex, UnGraph};
use serde::Serialize;

use crate::{
    Error, Meters, NodeId,
    model::{RoadEdge, RoadNetwork, RoadNode, RoadSegment, roads::segment::SegmentDefect},
};

/// Junctions sharing an identifier but placed farther apart than this are
/// reported as coordinate conflicts.
pub const COORDINATE_CONFLICT_TOLERANCE: Meters = 1.0;

/// Topology warnings collected while building a network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    /// Segments handed to the builder
    pub input_segments: usize,
    /// Segments that became graph edges
    pub loaded_segments: usize,
    /// Segments with fewer than two coordinates
    pub too_few_coordinates: usize,
    /// Segments with NaN or infinite coordinates
    pub non_finite_coordinates: usize,
    /// Segments with a zero, negative or non-finite length
    pub degenerate_length: usize,
    /// Segments whose identifier was already loaded
    pub duplicate_ids: usize,
    /// Junction identifiers seen at diverging coordinates
    pub coordinate_conflicts: usize,
}

impl BuildReport {
    pub fn skipped_segments(&self) -> usize {
        self.too_few_coordinates
            + self.non_finite_coordinates
            + self.degenerate_length
            + self.duplicate_ids
    }
}

/// Creates a routable network from road segments
///
/// Each segment becomes an undirected edge between its two junction
/// identifiers, weighted by its length. Junctions are deduplicated by
/// identifier only: coincident junctions with different identifiers stay
/// disconnected. Malformed segments are skipped and counted in the
/// [`BuildReport`].
///
/// # Errors
///
/// Returns [`Error::DataLoad`] if no segments are given or none of them
/// is usable.
pub fn build_road_network(segments: Vec<RoadSegment>) -> Result<RoadNetwork, Error> {
    if segments.is_empty() {
        return Err(Error::DataLoad("road network contains no segments".into()));
    }

    info!("Building road network from {} segments", segments.len());

    let mut report = BuildReport {
        input_segments: segments.len(),
        ..BuildReport::default()
    };

    let mut graph: UnGraph<RoadNode, RoadEdge> =
        UnGraph::with_capacity(segments.len(), segments.len());
    let mut node_lookup: HashMap<NodeId, NodeIndex> = HashMap::with_capacity(segments.len());
    let mut seen_ids = HashSet::with_capacity(segments.len());
    let mut loaded = Vec::with_capacity(segments.len());

    for segment in segments {
        if let Err(defect) = segment.check() {
            match defect {
                SegmentDefect::TooFewCoordinates => report.too_few_coordinates += 1,
                SegmentDefect::NonFiniteCoordinate => report.non_finite_coordinates += 1,
                SegmentDefect::DegenerateLength => report.degenerate_length += 1,
            }
            debug!("Skipping segment {}: {defect:?}", segment.id);
            continue;
        }

        if !seen_ids.insert(segment.id) {
            report.duplicate_ids += 1;
            debug!("Skipping segment {}: identifier already loaded", segment.id);
            continue;
        }

        let coords = &segment.geometry.0;
        let (Some(&start), Some(&end)) = (coords.first(), coords.last()) else {
            continue;
        };

        let from = add_node(
            &mut graph,
            &mut node_lookup,
            &mut report,
            segment.from_node,
            start.into(),
        );
        let to = add_node(
            &mut graph,
            &mut node_lookup,
            &mut report,
            segment.to_node,
            end.into(),
        );

        graph.add_edge(
            from,
            to,
            RoadEdge {
                segment: segment.id,
                length: segment.length,
                geometry: segment.geometry.clone(),
            },
        );
        loaded.push(segment);
    }

    report.loaded_segments = loaded.len();

    if report.skipped_segments() > 0 {
        warn!(
            "Skipped {} of {} road segments ({} too short, {} non-finite, {} degenerate length, {} duplicate ids)",
            report.skipped_segments(),
            report.input_segments,
            report.too_few_coordinates,
            report.non_finite_coordinates,
            report.degenerate_length,
            report.duplicate_ids
        );
    }
    if report.coordinate_conflicts > 0 {
        warn!(
            "{} junction identifiers appear at diverging coordinates; first occurrence kept",
            report.coordinate_conflicts
        );
    }

    if loaded.is_empty() {
        return Err(Error::DataLoad(format!(
            "none of the {} road segments has usable geometry",
            report.input_segments
        )));
    }

    let network = RoadNetwork::from_parts(graph, node_lookup, loaded, report);
    info!(
        "Road network built: {} nodes, {} edges",
        network.node_count(),
        network.edge_count()
    );

    Ok(network)
}

/// Returns the graph node for `id`, creating it on first sight.
/// The first coordinate seen for an identifier wins.
fn add_node(
    graph: &mut UnGraph<RoadNode, RoadEdge>,
    node_lookup: &mut HashMap<NodeId, NodeIndex>,
    report: &mut BuildReport,
    id: NodeId,
    geometry: Point<f64>,
) -> NodeIndex {
    match node_lookup.entry(id) {
        Entry::Occupied(entry) => {
            let idx = *entry.get();
            let existing = graph[idx].geometry;
            let offset = (existing.x() - geometry.x()).hypot(existing.y() - geometry.y());
            if offset > COORDINATE_CONFLICT_TOLERANCE {
                report.coordinate_conflicts += 1;
                debug!("Junction {id} seen {offset:.1} m away from its first position");
            }
            idx
        }
        Entry::Vacant(entry) => {
            let idx = graph.add_node(RoadNode { id, geometry });
            entry.insert(idx);
            idx
        }
    }
}

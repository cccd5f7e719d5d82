//! Walking service area of a track over the road network.
//!
//! The track is sampled at regular distance intervals, each sample is
//! snapped to its nearest junction, and a bounded multi-source Dijkstra
//! from those junctions yields the network distance of every reachable
//! junction. The area polygon is the buffered union of reached edges and
//! junctions.

use std::collections::{BTreeMap, BTreeSet};

use fixedbitset::FixedBitSet;
use geo::{BooleanOps, Buffer, Coord, LineString, MultiLineString, MultiPoint, MultiPolygon, Point};
use itertools::Itertools;
use log::{debug, info};
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

use crate::{Meters, NodeId, model::RoadNetwork, model::Track, routing::bounded_dijkstra};

/// Minimum number of sampling intervals along a track
pub const MIN_SAMPLES: usize = 10;

/// Parameters of the service-area search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReachabilityParams {
    /// Walking distance budget along the network
    pub max_distance: Meters,
    /// Distance between track samples
    pub sample_spacing: Meters,
    /// Samples farther than this from every junction produce no seed
    pub node_cutoff: Meters,
    /// Inflation applied to reached edges and junctions
    pub polygon_buffer: Meters,
}

impl Default for ReachabilityParams {
    fn default() -> Self {
        Self {
            max_distance: 700.0,
            sample_spacing: 100.0,
            node_cutoff: 500.0,
            polygon_buffer: 50.0,
        }
    }
}

/// Outcome of testing a location against a service area
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reach {
    /// Nearest junction is in the area and the total walk fits the budget
    Reachable { distance: Meters },
    /// Nearest junction is in the area but snapping pushes the walk over budget
    TooFar { distance: Meters },
    /// Nearest junction was never reached
    Unreached,
}

impl Reach {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Self::Reachable { .. })
    }

    pub fn distance(&self) -> Option<Meters> {
        match self {
            Self::Reachable { distance } | Self::TooFar { distance } => Some(*distance),
            Self::Unreached => None,
        }
    }
}

/// Junctions reachable from a track and the polygon covering them
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceArea {
    distances: BTreeMap<NodeId, Meters>,
    seeds: Vec<NodeId>,
    polygon: Option<MultiPolygon<f64>>,
    max_distance: Meters,
}

impl ServiceArea {
    pub fn empty(max_distance: Meters) -> Self {
        Self {
            distances: BTreeMap::new(),
            seeds: Vec::new(),
            polygon: None,
            max_distance,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Number of reachable junctions
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn max_distance(&self) -> Meters {
        self.max_distance
    }

    /// Junctions the search started from, sorted
    pub fn seeds(&self) -> &[NodeId] {
        &self.seeds
    }

    /// Network distance of every reachable junction, keyed by identifier
    pub fn distances(&self) -> &BTreeMap<NodeId, Meters> {
        &self.distances
    }

    pub fn distance_to(&self, node: NodeId) -> Option<Meters> {
        self.distances.get(&node).copied()
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.distances.contains_key(&node)
    }

    /// `None` when nothing was reached
    pub fn polygon(&self) -> Option<&MultiPolygon<f64>> {
        self.polygon.as_ref()
    }

    /// Tests whether `point` can be walked to from the track.
    ///
    /// The point is snapped to its nearest junction; the walk is the snap
    /// distance plus the junction's network distance. Containment in the
    /// polygon alone never makes a point reachable.
    pub fn reach(&self, point: &Point<f64>, network: &RoadNetwork) -> Reach {
        let Some((node, snap)) = network.nearest_node(point) else {
            return Reach::Unreached;
        };

        match self.distance_to(node) {
            Some(network_distance) => {
                let distance = snap + network_distance;
                if distance <= self.max_distance {
                    Reach::Reachable { distance }
                } else {
                    Reach::TooFar { distance }
                }
            }
            None => Reach::Unreached,
        }
    }

    pub fn is_reachable(&self, point: &Point<f64>, network: &RoadNetwork) -> bool {
        self.reach(point, network).is_reachable()
    }
}

/// Computes the walking service area of a track.
///
/// A track far from every junction yields an empty area, not an error.
pub fn compute_service_area(
    track: &Track,
    network: &RoadNetwork,
    params: &ReachabilityParams,
) -> ServiceArea {
    let samples = sample_track(&track.line_string(), params.sample_spacing);
    let seeds = seed_nodes(&samples, network, params.node_cutoff);

    if seeds.is_empty() {
        info!(
            "No junction within {} m of the track; service area is empty",
            params.node_cutoff
        );
        return ServiceArea::empty(params.max_distance);
    }

    debug!("{} samples snapped to {} seed junctions", samples.len(), seeds.len());

    let reached = bounded_dijkstra(&network.graph, &seeds, params.max_distance);
    let polygon = area_polygon(network, &reached, params.polygon_buffer);

    let distances: BTreeMap<NodeId, Meters> = reached
        .iter()
        .map(|(&idx, &distance)| (network.graph[idx].id, distance))
        .collect();
    let seeds = seeds.iter().map(|&idx| network.graph[idx].id).collect();

    info!(
        "Service area reaches {} junctions within {} m",
        distances.len(),
        params.max_distance
    );

    ServiceArea {
        distances,
        seeds,
        polygon,
        max_distance: params.max_distance,
    }
}

/// Points along the line at fractions `i / n`, `i` in `0..=n`, where
/// `n = max(floor(length / spacing), MIN_SAMPLES)`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn sample_track(line: &LineString<f64>, spacing: Meters) -> Vec<Point<f64>> {
    let coords = &line.0;
    let Some(&first) = coords.first() else {
        return Vec::new();
    };

    let cumulative = cumulative_lengths(coords);
    let total = cumulative.last().copied().unwrap_or(0.0);
    if total <= 0.0 {
        return vec![first.into()];
    }

    let intervals = if spacing > 0.0 {
        let by_spacing = (total / spacing).floor() as usize;
        by_spacing.max(MIN_SAMPLES)
    } else {
        MIN_SAMPLES
    };

    (0..=intervals)
        .map(|i| point_at_distance(coords, &cumulative, total * i as f64 / intervals as f64))
        .collect()
}

fn cumulative_lengths(coords: &[Coord<f64>]) -> Vec<Meters> {
    let mut lengths = Vec::with_capacity(coords.len());
    let mut running = 0.0;
    lengths.push(running);
    for (a, b) in coords.iter().tuple_windows() {
        running += (b.x - a.x).hypot(b.y - a.y);
        lengths.push(running);
    }
    lengths
}

fn point_at_distance(coords: &[Coord<f64>], cumulative: &[Meters], target: Meters) -> Point<f64> {
    let idx = cumulative.partition_point(|&d| d < target);
    if idx == 0 {
        return coords[0].into();
    }
    if idx >= coords.len() {
        return coords[coords.len() - 1].into();
    }

    let (start, end) = (coords[idx - 1], coords[idx]);
    let span = cumulative[idx] - cumulative[idx - 1];
    if span <= 0.0 {
        return end.into();
    }

    let ratio = (target - cumulative[idx - 1]) / span;
    Point::new(
        start.x + (end.x - start.x) * ratio,
        start.y + (end.y - start.y) * ratio,
    )
}

/// Nearest junction of every sample strictly closer than `cutoff`,
/// deduplicated and sorted.
pub(crate) fn seed_nodes(
    samples: &[Point<f64>],
    network: &RoadNetwork,
    cutoff: Meters,
) -> Vec<NodeIndex> {
    let seeds: BTreeSet<NodeIndex> = samples
        .iter()
        .filter_map(|sample| network.nearest_node_index(sample))
        .filter(|&(_, distance)| distance < cutoff)
        .map(|(idx, _)| idx)
        .collect();

    seeds.into_iter().collect()
}

fn area_polygon(
    network: &RoadNetwork,
    reached: &hashbrown::HashMap<NodeIndex, Meters>,
    buffer: Meters,
) -> Option<MultiPolygon<f64>> {
    if reached.is_empty() {
        return None;
    }

    let graph = &network.graph;
    let mut reached_set = FixedBitSet::with_capacity(graph.node_count());
    for idx in reached.keys() {
        reached_set.insert(idx.index());
    }

    let edges: Vec<LineString<f64>> = graph
        .edge_indices()
        .filter_map(|edge| {
            let (a, b) = graph.edge_endpoints(edge)?;
            (reached_set.contains(a.index()) && reached_set.contains(b.index()))
                .then(|| graph[edge].geometry.clone())
        })
        .collect();

    let nodes: Vec<Point<f64>> = reached_set
        .ones()
        .map(|i| graph[NodeIndex::new(i)].geometry)
        .collect();

    let around_nodes = MultiPoint::new(nodes).buffer(buffer);
    let polygon = if edges.is_empty() {
        around_nodes
    } else {
        MultiLineString::new(edges).buffer(buffer).union(&around_nodes)
    };

    (!polygon.0.is_empty()).then_some(polygon)
}

#[cfg(test)]
mod tests {
    use geo::{Contains, line_string};

    use super::*;
    use crate::{build_road_network, model::RoadSegment};

    /// 1 km edge under the track, then a 1 km spur heading north
    fn network() -> RoadNetwork {
        build_road_network(vec![
            RoadSegment::new(1, line_string![(x: 0.0, y: 0.0), (x: 1000.0, y: 0.0)], 1, 2, 1000.0),
            RoadSegment::new(
                2,
                line_string![(x: 1000.0, y: 0.0), (x: 1000.0, y: 1000.0)],
                2,
                3,
                1000.0,
            ),
        ])
        .unwrap()
    }

    fn straight_track() -> Track {
        Track::from_projected([(0.0, 0.0), (1000.0, 0.0)]).unwrap()
    }

    #[test]
    fn sampling_uses_at_least_ten_intervals() {
        let short = sample_track(&line_string![(x: 0.0, y: 0.0), (x: 200.0, y: 0.0)], 100.0);
        assert_eq!(short.len(), MIN_SAMPLES + 1);
        assert!((short[1].x() - 20.0).abs() < 1e-9);

        let long = sample_track(
            &line_string![(x: 0.0, y: 0.0), (x: 1500.0, y: 0.0), (x: 1500.0, y: 1500.0)],
            100.0,
        );
        assert_eq!(long.len(), 31);
        assert!((long[15].x() - 1500.0).abs() < 1e-9);
        assert!((long[30].y() - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn track_along_single_edge_reaches_both_ends() {
        let network = build_road_network(vec![RoadSegment::new(
            1,
            line_string![(x: 0.0, y: 0.0), (x: 1000.0, y: 0.0)],
            1,
            2,
            1000.0,
        )])
        .unwrap();

        let area =
            compute_service_area(&straight_track(), &network, &ReachabilityParams::default());

        assert_eq!(area.len(), 2);
        assert_eq!(area.distance_to(1), Some(0.0));
        assert_eq!(area.distance_to(2), Some(0.0));

        let polygon = area.polygon().unwrap();
        for x in [0.0, 250.0, 500.0, 750.0, 1000.0] {
            assert!(polygon.contains(&Point::new(x, 0.0)), "edge point {x} not covered");
        }
    }

    #[test]
    fn far_track_yields_empty_area() {
        let track = Track::from_projected([(0.0, 5000.0), (1000.0, 5000.0)]).unwrap();
        let area = compute_service_area(&track, &network(), &ReachabilityParams::default());

        assert!(area.is_empty());
        assert!(area.polygon().is_none());
        assert_eq!(area.reach(&Point::new(0.0, 0.0), &network()), Reach::Unreached);
    }

    #[test]
    fn larger_budget_never_shrinks_area() {
        let network = network();
        let track = Track::from_projected([(0.0, 0.0), (600.0, 0.0)]).unwrap();

        let mut previous = 0;
        for max_distance in [100.0, 300.0, 700.0, 1500.0] {
            let params = ReachabilityParams {
                max_distance,
                ..ReachabilityParams::default()
            };
            let area = compute_service_area(&track, &network, &params);
            assert!(area.len() >= previous);
            previous = area.len();
        }
        assert_eq!(previous, 3);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let network = network();
        let params = ReachabilityParams::default();

        let first = compute_service_area(&straight_track(), &network, &params);
        let second = compute_service_area(&straight_track(), &network, &params);

        assert_eq!(first.distances(), second.distances());
        assert_eq!(first.seeds(), second.seeds());
    }

    #[test]
    fn snap_distance_counts_towards_budget() {
        let network = network();
        let params = ReachabilityParams {
            max_distance: 1000.0,
            ..ReachabilityParams::default()
        };
        let area = compute_service_area(&straight_track(), &network, &params);

        assert_eq!(area.distance_to(3), Some(1000.0));
        assert_eq!(
            area.reach(&Point::new(1000.0, 1000.0), &network),
            Reach::Reachable { distance: 1000.0 }
        );

        // Inside the buffered polygon, but 1030 m of walking
        let near_end = Point::new(1030.0, 1000.0);
        assert!(area.polygon().unwrap().contains(&near_end));
        assert_eq!(
            area.reach(&near_end, &network),
            Reach::TooFar { distance: 1030.0 }
        );
    }
}

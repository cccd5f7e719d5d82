use std::collections::BinaryHeap;

use hashbrown::{HashMap, hash_map::Entry};
use petgraph::{graph::NodeIndex, visit::EdgeRef};

use super::state::State;
use crate::{
    Meters,
    model::{RoadEdge, RoadNode},
};

/// Multi-source Dijkstra over the road graph with an inclusive distance
/// cutoff.
///
/// All sources start at distance 0, so every reached node carries the
/// minimum distance over all sources, as if one bounded search ran per
/// source and the smallest value per node was kept.
/// Nodes farther than `max_cost` are never recorded.
pub fn bounded_dijkstra(
    graph: &petgraph::graph::UnGraph<RoadNode, RoadEdge>,
    sources: &[NodeIndex],
    max_cost: Meters,
) -> HashMap<NodeIndex, Meters> {
    let estimated_nodes = graph.node_count().min(4096);
    let mut distances: HashMap<NodeIndex, Meters> = HashMap::with_capacity(estimated_nodes);
    let mut heap = BinaryHeap::with_capacity(estimated_nodes / 4);

    for &source in sources {
        if graph.node_weight(source).is_none() {
            continue;
        }
        if distances.insert(source, 0.0).is_none() {
            heap.push(State {
                cost: 0.0,
                node: source,
            });
        }
    }

    while let Some(State { cost, node }) = heap.pop() {
        // Stale heap entry
        if let Some(&best) = distances.get(&node)
            && cost > best
        {
            continue;
        }

        // Examine neighbors
        for edge in graph.edges(node) {
            let next = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            let next_cost = cost + edge.weight().walking_distance();

            if next_cost > max_cost {
                continue;
            }

            match distances.entry(next) {
                Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                }
                Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                    }
                }
            }
        }
    }

    distances
}

//! Shortest-path search over the road network

pub mod dijkstra;

pub use dijkstra::bounded_dijkstra;

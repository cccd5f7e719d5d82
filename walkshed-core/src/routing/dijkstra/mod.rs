mod bounded;
mod state;

pub use bounded::bounded_dijkstra;

pub mod projection;
pub mod topology;

pub use projection::Mercator;
pub use topology::{Topology, TopologyError};

/// A polyline or polygon ring in (longitude, latitude) degrees.
pub type Ring = Vec<[f64; 2]>;

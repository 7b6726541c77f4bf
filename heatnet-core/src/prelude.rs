pub use crate::DEFAULT_CANDIDATES;

// Re-export key components
pub use crate::crs::CrsId;
pub use crate::geometry::{BuildingPolygon, Connector, StreetLine};
pub use crate::model::{Building, GeoMap, Point3, Street};
pub use crate::network::{CandidateNetwork, NetworkNode, StreetSection};
pub use crate::projection::Projector;
pub use crate::solution::{SolveOptions, Solution};

// Graph and Steiner tree
pub use crate::graph::{EdgeIndex, NodeIndex, WeightedGraph};
pub use crate::steiner::{SteinerTree, approximate};

pub use crate::Error;

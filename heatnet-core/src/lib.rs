//! Candidate district-heating network layouts
//!
//! Building footprints and street centerlines in one planar CRS are turned
//! into polygons and lines, every building gets its shortest connectors to
//! nearby streets, and a Steiner tree approximation over the resulting
//! candidate graph yields the backbone of the network.

pub mod crs;
mod error;
pub mod geometry;
pub mod graph;
pub mod model;
pub mod network;
pub mod prelude;
pub mod projection;
pub mod solution;
pub mod steiner;

pub use crs::CrsId;
pub use error::Error;
pub use geometry::{BuildingPolygon, Connector, StreetLine, connector_of, line_of, polygon_of};
pub use graph::{NodeIndex, WeightedGraph};
pub use model::{Building, GeoMap, Point3, Street};
pub use network::{
    CandidateNetwork, DEFAULT_CANDIDATES, Junction, NetworkEdge, NetworkNode, StreetSection,
};
pub use projection::Projector;
pub use solution::{SolveOptions, Solution};
pub use steiner::{SteinerTree, approximate};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),
    #[error("CRS error: {0}")]
    Crs(String),
    #[error("Transform failed: {0}")]
    Transform(String),
    #[error("Invalid edge weight: {0}")]
    InvalidWeight(f64),
    #[error("Vertex {0} is not part of the graph")]
    UnknownVertex(usize),
    #[error("No terminals provided")]
    NoTerminals,
    #[error("Terminal {0} is not a vertex of the graph")]
    UnknownTerminal(usize),
    #[error("GeoJSON error: {0}")]
    GeoJson(String),
}

//! Input records handed over by the import layer
//!
//! Coordinates are already extracted from CityGML / OSM documents and share
//! the CRS named by [`GeoMap::crs`].

use geo::Coord;
use serde::{Deserialize, Serialize};

/// Raw input vertex, the z value is carried but not used by the core
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 3]")]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn xy(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }
}

impl TryFrom<Vec<f64>> for Point3 {
    type Error = String;

    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        match value.as_slice() {
            [x, y] => Ok(Self::xy(*x, *y)),
            [x, y, z] => Ok(Self::new(*x, *y, *z)),
            other => Err(format!(
                "expected 2 or 3 coordinate values, got {}",
                other.len()
            )),
        }
    }
}

impl From<Point3> for [f64; 3] {
    fn from(p: Point3) -> Self {
        [p.x, p.y, p.z]
    }
}

impl From<Point3> for Coord<f64> {
    fn from(p: Point3) -> Self {
        Coord { x: p.x, y: p.y }
    }
}

/// Building with its footprint ring
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Building {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub coordinates: Vec<Point3>,
}

/// Street with its centerline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Street {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub coordinates: Vec<Point3>,
}

/// Buildings and streets of one project in a single CRS
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeoMap {
    #[serde(default)]
    pub crs: Option<String>,
    #[serde(default)]
    pub buildings: Vec<Building>,
    #[serde(default)]
    pub streets: Vec<Street>,
}

pub(crate) fn planar(points: &[Point3]) -> Vec<Coord<f64>> {
    points.iter().copied().map(Coord::from).collect()
}

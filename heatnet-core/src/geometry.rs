//! Planar geometry primitives and the nearest-point connector search
//!
//! All functions here work in one planar CRS chosen by the caller and never
//! project coordinates themselves.

use geo::{
    Closest, ClosestPoint, Coord, Distance, Euclidean, Line, LineString, Point, Polygon,
    line_intersection::{LineIntersection, line_intersection},
};
use itertools::Itertools;

use crate::{
    Error,
    model::{Building, Street, planar},
};

/// Building footprint as a closed polygon
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingPolygon {
    /// ID of the source building
    pub building: u64,
    pub polygon: Polygon<f64>,
}

impl BuildingPolygon {
    pub fn of(building: &Building) -> Result<Self, Error> {
        let polygon = polygon_of(&planar(&building.coordinates))
            .map_err(|e| Error::InvalidGeometry(format!("building {}: {e}", building.id)))?;
        Ok(Self {
            building: building.id,
            polygon,
        })
    }
}

/// Street centerline as an open polyline
#[derive(Debug, Clone, PartialEq)]
pub struct StreetLine {
    /// ID of the source street
    pub street: u64,
    pub line: LineString<f64>,
}

impl StreetLine {
    pub fn of(street: &Street) -> Result<Self, Error> {
        let line = line_of(&planar(&street.coordinates))
            .map_err(|e| Error::InvalidGeometry(format!("street {}: {e}", street.id)))?;
        Ok(Self {
            street: street.id,
            line,
        })
    }
}

/// Shortest straight segment between a building footprint and a street
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connector {
    /// Index of the building polygon in the enclosing computation
    pub building: usize,
    /// Index of the street line in the enclosing computation
    pub street: usize,
    /// Segment from the building boundary to the street
    pub segment: Line<f64>,
    pub length: f64,
}

impl Connector {
    /// Computes the connector between the building at index `building` and
    /// the street at index `street`
    pub fn between(
        building: usize,
        polygon: &BuildingPolygon,
        street: usize,
        line: &StreetLine,
    ) -> Result<Self, Error> {
        let segment = connector_of(&polygon.polygon, &line.line)?;
        Ok(Self {
            building,
            street,
            segment,
            length: Euclidean.distance(segment.start, segment.end),
        })
    }
}

/// Builds a polygon from an ordered ring of vertices, closing the ring if
/// the first and last vertex differ
pub fn polygon_of(vertices: &[Coord<f64>]) -> Result<Polygon<f64>, Error> {
    if vertices.is_empty() {
        return Err(Error::InvalidGeometry("no polygon coordinates".to_string()));
    }
    check_finite(vertices)?;

    let distinct = vertices
        .iter()
        .unique_by(|c| ((c.x + 0.0).to_bits(), (c.y + 0.0).to_bits()))
        .count();
    if distinct < 3 {
        return Err(Error::DegenerateGeometry(format!(
            "polygon ring needs at least 3 distinct vertices, got {distinct}"
        )));
    }

    // `Polygon::new` closes the exterior ring
    Ok(Polygon::new(LineString::from(vertices.to_vec()), vec![]))
}

/// Builds an open polyline from at least two vertices
pub fn line_of(vertices: &[Coord<f64>]) -> Result<LineString<f64>, Error> {
    if vertices.len() < 2 {
        return Err(Error::InvalidGeometry(format!(
            "line needs at least 2 vertices, got {}",
            vertices.len()
        )));
    }
    check_finite(vertices)?;
    Ok(LineString::from(vertices.to_vec()))
}

/// Computes the segment between the closest pair of points on the polygon
/// boundary and the line
///
/// Every boundary segment is tested against every line segment, so the
/// result is exact up to floating point. Among equidistant pairs the first
/// one found is returned.
pub fn connector_of(polygon: &Polygon<f64>, line: &LineString<f64>) -> Result<Line<f64>, Error> {
    let mut best: Option<(f64, Line<f64>)> = None;

    let rings = std::iter::once(polygon.exterior()).chain(polygon.interiors());
    for ring in rings {
        for edge in ring.lines() {
            for part in line.lines() {
                let (p, q) = nearest_between(edge, part);
                let d = Euclidean.distance(p, q);
                if best.as_ref().is_none_or(|(min, _)| d < *min) {
                    best = Some((d, Line::new(p, q)));
                }
            }
        }
    }

    best.map(|(_, segment)| segment).ok_or_else(|| {
        Error::DegenerateGeometry("failed to calculate distance: less than 2 points".to_string())
    })
}

fn check_finite(vertices: &[Coord<f64>]) -> Result<(), Error> {
    match vertices.iter().find(|c| !c.x.is_finite() || !c.y.is_finite()) {
        Some(c) => Err(Error::InvalidGeometry(format!(
            "non-finite coordinate ({}, {})",
            c.x, c.y
        ))),
        None => Ok(()),
    }
}

fn is_point(segment: Line<f64>) -> bool {
    segment.start == segment.end
}

/// Closest point to `p` on the segment
fn project_onto(p: Coord<f64>, segment: Line<f64>) -> Coord<f64> {
    match segment.closest_point(&Point::from(p)) {
        Closest::Intersection(q) | Closest::SinglePoint(q) => q.0,
        // zero-length segment
        Closest::Indeterminate => segment.start,
    }
}

/// Nearest pair `(point on a, point on b)` of two segments
fn nearest_between(a: Line<f64>, b: Line<f64>) -> (Coord<f64>, Coord<f64>) {
    if !is_point(a) && !is_point(b) {
        match line_intersection(a, b) {
            Some(LineIntersection::SinglePoint { intersection, .. }) => {
                return (intersection, intersection);
            }
            Some(LineIntersection::Collinear { intersection }) => {
                return (intersection.start, intersection.start);
            }
            None => {}
        }
    }

    // Without an intersection the minimum is attained at an endpoint of
    // one of the two segments.
    let candidates = [
        (a.start, project_onto(a.start, b)),
        (a.end, project_onto(a.end, b)),
        (project_onto(b.start, a), b.start),
        (project_onto(b.end, a), b.end),
    ];
    let mut best = candidates[0];
    let mut best_distance = Euclidean.distance(best.0, best.1);
    for pair in &candidates[1..] {
        let d = Euclidean.distance(pair.0, pair.1);
        if d < best_distance {
            best = *pair;
            best_distance = d;
        }
    }
    best
}

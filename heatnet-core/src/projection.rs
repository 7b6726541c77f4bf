//! Coordinate transformation between reference systems
//!
//! Thin wrapper around proj4rs. proj4rs works in radians for geographic
//! systems while everything in this crate uses degrees (x = longitude,
//! y = latitude), so the conversion is done here.

use geo::{Coord, LineString, Polygon};
use proj4rs::Proj;

use crate::{CrsId, Error, model::GeoMap};

/// A transform from one CRS into another
pub struct Projector {
    source: Proj,
    target: Proj,
    source_id: CrsId,
    target_id: CrsId,
    source_is_geo: bool,
    target_is_geo: bool,
}

impl std::fmt::Debug for Projector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projector")
            .field("source", &self.source_id)
            .field("target", &self.target_id)
            .finish()
    }
}

impl Projector {
    /// Creates a transform between two reference systems
    ///
    /// # Errors
    ///
    /// Returns [`Error::Crs`] if one of the identifiers is invalid or
    /// unknown to the projection library.
    pub fn for_transform(source: &CrsId, target: &CrsId) -> Result<Self, Error> {
        let source_proj = proj_of(source).map_err(|e| wrap_crs_error("source", &e))?;
        let target_proj = proj_of(target).map_err(|e| wrap_crs_error("target", &e))?;
        let source_is_geo = source_proj.is_latlong();
        let target_is_geo = target_proj.is_latlong();
        Ok(Self {
            source: source_proj,
            target: target_proj,
            source_id: source.clone(),
            target_id: target.clone(),
            source_is_geo,
            target_is_geo,
        })
    }

    /// Projects coordinates of the given CRS into WGS84, used for
    /// displaying project data on web maps.
    pub fn to_wgs84_from(source_crs: &str) -> Result<Self, Error> {
        if source_crs.trim().is_empty() {
            return Err(Error::Crs("empty ID of source CRS".to_string()));
        }
        Self::for_transform(&CrsId::parse(source_crs), &CrsId::wgs84())
    }

    /// Projects WGS84 coordinates into the given CRS, used for mapping
    /// externally fetched data (e.g. OSM streets) into a project.
    pub fn from_wgs84_to(target_crs: &str) -> Result<Self, Error> {
        if target_crs.trim().is_empty() {
            return Err(Error::Crs("empty ID of target CRS".to_string()));
        }
        Self::for_transform(&CrsId::wgs84(), &CrsId::parse(target_crs))
    }

    pub fn to_wgs84_for(map: &GeoMap) -> Result<Self, Error> {
        match map.crs.as_deref() {
            Some(crs) if !crs.trim().is_empty() => Self::to_wgs84_from(crs),
            _ => Err(Error::Crs("CRS of map is not defined".to_string())),
        }
    }

    pub fn source(&self) -> &CrsId {
        &self.source_id
    }

    pub fn target(&self) -> &CrsId {
        &self.target_id
    }

    /// Transforms a single coordinate
    pub fn project_point(&self, x: f64, y: f64) -> Result<Coord<f64>, Error> {
        let mut point = if self.source_is_geo {
            (x.to_radians(), y.to_radians())
        } else {
            (x, y)
        };

        proj4rs::transform::transform(&self.source, &self.target, &mut point)
            .map_err(|e| Error::Transform(format!("({x}, {y}): {e}")))?;

        let (px, py) = if self.target_is_geo {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            point
        };
        if !px.is_finite() || !py.is_finite() {
            return Err(Error::Transform(format!(
                "({x}, {y}) is outside the domain of {}",
                self.target_id
            )));
        }
        Ok(Coord { x: px, y: py })
    }

    /// Transforms all coordinates, failing as a whole if a single one fails
    pub fn project_array(&self, coords: &[Coord<f64>]) -> Result<Vec<Coord<f64>>, Error> {
        let mut buffer: Vec<(f64, f64)> = coords
            .iter()
            .map(|c| {
                if self.source_is_geo {
                    (c.x.to_radians(), c.y.to_radians())
                } else {
                    (c.x, c.y)
                }
            })
            .collect();

        proj4rs::transform::transform(&self.source, &self.target, buffer.as_mut_slice())
            .map_err(|e| Error::Transform(e.to_string()))?;

        buffer
            .into_iter()
            .map(|(x, y)| {
                let (x, y) = if self.target_is_geo {
                    (x.to_degrees(), y.to_degrees())
                } else {
                    (x, y)
                };
                if x.is_finite() && y.is_finite() {
                    Ok(Coord { x, y })
                } else {
                    Err(Error::Transform(format!(
                        "coordinate outside the domain of {}",
                        self.target_id
                    )))
                }
            })
            .collect()
    }

    pub fn project_line(&self, line: &LineString<f64>) -> Result<LineString<f64>, Error> {
        Ok(LineString::new(self.project_array(&line.0)?))
    }

    /// Projects the exterior and all interior rings of a polygon
    pub fn project_polygon(&self, polygon: &Polygon<f64>) -> Result<Polygon<f64>, Error> {
        let exterior = self.project_line(polygon.exterior())?;
        let interiors = polygon
            .interiors()
            .iter()
            .map(|ring| self.project_line(ring))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Polygon::new(exterior, interiors))
    }
}

fn proj_of(id: &CrsId) -> Result<Proj, Error> {
    if !id.is_valid() {
        return Err(Error::Crs(format!("invalid CRS identifier '{id}'")));
    }
    Proj::from_user_string(&id.value)
        .map_err(|e| Error::Crs(format!("could not create CRS {id}: {e}")))
}

fn wrap_crs_error(role: &str, error: &Error) -> Error {
    match error {
        Error::Crs(msg) => Error::Crs(format!("failed to create {role} CRS: {msg}")),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn utm32_to_wgs84_and_back() {
        let forward = Projector::for_transform(&CrsId::utm32(), &CrsId::wgs84()).unwrap();
        let inverse = Projector::for_transform(&CrsId::wgs84(), &CrsId::utm32()).unwrap();

        let (x, y) = (565_000.0, 5_933_000.0);
        let geo = forward.project_point(x, y).unwrap();
        assert!(geo.x > 9.0 && geo.x < 11.0, "longitude out of range: {}", geo.x);
        assert!(geo.y > 53.0 && geo.y < 54.0, "latitude out of range: {}", geo.y);

        let back = inverse.project_point(geo.x, geo.y).unwrap();
        assert_abs_diff_eq!(back.x, x, epsilon = 1e-5);
        assert_abs_diff_eq!(back.y, y, epsilon = 1e-5);
    }

    #[test]
    fn standing_configurations() {
        let to = Projector::to_wgs84_from("urn:adv:crs:ETRS89_UTM33*DE_DHHN2016_NH").unwrap();
        assert_eq!(to.source(), &CrsId::utm33());
        assert_eq!(to.target(), &CrsId::wgs84());

        let from = Projector::from_wgs84_to("EPSG:25832").unwrap();
        assert_eq!(from.source(), &CrsId::wgs84());
        assert_eq!(from.target(), &CrsId::utm32());

        assert!(matches!(Projector::to_wgs84_from(" "), Err(Error::Crs(_))));
        assert!(matches!(Projector::from_wgs84_to(""), Err(Error::Crs(_))));
    }

    #[test]
    fn unresolvable_crs_is_an_error() {
        let unknown = CrsId::parse("not a crs");
        assert!(Projector::for_transform(&unknown, &CrsId::wgs84()).is_err());
        assert!(Projector::for_transform(&CrsId::of(99999), &CrsId::wgs84()).is_err());
    }

    #[test]
    fn map_without_crs_is_an_error() {
        let map = GeoMap::default();
        assert!(matches!(Projector::to_wgs84_for(&map), Err(Error::Crs(_))));
    }

    #[test]
    fn array_projection_matches_point_projection() {
        let projector = Projector::from_wgs84_to("EPSG:25833").unwrap();
        let coords = vec![Coord { x: 13.4, y: 52.5 }, Coord { x: 14.0, y: 51.0 }];
        let projected = projector.project_array(&coords).unwrap();
        assert_eq!(projected.len(), coords.len());
        for (c, p) in coords.iter().zip(&projected) {
            let single = projector.project_point(c.x, c.y).unwrap();
            assert_abs_diff_eq!(single.x, p.x, epsilon = 1e-9);
            assert_abs_diff_eq!(single.y, p.y, epsilon = 1e-9);
        }
    }

    #[test]
    fn latitude_beyond_the_pole_fails() {
        let projector = Projector::from_wgs84_to("EPSG:25832").unwrap();
        assert!(matches!(
            projector.project_point(9.0, 95.0),
            Err(Error::Transform(_))
        ));
    }

    #[test]
    fn one_bad_point_fails_the_whole_array() {
        let projector = Projector::from_wgs84_to("EPSG:25832").unwrap();
        let coords = vec![Coord { x: 9.0, y: 50.0 }, Coord { x: 9.0, y: 95.0 }];
        assert!(projector.project_point(9.0, 50.0).is_ok());
        assert!(matches!(
            projector.project_array(&coords),
            Err(Error::Transform(_))
        ));

        let line = LineString::from(coords);
        assert!(matches!(projector.project_line(&line), Err(Error::Transform(_))));
    }
}

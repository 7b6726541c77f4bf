use geo::LineString;
use geojson::{Feature, FeatureCollection, Geometry, GeometryValue};
use hashbrown::HashSet;
use log::warn;
use serde_json::json;

use super::Solution;
use crate::{Error, projection::Projector};

impl Solution {
    /// Converts buildings, streets, connectors and the street sections of
    /// the backbone to a `GeoJSON` `FeatureCollection`.
    ///
    /// With a projector every geometry is projected first, e.g. into WGS84
    /// for web maps; features that fail to project are left out.
    pub fn to_geojson(&self, projector: Option<&Projector>) -> Result<FeatureCollection, Error> {
        let mut features = Vec::new();

        for building in &self.buildings {
            let polygon = match projector {
                Some(p) => match p.project_polygon(&building.polygon) {
                    Ok(polygon) => polygon,
                    Err(e) => {
                        warn!("Skipping building {} in GeoJSON: {e}", building.building);
                        continue;
                    }
                },
                None => building.polygon.clone(),
            };
            let value = json!({
                "type": "Feature",
                "geometry": Geometry::new(GeometryValue::from(&polygon)),
                "properties": {
                    "type": "building",
                    "id": building.building,
                }
            });
            features.push(feature_of(value)?);
        }

        for street in &self.streets {
            let Some(line) = project_line(projector, &street.line, "street") else {
                continue;
            };
            let value = json!({
                "type": "Feature",
                "geometry": Geometry::new(GeometryValue::from(&line)),
                "properties": {
                    "type": "street",
                    "id": street.street,
                }
            });
            features.push(feature_of(value)?);
        }

        let in_backbone: HashSet<usize> = self
            .backbone
            .iter()
            .flat_map(|tree| tree.source_edges())
            .map(|edge| edge.index())
            .collect();

        for (idx, connector) in self.connectors.iter().enumerate() {
            let segment = LineString::from(vec![connector.segment.start, connector.segment.end]);
            let Some(line) = project_line(projector, &segment, "connector") else {
                continue;
            };
            let building = self.buildings.get(connector.building).map(|b| b.building);
            let street = self.streets.get(connector.street).map(|s| s.street);
            let value = json!({
                "type": "Feature",
                "geometry": Geometry::new(GeometryValue::from(&line)),
                "properties": {
                    "type": "connector",
                    "building": building,
                    "street": street,
                    "length": connector.length,
                    "in_backbone": in_backbone.contains(&idx),
                }
            });
            features.push(feature_of(value)?);
        }

        for section in self.backbone_sections() {
            let Some(line) = project_line(projector, &section.line, "street section") else {
                continue;
            };
            let street = self.streets.get(section.street).map(|s| s.street);
            let value = json!({
                "type": "Feature",
                "geometry": Geometry::new(GeometryValue::from(&line)),
                "properties": {
                    "type": "main",
                    "street": street,
                    "length": section.length,
                }
            });
            features.push(feature_of(value)?);
        }

        Ok(FeatureCollection {
            features,
            bbox: None,
            foreign_members: None,
        })
    }

    pub fn to_geojson_string(&self, projector: Option<&Projector>) -> Result<String, Error> {
        serde_json::to_string(&self.to_geojson(projector)?)
            .map_err(|e| Error::GeoJson(e.to_string()))
    }
}

fn project_line(
    projector: Option<&Projector>,
    line: &LineString<f64>,
    kind: &str,
) -> Option<LineString<f64>> {
    match projector {
        Some(p) => p
            .project_line(line)
            .inspect_err(|e| warn!("Skipping {kind} in GeoJSON: {e}"))
            .ok(),
        None => Some(line.clone()),
    }
}

fn feature_of(value: serde_json::Value) -> Result<Feature, Error> {
    serde_json::from_value(value).map_err(|e| Error::GeoJson(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Building, GeoMap, Point3, SolveOptions, Street};

    fn solution() -> Solution {
        let map = GeoMap {
            crs: Some("EPSG:25832".to_string()),
            buildings: vec![Building {
                id: 5,
                name: Some("town hall".to_string()),
                coordinates: vec![
                    Point3::xy(565_000.0, 5_933_000.0),
                    Point3::xy(565_020.0, 5_933_000.0),
                    Point3::xy(565_020.0, 5_933_020.0),
                    Point3::xy(565_000.0, 5_933_020.0),
                ],
            }],
            streets: vec![Street {
                id: 9,
                name: None,
                coordinates: vec![
                    Point3::xy(564_990.0, 5_933_030.0),
                    Point3::xy(565_050.0, 5_933_030.0),
                ],
            }],
        };
        Solution::calculate(
            &map,
            &SolveOptions {
                candidates_per_building: 3,
                backbone: true,
            },
        )
    }

    fn as_json(collection: &FeatureCollection) -> serde_json::Value {
        serde_json::to_value(collection).unwrap()
    }

    fn kinds(json: &serde_json::Value) -> Vec<&str> {
        json["features"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|f| f["properties"]["type"].as_str())
            .collect()
    }

    #[test]
    fn planar_export() {
        let json = as_json(&solution().to_geojson(None).unwrap());
        assert_eq!(kinds(&json), vec!["building", "street", "connector"]);

        let connector = &json["features"][2]["properties"];
        assert_eq!(connector["length"].as_f64(), Some(10.0));
        assert_eq!(connector["building"].as_u64(), Some(5));
        assert_eq!(connector["street"].as_u64(), Some(9));
        assert_eq!(connector["in_backbone"].as_bool(), Some(false));
        assert_eq!(json["features"][0]["geometry"]["type"], "Polygon");
    }

    #[test]
    fn wgs84_export() {
        let projector = Projector::to_wgs84_from("EPSG:25832").unwrap();
        let text = solution().to_geojson_string(Some(&projector)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(kinds(&json).len(), 3);

        let coords = json["features"][1]["geometry"]["coordinates"].as_array().unwrap();
        assert_eq!(coords.len(), 2);
        for position in coords {
            let lon = position[0].as_f64().unwrap();
            let lat = position[1].as_f64().unwrap();
            assert!(lon > 9.0 && lon < 11.0, "longitude out of range: {lon}");
            assert!(lat > 53.0 && lat < 54.0, "latitude out of range: {lat}");
        }
    }

    #[test]
    fn backbone_sections_become_main_lines() {
        let square = |id: u64, x: f64| Building {
            id,
            name: None,
            coordinates: vec![
                Point3::xy(x, 0.0),
                Point3::xy(x + 4.0, 0.0),
                Point3::xy(x + 4.0, 4.0),
                Point3::xy(x, 4.0),
            ],
        };
        let map = GeoMap {
            crs: None,
            buildings: vec![square(1, 0.0), square(2, 10.0)],
            streets: vec![Street {
                id: 7,
                name: None,
                coordinates: vec![Point3::xy(-5.0, 6.0), Point3::xy(20.0, 6.0)],
            }],
        };
        let options = SolveOptions {
            candidates_per_building: 1,
            backbone: true,
        };
        let json = as_json(&Solution::calculate(&map, &options).to_geojson(None).unwrap());
        assert_eq!(
            kinds(&json),
            vec!["building", "building", "street", "connector", "connector", "main"]
        );

        let main = &json["features"][5]["properties"];
        assert_eq!(main["street"].as_u64(), Some(7));
        let length = main["length"].as_f64().unwrap();
        assert!((length - 10.0).abs() < 1e-9, "unexpected length {length}");
        assert_eq!(json["features"][3]["properties"]["in_backbone"].as_bool(), Some(true));
    }

    #[test]
    fn malformed_feature_is_a_geojson_error() {
        let value = json!({ "type": "Feature", "geometry": 42 });
        assert!(matches!(feature_of(value), Err(Error::GeoJson(_))));
    }
}

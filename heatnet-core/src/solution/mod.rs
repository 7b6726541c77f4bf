//! Complete solve of one map: geometry, candidate connectors and the
//! optional backbone tree

mod export;

use geo::{BoundingRect, Coord, Rect};
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    geometry::{BuildingPolygon, Connector, StreetLine},
    model::GeoMap,
    network::{CandidateNetwork, DEFAULT_CANDIDATES, NetworkNode, StreetSection},
    steiner::{self, SteinerTree},
};

/// Parameters of a solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    /// Connectors kept per building
    pub candidates_per_building: usize,
    /// Compute a Steiner tree over all buildings
    pub backbone: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            candidates_per_building: DEFAULT_CANDIDATES,
            backbone: false,
        }
    }
}

/// Network layout derived from a map
#[derive(Debug, Clone, Default)]
pub struct Solution {
    pub buildings: Vec<BuildingPolygon>,
    pub streets: Vec<StreetLine>,
    pub connectors: Vec<Connector>,
    /// Streets cut at connector access points and junctions
    pub sections: Vec<StreetSection>,
    /// Tree over the candidate graph, source edges `0..connectors` are the
    /// connectors and the sections follow
    pub backbone: Option<SteinerTree<NetworkNode>>,
}

impl Solution {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds polygons, lines, connectors and optionally the backbone for
    /// a map whose coordinates share one planar CRS
    ///
    /// Buildings and streets with invalid geometry are skipped.
    pub fn calculate(map: &GeoMap, options: &SolveOptions) -> Self {
        if map.buildings.is_empty() || map.streets.is_empty() {
            return Self::empty();
        }

        let buildings: Vec<BuildingPolygon> = map
            .buildings
            .par_iter()
            .filter_map(|b| {
                BuildingPolygon::of(b)
                    .inspect_err(|e| warn!("Skipping building: {e}"))
                    .ok()
            })
            .collect();

        let streets: Vec<StreetLine> = map
            .streets
            .par_iter()
            .filter_map(|s| {
                StreetLine::of(s)
                    .inspect_err(|e| warn!("Skipping street: {e}"))
                    .ok()
            })
            .collect();

        info!(
            "Built {} of {} building polygons and {} of {} street lines",
            buildings.len(),
            map.buildings.len(),
            streets.len(),
            map.streets.len()
        );

        let network =
            CandidateNetwork::build(&buildings, &streets, options.candidates_per_building);

        let backbone = if options.backbone && !network.is_empty() {
            backbone_of(&network)
                .inspect_err(|e| warn!("No backbone computed: {e}"))
                .ok()
        } else {
            None
        };

        let (connectors, sections) = network.into_parts();
        Self {
            buildings,
            streets,
            connectors,
            sections,
            backbone,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty() || self.streets.is_empty()
    }

    /// Bounding box of all polygons and lines, a zero-sized box at the
    /// origin when there are none
    pub fn envelope(&self) -> Rect<f64> {
        let rects = self
            .buildings
            .iter()
            .filter_map(|b| b.polygon.bounding_rect())
            .chain(self.streets.iter().filter_map(|s| s.line.bounding_rect()));

        rects
            .reduce(|acc, r| {
                Rect::new(
                    Coord {
                        x: acc.min().x.min(r.min().x),
                        y: acc.min().y.min(r.min().y),
                    },
                    Coord {
                        x: acc.max().x.max(r.max().x),
                        y: acc.max().y.max(r.max().y),
                    },
                )
            })
            .unwrap_or_else(|| Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 0.0 }))
    }

    /// Connectors that are part of the backbone
    pub fn backbone_connectors(&self) -> impl Iterator<Item = &Connector> {
        self.backbone
            .iter()
            .flat_map(|tree| tree.source_edges())
            .filter_map(|edge| self.connectors.get(edge.index()))
    }

    /// Street sections that are part of the backbone
    pub fn backbone_sections(&self) -> impl Iterator<Item = &StreetSection> {
        self.backbone
            .iter()
            .flat_map(|tree| tree.source_edges())
            .filter_map(|edge| edge.index().checked_sub(self.connectors.len()))
            .filter_map(|idx| self.sections.get(idx))
    }

    /// Total length of the backbone, zero without one
    pub fn backbone_length(&self) -> f64 {
        self.backbone
            .as_ref()
            .map_or(0.0, SteinerTree::total_weight)
    }
}

fn backbone_of(network: &CandidateNetwork) -> Result<SteinerTree<NetworkNode>, Error> {
    let graph = network.graph();
    let terminals = network.terminals_for_buildings();
    steiner::approximate(&graph, &terminals)
}

//! Candidate connectors between buildings and streets and the street
//! network that links them

use geo::{
    BoundingRect, Coord, Euclidean, Intersects, Length, LineLocatePoint, LineString, Point,
    line_intersection::{LineIntersection, line_intersection},
};
use itertools::Itertools;
use log::{debug, info, trace, warn};
use rayon::prelude::*;

use crate::{
    geometry::{BuildingPolygon, Connector, StreetLine},
    graph::{NodeIndex, WeightedGraph},
};

/// Number of connectors kept per building by default
pub const DEFAULT_CANDIDATES: usize = 3;

/// Vertex of the candidate graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkNode {
    /// Index into the building polygons
    Building(usize),
    /// Point where the connector with this index meets its street
    Access(usize),
    /// Index into [`CandidateNetwork::junctions`]
    Junction(usize),
}

/// Point shared by two streets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Junction {
    /// Indices of the two street lines, lower first
    pub streets: (usize, usize),
    pub point: Coord<f64>,
}

/// Piece of a street between two consecutive network vertices on it
#[derive(Debug, Clone, PartialEq)]
pub struct StreetSection {
    /// Index of the street line
    pub street: usize,
    pub from: NetworkNode,
    pub to: NetworkNode,
    /// Distance along the street
    pub length: f64,
    pub line: LineString<f64>,
}

/// Edge of the candidate graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NetworkEdge<'a> {
    Connector(&'a Connector),
    Section(&'a StreetSection),
}

/// The `k` shortest connectors of every building plus the street sections
/// between connector access points and junctions
#[derive(Debug, Clone, Default)]
pub struct CandidateNetwork {
    building_count: usize,
    connectors: Vec<Connector>,
    junctions: Vec<Junction>,
    sections: Vec<StreetSection>,
}

impl CandidateNetwork {
    /// Connects every building to every street and keeps the `k` shortest
    /// connectors per building, then splits the streets at access points
    /// and junctions
    ///
    /// Connectors that cannot be computed are skipped. Equal lengths keep
    /// the street order.
    pub fn build(buildings: &[BuildingPolygon], streets: &[StreetLine], k: usize) -> Self {
        if buildings.is_empty() || streets.is_empty() {
            debug!(
                "No candidate network for {} buildings and {} streets",
                buildings.len(),
                streets.len()
            );
            return Self {
                building_count: buildings.len(),
                ..Self::default()
            };
        }

        info!(
            "Calculating connectors between {} buildings and {} streets",
            buildings.len(),
            streets.len()
        );

        let connectors: Vec<Connector> = buildings
            .par_iter()
            .enumerate()
            .flat_map_iter(|(b_idx, building)| nearest_connectors(b_idx, building, streets, k))
            .collect();

        let junctions = find_junctions(streets);
        let sections = split_streets(streets, &connectors, &junctions);

        info!(
            "Kept {} candidate connectors, found {} junctions and {} street sections",
            connectors.len(),
            junctions.len(),
            sections.len()
        );
        Self {
            building_count: buildings.len(),
            connectors,
            junctions,
            sections,
        }
    }

    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    pub fn junctions(&self) -> &[Junction] {
        &self.junctions
    }

    pub fn sections(&self) -> &[StreetSection] {
        &self.sections
    }

    /// Splits the network into its connectors and street sections
    pub fn into_parts(self) -> (Vec<Connector>, Vec<StreetSection>) {
        (self.connectors, self.sections)
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }

    /// Connectors of one building, shortest first
    pub fn connectors_of(&self, building: usize) -> impl Iterator<Item = &Connector> {
        self.connectors
            .iter()
            .filter(move |c| c.building == building)
    }

    /// Graph with building vertices first, then one access vertex per
    /// connector, then the junctions
    ///
    /// Edges `0..connectors` are the connectors in order, the street
    /// sections follow them, see [`CandidateNetwork::edge`].
    pub fn graph(&self) -> WeightedGraph<NetworkNode> {
        let mut graph = WeightedGraph::with_capacity(
            self.building_count + self.connectors.len() + self.junctions.len(),
            self.connectors.len() + self.sections.len(),
        );
        for b in 0..self.building_count {
            graph.add_vertex(NetworkNode::Building(b));
        }
        for c in 0..self.connectors.len() {
            graph.add_vertex(NetworkNode::Access(c));
        }
        for j in 0..self.junctions.len() {
            graph.add_vertex(NetworkNode::Junction(j));
        }

        for (idx, connector) in self.connectors.iter().enumerate() {
            let from = self.building_vertex(connector.building);
            let to = self.access_vertex(idx);
            if let Err(e) = graph.add_edge(from, to, connector.length) {
                warn!("Skipping connector {connector:?}: {e}");
            }
        }
        for section in &self.sections {
            let from = self.vertex_of(section.from);
            let to = self.vertex_of(section.to);
            if let Err(e) = graph.add_edge(from, to, section.length) {
                warn!("Skipping section of street {}: {e}", section.street);
            }
        }
        graph
    }

    /// Connector or street section behind an edge of [`CandidateNetwork::graph`]
    pub fn edge(&self, index: usize) -> Option<NetworkEdge<'_>> {
        match index.checked_sub(self.connectors.len()) {
            None => self.connectors.get(index).map(NetworkEdge::Connector),
            Some(section) => self.sections.get(section).map(NetworkEdge::Section),
        }
    }

    pub fn building_vertex(&self, building: usize) -> NodeIndex {
        NodeIndex::new(building)
    }

    pub fn access_vertex(&self, connector: usize) -> NodeIndex {
        NodeIndex::new(self.building_count + connector)
    }

    pub fn junction_vertex(&self, junction: usize) -> NodeIndex {
        NodeIndex::new(self.building_count + self.connectors.len() + junction)
    }

    pub fn vertex_of(&self, node: NetworkNode) -> NodeIndex {
        match node {
            NetworkNode::Building(b) => self.building_vertex(b),
            NetworkNode::Access(c) => self.access_vertex(c),
            NetworkNode::Junction(j) => self.junction_vertex(j),
        }
    }

    /// All building vertices, the usual terminal set
    pub fn terminals_for_buildings(&self) -> Vec<NodeIndex> {
        (0..self.building_count)
            .map(|b| self.building_vertex(b))
            .collect()
    }
}

/// Connectors from one building to all streets, shortest `k` first
fn nearest_connectors(
    b_idx: usize,
    building: &BuildingPolygon,
    streets: &[StreetLine],
    k: usize,
) -> Vec<Connector> {
    let mut candidates: Vec<Connector> = streets
        .iter()
        .enumerate()
        .filter_map(|(s_idx, street)| {
            Connector::between(b_idx, building, s_idx, street)
                .inspect_err(|e| {
                    trace!(
                        "No connector between building {} and street {}: {e}",
                        building.building, street.street
                    );
                })
                .ok()
        })
        .collect();

    // stable, so ties keep the street order
    candidates.sort_by(|a, b| a.length.total_cmp(&b.length));
    candidates.truncate(k);
    candidates
}

/// Crossing and touching points of all street pairs
fn find_junctions(streets: &[StreetLine]) -> Vec<Junction> {
    let bounds: Vec<_> = streets.iter().map(|s| s.line.bounding_rect()).collect();

    (0..streets.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            let bounds = &bounds;
            ((i + 1)..streets.len())
                .filter(move |&j| match (bounds[i], bounds[j]) {
                    (Some(a), Some(b)) => a.intersects(&b),
                    _ => false,
                })
                .flat_map(move |j| {
                    crossings(&streets[i].line, &streets[j].line)
                        .into_iter()
                        .map(move |point| Junction {
                            streets: (i, j),
                            point,
                        })
                })
        })
        .collect()
}

/// Distinct shared points of two polylines, in segment order
fn crossings(a: &LineString<f64>, b: &LineString<f64>) -> Vec<Coord<f64>> {
    a.lines()
        .cartesian_product(b.lines().collect_vec())
        .filter_map(|(p, q)| match line_intersection(p, q) {
            Some(LineIntersection::SinglePoint { intersection, .. }) => Some(intersection),
            // overlapping streets are joined once
            Some(LineIntersection::Collinear { intersection }) => Some(intersection.start),
            None => None,
        })
        .unique_by(|c| ((c.x + 0.0).to_bits(), (c.y + 0.0).to_bits()))
        .collect()
}

/// A network vertex located on a street
#[derive(Debug, Clone, Copy)]
struct Stop {
    offset: f64,
    node: NetworkNode,
    point: Coord<f64>,
}

/// Cuts every street into sections between consecutive stops
fn split_streets(
    streets: &[StreetLine],
    connectors: &[Connector],
    junctions: &[Junction],
) -> Vec<StreetSection> {
    let mut stops: Vec<Vec<(NetworkNode, Coord<f64>)>> = vec![Vec::new(); streets.len()];
    for (idx, connector) in connectors.iter().enumerate() {
        stops[connector.street].push((NetworkNode::Access(idx), connector.segment.end));
    }
    for (idx, junction) in junctions.iter().enumerate() {
        let (a, b) = junction.streets;
        stops[a].push((NetworkNode::Junction(idx), junction.point));
        stops[b].push((NetworkNode::Junction(idx), junction.point));
    }

    streets
        .par_iter()
        .zip(stops)
        .enumerate()
        .flat_map_iter(|(s_idx, (street, on_street))| sections_of(s_idx, &street.line, on_street))
        .collect()
}

fn sections_of(
    street: usize,
    line: &LineString<f64>,
    on_street: Vec<(NetworkNode, Coord<f64>)>,
) -> Vec<StreetSection> {
    if on_street.len() < 2 {
        return Vec::new();
    }

    let total = Euclidean.length(line);
    let mut stops: Vec<Stop> = on_street
        .into_iter()
        .filter_map(|(node, point)| {
            let Some(fraction) = line.line_locate_point(&Point::from(point)) else {
                trace!("Cannot locate {node:?} on street {street}");
                return None;
            };
            Some(Stop {
                offset: fraction * total,
                node,
                point,
            })
        })
        .collect();
    stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));

    stops
        .iter()
        .tuple_windows()
        .map(|(from, to)| StreetSection {
            street,
            from: from.node,
            to: to.node,
            length: (to.offset - from.offset).max(0.0),
            line: section_line(line, from, to),
        })
        .collect()
}

/// Part of `line` between two stops, following its vertices
fn section_line(line: &LineString<f64>, from: &Stop, to: &Stop) -> LineString<f64> {
    let mut coords = vec![from.point];
    let mut walked = 0.0;
    for segment in line.lines() {
        walked += Euclidean.length(&segment);
        if walked > from.offset && walked < to.offset {
            coords.push(segment.end);
        }
    }
    coords.push(to.point);
    LineString::from(coords)
}

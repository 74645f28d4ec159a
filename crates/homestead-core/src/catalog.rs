//! Stock boards and rules configurations.
//!
//! Board layouts live here as static coordinate tables on the same
//! character-grid system the layout tooling uses: junctions on even rows,
//! road slots diagonally between them, hexes and ocean filler on the odd
//! rows. Adjacency is derived from the grid offsets, so a table only names
//! each node once; ports are the only hand-listed pairs.
//!
//! External layout files are somebody else's problem; whatever parses them
//! just has to produce the same `(x, y, kind)` declarations these tables do.

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::config::{Building, PortProfile, RulesConfig};
use crate::graph::{BoardGraph, Direction, EdgeSpec, NodeKind, NodeSpec, Orientation, PortSpec};
use crate::player::DevelopmentCard;
use crate::resources::{HexResource, Resource, ResourceCounts};

const J: NodeKind = NodeKind::Junction;
const R: NodeKind = NodeKind::Road;
const H: NodeKind = NodeKind::Hex;
const O: NodeKind = NodeKind::Ocean;

/// Neighbor offsets one grid step away: the road slots around a junction,
/// or the junctions at a road's two ends.
const NEAR_OFFSETS: [(Direction, i32, i32); 6] = [
    (Direction::Clock12, 0, -1),
    (Direction::Clock2, 2, -1),
    (Direction::Clock4, 2, 1),
    (Direction::Clock6, 0, 1),
    (Direction::Clock8, -2, 1),
    (Direction::Clock10, -2, -1),
];

/// Neighbor offsets across a full cell: a hex's six corners, or the hexes
/// and oceans around a junction.
const FAR_OFFSETS: [(Direction, i32, i32); 6] = [
    (Direction::Clock12, 0, -3),
    (Direction::Clock2, 4, -1),
    (Direction::Clock4, 4, 1),
    (Direction::Clock6, 0, 3),
    (Direction::Clock8, -4, 1),
    (Direction::Clock10, -4, -1),
];

/// Build a graph from a node table and hand-listed port pairs.
///
/// Edges are derived: each node looks up its kind's offsets and connects to
/// whatever of the expected kinds sits there. A malformed table is a defect
/// in this module, so construction failures panic.
fn build_board(nodes: &[(usize, usize, NodeKind)], ports: &[(usize, usize, Orientation)]) -> BoardGraph {
    let coords: HashMap<(usize, usize), usize> = nodes
        .iter()
        .enumerate()
        .map(|(index, &(x, y, _))| ((x, y), index))
        .collect();

    let lookup = |x: usize, y: usize, dx: i32, dy: i32| -> Option<usize> {
        let x = x as i32 + dx;
        let y = y as i32 + dy;
        if x < 0 || y < 0 {
            return None;
        }
        coords.get(&(x as usize, y as usize)).copied()
    };

    let mut edges: Vec<EdgeSpec> = Vec::new();
    let mut push_edges = |from: usize,
                          x: usize,
                          y: usize,
                          offsets: &[(Direction, i32, i32)],
                          wanted: &[NodeKind]| {
        for &(direction, dx, dy) in offsets {
            if let Some(to) = lookup(x, y, dx, dy) {
                if wanted.contains(&nodes[to].2) {
                    edges.push(EdgeSpec {
                        from,
                        to,
                        direction,
                    });
                }
            }
        }
    };

    for (index, &(x, y, kind)) in nodes.iter().enumerate() {
        match kind {
            NodeKind::Junction => {
                push_edges(index, x, y, &NEAR_OFFSETS, &[NodeKind::Road]);
                push_edges(
                    index,
                    x,
                    y,
                    &FAR_OFFSETS,
                    &[NodeKind::Hex, NodeKind::Ocean, NodeKind::UnflippedHex],
                );
            }
            NodeKind::Road => {
                push_edges(index, x, y, &NEAR_OFFSETS, &[NodeKind::Junction]);
            }
            NodeKind::Hex | NodeKind::Ocean | NodeKind::UnflippedHex => {
                push_edges(index, x, y, &FAR_OFFSETS, &[NodeKind::Junction]);
            }
        }
    }

    let node_specs: Vec<NodeSpec> = nodes
        .iter()
        .map(|&(x, y, kind)| NodeSpec { x, y, kind })
        .collect();
    let port_specs: Vec<PortSpec> = ports
        .iter()
        .map(|&(a, b, orientation)| PortSpec { a, b, orientation })
        .collect();
    let width = nodes.iter().map(|&(x, _, _)| x).max().map_or(0, |x| x + 1);
    let height = nodes.iter().map(|&(_, y, _)| y).max().map_or(0, |y| y + 1);

    BoardGraph::new(width, height, &node_specs, &edges, &port_specs)
        .expect("catalog board tables are well-formed")
}

/// The classic 19-hex board: 54 junctions, 72 road slots, 9 ports, ocean
/// ring, 163 nodes all told.
const STANDARD_NODES: &[(usize, usize, NodeKind)] = &[
    // 0-3
    (12, 1, O), (20, 1, O), (28, 1, O), (36, 1, O),
    // 4-6
    (16, 2, J), (24, 2, J), (32, 2, J),
    // 7-12
    (14, 3, R), (18, 3, R), (22, 3, R), (26, 3, R), (30, 3, R), (34, 3, R),
    // 13-16
    (12, 4, J), (20, 4, J), (28, 4, J), (36, 4, J),
    // 17-25
    (8, 5, O), (12, 5, R), (16, 5, H), (20, 5, R), (24, 5, H), (28, 5, R), (32, 5, H), (36, 5, R), (40, 5, O),
    // 26-29
    (12, 6, J), (20, 6, J), (28, 6, J), (36, 6, J),
    // 30-37
    (10, 7, R), (14, 7, R), (18, 7, R), (22, 7, R), (26, 7, R), (30, 7, R), (34, 7, R), (38, 7, R),
    // 38-42
    (8, 8, J), (16, 8, J), (24, 8, J), (32, 8, J), (40, 8, J),
    // 43-53
    (4, 9, O), (8, 9, R), (12, 9, H), (16, 9, R), (20, 9, H), (24, 9, R), (28, 9, H), (32, 9, R), (36, 9, H), (40, 9, R), (44, 9, O),
    // 54-58
    (8, 10, J), (16, 10, J), (24, 10, J), (32, 10, J), (40, 10, J),
    // 59-68
    (6, 11, R), (10, 11, R), (14, 11, R), (18, 11, R), (22, 11, R), (26, 11, R), (30, 11, R), (34, 11, R), (38, 11, R), (42, 11, R),
    // 69-74
    (4, 12, J), (12, 12, J), (20, 12, J), (28, 12, J), (36, 12, J), (44, 12, J),
    // 75-87
    (0, 13, O), (4, 13, R), (8, 13, H), (12, 13, R), (16, 13, H), (20, 13, R), (24, 13, H), (28, 13, R), (32, 13, H), (36, 13, R), (40, 13, H), (44, 13, R), (48, 13, O),
    // 88-93
    (4, 14, J), (12, 14, J), (20, 14, J), (28, 14, J), (36, 14, J), (44, 14, J),
    // 94-103
    (6, 15, R), (10, 15, R), (14, 15, R), (18, 15, R), (22, 15, R), (26, 15, R), (30, 15, R), (34, 15, R), (38, 15, R), (42, 15, R),
    // 104-108
    (8, 16, J), (16, 16, J), (24, 16, J), (32, 16, J), (40, 16, J),
    // 109-119
    (4, 17, O), (8, 17, R), (12, 17, H), (16, 17, R), (20, 17, H), (24, 17, R), (28, 17, H), (32, 17, R), (36, 17, H), (40, 17, R), (44, 17, O),
    // 120-124
    (8, 18, J), (16, 18, J), (24, 18, J), (32, 18, J), (40, 18, J),
    // 125-132
    (10, 19, R), (14, 19, R), (18, 19, R), (22, 19, R), (26, 19, R), (30, 19, R), (34, 19, R), (38, 19, R),
    // 133-136
    (12, 20, J), (20, 20, J), (28, 20, J), (36, 20, J),
    // 137-145
    (8, 21, O), (12, 21, R), (16, 21, H), (20, 21, R), (24, 21, H), (28, 21, R), (32, 21, H), (36, 21, R), (40, 21, O),
    // 146-149
    (12, 22, J), (20, 22, J), (28, 22, J), (36, 22, J),
    // 150-155
    (14, 23, R), (18, 23, R), (22, 23, R), (26, 23, R), (30, 23, R), (34, 23, R),
    // 156-158
    (16, 24, J), (24, 24, J), (32, 24, J),
    // 159-162
    (12, 25, O), (20, 25, O), (28, 25, O), (36, 25, O),
];

const STANDARD_PORTS: &[(usize, usize, Orientation)] = &[
    (4, 13, Orientation::Clock2Clock8),
    (5, 15, Orientation::Clock4Clock10),
    (29, 42, Orientation::Clock4Clock10),
    (38, 54, Orientation::Clock12Clock6),
    (74, 93, Orientation::Clock12Clock6),
    (104, 120, Orientation::Clock12Clock6),
    (124, 136, Orientation::Clock2Clock8),
    (146, 156, Orientation::Clock4Clock10),
    (148, 157, Orientation::Clock2Clock8),
];

/// Three hexes in a triangle: 13 junctions, 15 road slots, 4 ports.
const TRIPLE_NODES: &[(usize, usize, NodeKind)] = &[
    // 0-1
    (16, 2, J), (24, 2, J),
    // 2-5
    (14, 3, R), (18, 3, R), (22, 3, R), (26, 3, R),
    // 6-8
    (12, 4, J), (20, 4, J), (28, 4, J),
    // 9-13
    (12, 5, R), (16, 5, H), (20, 5, R), (24, 5, H), (28, 5, R),
    // 14-16
    (12, 6, J), (20, 6, J), (28, 6, J),
    // 17-20
    (14, 7, R), (18, 7, R), (22, 7, R), (26, 7, R),
    // 21-22
    (16, 8, J), (24, 8, J),
    // 23-25
    (16, 9, R), (20, 9, H), (24, 9, R),
    // 26-27
    (16, 10, J), (24, 10, J),
    // 28-29
    (18, 11, R), (22, 11, R),
    // 30
    (20, 12, J),
];

const TRIPLE_PORTS: &[(usize, usize, Orientation)] = &[
    (0, 7, Orientation::Clock4Clock10),
    (1, 8, Orientation::Clock4Clock10),
    (6, 14, Orientation::Clock12Clock6),
    (27, 30, Orientation::Clock2Clock8),
];

/// Two hexes for one player: a desert for the robber and a single brick
/// hex. 10 junctions, 11 road slots, 2 ports.
const SINGLE_NODES: &[(usize, usize, NodeKind)] = &[
    // 0
    (16, 2, J),
    // 1-2
    (14, 3, R), (18, 3, R),
    // 3-4
    (12, 4, J), (20, 4, J),
    // 5-7
    (12, 5, R), (16, 5, H), (20, 5, R),
    // 8-9
    (12, 6, J), (20, 6, J),
    // 10-12
    (14, 7, R), (18, 7, R), (22, 7, R),
    // 13-14
    (16, 8, J), (24, 8, J),
    // 15-17
    (16, 9, R), (20, 9, H), (24, 9, R),
    // 18-19
    (16, 10, J), (24, 10, J),
    // 20-21
    (18, 11, R), (22, 11, R),
    // 22
    (20, 12, J),
];

const SINGLE_PORTS: &[(usize, usize, Orientation)] = &[
    (0, 4, Orientation::Clock4Clock10),
    (19, 22, Orientation::Clock2Clock8),
];

pub fn standard_board() -> BoardGraph {
    build_board(STANDARD_NODES, STANDARD_PORTS)
}

/// The standard layout with every port site removed.
pub fn portless_board() -> BoardGraph {
    build_board(STANDARD_NODES, &[])
}

pub fn triple_board() -> BoardGraph {
    build_board(TRIPLE_NODES, TRIPLE_PORTS)
}

pub fn single_board() -> BoardGraph {
    build_board(SINGLE_NODES, SINGLE_PORTS)
}

fn classic_costs() -> BTreeMap<Building, ResourceCounts> {
    let mut costs = BTreeMap::new();
    costs.insert(Building::City, ResourceCounts::with_amounts(0, 3, 0, 2, 0));
    costs.insert(
        Building::DevelopmentCard,
        ResourceCounts::with_amounts(0, 1, 1, 1, 0),
    );
    costs.insert(Building::Road, ResourceCounts::with_amounts(1, 0, 0, 0, 1));
    costs.insert(
        Building::Settlement,
        ResourceCounts::with_amounts(1, 0, 1, 1, 1),
    );
    costs
}

fn classic_development_cards() -> BTreeMap<DevelopmentCard, usize> {
    let mut counts = BTreeMap::new();
    counts.insert(DevelopmentCard::Knight, 14);
    counts.insert(DevelopmentCard::Monopoly, 2);
    counts.insert(DevelopmentCard::RoadBuilding, 2);
    counts.insert(DevelopmentCard::VictoryPoint, 5);
    counts.insert(DevelopmentCard::YearOfPlenty, 2);
    counts
}

fn development_card_limit() -> BTreeMap<Building, usize> {
    let mut counts = BTreeMap::new();
    counts.insert(Building::DevelopmentCard, 25);
    counts
}

fn per_player_counts(cities: usize, roads: usize, settlements: usize) -> BTreeMap<Building, usize> {
    let mut counts = BTreeMap::new();
    counts.insert(Building::City, cities);
    counts.insert(Building::Road, roads);
    counts.insert(Building::Settlement, settlements);
    counts
}

/// Rules for the standard board: 2-5 players, 8-12 victory points.
pub fn standard_rules() -> RulesConfig {
    RulesConfig::new(
        2,
        5,
        8,
        12,
        classic_costs(),
        development_card_limit(),
        per_player_counts(4, 15, 5),
        classic_development_cards(),
        vec![
            (HexResource::Yielding(Resource::Brick), 3),
            (HexResource::Yielding(Resource::Ore), 3),
            (HexResource::Yielding(Resource::Sheep), 4),
            (HexResource::Yielding(Resource::Wheat), 4),
            (HexResource::Yielding(Resource::Wood), 4),
            (HexResource::Desert, 1),
        ],
        vec![2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12],
        vec![
            PortProfile::any(3),
            PortProfile::only(Resource::Wheat, 2),
            PortProfile::only(Resource::Ore, 2),
            PortProfile::any(3),
            PortProfile::any(3),
            PortProfile::only(Resource::Sheep, 2),
            PortProfile::any(3),
            PortProfile::only(Resource::Brick, 2),
            PortProfile::only(Resource::Wood, 2),
        ],
    )
}

/// Rules for the triple board: up to 3 players, 3-6 victory points.
pub fn triple_rules() -> RulesConfig {
    RulesConfig::new(
        1,
        3,
        3,
        6,
        classic_costs(),
        development_card_limit(),
        per_player_counts(3, 10, 4),
        classic_development_cards(),
        vec![
            (HexResource::Yielding(Resource::Brick), 1),
            (HexResource::Yielding(Resource::Wood), 1),
            (HexResource::Desert, 1),
        ],
        vec![6, 9],
        vec![
            PortProfile::only(Resource::Brick, 2),
            PortProfile::only(Resource::Wood, 2),
            PortProfile::only(Resource::Wheat, 2),
            PortProfile::any(3),
        ],
    )
}

/// Rules for the single board: 1-2 players, 3-6 victory points.
pub fn single_rules() -> RulesConfig {
    RulesConfig::new(
        1,
        2,
        3,
        6,
        classic_costs(),
        development_card_limit(),
        per_player_counts(2, 6, 2),
        classic_development_cards(),
        vec![
            (HexResource::Yielding(Resource::Brick), 1),
            (HexResource::Desert, 1),
        ],
        vec![6],
        vec![PortProfile::any(3), PortProfile::only(Resource::Wheat, 2)],
    )
}

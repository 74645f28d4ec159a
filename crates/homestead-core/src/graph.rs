//! Immutable board topology.
//!
//! A board is a graph of nodes laid out on a character-grid coordinate
//! system: hexes, the junctions at their corners, the road slots between
//! junctions, and ocean filler around the edge. Adjacency is directional
//! (six clock positions) and fixed at construction; everything mutable about
//! a game lives in the [`crate::board`] overlay instead.
//!
//! Ports are pairs of junctions. A pair is only a valid port if the two
//! junctions sit on the same short coastline, which the grid expresses as:
//! walking the same direction twice from one junction (through the road slot
//! between them) lands on the other.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Index of a node within its [`BoardGraph`].
pub type NodeIndex = usize;

/// What a topology node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Hex,
    Ocean,
    Junction,
    Road,
    /// A hex that has not been revealed yet (expansion scenarios).
    UnflippedHex,
}

/// One of the six directions around a hex, named by clock position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    Clock12,
    Clock2,
    Clock4,
    Clock6,
    Clock8,
    Clock10,
}

impl Direction {
    /// All six directions, in clockwise order from the top.
    pub const ALL: [Direction; 6] = [
        Direction::Clock12,
        Direction::Clock2,
        Direction::Clock4,
        Direction::Clock6,
        Direction::Clock8,
        Direction::Clock10,
    ];

    /// Slot used for the per-node neighbor table.
    pub(crate) fn index(self) -> usize {
        match self {
            Direction::Clock12 => 0,
            Direction::Clock2 => 1,
            Direction::Clock4 => 2,
            Direction::Clock6 => 3,
            Direction::Clock8 => 4,
            Direction::Clock10 => 5,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Clock12 => Direction::Clock6,
            Direction::Clock2 => Direction::Clock8,
            Direction::Clock4 => Direction::Clock10,
            Direction::Clock6 => Direction::Clock12,
            Direction::Clock8 => Direction::Clock2,
            Direction::Clock10 => Direction::Clock4,
        }
    }

    /// The axis this direction lies on.
    pub fn orientation(self) -> Orientation {
        match self {
            Direction::Clock12 | Direction::Clock6 => Orientation::Clock12Clock6,
            Direction::Clock2 | Direction::Clock8 => Orientation::Clock2Clock8,
            Direction::Clock4 | Direction::Clock10 => Orientation::Clock4Clock10,
        }
    }
}

/// An axis through a hex: a pair of opposite directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Clock12Clock6,
    Clock2Clock8,
    Clock4Clock10,
}

impl Orientation {
    /// The two directions on this axis.
    pub fn directions(self) -> [Direction; 2] {
        match self {
            Orientation::Clock12Clock6 => [Direction::Clock12, Direction::Clock6],
            Orientation::Clock2Clock8 => [Direction::Clock2, Direction::Clock8],
            Orientation::Clock4Clock10 => [Direction::Clock4, Direction::Clock10],
        }
    }
}

/// A topology node. Identity is the index; coordinates are the grid cell it
/// was declared at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub index: NodeIndex,
    pub x: usize,
    pub y: usize,
    pub kind: NodeKind,
}

/// A port: a favorable exchange anchored on a pair of junctions.
///
/// Which resources it trades and at what rate is game-variant data resolved
/// during board assembly; the topology only knows the sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub index: usize,
    pub junctions: (NodeIndex, NodeIndex),
    pub orientation: Orientation,
}

impl Port {
    pub fn contains(&self, node: NodeIndex) -> bool {
        self.junctions.0 == node || self.junctions.1 == node
    }

    /// The other junction of the pair.
    pub fn partner(&self, node: NodeIndex) -> Option<NodeIndex> {
        if self.junctions.0 == node {
            Some(self.junctions.1)
        } else if self.junctions.1 == node {
            Some(self.junctions.0)
        } else {
            None
        }
    }
}

/// Declaration of a node: grid position and kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub x: usize,
    pub y: usize,
    pub kind: NodeKind,
}

/// Declaration of a directed adjacency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub from: NodeIndex,
    pub to: NodeIndex,
    pub direction: Direction,
}

/// Declaration of a port site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    pub a: NodeIndex,
    pub b: NodeIndex,
    pub orientation: Orientation,
}

/// Why a graph could not be constructed.
///
/// Construction failures reject the whole graph; no partial topology is ever
/// returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("edge or port references unknown node {0}")]
    UnknownNode(NodeIndex),
    #[error("node {index} already has a neighbor at {direction:?}")]
    DuplicateNeighbor {
        index: NodeIndex,
        direction: Direction,
    },
    #[error("port references non-junction node {0}")]
    PortNotJunction(NodeIndex),
    #[error("node {0} is claimed by more than one port")]
    PortNodeReused(NodeIndex),
    #[error("junctions {a} and {b} are not connected as a port pair")]
    PortNotConnected { a: NodeIndex, b: NodeIndex },
}

/// Immutable topology: nodes, directional adjacency and port sites.
///
/// Constructed once per board layout and shared read-only across every game
/// played on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardGraph {
    width: usize,
    height: usize,
    nodes: Vec<Node>,
    /// Per-node neighbor table, slotted by `Direction::index`.
    neighbors: Vec<[Option<NodeIndex>; 6]>,
    ports: Vec<Port>,
    /// Per-node port membership, parallel to `nodes`.
    port_by_node: Vec<Option<usize>>,
}

impl BoardGraph {
    /// Build a graph from declarations.
    ///
    /// Fails if an edge references an unknown node or doubles up a
    /// direction, or if a port references a non-junction, reuses a node, or
    /// names a junction pair that is not connected by a same-direction
    /// double hop.
    pub fn new(
        width: usize,
        height: usize,
        node_specs: &[NodeSpec],
        edge_specs: &[EdgeSpec],
        port_specs: &[PortSpec],
    ) -> Result<BoardGraph, GraphError> {
        let nodes: Vec<Node> = node_specs
            .iter()
            .enumerate()
            .map(|(index, spec)| Node {
                index,
                x: spec.x,
                y: spec.y,
                kind: spec.kind,
            })
            .collect();

        let mut graph = BoardGraph {
            width,
            height,
            neighbors: vec![[None; 6]; nodes.len()],
            port_by_node: vec![None; nodes.len()],
            nodes,
            ports: Vec::with_capacity(port_specs.len()),
        };

        for edge in edge_specs {
            if edge.from >= graph.nodes.len() || edge.to >= graph.nodes.len() {
                return Err(GraphError::UnknownNode(edge.from.max(edge.to)));
            }
            let slot = &mut graph.neighbors[edge.from][edge.direction.index()];
            if slot.is_some() {
                return Err(GraphError::DuplicateNeighbor {
                    index: edge.from,
                    direction: edge.direction,
                });
            }
            *slot = Some(edge.to);
        }

        for (port_index, spec) in port_specs.iter().enumerate() {
            for node in [spec.a, spec.b] {
                let kind = graph
                    .node(node)
                    .ok_or(GraphError::UnknownNode(node))?
                    .kind;
                if kind != NodeKind::Junction {
                    return Err(GraphError::PortNotJunction(node));
                }
            }
            if spec.a == spec.b {
                return Err(GraphError::PortNodeReused(spec.a));
            }
            if !graph.junctions_can_make_port(spec.a, spec.b, spec.orientation) {
                return Err(GraphError::PortNotConnected {
                    a: spec.a,
                    b: spec.b,
                });
            }
            for node in [spec.a, spec.b] {
                if graph.port_by_node[node].is_some() {
                    return Err(GraphError::PortNodeReused(node));
                }
                graph.port_by_node[node] = Some(port_index);
            }
            graph.ports.push(Port {
                index: port_index,
                junctions: (spec.a, spec.b),
                orientation: spec.orientation,
            });
        }

        Ok(graph)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Positional lookup.
    pub fn node_at(&self, x: usize, y: usize) -> Option<&Node> {
        self.nodes.iter().find(|n| n.x == x && n.y == y)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn kind(&self, index: NodeIndex) -> Option<NodeKind> {
        self.node(index).map(|n| n.kind)
    }

    pub fn has_neighbor(&self, index: NodeIndex, direction: Direction) -> bool {
        self.neighbor(index, direction).is_some()
    }

    /// O(1) directional neighbor lookup.
    pub fn neighbor(&self, index: NodeIndex, direction: Direction) -> Option<NodeIndex> {
        self.neighbors.get(index)?[direction.index()]
    }

    /// All neighbors of a node, in direction order.
    pub fn neighbors(&self, index: NodeIndex) -> Vec<NodeIndex> {
        Direction::ALL
            .into_iter()
            .filter_map(|d| self.neighbor(index, d))
            .collect()
    }

    fn kind_neighbors(&self, index: NodeIndex, kind: NodeKind) -> Vec<NodeIndex> {
        self.neighbors(index)
            .into_iter()
            .filter(|&n| self.kind(n) == Some(kind))
            .collect()
    }

    /// Junctions adjacent to a node (a hex's corners, or a road's ends).
    pub fn junction_neighbors(&self, index: NodeIndex) -> Vec<NodeIndex> {
        self.kind_neighbors(index, NodeKind::Junction)
    }

    /// Road slots adjacent to a junction.
    pub fn road_neighbors(&self, index: NodeIndex) -> Vec<NodeIndex> {
        self.kind_neighbors(index, NodeKind::Road)
    }

    /// Hexes adjacent to a junction.
    pub fn hex_neighbors(&self, index: NodeIndex) -> Vec<NodeIndex> {
        self.kind_neighbors(index, NodeKind::Hex)
    }

    /// Junctions one road away from a junction.
    pub fn adjacent_junctions(&self, junction: NodeIndex) -> Vec<NodeIndex> {
        let mut found = Vec::new();
        for road in self.road_neighbors(junction) {
            for other in self.junction_neighbors(road) {
                if other != junction && !found.contains(&other) {
                    found.push(other);
                }
            }
        }
        found
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    /// Port by port index.
    pub fn port(&self, port_index: usize) -> Option<&Port> {
        self.ports.get(port_index)
    }

    /// The port whose pair includes this node, if any.
    pub fn port_at(&self, node: NodeIndex) -> Option<&Port> {
        self.port_by_node
            .get(node)
            .copied()
            .flatten()
            .and_then(|i| self.port(i))
    }

    /// Two junctions form a port pair when walking the same direction twice
    /// from one (through the road slot between them) reaches the other.
    fn junctions_can_make_port(
        &self,
        a: NodeIndex,
        b: NodeIndex,
        orientation: Orientation,
    ) -> bool {
        for direction in orientation.directions() {
            let Some(between) = self.neighbor(a, direction) else {
                continue;
            };
            if self.neighbor(between, direction) == Some(b) {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn junction(x: usize, y: usize) -> NodeSpec {
        NodeSpec {
            x,
            y,
            kind: NodeKind::Junction,
        }
    }

    fn road(x: usize, y: usize) -> NodeSpec {
        NodeSpec {
            x,
            y,
            kind: NodeKind::Road,
        }
    }

    fn edge(from: NodeIndex, to: NodeIndex, direction: Direction) -> EdgeSpec {
        EdgeSpec {
            from,
            to,
            direction,
        }
    }

    /// junction(0) - road(1) - junction(2) along the Clock2/Clock8 axis.
    fn strip() -> (Vec<NodeSpec>, Vec<EdgeSpec>) {
        let nodes = vec![junction(0, 1), road(2, 0), junction(4, 1)];
        let edges = vec![
            edge(0, 1, Direction::Clock2),
            edge(1, 0, Direction::Clock8),
            edge(1, 2, Direction::Clock2),
            edge(2, 1, Direction::Clock8),
        ];
        (nodes, edges)
    }

    #[test]
    fn test_empty_graph() {
        let graph = BoardGraph::new(0, 0, &[], &[], &[]).unwrap();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.port_count(), 0);
    }

    #[test]
    fn test_neighbors() {
        let (nodes, edges) = strip();
        let graph = BoardGraph::new(6, 2, &nodes, &edges, &[]).unwrap();
        assert_eq!(graph.neighbor(0, Direction::Clock2), Some(1));
        assert_eq!(graph.neighbor(0, Direction::Clock8), None);
        assert!(graph.has_neighbor(1, Direction::Clock8));
        assert_eq!(graph.junction_neighbors(1), vec![2, 0]);
        assert_eq!(graph.adjacent_junctions(0), vec![2]);
        assert_eq!(graph.node_at(4, 1).map(|n| n.index), Some(2));
    }

    #[test]
    fn test_unknown_edge_node_rejected() {
        let (nodes, mut edges) = strip();
        edges.push(edge(0, 9, Direction::Clock4));
        assert_eq!(
            BoardGraph::new(6, 2, &nodes, &edges, &[]),
            Err(GraphError::UnknownNode(9))
        );
    }

    #[test]
    fn test_duplicate_direction_rejected() {
        let (nodes, mut edges) = strip();
        edges.push(edge(0, 2, Direction::Clock2));
        assert_eq!(
            BoardGraph::new(6, 2, &nodes, &edges, &[]),
            Err(GraphError::DuplicateNeighbor {
                index: 0,
                direction: Direction::Clock2,
            })
        );
    }

    #[test]
    fn test_port_pair_accepted() {
        let (nodes, edges) = strip();
        let ports = [PortSpec {
            a: 0,
            b: 2,
            orientation: Orientation::Clock2Clock8,
        }];
        let graph = BoardGraph::new(6, 2, &nodes, &edges, &ports).unwrap();
        assert_eq!(graph.port_count(), 1);
        assert_eq!(graph.port_at(0).unwrap().partner(0), Some(2));
        assert_eq!(graph.port_at(2).unwrap().index, 0);
        assert!(graph.port_at(1).is_none());
    }

    #[test]
    fn test_port_on_road_rejected() {
        let (nodes, edges) = strip();
        let ports = [PortSpec {
            a: 0,
            b: 1,
            orientation: Orientation::Clock2Clock8,
        }];
        assert_eq!(
            BoardGraph::new(6, 2, &nodes, &edges, &ports),
            Err(GraphError::PortNotJunction(1))
        );
    }

    #[test]
    fn test_port_self_pair_rejected() {
        let (nodes, edges) = strip();
        let ports = [PortSpec {
            a: 0,
            b: 0,
            orientation: Orientation::Clock2Clock8,
        }];
        assert_eq!(
            BoardGraph::new(6, 2, &nodes, &edges, &ports),
            Err(GraphError::PortNodeReused(0))
        );
    }

    #[test]
    fn test_unconnected_port_rejected() {
        // Same junctions, but the claimed axis does not reach across.
        let (nodes, edges) = strip();
        let ports = [PortSpec {
            a: 0,
            b: 2,
            orientation: Orientation::Clock12Clock6,
        }];
        assert_eq!(
            BoardGraph::new(6, 2, &nodes, &edges, &ports),
            Err(GraphError::PortNotConnected { a: 0, b: 2 })
        );
    }

    #[test]
    fn test_direction_opposites() {
        for direction in Direction::ALL {
            assert_eq!(direction.opposite().opposite(), direction);
            assert_eq!(
                direction.orientation(),
                direction.opposite().orientation()
            );
        }
    }
}

//! Mutable per-game board state.
//!
//! This module contains:
//! - The cell overlay laid over a [`BoardGraph`]: one [`CellState`] per hex,
//!   junction and road node
//! - Board assembly from a rules config's resource/roll/port draws
//! - The robber's position
//! - The longest-road search
//!
//! Ocean and unflipped-hex nodes carry no cell; they exist only in the
//! topology.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::config::PortProfile;
use crate::graph::{BoardGraph, NodeIndex, NodeKind};
use crate::player::PlayerIndex;
use crate::resources::{HexResource, Resource};

/// Why a game could not be assembled.
///
/// All of these are fatal to the construction attempt only; nothing of the
/// partially-built game is retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InitError {
    #[error("parameters outside the config's player/victory-point bounds")]
    InvalidParameters,
    #[error("hex resource list exhausted before node {0}")]
    ExhaustedResources(NodeIndex),
    #[error("roll number list exhausted before node {0}")]
    ExhaustedRolls(NodeIndex),
    #[error("no port profile for port {0}")]
    MissingPortProfile(usize),
    #[error("both nodes {0} and {1} drew the desert")]
    MultipleDeserts(NodeIndex, NodeIndex),
    #[error("no desert was drawn, so the robber has no home")]
    NoDesert,
}

/// A hex: its resource and the roll number that makes it pay out.
///
/// The desert hex has no roll number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexCell {
    pub resource: HexResource,
    pub roll_number: Option<u32>,
}

/// A junction: settlement site, possibly fronting a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JunctionCell {
    pub has_settlement: bool,
    pub has_city: bool,
    pub is_settleable: bool,
    /// Resources this junction's port trades; empty when portless.
    pub port_resources: Vec<Resource>,
    /// Exchange rate granted by the port; the default bank rate when
    /// portless.
    pub port_rate: u32,
    pub owner: Option<PlayerIndex>,
}

/// A road slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadCell {
    pub owner: Option<PlayerIndex>,
}

/// Per-node game state, keyed by the same index space as the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    Hex(HexCell),
    Junction(JunctionCell),
    Road(RoadCell),
}

/// The mutable overlay for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardState {
    /// Parallel to the graph's nodes; `None` for ocean/unflipped nodes.
    cells: Vec<Option<CellState>>,
    robber: NodeIndex,
}

impl BoardState {
    /// Lay the overlay over a graph.
    ///
    /// Walks graph nodes in index order: hexes consume the resource list
    /// (and, unless desert, the roll list); junctions resolve their port;
    /// roads start unowned. The single desert hex becomes the robber's
    /// home.
    pub(crate) fn assemble(
        graph: &BoardGraph,
        resources: Vec<HexResource>,
        rolls: Vec<u32>,
        ports: Vec<PortProfile>,
        default_bank_rate: u32,
    ) -> Result<BoardState, InitError> {
        let mut cells: Vec<Option<CellState>> = Vec::with_capacity(graph.node_count());
        let mut resources = resources.into_iter();
        let mut rolls = rolls.into_iter();
        let mut robber = None;

        for node in graph.nodes() {
            let cell = match node.kind {
                NodeKind::Hex => {
                    let resource = resources
                        .next()
                        .ok_or(InitError::ExhaustedResources(node.index))?;
                    let roll_number = if resource.is_desert() {
                        if let Some(previous) = robber {
                            return Err(InitError::MultipleDeserts(previous, node.index));
                        }
                        robber = Some(node.index);
                        None
                    } else {
                        Some(rolls.next().ok_or(InitError::ExhaustedRolls(node.index))?)
                    };
                    Some(CellState::Hex(HexCell {
                        resource,
                        roll_number,
                    }))
                }
                NodeKind::Junction => {
                    let (port_resources, port_rate) = match graph.port_at(node.index) {
                        Some(port) => {
                            let profile = ports
                                .get(port.index)
                                .ok_or(InitError::MissingPortProfile(port.index))?;
                            (profile.resources.clone(), profile.rate)
                        }
                        None => (Vec::new(), default_bank_rate),
                    };
                    Some(CellState::Junction(JunctionCell {
                        has_settlement: false,
                        has_city: false,
                        is_settleable: true,
                        port_resources,
                        port_rate,
                        owner: None,
                    }))
                }
                NodeKind::Road => Some(CellState::Road(RoadCell { owner: None })),
                NodeKind::Ocean | NodeKind::UnflippedHex => None,
            };
            cells.push(cell);
        }

        let robber = robber.ok_or(InitError::NoDesert)?;
        debug!(
            "assembled board: {} cells, robber on hex {}",
            cells.iter().filter(|c| c.is_some()).count(),
            robber
        );
        Ok(BoardState { cells, robber })
    }

    pub fn cell(&self, index: NodeIndex) -> Option<&CellState> {
        self.cells.get(index).and_then(|c| c.as_ref())
    }

    pub fn hex(&self, index: NodeIndex) -> Option<&HexCell> {
        match self.cell(index) {
            Some(CellState::Hex(hex)) => Some(hex),
            _ => None,
        }
    }

    pub fn junction(&self, index: NodeIndex) -> Option<&JunctionCell> {
        match self.cell(index) {
            Some(CellState::Junction(junction)) => Some(junction),
            _ => None,
        }
    }

    pub fn road(&self, index: NodeIndex) -> Option<&RoadCell> {
        match self.cell(index) {
            Some(CellState::Road(road)) => Some(road),
            _ => None,
        }
    }

    pub(crate) fn junction_mut(&mut self, index: NodeIndex) -> Option<&mut JunctionCell> {
        match self.cells.get_mut(index).and_then(|c| c.as_mut()) {
            Some(CellState::Junction(junction)) => Some(junction),
            _ => None,
        }
    }

    pub(crate) fn road_mut(&mut self, index: NodeIndex) -> Option<&mut RoadCell> {
        match self.cells.get_mut(index).and_then(|c| c.as_mut()) {
            Some(CellState::Road(road)) => Some(road),
            _ => None,
        }
    }

    /// All hexes, in node-index order.
    pub fn hexes(&self) -> impl Iterator<Item = (NodeIndex, &HexCell)> {
        self.cells.iter().enumerate().filter_map(|(i, c)| match c {
            Some(CellState::Hex(hex)) => Some((i, hex)),
            _ => None,
        })
    }

    /// All junctions, in node-index order.
    pub fn junctions(&self) -> impl Iterator<Item = (NodeIndex, &JunctionCell)> {
        self.cells.iter().enumerate().filter_map(|(i, c)| match c {
            Some(CellState::Junction(junction)) => Some((i, junction)),
            _ => None,
        })
    }

    /// All roads, in node-index order.
    pub fn roads(&self) -> impl Iterator<Item = (NodeIndex, &RoadCell)> {
        self.cells.iter().enumerate().filter_map(|(i, c)| match c {
            Some(CellState::Road(road)) => Some((i, road)),
            _ => None,
        })
    }

    /// The hex the robber is on.
    pub fn robber_hex(&self) -> NodeIndex {
        self.robber
    }

    pub(crate) fn move_robber(&mut self, hex: NodeIndex) {
        debug_assert!(self.hex(hex).is_some());
        self.robber = hex;
    }

    /// Put a settlement on a junction for a player.
    ///
    /// The junction and every junction one road away become unsettleable.
    pub(crate) fn place_settlement(
        &mut self,
        graph: &BoardGraph,
        junction: NodeIndex,
        owner: PlayerIndex,
    ) {
        let cell = self.junction_mut(junction).expect("settling a junction");
        cell.owner = Some(owner);
        cell.has_settlement = true;
        cell.is_settleable = false;
        for neighbor in graph.adjacent_junctions(junction) {
            if let Some(cell) = self.junction_mut(neighbor) {
                cell.is_settleable = false;
            }
        }
    }

    /// Upgrade a settlement to a city. The settlement flag stays set.
    pub(crate) fn place_city(&mut self, junction: NodeIndex) {
        let cell = self.junction_mut(junction).expect("upgrading a junction");
        debug_assert!(cell.has_settlement);
        cell.has_city = true;
    }

    /// Claim a road slot for a player.
    pub(crate) fn place_road(&mut self, road: NodeIndex, owner: PlayerIndex) {
        let cell = self.road_mut(road).expect("claiming a road");
        debug_assert!(cell.owner.is_none());
        cell.owner = Some(owner);
    }

    /// May this player's road network pass through a junction?
    ///
    /// A rival settlement severs the path; an unowned or own junction does
    /// not.
    pub(crate) fn can_pass_through(&self, junction: NodeIndex, player: PlayerIndex) -> bool {
        match self.junction(junction) {
            Some(cell) => cell.owner.map_or(true, |owner| owner == player),
            None => false,
        }
    }

    /// Length of the player's longest simple road path.
    ///
    /// Depth-first search with backtracking, started from each owned road;
    /// a path may branch at junctions the player can pass through but never
    /// reuses a road segment.
    pub fn longest_road(&self, graph: &BoardGraph, player: PlayerIndex) -> usize {
        self.roads()
            .filter(|(_, road)| road.owner == Some(player))
            .map(|(index, _)| self.longest_path_from(graph, index, None, player, HashSet::new()))
            .max()
            .unwrap_or(0)
    }

    fn longest_path_from(
        &self,
        graph: &BoardGraph,
        origin: NodeIndex,
        last_junction: Option<NodeIndex>,
        player: PlayerIndex,
        mut visited: HashSet<NodeIndex>,
    ) -> usize {
        visited.insert(origin);
        let mut best = visited.len();
        for junction in graph.junction_neighbors(origin) {
            if Some(junction) == last_junction {
                continue; // no backtracking
            }
            if !self.can_pass_through(junction, player) {
                continue;
            }
            for road in graph.road_neighbors(junction) {
                if visited.contains(&road) {
                    continue;
                }
                if self.road(road).map(|r| r.owner) != Some(Some(player)) {
                    continue;
                }
                let length =
                    self.longest_path_from(graph, road, Some(junction), player, visited.clone());
                best = best.max(length);
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::config::IterationType;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn standard_board() -> (BoardGraph, BoardState) {
        let graph = catalog::standard_board();
        let rules = catalog::standard_rules();
        let mut rng = StdRng::seed_from_u64(0);
        let board = BoardState::assemble(
            &graph,
            rules.hex_resources(IterationType::Fixed, &mut rng),
            rules.roll_numbers(IterationType::Fixed, &mut rng),
            rules.port_assignments(IterationType::Fixed, &mut rng),
            rules.default_bank_rate(),
        )
        .unwrap();
        (graph, board)
    }

    #[test]
    fn test_assemble_standard() {
        let (_, board) = standard_board();
        assert_eq!(board.hexes().count(), 19);
        assert_eq!(board.junctions().count(), 54);
        assert_eq!(board.roads().count(), 72);
        // Desert is declared last, so the last hex in walk order hosts the
        // robber.
        assert_eq!(board.robber_hex(), 143);
        assert_eq!(board.hex(143).unwrap().resource, HexResource::Desert);
        assert_eq!(board.hex(143).unwrap().roll_number, None);
        assert_eq!(
            board.hex(19).unwrap().resource,
            HexResource::Yielding(Resource::Brick)
        );
        assert_eq!(board.hex(19).unwrap().roll_number, Some(2));
        assert_eq!(board.hex(141).unwrap().roll_number, Some(12));
    }

    #[test]
    fn test_assemble_resolves_ports() {
        let (_, board) = standard_board();
        // Junction 4 fronts the first port (3:1 any); junction 5 the second
        // (2:1 wheat); junction 6 is portless.
        let j4 = board.junction(4).unwrap();
        assert_eq!(j4.port_rate, 3);
        assert_eq!(j4.port_resources.len(), 5);
        let j5 = board.junction(5).unwrap();
        assert_eq!(j5.port_rate, 2);
        assert_eq!(j5.port_resources, vec![Resource::Wheat]);
        let j6 = board.junction(6).unwrap();
        assert_eq!(j6.port_rate, 4);
        assert!(j6.port_resources.is_empty());
    }

    #[test]
    fn test_assemble_requires_a_desert() {
        let graph = catalog::standard_board();
        let rules = catalog::standard_rules();
        let mut rng = StdRng::seed_from_u64(0);
        let mut resources = rules.hex_resources(IterationType::Fixed, &mut rng);
        let last = resources.len() - 1;
        resources[last] = HexResource::Yielding(Resource::Wood);
        let result = BoardState::assemble(
            &graph,
            resources,
            vec![2; 19],
            rules.port_assignments(IterationType::Fixed, &mut rng),
            rules.default_bank_rate(),
        );
        assert_eq!(result, Err(InitError::NoDesert));
    }

    #[test]
    fn test_assemble_rejects_second_desert() {
        let graph = catalog::standard_board();
        let rules = catalog::standard_rules();
        let mut rng = StdRng::seed_from_u64(0);
        let mut resources = rules.hex_resources(IterationType::Fixed, &mut rng);
        resources[0] = HexResource::Desert;
        let result = BoardState::assemble(
            &graph,
            resources,
            rules.roll_numbers(IterationType::Fixed, &mut rng),
            rules.port_assignments(IterationType::Fixed, &mut rng),
            rules.default_bank_rate(),
        );
        assert_eq!(result, Err(InitError::MultipleDeserts(19, 143)));
    }

    #[test]
    fn test_assemble_fails_on_short_lists() {
        let graph = catalog::standard_board();
        let rules = catalog::standard_rules();
        let mut rng = StdRng::seed_from_u64(0);
        let result = BoardState::assemble(
            &graph,
            vec![HexResource::Desert],
            Vec::new(),
            rules.port_assignments(IterationType::Fixed, &mut rng),
            rules.default_bank_rate(),
        );
        assert_eq!(result, Err(InitError::ExhaustedResources(21)));

        let result = BoardState::assemble(
            &graph,
            rules.hex_resources(IterationType::Fixed, &mut rng),
            Vec::new(),
            rules.port_assignments(IterationType::Fixed, &mut rng),
            rules.default_bank_rate(),
        );
        assert_eq!(result, Err(InitError::ExhaustedRolls(19)));
    }

    #[test]
    fn test_settlement_blocks_neighbors() {
        let (graph, mut board) = standard_board();
        board.place_settlement(&graph, 4, 0);
        assert!(!board.junction(4).unwrap().is_settleable);
        assert_eq!(board.junction(4).unwrap().owner, Some(0));
        // Junctions one road away from 4.
        assert!(!board.junction(13).unwrap().is_settleable);
        assert!(!board.junction(14).unwrap().is_settleable);
        // Two roads away is fine.
        assert!(board.junction(26).unwrap().is_settleable);
    }

    #[test]
    fn test_longest_road_line_and_fork() {
        let (graph, mut board) = standard_board();
        assert_eq!(board.longest_road(&graph, 0), 0);

        // Roads 7 and 18 share junction 13: a two-segment line.
        board.place_road(7, 0);
        assert_eq!(board.longest_road(&graph, 0), 1);
        board.place_road(18, 0);
        assert_eq!(board.longest_road(&graph, 0), 2);

        // A disconnected road elsewhere does not join up.
        board.place_road(80, 0);
        assert_eq!(board.longest_road(&graph, 0), 2);

        // Extend through junction 26, then fork there.
        board.place_road(30, 0);
        assert_eq!(board.longest_road(&graph, 0), 3);
        board.place_road(31, 0);
        assert_eq!(board.longest_road(&graph, 0), 3);
    }

    #[test]
    fn test_longest_road_severed_by_rival_settlement() {
        let (graph, mut board) = standard_board();
        board.place_road(7, 0);
        board.place_road(18, 0);
        assert_eq!(board.longest_road(&graph, 0), 2);
        // A rival settles on the shared junction.
        board.place_settlement(&graph, 13, 1);
        assert_eq!(board.longest_road(&graph, 0), 1);
        // The player's own settlement would not sever it.
        let mut own = board.clone();
        own.junction_mut(13).unwrap().owner = Some(0);
        assert_eq!(own.longest_road(&graph, 0), 2);
    }
}

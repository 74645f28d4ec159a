//! Per-player state: economy, assets, development cards, phase.
//!
//! This module contains:
//! - The per-player phase machine (`Phase`)
//! - Development cards and the bought/playable/played bookkeeping
//! - Bank exchange rates accumulated from settled ports
//! - `available_actions`, the single source of truth for what a player may
//!   legally do right now

use serde::{Deserialize, Serialize};

use crate::actions::{Action, ActionKind};
use crate::board::BoardState;
use crate::config::Building;
use crate::game::GameEngine;
use crate::graph::{BoardGraph, NodeIndex};
use crate::resources::{Resource, ResourceCounts};

/// Seat number within a game; stable for the game's lifetime.
pub type PlayerIndex = usize;

/// Opaque external identifier assigned at game start (a registrar's
/// account id, say). The engine never interprets it.
pub type PlayerId = u64;

/// Where a player stands in the turn state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    AfterBuildingFreeSettlement,
    AfterMovingRobber,
    AfterRollingSeven,
    ChooseInitialResources,
    GameOver,
    Root,
    WaitForTradeResponses,
    WaitForTurn,
}

/// Development card types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DevelopmentCard {
    /// Move the robber and maybe steal; counts toward Largest Army.
    Knight,
    /// Collect every copy of one resource from all rivals.
    Monopoly,
    /// Build two roads for free.
    RoadBuilding,
    /// One victory point, hidden until played.
    VictoryPoint,
    /// Take any two resources from the bank.
    YearOfPlenty,
}

impl DevelopmentCard {
    pub const ALL: [DevelopmentCard; 5] = [
        DevelopmentCard::Knight,
        DevelopmentCard::Monopoly,
        DevelopmentCard::RoadBuilding,
        DevelopmentCard::VictoryPoint,
        DevelopmentCard::YearOfPlenty,
    ];

    /// Stable numeric id, used by typed action arguments.
    pub fn id(self) -> usize {
        match self {
            DevelopmentCard::Knight => 0,
            DevelopmentCard::Monopoly => 1,
            DevelopmentCard::RoadBuilding => 2,
            DevelopmentCard::VictoryPoint => 3,
            DevelopmentCard::YearOfPlenty => 4,
        }
    }

    /// Inverse of [`DevelopmentCard::id`]; `None` outside the enum.
    pub fn from_id(id: usize) -> Option<DevelopmentCard> {
        DevelopmentCard::ALL.get(id).copied()
    }
}

/// Victory points, public and private.
///
/// Private includes unplayed victory-point cards; the game is decided on
/// private totals, the table only sees public ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VictoryPoints {
    pub public: u32,
    pub private: u32,
}

/// One seat's complete state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Opaque external identity.
    pub id: PlayerId,
    /// Seat order, also the index into the engine's player list.
    pub index: PlayerIndex,
    pub resources: ResourceCounts,
    /// Junctions holding this player's cities (also in `settlements`).
    pub cities: Vec<NodeIndex>,
    pub roads: Vec<NodeIndex>,
    /// Junctions holding this player's settlements, cities included.
    pub settlements: Vec<NodeIndex>,
    pub played_development_cards: Vec<DevelopmentCard>,
    pub playable_development_cards: Vec<DevelopmentCard>,
    /// Cards bought this turn; promoted to playable at end of turn.
    pub unplayable_development_cards: Vec<DevelopmentCard>,
    pub victory_points: VictoryPoints,
    /// Knights played, for Largest Army.
    pub army_size: usize,
    /// Most recent longest-road computation for this player.
    pub longest_road_length: usize,
    pub phase: Phase,
    /// Cards still owed to the bank after a seven.
    pub num_to_discard: u32,
    pub can_accept_trade: bool,
    pub has_declined_trade: bool,
    pub num_trades_offered_this_turn: usize,
    /// Per-resource bank exchange rates; improves as ports are settled.
    pub bank_rates: ResourceCounts,
}

impl Player {
    pub(crate) fn new(id: PlayerId, index: PlayerIndex, default_bank_rate: u32) -> Self {
        Self {
            id,
            index,
            resources: ResourceCounts::new(),
            cities: Vec::new(),
            roads: Vec::new(),
            settlements: Vec::new(),
            played_development_cards: Vec::new(),
            playable_development_cards: Vec::new(),
            unplayable_development_cards: Vec::new(),
            victory_points: VictoryPoints::default(),
            army_size: 0,
            longest_road_length: 0,
            phase: Phase::WaitForTurn,
            num_to_discard: 0,
            can_accept_trade: false,
            has_declined_trade: false,
            num_trades_offered_this_turn: 0,
            bank_rates: ResourceCounts::uniform(default_bank_rate),
        }
    }

    /// Total cards in hand.
    pub fn num_resources(&self) -> u32 {
        self.resources.total()
    }

    pub fn can_afford(&self, cost: &ResourceCounts) -> bool {
        self.resources.can_afford(cost)
    }

    /// Bank exchange rate for one resource.
    pub fn bank_rate(&self, resource: Resource) -> u32 {
        self.bank_rates.get(resource)
    }

    /// Fold a settled port into the rate table.
    pub(crate) fn absorb_port(&mut self, port_resources: &[Resource], rate: u32) {
        for &resource in port_resources {
            let current = self.bank_rates.get(resource);
            self.bank_rates.set(resource, current.min(rate));
        }
    }

    pub fn has_playable(&self, card: DevelopmentCard) -> bool {
        self.playable_development_cards.contains(&card)
    }

    /// Receive a freshly bought card; unplayable until the turn ends.
    pub(crate) fn gain_card(&mut self, card: DevelopmentCard) {
        self.unplayable_development_cards.push(card);
    }

    /// Move one playable card to the played pile.
    ///
    /// Playing a card that is not in the playable pile is an engine defect.
    pub(crate) fn use_card(&mut self, card: DevelopmentCard) {
        let position = self
            .playable_development_cards
            .iter()
            .position(|c| *c == card)
            .unwrap_or_else(|| panic!("player {} playing unheld {:?}", self.index, card));
        self.playable_development_cards.remove(position);
        self.played_development_cards.push(card);
    }

    /// Per-turn housekeeping when any turn ends.
    pub(crate) fn reset_for_new_turn(&mut self) {
        self.playable_development_cards
            .append(&mut self.unplayable_development_cards);
        self.num_trades_offered_this_turn = 0;
        self.has_declined_trade = false;
    }

    /// Unowned road slots this player could legally claim right now:
    /// slots touching an owned settlement, plus slots reachable from an
    /// owned road through a junction no rival has settled.
    pub(crate) fn reachable_roads(&self, graph: &BoardGraph, board: &BoardState) -> Vec<NodeIndex> {
        let mut found = Vec::new();
        for &junction in &self.settlements {
            for road in graph.road_neighbors(junction) {
                if board.road(road).map_or(false, |r| r.owner.is_none()) && !found.contains(&road) {
                    found.push(road);
                }
            }
        }
        for &road in &self.roads {
            for next in self.roads_adjacent_through(graph, board, road) {
                if !found.contains(&next) {
                    found.push(next);
                }
            }
        }
        found.sort_unstable();
        found
    }

    /// Unowned road slots sharing a passable junction with `road`.
    pub(crate) fn roads_adjacent_through(
        &self,
        graph: &BoardGraph,
        board: &BoardState,
        road: NodeIndex,
    ) -> Vec<NodeIndex> {
        let mut found = Vec::new();
        for junction in graph.junction_neighbors(road) {
            if !board.can_pass_through(junction, self.index) {
                continue;
            }
            for next in graph.road_neighbors(junction) {
                if next == road {
                    continue;
                }
                if board.road(next).map_or(false, |r| r.owner.is_none()) && !found.contains(&next) {
                    found.push(next);
                }
            }
        }
        found
    }

    /// Ordered road pairs legal for a road-building play. The second road
    /// may become reachable only once the first is down.
    pub(crate) fn doubly_reachable_roads(
        &self,
        graph: &BoardGraph,
        board: &BoardState,
    ) -> Vec<(NodeIndex, NodeIndex)> {
        let reachable = self.reachable_roads(graph, board);
        let mut pairs = Vec::new();
        for &first in &reachable {
            for &second in &reachable {
                if first != second {
                    pairs.push((first, second));
                }
            }
            for second in self.roads_adjacent_through(graph, board, first) {
                if !reachable.contains(&second) {
                    pairs.push((first, second));
                }
            }
        }
        pairs
    }

    /// Every action this player may legally submit right now.
    ///
    /// This is the legality oracle: `GameEngine::execute` re-derives it and
    /// rejects any action kind not listed here. Trade offers, bank trades
    /// and discards appear as bare marker actions because their argument
    /// spaces are not enumerable; their arguments are validated at
    /// execution.
    pub fn available_actions(&self, engine: &GameEngine) -> Vec<Action> {
        if engine.is_game_over() {
            return Vec::new();
        }
        let graph = engine.graph();
        let board = engine.board();

        match self.phase {
            Phase::GameOver => Vec::new(),

            Phase::AfterBuildingFreeSettlement => self
                .reachable_roads(graph, board)
                .into_iter()
                .map(|road| Action::build(Building::Road, road))
                .collect(),

            Phase::AfterRollingSeven => {
                if self.num_to_discard > 0 {
                    vec![Action::bare(ActionKind::Discard)]
                } else if engine.should_wait_for_discard() {
                    Vec::new() // others still owe cards
                } else {
                    board
                        .hexes()
                        .filter(|&(hex, _)| hex != board.robber_hex())
                        .map(|(hex, _)| Action::move_robber(hex))
                        .collect()
                }
            }

            Phase::AfterMovingRobber => {
                let mut actions = Vec::new();
                if engine.can_steal() {
                    for victim in engine.steal_victims(self.index) {
                        actions.push(Action::steal(victim));
                    }
                }
                actions.push(Action::to_root());
                actions
            }

            Phase::ChooseInitialResources => self
                .settlements
                .iter()
                .map(|&junction| Action::choose_initial_resources(junction))
                .collect(),

            Phase::Root => {
                if engine.is_first_round() || engine.is_second_round() {
                    board
                        .junctions()
                        .filter(|(_, cell)| cell.is_settleable)
                        .map(|(junction, _)| Action::build(Building::Settlement, junction))
                        .collect()
                } else if !engine.has_rolled() {
                    let mut actions = vec![Action::roll_dice()];
                    actions.extend(self.play_card_actions(engine, false));
                    actions
                } else {
                    let mut actions = vec![
                        Action::end_turn(),
                        Action::bare(ActionKind::OfferTrade),
                        Action::bare(ActionKind::TradeWithBank),
                    ];
                    actions.extend(self.build_actions(engine));
                    actions.extend(self.play_card_actions(engine, true));
                    actions
                }
            }

            Phase::WaitForTradeResponses => {
                let mut actions = vec![Action::cancel_trade()];
                if !engine.can_anyone_accept_trade() {
                    actions.push(Action::fail_trade());
                }
                actions
            }

            Phase::WaitForTurn => {
                if self.num_to_discard > 0 {
                    return vec![Action::bare(ActionKind::Discard)];
                }
                if let Some(trade) = engine.current_trade() {
                    if trade.offered_to.contains(&self.index)
                        && !self.has_declined_trade
                        && self.can_afford(&trade.take)
                    {
                        return vec![Action::accept_trade(), Action::decline_trade()];
                    }
                }
                if engine.current_player_index() == self.index {
                    vec![Action::to_root()]
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn build_actions(&self, engine: &GameEngine) -> Vec<Action> {
        let graph = engine.graph();
        let board = engine.board();
        let rules = engine.config();
        let mut actions = Vec::new();

        if let Some(cost) = rules.cost(Building::City) {
            if self.can_afford(cost)
                && self.under_build_limits(engine, Building::City, self.cities.len())
            {
                for &junction in &self.settlements {
                    let cell = board.junction(junction).expect("settled junction");
                    if !cell.has_city {
                        actions.push(Action::build(Building::City, junction));
                    }
                }
            }
        }

        if let Some(cost) = rules.cost(Building::DevelopmentCard) {
            let held = self.played_development_cards.len()
                + self.playable_development_cards.len()
                + self.unplayable_development_cards.len();
            if self.can_afford(cost)
                && engine.deck_len() > 0
                && self.under_build_limits(engine, Building::DevelopmentCard, held)
            {
                actions.push(Action::build_development_card());
            }
        }

        if let Some(cost) = rules.cost(Building::Road) {
            if self.can_afford(cost)
                && self.under_build_limits(engine, Building::Road, self.roads.len())
            {
                for road in self.reachable_roads(graph, board) {
                    actions.push(Action::build(Building::Road, road));
                }
            }
        }

        if let Some(cost) = rules.cost(Building::Settlement) {
            let standing = self.settlements.len() - self.cities.len();
            if self.can_afford(cost)
                && self.under_build_limits(engine, Building::Settlement, standing)
            {
                let mut seen = Vec::new();
                for &road in &self.roads {
                    for junction in graph.junction_neighbors(road) {
                        let cell = board.junction(junction).expect("road ends on junctions");
                        if cell.is_settleable && !seen.contains(&junction) {
                            seen.push(junction);
                            actions.push(Action::build(Building::Settlement, junction));
                        }
                    }
                }
            }
        }

        actions
    }

    /// Both the per-player and the game-wide limit admit one more build.
    fn under_build_limits(&self, engine: &GameEngine, building: Building, held: usize) -> bool {
        let rules = engine.config();
        if let Some(limit) = rules.max_count_per_player(building) {
            if held >= limit {
                return false;
            }
        }
        if let Some(limit) = rules.max_count(building) {
            if engine.num_built(building) >= limit {
                return false;
            }
        }
        true
    }

    fn play_card_actions(&self, engine: &GameEngine, after_roll: bool) -> Vec<Action> {
        let graph = engine.graph();
        let board = engine.board();
        let mut kinds: Vec<DevelopmentCard> = Vec::new();
        for &card in &self.playable_development_cards {
            if !kinds.contains(&card) {
                kinds.push(card);
            }
        }

        let mut actions = Vec::new();
        for card in kinds {
            // Only a victory point may be revealed before the roll.
            if !after_roll && card != DevelopmentCard::VictoryPoint {
                continue;
            }
            match card {
                DevelopmentCard::Knight => {
                    for (hex, _) in board.hexes() {
                        if hex != board.robber_hex() {
                            actions.push(Action::play_knight(hex));
                        }
                    }
                }
                DevelopmentCard::Monopoly => {
                    for resource in Resource::ALL {
                        actions.push(Action::play_monopoly(resource));
                    }
                }
                DevelopmentCard::RoadBuilding => {
                    let rules = engine.config();
                    let within_limit = rules
                        .max_count_per_player(Building::Road)
                        .map_or(true, |limit| self.roads.len() + 2 <= limit);
                    if within_limit {
                        for (first, second) in self.doubly_reachable_roads(graph, board) {
                            actions.push(Action::play_road_building(first, second));
                        }
                    }
                }
                DevelopmentCard::VictoryPoint => {
                    actions.push(Action::play_victory_point());
                }
                DevelopmentCard::YearOfPlenty => {
                    for first in Resource::ALL {
                        for second in Resource::ALL {
                            actions.push(Action::play_year_of_plenty(first, second));
                        }
                    }
                }
            }
        }
        actions
    }
}

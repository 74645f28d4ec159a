//! The game engine: turn orchestration, action validation and execution.
//!
//! A [`GameEngine`] owns one game: the board overlay, the players, the
//! development-card deck and the turn counters. Everything mutates through
//! [`GameEngine::execute`], which validates a submitted [`Action`] against
//! the acting player's currently-available actions before applying it.
//!
//! The engine is single-threaded and synchronous: one `execute` call fully
//! completes before the next may be issued, and the caller serializes access
//! per game. The shared topology and rules config are read-only `Arc`s, so
//! many games may share them without synchronization.

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::actions::{
    Action, ActionArgument, ActionError, ActionKind, ActionPayload, ActionResult, Trade,
};
use crate::board::{BoardState, InitError};
use crate::config::{Building, Parameters, RulesConfig};
use crate::graph::{BoardGraph, NodeIndex};
use crate::player::{DevelopmentCard, Phase, Player, PlayerId, PlayerIndex};
use crate::resources::{Resource, ResourceCounts};

/// A player must have strictly more played knights than this (and than
/// every rival) to hold the Largest Army bonus.
pub const LARGEST_ARMY_THRESHOLD: usize = 2;

/// A player's longest road must strictly exceed this (and every rival's)
/// to hold the Longest Road bonus.
pub const LONGEST_ROAD_THRESHOLD: usize = 4;

/// Victory points granted by either bonus.
const BONUS_VICTORY_POINTS: u32 = 2;

const DICE_MIN_TOTAL: u32 = 2;
const DICE_MAX_TOTAL: u32 = 12;

/// One running game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEngine {
    graph: Arc<BoardGraph>,
    config: Arc<RulesConfig>,
    board: BoardState,
    players: Vec<Player>,
    /// Remaining development cards; drawn from the back.
    deck: Vec<DevelopmentCard>,
    victory_points_goal: u32,
    current_player_index: PlayerIndex,
    /// Monotonic turn counter; `turn / player_count` is the round.
    turn: usize,
    /// Last dice total; 0 until the first roll.
    dice_total: u32,
    has_rolled: bool,
    can_steal: bool,
    current_trade: Option<Trade>,
    has_largest_army: Option<PlayerIndex>,
    has_longest_road: Option<PlayerIndex>,
    buildings_built: BTreeMap<Building, usize>,
}

impl GameEngine {
    /// Set up a new game.
    ///
    /// Draws the development deck and the resource/roll/port lists per the
    /// parameters' iteration types, assembles the board, and seats
    /// `player_count` players with seat 0 ready to act. Fails without
    /// retaining any partial state.
    pub fn initialize<R: Rng>(
        config: Arc<RulesConfig>,
        graph: Arc<BoardGraph>,
        parameters: &Parameters,
        rng: &mut R,
    ) -> Result<GameEngine, InitError> {
        if !config.is_valid(parameters) {
            return Err(InitError::InvalidParameters);
        }
        let resources = config.hex_resources(parameters.resource_iteration, rng);
        let rolls = config.roll_numbers(parameters.roll_iteration, rng);
        let ports = config.port_assignments(parameters.port_iteration, rng);
        let deck = config.development_card_deck(parameters.card_iteration, rng);
        let board = BoardState::assemble(&graph, resources, rolls, ports, config.default_bank_rate())?;

        let mut players: Vec<Player> = (0..parameters.player_count)
            .map(|index| Player::new(index as PlayerId, index, config.default_bank_rate()))
            .collect();
        players[0].phase = Phase::Root;

        debug!(
            "initialized game: {} players, goal {}",
            parameters.player_count, parameters.victory_points_goal
        );
        Ok(GameEngine {
            graph,
            config,
            board,
            players,
            deck,
            victory_points_goal: parameters.victory_points_goal,
            current_player_index: 0,
            turn: 0,
            dice_total: 0,
            has_rolled: false,
            can_steal: false,
            current_trade: None,
            has_largest_army: None,
            has_longest_road: None,
            buildings_built: BTreeMap::new(),
        })
    }

    /// Attach external identities to the seats. Seat order is unchanged.
    pub fn set_player_ids(&mut self, ids: &[PlayerId]) {
        assert_eq!(ids.len(), self.players.len(), "one id per seat");
        for (player, &id) in self.players.iter_mut().zip(ids) {
            player.id = id;
        }
    }

    // ==================== Read accessors ====================

    pub fn graph(&self) -> &BoardGraph {
        &self.graph
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, index: PlayerIndex) -> Option<&Player> {
        self.players.get(index)
    }

    pub fn current_player_index(&self) -> PlayerIndex {
        self.current_player_index
    }

    pub fn current_player(&self) -> &Player {
        &self.players[self.current_player_index]
    }

    pub fn turn(&self) -> usize {
        self.turn
    }

    /// Completed cycles through the seats; draft rounds are 0 and 1.
    pub fn round(&self) -> usize {
        self.turn / self.players.len()
    }

    pub fn is_first_round(&self) -> bool {
        self.round() == 0
    }

    pub fn is_second_round(&self) -> bool {
        self.round() == 1
    }

    pub fn has_rolled(&self) -> bool {
        self.has_rolled
    }

    pub fn can_steal(&self) -> bool {
        self.can_steal
    }

    /// Last dice total; 0 until the first roll of the game.
    pub fn dice_total(&self) -> u32 {
        self.dice_total
    }

    pub fn is_roll_seven(&self) -> bool {
        self.dice_total == 7
    }

    /// Someone still owes cards to the bank after a seven.
    pub fn should_wait_for_discard(&self) -> bool {
        self.players.iter().any(|p| p.num_to_discard > 0)
    }

    pub fn has_current_trade(&self) -> bool {
        self.current_trade.is_some()
    }

    pub fn should_wait_for_trade(&self) -> bool {
        self.current_trade.is_some()
    }

    pub fn current_trade(&self) -> Option<&Trade> {
        self.current_trade.as_ref()
    }

    /// Trades the current player has offered this turn.
    pub fn num_trades_offered_this_turn(&self) -> usize {
        self.current_player().num_trades_offered_this_turn
    }

    pub fn robber_hex(&self) -> NodeIndex {
        self.board.robber_hex()
    }

    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    pub fn victory_points_goal(&self) -> u32 {
        self.victory_points_goal
    }

    /// The first seat whose private victory points meet the goal.
    pub fn winner(&self) -> Option<PlayerIndex> {
        self.players
            .iter()
            .find(|p| p.victory_points.private >= self.victory_points_goal)
            .map(|p| p.index)
    }

    pub fn is_game_over(&self) -> bool {
        self.winner().is_some()
    }

    pub fn largest_army_holder(&self) -> Option<PlayerIndex> {
        self.has_largest_army
    }

    /// The bonus holder's army size, or the threshold when unheld.
    pub fn largest_army(&self) -> usize {
        self.has_largest_army
            .map(|i| self.players[i].army_size)
            .unwrap_or(LARGEST_ARMY_THRESHOLD)
    }

    pub fn longest_road_holder(&self) -> Option<PlayerIndex> {
        self.has_longest_road
    }

    /// The bonus holder's road length, or the threshold when unheld.
    pub fn longest_road(&self) -> usize {
        self.has_longest_road
            .map(|i| self.players[i].longest_road_length)
            .unwrap_or(LONGEST_ROAD_THRESHOLD)
    }

    /// How many of a building have been built game-wide.
    pub fn num_built(&self, building: Building) -> usize {
        self.buildings_built.get(&building).copied().unwrap_or(0)
    }

    /// Seats the current robber hex can steal from, excluding `me`.
    pub fn steal_victims(&self, me: PlayerIndex) -> Vec<PlayerIndex> {
        let mut victims = Vec::new();
        for junction in self.graph.junction_neighbors(self.board.robber_hex()) {
            if let Some(cell) = self.board.junction(junction) {
                if let Some(owner) = cell.owner {
                    if owner != me && !victims.contains(&owner) {
                        victims.push(owner);
                    }
                }
            }
        }
        victims.sort_unstable();
        victims
    }

    /// Any addressed player could still accept the active trade.
    pub fn can_anyone_accept_trade(&self) -> bool {
        match &self.current_trade {
            None => false,
            Some(trade) => trade.offered_to.iter().any(|&index| {
                let player = &self.players[index];
                !player.has_declined_trade && player.can_afford(&trade.take)
            }),
        }
    }

    /// Every action `player` may legally submit right now.
    pub fn available_actions(&self, player: PlayerIndex) -> Vec<Action> {
        match self.players.get(player) {
            Some(p) => p.available_actions(self),
            None => Vec::new(),
        }
    }

    // ==================== Snapshots ====================

    /// Serialize the full engine state. `decode(encode(g)) == g`.
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("engine state serializes")
    }

    /// Rebuild an engine from [`GameEngine::snapshot`] output.
    pub fn from_snapshot(value: serde_json::Value) -> Result<GameEngine, serde_json::Error> {
        serde_json::from_value(value)
    }

    // ==================== Execution ====================

    /// Validate and apply one action.
    ///
    /// Rejections leave the engine untouched; replaying a rejected action
    /// yields the same rejection.
    pub fn execute<R: Rng>(
        &mut self,
        player: PlayerIndex,
        action: &Action,
        rng: &mut R,
    ) -> ActionResult {
        if player >= self.players.len() {
            return Err(ActionError::InvalidPlayerId);
        }
        let allowed_kinds: Vec<ActionKind> = self
            .available_actions(player)
            .iter()
            .map(|a| a.kind)
            .collect();
        if !allowed_kinds.contains(&action.kind) {
            debug!("player {player} may not {:?} now", action.kind);
            return Err(ActionError::InvalidEdgeChoice);
        }

        match action.kind {
            ActionKind::Build => self.execute_build(player, action),
            ActionKind::RollDice => self.execute_roll_dice(player, action, rng),
            ActionKind::ChooseInitialResources => {
                self.execute_choose_initial_resources(player, action)
            }
            ActionKind::EndTurn => {
                expect_no_args(action)?;
                self.execute_end_turn(player)
            }
            ActionKind::ToRoot => {
                expect_no_args(action)?;
                self.execute_to_root(player)
            }
            ActionKind::MoveRobber => self.execute_move_robber(player, action),
            ActionKind::Steal => self.execute_steal(player, action, rng),
            ActionKind::Discard => self.execute_discard(player, action),
            ActionKind::OfferTrade => self.execute_offer_trade(player, action),
            ActionKind::AcceptTrade => {
                expect_no_args(action)?;
                self.execute_accept_trade(player)
            }
            ActionKind::DeclineTrade => {
                expect_no_args(action)?;
                self.execute_decline_trade(player)
            }
            ActionKind::CancelTrade | ActionKind::FailTrade => {
                expect_no_args(action)?;
                self.clear_trade();
                Ok(ActionPayload::None)
            }
            ActionKind::TradeWithBank => self.execute_trade_with_bank(player, action),
            ActionKind::PlayKnight => self.execute_play_knight(player, action),
            ActionKind::PlayMonopoly => self.execute_play_monopoly(player, action),
            ActionKind::PlayRoadBuilding => self.execute_play_road_building(player, action),
            ActionKind::PlayVictoryPoint => {
                expect_no_args(action)?;
                self.execute_play_victory_point(player)
            }
            ActionKind::PlayYearOfPlenty => self.execute_play_year_of_plenty(player, action),
        }
    }

    // ==================== Turn flow ====================

    fn execute_end_turn(&mut self, player: PlayerIndex) -> ActionResult {
        self.players[player].phase = Phase::WaitForTurn;
        self.increment_turn();
        Ok(ActionPayload::None)
    }

    fn execute_to_root(&mut self, player: PlayerIndex) -> ActionResult {
        self.players[player].phase = Phase::Root;
        self.can_steal = false;
        Ok(ActionPayload::None)
    }

    /// Advance the turn counter and pick the next seat.
    ///
    /// The draft snakes: seats go 0..n-1, then n-1..0, then normal rotation
    /// resumes at seat 0. The boundary turns (n and 2n) keep the same seat
    /// so the snake's ends take two consecutive turns.
    fn increment_turn(&mut self) {
        self.turn += 1;
        let n = self.players.len();
        if self.turn == n || self.turn == 2 * n {
            // seat keeps the turn at the snake's turning points
        } else if self.is_second_round() {
            self.current_player_index -= 1;
        } else {
            self.current_player_index = (self.current_player_index + 1) % n;
        }
        self.has_rolled = false;
        self.can_steal = false;
        for player in &mut self.players {
            player.reset_for_new_turn();
        }
    }

    fn execute_roll_dice<R: Rng>(
        &mut self,
        player: PlayerIndex,
        action: &Action,
        rng: &mut R,
    ) -> ActionResult {
        let total = match action.args.as_slice() {
            [] => rng.gen_range(1..=6) + rng.gen_range(1..=6),
            [ActionArgument::DiceRoll(total)] => *total as u32,
            [_] => return Err(ActionError::InvalidArgumentType),
            _ => return Err(ActionError::InvalidNumberOfArgs),
        };
        if !(DICE_MIN_TOTAL..=DICE_MAX_TOTAL).contains(&total) {
            return Err(ActionError::DiceRollOutOfRange);
        }

        self.dice_total = total;
        self.has_rolled = true;

        if total == 7 {
            let threshold = self.config.discard_threshold();
            for p in &mut self.players {
                if p.num_resources() > threshold {
                    p.num_to_discard = p.num_resources() / 2;
                }
            }
            self.players[player].phase = Phase::AfterRollingSeven;
        } else {
            self.distribute_yield(total);
        }
        Ok(ActionPayload::Rolled(total))
    }

    /// Pay out every hex matching the roll: one per settlement, two per
    /// city, skipping the hex under the robber.
    fn distribute_yield(&mut self, total: u32) {
        let robber = self.board.robber_hex();
        let mut gains: Vec<(PlayerIndex, Resource, u32)> = Vec::new();
        for (hex, cell) in self.board.hexes() {
            if hex == robber || cell.roll_number != Some(total) {
                continue;
            }
            let Some(resource) = cell.resource.resource() else {
                continue;
            };
            for junction in self.graph.junction_neighbors(hex) {
                if let Some(site) = self.board.junction(junction) {
                    if let Some(owner) = site.owner {
                        let amount = if site.has_city { 2 } else { 1 };
                        gains.push((owner, resource, amount));
                    }
                }
            }
        }
        for (owner, resource, amount) in gains {
            self.players[owner].resources.add(resource, amount);
        }
    }

    fn execute_choose_initial_resources(
        &mut self,
        player: PlayerIndex,
        action: &Action,
    ) -> ActionResult {
        let junction = parse_node_arg(action)?;
        self.check_node_range(junction)?;
        if !self.players[player].settlements.contains(&junction) {
            return Err(ActionError::InvalidNodeId);
        }

        let mut bundle = ResourceCounts::new();
        for hex in self.graph.hex_neighbors(junction) {
            if let Some(cell) = self.board.hex(hex) {
                if let Some(resource) = cell.resource.resource() {
                    bundle.add(resource, 1);
                }
            }
        }
        self.players[player].resources.accrue(&bundle);
        self.players[player].phase = Phase::WaitForTurn;
        self.increment_turn();
        Ok(ActionPayload::None)
    }

    // ==================== Building ====================

    fn execute_build(&mut self, player: PlayerIndex, action: &Action) -> ActionResult {
        let Some(&first) = action.args.first() else {
            return Err(ActionError::InvalidNumberOfArgs);
        };
        let ActionArgument::BuildItemId(item) = first else {
            return Err(ActionError::InvalidArgumentType);
        };
        let building = Building::from_id(item).ok_or(ActionError::BuildingIdOutOfRange)?;
        if !self.build_allowed_in_phase(player, building) {
            return Err(ActionError::InvalidEdgeChoice);
        }

        if building == Building::DevelopmentCard {
            if action.args.len() != 1 {
                return Err(ActionError::InvalidNumberOfArgs);
            }
            return self.execute_build_development_card(player);
        }

        if action.args.len() != 2 {
            return Err(ActionError::InvalidNumberOfArgs);
        }
        let ActionArgument::NodeId(node) = action.args[1] else {
            return Err(ActionError::InvalidArgumentType);
        };
        self.check_node_range(node)?;

        match building {
            Building::Settlement => self.execute_build_settlement(player, node),
            Building::City => self.execute_build_city(player, node),
            Building::Road => self.execute_build_road(player, node),
            Building::DevelopmentCard => unreachable!("handled above"),
        }
    }

    /// Which build items the current phase admits at all.
    fn build_allowed_in_phase(&self, player: PlayerIndex, building: Building) -> bool {
        let in_draft = self.is_first_round() || self.is_second_round();
        match self.players[player].phase {
            Phase::Root if in_draft => building == Building::Settlement,
            Phase::Root => self.has_rolled,
            Phase::AfterBuildingFreeSettlement => building == Building::Road,
            _ => false,
        }
    }

    fn execute_build_settlement(&mut self, player: PlayerIndex, junction: NodeIndex) -> ActionResult {
        let free = self.is_first_round() || self.is_second_round();
        let Some(cell) = self.board.junction(junction) else {
            return Err(ActionError::InvalidNodeId);
        };
        if !cell.is_settleable {
            return Err(ActionError::JunctionNotSettleable);
        }
        let port = (!cell.port_resources.is_empty())
            .then(|| (cell.port_resources.clone(), cell.port_rate));

        if !free {
            let touches_own_road = self
                .graph
                .road_neighbors(junction)
                .into_iter()
                .any(|road| self.board.road(road).map(|r| r.owner) == Some(Some(player)));
            if !touches_own_road {
                return Err(ActionError::InvalidNodeId);
            }
        }

        {
            let p = &self.players[player];
            let standing = p.settlements.len() - p.cities.len();
            if !self.under_limits(Building::Settlement, standing) {
                return Err(ActionError::InvalidEdgeChoice);
            }
        }
        if !free {
            self.charge(player, Building::Settlement)?;
        }

        self.board.place_settlement(&self.graph, junction, player);
        let p = &mut self.players[player];
        p.settlements.push(junction);
        p.victory_points.public += 1;
        p.victory_points.private += 1;
        if let Some((resources, rate)) = port {
            p.absorb_port(&resources, rate);
        }
        p.phase = if free {
            Phase::AfterBuildingFreeSettlement
        } else {
            Phase::Root
        };
        self.record_built(Building::Settlement);

        // A new settlement can sever a rival's road through this junction.
        self.recalculate_longest_road();
        Ok(self.victory_payload().unwrap_or(ActionPayload::None))
    }

    fn execute_build_road(&mut self, player: PlayerIndex, road: NodeIndex) -> ActionResult {
        let first_round = self.is_first_round();
        let second_round = self.is_second_round();
        let free = first_round || second_round;

        let Some(cell) = self.board.road(road) else {
            return Err(ActionError::InvalidNodeId);
        };
        if cell.owner.is_some() {
            return Err(ActionError::InvalidNodeId);
        }
        if !self.players[player]
            .reachable_roads(&self.graph, &self.board)
            .contains(&road)
        {
            return Err(ActionError::InvalidNodeId);
        }
        if !self.under_limits(Building::Road, self.players[player].roads.len()) {
            return Err(ActionError::InvalidEdgeChoice);
        }
        if !free {
            self.charge(player, Building::Road)?;
        }

        self.board.place_road(road, player);
        self.players[player].roads.push(road);
        self.record_built(Building::Road);

        if first_round {
            self.players[player].phase = Phase::WaitForTurn;
            self.increment_turn();
        } else if second_round {
            self.players[player].phase = Phase::ChooseInitialResources;
        }

        self.recalculate_longest_road();
        Ok(self.victory_payload().unwrap_or(ActionPayload::None))
    }

    fn execute_build_city(&mut self, player: PlayerIndex, junction: NodeIndex) -> ActionResult {
        let Some(cell) = self.board.junction(junction) else {
            return Err(ActionError::InvalidNodeId);
        };
        if cell.owner != Some(player) || !cell.has_settlement || cell.has_city {
            return Err(ActionError::InvalidNodeId);
        }
        if !self.under_limits(Building::City, self.players[player].cities.len()) {
            return Err(ActionError::InvalidEdgeChoice);
        }
        self.charge(player, Building::City)?;

        self.board.place_city(junction);
        let p = &mut self.players[player];
        p.cities.push(junction);
        p.victory_points.public += 1;
        p.victory_points.private += 1;
        self.record_built(Building::City);
        Ok(self.victory_payload().unwrap_or(ActionPayload::None))
    }

    fn execute_build_development_card(&mut self, player: PlayerIndex) -> ActionResult {
        if self.deck.is_empty() {
            return Err(ActionError::InvalidEdgeChoice);
        }
        let held = {
            let p = &self.players[player];
            p.played_development_cards.len()
                + p.playable_development_cards.len()
                + p.unplayable_development_cards.len()
        };
        if !self.under_limits(Building::DevelopmentCard, held) {
            return Err(ActionError::InvalidEdgeChoice);
        }
        self.charge(player, Building::DevelopmentCard)?;

        let card = self.deck.pop().expect("deck checked non-empty");
        let p = &mut self.players[player];
        p.gain_card(card);
        if card == DevelopmentCard::VictoryPoint {
            // Private total rises on the draw; the table finds out when the
            // card is played.
            p.victory_points.private += 1;
        }
        self.record_built(Building::DevelopmentCard);
        Ok(self
            .victory_payload()
            .unwrap_or(ActionPayload::Drew(card)))
    }

    /// Both limits admit one more; `held` is the player's current count.
    fn under_limits(&self, building: Building, held: usize) -> bool {
        if let Some(limit) = self.config.max_count_per_player(building) {
            if held >= limit {
                return false;
            }
        }
        if let Some(limit) = self.config.max_count(building) {
            if self.num_built(building) >= limit {
                return false;
            }
        }
        true
    }

    /// Debit a building's cost, or reject with `CannotAfford`.
    fn charge(&mut self, player: PlayerIndex, building: Building) -> Result<(), ActionError> {
        let cost = *self
            .config
            .cost(building)
            .ok_or(ActionError::InvalidEdgeChoice)?;
        if !self.players[player].can_afford(&cost) {
            return Err(ActionError::CannotAfford);
        }
        self.players[player].resources.spend(&cost);
        Ok(())
    }

    fn record_built(&mut self, building: Building) {
        *self.buildings_built.entry(building).or_insert(0) += 1;
    }

    // ==================== Robber ====================

    /// Validate a robber destination and relocate it.
    ///
    /// `can_steal` becomes true iff a rival settlement or city touches the
    /// new hex.
    fn relocate_robber(&mut self, player: PlayerIndex, hex: NodeIndex) -> Result<(), ActionError> {
        if self.board.hex(hex).is_none() {
            return Err(ActionError::InvalidNodeId);
        }
        if hex == self.board.robber_hex() {
            return Err(ActionError::InvalidNodeId);
        }
        self.board.move_robber(hex);
        self.can_steal = !self.steal_victims(player).is_empty();
        Ok(())
    }

    fn execute_move_robber(&mut self, player: PlayerIndex, action: &Action) -> ActionResult {
        let hex = parse_node_arg(action)?;
        self.check_node_range(hex)?;
        self.relocate_robber(player, hex)?;
        self.players[player].phase = Phase::AfterMovingRobber;
        Ok(ActionPayload::None)
    }

    fn execute_steal<R: Rng>(
        &mut self,
        player: PlayerIndex,
        action: &Action,
        rng: &mut R,
    ) -> ActionResult {
        let victim = match action.args.as_slice() {
            [ActionArgument::PlayerId(victim)] => *victim,
            [_] => return Err(ActionError::InvalidArgumentType),
            _ => return Err(ActionError::InvalidNumberOfArgs),
        };
        if victim >= self.players.len()
            || victim == player
            || !self.steal_victims(player).contains(&victim)
            || self.players[victim].num_resources() == 0
        {
            return Err(ActionError::InvalidPlayerId);
        }

        let stolen = self.players[victim]
            .resources
            .choose_from(rng)
            .expect("victim hand checked non-empty");
        let card = ResourceCounts::single(stolen, 1);
        self.players[victim].resources.spend(&card);
        self.players[player].resources.accrue(&card);
        self.can_steal = false;
        Ok(ActionPayload::Stole(Some(stolen)))
    }

    // ==================== Discard ====================

    fn execute_discard(&mut self, player: PlayerIndex, action: &Action) -> ActionResult {
        let cards = parse_discard_args(action)?;
        let owed = self.players[player].num_to_discard;
        let total = cards.total();
        if total > owed {
            return Err(ActionError::StopFlexing);
        }
        if !self.players[player].can_afford(&cards) {
            return Err(ActionError::CannotAfford);
        }
        let p = &mut self.players[player];
        p.resources.spend(&cards);
        p.num_to_discard -= total;
        Ok(ActionPayload::None)
    }

    // ==================== Trades ====================

    fn execute_offer_trade(&mut self, player: PlayerIndex, action: &Action) -> ActionResult {
        let (offered_to, give, take) = parse_trade_args(action)?;
        if offered_to.is_empty() || give.is_empty() || take.is_empty() || give == take {
            return Err(ActionError::InvalidTrade);
        }
        for &target in &offered_to {
            if target >= self.players.len() || target == player {
                return Err(ActionError::InvalidTrade);
            }
        }
        if !self.players[player].can_afford(&give) {
            return Err(ActionError::CannotAfford);
        }
        if self.players[player].num_trades_offered_this_turn >= self.config.max_trades_per_turn() {
            return Err(ActionError::StopFlexing);
        }

        self.players[player].num_trades_offered_this_turn += 1;

        let acceptors: Vec<PlayerIndex> = offered_to
            .iter()
            .copied()
            .filter(|&target| self.players[target].can_afford(&take))
            .collect();
        if acceptors.is_empty() {
            // Offer counted, but there is nothing to wait for.
            debug!("trade offer by {player} has no possible acceptor");
            return Ok(ActionPayload::None);
        }

        for &target in &acceptors {
            self.players[target].can_accept_trade = true;
        }
        self.players[player].phase = Phase::WaitForTradeResponses;
        self.current_trade = Some(Trade {
            offerer: player,
            offered_to,
            give,
            take,
        });
        Ok(ActionPayload::None)
    }

    fn execute_accept_trade(&mut self, player: PlayerIndex) -> ActionResult {
        let trade = self
            .current_trade
            .clone()
            .expect("accept gated on an active trade");
        self.players[player].resources.spend(&trade.take);
        self.players[player].resources.accrue(&trade.give);
        self.players[trade.offerer].resources.spend(&trade.give);
        self.players[trade.offerer].resources.accrue(&trade.take);
        self.clear_trade();
        Ok(ActionPayload::None)
    }

    fn execute_decline_trade(&mut self, player: PlayerIndex) -> ActionResult {
        self.players[player].has_declined_trade = true;
        self.players[player].can_accept_trade = false;
        if !self.can_anyone_accept_trade() {
            // Nobody left to wait on; the offer fails.
            self.clear_trade();
        }
        Ok(ActionPayload::None)
    }

    /// Drop the active trade and reset every per-trade flag.
    fn clear_trade(&mut self) {
        if let Some(trade) = self.current_trade.take() {
            if self.players[trade.offerer].phase == Phase::WaitForTradeResponses {
                self.players[trade.offerer].phase = Phase::Root;
            }
        }
        for player in &mut self.players {
            player.can_accept_trade = false;
            player.has_declined_trade = false;
        }
    }

    fn execute_trade_with_bank(&mut self, player: PlayerIndex, action: &Action) -> ActionResult {
        let (offered_to, give, take) = parse_trade_args(action)?;
        if !offered_to.is_empty() || give.is_empty() || take.is_empty() {
            return Err(ActionError::InvalidTrade);
        }
        if !self.players[player].can_afford(&give) {
            return Err(ActionError::CannotAfford);
        }

        // Each given resource must be an exact multiple of its rate; the
        // combined purchasing power must match the request exactly.
        let mut purchasing_power = 0;
        for resource in Resource::ALL {
            let count = give.get(resource);
            if count == 0 {
                continue;
            }
            let rate = self.players[player].bank_rate(resource);
            if count % rate != 0 {
                return Err(ActionError::InvalidTrade);
            }
            purchasing_power += count / rate;
        }
        let requested = take.total();
        if purchasing_power > requested {
            return Err(ActionError::StopFlexing);
        }
        if purchasing_power < requested {
            return Err(ActionError::InvalidTrade);
        }

        let p = &mut self.players[player];
        p.resources.spend(&give);
        p.resources.accrue(&take);
        Ok(ActionPayload::None)
    }

    // ==================== Development cards ====================

    fn execute_play_knight(&mut self, player: PlayerIndex, action: &Action) -> ActionResult {
        let hex = parse_node_arg(action)?;
        self.check_node_range(hex)?;
        self.relocate_robber(player, hex)?;

        let p = &mut self.players[player];
        p.use_card(DevelopmentCard::Knight);
        p.army_size += 1;
        p.phase = Phase::AfterMovingRobber;

        self.recalculate_largest_army();
        Ok(self.victory_payload().unwrap_or(ActionPayload::None))
    }

    fn execute_play_monopoly(&mut self, player: PlayerIndex, action: &Action) -> ActionResult {
        let resource = match action.args.as_slice() {
            [ActionArgument::TakeResource(id)] => {
                Resource::from_id(*id).ok_or(ActionError::InvalidResourceType)?
            }
            [_] => return Err(ActionError::InvalidArgumentType),
            _ => return Err(ActionError::InvalidNumberOfArgs),
        };

        let mut collected = 0;
        for index in 0..self.players.len() {
            if index == player {
                continue;
            }
            let count = self.players[index].resources.get(resource);
            if count > 0 {
                self.players[index]
                    .resources
                    .spend(&ResourceCounts::single(resource, count));
                collected += count;
            }
        }
        self.players[player].resources.add(resource, collected);
        self.players[player].use_card(DevelopmentCard::Monopoly);
        Ok(ActionPayload::Monopolized(collected))
    }

    fn execute_play_road_building(&mut self, player: PlayerIndex, action: &Action) -> ActionResult {
        let (first, second) = match action.args.as_slice() {
            [ActionArgument::NodeId(first), ActionArgument::NodeId(second)] => (*first, *second),
            [_, _] => return Err(ActionError::InvalidArgumentType),
            _ => return Err(ActionError::InvalidNumberOfArgs),
        };
        self.check_node_range(first)?;
        self.check_node_range(second)?;

        let unowned = |engine: &Self, road: NodeIndex| {
            engine.board.road(road).map_or(false, |r| r.owner.is_none())
        };
        let p = &self.players[player];
        let reachable = p.reachable_roads(&self.graph, &self.board);
        if !unowned(self, first) || !reachable.contains(&first) {
            return Err(ActionError::InvalidNodeId);
        }
        let second_ok = second != first
            && unowned(self, second)
            && (reachable.contains(&second)
                || p.roads_adjacent_through(&self.graph, &self.board, first)
                    .contains(&second));
        if !second_ok {
            return Err(ActionError::InvalidNodeId);
        }
        let within_limit = self
            .config
            .max_count_per_player(Building::Road)
            .map_or(true, |limit| self.players[player].roads.len() + 2 <= limit);
        if !within_limit {
            return Err(ActionError::InvalidEdgeChoice);
        }

        for road in [first, second] {
            self.board.place_road(road, player);
            self.players[player].roads.push(road);
            self.record_built(Building::Road);
        }
        self.players[player].use_card(DevelopmentCard::RoadBuilding);
        self.recalculate_longest_road();
        Ok(self.victory_payload().unwrap_or(ActionPayload::None))
    }

    fn execute_play_victory_point(&mut self, player: PlayerIndex) -> ActionResult {
        let p = &mut self.players[player];
        p.use_card(DevelopmentCard::VictoryPoint);
        // Private was already counted when the card was drawn.
        p.victory_points.public += 1;
        Ok(self.victory_payload().unwrap_or(ActionPayload::None))
    }

    fn execute_play_year_of_plenty(&mut self, player: PlayerIndex, action: &Action) -> ActionResult {
        let (first, second) = match action.args.as_slice() {
            [ActionArgument::TakeResource(first), ActionArgument::TakeResource(second)] => {
                let first = Resource::from_id(*first).ok_or(ActionError::InvalidResourceType)?;
                let second = Resource::from_id(*second).ok_or(ActionError::InvalidResourceType)?;
                (first, second)
            }
            [_, _] => return Err(ActionError::InvalidArgumentType),
            _ => return Err(ActionError::InvalidNumberOfArgs),
        };
        let p = &mut self.players[player];
        p.resources.add(first, 1);
        p.resources.add(second, 1);
        p.use_card(DevelopmentCard::YearOfPlenty);
        Ok(ActionPayload::None)
    }

    // ==================== Derived bonuses and victory ====================

    /// Recompute every player's longest road and move the bonus if a unique
    /// strict leader above the threshold emerged. Ties keep the holder; a
    /// holder severed below the threshold loses the bonus outright.
    fn recalculate_longest_road(&mut self) {
        for index in 0..self.players.len() {
            self.players[index].longest_road_length = self.board.longest_road(&self.graph, index);
        }
        let scores: Vec<usize> = self
            .players
            .iter()
            .map(|p| p.longest_road_length)
            .collect();
        let holder = update_bonus(self.has_longest_road, &scores, LONGEST_ROAD_THRESHOLD);
        self.apply_bonus_change(self.has_longest_road, holder);
        self.has_longest_road = holder;
    }

    fn recalculate_largest_army(&mut self) {
        let scores: Vec<usize> = self.players.iter().map(|p| p.army_size).collect();
        let holder = update_bonus(self.has_largest_army, &scores, LARGEST_ARMY_THRESHOLD);
        self.apply_bonus_change(self.has_largest_army, holder);
        self.has_largest_army = holder;
    }

    fn apply_bonus_change(&mut self, old: Option<PlayerIndex>, new: Option<PlayerIndex>) {
        if old == new {
            return;
        }
        if let Some(index) = old {
            let vp = &mut self.players[index].victory_points;
            vp.public -= BONUS_VICTORY_POINTS;
            vp.private -= BONUS_VICTORY_POINTS;
        }
        if let Some(index) = new {
            let vp = &mut self.players[index].victory_points;
            vp.public += BONUS_VICTORY_POINTS;
            vp.private += BONUS_VICTORY_POINTS;
        }
    }

    /// If someone just reached the goal, finish the game.
    fn victory_payload(&mut self) -> Option<ActionPayload> {
        let winner = self.winner()?;
        for player in &mut self.players {
            player.phase = Phase::GameOver;
        }
        debug!("game over, winner {winner}");
        Some(ActionPayload::GameOver(winner))
    }

    fn check_node_range(&self, node: NodeIndex) -> Result<(), ActionError> {
        if node >= self.graph.node_count() {
            return Err(ActionError::NodeIdOutOfRange);
        }
        Ok(())
    }
}

/// Bonus holder resolution shared by Longest Road and Largest Army.
///
/// The holder keeps the bonus while above the threshold and unbeaten (ties
/// included); otherwise it goes to the unique strict leader above the
/// threshold, or to nobody.
fn update_bonus(
    current: Option<PlayerIndex>,
    scores: &[usize],
    threshold: usize,
) -> Option<PlayerIndex> {
    if let Some(holder) = current {
        let held = scores[holder];
        if held > threshold && scores.iter().all(|&score| score <= held) {
            return Some(holder);
        }
    }
    let best = scores.iter().copied().max().unwrap_or(0);
    if best > threshold && scores.iter().filter(|&&score| score == best).count() == 1 {
        return scores.iter().position(|&score| score == best);
    }
    None
}

fn expect_no_args(action: &Action) -> Result<(), ActionError> {
    if action.args.is_empty() {
        Ok(())
    } else {
        Err(ActionError::InvalidNumberOfArgs)
    }
}

fn parse_node_arg(action: &Action) -> Result<NodeIndex, ActionError> {
    match action.args.as_slice() {
        [ActionArgument::NodeId(node)] => Ok(*node),
        [_] => Err(ActionError::InvalidArgumentType),
        _ => Err(ActionError::InvalidNumberOfArgs),
    }
}

/// Parse `[PlayerId...] (GiveResource, ResourceCount)... (TakeResource,
/// ResourceCount)...` argument lists, shared by trade offers and bank
/// trades.
fn parse_trade_args(
    action: &Action,
) -> Result<(Vec<PlayerIndex>, ResourceCounts, ResourceCounts), ActionError> {
    let args = &action.args;
    let mut players = Vec::new();
    let mut give = ResourceCounts::new();
    let mut take = ResourceCounts::new();

    let mut i = 0;
    while let Some(ActionArgument::PlayerId(player)) = args.get(i) {
        players.push(*player);
        i += 1;
    }
    while i < args.len() {
        let counts = match args[i] {
            ActionArgument::GiveResource(_) => &mut give,
            ActionArgument::TakeResource(_) => &mut take,
            _ => return Err(ActionError::InvalidArgumentType),
        };
        let resource = match args[i] {
            ActionArgument::GiveResource(id) | ActionArgument::TakeResource(id) => {
                Resource::from_id(id).ok_or(ActionError::InvalidResourceType)?
            }
            _ => unreachable!("matched above"),
        };
        let Some(&count_arg) = args.get(i + 1) else {
            return Err(ActionError::InvalidNumberOfArgs);
        };
        let ActionArgument::ResourceCount(count) = count_arg else {
            return Err(ActionError::InvalidArgumentType);
        };
        counts.add(resource, count as u32);
        i += 2;
    }
    Ok((players, give, take))
}

/// Parse a discard's `(GiveResource, ResourceCount)...` list.
fn parse_discard_args(action: &Action) -> Result<ResourceCounts, ActionError> {
    if action.args.is_empty() {
        return Err(ActionError::InvalidNumberOfArgs);
    }
    let (players, cards, take) = parse_trade_args(action)?;
    if !players.is_empty() || !take.is_empty() {
        return Err(ActionError::InvalidArgumentType);
    }
    Ok(cards)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_bonus_requires_strict_leader() {
        // Nobody above the threshold.
        assert_eq!(update_bonus(None, &[2, 2, 1], 2), None);
        // A unique leader above it.
        assert_eq!(update_bonus(None, &[3, 2, 1], 2), Some(0));
        // A fresh tie at the top crowns nobody.
        assert_eq!(update_bonus(None, &[3, 3, 1], 2), None);
    }

    #[test]
    fn test_update_bonus_ties_keep_holder() {
        // Holder matched but not beaten: keeps the bonus.
        assert_eq!(update_bonus(Some(1), &[3, 3, 0], 2), Some(1));
        // Holder strictly beaten: bonus moves.
        assert_eq!(update_bonus(Some(1), &[4, 3, 0], 2), Some(0));
        // Holder knocked below threshold with no successor: bonus lapses.
        assert_eq!(update_bonus(Some(1), &[1, 2, 1], 2), None);
    }

    #[test]
    fn test_parse_trade_args_shapes() {
        let give = ResourceCounts::single(Resource::Wheat, 2);
        let take = ResourceCounts::single(Resource::Brick, 1);
        let action = Action::offer_trade(&[1], &give, &take);
        let (players, parsed_give, parsed_take) = parse_trade_args(&action).unwrap();
        assert_eq!(players, vec![1]);
        assert_eq!(parsed_give, give);
        assert_eq!(parsed_take, take);

        // A dangling resource tag is a shape error.
        let action = Action::new(
            ActionKind::OfferTrade,
            vec![ActionArgument::GiveResource(0)],
        );
        assert_eq!(
            parse_trade_args(&action),
            Err(ActionError::InvalidNumberOfArgs)
        );

        // An unknown resource id is a domain error.
        let action = Action::new(
            ActionKind::OfferTrade,
            vec![
                ActionArgument::GiveResource(9),
                ActionArgument::ResourceCount(1),
            ],
        );
        assert_eq!(
            parse_trade_args(&action),
            Err(ActionError::InvalidResourceType)
        );
    }

    #[test]
    fn test_parse_discard_args_rejects_foreign_tags() {
        let action = Action::new(
            ActionKind::Discard,
            vec![
                ActionArgument::TakeResource(0),
                ActionArgument::ResourceCount(1),
            ],
        );
        assert_eq!(
            parse_discard_args(&action),
            Err(ActionError::InvalidArgumentType)
        );
        assert_eq!(
            parse_discard_args(&Action::bare(ActionKind::Discard)),
            Err(ActionError::InvalidNumberOfArgs)
        );
    }
}

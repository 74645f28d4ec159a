//! Per-variant rules configuration.
//!
//! A [`RulesConfig`] is the declarative description of one game variant:
//! building costs and limits, the development-card mix, the hex resource and
//! roll-number distributions, the port profiles, and the allowed player and
//! victory-point ranges. It is plain data, constructed once and shared
//! read-only (via `Arc`) across every game of that variant.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::player::DevelopmentCard;
use crate::resources::{HexResource, Resource, ResourceCounts};

/// Hard bounds every config is clamped into.
pub const MIN_PLAYER_COUNT: usize = 1;
pub const MAX_PLAYER_COUNT: usize = 10;
pub const MIN_VICTORY_POINTS_GOAL: u32 = 2;
pub const MAX_VICTORY_POINTS_GOAL: u32 = 20;

/// Everything a player can put resources toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Building {
    City,
    DevelopmentCard,
    Road,
    Settlement,
}

impl Building {
    pub const ALL: [Building; 4] = [
        Building::City,
        Building::DevelopmentCard,
        Building::Road,
        Building::Settlement,
    ];

    /// Stable numeric id, used by typed action arguments.
    pub fn id(self) -> usize {
        match self {
            Building::City => 0,
            Building::DevelopmentCard => 1,
            Building::Road => 2,
            Building::Settlement => 3,
        }
    }

    /// Inverse of [`Building::id`]; `None` for ids outside the enum.
    pub fn from_id(id: usize) -> Option<Building> {
        Building::ALL.get(id).copied()
    }
}

/// How a drawn list is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IterationType {
    /// Declaration order. Deterministic; what the tests use.
    Fixed,
    /// Shuffled with the caller's rng.
    Random,
}

/// Per-game knobs handed to `GameEngine::initialize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameters {
    pub card_iteration: IterationType,
    pub port_iteration: IterationType,
    pub resource_iteration: IterationType,
    pub roll_iteration: IterationType,
    pub player_count: usize,
    pub victory_points_goal: u32,
}

impl Parameters {
    /// Fully deterministic parameters, for tests and replays.
    pub fn fixed(player_count: usize, victory_points_goal: u32) -> Self {
        Self {
            card_iteration: IterationType::Fixed,
            port_iteration: IterationType::Fixed,
            resource_iteration: IterationType::Fixed,
            roll_iteration: IterationType::Fixed,
            player_count,
            victory_points_goal,
        }
    }

    /// Shuffle everything.
    pub fn random(player_count: usize, victory_points_goal: u32) -> Self {
        Self {
            card_iteration: IterationType::Random,
            port_iteration: IterationType::Random,
            resource_iteration: IterationType::Random,
            roll_iteration: IterationType::Random,
            player_count,
            victory_points_goal,
        }
    }
}

/// What one port trades: a set of resources at a common rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortProfile {
    pub resources: Vec<Resource>,
    pub rate: u32,
}

impl PortProfile {
    /// A port trading a single resource.
    pub fn only(resource: Resource, rate: u32) -> Self {
        Self {
            resources: vec![resource],
            rate,
        }
    }

    /// A port trading every resource.
    pub fn any(rate: u32) -> Self {
        Self {
            resources: Resource::ALL.to_vec(),
            rate,
        }
    }

    pub fn trades(&self, resource: Resource) -> bool {
        self.resources.contains(&resource)
    }
}

/// Immutable rules for one game variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    min_player_count: usize,
    max_player_count: usize,
    min_victory_points_goal: u32,
    max_victory_points_goal: u32,
    building_costs: BTreeMap<Building, ResourceCounts>,
    /// Game-wide build limits; absent means unlimited.
    building_counts: BTreeMap<Building, usize>,
    /// Per-player build limits; absent means unlimited.
    building_counts_per_player: BTreeMap<Building, usize>,
    development_card_counts: BTreeMap<DevelopmentCard, usize>,
    /// Hex resource distribution in declaration order; the Desert is listed
    /// here like any other entry.
    resource_counts: Vec<(HexResource, usize)>,
    rolls: Vec<u32>,
    ports: Vec<PortProfile>,
    default_bank_rate: u32,
    discard_threshold: u32,
    max_trades_per_turn: usize,
}

impl RulesConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        min_player_count: usize,
        max_player_count: usize,
        min_victory_points_goal: u32,
        max_victory_points_goal: u32,
        building_costs: BTreeMap<Building, ResourceCounts>,
        building_counts: BTreeMap<Building, usize>,
        building_counts_per_player: BTreeMap<Building, usize>,
        development_card_counts: BTreeMap<DevelopmentCard, usize>,
        resource_counts: Vec<(HexResource, usize)>,
        rolls: Vec<u32>,
        ports: Vec<PortProfile>,
    ) -> Self {
        Self {
            min_player_count: min_player_count.max(MIN_PLAYER_COUNT),
            max_player_count: max_player_count.min(MAX_PLAYER_COUNT),
            min_victory_points_goal: min_victory_points_goal.max(MIN_VICTORY_POINTS_GOAL),
            max_victory_points_goal: max_victory_points_goal.min(MAX_VICTORY_POINTS_GOAL),
            building_costs,
            building_counts,
            building_counts_per_player,
            development_card_counts,
            resource_counts,
            rolls,
            ports,
            default_bank_rate: 4,
            discard_threshold: 7,
            max_trades_per_turn: 42,
        }
    }

    pub fn min_player_count(&self) -> usize {
        self.min_player_count
    }

    pub fn max_player_count(&self) -> usize {
        self.max_player_count
    }

    pub fn min_victory_points_goal(&self) -> u32 {
        self.min_victory_points_goal
    }

    pub fn max_victory_points_goal(&self) -> u32 {
        self.max_victory_points_goal
    }

    /// Bank exchange rate for a player with no matching port.
    pub fn default_bank_rate(&self) -> u32 {
        self.default_bank_rate
    }

    /// Hand size above which a seven forces a discard.
    pub fn discard_threshold(&self) -> u32 {
        self.discard_threshold
    }

    /// How many trades one player may offer in a single turn.
    pub fn max_trades_per_turn(&self) -> usize {
        self.max_trades_per_turn
    }

    /// Cost of a building; `None` if this variant cannot build it.
    pub fn cost(&self, building: Building) -> Option<&ResourceCounts> {
        self.building_costs.get(&building)
    }

    /// Game-wide build limit.
    pub fn max_count(&self, building: Building) -> Option<usize> {
        self.building_counts.get(&building).copied()
    }

    /// Per-player build limit.
    pub fn max_count_per_player(&self, building: Building) -> Option<usize> {
        self.building_counts_per_player.get(&building).copied()
    }

    pub fn development_card_count(&self, card: DevelopmentCard) -> usize {
        self.development_card_counts.get(&card).copied().unwrap_or(0)
    }

    pub fn port_profiles(&self) -> &[PortProfile] {
        &self.ports
    }

    pub fn is_valid(&self, parameters: &Parameters) -> bool {
        parameters.player_count >= self.min_player_count
            && parameters.player_count <= self.max_player_count
            && parameters.victory_points_goal >= self.min_victory_points_goal
            && parameters.victory_points_goal <= self.max_victory_points_goal
    }

    /// A fresh development-card deck, drawn from the back.
    ///
    /// Fixed decks are stacked so the first card drawn is the first declared
    /// (knights on a stock deck); Random shuffles with the caller's rng.
    pub fn development_card_deck<R: Rng>(
        &self,
        iteration: IterationType,
        rng: &mut R,
    ) -> Vec<DevelopmentCard> {
        let mut deck = Vec::new();
        for (&card, &count) in self.development_card_counts.iter().rev() {
            deck.extend(std::iter::repeat(card).take(count));
        }
        if iteration == IterationType::Random {
            deck.shuffle(rng);
        }
        deck
    }

    /// A fresh hex-resource list, consumed front-to-back during assembly.
    pub fn hex_resources<R: Rng>(
        &self,
        iteration: IterationType,
        rng: &mut R,
    ) -> Vec<HexResource> {
        let mut resources = Vec::new();
        for &(resource, count) in &self.resource_counts {
            resources.extend(std::iter::repeat(resource).take(count));
        }
        if iteration == IterationType::Random {
            resources.shuffle(rng);
        }
        resources
    }

    /// A fresh roll-number list, consumed front-to-back during assembly.
    pub fn roll_numbers<R: Rng>(&self, iteration: IterationType, rng: &mut R) -> Vec<u32> {
        let mut rolls = self.rolls.clone();
        if iteration == IterationType::Random {
            rolls.shuffle(rng);
        }
        rolls
    }

    /// A fresh port-profile list, indexed by port index during assembly.
    pub fn port_assignments<R: Rng>(
        &self,
        iteration: IterationType,
        rng: &mut R,
    ) -> Vec<PortProfile> {
        let mut ports = self.ports.clone();
        if iteration == IterationType::Random {
            ports.shuffle(rng);
        }
        ports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_standard_costs() {
        let rules = catalog::standard_rules();
        assert_eq!(
            rules.cost(Building::Road),
            Some(&ResourceCounts::with_amounts(1, 0, 0, 0, 1))
        );
        assert_eq!(
            rules.cost(Building::Settlement),
            Some(&ResourceCounts::with_amounts(1, 0, 1, 1, 1))
        );
        assert_eq!(
            rules.cost(Building::City),
            Some(&ResourceCounts::with_amounts(0, 3, 0, 2, 0))
        );
        assert_eq!(
            rules.cost(Building::DevelopmentCard),
            Some(&ResourceCounts::with_amounts(0, 1, 1, 1, 0))
        );
    }

    #[test]
    fn test_parameter_validation() {
        let rules = catalog::standard_rules();
        assert!(rules.is_valid(&Parameters::fixed(3, 10)));
        assert!(!rules.is_valid(&Parameters::fixed(1, 10)));
        assert!(!rules.is_valid(&Parameters::fixed(3, 20)));
    }

    #[test]
    fn test_fixed_deck_draws_knights_first() {
        let rules = catalog::standard_rules();
        let mut rng = StdRng::seed_from_u64(0);
        let mut deck = rules.development_card_deck(IterationType::Fixed, &mut rng);
        assert_eq!(deck.len(), 25);
        assert_eq!(deck.pop(), Some(DevelopmentCard::Knight));
        let knights = deck
            .iter()
            .filter(|c| **c == DevelopmentCard::Knight)
            .count();
        assert_eq!(knights, 13);
    }

    #[test]
    fn test_random_deck_is_permutation() {
        let rules = catalog::standard_rules();
        let mut rng = StdRng::seed_from_u64(42);
        let deck = rules.development_card_deck(IterationType::Random, &mut rng);
        assert_eq!(deck.len(), 25);
        let vps = deck
            .iter()
            .filter(|c| **c == DevelopmentCard::VictoryPoint)
            .count();
        assert_eq!(vps, 5);
    }

    #[test]
    fn test_fixed_resources_end_with_desert() {
        let rules = catalog::standard_rules();
        let mut rng = StdRng::seed_from_u64(0);
        let resources = rules.hex_resources(IterationType::Fixed, &mut rng);
        assert_eq!(resources.len(), 19);
        assert_eq!(resources.last(), Some(&HexResource::Desert));
        assert_eq!(
            resources.first(),
            Some(&HexResource::Yielding(Resource::Brick))
        );
    }

    #[test]
    fn test_bounds_are_clamped() {
        let rules = RulesConfig::new(
            0,
            100,
            0,
            100,
            BTreeMap::new(),
            BTreeMap::new(),
            BTreeMap::new(),
            BTreeMap::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(rules.min_player_count(), MIN_PLAYER_COUNT);
        assert_eq!(rules.max_player_count(), MAX_PLAYER_COUNT);
        assert_eq!(rules.min_victory_points_goal(), MIN_VICTORY_POINTS_GOAL);
        assert_eq!(rules.max_victory_points_goal(), MAX_VICTORY_POINTS_GOAL);
    }
}

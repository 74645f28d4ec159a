//! Resource types and per-player resource accounting.
//!
//! This module contains:
//! - The five tradeable resources and the non-yielding Desert
//! - `ResourceCounts`, the fixed-field bundle used for hands, costs,
//!   trades and exchange-rate tables
//! - Weighted random selection for robber steals and random discards

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The five tradeable resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Resource {
    Brick,
    Ore,
    Sheep,
    Wheat,
    Wood,
}

impl Resource {
    /// All resources, in stable id order.
    pub const ALL: [Resource; 5] = [
        Resource::Brick,
        Resource::Ore,
        Resource::Sheep,
        Resource::Wheat,
        Resource::Wood,
    ];

    /// Stable numeric id, used by typed action arguments.
    pub fn id(self) -> usize {
        match self {
            Resource::Brick => 0,
            Resource::Ore => 1,
            Resource::Sheep => 2,
            Resource::Wheat => 3,
            Resource::Wood => 4,
        }
    }

    /// Inverse of [`Resource::id`]; `None` for ids outside the enum.
    pub fn from_id(id: usize) -> Option<Resource> {
        Resource::ALL.get(id).copied()
    }
}

/// What a hex cell can hold: a yielding resource or the Desert.
///
/// Exactly one hex per game holds the Desert; the robber starts there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HexResource {
    Yielding(Resource),
    Desert,
}

impl HexResource {
    /// The yielding resource, if any.
    pub fn resource(self) -> Option<Resource> {
        match self {
            HexResource::Yielding(r) => Some(r),
            HexResource::Desert => None,
        }
    }

    pub fn is_desert(self) -> bool {
        matches!(self, HexResource::Desert)
    }
}

/// A bundle of resource counts.
///
/// Used for player hands, building costs, trade sides, discards and (by
/// convention) per-resource bank exchange rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCounts {
    pub brick: u32,
    pub ore: u32,
    pub sheep: u32,
    pub wheat: u32,
    pub wood: u32,
}

impl ResourceCounts {
    /// An empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// A bundle with explicit amounts, in id order.
    pub fn with_amounts(brick: u32, ore: u32, sheep: u32, wheat: u32, wood: u32) -> Self {
        Self {
            brick,
            ore,
            sheep,
            wheat,
            wood,
        }
    }

    /// A bundle holding `amount` of a single resource.
    pub fn single(resource: Resource, amount: u32) -> Self {
        let mut counts = Self::new();
        counts.add(resource, amount);
        counts
    }

    /// A bundle holding the same amount of every resource.
    pub fn uniform(amount: u32) -> Self {
        Self::with_amounts(amount, amount, amount, amount, amount)
    }

    /// Total number of cards in the bundle.
    pub fn total(&self) -> u32 {
        self.brick + self.ore + self.sheep + self.wheat + self.wood
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Count of a specific resource.
    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Brick => self.brick,
            Resource::Ore => self.ore,
            Resource::Sheep => self.sheep,
            Resource::Wheat => self.wheat,
            Resource::Wood => self.wood,
        }
    }

    /// Set the count of a specific resource.
    pub fn set(&mut self, resource: Resource, count: u32) {
        match resource {
            Resource::Brick => self.brick = count,
            Resource::Ore => self.ore = count,
            Resource::Sheep => self.sheep = count,
            Resource::Wheat => self.wheat = count,
            Resource::Wood => self.wood = count,
        }
    }

    /// Add `amount` of one resource.
    pub fn add(&mut self, resource: Resource, amount: u32) {
        self.set(resource, self.get(resource) + amount);
    }

    /// Add a whole bundle.
    pub fn accrue(&mut self, windfall: &ResourceCounts) {
        for resource in Resource::ALL {
            self.add(resource, windfall.get(resource));
        }
    }

    /// Every required count is covered by this bundle.
    pub fn can_afford(&self, cost: &ResourceCounts) -> bool {
        Resource::ALL
            .into_iter()
            .all(|r| self.get(r) >= cost.get(r))
    }

    /// Subtract a cost.
    ///
    /// Driving a count negative is a rules-engine defect, not a user error,
    /// so an unaffordable spend panics instead of reporting a result.
    pub fn spend(&mut self, cost: &ResourceCounts) {
        assert!(
            self.can_afford(cost),
            "spending {:?} out of {:?}",
            cost,
            self
        );
        for resource in Resource::ALL {
            self.set(resource, self.get(resource) - cost.get(resource));
        }
    }

    /// Pick one card uniformly at random, weighted by held quantity.
    ///
    /// The bundle is expanded into a flat multiset and a card is drawn from
    /// it; the bundle itself is not modified. Used for the robber's steal
    /// and for random discards.
    pub fn choose_from<R: Rng>(&self, rng: &mut R) -> Option<Resource> {
        let mut cards = Vec::with_capacity(self.total() as usize);
        for resource in Resource::ALL {
            for _ in 0..self.get(resource) {
                cards.push(resource);
            }
        }
        cards.choose(rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_total_and_get() {
        let counts = ResourceCounts::with_amounts(1, 2, 3, 4, 5);
        assert_eq!(counts.total(), 15);
        assert_eq!(counts.get(Resource::Brick), 1);
        assert_eq!(counts.get(Resource::Wood), 5);
    }

    #[test]
    fn test_can_afford() {
        let hand = ResourceCounts::uniform(2);
        assert!(hand.can_afford(&ResourceCounts::uniform(2)));
        assert!(hand.can_afford(&ResourceCounts::single(Resource::Ore, 2)));
        assert!(!hand.can_afford(&ResourceCounts::single(Resource::Ore, 3)));
    }

    #[test]
    fn test_accrue_and_spend() {
        let mut hand = ResourceCounts::new();
        hand.accrue(&ResourceCounts::with_amounts(1, 1, 0, 2, 0));
        hand.spend(&ResourceCounts::single(Resource::Wheat, 1));
        assert_eq!(hand, ResourceCounts::with_amounts(1, 1, 0, 1, 0));
    }

    #[test]
    #[should_panic]
    fn test_overspend_panics() {
        let mut hand = ResourceCounts::single(Resource::Brick, 1);
        hand.spend(&ResourceCounts::single(Resource::Brick, 2));
    }

    #[test]
    fn test_choose_from_single_card() {
        let mut rng = StdRng::seed_from_u64(7);
        let hand = ResourceCounts::single(Resource::Sheep, 1);
        assert_eq!(hand.choose_from(&mut rng), Some(Resource::Sheep));
        assert_eq!(ResourceCounts::new().choose_from(&mut rng), None);
    }

    #[test]
    fn test_resource_ids_round_trip() {
        for resource in Resource::ALL {
            assert_eq!(Resource::from_id(resource.id()), Some(resource));
        }
        assert_eq!(Resource::from_id(5), None);
    }
}

//! Actions, their typed arguments, and execution outcomes.
//!
//! Every request a player can make is an [`Action`]: a kind from a closed
//! enum plus a list of tagged arguments. Argument payloads are raw numbers
//! on purpose: an out-of-range building id or node id must be representable
//! so the engine can reject it with the right error instead of the request
//! failing to construct at all.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Building;
use crate::graph::NodeIndex;
use crate::player::{DevelopmentCard, PlayerIndex};
use crate::resources::{Resource, ResourceCounts};

/// Everything a player may ask the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    AcceptTrade,
    Build,
    CancelTrade,
    ChooseInitialResources,
    DeclineTrade,
    Discard,
    EndTurn,
    FailTrade,
    MoveRobber,
    OfferTrade,
    PlayKnight,
    PlayMonopoly,
    PlayRoadBuilding,
    PlayVictoryPoint,
    PlayYearOfPlenty,
    RollDice,
    Steal,
    ToRoot,
    TradeWithBank,
}

/// A tagged action argument. Payloads are unvalidated numbers; validation
/// happens in `GameEngine::execute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionArgument {
    NodeId(usize),
    PlayerId(usize),
    BuildItemId(usize),
    DevelopmentCardId(usize),
    GiveResource(usize),
    TakeResource(usize),
    ResourceCount(usize),
    DiceRoll(usize),
}

/// A request: what to do, and with what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub args: Vec<ActionArgument>,
}

impl Action {
    pub fn new(kind: ActionKind, args: Vec<ActionArgument>) -> Self {
        Self { kind, args }
    }

    /// An action with no arguments.
    pub fn bare(kind: ActionKind) -> Self {
        Self::new(kind, Vec::new())
    }

    /// Build something at a node.
    pub fn build(building: Building, node: NodeIndex) -> Self {
        Self::new(
            ActionKind::Build,
            vec![
                ActionArgument::BuildItemId(building.id()),
                ActionArgument::NodeId(node),
            ],
        )
    }

    /// Buy a development card.
    pub fn build_development_card() -> Self {
        Self::new(
            ActionKind::Build,
            vec![ActionArgument::BuildItemId(Building::DevelopmentCard.id())],
        )
    }

    /// Roll with a caller-supplied total, for deterministic play.
    pub fn roll_dice_exact(total: usize) -> Self {
        Self::new(ActionKind::RollDice, vec![ActionArgument::DiceRoll(total)])
    }

    pub fn roll_dice() -> Self {
        Self::bare(ActionKind::RollDice)
    }

    pub fn move_robber(hex: NodeIndex) -> Self {
        Self::new(ActionKind::MoveRobber, vec![ActionArgument::NodeId(hex)])
    }

    pub fn steal(victim: PlayerIndex) -> Self {
        Self::new(ActionKind::Steal, vec![ActionArgument::PlayerId(victim)])
    }

    pub fn choose_initial_resources(junction: NodeIndex) -> Self {
        Self::new(
            ActionKind::ChooseInitialResources,
            vec![ActionArgument::NodeId(junction)],
        )
    }

    pub fn end_turn() -> Self {
        Self::bare(ActionKind::EndTurn)
    }

    pub fn to_root() -> Self {
        Self::bare(ActionKind::ToRoot)
    }

    pub fn accept_trade() -> Self {
        Self::bare(ActionKind::AcceptTrade)
    }

    pub fn decline_trade() -> Self {
        Self::bare(ActionKind::DeclineTrade)
    }

    pub fn cancel_trade() -> Self {
        Self::bare(ActionKind::CancelTrade)
    }

    pub fn fail_trade() -> Self {
        Self::bare(ActionKind::FailTrade)
    }

    /// Offer a trade to other players.
    ///
    /// Encoded as the addressed player ids followed by (give, count) and
    /// (take, count) pairs.
    pub fn offer_trade(to: &[PlayerIndex], give: &ResourceCounts, take: &ResourceCounts) -> Self {
        let mut args = Vec::new();
        for &player in to {
            args.push(ActionArgument::PlayerId(player));
        }
        push_resource_pairs(&mut args, give, true);
        push_resource_pairs(&mut args, take, false);
        Self::new(ActionKind::OfferTrade, args)
    }

    /// Exchange with the bank at port/bank rates.
    pub fn trade_with_bank(give: &ResourceCounts, take: &ResourceCounts) -> Self {
        let mut args = Vec::new();
        push_resource_pairs(&mut args, give, true);
        push_resource_pairs(&mut args, take, false);
        Self::new(ActionKind::TradeWithBank, args)
    }

    /// Discard part of a hand after a seven.
    pub fn discard(cards: &ResourceCounts) -> Self {
        let mut args = Vec::new();
        push_resource_pairs(&mut args, cards, true);
        Self::new(ActionKind::Discard, args)
    }

    pub fn play_knight(hex: NodeIndex) -> Self {
        Self::new(ActionKind::PlayKnight, vec![ActionArgument::NodeId(hex)])
    }

    pub fn play_monopoly(resource: Resource) -> Self {
        Self::new(
            ActionKind::PlayMonopoly,
            vec![ActionArgument::TakeResource(resource.id())],
        )
    }

    pub fn play_road_building(first: NodeIndex, second: NodeIndex) -> Self {
        Self::new(
            ActionKind::PlayRoadBuilding,
            vec![
                ActionArgument::NodeId(first),
                ActionArgument::NodeId(second),
            ],
        )
    }

    pub fn play_victory_point() -> Self {
        Self::bare(ActionKind::PlayVictoryPoint)
    }

    pub fn play_year_of_plenty(first: Resource, second: Resource) -> Self {
        Self::new(
            ActionKind::PlayYearOfPlenty,
            vec![
                ActionArgument::TakeResource(first.id()),
                ActionArgument::TakeResource(second.id()),
            ],
        )
    }
}

fn push_resource_pairs(args: &mut Vec<ActionArgument>, counts: &ResourceCounts, give: bool) {
    for resource in Resource::ALL {
        let count = counts.get(resource);
        if count == 0 {
            continue;
        }
        if give {
            args.push(ActionArgument::GiveResource(resource.id()));
        } else {
            args.push(ActionArgument::TakeResource(resource.id()));
        }
        args.push(ActionArgument::ResourceCount(count as usize));
    }
}

/// A proposed exchange between the offerer and one or more other players.
///
/// At most one trade is active per game at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub offerer: PlayerIndex,
    pub offered_to: Vec<PlayerIndex>,
    /// What the offerer gives up.
    pub give: ResourceCounts,
    /// What the offerer receives.
    pub take: ResourceCounts,
}

/// What a successful action produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionPayload {
    /// Nothing beyond the state change itself.
    None,
    /// The dice total.
    Rolled(u32),
    /// The development card bought.
    Drew(DevelopmentCard),
    /// What the robber stole; `None` if the victim's hand was empty.
    Stole(Option<Resource>),
    /// How many cards a monopoly collected.
    Monopolized(u32),
    /// The game just ended; the winner's seat.
    GameOver(PlayerIndex),
}

/// Why an action was rejected. All variants are recoverable: the engine
/// state is unchanged and the caller may submit another action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ActionError {
    #[error("player index out of range")]
    InvalidPlayerId,
    #[error("action is not available in the current state")]
    InvalidEdgeChoice,
    #[error("wrong number of arguments")]
    InvalidNumberOfArgs,
    #[error("argument has the wrong type")]
    InvalidArgumentType,
    #[error("resource id out of range")]
    InvalidResourceType,
    #[error("building id out of range")]
    BuildingIdOutOfRange,
    #[error("development card id out of range")]
    DevelopmentCardIdOutOfRange,
    #[error("node id out of range")]
    NodeIdOutOfRange,
    #[error("node is not a valid target for this action")]
    InvalidNodeId,
    #[error("junction is not settleable")]
    JunctionNotSettleable,
    #[error("not enough resources")]
    CannotAfford,
    #[error("dice roll outside 2..=12")]
    DiceRollOutOfRange,
    #[error("trade is malformed or not satisfiable")]
    InvalidTrade,
    #[error("request is excessive")]
    StopFlexing,
}

/// Outcome of `GameEngine::execute`.
pub type ActionResult = Result<ActionPayload, ActionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_action_shape() {
        let action = Action::build(Building::Settlement, 42);
        assert_eq!(action.kind, ActionKind::Build);
        assert_eq!(
            action.args,
            vec![
                ActionArgument::BuildItemId(Building::Settlement.id()),
                ActionArgument::NodeId(42),
            ]
        );
    }

    #[test]
    fn test_offer_trade_args_in_id_order() {
        let give = ResourceCounts::with_amounts(0, 2, 0, 1, 0);
        let take = ResourceCounts::single(Resource::Wood, 1);
        let action = Action::offer_trade(&[1, 2], &give, &take);
        assert_eq!(
            action.args,
            vec![
                ActionArgument::PlayerId(1),
                ActionArgument::PlayerId(2),
                ActionArgument::GiveResource(Resource::Ore.id()),
                ActionArgument::ResourceCount(2),
                ActionArgument::GiveResource(Resource::Wheat.id()),
                ActionArgument::ResourceCount(1),
                ActionArgument::TakeResource(Resource::Wood.id()),
                ActionArgument::ResourceCount(1),
            ]
        );
    }

    #[test]
    fn test_discard_action_shape() {
        let action = Action::discard(&ResourceCounts::single(Resource::Sheep, 3));
        assert_eq!(
            action.args,
            vec![
                ActionArgument::GiveResource(Resource::Sheep.id()),
                ActionArgument::ResourceCount(3),
            ]
        );
    }
}

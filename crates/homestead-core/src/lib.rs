//! Homestead - a hex-board settlement game rules engine
//!
//! This crate provides the core game logic for Homestead, including:
//! - The immutable board topology (hexes, junctions, roads, ports)
//! - Declarative per-variant rules configuration
//! - Per-player economy and the turn state machine
//! - Full action validation and execution, with longest-road and
//!   largest-army bookkeeping
//!
//! # Architecture
//!
//! The engine is a plain state machine driven through
//! [`GameEngine::execute`]; it owns no I/O. Network servers, wire codecs
//! and storage layers live elsewhere and consume the serde data model this
//! crate exposes. A topology ([`BoardGraph`]) and a rules configuration
//! ([`RulesConfig`]) are built once and shared read-only across any number
//! of concurrent games.
//!
//! # Modules
//!
//! - [`graph`]: immutable board topology and port detection
//! - [`config`]: per-variant rules configuration
//! - [`board`]: the mutable per-game board overlay
//! - [`player`]: per-player economy, phases, and legal-action enumeration
//! - [`actions`]: action vocabulary and execution outcomes
//! - [`game`]: the engine itself
//! - [`catalog`]: stock boards and rules configurations

pub mod actions;
pub mod board;
pub mod catalog;
pub mod config;
pub mod game;
pub mod graph;
pub mod player;
pub mod resources;

// Re-export commonly used types
pub use actions::{
    Action, ActionArgument, ActionError, ActionKind, ActionPayload, ActionResult, Trade,
};
pub use board::{BoardState, CellState, HexCell, InitError, JunctionCell, RoadCell};
pub use config::{Building, IterationType, Parameters, PortProfile, RulesConfig};
pub use game::{GameEngine, LARGEST_ARMY_THRESHOLD, LONGEST_ROAD_THRESHOLD};
pub use graph::{BoardGraph, Direction, NodeIndex, NodeKind, Orientation, Port};
pub use player::{DevelopmentCard, Phase, Player, PlayerId, PlayerIndex, VictoryPoints};
pub use resources::{HexResource, Resource, ResourceCounts};

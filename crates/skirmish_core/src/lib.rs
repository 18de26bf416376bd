//! # Skirmish Core
//!
//! Deterministic simulation core for team-based grid combat.
//!
//! This crate contains **only** simulation state and rules:
//! - No rendering
//! - No IO
//! - No randomness (policies and spawn generation live upstream and
//!   inject any random choices as finished [`components::Action`] values)
//!
//! The world advances in phases: all actions for a tick are recorded
//! against a single consistent snapshot, then applied in agent-id order,
//! then derived state (distances, visibility, team wipes) is recomputed.
//! Readers in the decision phase never observe partially-applied state.
//!
//! ## Crate Structure
//!
//! - [`components`] - agents, teams, actions, unit stats
//! - [`world`] - the grid world and its tick phases
//! - [`math`] - grid-aligned 2D vector helpers
//! - [`error`] - typed simulation errors

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod components;
pub mod error;
pub mod math;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::components::{
        team_palette, Action, Agent, AgentId, CombatStats, Role, Team, TeamColor, TeamId, UnitSpec,
    };
    pub use crate::error::{Result, WorldError};
    pub use crate::math::Vec2;
    pub use crate::world::{GridWorld, STEP_DELTAS};
}

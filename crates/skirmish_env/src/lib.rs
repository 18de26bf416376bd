//! # Skirmish Environment
//!
//! Environment layer on top of [`skirmish_core`]: collision-aware spawn
//! generation, scripted decision policies for non-learning agents, and
//! the team scenario orchestrator that ties agents, teams and the grid
//! world into a consistent episode lifecycle.
//!
//! ## Crate Structure
//!
//! - [`spawn_generator`] - collision-free team and agent placement
//! - [`policy`] - scripted attack-or-move decision policies
//! - [`scenario`] - build plans, episode reset, reward/done/observation
//! - [`rewards`] - dense reward shaping helpers

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod policy;
pub mod rewards;
pub mod scenario;
pub mod spawn_generator;

pub use policy::{BasicPolicy, DecisionPolicy};
pub use scenario::{MatchPlan, ScenarioError, SpawnMode, TeamPlan, TeamsScenario};
pub use spawn_generator::{SpawnError, SpawnGenerator};

//! Team scenario orchestration.
//!
//! A scenario is built from a declarative match plan (unit specs, per
//! team, plus a scripted flag), owns the cached spawn layout for the
//! episode, and answers the reward / termination / observation queries
//! the training loop needs.
//!
//! Plans can be embedded or loaded from RON files.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use skirmish_core::components::{team_palette, Action, Agent, AgentId, Team, TeamId, UnitSpec};
use skirmish_core::math::Vec2;
use skirmish_core::world::GridWorld;

use crate::policy::{BasicPolicy, DecisionPolicy};
use crate::spawn_generator::{SpawnError, SpawnGenerator, DEFAULT_MAX_TRIALS};

/// Error type for scenario construction and reset.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// Per-team agent counts differ where symmetry is required.
    #[error("Scenario is not symmetric: per-team agent counts are {counts:?}")]
    NotSymmetric {
        /// The offending per-team counts.
        counts: Vec<usize>,
    },

    /// Spawn mirroring is defined for exactly two opposing teams.
    #[error("Scenario requires exactly 2 teams, got {got}")]
    TwoTeamsRequired {
        /// Number of teams in the plan.
        got: usize,
    },

    /// Explicit spawn list does not cover the team's members.
    #[error("Team {team} supplies {got} explicit spawns for {expected} units")]
    SpawnCountMismatch {
        /// Offending team id.
        team: usize,
        /// Number of units in the team.
        expected: usize,
        /// Number of explicit spawns supplied.
        got: usize,
    },

    /// Plan file not found.
    #[error("Plan file not found: {0}")]
    FileNotFound(String),

    /// Failed to read a plan file.
    #[error("Failed to read plan file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse RON.
    #[error("Failed to parse plan: {0}")]
    ParseError(#[from] ron::error::SpannedError),

    /// Spawn generation failed.
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    /// World placement failed.
    #[error(transparent)]
    World(#[from] skirmish_core::error::WorldError),
}

/// Build plan for a single team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamPlan {
    /// Unit specs consumed at agent construction, in member order.
    pub units: Vec<UnitSpec>,
    /// Whether this team's agents are driven by the scripted policy.
    pub is_scripted: bool,
    /// Explicit spawn positions overriding generation, if any.
    #[serde(default)]
    pub agent_spawns: Option<Vec<Vec2>>,
}

/// Build plan for a whole match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchPlan {
    /// One plan per team.
    pub teams: Vec<TeamPlan>,
}

impl MatchPlan {
    /// Load a match plan from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let plan: MatchPlan = ron::from_str(&contents)?;
        Ok(plan)
    }

    /// Load from a RON string (useful for embedded plans).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let plan: MatchPlan = ron::from_str(ron)?;
        Ok(plan)
    }

    /// A standard scripted 2v2 of default attackers.
    #[must_use]
    pub fn skirmish_2v2() -> Self {
        Self {
            teams: vec![
                TeamPlan {
                    units: vec![UnitSpec::attacker(), UnitSpec::attacker()],
                    is_scripted: true,
                    agent_spawns: None,
                },
                TeamPlan {
                    units: vec![UnitSpec::attacker(), UnitSpec::attacker()],
                    is_scripted: true,
                    agent_spawns: None,
                },
            ],
        }
    }
}

/// How agent offsets are laid out around the team spawn at reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnMode {
    /// Deterministic box packing; never overlaps.
    Packed,
    /// Randomized polar scatter with the given radial deviation.
    Scattered {
        /// Standard deviation of the gaussian spawn radius.
        sigma: f32,
    },
}

/// Scales how tightly the two formations are pushed together.
const TEAM_MIXING_FACTOR: f32 = 8.0;

/// Cell buffer between the two packed team boxes.
const SPAWN_BUFFER: u32 = 2;

/// Orchestrates teams, agents and the grid world across an episode.
pub struct TeamsScenario {
    plans: Vec<TeamPlan>,
    agents_per_team: usize,
    spawn_mode: SpawnMode,
    seed: Option<u64>,
    team_spawns: Option<Vec<Vec2>>,
    agent_spawns: Vec<Option<Vec<Vec2>>>,
    policy: Box<dyn DecisionPolicy>,
}

impl TeamsScenario {
    /// Validate a match plan and build the scenario around it.
    ///
    /// All teams must field the same number of agents; a mismatch is a
    /// fatal construction error carrying the offending counts.
    pub fn new(plan: MatchPlan) -> Result<Self, ScenarioError> {
        let counts: Vec<usize> = plan.teams.iter().map(|t| t.units.len()).collect();
        if plan.teams.len() != 2 {
            return Err(ScenarioError::TwoTeamsRequired {
                got: plan.teams.len(),
            });
        }
        if counts.iter().any(|&c| c != counts[0]) {
            return Err(ScenarioError::NotSymmetric { counts });
        }
        for (tid, team) in plan.teams.iter().enumerate() {
            if let Some(spawns) = &team.agent_spawns {
                if spawns.len() != team.units.len() {
                    return Err(ScenarioError::SpawnCountMismatch {
                        team: tid,
                        expected: team.units.len(),
                        got: spawns.len(),
                    });
                }
            }
        }
        let teams_n = plan.teams.len();
        Ok(Self {
            agents_per_team: counts[0],
            plans: plan.teams,
            spawn_mode: SpawnMode::Packed,
            seed: None,
            team_spawns: None,
            agent_spawns: vec![None; teams_n],
            policy: Box::new(BasicPolicy::new()),
        })
    }

    /// Replace the scripted decision policy.
    #[must_use]
    pub fn with_policy(mut self, policy: Box<dyn DecisionPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Seed spawn generation for reproducible layouts.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Select the spawn layout mode used at the first reset.
    #[must_use]
    pub fn with_spawn_mode(mut self, mode: SpawnMode) -> Self {
        self.spawn_mode = mode;
        self
    }

    /// Build the world: agents with global sequential ids, per-team
    /// colors, teams wired to the scripted flag from the plan.
    #[must_use]
    pub fn make_world(&self, grid_size: f32) -> GridWorld {
        let colors = team_palette(self.plans.len());
        let mut agents = Vec::new();
        let mut teams = Vec::new();
        let mut next_id: AgentId = 0;
        for (tid, plan) in self.plans.iter().enumerate() {
            let members: Vec<AgentId> = (next_id..next_id + plan.units.len()).collect();
            for (&id, &spec) in members.iter().zip(&plan.units) {
                agents.push(Agent::new(id, tid, colors[tid], spec));
            }
            next_id += plan.units.len();
            teams.push(Team::new(tid, members, plan.is_scripted));
        }
        GridWorld::new(grid_size, agents, teams)
    }

    /// Reset the world for a new episode.
    ///
    /// The first call generates the spawn layout - team spawns spread by
    /// total agent count and the mixing factor, one team's offsets
    /// mirrored (negated) for the other - and caches it; later resets
    /// reuse the cache until [`TeamsScenario::clear_spawns`].
    pub fn reset_world(&mut self, world: &mut GridWorld) -> Result<(), ScenarioError> {
        world.reset();

        if self.team_spawns.is_none() {
            self.generate_layout(world)?;
        }

        for (tid, team_members) in self.member_ids(world).into_iter().enumerate() {
            if let Some(spawns) = self.agent_spawns[tid].clone() {
                for (slot, agent_id) in team_members.into_iter().enumerate() {
                    world.connect(agent_id, spawns[slot])?;
                }
            }
        }
        world.update();
        Ok(())
    }

    /// Drop the cached spawn layout; the next reset regenerates it.
    pub fn clear_spawns(&mut self) {
        self.team_spawns = None;
        for spawns in &mut self.agent_spawns {
            *spawns = None;
        }
    }

    /// Advance the world one tick.
    ///
    /// All scripted actions are computed against the pre-tick snapshot
    /// and recorded on their agents before any of them is applied, so
    /// same-tick decisions are order-independent.
    pub fn tick(&mut self, world: &mut GridWorld) {
        let mut actions: Vec<(AgentId, Action)> = Vec::new();
        for team in &world.teams {
            if !team.is_scripted {
                continue;
            }
            for &member in &team.members {
                let action = if world.alive[member] {
                    self.policy.act(&world.agents[member], world)
                } else {
                    Action::none()
                };
                actions.push((member, action));
            }
        }
        for (member, action) in actions {
            world.record_action(member, action);
        }
        world.advance();
    }

    /// Reward for one agent: damage dealt scaled by its own attack
    /// power, plus a flat bonus per kill. Pure.
    #[must_use]
    pub fn reward(&self, agent: &Agent) -> f32 {
        let mut reward = 0.0;
        reward += agent.stats.dmg_dealt / agent.spec.attack_damage * 0.5;
        reward += agent.stats.kills as f32 * 5.0;
        reward
    }

    /// Whether the episode has ended from this team's perspective.
    ///
    /// True when every team is wiped simultaneously, or when this team
    /// is the sole survivor.
    #[must_use]
    pub fn done(&self, team: TeamId, world: &GridWorld) -> bool {
        let wiped = world.wiped_teams();
        if wiped.iter().all(|&w| w) {
            return true;
        }
        !wiped[team] && wiped.iter().filter(|&&w| !w).count() == 1
    }

    /// Observation for one agent: relational features against every
    /// other agent, then the agent's own position and self features.
    /// Pure function of current state.
    #[must_use]
    pub fn observation(&self, agent_id: AgentId, world: &GridWorld) -> Vec<f32> {
        let mut obs = world.relational_features(agent_id);
        let pos = world.positions[agent_id];
        obs.push(pos.x);
        obs.push(pos.y);
        obs.extend_from_slice(&world.agents[agent_id].self_features());
        obs
    }

    fn member_ids(&self, world: &GridWorld) -> Vec<Vec<AgentId>> {
        world.teams.iter().map(|t| t.members.clone()).collect()
    }

    fn generate_layout(&mut self, world: &GridWorld) -> Result<(), ScenarioError> {
        let gs = world.grid_size();
        let total = world.agents_n();
        let agent_spread = gs * total as f32 / TEAM_MIXING_FACTOR;
        let team_spread = self.plans.len() as f32 * agent_spread;

        let mut generator =
            SpawnGenerator::new(world.center(), Some(gs), total, DEFAULT_MAX_TRIALS)?;
        if let Some(seed) = self.seed {
            generator = generator.with_seed(seed);
        }

        let (randomize, sigma) = match self.spawn_mode {
            SpawnMode::Packed => (false, 0.0),
            SpawnMode::Scattered { sigma } => (true, sigma),
        };
        let team_spawns = generator.generate_team_spawns(team_spread, randomize, SPAWN_BUFFER);
        let offsets = generator.generate(self.agents_per_team, randomize, agent_spread, sigma)?;

        // One formation, mirrored for the opposing team.
        for (tid, plan) in self.plans.iter().enumerate() {
            if let Some(explicit) = &plan.agent_spawns {
                self.agent_spawns[tid] = Some(explicit.clone());
                continue;
            }
            let spawn = team_spawns[tid];
            let layout = offsets
                .iter()
                .take(self.agents_per_team)
                .map(|&offset| {
                    if tid == 0 {
                        spawn + offset
                    } else {
                        spawn + (-offset)
                    }
                })
                .collect();
            self.agent_spawns[tid] = Some(layout);
        }
        self.team_spawns = Some(team_spawns);
        tracing::info!(agents = total, "spawn layout generated");
        Ok(())
    }
}

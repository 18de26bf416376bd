//! The grid world and its tick phases.
//!
//! The world owns every agent's position, the pairwise distance and
//! visibility matrices, the alive and team-affiliation vectors, and the
//! cell-occupancy index behind the free-cell predicate. All vectors are
//! index-aligned by agent id and mutually consistent after every tick.
//!
//! # Tick phases
//!
//! 1. **Decide** - callers read a consistent snapshot and record one
//!    [`Action`] per agent. Nothing mutates.
//! 2. **Apply** - [`GridWorld::apply_actions`] consumes the recorded
//!    actions in agent-id order.
//! 3. **Derive** - [`GridWorld::update`] recomputes distances,
//!    visibility and team-wipe flags.
//!
//! [`GridWorld::advance`] runs apply + derive.

use std::collections::HashMap;

use crate::components::{Action, Agent, AgentId, Team, TeamId};
use crate::error::{Result, WorldError};
use crate::math::Vec2;

/// The four legal single-step movement directions, in grid units.
///
/// Scaled by the world's grid step to produce movement deltas.
pub const STEP_DELTAS: [Vec2; 4] = [
    Vec2::new(1.0, 0.0),
    Vec2::new(-1.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(0.0, -1.0),
];

/// Discrete world state shared by all agents.
#[derive(Debug, Clone)]
pub struct GridWorld {
    /// Minimum spacing between adjacent legal positions.
    grid_size: f32,
    /// World center, the anchor for spawn placement.
    center: Vec2,
    /// All agents, indexed by id.
    pub agents: Vec<Agent>,
    /// All teams, indexed by team id.
    pub teams: Vec<Team>,
    /// Current position per agent id.
    pub positions: Vec<Vec2>,
    /// Symmetric pairwise distances; `distances[i][i] == 0`.
    pub distances: Vec<Vec<f32>>,
    /// `visibility[i][j]`: whether agent i sees agent j.
    pub visibility: Vec<Vec<bool>>,
    /// Alive flag per agent id.
    pub alive: Vec<bool>,
    /// Team id per agent id.
    pub team_affiliations: Vec<TeamId>,
    /// Occupied grid cells, keyed by cell index.
    occupancy: HashMap<(i64, i64), AgentId>,
}

impl GridWorld {
    /// Create a world over the given agents and teams.
    ///
    /// Positions start at the origin and are meaningless until agents are
    /// placed with [`GridWorld::connect`]; the occupancy index starts
    /// empty.
    #[must_use]
    pub fn new(grid_size: f32, agents: Vec<Agent>, teams: Vec<Team>) -> Self {
        let n = agents.len();
        let team_affiliations = agents.iter().map(|a| a.tid).collect();
        Self {
            grid_size,
            center: Vec2::ZERO,
            agents,
            teams,
            positions: vec![Vec2::ZERO; n],
            distances: vec![vec![0.0; n]; n],
            visibility: vec![vec![false; n]; n],
            alive: vec![true; n],
            team_affiliations,
            occupancy: HashMap::new(),
        }
    }

    /// Set the world center used as the spawn anchor.
    #[must_use]
    pub fn with_center(mut self, center: Vec2) -> Self {
        self.center = center;
        self
    }

    /// The world's grid step.
    #[must_use]
    pub fn grid_size(&self) -> f32 {
        self.grid_size
    }

    /// The world center.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.center
    }

    /// Number of agents in the world.
    #[must_use]
    pub fn agents_n(&self) -> usize {
        self.agents.len()
    }

    /// Restore per-episode runtime state for a fresh reset.
    ///
    /// Health, alive flags, stats and wipe flags return to their initial
    /// values; positions are meaningless again until agents reconnect.
    pub fn reset(&mut self) {
        for agent in &mut self.agents {
            agent.health = agent.spec.max_health;
            agent.stats = Default::default();
            agent.action = Action::none();
            agent.hit_by.clear();
        }
        for team in &mut self.teams {
            team.wiped = false;
        }
        let n = self.agents.len();
        self.positions = vec![Vec2::ZERO; n];
        self.distances = vec![vec![0.0; n]; n];
        self.visibility = vec![vec![false; n]; n];
        self.alive = vec![true; n];
        self.occupancy.clear();
    }

    fn cell_key(&self, pos: Vec2) -> (i64, i64) {
        (
            (pos.x / self.grid_size).round() as i64,
            (pos.y / self.grid_size).round() as i64,
        )
    }

    /// Whether the cell at `pos` is unoccupied.
    #[must_use]
    pub fn is_free(&self, pos: Vec2) -> bool {
        !self.occupancy.contains_key(&self.cell_key(pos))
    }

    /// The four candidate positions one legal step away from an agent.
    #[must_use]
    pub fn step_targets(&self, agent_id: AgentId) -> [Vec2; 4] {
        let pos = self.positions[agent_id];
        let gs = self.grid_size;
        [
            pos + STEP_DELTAS[0] * gs,
            pos + STEP_DELTAS[1] * gs,
            pos + STEP_DELTAS[2] * gs,
            pos + STEP_DELTAS[3] * gs,
        ]
    }

    /// Place an agent at a grid-aligned position.
    ///
    /// Used at reset to wire agents to their spawns. The previous cell,
    /// if any, is vacated.
    pub fn connect(&mut self, agent_id: AgentId, pos: Vec2) -> Result<()> {
        if agent_id >= self.agents.len() {
            return Err(WorldError::InvalidAgent(agent_id));
        }
        if !pos.is_on_grid(self.grid_size) {
            return Err(WorldError::OffGrid {
                x: pos.x,
                y: pos.y,
                grid_size: self.grid_size,
            });
        }
        let old_key = self.cell_key(self.positions[agent_id]);
        if self.occupancy.get(&old_key) == Some(&agent_id) {
            self.occupancy.remove(&old_key);
        }
        self.positions[agent_id] = pos;
        if self.alive[agent_id] {
            self.occupancy.insert(self.cell_key(pos), agent_id);
        }
        Ok(())
    }

    /// Record an action for the apply phase.
    pub fn record_action(&mut self, agent_id: AgentId, action: Action) {
        self.agents[agent_id].action = action;
    }

    /// Apply every recorded action in agent-id order.
    ///
    /// Movement into an occupied cell is discarded; the agent stays put.
    /// Attacks and heals resolve against the current distance matrix,
    /// which still reflects the snapshot the decisions were made from.
    pub fn apply_actions(&mut self) {
        for id in 0..self.agents.len() {
            if !self.alive[id] {
                continue;
            }
            let action = self.agents[id].action;
            if let Some(target) = action.target {
                self.resolve_engagement(id, target);
            } else if action.movement != Vec2::ZERO {
                self.try_move(id, action.movement);
            }
        }
    }

    /// Recompute derived state: distances, visibility, team wipes.
    pub fn update(&mut self) {
        let n = self.agents.len();
        for i in 0..n {
            self.distances[i][i] = 0.0;
            for j in (i + 1)..n {
                let d = self.positions[i].distance(self.positions[j]);
                self.distances[i][j] = d;
                self.distances[j][i] = d;
            }
        }
        for i in 0..n {
            let sight = self.agents[i].spec.sight_range as f32 * self.grid_size;
            for j in 0..n {
                self.visibility[i][j] = i != j && self.distances[i][j] <= sight;
            }
        }
        self.update_wiped_teams();
    }

    /// Apply all actions, then recompute derived state.
    pub fn advance(&mut self) {
        self.apply_actions();
        self.update();
    }

    /// Wiped flag per team id.
    #[must_use]
    pub fn wiped_teams(&self) -> Vec<bool> {
        self.teams.iter().map(|t| t.wiped).collect()
    }

    /// Relational observation features of `agent_id` against every other
    /// agent, in id order: `[dx, dy, distance, visible, alive, ally]`.
    #[must_use]
    pub fn relational_features(&self, agent_id: AgentId) -> Vec<f32> {
        let own_pos = self.positions[agent_id];
        let own_tid = self.team_affiliations[agent_id];
        let mut features = Vec::with_capacity(6 * self.agents.len().saturating_sub(1));
        for j in 0..self.agents.len() {
            if j == agent_id {
                continue;
            }
            let delta = self.positions[j] - own_pos;
            features.push(delta.x);
            features.push(delta.y);
            features.push(self.distances[agent_id][j]);
            features.push(if self.visibility[agent_id][j] { 1.0 } else { 0.0 });
            features.push(if self.alive[j] { 1.0 } else { 0.0 });
            features.push(if self.team_affiliations[j] == own_tid {
                1.0
            } else {
                0.0
            });
        }
        features
    }

    fn try_move(&mut self, id: AgentId, movement: Vec2) {
        let target = self.positions[id] + movement;
        if !self.is_free(target) {
            tracing::trace!(agent = id, "move blocked by occupied cell");
            return;
        }
        let old_key = self.cell_key(self.positions[id]);
        if self.occupancy.get(&old_key) == Some(&id) {
            self.occupancy.remove(&old_key);
        }
        self.positions[id] = target;
        self.occupancy.insert(self.cell_key(target), id);
    }

    fn resolve_engagement(&mut self, actor: AgentId, target: AgentId) {
        if target >= self.agents.len() || !self.alive[target] || target == actor {
            return;
        }
        let same_team = self.team_affiliations[actor] == self.team_affiliations[target];
        if self.agents[actor].has_heal() {
            if same_team {
                self.resolve_heal(actor, target);
            }
        } else if !same_team {
            self.resolve_attack(actor, target);
        }
    }

    fn resolve_heal(&mut self, actor: AgentId, target: AgentId) {
        let range = self.agents[actor].spec.attack_range as f32 * self.grid_size;
        if self.distances[actor][target] > range {
            return;
        }
        let heal_amount = self.agents[actor].spec.heal_amount;
        let patient = &mut self.agents[target];
        let healed = heal_amount.min(patient.spec.max_health - patient.health);
        patient.health += healed;
        let stats = &mut self.agents[actor].stats;
        stats.dmg_healed += healed;
        stats.heals_performed += 1;
    }

    fn resolve_attack(&mut self, actor: AgentId, target: AgentId) {
        let range = self.agents[actor].spec.attack_range as f32 * self.grid_size;
        if self.distances[actor][target] > range {
            return;
        }
        let damage = self.agents[actor].spec.attack_damage;
        let victim = &mut self.agents[target];
        victim.health = (victim.health - damage).max(0.0);
        if !victim.hit_by.contains(&actor) {
            victim.hit_by.push(actor);
        }
        let died = victim.is_dead();
        {
            let stats = &mut self.agents[actor].stats;
            stats.dmg_dealt += damage;
            stats.attacks_performed += 1;
        }
        if died {
            self.kill(actor, target);
        }
    }

    fn kill(&mut self, killer: AgentId, victim: AgentId) {
        self.alive[victim] = false;
        let key = self.cell_key(self.positions[victim]);
        if self.occupancy.get(&key) == Some(&victim) {
            self.occupancy.remove(&key);
        }
        self.agents[killer].stats.kills += 1;
        let contributors = self.agents[victim].hit_by.clone();
        for contributor in contributors {
            if contributor != killer {
                self.agents[contributor].stats.assists += 1;
            }
        }
        tracing::debug!(killer, victim, "agent died");
    }

    fn update_wiped_teams(&mut self) {
        for team in &mut self.teams {
            if !team.wiped && team.members.iter().all(|&m| !self.alive[m]) {
                team.wiped = true;
                tracing::info!(team = team.tid, "team wiped");
            }
        }
    }
}

//! Dense reward shaping helpers.
//!
//! Free functions over agents and teams for callers that want denser
//! signals than the scenario's sparse default. All pure.

use skirmish_core::components::{Agent, AgentId, TeamId};
use skirmish_core::world::GridWorld;

/// Flat bonus per kill in the dense stat reward.
pub const KILL_REWARD: f32 = 20.0;

/// Flat bonus per assist in the dense stat reward.
pub const ASSIST_REWARD: f32 = 5.0;

/// Sum of an agent's cumulative combat statistics, weighted.
#[must_use]
pub fn agent_stats_reward(agent: &Agent) -> f32 {
    let stats = &agent.stats;
    let mut reward = 0.0;
    reward += stats.kills as f32 * KILL_REWARD;
    reward += stats.assists as f32 * ASSIST_REWARD;
    reward += stats.dmg_dealt;
    reward += stats.dmg_healed;
    reward += stats.heals_performed as f32;
    reward += stats.attacks_performed as f32;
    reward
}

/// Stat reward summed over a whole team.
#[must_use]
pub fn team_stats_reward(world: &GridWorld, team: TeamId) -> f32 {
    world.teams[team]
        .members
        .iter()
        .map(|&m| agent_stats_reward(&world.agents[m]))
        .sum()
}

/// Remaining health as a fraction of maximum.
#[must_use]
pub fn agent_health_reward(agent: &Agent) -> f32 {
    agent.health / agent.spec.max_health
}

/// Health reward summed over a whole team.
#[must_use]
pub fn team_health_reward(world: &GridWorld, team: TeamId) -> f32 {
    world.teams[team]
        .members
        .iter()
        .map(|&m| agent_health_reward(&world.agents[m]))
        .sum()
}

/// Distance between two agents, for proximity shaping terms.
#[must_use]
pub fn distance_reward(world: &GridWorld, agent: AgentId, other: AgentId) -> f32 {
    world.distances[agent][other]
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::components::{TeamColor, UnitSpec};

    #[test]
    fn test_agent_stats_reward_weights() {
        let mut agent = Agent::new(0, 0, TeamColor::default(), UnitSpec::attacker());
        agent.stats.kills = 1;
        agent.stats.assists = 2;
        agent.stats.dmg_dealt = 30.0;
        agent.stats.attacks_performed = 3;

        // 20 + 10 + 30 + 3
        assert_eq!(agent_stats_reward(&agent), 63.0);
    }

    #[test]
    fn test_health_reward_fraction() {
        let mut agent = Agent::new(0, 0, TeamColor::default(), UnitSpec::attacker());
        agent.health = 25.0;
        assert_eq!(agent_health_reward(&agent), 0.25);
    }
}

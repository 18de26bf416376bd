//! Scripted decision policies for non-learning agents.
//!
//! A policy computes exactly one [`Action`] per invocation for one
//! agent, reading a consistent world snapshot. The only mutation is the
//! masked-distance scratch vector cached on the policy instance for the
//! duration of the call, and the RNG driving the collision fallback.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use skirmish_core::components::{Action, Agent, AgentId};
use skirmish_core::math::{signum_or_zero, Vec2};
use skirmish_core::world::GridWorld;

/// Capability for per-team scripted behavior.
///
/// Concrete strategies are selected per team at scenario construction.
pub trait DecisionPolicy {
    /// Decide one action for `agent` against the current snapshot.
    fn act(&mut self, agent: &Agent, world: &GridWorld) -> Action;
}

/// The default scripted behavior: engage the closest eligible agent.
///
/// Healers act on living teammates, everyone else on living enemies. If
/// the chosen target is within sight the action is an attack; otherwise
/// the agent takes one grid step toward it along the dominant axis,
/// falling back to a uniformly random free neighbor when that cell is
/// occupied, and to standing still when no neighbor is free. The random
/// fallback is the only nondeterminism.
#[derive(Debug)]
pub struct BasicPolicy {
    rng: StdRng,
    /// Masked-distance scratch, valid for the duration of one act() call.
    masked: Vec<f32>,
}

impl BasicPolicy {
    /// Create a policy with an entropy-seeded fallback RNG.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            masked: Vec::new(),
        }
    }

    /// Create a policy with a seeded fallback RNG for reproducible runs.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            masked: Vec::new(),
        }
    }

    /// Copy the agent's distance row and force ineligible entries to
    /// +infinity: self, the dead, and the wrong affiliation for the
    /// agent's role.
    fn mask_distances(&mut self, agent: &Agent, world: &GridWorld) {
        self.masked.clear();
        self.masked.extend_from_slice(&world.distances[agent.id]);
        for j in 0..self.masked.len() {
            let affiliation_ok = if agent.has_heal() {
                world.team_affiliations[j] == agent.tid
            } else {
                world.team_affiliations[j] != agent.tid
            };
            if j == agent.id || !world.alive[j] || !affiliation_ok {
                self.masked[j] = f32::INFINITY;
            }
        }
    }

    /// Minimum-distance entry of the mask, ties broken by lowest id.
    fn closest_target(&self) -> Option<(AgentId, f32)> {
        let mut best: Option<(AgentId, f32)> = None;
        for (j, &d) in self.masked.iter().enumerate() {
            if d.is_finite() && best.map_or(true, |(_, bd)| d < bd) {
                best = Some((j, d));
            }
        }
        best
    }
}

impl Default for BasicPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionPolicy for BasicPolicy {
    fn act(&mut self, agent: &Agent, world: &GridWorld) -> Action {
        self.mask_distances(agent, world);
        let Some((target_id, distance)) = self.closest_target() else {
            // Nothing eligible anywhere: defined no-op, not an error.
            return Action::none();
        };

        let gs = world.grid_size();
        if distance <= agent.spec.sight_range as f32 * gs {
            return Action::attack(target_id);
        }

        // Step toward the target along the dominant axis; ties favor x.
        let diff = world.positions[target_id] - world.positions[agent.id];
        let movement = if diff.x.abs() >= diff.y.abs() {
            Vec2::new(signum_or_zero(diff.x) * gs, 0.0)
        } else {
            Vec2::new(0.0, signum_or_zero(diff.y) * gs)
        };

        let destination = world.positions[agent.id] + movement;
        if world.is_free(destination) {
            return Action::step(movement);
        }

        // Direct step blocked: pick uniformly among free neighbors.
        let position = world.positions[agent.id];
        let free: Vec<Vec2> = world
            .step_targets(agent.id)
            .into_iter()
            .filter(|&p| world.is_free(p))
            .collect();
        match free.choose(&mut self.rng) {
            Some(&p) => Action::step(p - position),
            None => Action::none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_test_utils::fixtures::{medic, scout, set_distances, two_teams, world_2v2};
    use skirmish_test_utils::proptest::prelude::*;

    /// Canned matrix: agent 3 is one unit from everyone, agents 0..2 are
    /// further apart. With sight x grid = 2, agent 0 can attack agent 3.
    const MATRIX: [[f32; 4]; 4] = [
        [0.0, 3.0, 2.0, 1.0],
        [3.0, 0.0, 2.0, 1.0],
        [3.0, 2.0, 0.0, 1.0],
        [1.0, 1.0, 1.0, 0.0],
    ];

    fn canned_world() -> skirmish_core::world::GridWorld {
        let mut world = world_2v2(1.0);
        let rows: Vec<&[f32]> = MATRIX.iter().map(|r| r.as_slice()).collect();
        set_distances(&mut world, &rows);
        world
    }

    #[test]
    fn test_agent_0_attacks_agent_3() {
        let world = canned_world();
        let mut policy = BasicPolicy::with_seed(0);
        let action = policy.act(&world.agents[0], &world);
        assert_eq!(action.target, Some(3));
        assert_eq!(action.movement, Vec2::ZERO);
        assert_eq!(action.as_array(), [0.0, 0.0, 3.0]);
    }

    #[test]
    fn test_agent_1_attacks_agent_3() {
        let world = canned_world();
        let mut policy = BasicPolicy::with_seed(0);
        let action = policy.act(&world.agents[1], &world);
        assert_eq!(action.target, Some(3));
    }

    #[test]
    fn test_agent_2_attacks_agent_1() {
        let world = canned_world();
        let mut policy = BasicPolicy::with_seed(0);
        let action = policy.act(&world.agents[2], &world);
        assert_eq!(action.target, Some(1));
    }

    #[test]
    fn test_agent_3_tie_breaks_to_lowest_id() {
        // Agents 0 and 1 are both at distance 1 from agent 3.
        let world = canned_world();
        let mut policy = BasicPolicy::with_seed(0);
        let action = policy.act(&world.agents[3], &world);
        assert_eq!(action.target, Some(0));
    }

    #[test]
    fn test_repeated_evaluation_idempotent() {
        let world = canned_world();
        let mut policy = BasicPolicy::with_seed(0);
        let first = policy.act(&world.agents[0], &world);
        for _ in 0..10 {
            assert_eq!(policy.act(&world.agents[0], &world), first);
        }
    }

    #[test]
    fn test_out_of_sight_moves_on_dominant_axis() {
        let mut world = world_2v2(1.0);
        // Move agent 3 away so the step toward it is unobstructed.
        world.connect(3, Vec2::new(5.0, 5.0)).unwrap();
        let rows: Vec<Vec<f32>> = vec![
            vec![0.0, 3.0, 2.0, 1.0],
            vec![3.0, 0.0, 2.0, 1.0],
            vec![3.0, 2.0, 0.0, 1.0],
            vec![4.0, 3.0, 1.0, 0.0],
        ];
        let refs: Vec<&[f32]> = rows.iter().map(|r| r.as_slice()).collect();
        set_distances(&mut world, &refs);

        // Agent 3's closest enemy is agent 1 at distance 3 > sight 2.
        let mut policy = BasicPolicy::with_seed(0);
        let action = policy.act(&world.agents[3], &world);
        assert_eq!(action.target, None);
        // Displacement (0,1)-(5,5) = (-5,-4): dominant axis is x, negative.
        assert_eq!(action.movement, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_axis_tie_favors_x() {
        let mut world = world_2v2(1.0);
        world.connect(0, Vec2::new(0.0, 0.0)).unwrap();
        world.connect(3, Vec2::new(4.0, 4.0)).unwrap();
        let rows: Vec<Vec<f32>> = vec![
            vec![0.0, f32::INFINITY, f32::INFINITY, 5.6],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![5.6, 0.0, 0.0, 0.0],
        ];
        let refs: Vec<&[f32]> = rows.iter().map(|r| r.as_slice()).collect();
        set_distances(&mut world, &refs);

        let mut policy = BasicPolicy::with_seed(0);
        let action = policy.act(&world.agents[0], &world);
        // |dx| == |dy|: the horizontal axis wins.
        assert_eq!(action.movement, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_healer_targets_only_living_teammates() {
        let world = two_teams(&[scout(), medic()], &[scout(), scout()], 1.0);
        let mut policy = BasicPolicy::with_seed(0);
        // Healer is agent 1; its only eligible target is teammate 0,
        // one unit away in the column layout.
        let action = policy.act(&world.agents[1], &world);
        assert_eq!(action.target, Some(0));
    }

    #[test]
    fn test_healer_with_dead_teammate_noops() {
        let mut world = two_teams(&[scout(), medic()], &[scout(), scout()], 1.0);
        world.alive[0] = false;
        let mut policy = BasicPolicy::with_seed(0);
        let action = policy.act(&world.agents[1], &world);
        assert_eq!(action, Action::none());
    }

    #[test]
    fn test_attacker_with_all_enemies_dead_noops() {
        let mut world = world_2v2(1.0);
        world.alive[2] = false;
        world.alive[3] = false;
        let mut policy = BasicPolicy::with_seed(0);
        let action = policy.act(&world.agents[0], &world);
        assert_eq!(action, Action::none());
    }

    #[test]
    fn test_self_never_targeted() {
        // Agent 0's own entry is zero, the minimum of the raw row; the
        // mask must exclude it and pick a real target instead.
        let world = canned_world();
        let mut policy = BasicPolicy::with_seed(0);
        for agent in &world.agents {
            let action = policy.act(agent, &world);
            assert_ne!(action.target, Some(agent.id));
        }
    }

    #[test]
    fn test_blocked_step_falls_back_to_free_neighbor() {
        let mut world = world_2v2(1.0);
        // Column layout: agent 0 at (0,0), agent 1 directly above at
        // (0,1). Target agent 2 is further up, so the direct step (0,1)
        // is occupied by the teammate.
        let rows: Vec<Vec<f32>> = vec![
            vec![0.0, f32::INFINITY, 5.0, 9.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0],
        ];
        let refs: Vec<&[f32]> = rows.iter().map(|r| r.as_slice()).collect();
        set_distances(&mut world, &refs);

        let blocked = Vec2::new(0.0, 1.0);
        let mut policy = BasicPolicy::with_seed(11);
        for _ in 0..20 {
            let action = policy.act(&world.agents[0], &world);
            assert_eq!(action.target, None);
            assert_ne!(action.movement, blocked);
            assert_ne!(action.movement, Vec2::ZERO);
            let landing = world.positions[0] + action.movement;
            assert!(world.is_free(landing));
        }
    }

    #[test]
    fn test_fully_surrounded_agent_stands_still() {
        // Agent 0 in the middle of a plus shape of enemies; the target
        // is out of sight so it wants to move, but no neighbor is free.
        let specs_b = vec![scout(), scout(), scout(), scout(), scout()];
        let mut world = two_teams(&[scout()], &specs_b, 1.0);
        world.connect(0, Vec2::new(0.0, 0.0)).unwrap();
        world.connect(1, Vec2::new(0.0, 2.0)).unwrap();
        world.connect(2, Vec2::new(0.0, 1.0)).unwrap();
        world.connect(3, Vec2::new(1.0, 0.0)).unwrap();
        world.connect(4, Vec2::new(-1.0, 0.0)).unwrap();
        world.connect(5, Vec2::new(0.0, -1.0)).unwrap();
        let rows: Vec<Vec<f32>> = vec![
            vec![0.0, 5.0, 6.0, 6.0, 6.0, 6.0],
            vec![5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            vec![6.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            vec![6.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            vec![6.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            vec![6.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ];
        let refs: Vec<&[f32]> = rows.iter().map(|r| r.as_slice()).collect();
        set_distances(&mut world, &refs);

        let mut policy = BasicPolicy::with_seed(0);
        let action = policy.act(&world.agents[0], &world);
        assert_eq!(action, Action::none());
    }

    proptest! {
        /// The chosen target is always the minimum-distance eligible
        /// candidate, and a no-op is emitted exactly when nothing is
        /// eligible.
        #[test]
        fn prop_target_is_minimum_eligible(
            row in proptest::collection::vec(1.0f32..100.0, 4),
            alive in proptest::collection::vec(any::<bool>(), 4),
        ) {
            let mut world = world_2v2(1.0);
            let mut matrix = vec![vec![0.0; 4]; 4];
            matrix[0].clone_from(&row);
            matrix[0][0] = 0.0;
            let refs: Vec<&[f32]> = matrix.iter().map(|r| r.as_slice()).collect();
            set_distances(&mut world, &refs);
            world.alive.clone_from(&alive);
            world.alive[0] = true;

            let mut policy = BasicPolicy::with_seed(0);
            let action = policy.act(&world.agents[0], &world);

            // Eligible candidates for attacker 0: living members of team 1.
            let eligible: Vec<usize> = (2..4).filter(|&j| alive[j]).collect();
            match action.target {
                Some(t) => {
                    prop_assert!(eligible.contains(&t));
                    for &j in &eligible {
                        prop_assert!(world.distances[0][t] <= world.distances[0][j]);
                    }
                }
                None => {
                    // Either nothing eligible, or the closest eligible
                    // target is out of sight and the agent moved.
                    if eligible.is_empty() {
                        prop_assert_eq!(action, Action::none());
                    } else {
                        prop_assert!(action.movement != Vec2::ZERO || action == Action::none());
                    }
                }
            }
        }
    }
}

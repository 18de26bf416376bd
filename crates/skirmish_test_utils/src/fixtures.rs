//! Test fixtures and helpers.
//!
//! Pre-built worlds and unit specs for consistent testing across crates.

use skirmish_core::components::{team_palette, Agent, AgentId, Team, UnitSpec};
use skirmish_core::math::Vec2;
use skirmish_core::world::GridWorld;

/// A short-sighted attacker: sight 2 cells, attack range 1 cell.
#[must_use]
pub fn scout() -> UnitSpec {
    UnitSpec {
        sight_range: 2,
        attack_range: 1,
        ..UnitSpec::attacker()
    }
}

/// A short-sighted healer with the same ranges as [`scout`].
#[must_use]
pub fn medic() -> UnitSpec {
    UnitSpec {
        sight_range: 2,
        attack_range: 1,
        ..UnitSpec::healer()
    }
}

/// Build a two-team world from explicit unit specs.
///
/// Agents get global sequential ids (team A first) and are placed in a
/// single column, agent i at `(0, i * grid_size)`, with derived state
/// computed.
#[must_use]
pub fn two_teams(team_a: &[UnitSpec], team_b: &[UnitSpec], grid_size: f32) -> GridWorld {
    let colors = team_palette(2);
    let mut agents = Vec::new();
    let mut teams = Vec::new();
    let mut next_id: AgentId = 0;
    for (tid, specs) in [team_a, team_b].into_iter().enumerate() {
        let members: Vec<AgentId> = (next_id..next_id + specs.len()).collect();
        for (&id, &spec) in members.iter().zip(specs) {
            agents.push(Agent::new(id, tid, colors[tid], spec));
        }
        next_id += specs.len();
        teams.push(Team::new(tid, members, true));
    }
    let mut world = GridWorld::new(grid_size, agents, teams);
    for id in 0..world.agents_n() {
        let pos = Vec2::new(0.0, id as f32 * grid_size);
        world.connect(id, pos).expect("fixture agent id is valid");
    }
    world.update();
    world
}

/// A 2v2 world of [`scout`]s in a column.
#[must_use]
pub fn world_2v2(grid_size: f32) -> GridWorld {
    two_teams(&[scout(), scout()], &[scout(), scout()], grid_size)
}

/// Overwrite the world's distance matrix with a canned one.
///
/// Lets targeting tests pin exact distances independently of positions.
pub fn set_distances(world: &mut GridWorld, rows: &[&[f32]]) {
    world.distances = rows.iter().map(|r| r.to_vec()).collect();
}

//! Agent, team and action definitions.
//!
//! Components are pure data with no behavior beyond small accessors.
//! All simulation rules live in [`crate::world`].

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Unique identifier for agents, global across teams.
pub type AgentId = usize;

/// Unique identifier for teams.
pub type TeamId = usize;

/// Combat role of a unit.
///
/// The role drives target masking: healers act on living teammates,
/// attackers on living enemies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    /// Deals damage to enemies.
    #[default]
    Attacker,
    /// Restores health to teammates.
    Healer,
}

/// Static stats a unit is constructed with.
///
/// Supplied by the match build plan; consumed once at agent construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    /// Combat role.
    pub role: Role,
    /// Damage dealt per attack.
    pub attack_damage: f32,
    /// Health restored per heal.
    pub heal_amount: f32,
    /// Sight range in grid cells.
    pub sight_range: u32,
    /// Attack range in grid cells.
    pub attack_range: u32,
    /// Maximum health.
    pub max_health: f32,
}

impl UnitSpec {
    /// A standard line attacker.
    #[must_use]
    pub const fn attacker() -> Self {
        Self {
            role: Role::Attacker,
            attack_damage: 10.0,
            heal_amount: 0.0,
            sight_range: 4,
            attack_range: 4,
            max_health: 100.0,
        }
    }

    /// A standard healer.
    #[must_use]
    pub const fn healer() -> Self {
        Self {
            role: Role::Healer,
            attack_damage: 5.0,
            heal_amount: 8.0,
            sight_range: 5,
            attack_range: 5,
            max_health: 80.0,
        }
    }

    /// Whether this unit heals instead of attacking.
    #[must_use]
    pub const fn can_heal(&self) -> bool {
        matches!(self.role, Role::Healer)
    }
}

impl Default for UnitSpec {
    fn default() -> Self {
        Self::attacker()
    }
}

/// Cumulative per-episode combat statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CombatStats {
    /// Total damage dealt to enemies.
    pub dmg_dealt: f32,
    /// Total health restored to teammates.
    pub dmg_healed: f32,
    /// Enemies this agent landed the killing blow on.
    pub kills: u32,
    /// Enemies this agent damaged that someone else killed.
    pub assists: u32,
    /// Attacks that connected.
    pub attacks_performed: u32,
    /// Heals that connected.
    pub heals_performed: u32,
}

/// A per-agent command for one tick.
///
/// Movement is either zero or exactly one cardinal step scaled by the
/// world's grid step. The target is `None` (no attack) or an agent id.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Action {
    /// Movement delta for this tick.
    pub movement: Vec2,
    /// Agent to attack or heal, if any.
    pub target: Option<AgentId>,
}

impl Action {
    /// The no-op action: zero movement, no target.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            movement: Vec2::ZERO,
            target: None,
        }
    }

    /// An attack (or heal) on the given agent, with zero movement.
    #[must_use]
    pub const fn attack(target: AgentId) -> Self {
        Self {
            movement: Vec2::ZERO,
            target: Some(target),
        }
    }

    /// A pure movement action.
    #[must_use]
    pub const fn step(movement: Vec2) -> Self {
        Self {
            movement,
            target: None,
        }
    }

    /// Whether this action attacks (or heals) a target.
    #[must_use]
    pub const fn is_attack(&self) -> bool {
        self.target.is_some()
    }

    /// Encode as `[dx, dy, target]` with -1 for "no target".
    ///
    /// This is the fixed-size layout consumed by external wrappers.
    #[must_use]
    pub fn as_array(&self) -> [f32; 3] {
        let target = match self.target {
            Some(id) => id as f32,
            None => -1.0,
        };
        [self.movement.x, self.movement.y, target]
    }
}

/// RGB color assigned to a team for presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TeamColor {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

/// Generate `n` visually distinct team colors from evenly spaced hues.
#[must_use]
pub fn team_palette(n: usize) -> Vec<TeamColor> {
    (0..n)
        .map(|i| {
            let hue = i as f32 / n.max(1) as f32;
            hsv_to_rgb(hue, 0.75, 0.9)
        })
        .collect()
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> TeamColor {
    let i = (h * 6.0).floor();
    let f = h * 6.0 - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);
    let (r, g, b) = match (i as i32).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    TeamColor {
        r: (r * 255.0) as u8,
        g: (g * 255.0) as u8,
        b: (b * 255.0) as u8,
    }
}

/// A combat unit in the world.
///
/// Agents keep their id for the whole episode; the world's positional
/// vectors are indexed by it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Global agent id.
    pub id: AgentId,
    /// Owning team.
    pub tid: TeamId,
    /// Team color.
    pub color: TeamColor,
    /// Static unit stats from the build plan.
    pub spec: UnitSpec,
    /// Current health; the agent dies at zero.
    pub health: f32,
    /// Cumulative combat statistics.
    pub stats: CombatStats,
    /// Last action recorded for the apply phase.
    pub action: Action,
    /// Enemies that have damaged this agent, for assist attribution.
    pub hit_by: Vec<AgentId>,
}

impl Agent {
    /// Create an agent from a build-plan spec at full health.
    #[must_use]
    pub fn new(id: AgentId, tid: TeamId, color: TeamColor, spec: UnitSpec) -> Self {
        Self {
            id,
            tid,
            color,
            spec,
            health: spec.max_health,
            stats: CombatStats::default(),
            action: Action::none(),
            hit_by: Vec::new(),
        }
    }

    /// Whether this agent heals instead of attacking.
    #[must_use]
    pub const fn has_heal(&self) -> bool {
        self.spec.can_heal()
    }

    /// Whether this agent is dead.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Self-descriptive observation features; callers append the
    /// position, which the world owns.
    #[must_use]
    pub fn self_features(&self) -> [f32; 2] {
        [
            self.health / self.spec.max_health,
            if self.has_heal() { 1.0 } else { 0.0 },
        ]
    }
}

/// An ordered group of agents fighting together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    /// Team id.
    pub tid: TeamId,
    /// Member agent ids in build-plan order.
    pub members: Vec<AgentId>,
    /// Whether members are driven by a scripted policy.
    pub is_scripted: bool,
    /// True once every member is dead. Monotone for the episode.
    pub wiped: bool,
}

impl Team {
    /// Create a team over the given members.
    #[must_use]
    pub fn new(tid: TeamId, members: Vec<AgentId>, is_scripted: bool) -> Self {
        Self {
            tid,
            members,
            is_scripted,
            wiped: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_array_encoding() {
        let noop = Action::none();
        assert_eq!(noop.as_array(), [0.0, 0.0, -1.0]);

        let attack = Action::attack(3);
        assert_eq!(attack.as_array(), [0.0, 0.0, 3.0]);
        assert!(attack.is_attack());

        let step = Action::step(Vec2::new(0.0, -10.0));
        assert_eq!(step.as_array(), [0.0, -10.0, -1.0]);
        assert!(!step.is_attack());
    }

    #[test]
    fn test_palette_distinct() {
        let colors = team_palette(4);
        assert_eq!(colors.len(), 4);
        for i in 0..colors.len() {
            for j in (i + 1)..colors.len() {
                assert_ne!(colors[i], colors[j]);
            }
        }
    }

    #[test]
    fn test_healer_spec() {
        let healer = UnitSpec::healer();
        assert!(healer.can_heal());
        assert!(!UnitSpec::attacker().can_heal());
    }

    #[test]
    fn test_agent_starts_at_full_health() {
        let agent = Agent::new(0, 0, TeamColor::default(), UnitSpec::attacker());
        assert_eq!(agent.health, agent.spec.max_health);
        assert!(!agent.is_dead());
    }
}

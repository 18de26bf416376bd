//! Collision-aware spawn position generation.
//!
//! Produces unique, grid-aligned coordinates for two opposing teams and
//! their members, in one of two modes:
//!
//! - **Packed**: a deterministic near-square box per team, the two boxes
//!   offset symmetrically from the world center so they cannot overlap.
//! - **Scattered**: polar sampling around the team spawn (uniform angle,
//!   gaussian radius) with rejection of reused grid cells, capped by
//!   `max_trials` consecutive rejections per point.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use thiserror::Error;

use skirmish_core::math::Vec2;

/// Error type for spawn generation.
#[derive(Error, Debug)]
pub enum SpawnError {
    /// The rejection loop ran out of trials; the configuration does not
    /// fit (too many agents, too little spread). Not retried internally.
    #[error(
        "Maximum trials per point reached ({max_trials}); \
         try generating with more variance allowed"
    )]
    CapacityExceeded {
        /// The configured trial cap that was exhausted.
        max_trials: u32,
    },

    /// Off-grid (continuous) placement was requested.
    #[error("Generating spawns outside of the world grid (continuous) is not yet implemented")]
    ContinuousUnsupported,

    /// The scatter distribution parameters were rejected.
    #[error("Invalid scatter distribution: {0}")]
    BadDistribution(String),
}

/// Default cap on consecutive rejected draws per point.
pub const DEFAULT_MAX_TRIALS: u32 = 50;

/// Compute the smallest near-square box (width, height) holding `n`
/// agents on lattice points.
///
/// Perfect squares pack exactly; odd non-square counts are rounded up to
/// even before the divisor search, which starts at `⌊√n + 0.5⌋` and
/// walks downward until it divides evenly. Pure: the same `n` always
/// yields the same box.
#[must_use]
pub fn team_box(n: usize) -> (usize, usize) {
    if n == 0 {
        return (0, 0);
    }
    let root = (n as f64).sqrt().round() as usize;
    if root * root == n {
        return (root, root);
    }
    let m = if n % 2 == 1 { n + 1 } else { n };
    let mut i = ((m as f64).sqrt() + 0.5) as usize;
    while m % i != 0 {
        i -= 1;
    }
    (i, m / i)
}

/// Generator producing collision-free spawns for two teams.
///
/// Team spawns come first; per-agent offsets are generated relative to
/// them. Points already used within a call are redrawn, up to
/// `max_trials` consecutive attempts.
#[derive(Debug)]
pub struct SpawnGenerator {
    center: Vec2,
    grid_size: f32,
    agents_per_team: usize,
    max_trials: u32,
    trials: u32,
    used: Vec<Vec2>,
    team_spawns: Vec<Vec2>,
    rng: StdRng,
}

impl SpawnGenerator {
    /// Create a generator around `center` for `n_agents` agents total.
    ///
    /// `grid_size` is required: `None` (continuous placement) is the
    /// fatal [`SpawnError::ContinuousUnsupported`] error.
    pub fn new(
        center: Vec2,
        grid_size: Option<f32>,
        n_agents: usize,
        max_trials: u32,
    ) -> Result<Self, SpawnError> {
        let Some(grid_size) = grid_size else {
            return Err(SpawnError::ContinuousUnsupported);
        };
        Ok(Self {
            center,
            grid_size,
            agents_per_team: n_agents / 2,
            max_trials,
            trials: 0,
            used: Vec::new(),
            team_spawns: Vec::new(),
            rng: StdRng::from_entropy(),
        })
    }

    /// Replace the RNG with a seeded one for reproducible layouts.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Generate the two opposing team spawns.
    ///
    /// Deterministic mode offsets both teams symmetrically left/right of
    /// the center by `(box_width + buffer) * grid_size`, which cannot
    /// overlap. Randomized mode samples a uniform angle on a circle of
    /// the given radius and snaps both points onto the grid.
    pub fn generate_team_spawns(&mut self, radius: f32, randomize: bool, buffer: u32) -> Vec<Vec2> {
        if randomize {
            let theta = self.rng.gen_range(0.0..std::f32::consts::TAU);
            let offset = Vec2::new(radius * theta.cos(), radius * theta.sin());
            self.team_spawns = vec![
                (self.center + offset).snap_to_grid(self.grid_size),
                (self.center - offset).snap_to_grid(self.grid_size),
            ];
        } else {
            let (w, _) = team_box(self.agents_per_team);
            let displacement = (w + buffer as usize) as f32 * self.grid_size;
            self.team_spawns = vec![
                self.center + Vec2::new(displacement, 0.0),
                self.center - Vec2::new(displacement, 0.0),
            ];
        }
        tracing::debug!(spawns = ?self.team_spawns, randomize, "team spawns generated");
        self.team_spawns.clone()
    }

    /// Generate per-agent spawn offsets relative to a team spawn.
    ///
    /// Deterministic mode returns **every** lattice point of the team
    /// box in row-major order, width stepped first; callers take the
    /// first `n`. Randomized mode draws polar points (uniform angle,
    /// `Normal(mean_radius, sigma_radius)` radius), snapped to the grid;
    /// a point already used in this call is redrawn up to `max_trials`
    /// consecutive times before [`SpawnError::CapacityExceeded`].
    pub fn generate(
        &mut self,
        n: usize,
        randomize: bool,
        mean_radius: f32,
        sigma_radius: f32,
    ) -> Result<Vec<Vec2>, SpawnError> {
        if !randomize {
            let (w, h) = team_box(n);
            let gs = self.grid_size;
            let mut points = Vec::with_capacity(w * h);
            for i in 0..w {
                for j in 0..h {
                    points.push(Vec2::new(i as f32 * gs, j as f32 * gs));
                }
            }
            return Ok(points);
        }

        let radius = Normal::new(mean_radius, sigma_radius)
            .map_err(|e| SpawnError::BadDistribution(e.to_string()))?;
        self.used.clear();
        self.trials = 0;
        let mut points = Vec::with_capacity(n);
        for _ in 0..n {
            let mut point = self.scatter_point(&radius);
            while self.used.contains(&point) {
                if self.trials >= self.max_trials {
                    return Err(SpawnError::CapacityExceeded {
                        max_trials: self.max_trials,
                    });
                }
                point = self.scatter_point(&radius);
                self.trials += 1;
            }
            self.used.push(point);
            self.trials = 0;
            points.push(point);
        }
        Ok(points)
    }

    /// Drop the used-point record and cached team spawns.
    pub fn clear(&mut self) {
        self.used.clear();
        self.team_spawns.clear();
        self.trials = 0;
    }

    fn scatter_point(&mut self, radius: &Normal<f32>) -> Vec2 {
        let theta = self.rng.gen_range(0.0..std::f32::consts::TAU);
        let r = radius.sample(&mut self.rng);
        Vec2::new(r * theta.cos(), r * theta.sin()).snap_to_grid(self.grid_size)
    }
}

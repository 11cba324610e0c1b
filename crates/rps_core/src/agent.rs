//! Agents: state, motion and steering.
//!
//! One [`Agent`] type covers all three kinds; behavior differences are
//! data (the per-kind [`KindProfile`]) plus the dominance cycle on
//! [`Kind`].
//!
//! # Steering
//!
//! Hunting is global and one-sided. Every tick an agent with steering
//! looks at every other living agent, picks the nearest one it beats and
//! applies a seek force toward it. Agents never react to being hunted.
//! An agent with nothing left to hunt coasts to a stop.

use serde::{Deserialize, Serialize};

use crate::config::{BoundaryMode, Config, KindProfile, Rgb};
use crate::kind::{Kind, Outcome};
use crate::math::Vec2;
use crate::rng::{random_heading, uniform, SimRng};

/// Unique identifier for agents. Never reused within a world.
pub type AgentId = u64;

/// Velocity multiplier applied each tick while no prey exists.
pub const IDLE_DAMPING: f32 = 0.95;

/// Speed below which an idle agent snaps to a full stop.
pub const STOP_SPEED: f32 = 1.0;

/// Steering force cap as a fraction of top speed.
pub const MAX_FORCE_RATIO: f32 = 0.1;

/// Below this squared center distance two agents count as coincident.
pub const COINCIDENT_DISTANCE_SQ: f32 = 0.01;

/// A mobile entity of one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique identifier.
    pub id: AgentId,
    /// Dominance class, fixed for life.
    pub kind: Kind,
    /// Display name, unique per kind within the session.
    pub name: String,
    /// Center position.
    pub position: Vec2,
    /// Velocity in units per second.
    pub velocity: Vec2,
    /// Collision radius.
    pub radius: f32,
    /// Draw color.
    pub color: Rgb,
    /// Speed cap, fixed at creation.
    pub max_speed: f32,
    /// Steering force cap.
    pub max_force: f32,
    /// False once defeated. Dead agents are inert.
    pub alive: bool,
    /// Collisions won.
    pub kills: u32,
    /// Tick of the last resolved collision, if any.
    pub last_collision_tick: Option<u64>,
    /// Prey currently being chased.
    pub target: Option<AgentId>,
}

/// Read-only view of the rest of the population during an update.
///
/// The world updates agents in place, one at a time, so the view is the
/// agent storage split around the agent being updated. Agents earlier in
/// storage have already moved this tick.
#[derive(Debug, Clone, Copy)]
pub struct Population<'a> {
    before: &'a [Agent],
    after: &'a [Agent],
}

impl<'a> Population<'a> {
    /// View over a single slice.
    #[must_use]
    pub fn new(agents: &'a [Agent]) -> Self {
        Self {
            before: agents,
            after: &[],
        }
    }

    /// View over the storage on either side of the agent being updated.
    #[must_use]
    pub fn split(before: &'a [Agent], after: &'a [Agent]) -> Self {
        Self { before, after }
    }

    /// Iterate in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Agent> {
        self.before.iter().chain(self.after.iter())
    }
}

impl Agent {
    /// Create a live agent.
    ///
    /// Without an initial velocity the agent gets a random heading and a
    /// speed drawn from the kind's range, and that speed becomes its cap.
    /// With one, the cap is the given velocity's magnitude (or a drawn
    /// speed if it is zero).
    pub fn new(
        id: AgentId,
        kind: Kind,
        name: String,
        position: Vec2,
        velocity: Option<Vec2>,
        profile: &KindProfile,
        rng: &mut SimRng,
    ) -> Self {
        let draw_speed = |rng: &mut SimRng| uniform(rng, profile.speed.min, profile.speed.max);

        let (velocity, max_speed) = match velocity {
            None => {
                let heading = random_heading(rng);
                let speed = draw_speed(rng);
                (heading * speed, speed)
            }
            Some(v) => {
                let len = v.length();
                let max_speed = if len > 0.0 { len } else { draw_speed(rng) };
                (v, max_speed)
            }
        };

        Self {
            id,
            kind,
            name,
            position,
            velocity,
            radius: profile.radius,
            color: profile.color,
            max_speed,
            max_force: max_speed * MAX_FORCE_RATIO,
            alive: true,
            kills: 0,
            last_collision_tick: None,
            target: None,
        }
    }

    /// Advance one tick.
    ///
    /// Steering runs only when a population view is supplied; the world
    /// passes `None` while steering is switched off.
    pub fn update(&mut self, dt: f32, population: Option<Population<'_>>, config: &Config) {
        if !self.alive {
            return;
        }

        if let Some(population) = population {
            self.steer(population);
        }

        self.velocity = self.velocity.clamp_length(self.max_speed);
        self.position += self.velocity * dt;

        match config.boundary {
            BoundaryMode::Wrap => self.wrap(config.width, config.height),
            BoundaryMode::Bounce => self.bounce(config.width, config.height),
        }
    }

    fn steer(&mut self, population: Population<'_>) {
        let mut nearest: Option<(&Agent, f32)> = None;

        for other in population.iter() {
            if !other.alive || other.id == self.id || !self.kind.beats(other.kind) {
                continue;
            }
            let dist_sq = self.position.distance_squared(other.position);
            // Strict comparison keeps the first of equally distant prey
            if nearest.map_or(true, |(_, best)| dist_sq < best) {
                nearest = Some((other, dist_sq));
            }
        }

        let Some((prey, _)) = nearest else {
            self.target = None;
            self.velocity *= IDLE_DAMPING;
            if self.velocity.length() < STOP_SPEED {
                self.velocity = Vec2::ZERO;
            }
            return;
        };

        self.target = Some(prey.id);
        let force = self.seek(prey.position).clamp_length(self.max_force);
        self.velocity += force;
    }

    /// Steering force toward `target`: desired velocity minus current.
    fn seek(&self, target: Vec2) -> Vec2 {
        let desired = target - self.position;
        if desired.length_squared() == 0.0 {
            return Vec2::ZERO;
        }
        desired.scale_to_length(self.max_speed) - self.velocity
    }

    fn wrap(&mut self, width: f32, height: f32) {
        self.position.x = wrap_axis(self.position.x, width);
        self.position.y = wrap_axis(self.position.y, height);
    }

    fn bounce(&mut self, width: f32, height: f32) {
        let r = self.radius;

        if self.position.x - r < 0.0 {
            self.position.x = r;
            self.velocity.x = self.velocity.x.abs();
        } else if self.position.x + r >= width {
            self.position.x = width - r;
            self.velocity.x = -self.velocity.x.abs();
        }

        if self.position.y - r < 0.0 {
            self.position.y = r;
            self.velocity.y = self.velocity.y.abs();
        } else if self.position.y + r >= height {
            self.position.y = height - r;
            self.velocity.y = -self.velocity.y.abs();
        }
    }

    /// Whether both agents are alive and their bodies touch or overlap.
    #[must_use]
    pub fn collides_with(&self, other: &Agent) -> bool {
        if !(self.alive && other.alive) {
            return false;
        }
        let r = self.radius + other.radius;
        self.position.distance_squared(other.position) <= r * r
    }

    /// Compare kinds using the dominance cycle.
    #[must_use]
    pub fn compare(&self, other: &Agent) -> Outcome {
        self.kind.compare(other.kind)
    }

    /// Whether this agent sits out collisions at `tick`.
    #[must_use]
    pub fn on_cooldown(&self, tick: u64, cooldown: u64) -> bool {
        self.last_collision_tick
            .is_some_and(|last| tick.saturating_sub(last) < cooldown)
    }

    /// Mark this agent as defeated.
    pub fn kill(&mut self) {
        self.alive = false;
        self.target = None;
    }

    /// Reflect velocity off a same-kind agent.
    ///
    /// Only applies while the two are closing. Coincident centers get a
    /// random normal.
    pub fn soft_bounce(&mut self, other: &Agent, rng: &mut SimRng) {
        let normal = if self.position.distance_squared(other.position) < COINCIDENT_DISTANCE_SQ {
            random_heading(rng)
        } else {
            (self.position - other.position).normalize()
        };

        let dot = self.velocity.dot(normal);
        if dot < 0.0 {
            self.velocity -= normal * (2.0 * dot);
        }
    }
}

/// Fold `value` into `[0, extent)`.
fn wrap_axis(value: f32, extent: f32) -> f32 {
    let wrapped = value.rem_euclid(extent);
    // A tiny negative plus `extent` can round up to exactly `extent`
    if wrapped >= extent {
        0.0
    } else {
        wrapped
    }
}

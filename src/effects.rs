//! Decorative particle effects
//!
//! Updated once per tick and drawn once per frame. Nothing here feeds back
//! into the simulation. Tunables live on each effect instance; two trails
//! with different configs never affect each other.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::SIM_DT;

/// One particle ready to draw, in screen space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSprite {
    pub pos: Vec2,
    pub size: f32,
    /// 1 = opaque, 0 = gone
    pub alpha: f32,
}

/// A decorative effect driven by the level loop
pub trait ParticleEffect {
    /// Advance one tick. `anchor` is the avatar's feet center in world space;
    /// `active` says whether the effect should emit this tick.
    fn update(&mut self, anchor: Vec2, active: bool);

    /// Emit sprites for the current frame, offset by the camera
    fn draw(&self, camera_offset: Vec2, out: &mut Vec<ParticleSprite>);
}

/// Tunables for a dust trail instance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DustConfig {
    /// New particles per emitting tick
    pub spawn_per_tick: u32,
    /// Upper bound on live particles
    pub max_particles: usize,
    /// Lifetime in seconds
    pub lifetime: f32,
    /// Initial speed range in pixels/second
    pub speed: f32,
    /// Starting size in pixels
    pub size: f32,
    /// Upward drift in pixels/second²
    pub rise: f32,
}

impl Default for DustConfig {
    fn default() -> Self {
        Self {
            spawn_per_tick: 2,
            max_particles: 64,
            lifetime: 0.5,
            speed: 40.0,
            size: 4.0,
            rise: 30.0,
        }
    }
}

#[derive(Debug, Clone)]
struct Particle {
    pos: Vec2,
    vel: Vec2,
    /// 0-1, decreases over time
    life: f32,
    size: f32,
}

/// Dust kicked up at the avatar's feet while moving on the ground
#[derive(Debug, Clone)]
pub struct DustTrail {
    config: DustConfig,
    particles: Vec<Particle>,
    rng: Pcg32,
}

impl DustTrail {
    pub fn new(config: DustConfig, seed: u64) -> Self {
        Self {
            config,
            particles: Vec::with_capacity(config.max_particles),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &DustConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

impl ParticleEffect for DustTrail {
    fn update(&mut self, anchor: Vec2, active: bool) {
        let decay = SIM_DT / self.config.lifetime.max(SIM_DT);
        for p in self.particles.iter_mut() {
            p.pos += p.vel * SIM_DT;
            p.vel.y -= self.config.rise * SIM_DT;
            p.life -= decay;
        }
        self.particles.retain(|p| p.life > 0.0);

        if !active {
            return;
        }
        for _ in 0..self.config.spawn_per_tick {
            if self.particles.len() >= self.config.max_particles {
                break;
            }
            let angle = self.rng.random_range(std::f32::consts::PI..std::f32::consts::TAU);
            let speed = self.rng.random_range(0.3..1.0) * self.config.speed;
            self.particles.push(Particle {
                pos: anchor,
                vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                life: 1.0,
                size: self.config.size * self.rng.random_range(0.5..1.0),
            });
        }
    }

    fn draw(&self, camera_offset: Vec2, out: &mut Vec<ParticleSprite>) {
        out.extend(self.particles.iter().map(|p| ParticleSprite {
            pos: p.pos - camera_offset,
            size: p.size * p.life,
            alpha: p.life,
        }));
    }
}

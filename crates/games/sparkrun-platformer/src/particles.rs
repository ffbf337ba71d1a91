use glam::Vec2;
use serde::{Deserialize, Serialize};

use sparkrun_core::Millis;
use sparkrun_core::render::{Camera, DrawSurface, Rgba};

/// Downward acceleration on burst particles (world units/s^2, y grows down).
const PARTICLE_GRAVITY: f32 = 15.0;
/// Hard cap so a burst-heavy frame cannot grow the pool without bound.
const MAX_PARTICLES: usize = 512;

/// A single short-lived particle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: Rgba,
    pub radius: f32,
    pub life: Millis,
    pub max_life: Millis,
}

impl Particle {
    /// Remaining life fraction in `0..=1`.
    pub fn progress(&self) -> f32 {
        if self.max_life <= 0.0 {
            return 0.0;
        }
        (self.life / self.max_life).clamp(0.0, 1.0) as f32
    }
}

/// Pool of visual particles spawned by pickups.
pub struct ParticleSystem {
    particles: Vec<Particle>,
    rng: fastrand::Rng,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            rng: fastrand::Rng::new(),
        }
    }

    /// Deterministic pool for replays and tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            particles: Vec::new(),
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Spawn `count` particles flying outward from `center`.
    pub fn burst(&mut self, center: Vec2, color: Rgba, count: usize) {
        for _ in 0..count {
            if self.particles.len() >= MAX_PARTICLES {
                tracing::trace!("Particle pool full, dropping burst remainder");
                break;
            }
            let angle = self.rng.f32() * std::f32::consts::TAU;
            let speed = 2.0 + self.rng.f32() * 4.0;
            let lift = 2.0 + self.rng.f32() * 3.0;
            let life = 400.0 + self.rng.f64() * 300.0;
            self.particles.push(Particle {
                pos: center,
                vel: Vec2::new(angle.cos() * speed, angle.sin() * speed - lift),
                color,
                radius: 0.06 + self.rng.f32() * 0.06,
                life,
                max_life: life,
            });
        }
    }

    /// Apply gravity, move, and drop dead particles. Negative or non-finite
    /// deltas leave the pool untouched.
    pub fn update(&mut self, delta: Millis) {
        if !(delta.is_finite() && delta > 0.0) {
            return;
        }
        let dt = (delta / 1000.0) as f32;
        for p in &mut self.particles {
            p.vel.y += PARTICLE_GRAVITY * dt;
            p.pos += p.vel * dt;
            p.life -= delta;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    pub fn render(&self, surface: &mut dyn DrawSurface, camera: &dyn Camera) {
        for p in &self.particles {
            let progress = p.progress();
            let at = camera.transform_coordinates(p.pos);
            let radius = camera.transform_x(p.radius * progress.max(0.01));
            surface.fill_circle(at, radius, p.color.with_alpha(p.color.a * progress));
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparkrun_core::render::CommandRecorder;
    use sparkrun_core::test_helpers::default_camera;

    #[test]
    fn burst_spawns_requested_count() {
        let mut ps = ParticleSystem::with_seed(7);
        ps.burst(Vec2::new(3.0, 3.0), Rgba::WHITE, 12);
        assert_eq!(ps.len(), 12);
        assert!(ps.particles().iter().all(|p| p.pos == Vec2::new(3.0, 3.0)));
    }

    #[test]
    fn particles_die_after_max_life() {
        let mut ps = ParticleSystem::with_seed(1);
        ps.burst(Vec2::ZERO, Rgba::WHITE, 20);
        ps.update(100.0);
        assert_eq!(ps.len(), 20);
        ps.update(700.0);
        assert!(ps.is_empty());
    }

    #[test]
    fn gravity_pulls_down() {
        let mut ps = ParticleSystem::with_seed(3);
        ps.burst(Vec2::ZERO, Rgba::WHITE, 1);
        let before = ps.particles()[0].vel.y;
        ps.update(100.0);
        assert!(ps.particles()[0].vel.y > before);
    }

    #[test]
    fn bad_delta_freezes_particles() {
        let mut ps = ParticleSystem::with_seed(4);
        ps.burst(Vec2::ZERO, Rgba::WHITE, 8);
        ps.update(50.0);
        let before = ps.particles().to_vec();
        ps.update(-500.0);
        ps.update(f64::NAN);
        ps.update(f64::INFINITY);
        assert_eq!(ps.particles(), before.as_slice());
    }

    #[test]
    fn pool_is_capped() {
        let mut ps = ParticleSystem::with_seed(9);
        ps.burst(Vec2::ZERO, Rgba::WHITE, MAX_PARTICLES + 50);
        assert_eq!(ps.len(), MAX_PARTICLES);
    }

    #[test]
    fn render_draws_one_circle_per_particle() {
        let mut ps = ParticleSystem::with_seed(5);
        ps.burst(Vec2::new(1.0, 1.0), Rgba::WHITE, 6);
        let mut rec = CommandRecorder::new();
        ps.render(&mut rec, &default_camera());
        assert_eq!(rec.paint_count(), 6);
    }
}

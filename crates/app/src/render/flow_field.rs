//! Streak particles pushed around the car by a free stream plus a dipole.
//!
//! Purely cosmetic: a cheap potential-flow look, not a solver.

use super::Point3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const PARTICLE_COUNT: usize = 5000;
pub const TIME_STEP: f32 = 0.4;

const FREE_STREAM: f32 = -0.4;
const OBSTACLE: Point3 = [0.0, 0.6, 0.0];
const OBSTACLE_RADIUS_SQ: f32 = 1.5 * 1.5;
const INFLUENCE_RANGE_SQ: f32 = 20.0;
const FLOOR: f32 = 0.05;
const OUTLET_Z: f32 = -6.0;
const MAX_STREAK: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub pos: Point3,
    pub vel: Point3,
}

impl Particle {
    pub fn speed(&self) -> f32 {
        super::length(self.vel)
    }

    /// Streak length along the velocity
    pub fn streak_len(&self) -> f32 {
        (self.speed() * 4.0).min(MAX_STREAK)
    }
}

pub struct FlowField {
    particles: Vec<Particle>,
    rng: StdRng,
}

impl FlowField {
    pub fn new(count: usize) -> Self {
        Self::with_rng(count, StdRng::from_entropy())
    }

    pub fn seeded(count: usize, seed: u64) -> Self {
        Self::with_rng(count, StdRng::seed_from_u64(seed))
    }

    fn with_rng(count: usize, mut rng: StdRng) -> Self {
        let particles = (0..count)
            .map(|_| {
                let mut p = spawn(&mut rng);
                // start spread through the tunnel rather than all at the inlet
                p.pos[2] = (rng.gen::<f32>() - 0.5) * 10.0;
                p
            })
            .collect();
        Self { particles, rng }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Particles drawn at this density (0..=1)
    pub fn visible(&self, density: f32) -> &[Particle] {
        let n = (self.particles.len() as f32 * density.clamp(0.0, 1.0)).floor() as usize;
        &self.particles[..n]
    }

    /// Advance the first `active` particles by one step
    pub fn step(&mut self, active: usize, dt: f32) {
        let active = active.min(self.particles.len());
        for i in 0..active {
            let [mut px, mut py, mut pz] = self.particles[i].pos;

            let mut vx = 0.0;
            let mut vy = 0.0;
            let vz = FREE_STREAM;

            let dx = px - OBSTACLE[0];
            let dy = py - OBSTACLE[1];
            let dz = pz - OBSTACLE[2];
            let dist_sq = dx * dx + dy * dy + dz * dz;
            if dist_sq < INFLUENCE_RANGE_SQ {
                let influence = OBSTACLE_RADIUS_SQ / (dist_sq * dist_sq * dist_sq + 0.1);
                vx += dx * influence * 2.0;
                vy += dy * influence * 1.5;
            }

            if py < FLOOR {
                vy += 0.05;
                py = FLOOR;
            }

            px += vx * dt;
            py += vy * dt;
            pz += vz * dt;

            self.particles[i] = if pz < OUTLET_Z {
                spawn(&mut self.rng)
            } else {
                Particle {
                    pos: [px, py, pz],
                    vel: [vx, vy, vz],
                }
            };
        }
    }
}

/// New particle in the inlet box upstream of the car
fn spawn(rng: &mut StdRng) -> Particle {
    Particle {
        pos: [
            (rng.gen::<f32>() - 0.5) * 4.0,
            rng.gen::<f32>() * 2.5 + 0.1,
            8.0 + rng.gen::<f32>() * 2.0,
        ],
        vel: [0.0, 0.0, -0.1 - rng.gen::<f32>() * 0.1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_spread() {
        let field = FlowField::seeded(500, 7);
        for p in field.particles() {
            assert!(p.pos[0].abs() <= 2.0);
            assert!((0.1..=2.6).contains(&p.pos[1]));
            assert!((-5.0..=5.0).contains(&p.pos[2]));
        }
    }

    #[test]
    fn test_density_limits_visible() {
        let field = FlowField::seeded(PARTICLE_COUNT, 1);
        assert_eq!(field.visible(0.7).len(), 3500);
        assert_eq!(field.visible(0.0).len(), 0);
        assert_eq!(field.visible(2.0).len(), PARTICLE_COUNT);
    }

    #[test]
    fn test_stays_bounded_and_loops() {
        let mut field = FlowField::seeded(1000, 42);
        let mut respawned = 0;
        for _ in 0..400 {
            let before: Vec<f32> = field.particles().iter().map(|p| p.pos[2]).collect();
            field.step(1000, TIME_STEP);
            for (p, z0) in field.particles().iter().zip(before) {
                if p.pos[2] > z0 {
                    respawned += 1;
                }
                assert!(p.pos.iter().all(|c| c.is_finite()));
                assert!((OUTLET_Z..=10.0).contains(&p.pos[2]), "{p:?}");
                assert!(p.pos[0].abs() < 25.0 && p.pos[1].abs() < 25.0);
            }
        }
        // 400 steps move 64 units downstream; everything went round at least once
        assert!(respawned >= 1000);
    }

    #[test]
    fn test_inactive_particles_do_not_move() {
        let mut field = FlowField::seeded(10, 3);
        let frozen = field.particles()[5];
        field.step(5, TIME_STEP);
        assert_eq!(field.particles()[5], frozen);
        assert_ne!(field.particles()[0], FlowField::seeded(10, 3).particles()[0]);
    }

    #[test]
    fn test_floor_pushes_up() {
        let mut field = FlowField::seeded(1, 9);
        field.particles[0] = Particle {
            pos: [3.0, -0.5, 4.0],
            vel: [0.0; 3],
        };
        field.step(1, TIME_STEP);
        let p = field.particles()[0];
        assert!(p.pos[1] >= FLOOR);
        assert!(p.vel[1] > 0.0);
        assert!((p.streak_len() - p.speed() * 4.0).abs() < 1e-6);
    }
}

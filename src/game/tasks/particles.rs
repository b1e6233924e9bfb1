//! Particle Bursts
//!
//! Short-lived particle effects spawned by scripts and projectile impacts.
//! Each burst owns its particles, integrates them every frame and fades them
//! out linearly over their lifetime. The presentation layer reads them as a
//! flat buffer of [`ParticleInstance`]s.

use glam::Vec3;
use rand::Rng;
use rand::rngs::StdRng;

/// Particles per burst
pub const PARTICLES_PER_BURST: usize = 24;

/// Lifetime of burst, sparkle and fire particles (seconds)
pub const PARTICLE_LIFETIME: f32 = 1.2;

/// Lifetime of snow particles (seconds)
pub const SNOW_LIFETIME: f32 = 3.0;

/// Downward acceleration applied to non-snow particles
pub const PARTICLE_GRAVITY: f32 = 9.8;

/// Velocity distribution of a burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParticleKind {
    /// Radial explosion
    #[default]
    Burst,
    /// Upward sparkle
    Sparkle,
    /// Narrow upward cone
    Fire,
    /// Spawned above and around, drifting down
    Snow,
}

impl ParticleKind {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "sparkle" | "sparkles" | "confetti" => ParticleKind::Sparkle,
            "fire" | "flame" | "smoke" => ParticleKind::Fire,
            "snow" => ParticleKind::Snow,
            _ => ParticleKind::Burst,
        }
    }

    pub fn lifetime(self) -> f32 {
        match self {
            ParticleKind::Snow => SNOW_LIFETIME,
            _ => PARTICLE_LIFETIME,
        }
    }
}

/// GPU-facing particle instance.
///
/// Layout (32 bytes): position (12) + size (4) + rgba color (16).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
    pub size: f32,
    /// RGB plus opacity
    pub color: [f32; 4],
}

static_assertions::assert_eq_size!(ParticleInstance, [u8; 32]);

/// CPU-side particle state.
#[derive(Copy, Clone, Debug)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub size: f32,
}

/// A burst of particles sharing a kind, color and age.
#[derive(Clone, Debug)]
pub struct ParticleBurst {
    pub kind: ParticleKind,
    pub color: [f32; 3],
    pub particles: Vec<Particle>,
    pub elapsed: f32,
}

impl ParticleBurst {
    /// Spawn a burst at `origin`, drawing velocities from `rng`.
    pub fn spawn(kind: ParticleKind, origin: Vec3, color: [f32; 3], rng: &mut StdRng) -> Self {
        let particles = (0..PARTICLES_PER_BURST)
            .map(|_| {
                let angle = rng.gen_range(0.0f32..std::f32::consts::TAU);
                let (sin, cos) = angle.sin_cos();
                let (position, velocity) = match kind {
                    ParticleKind::Burst => {
                        let elevation = rng.gen_range(-0.3f32..1.0);
                        let speed = rng.gen_range(2.0f32..5.0);
                        let dir = Vec3::new(cos, elevation, sin).normalize();
                        (origin, dir * speed)
                    }
                    ParticleKind::Sparkle => {
                        let spread = rng.gen_range(0.3f32..1.2);
                        (origin, Vec3::new(cos * spread, rng.gen_range(3.0f32..6.0), sin * spread))
                    }
                    ParticleKind::Fire => {
                        let spread = rng.gen_range(0.0f32..0.4);
                        (origin, Vec3::new(cos * spread, rng.gen_range(2.0f32..4.0), sin * spread))
                    }
                    ParticleKind::Snow => {
                        let radius = rng.gen_range(0.0f32..4.0);
                        let height = rng.gen_range(2.0f32..5.0);
                        let drift = Vec3::new(rng.gen_range(-0.3f32..0.3), 0.0, rng.gen_range(-0.3f32..0.3));
                        (
                            origin + Vec3::new(cos * radius, height, sin * radius),
                            Vec3::new(0.0, -rng.gen_range(0.8f32..1.5), 0.0) + drift,
                        )
                    }
                };
                Particle {
                    position,
                    velocity,
                    size: rng.gen_range(0.08f32..0.18),
                }
            })
            .collect();

        Self {
            kind,
            color,
            particles,
            elapsed: 0.0,
        }
    }

    /// Integrate every particle. Returns `true` once the burst has faded out.
    pub fn step(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        let gravity = if self.kind == ParticleKind::Snow {
            Vec3::ZERO
        } else {
            Vec3::new(0.0, -PARTICLE_GRAVITY, 0.0)
        };
        for p in &mut self.particles {
            p.velocity += gravity * dt;
            p.position += p.velocity * dt;
        }
        self.elapsed >= self.kind.lifetime()
    }

    /// Current opacity: linear fade from 1 to 0 over the lifetime.
    pub fn opacity(&self) -> f32 {
        (1.0 - self.elapsed / self.kind.lifetime()).clamp(0.0, 1.0)
    }

    /// Append this burst's instances to `out`.
    pub fn write_instances(&self, out: &mut Vec<ParticleInstance>) {
        let alpha = self.opacity();
        let [r, g, b] = self.color;
        out.extend(self.particles.iter().map(|p| ParticleInstance {
            position: p.position.to_array(),
            size: p.size,
            color: [r, g, b, alpha],
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_burst_allocates_and_fades() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut burst = ParticleBurst::spawn(ParticleKind::Burst, Vec3::ZERO, [1.0, 0.0, 0.0], &mut rng);
        assert_eq!(burst.particles.len(), PARTICLES_PER_BURST);
        assert_eq!(burst.opacity(), 1.0);

        assert!(!burst.step(0.6));
        assert!((burst.opacity() - 0.5).abs() < 1e-5);
        assert!(burst.step(0.6));
        assert_eq!(burst.opacity(), 0.0);
    }

    #[test]
    fn test_snow_starts_above_and_ignores_gravity() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut snow = ParticleBurst::spawn(ParticleKind::Snow, Vec3::ZERO, [1.0; 3], &mut rng);
        assert!(snow.particles.iter().all(|p| p.position.y >= 2.0));
        let before: Vec<f32> = snow.particles.iter().map(|p| p.velocity.y).collect();
        snow.step(0.5);
        let after: Vec<f32> = snow.particles.iter().map(|p| p.velocity.y).collect();
        assert_eq!(before, after);
        assert!(!snow.step(1.0), "snow lives for three seconds");
    }

    #[test]
    fn test_instances_carry_opacity() {
        let mut rng = StdRng::seed_from_u64(3);
        let burst = ParticleBurst::spawn(ParticleKind::Fire, Vec3::ONE, [0.2, 0.4, 0.6], &mut rng);
        let mut out = Vec::new();
        burst.write_instances(&mut out);
        assert_eq!(out.len(), PARTICLES_PER_BURST);
        assert_eq!(out[0].color, [0.2, 0.4, 0.6, 1.0]);
        let bytes: &[u8] = bytemuck::cast_slice(&out);
        assert_eq!(bytes.len(), PARTICLES_PER_BURST * 32);
    }
}

//! Timed camera effects layered on the camera rig.

use glam::Vec3;
use rand::Rng;
use rand::rngs::StdRng;

use crate::camera::CameraRig;
use crate::physics::smoothstep;

#[derive(Debug, Clone, PartialEq)]
pub enum CameraEffect {
    /// Eased move that pins the camera
    Glide { from: Vec3, to: Vec3, duration: f32 },
    /// Random jitter decaying to zero
    Shake { intensity: f32, duration: f32 },
    /// Field-of-view change in degrees
    Zoom { from: f32, to: f32, duration: f32 },
}

impl CameraEffect {
    pub fn same_kind(&self, other: &CameraEffect) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Advance the effect. Returns `true` once finished.
    pub fn step(&mut self, rig: &mut CameraRig, rng: &mut StdRng, elapsed: f32) -> bool {
        match self {
            CameraEffect::Glide { from, to, duration } => {
                let t = progress(elapsed, *duration);
                rig.pin(from.lerp(*to, smoothstep(t)));
                t >= 1.0
            }
            CameraEffect::Shake { intensity, duration } => {
                let t = progress(elapsed, *duration);
                if t >= 1.0 {
                    rig.shake_offset = Vec3::ZERO;
                    return true;
                }
                let jitter = Vec3::new(
                    rng.gen_range(-1.0f32..1.0),
                    rng.gen_range(-1.0f32..1.0),
                    rng.gen_range(-1.0f32..1.0),
                );
                rig.shake_offset = jitter * *intensity * (1.0 - t);
                false
            }
            CameraEffect::Zoom { from, to, duration } => {
                let t = progress(elapsed, *duration);
                rig.fov = *from + (*to - *from) * smoothstep(t);
                t >= 1.0
            }
        }
    }

    /// Undo any lingering effect when the task is cancelled.
    pub fn cancel(&self, rig: &mut CameraRig) {
        if let CameraEffect::Shake { .. } = self {
            rig.shake_offset = Vec3::ZERO;
        }
    }
}

fn progress(elapsed: f32, duration: f32) -> f32 {
    if duration <= 0.0 { 1.0 } else { (elapsed / duration).min(1.0) }
}

//! Object animations
//!
//! Procedural motion primitives driven by the task scheduler. Each variant
//! keeps the state it needs (base pose, phase, wander goal) and advances the
//! object's transform and material by a closed-form or incremental formula.

use std::collections::VecDeque;
use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;
use rand::rngs::StdRng;

use crate::physics::{Axis, smoothstep, yaw_towards};
use crate::world::{KeyframeTrack, Material, Transform};

/// Seconds a `launch` arc takes
pub const LAUNCH_DURATION: f32 = 1.0;

/// Gravity for `fall` (units/s^2)
pub const FALL_GRAVITY: f32 = 20.0;

/// Objects falling below this height stop falling
pub const FALL_FLOOR: f32 = -50.0;

/// Seconds between trail samples
pub const TRAIL_SAMPLE_INTERVAL: f32 = 0.05;

/// Seconds a trail sample stays visible
pub const TRAIL_LIFETIME: f32 = 1.0;

/// A point of an object's motion trail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    pub position: Vec3,
    pub color: [f32; 3],
    /// 1 when fresh, fading to 0
    pub opacity: f32,
}

/// Per-frame inputs an animation may need besides its own state.
pub struct AnimationEnv<'a> {
    pub rng: &'a mut StdRng,
    /// Surface under the object (terrain or ground plane), if any
    pub floor: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Animation {
    Spin { axis: Axis, speed: f32 },
    Bounce { height: f32, speed: f32, base_y: f32 },
    Hover { amplitude: f32, speed: f32, base_y: f32, phase: f32 },
    Orbit { radius: f32, speed: f32, center: Vec3 },
    Spiral { radius: f32, speed: f32, rise: f32, center: Vec3 },
    Wander { radius: f32, speed: f32, home: Vec3, goal: Option<Vec3>, repick_at: f32 },
    Patrol { axis: Axis, distance: f32, speed: f32, base: Vec3 },
    Zigzag { width: f32, speed: f32, origin: Vec3, heading: Vec3 },
    ColorShift { speed: f32, hue: f32, saturation: f32, value: f32 },
    Pulse { min: f32, max: f32, speed: f32, base_scale: Vec3 },
    GravityFall { velocity: f32 },
    Glide { from: Vec3, to: Vec3, duration: f32 },
    LaunchArc { from: Vec3, to: Vec3, height: f32 },
    Trail { color: [f32; 3], points: VecDeque<(Vec3, f32)>, since_sample: f32 },
    Keyframes { track: KeyframeTrack, looped: bool },
}

impl Animation {
    pub fn spin(axis: Axis, speed: f32) -> Self {
        Animation::Spin { axis, speed }
    }

    pub fn bounce(height: f32, speed: f32, pose: &Transform) -> Self {
        Animation::Bounce { height, speed, base_y: pose.position.y }
    }

    pub fn hover(amplitude: f32, speed: f32, pose: &Transform) -> Self {
        Animation::Hover { amplitude, speed, base_y: pose.position.y, phase: 0.0 }
    }

    /// Orbit starting from the object's current position.
    pub fn orbit(radius: f32, speed: f32, pose: &Transform) -> Self {
        Animation::Orbit { radius, speed, center: pose.position - Vec3::X * radius }
    }

    pub fn spiral(radius: f32, speed: f32, rise: f32, pose: &Transform) -> Self {
        Animation::Spiral { radius, speed, rise, center: pose.position - Vec3::X * radius }
    }

    pub fn wander(radius: f32, speed: f32, pose: &Transform) -> Self {
        Animation::Wander { radius, speed, home: pose.position, goal: None, repick_at: 0.0 }
    }

    pub fn patrol(axis: Axis, distance: f32, speed: f32, pose: &Transform) -> Self {
        Animation::Patrol { axis, distance, speed, base: pose.position }
    }

    pub fn zigzag(width: f32, speed: f32, pose: &Transform) -> Self {
        let yaw = pose.rotation.y;
        Animation::Zigzag {
            width,
            speed,
            origin: pose.position,
            heading: Vec3::new(yaw.sin(), 0.0, -yaw.cos()),
        }
    }

    pub fn color_shift(speed: f32, material: &Material) -> Self {
        let [hue, saturation, value] = rgb_to_hsv(material.color);
        Animation::ColorShift {
            speed,
            hue,
            saturation: saturation.max(0.6),
            value: value.max(0.6),
        }
    }

    pub fn pulse(min: f32, max: f32, speed: f32, pose: &Transform) -> Self {
        Animation::Pulse { min, max, speed, base_scale: pose.scale }
    }

    pub fn fall() -> Self {
        Animation::GravityFall { velocity: 0.0 }
    }

    pub fn glide(to: Vec3, duration: f32, pose: &Transform) -> Self {
        Animation::Glide { from: pose.position, to, duration }
    }

    /// Parabolic hop of `distance` along the object's facing.
    pub fn launch(height: f32, distance: f32, pose: &Transform) -> Self {
        let yaw = pose.rotation.y;
        let facing = Vec3::new(yaw.sin(), 0.0, -yaw.cos());
        Animation::LaunchArc {
            from: pose.position,
            to: pose.position + facing * distance,
            height,
        }
    }

    pub fn trail(color: [f32; 3]) -> Self {
        Animation::Trail { color, points: VecDeque::new(), since_sample: TRAIL_SAMPLE_INTERVAL }
    }

    pub fn keyframes(track: KeyframeTrack, looped: bool) -> Self {
        Animation::Keyframes { track, looped }
    }

    /// Continuous animations persist until cancelled; the rest finish on their own.
    pub fn is_continuous(&self) -> bool {
        match self {
            Animation::GravityFall { .. } | Animation::Glide { .. } | Animation::LaunchArc { .. } => false,
            Animation::Keyframes { looped, .. } => *looped,
            _ => true,
        }
    }

    pub fn same_kind(&self, other: &Animation) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Take the tuning parameters of `other`, keeping accumulated state.
    pub fn retune(&mut self, other: Animation) {
        match (self, other) {
            (Animation::Spin { axis, speed }, Animation::Spin { axis: a, speed: s }) => {
                *axis = a;
                *speed = s;
            }
            (Animation::Bounce { height, speed, .. }, Animation::Bounce { height: h, speed: s, .. }) => {
                *height = h;
                *speed = s;
            }
            (Animation::Hover { amplitude, speed, .. }, Animation::Hover { amplitude: a, speed: s, .. }) => {
                *amplitude = a;
                *speed = s;
            }
            (Animation::Orbit { radius, speed, .. }, Animation::Orbit { radius: r, speed: s, .. }) => {
                *radius = r;
                *speed = s;
            }
            (
                Animation::Spiral { radius, speed, rise, .. },
                Animation::Spiral { radius: r, speed: s, rise: h, .. },
            ) => {
                *radius = r;
                *speed = s;
                *rise = h;
            }
            (Animation::Wander { radius, speed, .. }, Animation::Wander { radius: r, speed: s, .. }) => {
                *radius = r;
                *speed = s;
            }
            (
                Animation::Patrol { axis, distance, speed, .. },
                Animation::Patrol { axis: a, distance: d, speed: s, .. },
            ) => {
                *axis = a;
                *distance = d;
                *speed = s;
            }
            (Animation::Zigzag { width, speed, .. }, Animation::Zigzag { width: w, speed: s, .. }) => {
                *width = w;
                *speed = s;
            }
            (Animation::ColorShift { speed, .. }, Animation::ColorShift { speed: s, .. }) => *speed = s,
            (Animation::Pulse { min, max, speed, .. }, Animation::Pulse { min: lo, max: hi, speed: s, .. }) => {
                *min = lo;
                *max = hi;
                *speed = s;
            }
            (Animation::Trail { color, .. }, Animation::Trail { color: c, .. }) => *color = c,
            (this, other) => *this = other,
        }
    }

    /// Advance by `dt`; `elapsed` already includes this frame.
    /// Returns `true` when the animation has finished.
    pub fn step(
        &mut self,
        pose: &mut Transform,
        material: &mut Material,
        env: &mut AnimationEnv<'_>,
        elapsed: f32,
        dt: f32,
    ) -> bool {
        match self {
            Animation::Spin { axis, speed } => {
                *axis.component_mut(&mut pose.rotation) += *speed * dt;
                false
            }
            Animation::Bounce { height, speed, base_y } => {
                pose.position.y = *base_y + (elapsed * *speed).sin().abs() * *height;
                false
            }
            Animation::Hover { amplitude, speed, base_y, phase } => {
                *phase += *speed * dt;
                pose.position.y = *base_y + phase.sin() * *amplitude;
                false
            }
            Animation::Orbit { radius, speed, center } => {
                let angle = elapsed * *speed;
                pose.position.x = center.x + angle.cos() * *radius;
                pose.position.z = center.z + angle.sin() * *radius;
                false
            }
            Animation::Spiral { radius, speed, rise, center } => {
                let angle = elapsed * *speed;
                let r = *radius * (1.0 + 0.3 * (angle * 0.5).sin());
                pose.position.x = center.x + angle.cos() * r;
                pose.position.z = center.z + angle.sin() * r;
                pose.position.y = center.y + (angle * 0.25).sin() * *rise;
                false
            }
            Animation::Wander { radius, speed, home, goal, repick_at } => {
                let arrived = goal.is_some_and(|g| horizontal(g - pose.position).length() < 0.1);
                if goal.is_none() || arrived || elapsed >= *repick_at {
                    let angle = env.rng.gen_range(0.0f32..TAU);
                    let reach = env.rng.gen_range(0.0f32..1.0).sqrt() * *radius;
                    *goal = Some(*home + Vec3::new(angle.cos() * reach, 0.0, angle.sin() * reach));
                    *repick_at = elapsed + env.rng.gen_range(2.0f32..5.0);
                }
                if let Some(target) = *goal {
                    let offset = horizontal(target - pose.position);
                    let distance = offset.length();
                    if distance > 1e-4 {
                        let step = (*speed * dt).min(distance);
                        pose.position += offset / distance * step;
                        pose.rotation.y = yaw_towards(pose.position, target);
                    }
                }
                false
            }
            Animation::Patrol { axis, distance, speed, base } => {
                pose.position = *base + axis.unit() * (elapsed * *speed * 0.5).sin() * *distance;
                false
            }
            Animation::Zigzag { width, speed, origin, heading } => {
                let side = Vec3::new(-heading.z, 0.0, heading.x);
                pose.position = *origin
                    + *heading * (*speed * elapsed)
                    + side * (elapsed * *speed * 2.0).sin() * *width * 0.5;
                false
            }
            Animation::ColorShift { speed, hue, saturation, value } => {
                *hue = (*hue + *speed * dt * 0.2).rem_euclid(1.0);
                material.color = hsv_to_rgb(*hue, *saturation, *value);
                false
            }
            Animation::Pulse { min, max, speed, base_scale } => {
                let factor = *min + (*max - *min) * (elapsed * *speed).sin().abs();
                pose.scale = *base_scale * factor;
                false
            }
            Animation::GravityFall { velocity } => {
                *velocity += FALL_GRAVITY * dt;
                pose.position.y -= *velocity * dt;
                let half_height = pose.scale.y * 0.5;
                if let Some(floor) = env.floor {
                    if pose.position.y - half_height <= floor {
                        pose.position.y = floor + half_height;
                        return true;
                    }
                }
                pose.position.y < FALL_FLOOR
            }
            Animation::Glide { from, to, duration } => {
                let t = if *duration <= 0.0 { 1.0 } else { elapsed / *duration };
                pose.position = from.lerp(*to, smoothstep(t));
                t >= 1.0
            }
            Animation::LaunchArc { from, to, height } => {
                let t = (elapsed / LAUNCH_DURATION).clamp(0.0, 1.0);
                let mut position = from.lerp(*to, t);
                position.y += 4.0 * *height * t * (1.0 - t);
                pose.position = position;
                t >= 1.0
            }
            Animation::Trail { points, since_sample, .. } => {
                for (_, age) in points.iter_mut() {
                    *age += dt;
                }
                while points.front().is_some_and(|(_, age)| *age >= TRAIL_LIFETIME) {
                    points.pop_front();
                }
                *since_sample += dt;
                if *since_sample >= TRAIL_SAMPLE_INTERVAL {
                    *since_sample = 0.0;
                    points.push_back((pose.position, 0.0));
                }
                false
            }
            Animation::Keyframes { track, looped } => {
                let duration = track.duration();
                let time = if *looped && duration > 0.0 { elapsed.rem_euclid(duration) } else { elapsed };
                if let Some(sampled) = track.sample(time) {
                    *pose = sampled;
                }
                !*looped && elapsed >= duration
            }
        }
    }

    /// Visible trail samples, oldest first.
    pub fn trail_points(&self) -> Vec<TrailPoint> {
        match self {
            Animation::Trail { color, points, .. } => points
                .iter()
                .map(|&(position, age)| TrailPoint {
                    position,
                    color: *color,
                    opacity: (1.0 - age / TRAIL_LIFETIME).clamp(0.0, 1.0),
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// HSV (all components 0..1) to RGB.
pub fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> [f32; 3] {
    let h = hue.rem_euclid(1.0) * 6.0;
    let c = value * saturation;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = value - c;
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    [r + m, g + m, b + m]
}

/// RGB to HSV (all components 0..1).
pub fn rgb_to_hsv([r, g, b]: [f32; 3]) -> [f32; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let hue = if delta <= f32::EPSILON {
        0.0
    } else if max == r {
        ((g - b) / delta).rem_euclid(6.0) / 6.0
    } else if max == g {
        ((b - r) / delta + 2.0) / 6.0
    } else {
        ((r - g) / delta + 4.0) / 6.0
    };
    let saturation = if max <= 0.0 { 0.0 } else { delta / max };
    [hue, saturation, max]
}

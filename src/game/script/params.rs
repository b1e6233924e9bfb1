//! Command parameter access
//!
//! Block parameters arrive as loosely typed JSON: numbers may be strings,
//! colors may be hex codes or names. Every accessor takes the default the
//! operation documents and returns it whenever the value is missing or
//! malformed.

use glam::Vec3;
use serde_json::Value;

use super::ast::ParamMap;
use crate::physics::Axis;

/// Read-only view over a command's parameters.
#[derive(Clone, Copy)]
pub struct Params<'a>(pub &'a ParamMap);

impl<'a> Params<'a> {
    pub fn raw(&self, key: &str) -> Option<&'a Value> {
        self.0.get(key)
    }

    /// Number parameter; numeric strings are accepted.
    pub fn num(&self, key: &str, default: f32) -> f32 {
        self.num_f64(key, default as f64) as f32
    }

    pub fn num_f64(&self, key: &str, default: f64) -> f64 {
        let parsed = match self.raw(key) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        };
        parsed.filter(|v| v.is_finite()).unwrap_or(default)
    }

    /// Integer parameter, rounded toward zero.
    pub fn int(&self, key: &str, default: i64) -> i64 {
        let v = self.num_f64(key, default as f64);
        v.trunc() as i64
    }

    /// Signed integer clamped into `i32` range.
    pub fn int32(&self, key: &str, default: i32) -> i32 {
        self.int(key, default as i64).clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }

    /// Non-negative count clamped into `u32` range.
    pub fn count(&self, key: &str, default: u32) -> u32 {
        self.int(key, default as i64).clamp(0, u32::MAX as i64) as u32
    }

    pub fn text(&self, key: &str, default: &str) -> String {
        match self.raw(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => default.to_string(),
        }
    }

    pub fn flag(&self, key: &str, default: bool) -> bool {
        match self.raw(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => true,
                "false" | "no" | "off" | "0" => false,
                _ => default,
            },
            _ => default,
        }
    }

    /// Three number parameters as a vector.
    pub fn vec3(&self, keys: [&str; 3], default: Vec3) -> Vec3 {
        Vec3::new(
            self.num(keys[0], default.x),
            self.num(keys[1], default.y),
            self.num(keys[2], default.z),
        )
    }

    pub fn axis(&self, key: &str) -> Axis {
        match self.raw(key) {
            Some(Value::String(s)) => Axis::from_label(s),
            _ => Axis::Y,
        }
    }

    pub fn color(&self, key: &str, default: [f32; 3]) -> [f32; 3] {
        match self.raw(key) {
            Some(Value::String(s)) => parse_color(s).unwrap_or(default),
            _ => default,
        }
    }
}

/// Parse `#rrggbb`, `#rgb` or a basic color name into linear RGB in [0, 1].
pub fn parse_color(input: &str) -> Option<[f32; 3]> {
    let s = input.trim().to_ascii_lowercase();
    if let Some(hex) = s.strip_prefix('#') {
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return None,
        };
        let value = u32::from_str_radix(&expanded, 16).ok()?;
        let channel = |shift: u32| ((value >> shift) & 0xff) as f32 / 255.0;
        return Some([channel(16), channel(8), channel(0)]);
    }
    let named = match s.as_str() {
        "red" => [1.0, 0.0, 0.0],
        "green" => [0.0, 0.8, 0.0],
        "blue" => [0.0, 0.3, 1.0],
        "yellow" => [1.0, 0.9, 0.0],
        "orange" => [1.0, 0.5, 0.0],
        "purple" => [0.6, 0.2, 0.9],
        "pink" => [1.0, 0.4, 0.7],
        "cyan" => [0.0, 0.9, 0.9],
        "white" => [1.0, 1.0, 1.0],
        "black" => [0.0, 0.0, 0.0],
        "gray" | "grey" => [0.5, 0.5, 0.5],
        "gold" => [1.0, 0.84, 0.0],
        _ => return None,
    };
    Some(named)
}

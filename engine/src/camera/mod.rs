//! Camera Module
//!
//! Camera rig and screen-space raycasting for play mode.
//! This module is window-system agnostic - it only deals with camera state and math.

pub mod controller;
pub mod raycast;

pub use controller::{CameraOverride, CameraRig, DEFAULT_FOV, LookTarget, RigConfig};
pub use raycast::{ScreenRay, get_ray_direction, raycast_to_plane, screen_ray};

//! Play zone geometry
//!
//! A depth band in front of the sensor plus a lateral half-width. Both
//! bounds are inclusive. A zone with `min_z > max_z` is a setup bug and
//! simply contains nothing.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Volume in which a body is eligible to become the participant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayZone {
    /// Nearest allowed depth (metres from the sensor)
    pub min_z: f32,
    /// Farthest allowed depth
    pub max_z: f32,
    /// Maximum |x| from the sensor axis
    pub boundary_x: f32,
}

impl Default for PlayZone {
    fn default() -> Self {
        Self {
            min_z: ZONE_MIN_Z,
            max_z: ZONE_MAX_Z,
            boundary_x: ZONE_BOUNDARY_X,
        }
    }
}

impl PlayZone {
    pub fn new(min_z: f32, max_z: f32, boundary_x: f32) -> Self {
        Self {
            min_z,
            max_z,
            boundary_x,
        }
    }

    /// Check if a sensor-space position lies in the zone (height ignored)
    #[inline]
    pub fn contains(&self, pos: Vec3) -> bool {
        pos.z >= self.min_z && pos.z <= self.max_z && pos.x.abs() <= self.boundary_x
    }
}

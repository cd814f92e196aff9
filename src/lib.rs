//! Kiosk Presence - session controller for an unattended body-tracking exhibit
//!
//! Core modules:
//! - `presence`: Body IDs, candidates and the presence-source seam
//! - `session`: Zone filter, candidate selection and the session state machine
//! - `settings`: Tunables loaded once at startup
//! - `visitors`: Seeded synthetic visitor scripts for headless runs

pub mod presence;
pub mod session;
pub mod settings;
pub mod visitors;

pub use presence::{BodyId, Candidate, PresenceSource, TrackedBodies};
pub use session::{ExhibitionSession, PlayZone, SessionState, TickInput};
pub use settings::{Settings, SettingsError};

use glam::{Vec2, Vec3};

/// Kiosk configuration constants
pub mod consts {
    /// Fixed driver timestep (60 Hz, matches the sensor frame rate)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Seconds a candidate must stay in-zone before becoming primary
    pub const LOCK_IN_DURATION: f32 = 5.0;
    /// Seconds of absence before returning to the menu
    pub const ABANDON_TIMEOUT: f32 = 15.0;
    /// Seconds of continuous tracking loss tolerated as occlusion
    pub const RECOVERY_GRACE_PERIOD: f32 = 1.0;
    /// Settle delay before the warmup check runs
    pub const WARMUP_DURATION: f32 = 2.0;

    /// Play zone defaults (metres, sensor space)
    pub const ZONE_MIN_Z: f32 = 0.5;
    pub const ZONE_MAX_Z: f32 = 2.5;
    pub const ZONE_BOUNDARY_X: f32 = 1.5;

    /// Element name looked up on a result screen when no warning is assigned
    pub const WARNING_ELEMENT_NAME: &str = "Warning";
}

/// Clamp to [0, 1]
#[inline]
pub fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Squared distance from the sensor origin on the floor plane (x, z).
/// Height is ignored.
#[inline]
pub fn planar_distance_sq(pos: Vec3) -> f32 {
    Vec2::new(pos.x, pos.z).length_squared()
}

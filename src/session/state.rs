//! Session state and timers
//!
//! Everything a debug overlay needs to render the session lives here.

use serde::{Deserialize, Serialize};

use crate::presence::BodyId;

/// Current phase of the exhibit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Settling after startup or restart
    Warmup,
    /// Waiting for anyone to step into the zone (menu)
    Idle,
    /// A candidate is locking in
    Scanning,
    /// Game running, watching for abandonment
    Gameplay,
    /// Win/lose screen showing, watching for timeout or a new participant
    Result,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Warmup => "Warmup",
            SessionState::Idle => "Idle",
            SessionState::Scanning => "Scanning",
            SessionState::Gameplay => "Gameplay",
            SessionState::Result => "Result",
        }
    }
}

/// Status line for the waiting screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Initializing,
    WaitingForSensor,
    StandInFront,
    LockingIn,
    Playing,
    Result,
}

impl SessionStatus {
    pub fn message(&self) -> &'static str {
        match self {
            SessionStatus::Initializing => "Initializing System...",
            SessionStatus::WaitingForSensor => "Waiting for Sensor...",
            SessionStatus::StandInFront => "Please stand in front of the sensor...",
            SessionStatus::LockingIn => "Hold still...",
            SessionStatus::Playing => "",
            SessionStatus::Result => "",
        }
    }
}

/// Elapsed-seconds counters, all reset explicitly on transitions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionTimers {
    /// Time in the current state (meaning depends on state)
    pub state: f32,
    /// Accumulated absence (idle wait, post-grace abandonment, or
    /// replacement lock-in on the result screen)
    pub idle_or_abandon: f32,
    /// Continuous time since the primary was last seen
    pub recovery: f32,
}

impl SessionTimers {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Point-in-time view of the session for overlays and logs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub status: SessionStatus,
    pub timers: SessionTimers,
    pub pending_id: Option<BodyId>,
    pub primary_id: Option<BodyId>,
    pub tracked_bodies: usize,
    pub warning_visible: bool,
}

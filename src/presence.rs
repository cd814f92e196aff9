//! Body presence types and the presence-source seam
//!
//! The sensor driver owns frame acquisition. The session only sees the
//! latest snapshot through [`PresenceSource`], which must answer
//! immediately and never wait for a new frame.

use std::num::NonZeroU64;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Stable, non-zero sensor body ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BodyId(NonZeroU64);

impl BodyId {
    /// Wrap a raw sensor ID. Zero means "no body" and yields `None`.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tracked body for one tick (recomputed every frame, never stored)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: BodyId,
    /// Sensor-space position in metres (x lateral, y up, z depth)
    pub position: Vec3,
}

impl Candidate {
    pub fn new(id: BodyId, position: Vec3) -> Self {
        Self { id, position }
    }
}

/// Read access to the body tracker plus the shared primary-ID slot.
///
/// The session is the only writer of the primary ID.
pub trait PresenceSource {
    /// False while the sensor is still opening or has dropped out
    fn is_initialized(&self) -> bool {
        true
    }

    /// Number of bodies tracked this frame
    fn candidate_count(&self) -> usize;

    /// ID of the body at `index` in sensor enumeration order
    fn candidate_id_at(&self, index: usize) -> Option<BodyId>;

    /// Position of a tracked body
    fn candidate_position(&self, id: BodyId) -> Option<Vec3>;

    /// Whether `id` is present in the current frame
    fn is_tracked(&self, id: BodyId) -> bool;

    fn primary_id(&self) -> Option<BodyId>;

    fn set_primary_id(&mut self, id: BodyId);

    /// All bodies in enumeration order
    fn candidates(&self) -> Vec<Candidate> {
        (0..self.candidate_count())
            .filter_map(|index| self.candidate_id_at(index))
            .filter_map(|id| {
                self.candidate_position(id)
                    .map(|position| Candidate::new(id, position))
            })
            .collect()
    }
}

/// In-memory presence store fed one frame at a time.
///
/// Used by the headless driver and tests in place of a sensor binding.
#[derive(Debug, Clone)]
pub struct TrackedBodies {
    bodies: Vec<Candidate>,
    primary: Option<BodyId>,
    initialized: bool,
}

impl Default for TrackedBodies {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackedBodies {
    /// Create a ready store with no bodies
    pub fn new() -> Self {
        Self {
            bodies: Vec::new(),
            primary: None,
            initialized: true,
        }
    }

    /// Create a store whose sensor has not come up yet
    pub fn uninitialized() -> Self {
        Self {
            initialized: false,
            ..Self::new()
        }
    }

    pub fn set_initialized(&mut self, initialized: bool) {
        self.initialized = initialized;
    }

    /// Replace the current frame. Enumeration order is preserved.
    pub fn update_frame(&mut self, frame: impl IntoIterator<Item = Candidate>) {
        self.bodies.clear();
        self.bodies.extend(frame);
    }

    /// Drop all bodies and forget the primary (full restart)
    pub fn clear_users(&mut self) {
        self.bodies.clear();
        self.primary = None;
    }

    pub fn bodies(&self) -> &[Candidate] {
        &self.bodies
    }
}

impl PresenceSource for TrackedBodies {
    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn candidate_count(&self) -> usize {
        self.bodies.len()
    }

    fn candidate_id_at(&self, index: usize) -> Option<BodyId> {
        self.bodies.get(index).map(|c| c.id)
    }

    fn candidate_position(&self, id: BodyId) -> Option<Vec3> {
        self.bodies.iter().find(|c| c.id == id).map(|c| c.position)
    }

    fn is_tracked(&self, id: BodyId) -> bool {
        self.bodies.iter().any(|c| c.id == id)
    }

    fn primary_id(&self) -> Option<BodyId> {
        self.primary
    }

    fn set_primary_id(&mut self, id: BodyId) {
        self.primary = Some(id);
    }

    fn candidates(&self) -> Vec<Candidate> {
        self.bodies.clone()
    }
}

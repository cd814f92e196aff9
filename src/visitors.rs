//! Synthetic visitor scripts
//!
//! Produces noisy presence frames for headless runs without a sensor:
//! visitors arrive, sway in place, drop out of tracking for a few frames,
//! and leave. Seeded, so the same seed always yields the same frames.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::presence::{BodyId, Candidate};

/// First body ID handed out by a script
const FIRST_BODY_ID: u64 = 72057594037927936;

/// Sway amplitude around the standing spot (metres)
const SWAY: f32 = 0.05;

/// One scripted visitor
#[derive(Debug, Clone)]
pub struct Visitor {
    pub id: BodyId,
    /// Seconds into the script when the visitor is first tracked
    pub arrive_at: f32,
    /// Seconds into the script when the visitor walks away
    pub leave_at: f32,
    /// Standing spot in sensor space
    pub spot: Vec3,
    /// Remaining tracking dropout (seconds)
    dropout: f32,
}

impl Visitor {
    fn present_at(&self, time: f32) -> bool {
        time >= self.arrive_at && time < self.leave_at
    }
}

/// Seeded generator of presence frames
#[derive(Debug, Clone)]
pub struct VisitorScript {
    rng: Pcg32,
    visitors: Vec<Visitor>,
    time: f32,
    next_id: u64,
    /// Chance per second that a present visitor drops out of tracking
    pub dropout_rate: f32,
    /// Longest dropout (seconds)
    pub max_dropout: f32,
}

impl VisitorScript {
    /// Empty script with default noise
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            visitors: Vec::new(),
            time: 0.0,
            next_id: FIRST_BODY_ID,
            dropout_rate: 0.2,
            max_dropout: 0.6,
        }
    }

    /// Script with `count` visitors spread over `span` seconds, some
    /// standing in the play zone and some passing by outside it
    pub fn random(seed: u64, count: usize, span: f32) -> Self {
        let mut script = Self::new(seed);
        for _ in 0..count {
            let arrive_at = script.rng.random_range(0.0..span);
            let stay = script.rng.random_range(3.0..40.0);
            let spot = Vec3::new(
                script.rng.random_range(-2.0..2.0),
                script.rng.random_range(-0.2..0.2),
                script.rng.random_range(0.3..3.5),
            );
            script.add_visitor(arrive_at, stay, spot);
        }
        script
    }

    /// Add a visitor standing at `spot` from `arrive_at` for `stay` seconds
    pub fn add_visitor(&mut self, arrive_at: f32, stay: f32, spot: Vec3) -> BodyId {
        let id = self.allocate_id();
        self.visitors.push(Visitor {
            id,
            arrive_at,
            leave_at: arrive_at + stay,
            spot,
            dropout: 0.0,
        });
        id
    }

    pub fn visitors(&self) -> &[Visitor] {
        &self.visitors
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advance the script by `dt` and return the bodies the sensor sees,
    /// in arrival order
    pub fn frame(&mut self, dt: f32) -> Vec<Candidate> {
        self.time += dt;
        let time = self.time;
        let dropout_chance = (self.dropout_rate * dt).clamp(0.0, 1.0) as f64;

        let mut frame = Vec::new();
        for visitor in &mut self.visitors {
            if !visitor.present_at(time) {
                continue;
            }

            if visitor.dropout > 0.0 {
                // Always seen again for at least one frame after a dropout
                visitor.dropout -= dt;
                if visitor.dropout > 0.0 {
                    continue;
                }
                visitor.dropout = 0.0;
            } else if self.rng.random_bool(dropout_chance) {
                visitor.dropout = self.rng.random_range(dt..=self.max_dropout.max(dt));
                continue;
            }

            let sway = Vec3::new(
                self.rng.random_range(-SWAY..=SWAY),
                0.0,
                self.rng.random_range(-SWAY..=SWAY),
            );
            frame.push(Candidate::new(visitor.id, visitor.spot + sway));
        }
        frame
    }

    /// Seconds until every visitor has left
    pub fn duration(&self) -> f32 {
        self.visitors
            .iter()
            .map(|v| v.leave_at)
            .fold(0.0, f32::max)
    }

    fn allocate_id(&mut self) -> BodyId {
        let raw = self.next_id;
        self.next_id += 1;
        // Script IDs start far above zero
        BodyId::new(raw).unwrap_or_else(|| unreachable!("script body IDs are non-zero"))
    }
}

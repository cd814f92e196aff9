//! Candidate selection
//!
//! Picks the in-zone body nearest the sensor on the floor plane. Ties go to
//! whichever body the sensor enumerated first; that order is not guaranteed
//! stable between frames and is passed through as-is.

use std::cmp::Ordering;

use super::zone::PlayZone;
use crate::planar_distance_sq;
use crate::presence::{BodyId, Candidate};

/// Best in-zone candidate, or `None` if nobody qualifies
pub fn select_candidate(zone: &PlayZone, candidates: &[Candidate]) -> Option<BodyId> {
    nearest_in_zone(zone, candidates.iter())
}

/// Like [`select_candidate`], skipping `excluded` (the current primary)
pub fn select_candidate_excluding(
    zone: &PlayZone,
    candidates: &[Candidate],
    excluded: Option<BodyId>,
) -> Option<BodyId> {
    nearest_in_zone(
        zone,
        candidates.iter().filter(|c| Some(c.id) != excluded),
    )
}

fn nearest_in_zone<'a>(
    zone: &PlayZone,
    candidates: impl Iterator<Item = &'a Candidate>,
) -> Option<BodyId> {
    // min_by keeps the first of equal elements
    candidates
        .filter(|c| zone.contains(c.position))
        .min_by(|a, b| {
            planar_distance_sq(a.position)
                .partial_cmp(&planar_distance_sq(b.position))
                .unwrap_or(Ordering::Equal)
        })
        .map(|c| c.id)
}

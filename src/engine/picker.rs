// Cruise target picker: decides which star the voyage HUD highlights.
//
// Re-scores on a fixed cadence (or immediately when nothing is highlighted)
// and favours stars near the center of view, mildly penalising distance and
// adding a pinch of seeded jitter so long cruises do not replay the same
// tour every time.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::star::{Star, StarId};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Seconds between re-scoring passes once a target is held.
const SWITCH_INTERVAL: f32 = 7.0;
/// Candidates outside this camera-distance band are skipped.
const MAX_DISTANCE: f32 = 80.0;
const MIN_DISTANCE: f32 = 5.0;
/// Candidates more than this far off the view axis never qualify, radians.
const MAX_ANGLE: f32 = 0.6;
/// Score penalty per unit of camera distance.
const DISTANCE_PENALTY: f32 = 0.005;
/// Upper bound of the uniform jitter added to each score.
const JITTER: f32 = 0.2;

// ============================================================================
// PICKER
// ============================================================================

pub struct CruiseTargetPicker {
    active: Option<StarId>,
    last_switch: f32,
    rng: StdRng,
}

impl CruiseTargetPicker {
    /// The RNG seed is injected so a session (or a test) can replay the same
    /// sequence of highlights.
    pub fn new(seed: u64) -> Self {
        Self {
            active: None,
            last_switch: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn active(&self) -> Option<StarId> {
        self.active
    }

    /// One tick. `enabled` is the conjunction of cruise being active and the
    /// highlight HUD being on; while false the target clears immediately.
    pub fn update(
        &mut self,
        enabled: bool,
        stars: &[Star],
        cam_pos: Vec3,
        cam_facing: Vec3,
        elapsed: f32,
    ) {
        if !enabled {
            self.active = None;
            return;
        }

        let due = elapsed - self.last_switch > SWITCH_INTERVAL;
        if !due && self.active.is_some() {
            return;
        }

        let mut best: Option<(f32, &Star)> = None;
        for star in stars {
            let to_star = star.position - cam_pos;
            let dist = to_star.length();
            if dist > MAX_DISTANCE || dist < MIN_DISTANCE {
                continue;
            }

            let angle = cam_facing.angle_between(to_star / dist);
            if !(angle < MAX_ANGLE) {
                continue;
            }

            let score = angle + dist * DISTANCE_PENALTY + self.rng.r#gen::<f32>() * JITTER;
            // Strict comparison: ties go to the first candidate found.
            if best.is_none_or(|(s, _)| score < s) {
                best = Some((score, star));
            }
        }

        if let Some((_, star)) = best {
            if self.active != Some(star.id) {
                log::debug!("cruise highlight -> {:?} ({})", star.id, star.content);
                self.active = Some(star.id);
                self.last_switch = elapsed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::star::StarId;

    const CAM: Vec3 = Vec3::ZERO;
    const FACING: Vec3 = Vec3::NEG_Z;

    fn star_at(id: u64, pos: Vec3) -> Star {
        Star::new(StarId(id), format!("q{id}"), pos)
    }

    /// A comfortable candidate straight ahead plus one off to the side.
    fn two_ahead() -> Vec<Star> {
        vec![
            star_at(0, Vec3::new(0.0, 0.0, -20.0)),
            star_at(1, Vec3::new(6.0, 0.0, -20.0)),
        ]
    }

    #[test]
    fn picks_immediately_when_unset() {
        let mut picker = CruiseTargetPicker::new(1);
        picker.update(true, &two_ahead(), CAM, FACING, 0.1);
        assert!(picker.active().is_some());
    }

    #[test]
    fn holds_target_through_the_interval_window() {
        let mut picker = CruiseTargetPicker::new(1);
        let stars = two_ahead();
        picker.update(true, &stars, CAM, FACING, 0.1);
        let first = picker.active();

        // Within the window nothing may change, regardless of scores.
        let mut t = 0.2;
        while t < SWITCH_INTERVAL {
            picker.update(true, &stars, CAM, FACING, t);
            assert_eq!(picker.active(), first);
            t += 0.5;
        }
    }

    #[test]
    fn distance_band_filters_candidates() {
        let mut picker = CruiseTargetPicker::new(2);
        let stars = vec![
            star_at(0, Vec3::new(0.0, 0.0, -2.0)),   // too close
            star_at(1, Vec3::new(0.0, 0.0, -300.0)), // too far
        ];
        picker.update(true, &stars, CAM, FACING, 0.1);
        assert_eq!(picker.active(), None);
    }

    #[test]
    fn angular_gate_excludes_off_axis_stars() {
        let mut picker = CruiseTargetPicker::new(3);
        // ~90° off the view axis, well outside the qualifying cone.
        let stars = vec![star_at(0, Vec3::new(30.0, 0.0, -1.0))];
        picker.update(true, &stars, CAM, FACING, 0.1);
        assert_eq!(picker.active(), None);
    }

    #[test]
    fn disabling_clears_the_target_immediately() {
        let mut picker = CruiseTargetPicker::new(4);
        picker.update(true, &two_ahead(), CAM, FACING, 0.1);
        assert!(picker.active().is_some());
        picker.update(false, &two_ahead(), CAM, FACING, 0.2);
        assert_eq!(picker.active(), None);
    }

    #[test]
    fn same_seed_same_tour() {
        let stars: Vec<Star> = (0..12)
            .map(|i| {
                let a = i as f32;
                star_at(i, Vec3::new((a * 1.3).sin() * 8.0, 0.0, -15.0 - a))
            })
            .collect();

        let tour = |seed: u64| {
            let mut picker = CruiseTargetPicker::new(seed);
            let mut picks = Vec::new();
            let mut t = 0.0;
            for _ in 0..5 {
                t += SWITCH_INTERVAL + 0.5;
                picker.update(true, &stars, CAM, FACING, t);
                picks.push(picker.active());
            }
            picks
        };

        assert_eq!(tour(99), tour(99));
    }
}

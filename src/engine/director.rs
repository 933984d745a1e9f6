// Camera director: free orbit, locked focus, and autonomous cruise.
//
// One state machine, three mutually exclusive per-tick behaviors:
//   - FreeOrbit:    the orbit camera alone answers to the user
//   - LockedFocus:  ease toward a fixed offset from the viewed star
//   - Cruise:       steer along a persistent heading toward star-dense space
//
// Cruise shares a single steering algorithm between two intensity presets;
// the slow preset reads as idle drifting, the full preset as flight.

use glam::Vec3;

use super::camera::OrbitCamera;
use super::star::Star;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Cruise translation speed before the preset multiplier, units/sec.
const BASE_SPEED: f32 = 0.5;
/// Stars ahead must be at least this aligned with the heading to attract
/// (dot of unit heading and unit direction-to-star).
const FORWARD_CONE_DOT: f32 = 0.2;
/// Inverse-distance weighting epsilon.
const WEIGHT_EPSILON: f32 = 0.1;
/// Below this much total attraction the space ahead counts as empty.
const VOID_WEIGHT_THRESHOLD: f32 = 0.1;
/// How many stars the void-avoidance fallback scans.
const VOID_SCAN_CAP: usize = 50;
/// Fallback star must be within this range, else steer for the origin.
const VOID_FALLBACK_RANGE: f32 = 100.0;
/// Weight given to the void-avoidance fallback target.
const VOID_FALLBACK_WEIGHT: f32 = 5.0;
/// Hard ceiling on camera distance from the origin.
const MAX_RANGE: f32 = 500.0;
/// The orbit look target is kept at least this far ahead of the camera.
const MIN_LOOK_AHEAD: f32 = 10.0;
/// Locked-focus eye offset from the star: up and back.
const FOCUS_OFFSET_UP: f32 = 12.0;
const FOCUS_OFFSET_BACK: f32 = 45.0;
/// Locked-focus exponential ease rate, 1/sec.
const FOCUS_LERP_RATE: f32 = 3.0;

// ============================================================================
// MODES & PRESETS
// ============================================================================

/// Which behavior ran this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    FreeOrbit,
    LockedFocus,
    Cruise,
}

/// Tuning for one cruise intensity. Both presets drive the same steering
/// code; only the multipliers differ.
#[derive(Debug, Clone, Copy)]
pub struct CruiseConfig {
    pub speed_mul: f32,
    pub steer_rate: f32,
    pub noise_amp: f32,
    pub target_lerp: f32,
    /// How many stars (in enumeration order) are considered per tick.
    pub search_limit: usize,
    pub search_radius: f32,
}

impl CruiseConfig {
    /// Full voyage: the camera flies.
    pub const FULL: Self = Self {
        speed_mul: 1.0,
        steer_rate: 1.0,
        noise_amp: 0.3,
        target_lerp: 1.5,
        search_limit: 100,
        search_radius: 80.0,
    };

    /// Ambient drift while the regular UI is up: barely perceptible motion.
    pub const AMBIENT: Self = Self {
        speed_mul: 0.02,
        steer_rate: 0.01,
        noise_amp: 0.05,
        target_lerp: 0.1,
        search_limit: 10,
        search_radius: 40.0,
    };
}

/// External flags the director arbitrates between, sampled once per tick.
#[derive(Debug, Clone, Copy)]
pub struct DirectorInputs<'a> {
    /// The star the camera is locked onto, if any.
    pub viewing: Option<&'a Star>,
    /// Cruise master toggle. Off means free orbit whenever nothing is viewed.
    pub cruise_enabled: bool,
    /// True while the user is dragging the camera by hand.
    pub interacting: bool,
    pub preset: CruiseConfig,
}

// ============================================================================
// DIRECTOR
// ============================================================================

pub struct CameraDirector {
    /// Unit direction of autonomous travel. Survives across frames and mode
    /// changes so cruise resumes smoothly after a lock or a manual drag.
    heading: Vec3,
    /// Eased look-at point used by locked focus.
    look_target: Vec3,
}

impl CameraDirector {
    pub fn new() -> Self {
        Self {
            heading: Vec3::NEG_Z,
            look_target: Vec3::ZERO,
        }
    }

    pub fn heading(&self) -> Vec3 {
        self.heading
    }

    /// Advance the camera one tick. Returns the mode that ran.
    pub fn update(
        &mut self,
        camera: &mut OrbitCamera,
        stars: &[Star],
        inputs: DirectorInputs,
        dt: f32,
        elapsed: f32,
    ) -> CameraMode {
        if let Some(star) = inputs.viewing {
            self.locked_focus(camera, star, dt);
            return CameraMode::LockedFocus;
        }

        if inputs.cruise_enabled {
            self.cruise(camera, stars, inputs.interacting, inputs.preset, dt, elapsed);
            CameraMode::Cruise
        } else {
            // Free orbit: the OrbitCamera handles the user's input on its
            // own. Keep the heading aligned with the view so a later cruise
            // starts off where the user is looking.
            self.heading = camera.facing();
            CameraMode::FreeOrbit
        }
    }

    /// Ease toward a framing position above and behind the star, and the
    /// look target toward a point just above it.
    fn locked_focus(&mut self, camera: &mut OrbitCamera, star: &Star, dt: f32) {
        let above = star.position + Vec3::new(0.0, FOCUS_OFFSET_UP, 0.0);
        let eye = above + Vec3::new(0.0, 0.0, FOCUS_OFFSET_BACK);

        let t = (FOCUS_LERP_RATE * dt).min(1.0);
        camera.position = camera.position.lerp(eye, t);
        self.look_target = self.look_target.lerp(above, t);
        camera.target = self.look_target;
    }

    fn cruise(
        &mut self,
        camera: &mut OrbitCamera,
        stars: &[Star],
        interacting: bool,
        cfg: CruiseConfig,
        dt: f32,
        elapsed: f32,
    ) {
        // Never fight the user: while they drag, adopt whatever direction
        // they leave the camera facing and skip steering entirely.
        if interacting || stars.is_empty() {
            self.heading = camera.facing();
            return;
        }

        let cam_pos = camera.position;

        // Weighted attractor over stars ahead of us.
        let mut attractor = Vec3::ZERO;
        let mut total_weight = 0.0;
        for star in stars.iter().take(cfg.search_limit) {
            let to_star = star.position - cam_pos;
            let dist = to_star.length();
            if dist >= cfg.search_radius || dist <= f32::EPSILON {
                continue;
            }
            if self.heading.dot(to_star / dist) > FORWARD_CONE_DOT {
                let weight = 1.0 / (dist + WEIGHT_EPSILON);
                attractor += star.position * weight;
                total_weight += weight;
            }
        }

        // Void avoidance: nothing ahead, so pull hard toward the nearest
        // star (or the origin) instead of sailing into empty space forever.
        if total_weight < VOID_WEIGHT_THRESHOLD {
            let nearest = stars
                .iter()
                .take(VOID_SCAN_CAP)
                .map(|s| (s.position.distance(cam_pos), s.position))
                .min_by(|a, b| a.0.total_cmp(&b.0));
            let fallback = match nearest {
                Some((dist, pos)) if dist < VOID_FALLBACK_RANGE => pos,
                _ => Vec3::ZERO,
            };
            attractor += fallback * VOID_FALLBACK_WEIGHT;
            total_weight += VOID_FALLBACK_WEIGHT;
        }

        attractor /= total_weight;

        let mut desired = if attractor.distance_squared(cam_pos) > 0.01 {
            (attractor - cam_pos).normalize()
        } else {
            self.heading
        };
        if !desired.is_finite() {
            desired = self.heading;
        }

        // Sinusoidal wander so the path never reads as a straight rail.
        desired.x += (elapsed * 0.2).sin() * cfg.noise_amp;
        desired.y += (elapsed * 0.15).cos() * cfg.noise_amp;
        desired = desired.normalize_or(self.heading);

        let steered = self
            .heading
            .lerp(desired, (cfg.steer_rate * dt).min(1.0))
            .normalize_or(self.heading);
        if steered.is_finite() {
            self.heading = steered;
        }

        camera.position += self.heading * BASE_SPEED * cfg.speed_mul * dt;

        // Radial clamp: project back onto the boundary sphere.
        let range = camera.position.length();
        if range > MAX_RANGE {
            camera.position *= MAX_RANGE / range;
        }

        // Ease the orbit target toward a point ahead along the heading, never
        // closer than the minimum look-ahead.
        let look_dist = camera.distance().max(MIN_LOOK_AHEAD);
        let ideal = camera.position + self.heading * look_dist;
        camera.target = camera.target.lerp(ideal, (cfg.target_lerp * dt).min(1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::star::StarId;

    const DT: f32 = 1.0 / 60.0;

    fn star_at(id: u64, pos: Vec3) -> Star {
        Star::new(StarId(id), format!("q{id}"), pos)
    }

    fn cruise_inputs(interacting: bool) -> DirectorInputs<'static> {
        DirectorInputs {
            viewing: None,
            cruise_enabled: true,
            interacting,
            preset: CruiseConfig::FULL,
        }
    }

    #[test]
    fn heading_stays_unit_length_over_many_ticks() {
        let mut director = CameraDirector::new();
        let mut camera = OrbitCamera::new();
        let stars: Vec<Star> = (0..40)
            .map(|i| {
                let a = i as f32 * 0.7;
                star_at(i, Vec3::new(a.sin() * 30.0, a.cos() * 10.0, -(i as f32)))
            })
            .collect();

        let mut elapsed = 0.0;
        for _ in 0..2000 {
            elapsed += DT;
            director.update(&mut camera, &stars, cruise_inputs(false), DT, elapsed);
            let len = director.heading().length();
            assert!(
                (len - 1.0).abs() < 1e-3 && director.heading().is_finite(),
                "heading degenerated: {:?}",
                director.heading()
            );
        }
    }

    #[test]
    fn degenerate_attractor_keeps_previous_heading() {
        let mut director = CameraDirector::new();
        let mut camera = OrbitCamera::new();
        // One star exactly at the camera: direction-to-attractor is
        // undefined, the previous heading must survive.
        camera.position = Vec3::new(3.0, 0.0, 3.0);
        let stars = vec![star_at(0, camera.position)];
        director.update(&mut camera, &stars, cruise_inputs(false), DT, 0.5);
        assert!(director.heading().is_finite());
        assert!((director.heading().length() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn interaction_freezes_heading_to_camera_facing() {
        let mut director = CameraDirector::new();
        let mut camera = OrbitCamera::new();
        camera.position = Vec3::new(0.0, 0.0, 50.0);
        camera.target = Vec3::new(50.0, 0.0, 50.0);
        let stars = vec![star_at(0, Vec3::new(0.0, 0.0, -30.0))];

        let before = camera.position;
        director.update(&mut camera, &stars, cruise_inputs(true), DT, 1.0);
        assert_eq!(camera.position, before, "no motion while interacting");
        assert!((director.heading() - Vec3::X).length() < 1e-4);
    }

    #[test]
    fn void_avoidance_steers_toward_origin_when_alone() {
        let mut director = CameraDirector::new();
        let mut camera = OrbitCamera::new();
        // Far out, facing away from everything, no stars within range.
        camera.position = Vec3::new(0.0, 0.0, 400.0);
        camera.target = Vec3::new(0.0, 0.0, 460.0);
        let stars = vec![star_at(0, Vec3::new(0.0, 0.0, -400.0))];

        let mut elapsed = 0.0;
        for _ in 0..3000 {
            elapsed += DT;
            director.update(&mut camera, &stars, cruise_inputs(false), DT, elapsed);
        }
        // Steering has had ample time to swing the heading back inward.
        assert!(
            director.heading().dot(-camera.position.normalize_or(Vec3::Z)) > 0.0,
            "heading still points away from the populated region"
        );
    }

    #[test]
    fn camera_range_is_clamped() {
        let mut director = CameraDirector::new();
        let mut camera = OrbitCamera::new();
        camera.position = Vec3::new(0.0, 0.0, 499.9);
        camera.target = Vec3::new(0.0, 0.0, 560.0);
        // A lone star straight ahead keeps the cruise pushing outward.
        let stars = vec![star_at(0, Vec3::new(0.0, 0.0, 540.0))];

        let mut elapsed = 0.0;
        for _ in 0..600 {
            elapsed += DT;
            director.update(&mut camera, &stars, cruise_inputs(false), DT, elapsed);
            assert!(camera.position.length() <= MAX_RANGE + 1e-2);
        }
    }

    #[test]
    fn locked_focus_converges_on_the_framing_offset() {
        let mut director = CameraDirector::new();
        let mut camera = OrbitCamera::new();
        let star = star_at(0, Vec3::new(10.0, -5.0, -20.0));
        let inputs = DirectorInputs {
            viewing: Some(&star),
            cruise_enabled: true,
            interacting: false,
            preset: CruiseConfig::FULL,
        };

        for _ in 0..1200 {
            let mode = director.update(&mut camera, &[], inputs, DT, 0.0);
            assert_eq!(mode, CameraMode::LockedFocus);
        }

        let expected_eye = star.position + Vec3::new(0.0, FOCUS_OFFSET_UP, FOCUS_OFFSET_BACK);
        let expected_look = star.position + Vec3::new(0.0, FOCUS_OFFSET_UP, 0.0);
        assert!((camera.position - expected_eye).length() < 0.1);
        assert!((camera.target - expected_look).length() < 0.1);
    }

    #[test]
    fn cruise_disabled_yields_free_orbit() {
        let mut director = CameraDirector::new();
        let mut camera = OrbitCamera::new();
        let inputs = DirectorInputs {
            viewing: None,
            cruise_enabled: false,
            interacting: false,
            preset: CruiseConfig::AMBIENT,
        };
        let mode = director.update(&mut camera, &[], inputs, DT, 0.0);
        assert_eq!(mode, CameraMode::FreeOrbit);
    }

    #[test]
    fn ambient_preset_moves_far_slower_than_full() {
        let stars = vec![star_at(0, Vec3::new(0.0, 0.0, -30.0))];

        let run = |preset: CruiseConfig| {
            let mut director = CameraDirector::new();
            let mut camera = OrbitCamera::new();
            camera.position = Vec3::ZERO;
            camera.target = Vec3::new(0.0, 0.0, -10.0);
            let start = camera.position;
            let inputs = DirectorInputs {
                viewing: None,
                cruise_enabled: true,
                interacting: false,
                preset,
            };
            let mut elapsed = 0.0;
            for _ in 0..600 {
                elapsed += DT;
                director.update(&mut camera, &stars, inputs, DT, elapsed);
            }
            camera.position.distance(start)
        };

        let full = run(CruiseConfig::FULL);
        let ambient = run(CruiseConfig::AMBIENT);
        assert!(ambient < full / 10.0, "ambient {ambient} vs full {full}");
    }
}

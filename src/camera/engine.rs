//! Camera transition engine.
//!
//! Owns the camera target (overview or focused on a country), runs eased
//! transitions toward it and idles with a slow auto-rotation when nothing
//! is selected.
//!
//! A new target never queues behind the running transition: the current
//! interpolated state becomes the start of the next one, so motion stays
//! continuous however fast targets change.

use super::easing::Easing;
use super::perspective::PerspectiveCamera;
use super::transition::{CameraState, Transition};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, TAU};

/// Pitch limit for user orbiting, just short of the poles.
const MAX_PITCH: f32 = FRAC_PI_2 - 0.017;

/// Camera tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Distance the intro transition starts from
    pub start_distance: f32,
    /// Distance while nothing is selected
    pub overview_distance: f32,
    /// Distance while a country is selected
    pub focused_distance: f32,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Horizontal view offset in pixels while a country is selected
    pub focused_offset: f32,
    /// Transition length in seconds
    pub transition_seconds: f32,
    pub easing: Easing,
    pub auto_rotate: bool,
    /// 1.0 is one revolution per minute
    pub auto_rotate_speed: f32,
    /// Start far away and move in to the overview distance
    pub intro: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            start_distance: 10.0,
            overview_distance: 3.0,
            focused_distance: 2.0,
            fov_degrees: 50.0,
            focused_offset: -400.0,
            transition_seconds: 1.2,
            easing: Easing::EaseOutCubic,
            auto_rotate: true,
            auto_rotate_speed: 1.0,
            intro: true,
        }
    }
}

/// What the camera is heading for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraTarget {
    Overview,
    /// Unit direction toward the selected country
    Focused(Vec3),
}

/// Drives the camera between overview and focused views.
#[derive(Debug, Clone)]
pub struct CameraTransitionEngine {
    settings: CameraSettings,
    state: CameraState,
    target: CameraTarget,
    transition: Option<Transition>,
}

impl CameraTransitionEngine {
    pub fn new(settings: CameraSettings) -> Self {
        let state = CameraState {
            direction: Vec3::Z,
            distance: if settings.intro {
                settings.start_distance
            } else {
                settings.overview_distance
            },
            fov_degrees: settings.fov_degrees,
            view_offset: 0.0,
        };

        let mut engine = Self {
            settings,
            state,
            target: CameraTarget::Overview,
            transition: None,
        };
        if engine.settings.intro {
            engine.start_transition();
        }
        engine
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Current interpolated camera state.
    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn target(&self) -> CameraTarget {
        self.target
    }

    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// True only while settled in the overview.
    pub fn is_auto_rotating(&self) -> bool {
        self.settings.auto_rotate
            && self.target == CameraTarget::Overview
            && self.transition.is_none()
    }

    /// Focuses on `center` or, with `None`, returns to the overview.
    ///
    /// Returns false when nothing changed: the target is already current or
    /// the center has no usable direction.
    pub fn set_target(&mut self, center: Option<Vec3>) -> bool {
        let target = match center {
            Some(center) => match center.try_normalize() {
                Some(direction) => CameraTarget::Focused(direction),
                None => {
                    log::debug!("Ignoring focus on degenerate center {:?}", center);
                    return false;
                }
            },
            None => CameraTarget::Overview,
        };

        if target == self.target {
            return false;
        }

        log::debug!("Camera target {:?} -> {:?}", self.target, target);
        self.target = target;
        self.start_transition();
        true
    }

    /// Advances time by `dt` seconds and returns the new state.
    pub fn tick(&mut self, dt: f32) -> &CameraState {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        if let Some(transition) = self.transition.as_mut() {
            self.state = transition.advance(dt);
            if transition.is_finished() {
                self.state = *transition.end();
                self.transition = None;
            }
        } else if self.is_auto_rotating() {
            let rate = TAU / 60.0 * self.settings.auto_rotate_speed;
            // Negative angle about +Y moves the camera west
            let rotation = Quat::from_rotation_y(-rate * dt);
            self.state.direction = (rotation * self.state.direction).normalize_or_zero();
        }

        &self.state
    }

    /// Rotates the camera by a user drag. Ignored while a transition runs.
    pub fn orbit(&mut self, yaw: f32, pitch: f32) -> bool {
        if self.transition.is_some() || !yaw.is_finite() || !pitch.is_finite() {
            return false;
        }

        let d = self.state.direction;
        let current_yaw = d.x.atan2(d.z);
        let current_pitch = d.y.clamp(-1.0, 1.0).asin();

        let yaw = current_yaw + yaw;
        let pitch = (current_pitch + pitch).clamp(-MAX_PITCH, MAX_PITCH);
        self.state.direction = Vec3::new(
            pitch.cos() * yaw.sin(),
            pitch.sin(),
            pitch.cos() * yaw.cos(),
        );
        true
    }

    /// Writes the current state into the render camera.
    pub fn apply(&self, camera: &mut PerspectiveCamera) {
        camera.position = self.state.position();
        camera.look_at(Vec3::ZERO);
        camera.fov_degrees = self.state.fov_degrees;

        let viewport = camera.viewport();
        camera.set_view_offset(
            viewport.x,
            viewport.y,
            self.state.view_offset,
            0.0,
            viewport.x,
            viewport.y,
        );
    }

    fn target_state(&self) -> CameraState {
        match self.target {
            CameraTarget::Overview => CameraState {
                direction: self.state.direction,
                distance: self.settings.overview_distance,
                fov_degrees: self.settings.fov_degrees,
                view_offset: 0.0,
            },
            CameraTarget::Focused(direction) => CameraState {
                direction,
                distance: self.settings.focused_distance,
                fov_degrees: self.settings.fov_degrees,
                view_offset: self.settings.focused_offset,
            },
        }
    }

    fn start_transition(&mut self) {
        if let Some(old) = self.transition.as_mut() {
            old.cancel();
        }
        self.transition = Some(Transition::new(
            self.state,
            self.target_state(),
            self.settings.transition_seconds,
            self.settings.easing,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    const DT: f32 = 1.0 / 60.0;

    fn settled() -> CameraTransitionEngine {
        CameraTransitionEngine::new(CameraSettings {
            intro: false,
            ..Default::default()
        })
    }

    fn run_to_end(engine: &mut CameraTransitionEngine) {
        for _ in 0..1000 {
            if !engine.is_transitioning() {
                return;
            }
            engine.tick(DT);
        }
        panic!("transition never finished");
    }

    #[test]
    fn test_intro_moves_in() {
        let mut engine = CameraTransitionEngine::new(CameraSettings::default());
        assert!(engine.is_transitioning());
        assert_eq!(engine.state().distance, 10.0);
        assert!(!engine.is_auto_rotating());

        run_to_end(&mut engine);
        assert_eq!(engine.state().distance, 3.0);
        assert_eq!(engine.state().direction, Vec3::Z);
        assert!(engine.is_auto_rotating());
    }

    #[test]
    fn test_focus_scenario() {
        let mut engine = settled();
        assert!(engine.set_target(Some(Vec3::new(1.0, 0.0, 0.0))));

        while engine.is_transitioning() {
            assert!(!engine.is_auto_rotating());
            engine.tick(DT);
        }

        let state = engine.state();
        assert_eq!(state.direction, Vec3::X);
        assert_eq!(state.distance, 2.0);
        assert_eq!(state.view_offset, -400.0);

        // Still no rotation while focused
        let before = *engine.state();
        engine.tick(1.0);
        assert!(!engine.is_auto_rotating());
        assert_eq!(*engine.state(), before);
    }

    #[test]
    fn test_clear_mid_transition_starts_from_current_state() {
        let mut engine = settled();
        engine.set_target(Some(Vec3::X));

        let frames = (0.4 * 1.2 / DT).round() as usize;
        for _ in 0..frames {
            engine.tick(DT);
        }
        let at_forty = *engine.state();
        let progress = engine.transition().unwrap().progress();
        assert!((progress - 0.4).abs() < 0.02);

        assert!(engine.set_target(None));
        let transition = engine.transition().unwrap();
        assert_eq!(*transition.start(), at_forty);
        assert_eq!(transition.progress(), 0.0);

        run_to_end(&mut engine);
        let state = engine.state();
        assert!(state.direction.abs_diff_eq(at_forty.direction, 1e-6));
        assert_eq!(state.distance, 3.0);
        assert_eq!(state.view_offset, 0.0);
    }

    #[test]
    fn test_rapid_toggles_are_continuous() {
        let mut engine = settled();
        let settings = engine.settings().clone();
        // Ease-out cubic peaks at 3x the linear rate at t = 0
        let max_step = 3.0 * DT / settings.transition_seconds;
        // Normalized lerp between directions at most a quarter turn apart
        // turns at most twice as fast as its parameter
        let max_angle = 2.0 * max_step * 1.05 + 1e-4;
        let max_distance =
            (settings.overview_distance - settings.focused_distance) * max_step * 1.05;
        let max_offset = settings.focused_offset.abs() * max_step * 1.05;

        let mut last = *engine.state();

        for frame in 0..600 {
            if frame % 7 == 0 {
                let target = if (frame / 7) % 2 == 0 {
                    Some(Vec3::new(1.0, 0.2, 0.0))
                } else {
                    None
                };
                engine.set_target(target);
                // Retargeting alone never moves the camera
                assert_eq!(engine.state().position(), last.position());
            }
            engine.tick(DT);

            let state = *engine.state();
            let angle = state.direction.dot(last.direction).clamp(-1.0, 1.0).acos();
            assert!(angle <= max_angle, "turned {angle} rad at frame {frame}");
            assert!(
                (state.distance - last.distance).abs() <= max_distance,
                "distance jumped {} at frame {}",
                state.distance - last.distance,
                frame
            );
            assert!((state.view_offset - last.view_offset).abs() <= max_offset);
            last = state;
        }
    }

    #[test]
    fn test_same_target_is_noop() {
        let mut engine = settled();
        assert!(!engine.set_target(None));
        assert!(!engine.is_transitioning());

        assert!(engine.set_target(Some(Vec3::new(0.0, 0.0, 2.0))));
        engine.tick(DT);
        let elapsed = engine.transition().unwrap().elapsed();
        // Same direction, different magnitude
        assert!(!engine.set_target(Some(Vec3::Z)));
        assert_eq!(engine.transition().unwrap().elapsed(), elapsed);
    }

    #[test]
    fn test_degenerate_center_is_ignored() {
        let mut engine = settled();
        assert!(!engine.set_target(Some(Vec3::ZERO)));
        assert!(!engine.set_target(Some(Vec3::new(f32::NAN, 0.0, 1.0))));
        assert_eq!(engine.target(), CameraTarget::Overview);
        assert!(!engine.is_transitioning());
    }

    #[test]
    fn test_auto_rotation_goes_west() {
        let mut engine = settled();
        assert!(engine.is_auto_rotating());
        engine.tick(1.0);

        let angle = TAU / 60.0;
        let expected = Vec3::new(-angle.sin(), 0.0, angle.cos());
        assert!(engine.state().direction.abs_diff_eq(expected, 1e-5));
        assert_eq!(engine.state().distance, 3.0);
    }

    #[test]
    fn test_auto_rotation_disabled() {
        let mut engine = CameraTransitionEngine::new(CameraSettings {
            intro: false,
            auto_rotate: false,
            ..Default::default()
        });
        engine.tick(1.0);
        assert!(!engine.is_auto_rotating());
        assert_eq!(engine.state().direction, Vec3::Z);
    }

    #[test]
    fn test_orbit() {
        let mut engine = settled();
        assert!(engine.orbit(FRAC_PI_2, 0.0));
        assert!(engine.state().direction.abs_diff_eq(Vec3::X, 1e-5));

        // Pitch stops short of the pole
        engine.orbit(0.0, 10.0);
        assert!(engine.state().direction.y < 1.0);
        assert!(engine.state().direction.y > 0.99);

        engine.set_target(Some(Vec3::Z));
        assert!(!engine.orbit(0.1, 0.0));
    }

    #[test]
    fn test_apply_to_camera() {
        let mut engine = settled();
        engine.set_target(Some(Vec3::X));
        run_to_end(&mut engine);

        let mut camera = PerspectiveCamera::new(Vec2::new(1600.0, 900.0), 75.0);
        engine.apply(&mut camera);

        assert!(camera.position.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-6));
        assert_eq!(camera.target, Vec3::ZERO);
        assert_eq!(camera.fov_degrees, 50.0);
        let offset = camera.view_offset().unwrap();
        assert_eq!(offset.x, -400.0);
        assert_eq!(offset.full_width, 1600.0);
        assert_eq!(offset.width, 1600.0);
    }
}

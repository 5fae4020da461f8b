//! Camera state and eased transitions between two states.

use super::easing::Easing;
use glam::Vec3;

/// Start and end directions closer to opposite than this go through a
/// perpendicular waypoint.
const ANTIPODAL_DOT: f32 = -0.999;

/// Where the camera is and how it projects.
///
/// The camera always looks at the globe center, so its position is
/// `direction * distance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    /// Unit vector from the globe center toward the camera
    pub direction: Vec3,
    /// Distance from the globe center
    pub distance: f32,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Horizontal projection shift in pixels
    pub view_offset: f32,
}

impl CameraState {
    pub fn position(&self) -> Vec3 {
        self.direction * self.distance
    }

    /// Interpolates towards `other`.
    ///
    /// The direction is lerped component-wise and renormalized, then the
    /// lerped distance is applied.
    pub fn lerp(&self, other: &CameraState, t: f32) -> CameraState {
        CameraState {
            direction: lerp_direction(self.direction, other.direction, t),
            distance: lerp(self.distance, other.distance, t),
            fov_degrees: lerp(self.fov_degrees, other.fov_degrees, t),
            view_offset: lerp(self.view_offset, other.view_offset, t),
        }
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn lerp_direction(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a.lerp(b, t)
        .try_normalize()
        .unwrap_or(if t < 0.5 { a } else { b })
}

/// One eased movement from a start state to an end state.
#[derive(Debug, Clone)]
pub struct Transition {
    start: CameraState,
    end: CameraState,
    waypoint: Option<Vec3>,
    elapsed: f32,
    duration: f32,
    easing: Easing,
    cancelled: bool,
}

impl Transition {
    pub fn new(start: CameraState, end: CameraState, duration: f32, easing: Easing) -> Self {
        let waypoint = (start.direction.dot(end.direction) < ANTIPODAL_DOT).then(|| {
            Vec3::Y
                .cross(start.direction)
                .try_normalize()
                .unwrap_or_else(|| start.direction.any_orthonormal_vector())
        });

        Self {
            start,
            end,
            waypoint,
            elapsed: 0.0,
            duration: if duration.is_finite() { duration.max(0.0) } else { 0.0 },
            easing,
            cancelled: false,
        }
    }

    pub fn start(&self) -> &CameraState {
        &self.start
    }

    pub fn end(&self) -> &CameraState {
        &self.end
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Linear progress in [0, 1].
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Advances time and returns the new interpolated state.
    ///
    /// A cancelled transition no longer moves.
    pub fn advance(&mut self, dt: f32) -> CameraState {
        if !self.cancelled && dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
        self.sample()
    }

    /// State at the current elapsed time. Exactly `end` once finished.
    pub fn sample(&self) -> CameraState {
        if self.is_finished() {
            return self.end;
        }

        let t = self.easing.apply(self.progress());
        let mut state = self.start.lerp(&self.end, t);

        if let Some(waypoint) = self.waypoint {
            state.direction = if t < 0.5 {
                lerp_direction(self.start.direction, waypoint, t * 2.0)
            } else {
                lerp_direction(waypoint, self.end.direction, t * 2.0 - 1.0)
            };
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(direction: Vec3, distance: f32, offset: f32) -> CameraState {
        CameraState {
            direction,
            distance,
            fov_degrees: 50.0,
            view_offset: offset,
        }
    }

    #[test]
    fn test_lerp_keeps_unit_direction() {
        let a = state(Vec3::Z, 3.0, 0.0);
        let b = state(Vec3::X, 2.0, -400.0);
        for i in 0..=10 {
            let s = a.lerp(&b, i as f32 / 10.0);
            assert!((s.direction.length() - 1.0).abs() < 1e-5);
        }
        let mid = a.lerp(&b, 0.5);
        assert!((mid.distance - 2.5).abs() < 1e-6);
        assert!((mid.view_offset - -200.0).abs() < 1e-4);
        assert!((mid.position().length() - 2.5).abs() < 1e-5);
    }

    #[test]
    fn test_ends_exactly() {
        let end = state(Vec3::new(0.6, 0.0, 0.8), 2.0, -400.0);
        let mut t = Transition::new(state(Vec3::Z, 3.0, 0.0), end, 1.0, Easing::EaseOutCubic);
        // Odd frame times overshoot the duration
        for _ in 0..7 {
            t.advance(0.17);
        }
        assert!(t.is_finished());
        assert_eq!(t.sample(), end);
    }

    #[test]
    fn test_zero_duration_is_instant() {
        let end = state(Vec3::X, 2.0, -400.0);
        let t = Transition::new(state(Vec3::Z, 3.0, 0.0), end, 0.0, Easing::Linear);
        assert!(t.is_finished());
        assert_eq!(t.sample(), end);
    }

    #[test]
    fn test_cancelled_transition_stops() {
        let mut t = Transition::new(
            state(Vec3::Z, 3.0, 0.0),
            state(Vec3::X, 2.0, 0.0),
            1.0,
            Easing::Linear,
        );
        let before = t.advance(0.25);
        t.cancel();
        assert!(t.is_cancelled());
        assert_eq!(t.advance(0.5), before);
        assert!((t.elapsed() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_antipodal_path_stays_on_sphere() {
        let mut t = Transition::new(
            state(Vec3::Z, 3.0, 0.0),
            state(-Vec3::Z, 3.0, 0.0),
            1.0,
            Easing::Linear,
        );
        for _ in 0..21 {
            let s = t.advance(0.05);
            assert!(s.direction.is_finite());
            assert!((s.direction.length() - 1.0).abs() < 1e-5);
        }
        assert_eq!(t.sample().direction, -Vec3::Z);
    }

    #[test]
    fn test_non_finite_dt_is_ignored() {
        let mut t = Transition::new(
            state(Vec3::Z, 3.0, 0.0),
            state(Vec3::X, 2.0, 0.0),
            1.0,
            Easing::Linear,
        );
        t.advance(f32::NAN);
        t.advance(-1.0);
        assert_eq!(t.elapsed(), 0.0);
    }
}

//! Geographic to spherical coordinate conversion.
//!
//! Maps (longitude, latitude) pairs onto the globe and back. Axis convention
//! (right-handed, shared by meshes, picking and the camera):
//! - +Y points to the north pole
//! - +Z is lon=0°, lat=0° (faces the default camera)
//! - +X is lon=90°E, lat=0°

use glam::Vec3;

/// Radius of the rendered globe in world units.
pub const GLOBE_RADIUS: f32 = 1.0;

/// Wraps a longitude in degrees into [-180, 180).
///
/// Non-finite input maps to 0.
pub fn wrap_longitude(lon: f64) -> f64 {
    if !lon.is_finite() {
        return 0.0;
    }
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Clamps a latitude in degrees to [-90, 90].
///
/// Non-finite input maps to 0.
pub fn clamp_latitude(lat: f64) -> f64 {
    if !lat.is_finite() {
        return 0.0;
    }
    lat.clamp(-90.0, 90.0)
}

/// Projects geographic coordinates (degrees) onto the globe surface.
///
/// Out-of-range longitude wraps and out-of-range latitude is clamped, so
/// this never fails.
pub fn project(lon: f64, lat: f64) -> Vec3 {
    project_with_radius(lon, lat, GLOBE_RADIUS)
}

/// Projects geographic coordinates onto a sphere of the given radius.
pub fn project_with_radius(lon: f64, lat: f64, radius: f32) -> Vec3 {
    let lon = wrap_longitude(lon).to_radians();
    let lat = clamp_latitude(lat).to_radians();

    // Computed in f64 so points stay unit length after the cast
    let cos_lat = lat.cos();
    let x = cos_lat * lon.sin();
    let y = lat.sin();
    let z = cos_lat * lon.cos();

    Vec3::new(x as f32, y as f32, z as f32) * radius
}

/// Converts a point on (or off) the globe back to (longitude, latitude).
///
/// The point is treated as a direction from the globe center; the zero
/// vector maps to (0, 0).
pub fn unproject(point: Vec3) -> (f64, f64) {
    let Some(dir) = point.try_normalize() else {
        return (0.0, 0.0);
    };

    let lat = (dir.y as f64).clamp(-1.0, 1.0).asin().to_degrees();
    let lon = (dir.x as f64).atan2(dir.z as f64).to_degrees();

    (wrap_longitude(lon), lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_points() {
        assert!(project(0.0, 0.0).abs_diff_eq(Vec3::Z, 1e-6));
        assert!(project(90.0, 0.0).abs_diff_eq(Vec3::X, 1e-6));
        assert!(project(-90.0, 0.0).abs_diff_eq(-Vec3::X, 1e-6));
        assert!(project(0.0, 90.0).abs_diff_eq(Vec3::Y, 1e-6));
        assert!(project(123.0, -90.0).abs_diff_eq(-Vec3::Y, 1e-6));
    }

    #[test]
    fn test_unit_length_over_grid() {
        for lon in (-180..=180).step_by(15) {
            for lat in (-90..=90).step_by(10) {
                let p = project(lon as f64, lat as f64);
                assert!(
                    (p.length() - 1.0).abs() < 1e-5,
                    "({}, {}) has length {}",
                    lon,
                    lat,
                    p.length()
                );
            }
        }
    }

    #[test]
    fn test_longitude_wraps() {
        for lon in [-170.0, -45.5, 0.0, 12.25, 179.0] {
            for lat in [-60.0, 0.0, 33.3] {
                let a = project(lon, lat);
                let b = project(lon + 360.0, lat);
                let c = project(lon - 720.0, lat);
                assert!(a.abs_diff_eq(b, 1e-5));
                assert!(a.abs_diff_eq(c, 1e-5));
            }
        }
        assert!((wrap_longitude(190.0) - -170.0).abs() < 1e-9);
        assert!((wrap_longitude(-190.0) - 170.0).abs() < 1e-9);
    }

    #[test]
    fn test_latitude_clamps() {
        assert!(project(10.0, 120.0).abs_diff_eq(project(10.0, 90.0), 1e-6));
        assert!(project(10.0, -500.0).abs_diff_eq(project(10.0, -90.0), 1e-6));
    }

    #[test]
    fn test_non_finite_input() {
        let p = project(f64::NAN, f64::INFINITY);
        assert!(p.abs_diff_eq(Vec3::Z, 1e-6));
    }

    #[test]
    fn test_radius_scaling() {
        let p = project_with_radius(45.0, 10.0, 0.5);
        assert!((p.length() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_unproject_round_trip() {
        let (lon, lat) = unproject(project(-73.5, 40.7));
        assert!((lon - -73.5).abs() < 1e-3);
        assert!((lat - 40.7).abs() < 1e-3);

        assert_eq!(unproject(Vec3::ZERO), (0.0, 0.0));
    }
}

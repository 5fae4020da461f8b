//! Perspective camera with an optional shifted view window.

use crate::globe::picking::Ray;
use glam::{Mat4, Vec2, Vec3, Vec4};

/// Sub-window of a larger virtual viewport, in pixels.
///
/// Moving the window by `x` pixels shifts the whole image the opposite way
/// without moving the camera, which is how the focused globe is pushed
/// aside for the info panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewOffset {
    pub full_width: f32,
    pub full_height: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewOffset {
    /// A zero-sized virtual viewport cannot be divided into.
    fn is_usable(&self) -> bool {
        self.full_width > 0.0 && self.full_height > 0.0
    }
}

/// The live render camera.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Viewport size in pixels
    viewport: Vec2,
    view_offset: Option<ViewOffset>,
}

impl PerspectiveCamera {
    pub fn new(viewport: Vec2, fov_degrees: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 10.0),
            target: Vec3::ZERO,
            fov_degrees,
            near: 0.1,
            far: 100.0,
            viewport: sanitize_viewport(viewport),
            view_offset: None,
        }
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = sanitize_viewport(viewport);
    }

    pub fn aspect(&self) -> f32 {
        self.viewport.x / self.viewport.y
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn set_view_offset(
        &mut self,
        full_width: f32,
        full_height: f32,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) {
        self.view_offset = Some(ViewOffset {
            full_width,
            full_height,
            x,
            y,
            width,
            height,
        });
    }

    pub fn clear_view_offset(&mut self) {
        self.view_offset = None;
    }

    pub fn view_offset(&self) -> Option<&ViewOffset> {
        self.view_offset.as_ref()
    }

    pub fn view_matrix(&self) -> Mat4 {
        let Some(forward) = (self.target - self.position).try_normalize() else {
            return Mat4::IDENTITY;
        };
        // Looking straight along the pole axis needs another up vector
        let up = if forward.cross(Vec3::Y).length_squared() < 1e-6 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        Mat4::look_at_rh(self.position, self.target, up)
    }

    /// OpenGL-style frustum, shifted by the view offset when one is set.
    pub fn projection_matrix(&self) -> Mat4 {
        let near = self.near;
        let far = self.far;

        let mut top = near * (self.fov_degrees.to_radians() * 0.5).tan();
        let mut height = 2.0 * top;
        let mut width = self.aspect() * height;
        let mut left = -0.5 * width;

        if let Some(view) = self.view_offset.filter(ViewOffset::is_usable) {
            left += view.x * width / view.full_width;
            top -= view.y * height / view.full_height;
            width *= view.width / view.full_width;
            height *= view.height / view.full_height;
        }

        frustum(left, left + width, top - height, top, near, far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Projects a world point to screen pixels (origin top-left).
    ///
    /// Returns `(x, y, ndc_depth)` or `None` when the point is behind the
    /// camera.
    pub fn project_to_screen(&self, point: Vec3) -> Option<Vec3> {
        self.project_with(&self.view_projection(), point)
    }

    /// Projects many points, building the matrices once.
    pub fn project_points(&self, points: &[Vec3]) -> Vec<Option<Vec3>> {
        let view_projection = self.view_projection();
        points
            .iter()
            .map(|&p| self.project_with(&view_projection, p))
            .collect()
    }

    fn project_with(&self, view_projection: &Mat4, point: Vec3) -> Option<Vec3> {
        let clip = *view_projection * point.extend(1.0);
        if clip.w <= 1e-6 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec3::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.x,
            (1.0 - ndc.y) * 0.5 * self.viewport.y,
            ndc.z,
        ))
    }

    /// World-space ray through a screen pixel.
    pub fn ray_through(&self, screen: Vec2) -> Option<Ray> {
        let ndc_x = screen.x / self.viewport.x * 2.0 - 1.0;
        let ndc_y = 1.0 - screen.y / self.viewport.y * 2.0;

        let inverse = self.view_projection().inverse();
        if !inverse.is_finite() {
            return None;
        }
        let near = inverse.project_point3(Vec3::new(ndc_x, ndc_y, -1.0));
        let far = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        Ray::new(near, far - near)
    }
}

fn sanitize_viewport(viewport: Vec2) -> Vec2 {
    let fix = |v: f32| if v.is_finite() && v >= 1.0 { v } else { 1.0 };
    Vec2::new(fix(viewport.x), fix(viewport.y))
}

fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    Mat4::from_cols(
        Vec4::new(2.0 * near / (right - left), 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * near / (top - bottom), 0.0, 0.0),
        Vec4::new(
            (right + left) / (right - left),
            (top + bottom) / (top - bottom),
            -(far + near) / (far - near),
            -1.0,
        ),
        Vec4::new(0.0, 0.0, -2.0 * far * near / (far - near), 0.0),
    )
}

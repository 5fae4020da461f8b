//! Central globe view: pointer input and mesh painting.
//!
//! Meshes are painted as egui triangle meshes. The globe is convex, so
//! culling triangles that face away from the camera and drawing the ocean
//! before the countries is enough to get a correct image without a depth
//! buffer.

use country_globe::camera::PerspectiveCamera;
use country_globe::globe::CountryMesh;
use country_globe::state::{rgb, AppState, AppearanceSettings, CountryEvent};
use eframe::egui::{self, Color32, Mesh, Pos2, Rect, Sense};
use glam::{Vec2, Vec3};

/// Radians of orbit per dragged pixel.
const DRAG_SPEED: f32 = 0.005;

/// Render the globe and handle pointer input.
pub fn render_globe_view(ctx: &egui::Context, state: &mut AppState, dt: f32) {
    let background = rgb(state.settings.appearance.background);

    egui::CentralPanel::default()
        .frame(egui::Frame::NONE.fill(background))
        .show(ctx, |ui| {
            let (response, painter) =
                ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
            let rect = response.rect;
            let to_local = |p: Pos2| Vec2::new(p.x - rect.min.x, p.y - rect.min.y);

            if response.dragged() {
                let delta = response.drag_delta();
                state.engine.orbit(-delta.x * DRAG_SPEED, delta.y * DRAG_SPEED);
            }

            state.pointer_moved(response.hover_pos().map(to_local));

            if response.clicked() {
                if let Some(pos) = response.interact_pointer_pos() {
                    state.click(to_local(pos));
                }
            }

            if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
                state.dispatch(CountryEvent::ClearSelection);
            }

            state.frame(dt, Vec2::new(rect.width(), rect.height()));

            if let Some(camera) = state.camera.as_ref() {
                paint_globe(&painter, rect, state, camera);
            }

            if state.selection.hovered().is_some() {
                ctx.set_cursor_icon(egui::CursorIcon::PointingHand);
            }
        });
}

fn paint_globe(painter: &egui::Painter, rect: Rect, state: &AppState, camera: &PerspectiveCamera) {
    let appearance = &state.settings.appearance;
    let mut mesh = Mesh::default();

    append_mesh(
        &mut mesh,
        state.scene.ocean(),
        rgb(appearance.ocean),
        rect,
        camera,
        appearance,
    );

    let hovered = state.selection.hovered();
    for entry in state.scene.entries() {
        let color = if hovered == Some(entry.id()) {
            rgb(appearance.hover)
        } else {
            entry.country.color
        };
        append_mesh(&mut mesh, entry.mesh(), color, rect, camera, appearance);
    }

    painter.add(egui::Shape::mesh(mesh));
}

/// Appends the camera-facing triangles of `source`, lit and fogged.
fn append_mesh(
    target: &mut Mesh,
    source: &CountryMesh,
    base: Color32,
    rect: Rect,
    camera: &PerspectiveCamera,
    appearance: &AppearanceSettings,
) {
    if source.is_empty() {
        return;
    }

    let projected = camera.project_points(&source.positions);
    let background = rgb(appearance.background);
    let eye = camera.position;

    // Lazily emitted vertices, indexed like `source.positions`
    let mut emitted: Vec<Option<u32>> = vec![None; source.positions.len()];

    for tri in source.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (pa, pb, pc) = (
            source.positions[a],
            source.positions[b],
            source.positions[c],
        );

        let normal = (pb - pa).cross(pc - pa);
        let centroid = (pa + pb + pc) / 3.0;
        if normal.dot(eye - centroid) <= 0.0 {
            continue;
        }

        let mut out = [0u32; 3];
        let mut visible = true;
        for (slot, &i) in out.iter_mut().zip([a, b, c].iter()) {
            if let Some(v) = emitted[i] {
                *slot = v;
                continue;
            }
            let Some(screen) = projected[i] else {
                visible = false;
                break;
            };
            let position = source.positions[i];
            let color = shade(
                base,
                position,
                source.normals[i],
                eye,
                appearance,
                background,
            );
            let pos = Pos2::new(rect.min.x + screen.x, rect.min.y + screen.y);
            let v = target.vertices.len() as u32;
            target.colored_vertex(pos, color);
            emitted[i] = Some(v);
            *slot = v;
        }

        if visible {
            target.add_triangle(out[0], out[1], out[2]);
        }
    }
}

/// Ambient plus a headlight, blended toward the background with distance.
fn shade(
    base: Color32,
    position: Vec3,
    normal: Vec3,
    eye: Vec3,
    appearance: &AppearanceSettings,
    background: Color32,
) -> Color32 {
    let to_eye = eye - position;
    let distance = to_eye.length();
    let light = to_eye.normalize_or_zero();

    let intensity =
        (appearance.ambient + appearance.diffuse * normal.dot(light).max(0.0)).clamp(0.0, 1.0);

    let fog_span = (appearance.fog_far - appearance.fog_near).max(1e-3);
    let fog = ((distance - appearance.fog_near) / fog_span).clamp(0.0, 1.0);

    let channel = |c: u8, bg: u8| {
        let lit = c as f32 * intensity;
        (lit + (bg as f32 - lit) * fog).round().clamp(0.0, 255.0) as u8
    };
    Color32::from_rgb(
        channel(base.r(), background.r()),
        channel(base.g(), background.g()),
        channel(base.b(), background.b()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shade_lit_face_keeps_color() {
        let appearance = AppearanceSettings {
            fog_near: 10.0,
            fog_far: 20.0,
            ..Default::default()
        };
        let color = shade(
            Color32::WHITE,
            Vec3::Z,
            Vec3::Z,
            Vec3::new(0.0, 0.0, 3.0),
            &appearance,
            Color32::BLACK,
        );
        assert_eq!(color, Color32::WHITE);
    }

    #[test]
    fn test_shade_fogs_to_background() {
        let appearance = AppearanceSettings::default();
        let background = rgb(appearance.background);
        let color = shade(
            Color32::WHITE,
            Vec3::Z,
            Vec3::Z,
            Vec3::new(0.0, 0.0, 20.0),
            &appearance,
            background,
        );
        assert_eq!(color, background);
    }
}

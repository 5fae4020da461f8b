#![warn(clippy::all)]

//! Country Globe - an interactive globe of clickable countries.
//!
//! Hovering a country highlights it, clicking flies the camera to it and
//! opens a side panel; "Back" returns to the slowly rotating overview.

mod ui;

use country_globe::state::{AppState, GlobeSettings};
use eframe::egui;

/// Upper bound on the frame delta fed to the camera, so a stalled frame
/// does not skip a whole transition.
const MAX_FRAME_DT: f32 = 0.1;

// Native entry point
#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Country Globe")
            .with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Country Globe",
        native_options,
        Box::new(|cc| Ok(Box::new(GlobeApp::new(cc)))),
    )
}

// WASM entry point - main is not called on wasm32
#[cfg(target_arch = "wasm32")]
fn main() {}

/// Entry point for the WASM application.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub async fn start() {
    use eframe::wasm_bindgen::JsCast as _;

    // Redirect `log` messages to `console.log`:
    eframe::WebLogger::init(log::LevelFilter::Debug).ok();

    let web_options = eframe::WebOptions::default();

    wasm_bindgen_futures::spawn_local(async {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document to attach to");
            return;
        };

        let Some(canvas) = document
            .get_element_by_id("app_canvas")
            .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
        else {
            log::error!("Missing app_canvas element");
            return;
        };

        let start_result = eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|cc| Ok(Box::new(GlobeApp::new(cc)))),
            )
            .await;

        // Remove the loading text once the app has loaded:
        if let Some(loading_text) = document.get_element_by_id("loading_text") {
            match start_result {
                Ok(_) => {
                    loading_text.remove();
                }
                Err(e) => {
                    loading_text.set_inner_html(
                        "<p>The app has crashed. See the developer console for details.</p>",
                    );
                    log::error!("Failed to start eframe: {e:?}");
                }
            }
        }
    });
}

/// Main application state and logic.
pub struct GlobeApp {
    /// Application state containing all sub-states
    state: AppState,
}

impl GlobeApp {
    /// Creates a new GlobeApp instance.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        let settings = GlobeSettings::load();
        let state = AppState::load(settings);
        log::info!(
            "Globe ready: {} countries, {} triangles",
            state.scene.len(),
            state
                .scene
                .entries()
                .iter()
                .map(|e| e.mesh().triangle_count())
                .sum::<usize>()
        );

        Self { state }
    }
}

impl eframe::App for GlobeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let dt = ctx.input(|i| i.stable_dt).min(MAX_FRAME_DT);

        ui::render_globe_view(ctx, &mut self.state, dt);
        ui::render_overlay(ctx, &mut self.state);

        // The globe is always moving: intro, transitions or auto-rotation
        ctx.request_repaint();
    }
}

//! Application state management.
//!
//! [`AppState`] is the root of everything the globe needs between frames:
//! the scene with its meshes, the camera engine, the live camera and the
//! selection. The host calls [`AppState::frame`] once per frame and feeds
//! pointer input through [`AppState::pointer_moved`] and
//! [`AppState::click`].

pub mod selection;
pub mod settings;

pub use selection::{CountryEvent, SelectionController};
pub use settings::{rgb, AppearanceSettings, GlobeSettings, MeshSettings};

use crate::camera::{CameraTransitionEngine, PerspectiveCamera};
use crate::geo::{Country, CountryDataset, CountryId};
use crate::globe::{CountryMeshBuilder, GlobeScene};
use glam::Vec2;

/// Root application state containing all sub-states.
pub struct AppState {
    pub settings: GlobeSettings,

    /// Countries and their meshes
    pub scene: GlobeScene,

    /// Camera target and transitions
    pub engine: CameraTransitionEngine,

    /// Hovered and selected country
    pub selection: SelectionController,

    /// Render camera, created on the first frame once the viewport size is
    /// known
    pub camera: Option<PerspectiveCamera>,

    /// Status line shown in the overlay
    pub status_message: String,
}

impl AppState {
    pub fn new(settings: GlobeSettings, countries: Vec<Country>) -> Self {
        let builder = CountryMeshBuilder::new(settings.mesh.to_options());
        let scene = GlobeScene::new(countries, builder);
        let engine = CameraTransitionEngine::new(settings.camera.clone());
        let status_message = format!("{} countries", scene.len());

        Self {
            settings,
            scene,
            engine,
            selection: SelectionController::new(),
            camera: None,
            status_message,
        }
    }

    /// Loads the configured dataset and builds the state around it.
    ///
    /// Loading problems are logged; the globe then shows whatever could be
    /// loaded, possibly nothing.
    pub fn load(settings: GlobeSettings) -> Self {
        let countries = load_countries(&settings);
        let empty = countries.is_empty();
        let mut state = Self::new(settings, countries);
        if empty {
            state.status_message = "No country data".to_string();
        }
        state
    }

    /// Advances one frame: rebuilds changed meshes, steps the camera engine
    /// and writes the result into the render camera.
    pub fn frame(&mut self, dt: f32, viewport: Vec2) {
        self.scene.sync_meshes();
        self.engine.tick(dt);

        let fov = self.engine.state().fov_degrees;
        let camera = self
            .camera
            .get_or_insert_with(|| PerspectiveCamera::new(viewport, fov));
        camera.set_viewport(viewport);
        self.engine.apply(camera);
    }

    pub fn dispatch(&mut self, event: CountryEvent) -> bool {
        self.selection.handle(event, &mut self.engine)
    }

    /// Country under a screen position; `None` before the first frame.
    pub fn country_at(&self, screen: Vec2) -> Option<CountryId> {
        let ray = self.camera.as_ref()?.ray_through(screen)?;
        self.scene.pick(&ray)
    }

    /// Emits enter/leave events for a pointer move (`None` when the
    /// pointer left the view).
    pub fn pointer_moved(&mut self, screen: Option<Vec2>) {
        let under = screen.and_then(|s| self.country_at(s));
        let hovered = self.selection.hovered();
        if under == hovered {
            return;
        }
        if let Some(id) = hovered {
            self.dispatch(CountryEvent::PointerLeave(id));
        }
        if let Some(id) = under {
            self.dispatch(CountryEvent::PointerEnter(id));
        }
    }

    /// Emits a click on the country under `screen`, if any. Returns true
    /// when the camera was retargeted.
    pub fn click(&mut self, screen: Vec2) -> bool {
        let Some(id) = self.country_at(screen) else {
            return false;
        };
        let center = self.scene.center(id);
        self.dispatch(CountryEvent::Click { id, center })
    }

    pub fn hovered_country(&self) -> Option<&Country> {
        self.selection.hovered().and_then(|id| self.scene.country(id))
    }

    pub fn selected_country(&self) -> Option<&Country> {
        self.selection.selected().and_then(|id| self.scene.country(id))
    }
}

fn load_countries(settings: &GlobeSettings) -> Vec<Country> {
    let color = rgb(settings.appearance.country);

    if let Some(countries) = load_configured(settings, color) {
        return countries;
    }

    match CountryDataset::bundled(color) {
        Ok(dataset) => dataset.into_countries(),
        Err(e) => {
            log::error!("Failed to load bundled country data: {}", e);
            Vec::new()
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn load_configured(
    settings: &GlobeSettings,
    color: eframe::egui::Color32,
) -> Option<Vec<Country>> {
    let path = settings.data_path.as_deref()?;
    match CountryDataset::load_path(std::path::Path::new(path), color) {
        Ok(dataset) => Some(dataset.into_countries()),
        Err(e) => {
            log::error!("Failed to load {}: {}, using bundled data", path, e);
            None
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn load_configured(
    settings: &GlobeSettings,
    _color: eframe::egui::Color32,
) -> Option<Vec<Country>> {
    if settings.data_path.is_some() {
        log::warn!("data_path is not supported in the browser");
    }
    None
}

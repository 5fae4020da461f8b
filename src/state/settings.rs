//! Globe settings.
//!
//! Read once at startup. Natively from the JSON file named by the
//! `GLOBE_SETTINGS` environment variable (or `globe_settings.json` in the
//! working directory); in the browser from localStorage. Missing fields
//! take their defaults, and unreadable settings fall back to defaults
//! entirely.

use crate::camera::CameraSettings;
use crate::globe::MeshOptions;
use eframe::egui::Color32;
use serde::{Deserialize, Serialize};

/// Mesh generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshSettings {
    /// Globe radius in world units
    pub radius: f32,
    /// Split triangle edges longer than this many degrees; `null` disables
    pub max_edge_degrees: Option<f64>,
}

impl Default for MeshSettings {
    fn default() -> Self {
        let options = MeshOptions::default();
        Self {
            radius: options.radius,
            max_edge_degrees: options.max_edge_degrees,
        }
    }
}

impl MeshSettings {
    pub fn to_options(&self) -> MeshOptions {
        let radius = if self.radius.is_finite() && self.radius > 0.0 {
            self.radius
        } else {
            log::warn!("Invalid globe radius {}, using default", self.radius);
            MeshOptions::default().radius
        };
        MeshOptions {
            radius,
            max_edge_degrees: self.max_edge_degrees.filter(|d| d.is_finite() && *d > 0.0),
        }
    }
}

/// Colors and lighting, colors as RGB triples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceSettings {
    pub background: [u8; 3],
    pub ocean: [u8; 3],
    pub country: [u8; 3],
    pub hover: [u8; 3],
    /// Ambient light intensity
    pub ambient: f32,
    /// Intensity of the light that travels with the camera
    pub diffuse: f32,
    /// Eye distance where fog starts
    pub fog_near: f32,
    /// Eye distance where fog fully covers a surface
    pub fog_far: f32,
}

impl Default for AppearanceSettings {
    fn default() -> Self {
        Self {
            background: [0x1d, 0x22, 0x2f],
            ocean: [0x2b, 0x3f, 0x71],
            country: [0xff, 0xff, 0xff],
            hover: [0xff, 0x00, 0x00],
            ambient: 0.75,
            diffuse: 0.5,
            fog_near: 1.0,
            fog_far: 6.0,
        }
    }
}

/// Converts an RGB triple to an opaque color.
pub fn rgb(c: [u8; 3]) -> Color32 {
    Color32::from_rgb(c[0], c[1], c[2])
}

/// All user-tunable settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeSettings {
    pub camera: CameraSettings,
    pub mesh: MeshSettings,
    pub appearance: AppearanceSettings,
    /// Alternative boundary dataset (.json or .shp), native only
    pub data_path: Option<String>,
}

impl GlobeSettings {
    /// localStorage key used in the browser.
    pub const STORAGE_KEY: &'static str = "globe_settings";

    /// Settings file used natively when `GLOBE_SETTINGS` is unset.
    pub const DEFAULT_PATH: &'static str = "globe_settings.json";

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Loads settings, falling back to defaults.
    pub fn load() -> Self {
        let Some(json) = Self::read_source() else {
            log::info!("No settings found, using defaults");
            return Self::default();
        };

        match Self::from_json(&json) {
            Ok(settings) => {
                log::info!("Loaded globe settings");
                settings
            }
            Err(e) => {
                log::warn!("Failed to parse globe settings: {}", e);
                Self::default()
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn read_source() -> Option<String> {
        let path =
            std::env::var("GLOBE_SETTINGS").unwrap_or_else(|_| Self::DEFAULT_PATH.to_string());
        match std::fs::read_to_string(&path) {
            Ok(json) => Some(json),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("Failed to read settings file {}: {}", path, e);
                None
            }
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn read_source() -> Option<String> {
        let storage = web_sys::window()?.local_storage().ok()??;
        storage.get_item(Self::STORAGE_KEY).ok()?
    }
}

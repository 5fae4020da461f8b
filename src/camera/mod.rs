//! Camera: the live perspective camera and the engine that animates it.

pub mod easing;
pub mod engine;
pub mod perspective;
pub mod transition;

pub use easing::Easing;
pub use engine::{CameraSettings, CameraTarget, CameraTransitionEngine};
pub use perspective::{PerspectiveCamera, ViewOffset};
pub use transition::{CameraState, Transition};

//! UI modules for the Country Globe application.
//!
//! - Globe view: the central painted globe and pointer handling
//! - Overlay: selection panel with the Back button and the status line

mod globe_view;
mod overlay;

pub use globe_view::render_globe_view;
pub use overlay::render_overlay;

#![warn(clippy::all)]

//! Country Globe - an interactive globe of clickable country meshes.
//!
//! The library holds everything that does not depend on a window: geographic
//! projection and polygon triangulation, country mesh generation, picking,
//! and the camera transition engine. The binary wires these into an
//! `eframe` application.

pub mod camera;
pub mod error;
pub mod geo;
pub mod globe;
pub mod state;

pub use error::{LoadError, LoadResult};

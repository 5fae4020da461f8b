//! Globe geometry: country meshes, mesh slots, picking and the scene that
//! ties them together.

pub mod mesh;
pub mod picking;
pub mod scene;
pub mod slot;

pub use mesh::{build_sphere_mesh, BoundingSphere, CountryMesh, CountryMeshBuilder, MeshOptions};
pub use picking::{intersect_sphere, Ray};
pub use scene::{GlobeEntry, GlobeScene};
pub use slot::MeshSlot;

//! Owned mesh that rebuilds when its source geometry changes.

use super::mesh::{CountryMesh, CountryMeshBuilder, MeshOptions};
use crate::geo::country::Polygon;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Holds the live mesh for one country.
///
/// The slot is created once and kept for the lifetime of the scene; only
/// its buffers are replaced. Renderers compare [`MeshSlot::revision`] to
/// notice a rebuild.
#[derive(Debug, Clone, Default)]
pub struct MeshSlot {
    mesh: CountryMesh,
    source_hash: Option<u64>,
    revision: u64,
}

impl MeshSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the mesh if the polygons or build options differ from the
    /// last build. Returns true when a rebuild happened.
    pub fn sync(&mut self, polygons: &[Polygon], builder: &CountryMeshBuilder) -> bool {
        let hash = source_hash(polygons, builder.options());
        if self.source_hash == Some(hash) {
            return false;
        }

        self.mesh = builder.build_polygons(polygons);
        self.source_hash = Some(hash);
        self.revision += 1;
        true
    }

    /// Forces a rebuild on the next sync.
    pub fn invalidate(&mut self) {
        self.source_hash = None;
    }

    pub fn mesh(&self) -> &CountryMesh {
        &self.mesh
    }

    /// Number of builds so far; 0 until the first sync.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Bounding-sphere center of the current mesh.
    pub fn center(&self) -> Option<glam::Vec3> {
        self.mesh.center()
    }
}

fn source_hash(polygons: &[Polygon], options: &MeshOptions) -> u64 {
    let mut hasher = DefaultHasher::new();

    options.radius.to_bits().hash(&mut hasher);
    options.max_edge_degrees.map(f64::to_bits).hash(&mut hasher);

    polygons.len().hash(&mut hasher);
    for polygon in polygons {
        for ring in std::iter::once(&polygon.exterior).chain(&polygon.holes) {
            ring.len().hash(&mut hasher);
            for c in ring {
                c.x.to_bits().hash(&mut hasher);
                c.y.to_bits().hash(&mut hasher);
            }
        }
        polygon.holes.len().hash(&mut hasher);
    }

    hasher.finish()
}

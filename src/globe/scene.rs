//! The globe scene: every country with its live mesh, plus the ocean.

use super::mesh::{build_sphere_mesh, CountryMesh, CountryMeshBuilder};
use super::picking::{intersect_sphere, Ray};
use super::slot::MeshSlot;
use crate::geo::country::{Country, CountryId, Polygon};
use crate::geo::projection::unproject;
use glam::Vec3;
use web_time::Instant;

/// Ocean sphere sits just under the country meshes.
const OCEAN_RADIUS_FACTOR: f32 = 0.995;

const OCEAN_SEGMENTS: u32 = 64;

/// A country and the slot holding its mesh.
#[derive(Debug, Clone)]
pub struct GlobeEntry {
    pub country: Country,
    pub slot: MeshSlot,
    /// Set when the geometry or builder changed since the last sync.
    dirty: bool,
}

impl GlobeEntry {
    pub fn id(&self) -> CountryId {
        self.country.id
    }

    pub fn mesh(&self) -> &CountryMesh {
        self.slot.mesh()
    }

    /// Whether the next [`GlobeScene::sync_meshes`] will look at this entry.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Owns all country meshes for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct GlobeScene {
    entries: Vec<GlobeEntry>,
    builder: CountryMeshBuilder,
    ocean: CountryMesh,
}

impl GlobeScene {
    /// Creates the scene and builds every mesh.
    pub fn new(countries: Vec<Country>, builder: CountryMeshBuilder) -> Self {
        let ocean = ocean_mesh(&builder);
        let entries = countries
            .into_iter()
            .map(|country| GlobeEntry {
                country,
                slot: MeshSlot::new(),
                dirty: true,
            })
            .collect();

        let mut scene = Self {
            entries,
            builder,
            ocean,
        };
        scene.sync_meshes();
        scene
    }

    pub fn entries(&self) -> &[GlobeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ocean(&self) -> &CountryMesh {
        &self.ocean
    }

    pub fn radius(&self) -> f32 {
        self.builder.options().radius
    }

    pub fn country(&self, id: CountryId) -> Option<&Country> {
        self.entries.get(id.0).map(|e| &e.country)
    }

    pub fn mesh(&self, id: CountryId) -> Option<&CountryMesh> {
        self.entries.get(id.0).map(|e| e.slot.mesh())
    }

    /// Camera anchor for a country; `None` if unknown or its mesh is empty.
    pub fn center(&self, id: CountryId) -> Option<Vec3> {
        self.entries.get(id.0).and_then(|e| e.slot.center())
    }

    /// Replaces a country's geometry. The mesh is rebuilt on the next
    /// [`GlobeScene::sync_meshes`].
    pub fn set_geometry(&mut self, id: CountryId, polygons: Vec<Polygon>) -> bool {
        match self.entries.get_mut(id.0) {
            Some(entry) => {
                entry.country.set_polygons(polygons);
                entry.dirty = true;
                true
            }
            None => {
                log::warn!("No country with id {}", id.0);
                false
            }
        }
    }

    /// Swaps the mesh builder; every mesh rebuilds on the next sync.
    pub fn set_builder(&mut self, builder: CountryMeshBuilder) {
        if builder.options().radius != self.builder.options().radius {
            self.ocean = ocean_mesh(&builder);
        }
        self.builder = builder;
        for entry in &mut self.entries {
            entry.dirty = true;
        }
    }

    /// Rebuilds the meshes whose source geometry changed. Returns the
    /// number of rebuilt meshes.
    ///
    /// Only entries touched by [`GlobeScene::set_geometry`] or
    /// [`GlobeScene::set_builder`] are compared against their slot.
    pub fn sync_meshes(&mut self) -> usize {
        let start = Instant::now();
        let builder = &self.builder;
        let rebuilt = self
            .entries
            .iter_mut()
            .filter(|entry| entry.dirty)
            .map(|entry| {
                entry.dirty = false;
                entry.slot.sync(entry.country.polygons(), builder)
            })
            .filter(|&rebuilt| rebuilt)
            .count();

        if rebuilt > 0 {
            let triangles: usize = self
                .entries
                .iter()
                .map(|e| e.slot.mesh().triangle_count())
                .sum();
            log::debug!(
                "Rebuilt {} country meshes in {:.1}ms ({} triangles total)",
                rebuilt,
                start.elapsed().as_secs_f64() * 1000.0,
                triangles
            );
        }
        rebuilt
    }

    /// First country under the ray, if the ray hits the globe.
    pub fn pick(&self, ray: &Ray) -> Option<CountryId> {
        let hit = intersect_sphere(ray, self.radius())?;
        let (lon, lat) = unproject(hit);
        self.entries
            .iter()
            .find(|e| e.country.contains(lon, lat))
            .map(GlobeEntry::id)
    }
}

fn ocean_mesh(builder: &CountryMeshBuilder) -> CountryMesh {
    build_sphere_mesh(
        builder.options().radius * OCEAN_RADIUS_FACTOR,
        OCEAN_SEGMENTS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::projection::project;
    use eframe::egui::Color32;
    use geo_types::Coord;

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Coord<f64>> {
        vec![
            Coord { x: x0, y: y0 },
            Coord {
                x: x0 + size,
                y: y0,
            },
            Coord {
                x: x0 + size,
                y: y0 + size,
            },
            Coord {
                x: x0,
                y: y0 + size,
            },
        ]
    }

    fn scene() -> GlobeScene {
        let countries = vec![
            Country::new(
                CountryId(0),
                "AAA",
                "Alpha",
                "Test",
                vec![Polygon::new(
                    square(-10.0, -10.0, 20.0),
                    vec![square(-2.0, -2.0, 4.0)],
                )],
                Color32::WHITE,
            ),
            Country::new(
                CountryId(1),
                "BBB",
                "Beta",
                "Test",
                vec![Polygon::new(square(80.0, 0.0, 20.0), vec![])],
                Color32::WHITE,
            ),
            Country::new(CountryId(2), "CCC", "Empty", "Test", vec![], Color32::WHITE),
        ];
        GlobeScene::new(countries, CountryMeshBuilder::default())
    }

    #[test]
    fn test_new_builds_all_meshes() {
        let scene = scene();
        assert_eq!(scene.len(), 3);
        assert!(scene.entries().iter().all(|e| e.slot.revision() == 1));
        assert!(scene.entries().iter().all(|e| !e.is_dirty()));
        assert!(scene.center(CountryId(0)).is_some());
        assert!(scene.center(CountryId(2)).is_none());
        assert!(scene.center(CountryId(9)).is_none());
        assert!(!scene.ocean().is_empty());
    }

    #[test]
    fn test_pick() {
        let scene = scene();
        let toward = |lon: f64, lat: f64| {
            let target = project(lon, lat);
            Ray::new(target * 3.0, -target).unwrap()
        };

        assert_eq!(scene.pick(&toward(5.0, 5.0)), Some(CountryId(0)));
        assert_eq!(scene.pick(&toward(90.0, 10.0)), Some(CountryId(1)));
        // Inside the hole
        assert_eq!(scene.pick(&toward(0.0, 0.0)), None);
        // Ocean
        assert_eq!(scene.pick(&toward(-120.0, 40.0)), None);
        // Misses the globe entirely
        let miss = Ray::new(Vec3::new(0.0, 5.0, 3.0), -Vec3::Z).unwrap();
        assert_eq!(scene.pick(&miss), None);
    }

    #[test]
    fn test_set_geometry_rebuilds_only_that_mesh() {
        let mut scene = scene();
        assert_eq!(scene.sync_meshes(), 0);

        let old_center = scene.center(CountryId(1)).unwrap();
        assert!(scene.set_geometry(
            CountryId(1),
            vec![Polygon::new(square(-100.0, 30.0, 10.0), vec![])]
        ));
        let dirty: Vec<bool> = scene.entries().iter().map(GlobeEntry::is_dirty).collect();
        assert_eq!(dirty, vec![false, true, false]);
        assert_eq!(scene.sync_meshes(), 1);
        assert!(scene.entries().iter().all(|e| !e.is_dirty()));

        let entries = scene.entries();
        assert_eq!(entries[0].slot.revision(), 1);
        assert_eq!(entries[1].slot.revision(), 2);
        let new_center = scene.center(CountryId(1)).unwrap();
        assert!(new_center.distance(old_center) > 0.5);

        assert!(!scene.set_geometry(CountryId(42), vec![]));
    }

    #[test]
    fn test_same_geometry_is_checked_once_and_kept() {
        let mut scene = scene();
        let polygons = scene.country(CountryId(0)).unwrap().polygons().to_vec();
        assert!(scene.set_geometry(CountryId(0), polygons));
        assert!(scene.entries()[0].is_dirty());

        // Identical coordinates: looked at, not rebuilt
        assert_eq!(scene.sync_meshes(), 0);
        assert_eq!(scene.entries()[0].slot.revision(), 1);
        assert!(!scene.entries()[0].is_dirty());
    }

    #[test]
    fn test_set_builder_rebuilds_all() {
        let mut scene = scene();
        scene.set_builder(CountryMeshBuilder::new(crate::globe::mesh::MeshOptions {
            radius: 2.0,
            max_edge_degrees: None,
        }));
        assert!(scene.entries().iter().all(GlobeEntry::is_dirty));
        assert_eq!(scene.sync_meshes(), 3);
        let ocean_radius = scene.ocean().positions[0].length();
        assert!((ocean_radius - 2.0 * OCEAN_RADIUS_FACTOR).abs() < 1e-4);
    }
}

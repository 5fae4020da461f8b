//! Country mesh generation.
//!
//! Turns a country's lon/lat polygons into a triangle mesh lying on the
//! globe: triangulate each polygon in the plane, optionally split long
//! edges so large shapes follow the curvature, then project every vertex
//! onto the sphere.

use crate::geo::country::{Country, Polygon};
use crate::geo::projection::{project_with_radius, GLOBE_RADIUS};
use crate::geo::triangulate::{flatten_rings, triangulate};
use geo_types::Coord;
use glam::Vec3;
use std::collections::HashMap;

/// Edges longer than this (in degrees) are never subdivided.
const MAX_SPLITTABLE_EDGE: f64 = 720.0;

/// Smallest accepted subdivision threshold in degrees.
const MIN_EDGE_DEGREES: f64 = 0.1;

/// Recursion limit for edge subdivision.
const MAX_SUBDIVISION_DEPTH: u32 = 16;

/// Sphere enclosing a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// Normalized average of the vertex positions
    pub center: Vec3,
    /// Largest distance from the center to any vertex
    pub radius: f32,
}

/// Renderable triangle mesh.
///
/// Every index is in range of `positions` and every triangle is wound
/// counter-clockwise when seen from outside the globe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
    /// `None` for an empty mesh
    pub bounding_sphere: Option<BoundingSphere>,
}

impl CountryMesh {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Bounding-sphere center, the anchor used to focus the camera.
    pub fn center(&self) -> Option<Vec3> {
        self.bounding_sphere.map(|s| s.center)
    }

    /// Iterates triangles as position triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |t| {
            [
                self.positions[t[0] as usize],
                self.positions[t[1] as usize],
                self.positions[t[2] as usize],
            ]
        })
    }

    fn compute_bounding_sphere(&mut self) {
        let Some(&first) = self.positions.first() else {
            self.bounding_sphere = None;
            return;
        };

        let sum: Vec3 = self.positions.iter().copied().sum();
        let average = sum / self.positions.len() as f32;
        let center = average
            .try_normalize()
            .or_else(|| first.try_normalize())
            .unwrap_or(Vec3::Z);

        let radius = self
            .positions
            .iter()
            .map(|p| p.distance(center))
            .fold(0.0_f32, f32::max);

        self.bounding_sphere = Some(BoundingSphere { center, radius });
    }
}

/// Mesh generation options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshOptions {
    /// Radius of the sphere vertices are projected onto
    pub radius: f32,
    /// Split triangle edges longer than this many degrees (lon/lat space)
    pub max_edge_degrees: Option<f64>,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            radius: GLOBE_RADIUS,
            max_edge_degrees: Some(5.0),
        }
    }
}

/// Builds [`CountryMesh`]es from country geometry.
#[derive(Debug, Clone, Default)]
pub struct CountryMeshBuilder {
    options: MeshOptions,
}

impl CountryMeshBuilder {
    pub fn new(options: MeshOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MeshOptions {
        &self.options
    }

    pub fn build(&self, country: &Country) -> CountryMesh {
        self.build_polygons(country.polygons())
    }

    /// Builds one mesh out of all polygons.
    ///
    /// Degenerate polygons contribute nothing; the rest are still built.
    pub fn build_polygons(&self, polygons: &[Polygon]) -> CountryMesh {
        let mut mesh = CountryMesh::default();

        for polygon in polygons {
            let mut points: Vec<Coord<f64>> =
                flatten_rings(&polygon.exterior, &polygon.holes).collect();
            let mut triangles = triangulate(&polygon.exterior, &polygon.holes);

            if triangles.is_empty() {
                log::debug!("Polygon with {} points produced no triangles", points.len());
                continue;
            }

            if let Some(max_edge) = self.options.max_edge_degrees {
                triangles = subdivide(&mut points, &triangles, max_edge.max(MIN_EDGE_DEGREES));
            }

            self.append(&mut mesh, &points, &triangles);
        }

        mesh.compute_bounding_sphere();
        mesh
    }

    /// Projects the referenced points and appends the triangles, flipping
    /// any that would face inward.
    fn append(&self, mesh: &mut CountryMesh, points: &[Coord<f64>], triangles: &[[u32; 3]]) {
        let mut remap: Vec<Option<u32>> = vec![None; points.len()];

        for tri in triangles {
            let mut out = [0u32; 3];
            for (slot, &local) in out.iter_mut().zip(tri.iter()) {
                *slot = *remap[local as usize].get_or_insert_with(|| {
                    let p = points[local as usize];
                    let position = project_with_radius(p.x, p.y, self.options.radius);
                    mesh.positions.push(position);
                    mesh.normals.push(position.normalize_or_zero());
                    (mesh.positions.len() - 1) as u32
                });
            }

            ensure_outward(&mesh.positions, &mut out);
            mesh.indices.extend_from_slice(&out);
        }
    }
}

/// Swaps two corners of a triangle whose normal points toward the center.
fn ensure_outward(positions: &[Vec3], tri: &mut [u32; 3]) {
    let a = positions[tri[0] as usize];
    let b = positions[tri[1] as usize];
    let c = positions[tri[2] as usize];

    let normal = (b - a).cross(c - a);
    let centroid = (a + b + c) / 3.0;
    if normal.dot(centroid) < 0.0 {
        tri.swap(1, 2);
    }
}

fn edge_length(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Splits long edges at their midpoints until every edge is at most
/// `max_edge` degrees long. New points are appended to `points`.
///
/// Whether an edge splits depends only on its two endpoints, and each
/// midpoint is created once, so triangles sharing an edge stay welded.
fn subdivide(points: &mut Vec<Coord<f64>>, tris: &[[u32; 3]], max_edge: f64) -> Vec<[u32; 3]> {
    let mut subdivider = Subdivider {
        points,
        midpoints: HashMap::new(),
        max_edge,
        out: Vec::with_capacity(tris.len()),
    };
    for &tri in tris {
        subdivider.split(tri, 0);
    }
    subdivider.out
}

struct Subdivider<'a> {
    points: &'a mut Vec<Coord<f64>>,
    midpoints: HashMap<(u32, u32), u32>,
    max_edge: f64,
    out: Vec<[u32; 3]>,
}

impl Subdivider<'_> {
    fn needs_split(&self, a: u32, b: u32) -> bool {
        let len = edge_length(self.points[a as usize], self.points[b as usize]);
        len.is_finite() && len > self.max_edge && len <= MAX_SPLITTABLE_EDGE
    }

    fn midpoint(&mut self, a: u32, b: u32) -> u32 {
        let key = (a.min(b), a.max(b));
        if let Some(&m) = self.midpoints.get(&key) {
            return m;
        }
        let pa = self.points[a as usize];
        let pb = self.points[b as usize];
        self.points.push(Coord {
            x: (pa.x + pb.x) * 0.5,
            y: (pa.y + pb.y) * 0.5,
        });
        let m = (self.points.len() - 1) as u32;
        self.midpoints.insert(key, m);
        m
    }

    fn split(&mut self, tri: [u32; 3], depth: u32) {
        if depth >= MAX_SUBDIVISION_DEPTH {
            self.out.push(tri);
            return;
        }

        // Edge i runs from corner i to corner i+1
        let long = [
            self.needs_split(tri[0], tri[1]),
            self.needs_split(tri[1], tri[2]),
            self.needs_split(tri[2], tri[0]),
        ];

        match long.iter().filter(|&&l| l).count() {
            0 => self.out.push(tri),
            1 => {
                // Rotate so the long edge is (a, b)
                let r = long.iter().position(|&l| l).unwrap_or(0);
                let [a, b, c] = rotate(tri, r);
                let m = self.midpoint(a, b);
                self.split([a, m, c], depth + 1);
                self.split([m, b, c], depth + 1);
            }
            2 => {
                // Rotate so the short edge is (c, a)
                let short = long.iter().position(|&l| !l).unwrap_or(2);
                let [a, b, c] = rotate(tri, (short + 1) % 3);
                let mab = self.midpoint(a, b);
                let mbc = self.midpoint(b, c);
                self.split([mab, b, mbc], depth + 1);
                self.split([a, mab, mbc], depth + 1);
                self.split([a, mbc, c], depth + 1);
            }
            _ => {
                let [a, b, c] = tri;
                let mab = self.midpoint(a, b);
                let mbc = self.midpoint(b, c);
                let mca = self.midpoint(c, a);
                self.split([a, mab, mca], depth + 1);
                self.split([mab, b, mbc], depth + 1);
                self.split([mca, mbc, c], depth + 1);
                self.split([mab, mbc, mca], depth + 1);
            }
        }
    }
}

fn rotate(tri: [u32; 3], by: usize) -> [u32; 3] {
    [tri[by % 3], tri[(by + 1) % 3], tri[(by + 2) % 3]]
}

/// Builds a latitude/longitude sphere, used for the ocean under the
/// countries. Same buffer layout and winding as a country mesh.
pub fn build_sphere_mesh(radius: f32, segments: u32) -> CountryMesh {
    let lon_segments = segments.max(3);
    let lat_segments = (segments / 2).max(2);
    let row = lon_segments + 1;

    let mut mesh = CountryMesh::default();
    for i in 0..=lat_segments {
        let lat = -90.0 + 180.0 * i as f64 / lat_segments as f64;
        for j in 0..=lon_segments {
            let lon = -180.0 + 360.0 * j as f64 / lon_segments as f64;
            let position = project_with_radius(lon, lat, radius);
            mesh.positions.push(position);
            mesh.normals.push(position.normalize_or_zero());
        }
    }

    for i in 0..lat_segments {
        for j in 0..lon_segments {
            let a = i * row + j;
            let b = a + 1;
            let d = a + row;
            let c = d + 1;

            // Skip the zero-area halves touching the poles
            if i != 0 {
                mesh.indices.extend_from_slice(&[a, b, c]);
            }
            if i != lat_segments - 1 {
                mesh.indices.extend_from_slice(&[a, c, d]);
            }
        }
    }

    mesh.compute_bounding_sphere();
    mesh
}

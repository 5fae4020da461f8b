//! Geographic data: projection onto the globe, polygon triangulation and
//! the country dataset.

pub mod country;
pub mod projection;
pub mod triangulate;

pub use country::{Country, CountryDataset, CountryId, GeoBounds, Polygon, Ring};
pub use projection::{project, project_with_radius, unproject, GLOBE_RADIUS};
pub use triangulate::{ring_contains, signed_area, triangulate};

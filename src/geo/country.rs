//! Country records and the boundary dataset loader.
//!
//! The dataset is loaded once at startup and flattened into a single
//! ordered list of countries. Supported inputs:
//! - a region map `{ "<region>": [ { "id", "name", "geometry" } ] }`
//! - a GeoJSON FeatureCollection (treated as a single "World" region)
//! - an ESRI shapefile with optional dbf attributes

use super::projection::wrap_longitude;
use super::triangulate::ring_contains;
use crate::error::{LoadError, LoadResult};
use eframe::egui::Color32;
use geo_types::Coord;
use serde::Deserialize;
use serde_json::{Map, Value};
use shapefile::dbase::FieldValue;
use std::io::Cursor;

/// Closed ring of (longitude, latitude) points.
pub type Ring = Vec<Coord<f64>>;

/// Index of a country in the flattened dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CountryId(pub usize);

/// One outer ring with zero or more holes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    pub exterior: Ring,
    pub holes: Vec<Ring>,
}

impl Polygon {
    pub fn new(exterior: Ring, holes: Vec<Ring>) -> Self {
        Self { exterior, holes }
    }

    /// Whether a point lies inside the exterior and outside every hole.
    pub fn contains(&self, point: Coord<f64>) -> bool {
        ring_contains(&self.exterior, point)
            && !self.holes.iter().any(|hole| ring_contains(hole, point))
    }
}

/// Longitude/latitude bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBounds {
    fn of_polygons(polygons: &[Polygon]) -> Option<Self> {
        let mut points = polygons
            .iter()
            .flat_map(|p| p.exterior.iter())
            .filter(|c| c.x.is_finite() && c.y.is_finite());
        let first = points.next()?;
        let init = Self {
            min_lon: first.x,
            min_lat: first.y,
            max_lon: first.x,
            max_lat: first.y,
        };
        Some(points.fold(init, |b, c| Self {
            min_lon: b.min_lon.min(c.x),
            min_lat: b.min_lat.min(c.y),
            max_lon: b.max_lon.max(c.x),
            max_lat: b.max_lat.max(c.y),
        }))
    }

    pub fn contains(&self, point: Coord<f64>) -> bool {
        point.x >= self.min_lon
            && point.x <= self.max_lon
            && point.y >= self.min_lat
            && point.y <= self.max_lat
    }
}

/// A country: identity, display attributes and boundary polygons.
#[derive(Debug, Clone)]
pub struct Country {
    pub id: CountryId,
    /// Short code from the dataset (ISO code or record id)
    pub code: String,
    /// Display name
    pub name: String,
    /// Region the record was listed under
    pub region: String,
    /// Base display color
    pub color: Color32,
    polygons: Vec<Polygon>,
    bounds: Option<GeoBounds>,
}

impl Country {
    pub fn new(
        id: CountryId,
        code: impl Into<String>,
        name: impl Into<String>,
        region: impl Into<String>,
        polygons: Vec<Polygon>,
        color: Color32,
    ) -> Self {
        let bounds = GeoBounds::of_polygons(&polygons);
        Self {
            id,
            code: code.into(),
            name: name.into(),
            region: region.into(),
            color,
            polygons,
            bounds,
        }
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn bounds(&self) -> Option<GeoBounds> {
        self.bounds
    }

    /// Replaces the boundary geometry. The owning mesh slot notices the
    /// change on its next sync and rebuilds.
    pub fn set_polygons(&mut self, polygons: Vec<Polygon>) {
        self.bounds = GeoBounds::of_polygons(&polygons);
        self.polygons = polygons;
    }

    /// Whether the given geographic point falls inside this country.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let point = Coord {
            x: wrap_longitude(lon),
            y: lat,
        };
        match self.bounds {
            Some(bounds) if bounds.contains(point) => {
                self.polygons.iter().any(|p| p.contains(point))
            }
            _ => false,
        }
    }
}

/// The flattened list of countries loaded from the input resource.
#[derive(Debug, Clone, Default)]
pub struct CountryDataset {
    countries: Vec<Country>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DatasetRecord {
    FeatureCollection { features: Vec<CountryRecord> },
    /// Region name to records, in document order.
    Regions(Map<String, Value>),
}

#[derive(Deserialize)]
struct CountryRecord {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<GeometryRecord>,
}

#[derive(Deserialize)]
struct GeometryRecord {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    coordinates: Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CoordinatesRecord {
    Polygon(Vec<Vec<Vec<f64>>>),
    MultiPolygon(Vec<Vec<Vec<Vec<f64>>>>),
}

const BUNDLED_DATASET: &str = include_str!("../../assets/countries.json");

const NAME_FIELDS: &[&str] = &["name", "NAME", "ADMIN", "NAME_LONG", "name_long"];
const CODE_FIELDS: &[&str] = &["ISO_A3", "iso_a3", "ADM0_A3", "id", "code"];
const REGION_FIELDS: &[&str] = &["CONTINENT", "REGION_UN", "region"];

/// Shapefile ring classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RingKind {
    Outer,
    Inner,
}

impl CountryDataset {
    /// Loads a region map or a GeoJSON FeatureCollection.
    pub fn from_json(json: &str, color: Color32) -> LoadResult<Self> {
        let record: DatasetRecord = serde_json::from_str(json)?;

        let regions: Vec<(String, Vec<CountryRecord>)> = match record {
            DatasetRecord::FeatureCollection { features } => {
                vec![("World".to_string(), features)]
            }
            DatasetRecord::Regions(map) => map
                .into_iter()
                .map(|(region, records)| -> LoadResult<(String, Vec<CountryRecord>)> {
                    Ok((region, serde_json::from_value(records)?))
                })
                .collect::<LoadResult<_>>()?,
        };

        let mut countries = Vec::new();
        for (region, records) in regions {
            for record in records {
                let Some(geometry) = record.geometry.as_ref() else {
                    log::debug!("Skipping record without geometry in region {}", region);
                    continue;
                };

                let id = CountryId(countries.len());
                let polygons = polygons_from_geometry(geometry);
                let code = record_code(&record).unwrap_or_default();
                let name = record
                    .name
                    .clone()
                    .or_else(|| property_string(record.properties.as_ref(), NAME_FIELDS))
                    .or_else(|| (!code.is_empty()).then(|| code.clone()))
                    .unwrap_or_else(|| format!("Country {}", id.0));

                countries.push(Country::new(id, code, name, region.clone(), polygons, color));
            }
        }

        Self::from_countries(countries)
    }

    /// Loads countries from shapefile bytes (.shp plus optional .dbf).
    ///
    /// Inner rings are attached to the outer ring that contains them.
    pub fn from_shapefile(
        shp_bytes: &[u8],
        dbf_bytes: Option<&[u8]>,
        color: Color32,
    ) -> LoadResult<Self> {
        let mut shape_reader = shapefile::ShapeReader::new(Cursor::new(shp_bytes))?;

        // Attribute records are optional; a broken dbf only costs the names
        let dbf_records: Option<Vec<shapefile::dbase::Record>> = dbf_bytes.and_then(|bytes| {
            shapefile::dbase::Reader::new(Cursor::new(bytes))
                .ok()
                .and_then(|mut r: shapefile::dbase::Reader<Cursor<&[u8]>>| r.read().ok())
        });

        let mut countries = Vec::new();
        for (idx, result) in shape_reader.iter_shapes().enumerate() {
            let shape: shapefile::Shape = result?;

            let rings: Vec<(RingKind, Ring)> = match &shape {
                shapefile::Shape::Polygon(poly) => poly
                    .rings()
                    .iter()
                    .map(|ring| {
                        let coords: Ring = ring
                            .points()
                            .iter()
                            .map(|p| Coord { x: p.x, y: p.y })
                            .collect();
                        match ring {
                            shapefile::PolygonRing::Outer(_) => (RingKind::Outer, coords),
                            shapefile::PolygonRing::Inner(_) => (RingKind::Inner, coords),
                        }
                    })
                    .collect(),
                _ => {
                    log::debug!("Skipping non-polygon shape #{}", idx);
                    continue;
                }
            };

            let record = dbf_records.as_ref().and_then(|records| records.get(idx));
            let field = |names: &[&str]| record.and_then(|r| dbf_string(r, names));

            let id = CountryId(countries.len());
            let code = field(CODE_FIELDS).unwrap_or_default();
            let name = field(NAME_FIELDS).unwrap_or_else(|| format!("Country {}", id.0));
            let region = field(REGION_FIELDS).unwrap_or_else(|| "World".to_string());

            countries.push(Country::new(
                id,
                code,
                name,
                region,
                assemble_polygons(rings),
                color,
            ));
        }

        Self::from_countries(countries)
    }

    /// The sample dataset compiled into the binary.
    pub fn bundled(color: Color32) -> LoadResult<Self> {
        Self::from_json(BUNDLED_DATASET, color)
    }

    /// Loads a dataset file. `.shp` files pick up a sibling `.dbf` for
    /// names; anything else is parsed as JSON.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_path(path: &std::path::Path, color: Color32) -> LoadResult<Self> {
        let is_shapefile = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("shp"));

        if is_shapefile {
            let shp = std::fs::read(path)?;
            let dbf = std::fs::read(path.with_extension("dbf")).ok();
            Self::from_shapefile(&shp, dbf.as_deref(), color)
        } else {
            let json = std::fs::read_to_string(path)?;
            Self::from_json(&json, color)
        }
    }

    fn from_countries(countries: Vec<Country>) -> LoadResult<Self> {
        if countries.is_empty() {
            return Err(LoadError::Empty);
        }
        let polygon_count: usize = countries.iter().map(|c| c.polygons.len()).sum();
        log::info!(
            "Loaded {} countries ({} polygons)",
            countries.len(),
            polygon_count
        );
        Ok(Self { countries })
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn into_countries(self) -> Vec<Country> {
        self.countries
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

fn polygons_from_geometry(geometry: &GeometryRecord) -> Vec<Polygon> {
    let value = geometry.coordinates.clone();
    let coordinates = match serde_json::from_value::<CoordinatesRecord>(value) {
        Ok(coordinates) => coordinates,
        Err(e) => {
            log::warn!(
                "Unsupported geometry {:?}: {}",
                geometry.kind.as_deref().unwrap_or("untyped"),
                e
            );
            return Vec::new();
        }
    };

    match coordinates {
        CoordinatesRecord::Polygon(rings) => polygon_from_rings(&rings).into_iter().collect(),
        CoordinatesRecord::MultiPolygon(polygons) => polygons
            .iter()
            .filter_map(|rings| polygon_from_rings(rings))
            .collect(),
    }
}

fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> Option<Polygon> {
    let (exterior, holes) = rings.split_first()?;
    Some(Polygon::new(
        ring_from_positions(exterior),
        holes.iter().map(|ring| ring_from_positions(ring)).collect(),
    ))
}

/// Converts GeoJSON positions, skipping ones with fewer than two numbers.
/// Altitude is ignored.
fn ring_from_positions(positions: &[Vec<f64>]) -> Ring {
    positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| Coord { x: p[0], y: p[1] })
        .collect()
}

/// Groups classified rings into polygons, attaching each inner ring to the
/// first outer ring that contains it.
fn assemble_polygons(rings: Vec<(RingKind, Ring)>) -> Vec<Polygon> {
    let (outer, inner): (Vec<_>, Vec<_>) = rings
        .into_iter()
        .partition(|(kind, _)| *kind == RingKind::Outer);

    let mut polygons: Vec<Polygon> = outer
        .into_iter()
        .map(|(_, ring)| Polygon::new(ring, Vec::new()))
        .collect();

    for (_, hole) in inner {
        let Some(&inside) = hole.first() else {
            continue;
        };
        match polygons
            .iter_mut()
            .find(|p| ring_contains(&p.exterior, inside))
        {
            Some(polygon) => polygon.holes.push(hole),
            None => log::warn!("Dropping inner ring not enclosed by any outer ring"),
        }
    }

    polygons
}

fn record_code(record: &CountryRecord) -> Option<String> {
    match &record.id {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => property_string(record.properties.as_ref(), CODE_FIELDS),
    }
}

fn property_string(properties: Option<&Map<String, Value>>, fields: &[&str]) -> Option<String> {
    let properties = properties?;
    fields
        .iter()
        .filter_map(|field| properties.get(*field))
        .find_map(|v| v.as_str().map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty())
}

fn dbf_string(record: &shapefile::dbase::Record, fields: &[&str]) -> Option<String> {
    for field_name in fields {
        if let Some(FieldValue::Character(Some(s))) = record.get(*field_name) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Ring {
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

    const REGION_MAP: &str = r#"{
        "Europe": [
            {
                "id": "AAA",
                "name": "Alpha",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]],
                                    [[4, 4], [6, 4], [6, 6], [4, 6], [4, 4]]]
                }
            },
            {
                "properties": { "NAME": "Beta", "ISO_A3": "BBB" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[20, 0, 5], [25, 0, 5], [25, 5, 5], [20, 0, 5]]],
                        [[[30, 0], [35, 0], [35, 5], [30, 0]]]
                    ]
                }
            }
        ],
        "Africa": [
            { "id": 7, "geometry": { "type": "Point", "coordinates": [1, 2] } },
            { "id": "NOGEO" }
        ]
    }"#;

    #[test]
    fn test_region_map() {
        let dataset = CountryDataset::from_json(REGION_MAP, Color32::WHITE).unwrap();
        // Regions flatten in document order; the record without geometry is skipped
        assert_eq!(dataset.len(), 3);
        let countries = dataset.countries();

        assert_eq!(countries[0].name, "Alpha");
        assert_eq!(countries[0].region, "Europe");
        assert_eq!(countries[0].code, "AAA");
        assert_eq!(countries[0].polygons().len(), 1);
        assert_eq!(countries[0].polygons()[0].holes.len(), 1);

        assert_eq!(countries[1].name, "Beta");
        assert_eq!(countries[1].code, "BBB");
        assert_eq!(countries[1].polygons().len(), 2);
        assert_eq!(countries[1].polygons()[0].exterior.len(), 4);

        assert_eq!(countries[2].region, "Africa");
        assert_eq!(countries[2].code, "7");
        assert!(countries[2].polygons().is_empty());

        for (i, country) in countries.iter().enumerate() {
            assert_eq!(country.id, CountryId(i));
        }
    }

    #[test]
    fn test_feature_collection() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "ADMIN": "Gamma" },
                    "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1]]] }
                }
            ]
        }"#;
        let dataset = CountryDataset::from_json(json, Color32::WHITE).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.countries()[0].name, "Gamma");
        assert_eq!(dataset.countries()[0].region, "World");
    }

    #[test]
    fn test_empty_and_invalid_json() {
        assert!(matches!(
            CountryDataset::from_json("{}", Color32::WHITE),
            Err(LoadError::Empty)
        ));
        assert!(matches!(
            CountryDataset::from_json("not json", Color32::WHITE),
            Err(LoadError::Json(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = CountryDataset::load_path(
            std::path::Path::new("does/not/exist.json"),
            Color32::WHITE,
        );
        assert!(matches!(result, Err(LoadError::Io(_))));
    }

    #[test]
    fn test_invalid_shapefile() {
        let result = CountryDataset::from_shapefile(b"not a shapefile", None, Color32::WHITE);
        assert!(result.is_err());
    }

    #[test]
    fn test_contains_respects_holes() {
        let country = Country::new(
            CountryId(0),
            "AAA",
            "Alpha",
            "Test",
            vec![Polygon::new(square(0.0, 0.0, 10.0), vec![square(4.0, 4.0, 2.0)])],
            Color32::WHITE,
        );
        assert!(country.contains(1.0, 1.0));
        assert!(!country.contains(5.0, 5.0));
        assert!(!country.contains(11.0, 5.0));
        // Longitude wraps before testing
        assert!(country.contains(361.0, 1.0));
    }

    #[test]
    fn test_set_polygons_updates_bounds() {
        let mut country = Country::new(
            CountryId(0),
            "",
            "Moving",
            "Test",
            vec![Polygon::new(square(0.0, 0.0, 1.0), Vec::new())],
            Color32::WHITE,
        );
        assert!(country.contains(0.5, 0.5));

        country.set_polygons(vec![Polygon::new(square(50.0, 50.0, 1.0), Vec::new())]);
        assert!(!country.contains(0.5, 0.5));
        assert!(country.contains(50.5, 50.5));
        assert_eq!(country.bounds().unwrap().min_lon, 50.0);
    }

    #[test]
    fn test_assemble_polygons_assigns_holes() {
        let rings = vec![
            (RingKind::Outer, square(0.0, 0.0, 10.0)),
            (RingKind::Outer, square(20.0, 0.0, 10.0)),
            (RingKind::Inner, square(22.0, 2.0, 1.0)),
            (RingKind::Inner, square(2.0, 2.0, 1.0)),
            (RingKind::Inner, square(100.0, 100.0, 1.0)),
        ];
        let polygons = assemble_polygons(rings);
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[0].holes, vec![square(2.0, 2.0, 1.0)]);
        assert_eq!(polygons[1].holes, vec![square(22.0, 2.0, 1.0)]);
    }

    #[test]
    fn test_bundled_dataset_parses() {
        let dataset = CountryDataset::bundled(Color32::WHITE).unwrap();
        assert!(dataset.len() >= 5);
        assert!(dataset.countries().iter().all(|c| !c.polygons().is_empty()));
    }
}

use crate::names::CanonicalNameMap;
use crate::types::{Boundary, Category, CategoryCounts, YearlyRecord};
use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use geo::MultiPolygon;
use serde::Deserialize;
use shapefile::Reader;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

/// One row of the statistics CSV. Counts stay raw until `into_record`.
#[derive(Debug, Deserialize)]
struct CsvRow {
    state: String,
    year: i32,
    #[serde(default)]
    rape_cases: Option<String>,
    #[serde(default)]
    kidnap_assault: Option<String>,
    #[serde(default)]
    dowry_deaths: Option<String>,
    #[serde(default)]
    assault_on_women: Option<String>,
    #[serde(default)]
    assault_on_modesty: Option<String>,
    #[serde(default)]
    domestic_violence: Option<String>,
    #[serde(default)]
    women_trafficking: Option<String>,
}

impl CsvRow {
    fn into_record(self, names: &CanonicalNameMap, line: usize) -> YearlyRecord {
        let raw = [
            self.rape_cases,
            self.kidnap_assault,
            self.dowry_deaths,
            self.assault_on_women,
            self.assault_on_modesty,
            self.domestic_violence,
            self.women_trafficking,
        ];
        let mut counts = CategoryCounts::default();
        for (category, value) in Category::ALL.into_iter().zip(raw) {
            counts = counts.with(category, parse_count(value.as_deref(), category, line));
        }
        YearlyRecord {
            region: names.resolve(self.state.trim()).to_string(),
            year: self.year,
            counts,
        }
    }
}

/// Blank counts read as zero silently; anything else unparseable reads as
/// zero with a warning naming the row and column.
fn parse_count(value: Option<&str>, category: Category, line: usize) -> u64 {
    let value = match value.map(str::trim) {
        None | Some("") => return 0,
        Some(v) => v,
    };
    match value.parse() {
        Ok(n) => n,
        Err(_) => {
            warn!(
                "Row {}: unparseable {} value '{}', counting as 0",
                line,
                category.column(),
                value
            );
            0
        }
    }
}

/// Reads yearly records from CSV, resolving region names on the way in.
///
/// Rows without a region are skipped. A repeated (region, year) pair keeps
/// the first row.
pub fn load_records(path: &Path, names: &CanonicalNameMap) -> Result<Vec<YearlyRecord>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open CSV file: {:?}", path))?;
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let mut records = Vec::new();
    let mut seen: HashSet<(String, i32)> = HashSet::new();

    for (line, result) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("Malformed CSV row {}", line + 1))?;
        if row.state.trim().is_empty() {
            continue;
        }
        let record = row.into_record(names, line + 1);
        if !seen.insert((record.region.clone(), record.year)) {
            warn!("Duplicate row for {} {}, keeping the first", record.region, record.year);
            continue;
        }
        records.push(record);
    }

    info!("Loaded {} yearly records from {:?}", records.len(), path);
    Ok(records)
}

/// Loads named region boundaries from a Shapefile or GeoJSON file.
pub fn load_boundaries(path: &Path, name_property: &str) -> Result<Vec<Boundary>> {
    let extension = path.extension()
        .and_then(|e| e.to_str())
        .map(|s: &str| s.to_lowercase())
        .ok_or_else(|| anyhow!("Boundary file has no extension"))?;

    let boundaries = match extension.as_str() {
        "shp" => load_shapefile(path, name_property)?,
        "json" | "geojson" => load_geojson(path, name_property)?,
        _ => return Err(anyhow!("Unsupported geometry format: {}", extension)),
    };

    info!("Loaded {} region boundaries from {:?}", boundaries.len(), path);
    Ok(boundaries)
}

fn load_shapefile(path: &Path, name_property: &str) -> Result<Vec<Boundary>> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open Shapefile: {:?}", path))?;

    let mut boundaries = Vec::new();

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;

        let name_value = record.get(name_property)
            .ok_or_else(|| anyhow!("Name field '{}' not found in Shapefile", name_property))?;

        let name = match name_value {
            shapefile::dbase::FieldValue::Character(Some(s)) => s.trim().to_string(),
            shapefile::dbase::FieldValue::Character(None) => continue,
            _ => return Err(anyhow!("Shapefile name field must be a string")),
        };

        let geometry: MultiPolygon<f64> = match shape {
            shapefile::Shape::Polygon(polygon) => polygon.try_into()
                .map_err(|e| anyhow!("Failed to convert polygon for {}: {:?}", name, e))?,
            shapefile::Shape::PolygonM(polygon) => polygon.try_into()
                .map_err(|e| anyhow!("Failed to convert polygonM for {}: {:?}", name, e))?,
            shapefile::Shape::PolygonZ(polygon) => polygon.try_into()
                .map_err(|e| anyhow!("Failed to convert polygonZ for {}: {:?}", name, e))?,
            _ => continue,
        };

        boundaries.push(Boundary { name, geometry });
    }

    Ok(boundaries)
}

fn load_geojson(path: &Path, name_property: &str) -> Result<Vec<Boundary>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
    parse_geojson(std::io::BufReader::new(file), name_property)
}

/// Parses a GeoJSON FeatureCollection into named boundaries.
///
/// Features without a string name or without polygon geometry are skipped.
pub fn parse_geojson<R: std::io::Read>(reader: R, name_property: &str) -> Result<Vec<Boundary>> {
    use geojson::GeoJson;

    let geojson = GeoJson::from_reader(reader).context("Failed to parse GeoJSON")?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("GeoJSON must be a FeatureCollection")),
    };

    let mut boundaries = Vec::new();

    for feature in collection.features {
        let name = match feature.property(name_property) {
            Some(serde_json::Value::String(s)) => s.trim().to_string(),
            _ => {
                warn!("Skipping feature without a '{}' name", name_property);
                continue;
            }
        };

        let geometry = match feature.geometry {
            Some(geom) => {
                let value: geo::Geometry<f64> = geom.value.try_into()
                    .map_err(|e| anyhow!("Failed to convert geometry for {}: {:?}", name, e))?;
                match value {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => continue,
                }
            }
            None => continue,
        };

        boundaries.push(Boundary { name, geometry });
    }

    Ok(boundaries)
}

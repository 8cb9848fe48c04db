use crate::color::{ColorScale, DEFAULT_HIGH, DEFAULT_LOW, DEFAULT_NO_DATA};
use crate::names::CanonicalNameMap;
use crate::viewport::{ViewportController, ZoomBounds, INITIAL_CENTER, ZOOM_MAX, ZOOM_MIN, ZOOM_STEP};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub names: NamesConfig,
    #[serde(default)]
    pub colors: ColorConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// Yearly per-region statistics
    pub data_csv: PathBuf,
    /// Region boundaries (GeoJSON or Shapefile); the map endpoints need it
    pub boundaries: Option<PathBuf>,
    /// Feature property holding the region display name
    #[serde(default = "default_name_property")]
    pub name_property: String,
}

fn default_name_property() -> String {
    "NAME_1".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NamesConfig {
    /// Extra display name -> canonical name entries
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ColorConfig {
    pub low: String,   // Hex code
    pub high: String,  // Hex code
    pub no_data: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        ColorConfig {
            low: DEFAULT_LOW.to_string(),
            high: DEFAULT_HIGH.to_string(),
            no_data: DEFAULT_NO_DATA.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MapConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_step: f64,
    /// [longitude, latitude]
    pub center: [f64; 2],
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            min_zoom: ZOOM_MIN,
            max_zoom: ZOOM_MAX,
            zoom_step: ZOOM_STEP,
            center: [INITIAL_CENTER.0, INITIAL_CENTER.1],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory of static client files served at `/`
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: 3001,
            static_dir: None,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .with_context(|| "Failed to parse TOML configuration")?;
        // Surface bad names, colors and zoom bounds at startup.
        config.name_map()?;
        config.color_scale()?;
        config.viewport_controller()?;
        Ok(config)
    }

    pub fn name_map(&self) -> Result<CanonicalNameMap> {
        CanonicalNameMap::with_overrides(self.names.overrides.clone())
            .context("Invalid [names] overrides")
    }

    pub fn color_scale(&self) -> Result<ColorScale> {
        ColorScale::from_hex(&self.colors.low, &self.colors.high, &self.colors.no_data)
            .context("Invalid [colors] section")
    }

    pub fn viewport_controller(&self) -> Result<ViewportController> {
        let bounds = ZoomBounds::new(self.map.min_zoom, self.map.max_zoom, self.map.zoom_step)
            .context("Invalid [map] section")?;
        let [lon, lat] = self.map.center;
        Ok(ViewportController::new(bounds, (lon, lat)))
    }
}

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};

pub const EDUCATION_URL: &str =
    "https://cdn.freecodecamp.org/testable-projects-fcc/data/choropleth_map/for_user_education.json";
pub const TOPOLOGY_URL: &str =
    "https://cdn.freecodecamp.org/testable-projects-fcc/data/choropleth_map/counties.json";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub input: InputConfig,
    pub layout: LayoutConfig,
    pub output: OutputConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    /// URL or local path of the education records array
    pub education: String,
    /// URL or local path of the TopoJSON topology
    pub topology: String,
    pub topology_object: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            education: EDUCATION_URL.to_string(),
            topology: TOPOLOGY_URL.to_string(),
            topology_object: "counties".to_string(),
        }
    }
}

/// Fixed drawing geometry. Passed by reference into every renderer.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    pub width: f64,
    pub height: f64,
    /// Vertical offset of the counties group, clears the title block
    pub padding_top: f64,
    pub legend: LegendLayout,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 690.0,
            padding_top: 90.0,
            legend: LegendLayout::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct LegendLayout {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for LegendLayout {
    fn default() -> Self {
        Self {
            left: 900.0,
            top: 400.0,
            width: 24.0,
            height: 220.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub html: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            html: PathBuf::from("output/index.html"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
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
        Ok(config)
    }
}

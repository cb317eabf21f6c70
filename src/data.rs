use crate::config::InputConfig;
use crate::scale::ColorScale;
use crate::topology::Topology;
use crate::types::{EducationIndex, EducationRecord, TopologyFeature};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use tracing::{debug, info};

/// Where a dataset comes from: a URL is fetched, anything else is read from disk.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Remote(String),
    Local(PathBuf),
}

impl Source {
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Source::Remote(location.to_string())
        } else {
            Source::Local(PathBuf::from(location))
        }
    }

    async fn fetch<T: DeserializeOwned>(&self) -> Result<T> {
        match self {
            Source::Remote(url) => {
                info!(%url, "fetching");
                let response = reqwest::get(url)
                    .await
                    .with_context(|| format!("Failed to fetch {}", url))?
                    .error_for_status()
                    .with_context(|| format!("Bad response from {}", url))?;
                response
                    .json::<T>()
                    .await
                    .with_context(|| format!("Failed to parse JSON from {}", url))
            }
            Source::Local(path) => {
                info!(path = %path.display(), "reading");
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Failed to read {:?}", path))?;
                serde_json::from_slice(&bytes)
                    .with_context(|| format!("Failed to parse JSON from {:?}", path))
            }
        }
    }
}

/// Everything the renderers need, loaded once per run.
#[derive(Debug, Clone)]
pub struct MapData {
    pub index: EducationIndex,
    pub features: Vec<TopologyFeature>,
    pub scale: ColorScale,
}

impl MapData {
    pub fn new(records: Vec<EducationRecord>, features: Vec<TopologyFeature>) -> Result<Self> {
        let scale = ColorScale::from_values(records.iter().map(|r| r.bachelors_or_higher))?;
        debug!(boundaries = ?scale.boundaries(), "built color scale");
        let index = EducationIndex::new(records);
        Ok(Self { index, features, scale })
    }

    pub fn record_for(&self, feature: &TopologyFeature) -> Option<&EducationRecord> {
        self.index.lookup(feature.id)
    }

    /// Features with no education record.
    pub fn unmatched(&self) -> usize {
        self.features
            .iter()
            .filter(|f| self.record_for(f).is_none())
            .count()
    }
}

/// Fetches both datasets at once. Either failing aborts the whole load.
pub async fn load_data(input: &InputConfig) -> Result<MapData> {
    let education = Source::parse(&input.education);
    let topology = Source::parse(&input.topology);

    let (records, topology) = tokio::try_join!(
        education.fetch::<Vec<EducationRecord>>(),
        topology.fetch::<Topology>(),
    )?;
    info!("Loaded {} education records", records.len());

    let features = topology
        .features(&input.topology_object)
        .with_context(|| format!("Failed to decode topology object '{}'", input.topology_object))?;
    info!("Decoded {} features", features.len());

    let data = MapData::new(records, features)?;
    let unmatched = data.unmatched();
    if unmatched > 0 {
        info!(unmatched, "features without an education record will be left unfilled");
    }
    Ok(data)
}

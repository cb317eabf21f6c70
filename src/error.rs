use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChoroplethError {
    #[error("no attribute values to build a scale from")]
    EmptyDataset,
    #[error("no education record for region {fips:?}")]
    MissingRecord { fips: Option<u32> },
    #[error("arc index {index} out of range ({len} arcs)")]
    ArcOutOfRange { index: i64, len: usize },
    #[error("topology has no object named '{0}'")]
    MissingObject(String),
}

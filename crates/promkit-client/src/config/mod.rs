//! Client configuration loader (strict parsing).

pub mod schema;

use std::fs;

use tracing::info;

use promkit_core::error::{PromError, Result};

pub use schema::{ClientConfig, DefaultsSection, HistogramSection, ObjectiveEntry, SummarySection};

pub fn load_from_file(path: &str) -> Result<ClientConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| PromError::Internal(format!("read config failed: {e}")))?;
    let cfg = load_from_str(&s)?;
    info!(path, "metrics config loaded");
    Ok(cfg)
}

pub fn load_from_str(s: &str) -> Result<ClientConfig> {
    let cfg: ClientConfig = serde_yaml::from_str(s)
        .map_err(|e| PromError::InvalidArgument(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

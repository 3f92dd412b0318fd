use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::model::CoreSchema;

/// Config file picked up from the working directory when present.
pub const CONFIG_FILE: &str = "nanno-dashboard.json";

/// Nannofossil counts for cores KF-16 and KF-18.
pub const DEFAULT_SOURCE: &str =
    "https://raw.githubusercontent.com/tito-br/Lapas-nano/refs/heads/main/dados_kf_16_18_nano.csv";

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// URL or local path of the dataset loaded at startup.
    pub source: String,
    /// Column layout of the dataset.
    pub schema: CoreSchema,
    /// Initial window size in logical pixels.
    pub window_size: [f32; 2],
    /// Height of the static chart in pixels; width grows per panel.
    pub static_height: u32,
    /// Width of one static panel in pixels.
    pub static_panel_width: u32,
    /// HTTP timeout for remote sources, in seconds.
    pub fetch_timeout_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            schema: CoreSchema::default(),
            window_size: [1400.0, 900.0],
            static_height: 1000,
            static_panel_width: 300,
            fetch_timeout_secs: 30,
        }
    }
}

impl DashboardConfig {
    /// Read a JSON config file. Missing keys fall back to defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let mut config: DashboardConfig = serde_json::from_str(text)?;
        config.schema.normalize();
        Ok(config)
    }

    /// Load [`CONFIG_FILE`] from the working directory, or defaults if absent.
    pub fn load() -> Result<Self> {
        let path = Path::new(CONFIG_FILE);
        if path.exists() {
            log::info!("Using config {}", path.display());
            Self::from_json_file(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = DashboardConfig::from_json_str("{}").unwrap();
        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    fn schema_names_are_normalized() {
        let config = DashboardConfig::from_json_str(
            r#"{ "schema": { "core_column": " Core ", "depth_column": "DEPTH",
                 "excluded_tokens": ["Sum"] } }"#,
        )
        .unwrap();
        assert_eq!(config.schema.core_column, "core");
        assert_eq!(config.schema.depth_column, "depth");
        assert_eq!(config.schema.excluded_tokens, vec!["sum".to_string()]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(DashboardConfig::from_json_str(r#"{ "colour": "red" }"#).is_err());
    }
}

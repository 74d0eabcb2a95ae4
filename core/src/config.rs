use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

/// Main configuration structure for Worldline.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub style: StyleConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path.as_ref()).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file is missing.
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    "Failed to load config from {:?}: {}. Using defaults.",
                    path.as_ref(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Get the default configuration as a TOML string.
    pub fn default_toml() -> Result<String> {
        let config = Self::default();
        toml::to_string_pretty(&config).context("Failed to serialize default config")
    }

    /// Validate the configuration for obvious misconfiguration.
    pub fn validate(&self) -> Result<()> {
        if self.layout.column_width <= 0.0 {
            anyhow::bail!("layout.column_width must be positive");
        }

        if self.layout.row_height <= 0.0 {
            anyhow::bail!("layout.row_height must be positive");
        }

        if self.style.stroke_width <= 0.0 {
            anyhow::bail!("style.stroke_width must be positive");
        }

        if self.style.default_color.is_empty() {
            anyhow::bail!("style.default_color cannot be empty");
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("Failed to parse config")?;
        Ok(config)
    }
}

/// Spacing of the diagram grid. Horizontal position is clock-driven,
/// vertical position is machine-driven; both must stay monotonic so that
/// side resolution agrees with the visual stacking.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LayoutConfig {
    #[serde(default = "default_column_width")]
    pub column_width: f64,

    #[serde(default = "default_row_height")]
    pub row_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            column_width: default_column_width(),
            row_height: default_row_height(),
        }
    }
}

/// Visual classification of message edges.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StyleConfig {
    /// Stroke color per message type. Types absent from the palette fall
    /// back to `default_color`; they are not errors.
    #[serde(default = "default_palette")]
    pub palette: HashMap<String, String>,

    #[serde(default = "default_color")]
    pub default_color: String,

    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,

    #[serde(default = "default_arrow_size")]
    pub arrow_width: f64,

    #[serde(default = "default_arrow_size")]
    pub arrow_height: f64,
}

impl StyleConfig {
    pub fn color_for(&self, message_type: &str) -> &str {
        self.palette
            .get(message_type)
            .map(String::as_str)
            .unwrap_or(&self.default_color)
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            palette: default_palette(),
            default_color: default_color(),
            stroke_width: default_stroke_width(),
            arrow_width: default_arrow_size(),
            arrow_height: default_arrow_size(),
        }
    }
}

fn default_column_width() -> f64 {
    100.0
}

fn default_row_height() -> f64 {
    100.0
}

fn default_palette() -> HashMap<String, String> {
    HashMap::from([
        ("Petition".to_string(), "blue".to_string()),
        ("Vote".to_string(), "orange".to_string()),
    ])
}

fn default_color() -> String {
    "orange".to_string()
}

fn default_stroke_width() -> f64 {
    2.0
}

fn default_arrow_size() -> f64 {
    10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.layout.column_width, 100.0);
        assert_eq!(config.style.color_for("Petition"), "blue");
        assert_eq!(config.style.color_for("Heartbeat"), "orange");
    }

    #[test]
    fn parses_partial_toml() {
        let config: Config = r#"
            [layout]
            column_width = 80.0

            [style]
            default_color = "gray"
        "#
        .parse()
        .unwrap();

        assert_eq!(config.layout.column_width, 80.0);
        assert_eq!(config.layout.row_height, 100.0);
        assert_eq!(config.style.color_for("Heartbeat"), "gray");
        assert_eq!(config.style.color_for("Vote"), "orange");
    }

    #[test]
    fn rejects_non_positive_spacing() {
        let mut config = Config::default();
        config.layout.row_height = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_toml_round_trips() {
        let rendered = Config::default_toml().unwrap();
        let config: Config = rendered.parse().unwrap();
        assert!(config.validate().is_ok());
    }
}

//! Thresholds and label style used by the numbering pipeline.
//!
//! Every field has a default, so a TOML file only needs to list the values it
//! overrides:
//!
//! ```toml
//! max_title_font_size = 14.0
//! caption_keywords = ["figure", "table", "listing"]
//!
//! [label]
//! font_size = 7.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NumberingConfig {
    /// Lines whose first span is larger than this are titles.
    pub max_title_font_size: f32,
    /// Lines with a baseline above this y are running headers.
    pub top_margin: f32,
    /// Rows whose lowercased text starts with one of these are captions.
    pub caption_keywords: Vec<String>,
    /// Maximum baseline distance between neighbours of the same row.
    pub row_tolerance: f32,
    /// Distance above the first right-column line where the columns begin.
    pub column_split_buffer: f32,
    /// How far left of the row the number is drawn.
    pub number_offset: f32,
    pub label: LabelStyle,
}

impl Default for NumberingConfig {
    fn default() -> Self {
        Self {
            max_title_font_size: 12.0,
            top_margin: 50.0,
            caption_keywords: ["figure", "fig.", "table", "source", "caption"]
                .into_iter()
                .map(String::from)
                .collect(),
            row_tolerance: 3.0,
            column_split_buffer: 10.0,
            number_offset: 18.0,
            label: LabelStyle::default(),
        }
    }
}

/// Appearance of the drawn numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LabelStyle {
    /// Built-in font name; `helv` is Helvetica.
    pub font_name: String,
    pub font_size: f32,
    /// RGB fill color, each channel in `0.0..=1.0`.
    pub color: [f32; 3],
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font_name: "helv".to_string(),
            font_size: 8.0,
            color: [0.5, 0.5, 0.5],
        }
    }
}

impl NumberingConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("max_title_font_size", self.max_title_font_size),
            ("top_margin", self.top_margin),
            ("row_tolerance", self.row_tolerance),
            ("column_split_buffer", self.column_split_buffer),
            ("number_offset", self.number_offset),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        if self.caption_keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "caption_keywords must not contain empty strings".into(),
            ));
        }

        if !self.label.font_size.is_finite() || self.label.font_size <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "label.font_size must be positive, got {}",
                self.label.font_size
            )));
        }

        if self.label.font_name.trim().is_empty() {
            return Err(ConfigError::Invalid("label.font_name must not be empty".into()));
        }

        if let Some(c) = self.label.color.iter().find(|c| !(0.0..=1.0).contains(*c)) {
            return Err(ConfigError::Invalid(format!(
                "label.color channels must be within 0.0..=1.0, got {c}"
            )));
        }

        Ok(())
    }

    /// Whether a lowercased row text reads like a figure or table caption.
    pub fn is_caption(&self, lowered: &str) -> bool {
        self.caption_keywords
            .iter()
            .any(|kw| lowered.starts_with(kw.to_lowercase().as_str()))
    }
}

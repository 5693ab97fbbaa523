use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{parser::DEFAULT_PATTERN, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub track: TrackConfig,
    pub style: CaptionStyle,
}

impl AppConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

/// Configuration specific to track loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    /// Either the `HH:MM:SS,mmm` notation or a raw strftime string.
    pub timestamp_pattern: String,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            timestamp_pattern: DEFAULT_PATTERN.to_string(),
        }
    }
}

/// Visual settings handed to whatever renderer owns the caption handles. The
/// engine carries these around but never interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionStyle {
    /// Hex RGB(A) text colour.
    pub color: String,
    pub outline_color: String,
    pub outline_width: u32,
    pub font_size: u32,
    pub halign: HorizontalAlign,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            color: "FFFFFF".to_string(),
            outline_color: "333333".to_string(),
            outline_width: 2,
            font_size: 40,
            halign: HorizontalAlign::Center,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::from_json_str("{}").unwrap();

        assert_eq!(config.track.timestamp_pattern, DEFAULT_PATTERN);
        assert_eq!(config.style, CaptionStyle::default());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = AppConfig::from_json_str(
            r#"{ "track": { "timestamp_pattern": "HH:MM:SS.mmm" }, "style": { "font_size": 28, "halign": "left" } }"#,
        )
        .unwrap();

        assert_eq!(config.track.timestamp_pattern, "HH:MM:SS.mmm");
        assert_eq!(config.style.font_size, 28);
        assert_eq!(config.style.halign, HorizontalAlign::Left);
        assert_eq!(config.style.outline_width, 2);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = AppConfig::from_json_str("{ track: ").unwrap_err();
        assert!(matches!(err, crate::CaptionError::Config(_)));
    }

    #[test]
    fn reads_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, br#"{ "style": { "color": "FFFF00" } }"#).unwrap();

        let config = AppConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.style.color, "FFFF00");
    }
}

//! Request configuration as read from JSON files and the wasm surface.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::font::FontChoice;
use crate::pipeline::{ExportFormat, IllusionRequest};
use crate::text::{ExtrusionParams, InputValidationError};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything one generation needs, with camelCase keys:
///
/// ```json
/// { "wordA": "CAT", "wordB": "DOG", "font": "Sans", "padding": 2.5, "fillet": 0.5 }
/// ```
///
/// Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IllusionConfig {
    pub word_a: String,
    pub word_b: String,
    pub font: FontChoice,
    pub padding: f64,
    pub fillet: f64,
    pub glyph_size: f64,
    pub depth: f64,
    pub merge_groups: bool,
    pub format: ExportFormat,
    pub unlit: bool,
}

impl Default for IllusionConfig {
    fn default() -> Self {
        let params = ExtrusionParams::default();
        Self {
            word_a: String::new(),
            word_b: String::new(),
            font: FontChoice::Builtin,
            padding: params.padding_offset,
            fillet: params.fillet_fraction,
            glyph_size: params.glyph_size,
            depth: params.depth,
            merge_groups: true,
            format: ExportFormat::Glb,
            unlit: false,
        }
    }
}

impl IllusionConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    #[must_use]
    pub fn params(&self) -> ExtrusionParams {
        ExtrusionParams {
            glyph_size: self.glyph_size,
            depth: self.depth,
            padding_offset: self.padding,
            fillet_fraction: self.fillet,
        }
    }

    pub fn to_request(&self) -> Result<IllusionRequest, InputValidationError> {
        IllusionRequest::new(&self.word_a, &self.word_b, self.params(), self.merge_groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_defaults_apply() {
        let config = IllusionConfig::from_json_str(r#"{ "wordA": "cat", "wordB": "dog" }"#).unwrap();
        assert_eq!(config.font, FontChoice::Builtin);
        assert_eq!(config.padding, 2.5);
        assert_eq!(config.fillet, 0.5);
        assert_eq!(config.format, ExportFormat::Glb);
        assert!(config.merge_groups);

        let request = config.to_request().unwrap();
        assert_eq!(request.word_a.as_str(), "CAT");
        assert_eq!(request.params, ExtrusionParams::default());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = IllusionConfig::from_json_str(
            r#"{ "wordA": "AB", "wordB": "CD", "font": "fonts/x.ttf", "padding": 1,
                 "fillet": 0, "glyphSize": 7, "depth": 2, "mergeGroups": false,
                 "format": "stl-binary" }"#,
        )
        .unwrap();
        assert_eq!(config.font, FontChoice::File(PathBuf::from("fonts/x.ttf")));
        assert_eq!(config.format, ExportFormat::StlBinary);
        let params = config.params();
        assert_eq!(params.glyph_size, 7.0);
        assert_eq!(params.padding_offset, 1.0);
        assert!(!config.to_request().unwrap().merge_groups);
    }

    #[test]
    fn invalid_configs_are_reported() {
        assert!(matches!(
            IllusionConfig::from_json_str("{ wordA: }"),
            Err(ConfigError::Json(_))
        ));
        let config = IllusionConfig {
            word_a: "CAT".into(),
            word_b: "DOGS".into(),
            ..IllusionConfig::default()
        };
        assert_eq!(
            config.to_request().unwrap_err(),
            InputValidationError::LengthMismatch { a: 3, b: 4 }
        );
        assert!(matches!(
            IllusionConfig::from_path(Path::new("/nonexistent/config.json")),
            Err(ConfigError::Io { .. })
        ));
    }
}

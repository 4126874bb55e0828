use crate::cli::CommonArgs;
use crate::image_processing::annotate::LabelStyle;
use crate::image_processing::crop::CropMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings file format. Every field is optional.
///
/// ```json
/// { "size": "400x600", "cropMode": "zoom", "labelStyle": "banner", "jobs": 4 }
/// ```
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigFile {
    pub size: Option<String>,
    pub crop_mode: Option<CropMode>,
    pub label_style: Option<LabelStyle>,
    pub zoom_factor: Option<f64>,
    pub padding_ratio: Option<f64>,
    pub font: Option<String>,
    pub face_model: Option<PathBuf>,
    pub extensions: Option<String>,
    pub jobs: Option<usize>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

impl CommonArgs {
    /// Load configuration from a JSON file and merge with command-line arguments
    /// Command-line arguments take precedence over config file values
    pub fn load_and_merge_config(&mut self) -> Result<()> {
        if let Some(config_path) = self.config_file.clone() {
            let config = ConfigFile::load(&config_path)?;
            self.merge_from_config(config);

            tracing::debug!(path = %config_path.display(), "loaded configuration file");
        }
        Ok(())
    }

    fn merge_from_config(&mut self, config: ConfigFile) {
        // Only fill options that were not given on the command line
        self.size = self.size.take().or(config.size);
        self.crop_mode = self.crop_mode.or(config.crop_mode);
        self.label_style = self.label_style.or(config.label_style);
        self.zoom_factor = self.zoom_factor.or(config.zoom_factor);
        self.padding_ratio = self.padding_ratio.or(config.padding_ratio);
        self.font = self.font.take().or(config.font);
        self.face_model = self.face_model.take().or(config.face_model);
        self.extensions = self.extensions.take().or(config.extensions);
        self.jobs = self.jobs.or(config.jobs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_command_line_overrides_file() {
        let mut args = CommonArgs {
            size: Some("256x256".into()),
            ..Default::default()
        };
        args.merge_from_config(ConfigFile {
            size: Some("400x600".into()),
            crop_mode: Some(CropMode::Zoom),
            jobs: Some(3),
            ..Default::default()
        });

        assert_eq!(args.size.as_deref(), Some("256x256"));
        assert_eq!(args.crop_mode, Some(CropMode::Zoom));
        assert_eq!(args.jobs, Some(3));
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"size": "300x300", "labelStyle": "banner", "zoomFactor": 1.5}}"#
        )
        .unwrap();

        let mut args = CommonArgs {
            config_file: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        args.load_and_merge_config().unwrap();

        let config = args.badge_config().unwrap();
        assert_eq!((config.target_width, config.target_height), (300, 300));
        assert_eq!(config.label_style, LabelStyle::Banner);
        assert_eq!(config.zoom_factor, 1.5);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result: std::result::Result<ConfigFile, _> =
            serde_json::from_str(r#"{"colour": "red"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(ConfigFile::load(Path::new("/no/such/badge.json")).is_err());
    }
}

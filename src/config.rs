//! Application configuration: engine options plus pipeline and artifact
//! settings, loadable from YAML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;
use crate::error::ConfigError;
use crate::integration::{ArtifactNamer, DEFAULT_PREFIX, PipelineSettings};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(flatten)]
    pub engine: EngineConfig,
    /// Minimum moving-region area, in pixels
    pub min_area: u32,
    /// Process one frame in every `freq`
    pub freq: u32,
    /// Directory for alert artifacts; working directory when unset
    pub save_path: Option<PathBuf>,
    /// Embedded in artifact names to tell devices apart
    pub device_id: u32,
    pub artifact_prefix: String,
    /// Font for box captions; boxes only when unset
    pub font_path: Option<PathBuf>,
    /// Directory of frames to read
    pub frames: Option<PathBuf>,
    /// Video file to read when no frame directory is given
    pub video: Option<PathBuf>,
    /// Camera opened when neither frames nor a video file is given
    pub camera: i32,
    /// Recorded detections and tracks (JSON lines)
    pub annotations: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let pipeline = PipelineSettings::default();
        Self {
            engine: EngineConfig::default(),
            min_area: pipeline.min_area,
            freq: pipeline.freq,
            save_path: None,
            device_id: 1,
            artifact_prefix: DEFAULT_PREFIX.to_string(),
            font_path: None,
            frames: None,
            video: None,
            camera: 0,
            annotations: None,
        }
    }
}

impl AppConfig {
    /// Load and validate a YAML config file. Missing keys take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AppConfig =
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Engine options are the only ones that can be invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()
    }

    /// Motion and throttling settings for the pipeline.
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            min_area: self.min_area,
            freq: self.freq,
        }
    }

    /// Namer writing into `save_path` with this device's prefix and id.
    pub fn artifact_namer(&self) -> ArtifactNamer {
        ArtifactNamer::new(
            self.artifact_prefix.clone(),
            self.device_id,
            self.save_path.clone(),
        )
    }
}

use serde::{Deserialize, Serialize};

use crate::engine::controller::AdmissionPolicy;
use crate::engine::direction::{BoundaryLine, Direction};
use crate::error::ConfigError;

/// Configuration for the perimeter engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Forbidden movement direction
    pub direction: Direction,
    /// Boundary sits `frame_size / ratio` in from the edge being approached
    pub ratio: u32,
    /// Side length of the square frame, in pixels
    pub frame_size: u32,
    /// Samples required before a track is evaluated; the smoothing window is twice this
    pub duration: usize,
    /// Minimum displacement along the axis, in pixels
    pub min_dist: f32,
    /// Which motion-positive frames reach the classifier
    pub admission: AdmissionPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            direction: Direction::Right,
            ratio: 2,
            frame_size: 480,
            duration: 5,
            min_dist: 3.0,
            admission: AdmissionPolicy::Always,
        }
    }
}

impl EngineConfig {
    /// Reject values the boundary and classifier cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_size == 0 {
            return Err(ConfigError::ZeroFrameSize);
        }
        if self.ratio < 2 {
            return Err(ConfigError::RatioTooSmall(self.ratio));
        }
        if self.duration == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if !self.min_dist.is_finite() || self.min_dist < 0.0 {
            return Err(ConfigError::InvalidMinDist(self.min_dist));
        }
        Ok(())
    }

    /// Number of most recent samples averaged into the reference point.
    pub fn window(&self) -> usize {
        2 * self.duration
    }

    /// Compute the boundary line for this configuration.
    pub fn boundary(&self) -> Result<BoundaryLine, ConfigError> {
        self.validate()?;
        BoundaryLine::new(self.direction, self.frame_size, self.ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window(), 10);
        assert_eq!(config.boundary().unwrap().position(), 240.0);
    }

    #[test]
    fn test_validate_rejects() {
        let bad = [
            EngineConfig {
                ratio: 1,
                ..Default::default()
            },
            EngineConfig {
                frame_size: 0,
                ..Default::default()
            },
            EngineConfig {
                duration: 0,
                ..Default::default()
            },
            EngineConfig {
                min_dist: -1.0,
                ..Default::default()
            },
            EngineConfig {
                min_dist: f32::NAN,
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{config:?}");
            assert!(config.boundary().is_err());
        }
    }

    #[test]
    fn test_unknown_direction_fails_deserialization() {
        let err = serde_json::from_str::<EngineConfig>(r#"{"direction": "north"}"#).unwrap_err();
        assert!(err.to_string().contains("unknown direction"));

        let config: EngineConfig = serde_json::from_str(r#"{"direction": "up", "ratio": 4}"#).unwrap();
        assert_eq!(config.direction, Direction::Up);
        assert_eq!(config.ratio, 4);
        assert_eq!(config.duration, 5);
    }
}

//! TOML settings files for the process command.
//!
//! Keys mirror the fields of [`GrainGateParams`], with names instead of
//! indices for the shape, timebase and beat division. Every key is
//! optional; missing keys keep the engine default.
//!
//! ```toml
//! shape = "adsr"
//! timebase = "beats"
//! beat_division = "1/8T"
//! bpm = 96.0
//! randomness = 0.3
//! ```

use graingate_core::{BeatDivision, Timebase};
use graingate_engine::{GrainGateParams, ShapeSelect};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from loading or applying a settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Unknown grain shape name
    #[error("unknown shape '{0}' (see `graingate shapes`)")]
    UnknownShape(String),

    /// Unknown beat division label
    #[error("unknown beat division '{0}' (see `graingate shapes`)")]
    UnknownDivision(String),

    /// Timebase other than ms or beats
    #[error("unknown timebase '{0}' (expected 'ms' or 'beats')")]
    UnknownTimebase(String),
}

/// Process settings. `None` leaves the default in place.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub shape: Option<String>,
    pub grain_ms: Option<f32>,
    pub attack_ms: Option<f32>,
    pub decay_ms: Option<f32>,
    pub sustain: Option<f32>,
    pub release_ms: Option<f32>,
    pub randomness: Option<f32>,
    pub beat_division: Option<String>,
    pub timebase: Option<String>,
    pub lock_to_grid: Option<bool>,
    pub stereo_correlation: Option<bool>,
    pub crossfade: Option<f32>,
    pub threshold_db: Option<f32>,
    pub bpm: Option<f32>,
    pub seed: Option<u64>,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), ?settings, "loaded settings");
        Ok(settings)
    }

    /// Parse settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Layer `overrides` on top of `self`; any key set in `overrides` wins.
    pub fn merged_with(self, overrides: Settings) -> Settings {
        Settings {
            shape: overrides.shape.or(self.shape),
            grain_ms: overrides.grain_ms.or(self.grain_ms),
            attack_ms: overrides.attack_ms.or(self.attack_ms),
            decay_ms: overrides.decay_ms.or(self.decay_ms),
            sustain: overrides.sustain.or(self.sustain),
            release_ms: overrides.release_ms.or(self.release_ms),
            randomness: overrides.randomness.or(self.randomness),
            beat_division: overrides.beat_division.or(self.beat_division),
            timebase: overrides.timebase.or(self.timebase),
            lock_to_grid: overrides.lock_to_grid.or(self.lock_to_grid),
            stereo_correlation: overrides.stereo_correlation.or(self.stereo_correlation),
            crossfade: overrides.crossfade.or(self.crossfade),
            threshold_db: overrides.threshold_db.or(self.threshold_db),
            bpm: overrides.bpm.or(self.bpm),
            seed: overrides.seed.or(self.seed),
        }
    }

    /// Resolve names and build a clamped parameter snapshot.
    pub fn to_params(&self) -> Result<GrainGateParams, ConfigError> {
        let mut params = GrainGateParams::default();

        if let Some(name) = &self.shape {
            params.shape = name
                .parse::<ShapeSelect>()
                .map_err(|_| ConfigError::UnknownShape(name.clone()))?;
        }
        if let Some(label) = &self.beat_division {
            params.beat_division = BeatDivision::index_of_label(label)
                .map_err(|_| ConfigError::UnknownDivision(label.clone()))?;
        }
        if let Some(name) = &self.timebase {
            params.timebase = name
                .parse::<Timebase>()
                .map_err(|_| ConfigError::UnknownTimebase(name.clone()))?;
        }

        let floats = [
            (self.grain_ms, &mut params.grain_ms),
            (self.attack_ms, &mut params.attack_ms),
            (self.decay_ms, &mut params.decay_ms),
            (self.sustain, &mut params.sustain),
            (self.release_ms, &mut params.release_ms),
            (self.randomness, &mut params.randomness),
            (self.crossfade, &mut params.crossfade),
            (self.threshold_db, &mut params.threshold_db),
        ];
        for (value, field) in floats {
            if let Some(value) = value {
                *field = value;
            }
        }
        if let Some(lock) = self.lock_to_grid {
            params.lock_to_grid = lock;
        }
        if let Some(correlated) = self.stereo_correlation {
            params.stereo_correlation = correlated;
        }

        Ok(params.sanitized())
    }
}

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Result, VinesError};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub audio: AudioConfig,
    pub gameplay: GameplayConfig,
}

impl AppConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the engine cannot run with. A flatness tolerance
    /// must be finite and strictly positive.
    pub fn validate(&self) -> Result<()> {
        let tolerance = self.gameplay.flatness_tolerance;
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(VinesError::InvalidInput(
                "flatness_tolerance must be a positive finite number",
            ));
        }
        Ok(())
    }

    /// Reads a JSON config file. Missing sections fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// Settings for the external audio collaborator. The core only reads
/// `hit_sounds` to decide whether to emit hit sound signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub volume: f32,
    pub hit_sounds: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            volume: 0.8,
            hit_sounds: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    /// Flatness tolerance, in plane units, used when flattening path curves.
    pub flatness_tolerance: f64,
    /// Seed for cosmetic hit randomisation. `None` seeds from the OS.
    pub cosmetic_seed: Option<u64>,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            flatness_tolerance: 0.15,
            cosmetic_seed: None,
        }
    }
}

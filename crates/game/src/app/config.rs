use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub(crate) const TUNING_ENV_VAR: &str = "PLATFORMER_TUNING";
/// Upper bound for the power-up and drowning timers.
const MAX_TIMER_SECONDS: f32 = 3600.0;

/// Movement and pickup numbers for the level. Every field is optional in a
/// tuning file; missing ones keep the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Tuning {
    pub(crate) acceleration: f32,
    pub(crate) drag: f32,
    pub(crate) gravity_y: f32,
    pub(crate) jump_velocity: f32,
    pub(crate) particle_velocity: f32,
    pub(crate) scale: f32,
    pub(crate) coin_score: u32,
    pub(crate) power_up_jump_velocity: f32,
    pub(crate) power_up_seconds: f32,
    pub(crate) drown_gravity_y: f32,
    pub(crate) drown_recovery_seconds: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            acceleration: 400.0,
            drag: 500.0,
            gravity_y: 1500.0,
            jump_velocity: -600.0,
            particle_velocity: 50.0,
            scale: 2.0,
            coin_score: 25,
            power_up_jump_velocity: -2000.0,
            power_up_seconds: 10.0,
            drown_gravity_y: 50.0,
            drown_recovery_seconds: 2.0,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to read tuning file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse tuning file {path} at {json_path}: {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl Tuning {
    fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("acceleration", self.acceleration),
            ("drag", self.drag),
            ("gravity_y", self.gravity_y),
            ("jump_velocity", self.jump_velocity),
            ("particle_velocity", self.particle_velocity),
            ("scale", self.scale),
            ("power_up_jump_velocity", self.power_up_jump_velocity),
            ("power_up_seconds", self.power_up_seconds),
            ("drown_gravity_y", self.drown_gravity_y),
            ("drown_recovery_seconds", self.drown_recovery_seconds),
        ];
        if let Some(&(field, _)) = finite.iter().find(|(_, value)| !value.is_finite()) {
            return Err(ConfigError::Invalid {
                field,
                reason: "must be a finite number",
            });
        }
        if self.scale <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "scale",
                reason: "must be greater than zero",
            });
        }
        if self.acceleration < 0.0 {
            return Err(ConfigError::Invalid {
                field: "acceleration",
                reason: "must not be negative",
            });
        }
        if self.drag < 0.0 {
            return Err(ConfigError::Invalid {
                field: "drag",
                reason: "must not be negative",
            });
        }
        let timers = [
            ("power_up_seconds", self.power_up_seconds),
            ("drown_recovery_seconds", self.drown_recovery_seconds),
        ];
        for (field, seconds) in timers {
            if seconds < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must not be negative",
                });
            }
            if seconds > MAX_TIMER_SECONDS {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must not exceed one hour",
                });
            }
        }
        Ok(())
    }
}

/// Baseline tuning, or the file named by `PLATFORMER_TUNING` when set.
pub(crate) fn resolve_tuning() -> Result<Tuning, ConfigError> {
    match env::var(TUNING_ENV_VAR) {
        Ok(value) => {
            let path = PathBuf::from(value);
            let tuning = load_tuning(&path)?;
            info!(path = %path.display(), "tuning_loaded");
            Ok(tuning)
        }
        Err(env::VarError::NotPresent) => Ok(Tuning::default()),
        Err(source) => Err(ConfigError::EnvVar {
            var: TUNING_ENV_VAR,
            source,
        }),
    }
}

pub(crate) fn load_tuning(path: &Path) -> Result<Tuning, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_tuning(&raw, path)
}

fn parse_tuning(raw: &str, path: &Path) -> Result<Tuning, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let tuning: Tuning = serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let json_path = error.path().to_string();
        ConfigError::Parse {
            path: path.to_path_buf(),
            json_path,
            source: error.into_inner(),
        }
    })?;
    tuning.validate()?;
    Ok(tuning)
}

use std::env;
use std::path::PathBuf;

use engine::{resolve_app_paths, AppPaths, LoopConfig, Scene, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::{self, ConfigError};
use super::level::{LevelAsset, LevelError, PlatformerScene};

pub(crate) const LEVEL_ENV_VAR: &str = "PLATFORMER_LEVEL";
const DEFAULT_LEVEL: &str = "levels/platformer-level-1.tmj";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("level {path}: {source}")]
    Level {
        path: PathBuf,
        #[source]
        source: LevelError,
    },
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "=== Platformer Startup ===");

    let paths = resolve_app_paths()?;
    let tuning = config::resolve_tuning()?;
    let level_path = resolve_level_path(&paths);
    let asset = LevelAsset::load(&level_path).map_err(|source| BootstrapError::Level {
        path: level_path.clone(),
        source,
    })?;
    info!(
        root = %paths.root.display(),
        level = %level_path.display(),
        "paths_resolved"
    );

    let config = LoopConfig {
        window_title: "Platformer".to_string(),
        asset_root: paths.assets_dir.clone(),
        ..LoopConfig::default()
    };

    Ok(AppWiring {
        config,
        scene: Box::new(PlatformerScene::new(asset, tuning)),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

/// `PLATFORMER_LEVEL` wins; relative overrides resolve against the asset
/// directory.
fn resolve_level_path(paths: &AppPaths) -> PathBuf {
    match env::var(LEVEL_ENV_VAR) {
        Ok(value) if !value.trim().is_empty() => level_path_from_override(paths, value.trim()),
        _ => paths.asset(DEFAULT_LEVEL),
    }
}

fn level_path_from_override(paths: &AppPaths, value: &str) -> PathBuf {
    let candidate = PathBuf::from(value);
    if candidate.is_absolute() {
        candidate
    } else {
        paths.asset(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_level_override_resolves_under_assets() {
        let paths = AppPaths::from_root(PathBuf::from("/game"));
        assert_eq!(
            level_path_from_override(&paths, "levels/test.tmj"),
            PathBuf::from("/game/assets/levels/test.tmj")
        );
    }

    #[test]
    fn absolute_level_override_is_kept() {
        let paths = AppPaths::from_root(PathBuf::from("/game"));
        assert_eq!(
            level_path_from_override(&paths, "/maps/custom.tmj"),
            PathBuf::from("/maps/custom.tmj")
        );
    }
}

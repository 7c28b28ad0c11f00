use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flappy_coach_core::constants::TICKS_PER_SECOND;
use flappy_coach_core::GameConfig;

pub const DEFAULT_STORE_PATH: &str = "flappy-coach-highscore.json";
/// Ten simulated minutes at the default tick rate.
pub const DEFAULT_MAX_TICKS: u64 = 10 * 60 * TICKS_PER_SECOND as u64;
pub const MAX_TICK_HZ: u32 = 1_000;

/// Process settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSettings {
    pub store_path: PathBuf,
    pub tick_hz: u32,
    pub max_ticks: u64,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            tick_hz: TICKS_PER_SECOND,
            max_ticks: DEFAULT_MAX_TICKS,
        }
    }
}

impl HostSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let store_path = env::var("FLAPPY_STORE_PATH")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.store_path);

        let mut tick_hz = read_env_u32("FLAPPY_TICK_HZ", defaults.tick_hz);
        if tick_hz > MAX_TICK_HZ {
            tracing::warn!(
                "FLAPPY_TICK_HZ ({}) exceeds {}. Falling back to {}.",
                tick_hz,
                MAX_TICK_HZ,
                defaults.tick_hz
            );
            tick_hz = defaults.tick_hz;
        }

        Self {
            store_path,
            tick_hz,
            max_ticks: read_env_u64("FLAPPY_MAX_TICKS", defaults.max_ticks),
        }
    }

    #[inline]
    pub fn dt(&self) -> f64 {
        1.0 / self.tick_hz as f64
    }
}

/// Reads a JSON game config, or the defaults when no path is given. Missing
/// sections and fields take their default values.
pub fn load_game_config(path: Option<&Path>) -> Result<GameConfig> {
    let config = match path {
        Some(path) => {
            let bytes = fs::read(path)
                .with_context(|| format!("failed reading config {}", path.display()))?;
            serde_json::from_slice::<GameConfig>(&bytes)
                .with_context(|| format!("failed parsing config {}", path.display()))?
        }
        None => GameConfig::default(),
    };
    config.validate().context("invalid game config")?;
    Ok(config)
}

fn read_env_u32(name: &str, default: u32) -> u32 {
    read_env_parsed(name, default, |value| {
        value.parse::<u32>().ok().filter(|value| *value > 0)
    })
}

fn read_env_u64(name: &str, default: u64) -> u64 {
    read_env_parsed(name, default, |value| {
        value.parse::<u64>().ok().filter(|value| *value > 0)
    })
}

fn read_env_parsed<T, F>(name: &str, default: T, parse: F) -> T
where
    T: Copy + std::fmt::Display,
    F: Fn(&str) -> Option<T>,
{
    match env::var(name) {
        Ok(raw) => parse(raw.trim()).unwrap_or_else(|| {
            tracing::warn!("{name}={raw:?} is not a positive integer. Falling back to {default}.");
            default
        }),
        Err(_) => default,
    }
}

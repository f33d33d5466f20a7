use cardcrew_engine::config::GameConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::server::ServerConfig;

pub const CONFIG_ENV: &str = "CARDCREW_CONFIG";
pub const HOST_ENV: &str = "CARDCREW_HOST";
pub const PORT_ENV: &str = "CARDCREW_PORT";
pub const SEED_ENV: &str = "CARDCREW_SEED";
pub const UNIQUE_CHIPS_ENV: &str = "CARDCREW_UNIQUE_CHIPS";

/// Everything the server needs at start-up
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub seed: Option<u64>,
    pub unique_chip_picks: bool,
    pub vaults_to_win: u32,
    pub alarms_to_lose: u32,
}

impl Default for Settings {
    fn default() -> Self {
        let game = GameConfig::default();
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            seed: game.seed,
            unique_chip_picks: game.unique_chip_picks,
            vaults_to_win: game.vaults_to_win,
            alarms_to_lose: game.alarms_to_lose,
        }
    }
}

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Default,
    File,
    Env,
    Cli,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettingsSources {
    pub host: ValueSource,
    pub port: ValueSource,
    pub seed: ValueSource,
    pub unique_chip_picks: ValueSource,
    pub vaults_to_win: ValueSource,
    pub alarms_to_lose: ValueSource,
}

impl Default for SettingsSources {
    fn default() -> Self {
        Self {
            host: ValueSource::Default,
            port: ValueSource::Default,
            seed: ValueSource::Default,
            unique_chip_picks: ValueSource::Default,
            vaults_to_win: ValueSource::Default,
            alarms_to_lose: ValueSource::Default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub settings: Settings,
    pub sources: SettingsSources,
}

/// Command-line values; anything set here beats file and environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub seed: Option<u64>,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    host: Option<String>,
    port: Option<u16>,
    seed: Option<u64>,
    unique_chip_picks: Option<bool>,
    vaults_to_win: Option<u32>,
    alarms_to_lose: Option<u32>,
}

impl Settings {
    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            seed: self.seed,
            unique_chip_picks: self.unique_chip_picks,
            vaults_to_win: self.vaults_to_win,
            alarms_to_lose: self.alarms_to_lose,
        }
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::new(self.host.clone(), self.port, self.game_config())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.host.trim().is_empty() {
            return Err(SettingsError::Invalid("host must not be empty".into()));
        }
        if self.vaults_to_win == 0 {
            return Err(SettingsError::Invalid("vaults_to_win must be >0".into()));
        }
        if self.alarms_to_lose == 0 {
            return Err(SettingsError::Invalid("alarms_to_lose must be >0".into()));
        }
        Ok(())
    }
}

/// Resolves settings from the process environment. Precedence, lowest
/// first: defaults, the TOML file named by `--config` or `CARDCREW_CONFIG`,
/// `CARDCREW_*` variables, command-line overrides.
pub fn load(overrides: &Overrides) -> Result<ResolvedSettings, SettingsError> {
    load_with(overrides, |key| std::env::var(key).ok())
}

pub fn load_with<F>(overrides: &Overrides, env: F) -> Result<ResolvedSettings, SettingsError>
where
    F: Fn(&str) -> Option<String>,
{
    let env = |key: &str| env(key).filter(|v| !v.is_empty());
    let mut cfg = Settings::default();
    let mut sources = SettingsSources::default();

    let path = overrides
        .config
        .clone()
        .or_else(|| env(CONFIG_ENV).map(PathBuf::from));
    if let Some(path) = path {
        apply_file(&mut cfg, &mut sources, &read_file(&path)?);
    }

    if let Some(host) = env(HOST_ENV) {
        cfg.host = host;
        sources.host = ValueSource::Env;
    }
    if let Some(port) = env(PORT_ENV) {
        cfg.port = port.parse().map_err(|_| SettingsError::InvalidEnv {
            key: PORT_ENV,
            value: port.clone(),
        })?;
        sources.port = ValueSource::Env;
    }
    if let Some(seed) = env(SEED_ENV) {
        cfg.seed = Some(seed.parse().map_err(|_| SettingsError::InvalidEnv {
            key: SEED_ENV,
            value: seed.clone(),
        })?);
        sources.seed = ValueSource::Env;
    }
    if let Some(flag) = env(UNIQUE_CHIPS_ENV) {
        cfg.unique_chip_picks = parse_bool(&flag).ok_or_else(|| SettingsError::InvalidEnv {
            key: UNIQUE_CHIPS_ENV,
            value: flag.clone(),
        })?;
        sources.unique_chip_picks = ValueSource::Env;
    }

    if let Some(host) = &overrides.host {
        cfg.host = host.clone();
        sources.host = ValueSource::Cli;
    }
    if let Some(port) = overrides.port {
        cfg.port = port;
        sources.port = ValueSource::Cli;
    }
    if let Some(seed) = overrides.seed {
        cfg.seed = Some(seed);
        sources.seed = ValueSource::Cli;
    }

    cfg.validate()?;
    Ok(ResolvedSettings {
        settings: cfg,
        sources,
    })
}

fn read_file(path: &Path) -> Result<FileSettings, SettingsError> {
    let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&text)?)
}

fn apply_file(cfg: &mut Settings, sources: &mut SettingsSources, file: &FileSettings) {
    if let Some(v) = &file.host {
        cfg.host = v.clone();
        sources.host = ValueSource::File;
    }
    if let Some(v) = file.port {
        cfg.port = v;
        sources.port = ValueSource::File;
    }
    if let Some(v) = file.seed {
        cfg.seed = Some(v);
        sources.seed = ValueSource::File;
    }
    if let Some(v) = file.unique_chip_picks {
        cfg.unique_chip_picks = v;
        sources.unique_chip_picks = ValueSource::File;
    }
    if let Some(v) = file.vaults_to_win {
        cfg.vaults_to_win = v;
        sources.vaults_to_win = ValueSource::File;
    }
    if let Some(v) = file.alarms_to_lose {
        cfg.alarms_to_lose = v;
        sources.alarms_to_lose = ValueSource::File;
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{Error, Result, env_subst::substitute_env, schema::TeamsyncConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "teamsync.toml",
    "teamsync.yaml",
    "teamsync.yml",
    "teamsync.json",
];

const ENV_DATABASE_URL: &str = "TEAMSYNC_DATABASE_URL";
const ENV_ENABLED_TEAMS: &str = "TEAMSYNC_ENABLED_TEAMS";
const ENV_AVATAR_TTL: &str = "TEAMSYNC_AVATAR_TTL_SECS";

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<TeamsyncConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&substitute_env(&raw), path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./teamsync.{toml,yaml,yml,json}`
/// 2. `~/.config/teamsync/teamsync.{toml,yaml,yml,json}`
///
/// Returns `TeamsyncConfig::default()` if no file is found or the file
/// cannot be parsed.
pub fn discover_and_load() -> TeamsyncConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    TeamsyncConfig::default()
}

fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));
    local.chain(global).find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/teamsync/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "teamsync").map(|d| d.config_dir().to_path_buf())
}

/// Split a comma-separated team list the way the host plugin setting is
/// stored. Entries are kept verbatim, so an empty setting becomes `[""]`
/// (every team enabled).
pub fn parse_enabled_teams(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_owned).collect()
}

/// Apply `TEAMSYNC_*` environment overrides on top of a loaded config.
pub fn apply_env_overrides(config: TeamsyncConfig) -> Result<TeamsyncConfig> {
    apply_env_overrides_with(config, |name| std::env::var(name).ok())
}

fn apply_env_overrides_with(
    mut config: TeamsyncConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<TeamsyncConfig> {
    if let Some(url) = lookup(ENV_DATABASE_URL) {
        config.database.url = url;
    }
    if let Some(teams) = lookup(ENV_ENABLED_TEAMS) {
        config.sync.enabled_teams = parse_enabled_teams(&teams);
    }
    if let Some(ttl) = lookup(ENV_AVATAR_TTL) {
        config.cache.avatar_ttl_secs = ttl
            .trim()
            .parse()
            .map_err(|e| Error::invalid_value(ENV_AVATAR_TTL, e))?;
    }
    Ok(config)
}

fn parse_config(raw: &str, path: &Path) -> Result<TeamsyncConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => Err(Error::UnsupportedFormat {
            extension: ext.to_string(),
        }),
    }
}

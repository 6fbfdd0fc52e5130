//! Configuration loading for teamsync.
//!
//! Config files: `teamsync.toml`, `teamsync.yaml`, `teamsync.yml` or
//! `teamsync.json`, searched in `./` then `~/.config/teamsync/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution in the raw
//! file, and `TEAMSYNC_*` environment overrides after parsing.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;

pub use {
    error::{Error, Result},
    loader::{
        apply_env_overrides, config_dir, discover_and_load, load_config, parse_enabled_teams,
    },
    schema::{CacheConfig, DatabaseConfig, SyncConfig, TeamsyncConfig},
};

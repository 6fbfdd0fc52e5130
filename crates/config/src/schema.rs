//! Config schema types (database, sync policy, cache, team names).
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamsyncConfig {
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
    pub cache: CacheConfig,
    /// Local team id → team name. Used by the CLI in place of the host
    /// platform's team directory.
    pub teams: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `sqlite://…` or `postgres://…`. May embed credentials; never logged.
    pub url: String,
    pub max_connections: u32,
    /// How long a caller waits for a pooled connection before failing.
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://teamsync.db?mode=rwc".into(),
            max_connections: 5,
            acquire_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Team names allowed to bridge. A single empty entry enables every team;
    /// an empty list enables none.
    pub enabled_teams: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled_teams: vec![String::new()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub avatar_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            avatar_ttl_secs: 300,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_every_team() {
        let cfg = TeamsyncConfig::default();
        assert_eq!(cfg.sync.enabled_teams, vec![String::new()]);
        assert_eq!(cfg.cache.avatar_ttl_secs, 300);
        assert!(cfg.database.url.starts_with("sqlite:"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: TeamsyncConfig = toml::from_str(
            r#"
            [sync]
            enabled_teams = ["engineering", "sales"]

            [teams]
            t1 = "engineering"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.sync.enabled_teams, vec!["engineering", "sales"]);
        assert_eq!(cfg.teams.get("t1").map(String::as_str), Some("engineering"));
        assert_eq!(cfg.database.max_connections, 5);
    }
}

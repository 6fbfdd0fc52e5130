use std::collections::HashMap;

use async_trait::async_trait;

use crate::{Error, Result};

/// Source of the currently enabled team names.
///
/// Read on every check, so a config reload is visible to the very next call.
pub trait EnabledTeams: Send + Sync {
    fn enabled_teams(&self) -> Vec<String>;
}

impl<F> EnabledTeams for F
where
    F: Fn() -> Vec<String> + Send + Sync,
{
    fn enabled_teams(&self) -> Vec<String> {
        self()
    }
}

/// Host lookup from a local team id to its display name.
#[async_trait]
pub trait TeamDirectory: Send + Sync {
    async fn team_name(&self, team_id: &str) -> Result<String>;
}

/// Team directory backed by a fixed id → name map.
#[derive(Debug, Clone, Default)]
pub struct StaticTeamDirectory {
    names: HashMap<String, String>,
}

impl StaticTeamDirectory {
    pub fn new(names: HashMap<String, String>) -> Self {
        Self { names }
    }
}

impl FromIterator<(String, String)> for StaticTeamDirectory {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[async_trait]
impl TeamDirectory for StaticTeamDirectory {
    async fn team_name(&self, team_id: &str) -> Result<String> {
        self.names
            .get(team_id)
            .cloned()
            .ok_or_else(|| Error::unknown_team(team_id))
    }
}

/// A list holding exactly one empty entry means every team is enabled.
pub fn is_open(enabled_teams: &[String]) -> bool {
    matches!(enabled_teams, [only] if only.is_empty())
}

/// Check whether a team name is allowed to bridge.
///
/// Names are compared exactly: no case folding, no trimming.
pub fn team_allowed(team_name: &str, enabled_teams: &[String]) -> bool {
    is_open(enabled_teams) || enabled_teams.iter().any(|name| name == team_name)
}

//! Table layout and idempotent schema bootstrap.

use {sqlx::AnyPool, tracing::info};

use crate::Result;

pub(crate) mod links {
    pub const TABLE: &str = "teamsync_links";
    pub const LOCAL_CHANNEL_ID: &str = "local_channel_id";
    pub const LOCAL_TEAM_ID: &str = "local_team_id";
    pub const REMOTE_CHANNEL_ID: &str = "remote_channel_id";
    pub const REMOTE_TEAM_ID: &str = "remote_team_id";
}

pub(crate) mod users {
    pub const TABLE: &str = "teamsync_users";
    pub const LOCAL_USER_ID: &str = "local_user_id";
    pub const REMOTE_USER_ID: &str = "remote_user_id";
    pub const TOKEN: &str = "token";
}

pub(crate) mod posts {
    pub const TABLE: &str = "teamsync_posts";
    pub const LOCAL_POST_ID: &str = "local_post_id";
    pub const REMOTE_POST_ID: &str = "remote_post_id";
    pub const REMOTE_CONTAINER_ID: &str = "remote_container_id";
}

// Valid for both SQLite and Postgres.
const CREATE_STATEMENTS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS teamsync_links (
        local_channel_id  VARCHAR PRIMARY KEY,
        local_team_id     VARCHAR,
        remote_channel_id VARCHAR,
        remote_team_id    VARCHAR
    )"#,
    r#"CREATE TABLE IF NOT EXISTS teamsync_users (
        local_user_id  VARCHAR PRIMARY KEY,
        remote_user_id VARCHAR,
        token          TEXT
    )"#,
    r#"CREATE TABLE IF NOT EXISTS teamsync_posts (
        local_post_id       VARCHAR PRIMARY KEY,
        remote_post_id      VARCHAR,
        remote_container_id VARCHAR
    )"#,
];

/// Create the link, user and post tables if they do not exist yet.
///
/// Safe to run on every start. The first failing statement aborts the
/// bootstrap and its error is returned unchanged.
pub async fn bootstrap(pool: &AnyPool) -> Result<()> {
    for statement in CREATE_STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    info!(tables = CREATE_STATEMENTS.len(), "teamsync schema ready");
    Ok(())
}

//! SQL-backed bridge store using sqlx's `Any` driver (SQLite or Postgres).

use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    sqlx::{
        AnyPool,
        any::{Any, AnyPoolOptions},
    },
    teamsync_config::DatabaseConfig,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use teamsync_metrics::{counter, labels, store as store_metrics};

use crate::{
    Error, Result,
    cache::{DEFAULT_AVATAR_TTL, KvStore, avatar_key},
    dialect::{Dialect, Queries},
    gating::{self, EnabledTeams, TeamDirectory},
    schema,
    store::BridgeStore,
    types::{ChannelLink, OAuthToken, UserIdentity},
};

/// Collaborators the host platform provides to the store.
#[derive(Clone)]
pub struct HostServices {
    pub kv: Arc<dyn KvStore>,
    pub teams: Arc<dyn TeamDirectory>,
    pub enabled_teams: Arc<dyn EnabledTeams>,
}

/// Internal row types for sqlx mapping. Only the key columns are NOT NULL,
/// so everything else decodes as optional and NULL reads as empty.
#[derive(sqlx::FromRow)]
struct LinkRow {
    local_channel_id: String,
    local_team_id: Option<String>,
    remote_channel_id: Option<String>,
    remote_team_id: Option<String>,
}

impl From<LinkRow> for ChannelLink {
    fn from(r: LinkRow) -> Self {
        Self {
            local_team_id: r.local_team_id.unwrap_or_default(),
            local_channel_id: r.local_channel_id,
            remote_team_id: r.remote_team_id.unwrap_or_default(),
            remote_channel_id: r.remote_channel_id.unwrap_or_default(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    local_user_id: String,
    remote_user_id: Option<String>,
    token: Option<String>,
}

impl TryFrom<UserRow> for UserIdentity {
    type Error = Error;

    fn try_from(r: UserRow) -> Result<Self> {
        Ok(Self {
            token: OAuthToken::from_blob(r.token.as_deref().unwrap_or_default())?,
            local_user_id: r.local_user_id,
            remote_user_id: r.remote_user_id.unwrap_or_default(),
        })
    }
}

pub struct SqlBridgeStore {
    pool: AnyPool,
    queries: Queries,
    host: HostServices,
    avatar_ttl: Duration,
}

impl SqlBridgeStore {
    /// Open a pool for `config.url` and bootstrap the schema.
    ///
    /// Fails if the URL scheme is not a supported backend, the connection
    /// cannot be established, or any table cannot be created.
    pub async fn connect(config: &DatabaseConfig, host: HostServices) -> Result<Self> {
        let dialect = Dialect::from_url(&config.url)?;
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await?;
        info!(?dialect, max_connections = config.max_connections, "connected to database");

        let store = Self::with_pool(pool, dialect, host);
        store.init().await?;
        Ok(store)
    }

    /// Create a store over an existing pool. Call [`BridgeStore::init`] before
    /// the first query if the schema may be missing.
    pub fn with_pool(pool: AnyPool, dialect: Dialect, host: HostServices) -> Self {
        Self {
            pool,
            queries: Queries::new(dialect),
            host,
            avatar_ttl: DEFAULT_AVATAR_TTL,
        }
    }

    #[must_use]
    pub fn with_avatar_ttl(mut self, ttl: Duration) -> Self {
        self.avatar_ttl = ttl;
        self
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Hide links whose local team is not enabled.
    async fn authorize(&self, link: ChannelLink) -> Result<Option<ChannelLink>> {
        if self.is_team_enabled(&link.local_team_id).await {
            return Ok(Some(link));
        }
        warn!(
            channel_id = %link.local_channel_id,
            team_id = %link.local_team_id,
            "link hidden: team not enabled"
        );
        #[cfg(feature = "metrics")]
        counter!(store_metrics::LINK_DENIALS_TOTAL).increment(1);
        Err(Error::team_not_enabled(link.local_team_id))
    }

    async fn fetch_token(&self, sql: &str, user_id: &str) -> Result<Option<OAuthToken>> {
        let blob = sqlx::query_scalar::<Any, Option<String>>(sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(blob) = blob else {
            debug!(user_id, "no user row");
            return Ok(None);
        };
        let token = OAuthToken::from_blob(blob.as_deref().unwrap_or_default());
        #[cfg(feature = "metrics")]
        if token.is_err() {
            counter!(store_metrics::TOKEN_DECODE_ERRORS_TOTAL).increment(1);
        }
        token
    }

    /// A NULL id column reads the same as a missing row.
    async fn fetch_id(&self, sql: &str, params: &[&str]) -> Result<Option<String>> {
        let mut query = sqlx::query_scalar::<Any, Option<String>>(sql);
        for param in params {
            query = query.bind(*param);
        }
        Ok(query.fetch_optional(&self.pool).await?.flatten())
    }
}

#[async_trait]
impl BridgeStore for SqlBridgeStore {
    async fn init(&self) -> Result<()> {
        schema::bootstrap(&self.pool).await
    }

    async fn avatar(&self, local_user_id: &str) -> Result<Option<Vec<u8>>> {
        let photo = self.host.kv.get(&avatar_key(local_user_id)).await?;
        #[cfg(feature = "metrics")]
        counter!(
            store_metrics::AVATAR_CACHE_LOOKUPS_TOTAL,
            labels::HIT => photo.is_some().to_string()
        )
        .increment(1);
        Ok(photo)
    }

    async fn set_avatar(&self, local_user_id: &str, photo: &[u8]) -> Result<()> {
        self.host
            .kv
            .set_with_expiry(&avatar_key(local_user_id), photo, self.avatar_ttl)
            .await
    }

    async fn link_by_local_channel(&self, channel_id: &str) -> Result<Option<ChannelLink>> {
        let link = sqlx::query_as::<_, LinkRow>(&self.queries.link_by_local_channel)
            .bind(channel_id)
            .fetch_optional(&self.pool)
            .await?
            .map(ChannelLink::from);
        #[cfg(feature = "metrics")]
        counter!(
            store_metrics::LINK_LOOKUPS_TOTAL,
            labels::HIT => link.is_some().to_string()
        )
        .increment(1);
        match link {
            Some(link) => self.authorize(link).await,
            None => {
                debug!(channel_id, "no link for local channel");
                Ok(None)
            },
        }
    }

    async fn link_by_remote_channel(
        &self,
        remote_team_id: &str,
        remote_channel_id: &str,
    ) -> Result<Option<ChannelLink>> {
        let link = sqlx::query_as::<_, LinkRow>(&self.queries.link_by_remote_channel)
            .bind(remote_channel_id)
            .fetch_optional(&self.pool)
            .await?
            .map(ChannelLink::from);
        #[cfg(feature = "metrics")]
        counter!(
            store_metrics::LINK_LOOKUPS_TOTAL,
            labels::HIT => link.is_some().to_string()
        )
        .increment(1);
        match link {
            Some(link) => self.authorize(link).await,
            None => {
                debug!(remote_team_id, remote_channel_id, "no link for remote channel");
                Ok(None)
            },
        }
    }

    async fn delete_link(&self, channel_id: &str) -> Result<()> {
        let result = sqlx::query(&self.queries.delete_link)
            .bind(channel_id)
            .execute(&self.pool)
            .await?;
        info!(channel_id, removed = result.rows_affected(), "channel link deleted");
        Ok(())
    }

    async fn create_link(&self, link: &ChannelLink) -> Result<()> {
        sqlx::query(&self.queries.insert_link)
            .bind(&link.local_channel_id)
            .bind(&link.local_team_id)
            .bind(&link.remote_channel_id)
            .bind(&link.remote_team_id)
            .execute(&self.pool)
            .await?;
        #[cfg(feature = "metrics")]
        counter!(store_metrics::WRITES_TOTAL, labels::TABLE => schema::links::TABLE)
            .increment(1);
        info!(
            channel_id = %link.local_channel_id,
            team_id = %link.local_team_id,
            remote_channel_id = %link.remote_channel_id,
            "channel link stored"
        );

        // The row is already committed; a disabled team only changes the result.
        if !self.is_team_enabled(&link.local_team_id).await {
            warn!(
                channel_id = %link.local_channel_id,
                team_id = %link.local_team_id,
                "stored link belongs to a team that is not enabled"
            );
            return Err(Error::team_not_enabled(&link.local_team_id));
        }
        Ok(())
    }

    async fn remote_to_local_post(
        &self,
        remote_container_id: &str,
        remote_post_id: &str,
    ) -> Result<Option<String>> {
        self.fetch_id(&self.queries.remote_to_local_post, &[
            remote_container_id,
            remote_post_id,
        ])
        .await
    }

    async fn local_to_remote_post(&self, local_post_id: &str) -> Result<Option<String>> {
        self.fetch_id(&self.queries.local_to_remote_post, &[local_post_id])
            .await
    }

    async fn link_posts(
        &self,
        local_post_id: &str,
        remote_container_id: &str,
        remote_post_id: &str,
    ) -> Result<()> {
        sqlx::query(&self.queries.insert_post)
            .bind(local_post_id)
            .bind(remote_container_id)
            .bind(remote_post_id)
            .execute(&self.pool)
            .await?;
        #[cfg(feature = "metrics")]
        counter!(store_metrics::WRITES_TOTAL, labels::TABLE => schema::posts::TABLE)
            .increment(1);
        debug!(local_post_id, remote_container_id, remote_post_id, "posts linked");
        Ok(())
    }

    async fn remote_to_local_user(&self, remote_user_id: &str) -> Result<Option<String>> {
        self.fetch_id(&self.queries.remote_to_local_user, &[remote_user_id])
            .await
    }

    async fn local_to_remote_user(&self, local_user_id: &str) -> Result<Option<String>> {
        self.fetch_id(&self.queries.local_to_remote_user, &[local_user_id])
            .await
    }

    async fn identity(&self, local_user_id: &str) -> Result<Option<UserIdentity>> {
        let row = sqlx::query_as::<_, UserRow>(&self.queries.identity_by_local_user)
            .bind(local_user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn token_for_local_user(&self, local_user_id: &str) -> Result<Option<OAuthToken>> {
        self.fetch_token(&self.queries.token_by_local_user, local_user_id)
            .await
    }

    async fn token_for_remote_user(&self, remote_user_id: &str) -> Result<Option<OAuthToken>> {
        self.fetch_token(&self.queries.token_by_remote_user, remote_user_id)
            .await
    }

    async fn upsert_identity(
        &self,
        local_user_id: &str,
        remote_user_id: &str,
        token: Option<&OAuthToken>,
    ) -> Result<()> {
        let blob = match token {
            Some(token) => token.to_blob()?,
            None => String::new(),
        };
        sqlx::query(&self.queries.upsert_user)
            .bind(local_user_id)
            .bind(remote_user_id)
            .bind(blob)
            .execute(&self.pool)
            .await?;
        #[cfg(feature = "metrics")]
        counter!(store_metrics::WRITES_TOTAL, labels::TABLE => schema::users::TABLE)
            .increment(1);
        info!(
            local_user_id,
            remote_user_id,
            has_token = token.is_some(),
            "user identity stored"
        );
        Ok(())
    }

    async fn is_team_enabled(&self, team_id: &str) -> bool {
        let enabled = self.host.enabled_teams.enabled_teams();
        if gating::is_open(&enabled) {
            return true;
        }
        match self.host.teams.team_name(team_id).await {
            Ok(name) => gating::team_allowed(&name, &enabled),
            Err(e) => {
                warn!(team_id, error = %e, "team lookup failed, treating team as not enabled");
                false
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::{
        RwLock,
        atomic::{AtomicUsize, Ordering},
    };

    use {
        super::*,
        crate::{cache::MemoryKvStore, gating::StaticTeamDirectory, test_support::memory_pool},
    };

    /// Directory that counts lookups and fails for unknown ids.
    struct CountingDirectory {
        inner: StaticTeamDirectory,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TeamDirectory for CountingDirectory {
        async fn team_name(&self, team_id: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.team_name(team_id).await
        }
    }

    struct Fixture {
        store: SqlBridgeStore,
        enabled: Arc<RwLock<Vec<String>>>,
        directory: Arc<CountingDirectory>,
    }

    impl Fixture {
        fn set_enabled(&self, names: &[&str]) {
            *self.enabled.write().unwrap() = names.iter().map(|s| s.to_string()).collect();
        }
    }

    async fn fixture(enabled: &[&str]) -> Fixture {
        let enabled = Arc::new(RwLock::new(
            enabled.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        ));
        let directory = Arc::new(CountingDirectory {
            inner: [
                ("t1".to_string(), "teamA".to_string()),
                ("t2".to_string(), "teamB".to_string()),
            ]
            .into_iter()
            .collect(),
            calls: AtomicUsize::new(0),
        });
        let source = Arc::clone(&enabled);
        let host = HostServices {
            kv: Arc::new(MemoryKvStore::new()),
            teams: directory.clone(),
            enabled_teams: Arc::new(move || source.read().unwrap().clone()),
        };
        let store = SqlBridgeStore::with_pool(memory_pool().await, Dialect::Sqlite, host);
        store.init().await.unwrap();
        Fixture {
            store,
            enabled,
            directory,
        }
    }

    fn link(channel: &str, team: &str) -> ChannelLink {
        ChannelLink {
            local_team_id: team.into(),
            local_channel_id: channel.into(),
            remote_team_id: format!("remote-{team}"),
            remote_channel_id: format!("remote-{channel}"),
        }
    }

    #[tokio::test]
    async fn open_mode_skips_directory_lookup() {
        let f = fixture(&[""]).await;
        assert!(f.store.is_team_enabled("no-such-team").await);
        assert_eq!(f.directory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_team_lookup_fails_closed() {
        let f = fixture(&["teamA"]).await;
        assert!(!f.store.is_team_enabled("no-such-team").await);
        assert_eq!(f.directory.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn enabled_list_change_applies_to_next_lookup() {
        let f = fixture(&["teamA"]).await;
        f.store.create_link(&link("c1", "t1")).await.unwrap();
        assert!(f.store.link_by_local_channel("c1").await.unwrap().is_some());

        f.set_enabled(&["teamB"]);
        let err = f.store.link_by_local_channel("c1").await.unwrap_err();
        assert!(err.is_team_not_enabled());

        f.set_enabled(&[""]);
        assert!(f.store.link_by_local_channel("c1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn remote_lookup_matches_on_channel_only() {
        let f = fixture(&[""]).await;
        f.store.create_link(&link("c1", "t1")).await.unwrap();

        let found = f
            .store
            .link_by_remote_channel("remote-t1", "remote-c1")
            .await
            .unwrap();
        assert_eq!(found, Some(link("c1", "t1")));

        let other_team = f
            .store
            .link_by_remote_channel("remote-t2", "remote-c1")
            .await
            .unwrap();
        assert_eq!(other_team, Some(link("c1", "t1")));
        assert_eq!(
            f.store.link_by_remote_channel("", "remote-c1").await.unwrap(),
            Some(link("c1", "t1"))
        );

        assert!(
            f.store
                .link_by_remote_channel("remote-t1", "remote-c9")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn null_token_column_reads_as_no_token() {
        let f = fixture(&[""]).await;
        sqlx::query(
            "INSERT INTO teamsync_users (local_user_id, remote_user_id, token) VALUES ('u1', 'r1', NULL)",
        )
        .execute(f.store.pool())
        .await
        .unwrap();

        assert!(f.store.token_for_local_user("u1").await.unwrap().is_none());
        let identity = f.store.identity("u1").await.unwrap().unwrap();
        assert_eq!(identity.remote_user_id, "r1");
        assert!(identity.token.is_none());
    }

    #[tokio::test]
    async fn malformed_token_surfaces_decode_error() {
        let f = fixture(&[""]).await;
        sqlx::query(
            "INSERT INTO teamsync_users (local_user_id, remote_user_id, token) VALUES ('u1', 'r1', 'garbage')",
        )
        .execute(f.store.pool())
        .await
        .unwrap();

        assert!(matches!(
            f.store.token_for_local_user("u1").await,
            Err(Error::TokenDecode { .. })
        ));
        assert!(matches!(
            f.store.token_for_remote_user("r1").await,
            Err(Error::TokenDecode { .. })
        ));
        assert!(matches!(
            f.store.identity("u1").await,
            Err(Error::TokenDecode { .. })
        ));
    }

    #[tokio::test]
    async fn null_id_columns_read_as_misses() {
        let f = fixture(&[""]).await;
        for statement in [
            "INSERT INTO teamsync_users (local_user_id, remote_user_id, token) VALUES ('u1', NULL, '')",
            "INSERT INTO teamsync_posts (local_post_id, remote_post_id, remote_container_id) VALUES ('p1', NULL, 'chat1')",
            "INSERT INTO teamsync_links (local_channel_id, local_team_id, remote_channel_id, remote_team_id) VALUES ('c1', 't1', 'rc1', NULL)",
        ] {
            sqlx::query(statement).execute(f.store.pool()).await.unwrap();
        }

        assert!(f.store.local_to_remote_user("u1").await.unwrap().is_none());
        let identity = f.store.identity("u1").await.unwrap().unwrap();
        assert_eq!(identity.remote_user_id, "");
        assert!(identity.token.is_none());

        assert!(f.store.local_to_remote_post("p1").await.unwrap().is_none());

        let link = f.store.link_by_local_channel("c1").await.unwrap().unwrap();
        assert_eq!(link.remote_channel_id, "rc1");
        assert_eq!(link.remote_team_id, "");
    }

    #[tokio::test]
    async fn unknown_user_has_no_identity() {
        let f = fixture(&[""]).await;
        assert!(f.store.identity("ghost").await.unwrap().is_none());
        assert!(f.store.token_for_remote_user("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn avatar_ttl_is_configurable() {
        let f = fixture(&[""]).await;
        let store = f.store.with_avatar_ttl(Duration::from_secs(30));
        // The cache is in-process, so the clock can be frozen once the db is set up.
        tokio::time::pause();
        store.set_avatar("u1", b"png").await.unwrap();

        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(store.avatar("u1").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(store.avatar("u1").await.unwrap().is_none());
    }
}

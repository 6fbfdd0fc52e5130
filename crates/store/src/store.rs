//! The bridge's persistence interface.

use async_trait::async_trait;

use crate::{
    Result,
    types::{ChannelLink, OAuthToken, UserIdentity},
};

/// Durable mappings between local and remote channels, posts and users,
/// plus the avatar cache.
///
/// Lookups return `Ok(None)` when no row matches. Link lookups additionally
/// fail with [`crate::Error::TeamNotEnabled`] when the row exists but its
/// local team is not enabled; relay code should treat both as "not bridged".
#[async_trait]
pub trait BridgeStore: Send + Sync {
    /// Create the backing tables if missing.
    async fn init(&self) -> Result<()>;

    async fn avatar(&self, local_user_id: &str) -> Result<Option<Vec<u8>>>;
    async fn set_avatar(&self, local_user_id: &str, photo: &[u8]) -> Result<()>;

    async fn link_by_local_channel(&self, channel_id: &str) -> Result<Option<ChannelLink>>;
    /// Matches on `remote_channel_id` alone; `remote_team_id` only shows up in logs.
    async fn link_by_remote_channel(
        &self,
        remote_team_id: &str,
        remote_channel_id: &str,
    ) -> Result<Option<ChannelLink>>;
    /// Succeeds when no link exists.
    async fn delete_link(&self, channel_id: &str) -> Result<()>;
    /// Inserts the link, then checks the team. A rejected link stays stored.
    async fn create_link(&self, link: &ChannelLink) -> Result<()>;

    async fn remote_to_local_post(
        &self,
        remote_container_id: &str,
        remote_post_id: &str,
    ) -> Result<Option<String>>;
    async fn local_to_remote_post(&self, local_post_id: &str) -> Result<Option<String>>;
    async fn link_posts(
        &self,
        local_post_id: &str,
        remote_container_id: &str,
        remote_post_id: &str,
    ) -> Result<()>;

    async fn remote_to_local_user(&self, remote_user_id: &str) -> Result<Option<String>>;
    async fn local_to_remote_user(&self, local_user_id: &str) -> Result<Option<String>>;
    async fn identity(&self, local_user_id: &str) -> Result<Option<UserIdentity>>;
    async fn token_for_local_user(&self, local_user_id: &str) -> Result<Option<OAuthToken>>;
    async fn token_for_remote_user(&self, remote_user_id: &str) -> Result<Option<OAuthToken>>;
    /// Insert the user or replace both the remote id and the token.
    async fn upsert_identity(
        &self,
        local_user_id: &str,
        remote_user_id: &str,
        token: Option<&OAuthToken>,
    ) -> Result<()>;

    async fn is_team_enabled(&self, team_id: &str) -> bool;
}

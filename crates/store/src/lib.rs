//! Durable identity mappings for the teamsync bridge.
//!
//! Keeps three tables in one SQL database (SQLite or Postgres):
//! channel links, user identities with their tokens, and post mappings.
//! Channel links are only visible for enabled teams. Avatars go to the
//! host's expiring key-value store.

pub mod cache;
pub mod dialect;
pub mod error;
pub mod gating;
pub mod schema;
pub mod store;
pub mod store_sql;
pub mod types;

pub use {
    cache::{KvStore, MemoryKvStore},
    dialect::Dialect,
    error::{Error, Result},
    gating::{EnabledTeams, StaticTeamDirectory, TeamDirectory},
    store::BridgeStore,
    store_sql::{HostServices, SqlBridgeStore},
    types::{ChannelLink, OAuthToken, UserIdentity},
};

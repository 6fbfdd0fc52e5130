//! Metric name and label definitions.

/// Bridge store metrics
pub mod store {
    /// Channel link lookups, labelled by whether a row was found
    pub const LINK_LOOKUPS_TOTAL: &str = "teamsync_store_link_lookups_total";
    /// Link rows hidden or rejected because their team is not enabled
    pub const LINK_DENIALS_TOTAL: &str = "teamsync_store_link_denials_total";
    /// Rows inserted or upserted, labelled by table
    pub const WRITES_TOTAL: &str = "teamsync_store_writes_total";
    /// Stored tokens that failed to decode
    pub const TOKEN_DECODE_ERRORS_TOTAL: &str = "teamsync_store_token_decode_errors_total";
    /// Avatar cache reads, labelled by hit/miss
    pub const AVATAR_CACHE_LOOKUPS_TOTAL: &str = "teamsync_store_avatar_cache_lookups_total";
}

/// Common label keys
pub mod labels {
    pub const HIT: &str = "hit";
    pub const TABLE: &str = "table";
}

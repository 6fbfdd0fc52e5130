//! Metric names and labels for teamsync.
//!
//! Crates record through the `metrics` facade macros re-exported here. Nothing
//! is exported until the embedding process installs a recorder.
//!
//! ```rust,ignore
//! use teamsync_metrics::{counter, labels, store};
//!
//! counter!(store::LINK_LOOKUPS_TOTAL, labels::HIT => "true").increment(1);
//! ```

mod definitions;

pub use definitions::*;

// Re-export the macro the store records with
pub use metrics::counter;

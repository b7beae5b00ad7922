// Banner Tracker - Core Library
// Reconciles two uncoordinated external sources (character metadata and
// historical banner windows) into one SQLite store, rebuilt wholesale.

pub mod config;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod reconcile;
pub mod schema;
pub mod source;
pub mod store;

// Re-export commonly used types
pub use config::TrackerConfig;
pub use error::{Result, TrackerError};
pub use filter::{filter_characters, FilterConfig, MAX_RARITY_TIER};
pub use pipeline::{rebuild_into, run_rebuild, RebuildSummary};
pub use reconcile::{normalize_name, reconcile, AppearanceRow, CharacterRow, Reconciled};
pub use schema::{configure_connection, ensure_schema, open_store, RebuildPolicy};
pub use source::{
    parse_banner_dates, parse_characters, BannerDateMap, RawCharacter, SourceClient,
};
pub use store::{
    character_summaries, character_summaries_at, commit_rebuild, verify_counts,
    CharacterSummary,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

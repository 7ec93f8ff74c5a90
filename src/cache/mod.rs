//! Cache Module
//!
//! Fixed-bucket hash table with TTL expiration, hit/miss telemetry and
//! binary snapshots.

mod entry;
pub mod hash;
mod shared;
pub mod snapshot;
mod stats;
mod store;
mod table;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use shared::SharedCache;
pub use stats::CacheStats;
pub use store::Cache;

// == Public Constants ==
/// Bucket count used when none is configured
pub const DEFAULT_BUCKET_COUNT: usize = 1024;

/// Longest key accepted when reading a snapshot, in bytes
pub const MAX_SNAPSHOT_KEY_LENGTH: usize = 64 * 1024;

//! CacheShell - An embeddable in-process key/value cache
//!
//! Fixed-bucket hash table with TTL expiration, binary-safe values, hit/miss
//! statistics and raw binary snapshots.
//!
//! ```
//! use cacheshell::Cache;
//!
//! let mut cache = Cache::new(0).unwrap();
//! cache.set_with_ttl("session", "token", 60).unwrap();
//! assert_eq!(cache.get("session").unwrap(), "token");
//! assert_eq!(cache.ttl("session"), Some(60));
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod storage;
pub mod tasks;

pub use cache::{Cache, CacheStats, SharedCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tasks::spawn_sweeper;

//! Background Tasks Module
//!
//! Optional tasks an embedding application can run next to a shared cache.
//!
//! # Tasks
//! - Expiry sweep: evicts expired entries at a fixed interval

mod sweeper;

pub use sweeper::spawn_sweeper;

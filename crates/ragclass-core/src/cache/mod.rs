//! Disk cache for slowly-changing server data (class lists, profile).
//!
//! The cache is an optimization only: every entry can be rebuilt with one
//! API call, so cache failures are logged and treated as a miss.

pub mod manager;

pub use manager::{CacheManager, CachedData};

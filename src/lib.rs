//! Feed Cache Library
//!
//! A local, single-snapshot persistent cache for an image feed. The
//! [`store::FeedCacheStore`] keeps at most one snapshot (images plus capture
//! timestamp) in SQLite and serializes all access through a private worker.

pub mod cli;
pub mod model;
pub mod store;

pub use model::{CachedFeed, LocalFeedImage};
pub use store::{CacheState, FeedCacheStore, FeedStore, FeedStoreError, StoreConfig};

//! Feed data models
//!
//! `LocalFeedImage` and `CachedFeed` are the values callers hand to and receive
//! from the store. The `record` submodule holds the persisted shape of the same
//! data and the mapping between the two.

pub mod record;

pub use record::{CacheRecord, FeedImageRecord};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// A single image in the feed, as seen by the feed-loading layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalFeedImage {
    /// Unique identifier of the image
    pub id: Uuid,
    /// Optional caption
    pub description: Option<String>,
    /// Optional place name where the image was taken
    pub location: Option<String>,
    /// Where the image data can be fetched from
    pub url: Url,
}

impl LocalFeedImage {
    pub fn new(
        id: Uuid,
        description: Option<String>,
        location: Option<String>,
        url: Url,
    ) -> Self {
        Self {
            id,
            description,
            location,
            url,
        }
    }
}

/// The snapshot held by the cache: the feed in display order plus the instant it was captured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedFeed {
    /// Images in display order
    pub feed: Vec<LocalFeedImage>,
    /// When the snapshot was captured
    pub timestamp: DateTime<Utc>,
}

impl CachedFeed {
    pub fn new(feed: Vec<LocalFeedImage>, timestamp: DateTime<Utc>) -> Self {
        Self { feed, timestamp }
    }
}

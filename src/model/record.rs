//! Persisted shape of the cache slot
//!
//! A `CacheRecord` owns its images; the order of `images` is the order they are
//! written to and read back from the store.

use chrono::{DateTime, Utc};
use url::Url;
use uuid::Uuid;

use super::{CachedFeed, LocalFeedImage};

/// One image row owned by the cache slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedImageRecord {
    pub id: Uuid,
    pub image_description: Option<String>,
    pub location: Option<String>,
    pub url: Url,
}

/// The single cache slot: snapshot timestamp and its ordered images
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRecord {
    pub timestamp: DateTime<Utc>,
    pub images: Vec<FeedImageRecord>,
}

impl CacheRecord {
    /// Converts the stored slot into the caller-facing snapshot
    pub fn into_cached_feed(self) -> CachedFeed {
        CachedFeed {
            feed: self.images.into_iter().map(LocalFeedImage::from).collect(),
            timestamp: self.timestamp,
        }
    }
}

impl From<&LocalFeedImage> for FeedImageRecord {
    fn from(image: &LocalFeedImage) -> Self {
        Self {
            id: image.id,
            image_description: image.description.clone(),
            location: image.location.clone(),
            url: image.url.clone(),
        }
    }
}

impl From<FeedImageRecord> for LocalFeedImage {
    fn from(record: FeedImageRecord) -> Self {
        Self {
            id: record.id,
            description: record.image_description,
            location: record.location,
            url: record.url,
        }
    }
}

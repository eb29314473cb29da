//! Slot-scoped access to the cache tables
//!
//! The repository runs against whatever connection or transaction it is given
//! and never commits. Callers open the change set, call into the repository,
//! then commit or roll back.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use url::Url;
use uuid::Uuid;

use super::FeedStoreError;
use crate::model::{CacheRecord, FeedImageRecord};

/// CRUD primitives for the single cache slot
pub struct CacheRepository<'conn> {
    conn: &'conn Connection,
}

/// A slot that has been cleared and is ready to be written
///
/// Obtained from [`CacheRepository::get_or_create_unique_slot`]; nothing is
/// written until [`EmptySlot::populate`] is called.
#[must_use = "the slot is only written by calling populate"]
pub struct EmptySlot<'repo, 'conn> {
    repository: &'repo CacheRepository<'conn>,
}

impl<'conn> CacheRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Returns the current slot, if any
    pub fn find(&self) -> Result<Option<CacheRecord>, FeedStoreError> {
        let slot = self
            .conn
            .prepare_cached(
                "SELECT id, timestamp_secs, timestamp_nanos FROM feed_cache ORDER BY id LIMIT 1",
            )?
            .query_row([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, u32>(2)?,
                ))
            })
            .optional()?;

        let Some((slot_id, secs, nanos)) = slot else {
            return Ok(None);
        };

        let timestamp = DateTime::<Utc>::from_timestamp(secs, nanos).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                Type::Integer,
                format!("timestamp {}s {}ns out of range", secs, nanos).into(),
            )
        })?;

        Ok(Some(CacheRecord {
            timestamp,
            images: self.load_images(slot_id)?,
        }))
    }

    /// Removes every slot row and its images; returns whether anything was removed
    pub fn delete_existing(&self) -> Result<bool, FeedStoreError> {
        self.conn.execute("DELETE FROM feed_image", [])?;
        let removed = self.conn.execute("DELETE FROM feed_cache", [])?;
        Ok(removed > 0)
    }

    /// Writes a new slot holding `images` in order
    ///
    /// Assumes the slot is currently vacant.
    pub fn create_and_populate(
        &self,
        images: &[FeedImageRecord],
        timestamp: DateTime<Utc>,
    ) -> Result<(), FeedStoreError> {
        self.conn.execute(
            "INSERT INTO feed_cache (timestamp_secs, timestamp_nanos) VALUES (?1, ?2)",
            params![timestamp.timestamp(), timestamp.timestamp_subsec_nanos()],
        )?;
        let slot_id = self.conn.last_insert_rowid();

        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO feed_image (cache_id, position, id, image_description, location, url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for (position, image) in images.iter().enumerate() {
            stmt.execute(params![
                slot_id,
                position as i64,
                image.id.as_bytes().as_slice(),
                image.image_description,
                image.location,
                image.url.as_str(),
            ])?;
        }
        Ok(())
    }

    /// Clears any existing slot and hands back a vacant one to populate
    pub fn get_or_create_unique_slot(&self) -> Result<EmptySlot<'_, 'conn>, FeedStoreError> {
        self.delete_existing()?;
        Ok(EmptySlot { repository: self })
    }

    fn load_images(&self, slot_id: i64) -> Result<Vec<FeedImageRecord>, FeedStoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, image_description, location, url FROM feed_image
             WHERE cache_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![slot_id], |row| {
            let id: Vec<u8> = row.get(0)?;
            let id = Uuid::from_slice(&id).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(0, Type::Blob, Box::new(e))
            })?;
            let url: String = row.get(3)?;
            let url = Url::parse(&url).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e))
            })?;

            Ok(FeedImageRecord {
                id,
                image_description: row.get(1)?,
                location: row.get(2)?,
                url,
            })
        })?;

        let images = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(images)
    }
}

impl EmptySlot<'_, '_> {
    /// Fills the slot with `images` and `timestamp`
    pub fn populate(
        self,
        images: &[FeedImageRecord],
        timestamp: DateTime<Utc>,
    ) -> Result<(), FeedStoreError> {
        self.repository.create_and_populate(images, timestamp)
    }
}

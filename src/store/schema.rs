//! Record schemas known to the store
//!
//! A schema is looked up by model name when a store is opened. Applying it is
//! idempotent; the version is stamped into `PRAGMA user_version` so a file
//! written by a newer layout is refused instead of misread.

use rusqlite::Connection;
use tracing::debug;

use super::{FeedStoreError, InitError};

/// A versioned table layout for one record model
#[derive(Debug)]
pub struct RecordSchema {
    pub model_name: &'static str,
    pub version: i64,
    ddl: &'static str,
}

// Images are ordered by `position`; deleting the slot row removes its images.
const FEED_STORE_V1: RecordSchema = RecordSchema {
    model_name: "FeedStore",
    version: 1,
    ddl: "CREATE TABLE IF NOT EXISTS feed_cache (
            id INTEGER PRIMARY KEY,
            timestamp_secs INTEGER NOT NULL,
            timestamp_nanos INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS feed_image (
            cache_id INTEGER NOT NULL REFERENCES feed_cache(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            id BLOB NOT NULL,
            image_description TEXT,
            location TEXT,
            url TEXT NOT NULL,
            PRIMARY KEY (cache_id, position)
        );",
};

static SCHEMAS: &[RecordSchema] = &[FEED_STORE_V1];

/// Looks up the schema registered for `model_name`
pub fn resolve(model_name: &str) -> Result<&'static RecordSchema, FeedStoreError> {
    SCHEMAS
        .iter()
        .find(|schema| schema.model_name == model_name)
        .ok_or_else(|| FeedStoreError::SchemaNotFound {
            model_name: model_name.to_string(),
        })
}

impl RecordSchema {
    /// Creates the tables if missing and stamps the schema version
    pub fn apply(&self, conn: &Connection) -> Result<(), InitError> {
        let found: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
        if found > self.version {
            return Err(InitError::UnsupportedVersion {
                found,
                supported: self.version,
            });
        }

        conn.execute_batch(self.ddl)?;
        if found < self.version {
            conn.pragma_update(None, "user_version", self.version)?;
            debug!(model = self.model_name, from = found, to = self.version, "schema applied");
        }
        Ok(())
    }
}

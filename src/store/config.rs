use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

/// Record model used when none is given
const DEFAULT_MODEL_NAME: &str = "FeedStore";

const DEFAULT_STORE_FILE: &str = "feed-store.sqlite";
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where and how to open a feed store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Path of the SQLite file holding the store
    pub store_path: PathBuf,
    /// Name of the record schema the store is laid out with
    pub model_name: String,
    /// How long a write waits on a locked database before failing
    pub busy_timeout: Duration,
}

impl StoreConfig {
    /// Creates a config for a store at `store_path` with default settings
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Creates a config pointing at the XDG-compliant cache directory
    ///
    /// Uses `~/.cache/feedcache/feed-store.sqlite` on Linux, or the equivalent
    /// platform path. Returns `None` if no home directory can be determined.
    pub fn default_location() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "feedcache")?;
        Some(Self::new(project_dirs.cache_dir().join(DEFAULT_STORE_FILE)))
    }

    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }
}

use std::path::PathBuf;
use std::time::Duration;

/// Name of the root set and of the directory holding it
pub const LOCAL_SET: &str = "local";

/// Directory next to `local/` used by the file cache backend
pub const CACHE_DIR: &str = "cache";

/// Where cached listings live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackendKind {
    /// Process-local map
    #[default]
    Memory,
    /// JSON entries under `<upload_root>/cache`, shared by every process using the root
    File,
}

/// Configuration for the local icon store
#[derive(Debug, Clone)]
pub struct IconStoreConfig {
    /// Upload root; icons live in `<upload_root>/local`
    pub upload_root: PathBuf,

    /// Public URL mapped onto `upload_root`
    pub base_url: String,

    /// Maximum accepted upload size (bytes)
    pub max_upload_size: u64,

    /// Lifetime of a cached listing
    pub cache_ttl: Duration,

    pub cache_backend: CacheBackendKind,

    /// MIME types accepted by batch uploads
    pub allowed_mime_types: Vec<String>,
}

impl IconStoreConfig {
    pub fn new(upload_root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            upload_root: upload_root.into(),
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Directory backing the `local` set
    pub fn icons_dir(&self) -> PathBuf {
        self.upload_root.join(LOCAL_SET)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.upload_root.join(CACHE_DIR)
    }

    pub fn icons_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), LOCAL_SET)
    }
}

impl Default for IconStoreConfig {
    fn default() -> Self {
        let upload_root = std::env::var_os("ICON_STORE_ROOT")
            .map(PathBuf::from)
            .or_else(|| dirs_next::data_dir().map(|dir| dir.join("icon-store")))
            .or_else(|| std::env::current_dir().ok().map(|dir| dir.join("icon-store")))
            .unwrap_or_else(|| PathBuf::from("icon-store"));
        Self {
            upload_root,
            base_url: "/icon-store".to_string(),
            max_upload_size: 1024 * 1024,
            cache_ttl: Duration::from_secs(300),
            cache_backend: CacheBackendKind::Memory,
            allowed_mime_types: vec!["image/svg+xml".to_string()],
        }
    }
}

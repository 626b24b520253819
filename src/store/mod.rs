//! Local icon store
//!
//! Icons uploaded by users live under `<upload_root>/local`. Files directly in
//! that directory form the reserved `local` set; each child directory is a set
//! whose prefix is the directory name:
//!
//! ```text
//! <upload_root>/local/
//!   star.svg            -> local:star
//!   brand/
//!     logo.svg          -> brand:logo
//! <upload_root>/cache/  -> file cache backend
//! ```
//!
//! Reads go through [`IconSetCache`] under keys from [`invalidation::derive`];
//! every successful write clears the whole cache.

pub mod batch;
pub mod cache;
pub mod config;
pub mod invalidation;
pub mod listing;
pub mod mime;
pub mod naming;
pub mod operations;
pub mod path_utils;
pub mod sanitizer;
pub mod scanner;
pub mod search;


use std::path::{Path, PathBuf};
use std::sync::Arc;

use cache::IconSetCache;
use config::{IconStoreConfig, LOCAL_SET};
use mime::{MimeDetector, SniffingMimeDetector};
use naming::IconName;
use sanitizer::{SvgSanitizer, XmlSvgSanitizer};

use crate::protocol::IconStoreError;

pub use operations::{UploadSource, UploadedFile};

pub struct LocalIconStore {
    config: Arc<IconStoreConfig>,
    cache: IconSetCache,
    sanitizer: Arc<dyn SvgSanitizer>,
    mime: Arc<dyn MimeDetector>,
}

impl LocalIconStore {
    pub fn new(config: IconStoreConfig) -> Self {
        let cache = IconSetCache::for_kind(config.cache_backend, &config.cache_dir());
        Self::with_components(
            config,
            cache,
            Arc::new(XmlSvgSanitizer),
            Arc::new(SniffingMimeDetector),
        )
    }

    pub fn with_components(
        config: IconStoreConfig,
        cache: IconSetCache,
        sanitizer: Arc<dyn SvgSanitizer>,
        mime: Arc<dyn MimeDetector>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            cache,
            sanitizer,
            mime,
        }
    }

    /// Build the store and make sure the icon directory exists
    pub async fn open(config: IconStoreConfig) -> Result<Self, IconStoreError> {
        let store = Self::new(config);
        path_utils::ensure_directory(&store.upload_dir(), "create upload directory").await?;
        tracing::debug!("Icon store opened at {}", store.upload_dir().display());
        Ok(store)
    }

    pub fn config(&self) -> &IconStoreConfig {
        self.config.as_ref()
    }

    pub fn cache(&self) -> &IconSetCache {
        &self.cache
    }

    /// Directory backing the `local` set
    pub fn upload_dir(&self) -> PathBuf {
        self.config.icons_dir()
    }

    pub fn upload_url(&self) -> String {
        self.config.icons_url()
    }

    /// Guess the MIME type of a file on disk
    pub fn detect_mime(&self, path: &Path) -> Option<String> {
        self.mime.guess(path)
    }

    /// Directory of a set; `None` is the root set
    fn set_dir(&self, prefix: Option<&str>) -> PathBuf {
        match prefix {
            Some(prefix) => self.upload_dir().join(prefix),
            None => self.upload_dir(),
        }
    }

    fn icon_path(&self, name: &IconName) -> PathBuf {
        let prefix = (!name.is_local()).then_some(name.prefix.as_str());
        self.set_dir(prefix).join(name.filename())
    }

    fn icon_url(&self, filename: &str, prefix: Option<&str>) -> String {
        let mut url = self.upload_url();
        if let Some(prefix) = prefix {
            url.push('/');
            url.push_str(&urlencoding::encode(prefix));
        }
        url.push('/');
        url.push_str(&urlencoding::encode(filename));
        url
    }
}

/// `None`, `""` and `"local"` address the root set
fn root_or_prefix(set: Option<&str>) -> Option<&str> {
    match set {
        None | Some("") | Some(LOCAL_SET) => None,
        Some(prefix) => Some(prefix),
    }
}

//! Filesystem-backed store for user-uploaded SVG icons.
//!
//! Icons are grouped into sets (one directory each) and addressed as
//! `prefix:basename`. Listings are cached under keys derived from directory
//! modification times, so external changes and in-process writes both show up
//! on the next read.

pub mod protocol;
pub mod store;

pub use protocol::{ApiResponse, ErrorCategory, IconStoreError};
pub use store::cache::{CacheBackend, FileCacheBackend, IconSetCache, MemoryCacheBackend};
pub use store::config::{CacheBackendKind, IconStoreConfig};
pub use store::mime::{MimeDetector, SniffingMimeDetector};
pub use store::sanitizer::{SvgSanitizer, XmlSvgSanitizer};
pub use store::{LocalIconStore, UploadSource, UploadedFile};

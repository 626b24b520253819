//! Non-recursive directory listings used by every read path.
//!
//! A missing or unreadable directory lists as empty. Entry order is whatever
//! the filesystem returns.

use std::path::{Path, PathBuf};

use tokio::fs;

const SVG_EXTENSION: &str = "svg";

/// Absolute paths of the `*.svg` regular files directly inside `dir`
pub async fn list_svg_files(dir: &Path) -> Vec<PathBuf> {
    list_entries(dir, |path, is_dir| {
        !is_dir && path.extension().and_then(|e| e.to_str()) == Some(SVG_EXTENSION)
    })
    .await
}

/// Immediate, non-hidden subdirectories of `dir`
pub async fn list_subdirectories(dir: &Path) -> Vec<PathBuf> {
    list_entries(dir, |_, is_dir| is_dir).await
}

async fn list_entries<F>(dir: &Path, keep: F) -> Vec<PathBuf>
where
    F: Fn(&Path, bool) -> bool,
{
    let mut entries = Vec::new();
    let mut read_dir = match fs::read_dir(dir).await {
        Ok(read_dir) => read_dir,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!("Cannot list {}: {}", dir.display(), e);
            }
            return entries;
        }
    };

    loop {
        let entry = match read_dir.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("Stopped listing {}: {}", dir.display(), e);
                break;
            }
        };
        let entry_path = entry.path();
        if is_hidden(&entry_path) {
            continue;
        }
        // Follows symlinks, like a shell glob would.
        let is_dir = match fs::metadata(&entry_path).await {
            Ok(meta) => meta.is_dir(),
            Err(_) => continue,
        };
        if keep(&entry_path, is_dir) {
            entries.push(entry_path);
        }
    }

    entries
}

/// Dot-entries are never icons or sets; Windows also honours the hidden attribute
fn is_hidden(path: &Path) -> bool {
    let dot_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map_or(false, |n| n.starts_with('.'));
    dot_name || has_hidden_attribute(path)
}

#[cfg(windows)]
fn has_hidden_attribute(path: &Path) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    path.metadata()
        .map(|meta| meta.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0)
        .unwrap_or(false)
}

#[cfg(not(windows))]
fn has_hidden_attribute(_path: &Path) -> bool {
    false
}

/// File stem of an icon path
pub fn basename_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Final component of a path
pub fn filename_of(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

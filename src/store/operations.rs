use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::protocol::{IconStoreError, UploadedIcon};

use super::config::LOCAL_SET;
use super::naming::{self, IconName};
use super::path_utils;
use super::{root_or_prefix, LocalIconStore};

/// Where the bytes of an upload come from
#[derive(Debug, Clone)]
pub enum UploadSource {
    /// Temporary file written by the transport layer
    TempFile(PathBuf),
    Bytes(Vec<u8>),
}

/// One file handed over by the caller
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-side filename, used for the extension check and the basename
    pub name: String,
    /// Size reported by the transport, checked before reading
    pub size: Option<u64>,
    pub source: UploadSource,
}

impl UploadedFile {
    pub fn from_path(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            size: None,
            source: UploadSource::TempFile(path.into()),
        }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: Some(bytes.len() as u64),
            source: UploadSource::Bytes(bytes),
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// The upload points at something that can be read
    pub fn is_present(&self) -> bool {
        !self.name.is_empty()
            && match &self.source {
                UploadSource::TempFile(path) => path.is_file(),
                UploadSource::Bytes(_) => true,
            }
    }
}

impl LocalIconStore {
    /// Validate, sanitize and store one SVG file
    pub async fn upload(
        &self,
        file: &UploadedFile,
        icon_set: Option<&str>,
    ) -> Result<UploadedIcon, IconStoreError> {
        if !file.is_present() {
            return Err(IconStoreError::InvalidUpload {
                filename: file.name.clone(),
            });
        }

        let (stem, extension) = naming::split_filename(&file.name);
        if extension != "svg" {
            return Err(IconStoreError::InvalidExtension {
                filename: file.name.clone(),
            });
        }

        let max_size = self.config.max_upload_size;
        let reported_size = match (&file.source, file.size) {
            (_, Some(size)) => size,
            (UploadSource::TempFile(path), None) => fs::metadata(path)
                .await
                .map(|meta| meta.len())
                .map_err(|e| IconStoreError::ReadFailed {
                    message: e.to_string(),
                })?,
            (UploadSource::Bytes(bytes), None) => bytes.len() as u64,
        };
        if reported_size > max_size {
            return Err(IconStoreError::FileTooLarge {
                size: reported_size,
                max_size,
            });
        }

        let raw = match &file.source {
            UploadSource::TempFile(path) => {
                fs::read(path)
                    .await
                    .map_err(|e| IconStoreError::ReadFailed {
                        message: e.to_string(),
                    })?
            }
            UploadSource::Bytes(bytes) => bytes.clone(),
        };
        if raw.len() as u64 > max_size {
            return Err(IconStoreError::FileTooLarge {
                size: raw.len() as u64,
                max_size,
            });
        }

        let clean_svg = match self.sanitizer.sanitize(&raw) {
            Some(svg) if !svg.trim().is_empty() => svg,
            _ => {
                tracing::warn!("Rejected upload {}: sanitizer refused content", file.name);
                return Err(IconStoreError::MaliciousContent);
            }
        };

        let prefix = resolve_target_set(icon_set)?;
        let target_dir = self.set_dir(prefix.as_deref());
        path_utils::ensure_directory(&target_dir, "save file").await?;

        let base = naming::sanitize_filename_base(&stem);
        let filename =
            naming::make_unique_filename(&base, "svg", |candidate| target_dir.join(candidate).exists());
        let file_path = target_dir.join(&filename);
        write_new_file(&file_path, clean_svg.as_bytes()).await?;

        self.clear_cache();

        let basename = filename.trim_end_matches(".svg").to_string();
        let icon_name = format!("{}:{}", prefix.as_deref().unwrap_or(LOCAL_SET), basename);
        tracing::info!("Uploaded icon {} ({} bytes)", icon_name, clean_svg.len());

        Ok(UploadedIcon {
            url: self.icon_url(&filename, prefix.as_deref()),
            path: file_path.display().to_string(),
            icon_name,
            basename,
            filename,
        })
    }

    /// Delete one icon; a bare basename addresses the `local` set
    pub async fn delete(&self, icon_name: &str) -> Result<(), IconStoreError> {
        let name = IconName::parse(icon_name);
        let path = self.existing_icon_path(&name, icon_name)?;

        fs::remove_file(&path)
            .await
            .map_err(|e| IconStoreError::io("delete icon", e))?;

        self.clear_cache();
        tracing::info!("Deleted icon {}", name);
        Ok(())
    }

    /// Move an icon into another set; `None`, `""` and `"local"` mean the root set
    pub async fn move_icon(
        &self,
        icon_name: &str,
        target_set: Option<&str>,
    ) -> Result<(), IconStoreError> {
        let name = IconName::parse(icon_name);
        let source_path = self.existing_icon_path(&name, icon_name)?;

        let target = resolve_target_set(target_set)?;
        let new_prefix = target.as_deref().unwrap_or(LOCAL_SET);
        if name.prefix == new_prefix {
            return Err(IconStoreError::AlreadyInSet {
                icon_name: name.to_string(),
            });
        }

        let target_dir = self.set_dir(target.as_deref());
        let target_path = target_dir.join(name.filename());
        if target_path.exists() {
            return Err(IconStoreError::TargetExists {
                icon_name: format!("{}:{}", new_prefix, name.basename),
            });
        }

        path_utils::ensure_directory(&target_dir, "move icon").await?;
        fs::rename(&source_path, &target_path)
            .await
            .map_err(|e| IconStoreError::io("move icon", e))?;

        self.clear_cache();
        tracing::info!("Moved icon {} to set {}", name, new_prefix);
        Ok(())
    }

    /// Create an empty set; returns its prefix
    pub async fn create_set(&self, set_name: &str) -> Result<String, IconStoreError> {
        let prefix = naming::sanitize_set_name(set_name);
        if prefix.is_empty() {
            return Err(IconStoreError::InvalidSetName {
                set_name: set_name.to_string(),
            });
        }
        if prefix == LOCAL_SET {
            return Err(IconStoreError::ReservedSetName);
        }

        let set_dir = self.set_dir(Some(&prefix));
        if set_dir.exists() {
            return Err(IconStoreError::SetAlreadyExists { set_name: prefix });
        }

        path_utils::ensure_directory(&set_dir, "create icon set directory").await?;

        self.clear_cache();
        tracing::info!("Created icon set {}", prefix);
        Ok(prefix)
    }

    /// Rename a set directory; returns the new prefix
    pub async fn rename_set(&self, old_name: &str, new_name: &str) -> Result<String, IconStoreError> {
        if old_name == LOCAL_SET {
            return Err(IconStoreError::RenameReservedSet);
        }

        let old_prefix = naming::sanitize_set_name(old_name);
        let new_prefix = naming::sanitize_set_name(new_name);
        if old_prefix == LOCAL_SET {
            return Err(IconStoreError::RenameReservedSet);
        }
        if old_prefix.is_empty() {
            return Err(IconStoreError::InvalidSetName {
                set_name: old_name.to_string(),
            });
        }
        if old_prefix == new_prefix {
            return Err(IconStoreError::SameSetName);
        }
        if new_prefix == LOCAL_SET {
            return Err(IconStoreError::ReservedSetName);
        }
        if new_prefix.is_empty() {
            return Err(IconStoreError::InvalidSetName {
                set_name: new_name.to_string(),
            });
        }

        let old_dir = self.set_dir(Some(&old_prefix));
        let new_dir = self.set_dir(Some(&new_prefix));
        if !old_dir.is_dir() {
            return Err(IconStoreError::SetNotFound {
                set_name: old_prefix,
            });
        }
        if new_dir.exists() {
            return Err(IconStoreError::SetAlreadyExists {
                set_name: new_prefix,
            });
        }

        fs::rename(&old_dir, &new_dir)
            .await
            .map_err(|e| IconStoreError::io("rename icon set", e))?;

        self.clear_cache();
        tracing::info!("Renamed icon set {} to {}", old_prefix, new_prefix);
        Ok(new_prefix)
    }

    /// Drop every cached listing
    pub fn clear_cache(&self) {
        self.cache.clear_all();
        tracing::debug!("Icon cache cleared");
    }

    fn existing_icon_path(&self, name: &IconName, raw: &str) -> Result<PathBuf, IconStoreError> {
        let not_found = || IconStoreError::IconNotFound {
            icon_name: raw.to_string(),
        };
        if !name.is_valid() {
            return Err(not_found());
        }
        let path = self.icon_path(name);
        if !path.is_file() {
            return Err(not_found());
        }
        Ok(path)
    }
}

/// Map a caller-supplied set name onto a prefix; `Ok(None)` is the root set
pub(crate) fn resolve_target_set(icon_set: Option<&str>) -> Result<Option<String>, IconStoreError> {
    let Some(raw) = root_or_prefix(icon_set) else {
        return Ok(None);
    };
    let prefix = naming::sanitize_set_name(raw);
    if prefix.is_empty() {
        return Err(IconStoreError::InvalidSetName {
            set_name: raw.to_string(),
        });
    }
    if prefix == LOCAL_SET {
        return Ok(None);
    }
    Ok(Some(prefix))
}

/// Write through a temporary sibling so a listing never sees a half-written icon
async fn write_new_file(path: &Path, bytes: &[u8]) -> Result<(), IconStoreError> {
    let temp_path = sibling_with_suffix(path, &format!("tmp-{}", uuid::Uuid::new_v4()));

    if let Err(e) = fs::write(&temp_path, bytes).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(IconStoreError::io("save file", e));
    }

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(IconStoreError::io("save file", e));
    }

    Ok(())
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut file_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| OsString::from("icon"));
    file_name.push(".");
    file_name.push(suffix);
    path.with_file_name(file_name)
}

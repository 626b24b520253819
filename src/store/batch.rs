//! Uploads as a transport receives them: MIME-checked, one or many at a time.

use crate::protocol::{BatchUploadReport, IconStoreError, UploadFailure, UploadedIcon};

use super::mime;
use super::operations::{UploadSource, UploadedFile};
use super::LocalIconStore;

impl LocalIconStore {
    /// Sniff the content type against the allow-list, then [`LocalIconStore::upload`]
    pub async fn upload_verified(
        &self,
        file: &UploadedFile,
        icon_set: Option<&str>,
    ) -> Result<UploadedIcon, IconStoreError> {
        let mime_type = match &file.source {
            UploadSource::TempFile(path) => self.detect_mime(path),
            UploadSource::Bytes(bytes) => {
                let head = &bytes[..bytes.len().min(8 * 1024)];
                Some(mime::detect_mime_type(head, &file.name))
            }
        };

        let Some(mime_type) = mime_type else {
            return Err(IconStoreError::InvalidUpload {
                filename: file.name.clone(),
            });
        };
        if !self
            .config
            .allowed_mime_types
            .iter()
            .any(|allowed| allowed == &mime_type)
        {
            tracing::warn!("Rejected upload {}: detected {}", file.name, mime_type);
            return Err(IconStoreError::InvalidMimeType {
                filename: file.name.clone(),
                mime_type: Some(mime_type),
            });
        }

        self.upload(file, icon_set).await
    }

    /// Upload every file independently; one failure never stops the rest
    pub async fn upload_batch(
        &self,
        files: &[UploadedFile],
        icon_set: Option<&str>,
    ) -> BatchUploadReport {
        let mut results = Vec::new();
        let mut errors = Vec::new();

        for file in files {
            match self.upload_verified(file, icon_set).await {
                Ok(uploaded) => results.push(uploaded),
                Err(e) => errors.push(UploadFailure {
                    filename: file.name.clone(),
                    message: e.to_string(),
                }),
            }
        }

        let uploaded_count = results.len();
        let total_count = files.len();
        tracing::info!("Batch upload: {} of {} icons stored", uploaded_count, total_count);

        BatchUploadReport {
            success: uploaded_count > 0,
            message: format!(
                "{} of {} icons uploaded successfully",
                uploaded_count, total_count
            ),
            uploaded_count,
            total_count,
            results,
            errors,
        }
    }
}

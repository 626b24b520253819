//! Payload types returned by the icon store
//!
//! Every shape here is what a REST or CLI front-end serializes verbatim.

use serde::{Deserialize, Serialize};

/// Result of a successful single-file upload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedIcon {
    pub icon_name: String,
    pub basename: String,
    pub filename: String,
    pub url: String,
    pub path: String,
}

/// One entry of the set listing, keyed by prefix in the surrounding map
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IconSetSummary {
    pub display_name: String,
    pub total_count: usize,
    /// Every basename in the set, in filesystem order
    pub sample_basenames: Vec<String>,
}

/// An icon as returned by `list_icons`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalIconEntry {
    pub basename: String,
    pub filename: String,
    pub icon_name: String,
    pub url: String,
    pub path: String,
}

/// An icon as returned by `list_all_icons`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AggregatedIconEntry {
    #[serde(flatten)]
    pub icon: LocalIconEntry,
    pub icon_set: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchHit {
    pub basename: String,
    pub prefix: String,
}

/// Per-file failure inside a batch upload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadFailure {
    pub filename: String,
    pub message: String,
}

/// Aggregate answer for a multi-file upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchUploadReport {
    pub success: bool,
    pub message: String,
    pub uploaded_count: usize,
    pub total_count: usize,
    pub results: Vec<UploadedIcon>,
    pub errors: Vec<UploadFailure>,
}

/// Transport envelope: `{success, message, data?}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<IconStoreError>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    pub fn from_result(result: Result<T, IconStoreError>, success_message: &str) -> Self {
        match result {
            Ok(data) => Self::ok(success_message, data),
            Err(error) => Self {
                success: false,
                message: error.to_string(),
                data: None,
                error: Some(error),
            },
        }
    }
}

/// Coarse failure class, used by callers to pick a transport status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Io,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IconStoreError {
    #[error("Invalid file upload")]
    InvalidUpload { filename: String },
    #[error("Only SVG files are allowed")]
    InvalidExtension { filename: String },
    #[error("Invalid file type. Only SVG files are allowed.")]
    InvalidMimeType {
        filename: String,
        mime_type: Option<String>,
    },
    #[error("File size exceeds maximum allowed size ({max_size} bytes)")]
    FileTooLarge { size: u64, max_size: u64 },
    #[error("Failed to read file content")]
    ReadFailed { message: String },
    #[error("Invalid or malicious SVG content detected")]
    MaliciousContent,
    #[error("Icon not found")]
    IconNotFound { icon_name: String },
    #[error("Icon set not found")]
    SetNotFound { set_name: String },
    #[error("Invalid set name")]
    InvalidSetName { set_name: String },
    #[error("Cannot use \"local\" as a set name")]
    ReservedSetName,
    #[error("Cannot rename the default \"local\" set")]
    RenameReservedSet,
    #[error("New name must be different from current name")]
    SameSetName,
    #[error("A set with this name already exists")]
    SetAlreadyExists { set_name: String },
    #[error("Icon is already in this set")]
    AlreadyInSet { icon_name: String },
    #[error("An icon with this name already exists in the target set")]
    TargetExists { icon_name: String },
    #[error("The icon name \"{query}\" is not valid.")]
    InvalidIconName { query: String },
    #[error("Failed to {action}")]
    IoError { action: String, message: String },
}

impl IconStoreError {
    pub fn io(action: &str, err: impl std::fmt::Display) -> Self {
        IconStoreError::IoError {
            action: action.to_string(),
            message: err.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            IconStoreError::IconNotFound { .. }
            | IconStoreError::SetNotFound { .. }
            | IconStoreError::InvalidIconName { .. } => ErrorCategory::NotFound,
            IconStoreError::ReadFailed { .. } | IconStoreError::IoError { .. } => {
                ErrorCategory::Io
            }
            _ => ErrorCategory::Validation,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_serializes_with_kind_tag() {
        let err = IconStoreError::IconNotFound {
            icon_name: "brand:logo".to_string(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "icon_not_found");
        assert_eq!(json["icon_name"], "brand:logo");
        assert!(err.is_not_found());
    }

    #[test]
    fn io_errors_hide_the_os_message() {
        let err = IconStoreError::io("delete icon", "permission denied (os error 13)");
        assert_eq!(err.to_string(), "Failed to delete icon");
        assert_eq!(err.category(), ErrorCategory::Io);
    }

    #[test]
    fn aggregated_entry_flattens_icon_fields() {
        let entry = AggregatedIconEntry {
            icon: LocalIconEntry {
                basename: "star".to_string(),
                filename: "star.svg".to_string(),
                icon_name: "local:star".to_string(),
                url: "/icons/local/star.svg".to_string(),
                path: "/tmp/local/star.svg".to_string(),
            },
            icon_set: "local".to_string(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["basename"], "star");
        assert_eq!(json["icon_set"], "local");
    }

    #[test]
    fn failed_result_becomes_unsuccessful_response() {
        let response: ApiResponse<()> =
            ApiResponse::from_result(Err(IconStoreError::ReservedSetName), "created");
        assert!(!response.success);
        assert_eq!(response.message, "Cannot use \"local\" as a set name");
        assert!(response.data.is_none());
    }
}

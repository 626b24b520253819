use std::path::{Path, PathBuf};

use crate::protocol::IconStoreError;

/// Fail when some existing component of `path` is a regular file
pub fn validate_components(path: &Path, action: &str) -> Result<(), IconStoreError> {
    let mut current = PathBuf::new();

    for component in path.components() {
        current.push(component);

        if current.is_file() {
            return Err(IconStoreError::io(
                action,
                format!("{} is not a directory", current.display()),
            ));
        }
    }

    Ok(())
}

/// Create `dir` (and its parents) unless it is already there.
///
/// `action` names the failing operation in the returned error.
pub async fn ensure_directory(dir: &Path, action: &str) -> Result<(), IconStoreError> {
    if dir.is_dir() {
        return Ok(());
    }
    validate_components(dir, action)?;

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| IconStoreError::io(action, e))?;
    tracing::debug!("Created directory {}", dir.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn creates_nested_directories_once() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("a").join("b");
        ensure_directory(&dir, "create directory").await.unwrap();
        ensure_directory(&dir, "create directory").await.unwrap();
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn refuses_to_descend_through_a_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("blocker");
        std::fs::write(&file, "x").unwrap();

        let err = ensure_directory(&file.join("set"), "save file")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to save file");
    }
}

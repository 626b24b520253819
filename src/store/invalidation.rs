//! Cache keys that change whenever the watched two-level tree changes.
//!
//! Adding or removing an entry bumps the mtime of its parent directory, so the
//! newest mtime among `dir` and its immediate subdirectories moves forward on
//! any add/remove in the root set or in any set directory.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use super::scanner;

/// `"{logical_name}_{max_mtime_ms}"`, or `"{logical_name}_0"` if `dir` is missing
pub async fn derive(logical_name: &str, dir: &Path) -> String {
    let Some(mut max_mtime) = mtime_millis(dir).await else {
        return format!("{}_0", logical_name);
    };

    for subdir in scanner::list_subdirectories(dir).await {
        if let Some(mtime) = mtime_millis(&subdir).await {
            max_mtime = max_mtime.max(mtime);
        }
    }

    format!("{}_{}", logical_name, max_mtime)
}

async fn mtime_millis(path: &Path) -> Option<u128> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    if !metadata.is_dir() {
        return None;
    }
    let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
    Some(
        modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_directory_yields_zero_token() {
        let temp = TempDir::new().unwrap();
        let token = derive("icon_sets", &temp.path().join("missing")).await;
        assert_eq!(token, "icon_sets_0");
    }

    #[tokio::test]
    async fn token_tracks_changes_inside_subdirectories() {
        let temp = TempDir::new().unwrap();
        let brand = temp.path().join("brand");
        std::fs::create_dir(&brand).unwrap();

        let before = derive("all_icons", temp.path()).await;
        assert!(before.starts_with("all_icons_"));
        assert_ne!(before, "all_icons_0");

        // Give coarse-grained filesystems a chance to tick.
        std::thread::sleep(Duration::from_millis(1100));
        std::fs::write(brand.join("logo.svg"), "<svg/>").unwrap();

        let after = derive("all_icons", temp.path()).await;
        let parse = |token: &str| token.rsplit('_').next().unwrap().parse::<u128>().unwrap();
        assert!(parse(&after) > parse(&before));
    }
}

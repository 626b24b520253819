use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::protocol::{AggregatedIconEntry, IconSetSummary, IconStoreError, LocalIconEntry};

use super::config::LOCAL_SET;
use super::naming::{self, IconName};
use super::{invalidation, root_or_prefix, scanner, LocalIconStore};

const LOCAL_DISPLAY_NAME: &str = "Local Icons";

impl LocalIconStore {
    /// Every set keyed by prefix; `local` only appears once it holds an icon
    pub async fn list_sets(&self) -> BTreeMap<String, IconSetSummary> {
        let root = self.upload_dir();
        let key = invalidation::derive("icon_sets", &root).await;
        self.cache
            .get_or_compute(&key, self.config.cache_ttl, || self.scan_sets(&root))
            .await
    }

    /// Icons of one set; `None`, `""` and `"local"` list the root set
    pub async fn list_icons(&self, icon_set: Option<&str>) -> Vec<LocalIconEntry> {
        let prefix = root_or_prefix(icon_set);
        if let Some(prefix) = prefix {
            if !naming::is_safe_component(prefix) {
                return Vec::new();
            }
        }

        let dir = self.set_dir(prefix);
        if !dir.is_dir() {
            return Vec::new();
        }

        let key = invalidation::derive(
            &format!("icons_set_{}", prefix.unwrap_or(LOCAL_SET)),
            &dir,
        )
        .await;
        self.cache
            .get_or_compute(&key, self.config.cache_ttl, || self.scan_icons(&dir, prefix))
            .await
    }

    /// Root icons first, then each set in prefix order, tagged with `icon_set`
    pub async fn list_all_icons(&self) -> Vec<AggregatedIconEntry> {
        let key = invalidation::derive("all_icons", &self.upload_dir()).await;
        self.cache
            .get_or_compute(&key, self.config.cache_ttl, || self.collect_all_icons())
            .await
    }

    /// Stored markup of `prefix:basename`; a bare basename is not accepted here
    pub async fn get_icon_content(&self, icon_name: &str) -> Result<String, IconStoreError> {
        let not_found = || IconStoreError::IconNotFound {
            icon_name: icon_name.to_string(),
        };
        if !icon_name.contains(':') {
            return Err(not_found());
        }
        let name = IconName::parse(icon_name);
        if !name.is_valid() {
            return Err(not_found());
        }

        let path = self.icon_path(&name);
        if !path.is_file() {
            return Err(not_found());
        }
        tokio::fs::read_to_string(&path).await.map_err(|e| {
            tracing::warn!("Cannot read icon {}: {}", path.display(), e);
            not_found()
        })
    }

    async fn scan_sets(&self, root: &Path) -> BTreeMap<String, IconSetSummary> {
        let mut sets = BTreeMap::new();

        let root_icons = scanner::list_svg_files(root).await;
        if !root_icons.is_empty() {
            sets.insert(
                LOCAL_SET.to_string(),
                summarize(LOCAL_DISPLAY_NAME.to_string(), &root_icons),
            );
        }

        for subdir in scanner::list_subdirectories(root).await {
            let prefix = scanner::filename_of(&subdir);
            if prefix == LOCAL_SET {
                continue;
            }
            let icons = scanner::list_svg_files(&subdir).await;
            sets.insert(prefix.clone(), summarize(capitalize(&prefix), &icons));
        }

        tracing::debug!("Scanned {} icon sets under {}", sets.len(), root.display());
        sets
    }

    async fn scan_icons(&self, dir: &Path, prefix: Option<&str>) -> Vec<LocalIconEntry> {
        let set_name = prefix.unwrap_or(LOCAL_SET);
        scanner::list_svg_files(dir)
            .await
            .iter()
            .map(|path| {
                let filename = scanner::filename_of(path);
                let basename = scanner::basename_of(path);
                LocalIconEntry {
                    icon_name: format!("{}:{}", set_name, basename),
                    url: self.icon_url(&filename, prefix),
                    path: path.display().to_string(),
                    basename,
                    filename,
                }
            })
            .collect()
    }

    async fn collect_all_icons(&self) -> Vec<AggregatedIconEntry> {
        let mut all_icons: Vec<AggregatedIconEntry> = self
            .list_icons(None)
            .await
            .into_iter()
            .map(|icon| AggregatedIconEntry {
                icon,
                icon_set: LOCAL_SET.to_string(),
            })
            .collect();

        for prefix in self.list_sets().await.into_keys() {
            if prefix == LOCAL_SET {
                continue;
            }
            let icons = self.list_icons(Some(&prefix)).await;
            all_icons.extend(icons.into_iter().map(|icon| AggregatedIconEntry {
                icon,
                icon_set: prefix.clone(),
            }));
        }

        all_icons
    }
}

fn summarize(display_name: String, icons: &[PathBuf]) -> IconSetSummary {
    IconSetSummary {
        display_name,
        total_count: icons.len(),
        sample_basenames: icons.iter().map(|path| scanner::basename_of(path)).collect(),
    }
}

/// Uppercase the first character only
fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

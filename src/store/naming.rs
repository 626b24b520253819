//! Slug rules for set names and icon filenames, plus `prefix:basename` parsing.

use std::path::{Component, Path};

use super::config::LOCAL_SET;

/// Basename used when a filename has no usable characters left
const FALLBACK_BASENAME: &str = "icon";

/// Lowercase, map everything outside `[a-z0-9-]` to `-`, collapse runs of `-`
/// and trim them from both ends.
pub fn sanitize_set_name(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    for ch in raw.chars().flat_map(char::to_lowercase) {
        let ch = if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            ch
        } else {
            '-'
        };
        if ch == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(ch);
    }
    slug.trim_matches('-').to_string()
}

/// Same rule as [`sanitize_set_name`], applied to a filename stem.
pub fn sanitize_filename_base(raw: &str) -> String {
    sanitize_set_name(raw)
}

/// Pick `{base}.{ext}`, or the first free `{base}-N.{ext}` for N = 1, 2, ...
pub fn make_unique_filename<F>(base: &str, extension: &str, exists: F) -> String
where
    F: Fn(&str) -> bool,
{
    let base = if base.is_empty() { FALLBACK_BASENAME } else { base };
    let mut filename = format!("{}.{}", base, extension);
    let mut counter: u64 = 1;
    while exists(&filename) {
        filename = format!("{}-{}.{}", base, counter, extension);
        counter += 1;
    }
    filename
}

/// Split an uploaded filename into `(stem, lowercase extension)`.
///
/// The extension is whatever follows the last `.` of the final component, so
/// `.svg` is an SVG with an empty stem.
pub fn split_filename(filename: &str) -> (String, String) {
    let name = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    match name.rsplit_once('.') {
        Some((stem, ext)) => (stem.to_string(), ext.to_lowercase()),
        None => (name, String::new()),
    }
}

/// True when `value` can be joined onto a directory without escaping it.
pub fn is_safe_component(value: &str) -> bool {
    if value.is_empty() || value.contains(&['/', '\\', '\0'][..]) {
        return false;
    }
    let mut components = Path::new(value).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Parsed `prefix:basename` identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconName {
    pub prefix: String,
    pub basename: String,
}

impl IconName {
    /// Split once on the first `:`; a bare name belongs to the `local` set.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((prefix, basename)) => Self {
                prefix: prefix.to_string(),
                basename: basename.to_string(),
            },
            None => Self {
                prefix: LOCAL_SET.to_string(),
                basename: raw.to_string(),
            },
        }
    }

    pub fn is_local(&self) -> bool {
        self.prefix == LOCAL_SET
    }

    pub fn filename(&self) -> String {
        format!("{}.svg", self.basename)
    }

    /// Both halves are usable as path components.
    pub fn is_valid(&self) -> bool {
        is_safe_component(&self.prefix) && is_safe_component(&self.filename())
    }
}

impl std::fmt::Display for IconName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.prefix, self.basename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_names_become_slugs() {
        assert_eq!(sanitize_set_name("My Brand Icons"), "my-brand-icons");
        assert_eq!(sanitize_set_name("--Social__Media--"), "social-media");
        assert_eq!(sanitize_set_name("Test Icon!!"), "test-icon");
        assert_eq!(sanitize_set_name("---"), "");
        assert_eq!(sanitize_set_name("Ünïcode"), "n-code");
    }

    #[test]
    fn sanitizing_is_idempotent() {
        for raw in ["A  b", "--x--", "café au lait", "", "a-b-c", "ÄÖÜ 123", "!!"] {
            let once = sanitize_set_name(raw);
            assert_eq!(sanitize_set_name(&once), once, "input {:?}", raw);
        }
    }

    #[test]
    fn unique_filename_probes_counters_in_order() {
        let taken = ["icon.svg", "icon-1.svg", "icon-2.svg"];
        let name = make_unique_filename("icon", "svg", |candidate| taken.contains(&candidate));
        assert_eq!(name, "icon-3.svg");
        assert_eq!(make_unique_filename("star", "svg", |_| false), "star.svg");
        assert_eq!(make_unique_filename("", "svg", |_| false), "icon.svg");
    }

    #[test]
    fn filenames_split_on_last_dot() {
        assert_eq!(split_filename("Star.SVG"), ("Star".to_string(), "svg".to_string()));
        assert_eq!(split_filename("a.b.svg"), ("a.b".to_string(), "svg".to_string()));
        assert_eq!(split_filename(".svg"), (String::new(), "svg".to_string()));
        assert_eq!(split_filename("dir/logo.svg"), ("logo".to_string(), "svg".to_string()));
        assert_eq!(split_filename("README"), ("README".to_string(), String::new()));
    }

    #[test]
    fn icon_names_split_on_first_colon() {
        assert_eq!(
            IconName::parse("brand:logo:dark"),
            IconName {
                prefix: "brand".to_string(),
                basename: "logo:dark".to_string()
            }
        );
        let bare = IconName::parse("star");
        assert!(bare.is_local());
        assert_eq!(bare.to_string(), "local:star");
    }

    #[test]
    fn unsafe_components_are_rejected() {
        assert!(is_safe_component("brand"));
        assert!(!is_safe_component(".."));
        assert!(!is_safe_component("."));
        assert!(!is_safe_component("a/b"));
        assert!(!is_safe_component("a\\b"));
        assert!(!is_safe_component(""));
        assert!(!IconName::parse("../etc:passwd").is_valid());
        assert!(!IconName::parse("local:../../x").is_valid());
    }
}

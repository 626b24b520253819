use std::io::Read;
use std::path::Path;

/// Bytes inspected when sniffing a file on disk
const SNIFF_LEN: u64 = 8 * 1024;

pub const SVG_MIME: &str = "image/svg+xml";

/// Guesses the MIME type of a file on disk
pub trait MimeDetector: Send + Sync {
    /// `None` when `path` is not a readable regular file
    fn guess(&self, path: &Path) -> Option<String>;
}

/// Content sniffing (`infer` plus an SVG check) with an extension fallback
#[derive(Debug, Default, Clone, Copy)]
pub struct SniffingMimeDetector;

impl MimeDetector for SniffingMimeDetector {
    fn guess(&self, path: &Path) -> Option<String> {
        if !path.is_file() {
            return None;
        }
        let file = std::fs::File::open(path).ok()?;
        let mut buffer = Vec::new();
        file.take(SNIFF_LEN).read_to_end(&mut buffer).ok()?;
        Some(detect_mime_type(&buffer, path.to_string_lossy().as_ref()))
    }
}

/// Detect MIME type from file content and extension
pub fn detect_mime_type(buffer: &[u8], filename: &str) -> String {
    // infer reports SVG with an XML prolog as text/xml, so look for the root first.
    if looks_like_svg(buffer) {
        return SVG_MIME.to_string();
    }
    if let Some(kind) = infer::get(buffer) {
        return kind.mime_type().to_string();
    }
    let guessed = guess_mime_from_extension(filename);
    if guessed == SVG_MIME {
        // Extension claims SVG but the content has no <svg> root.
        return if is_probably_text(buffer) {
            "text/plain".to_string()
        } else {
            "application/octet-stream".to_string()
        };
    }
    if guessed == "application/octet-stream" && is_probably_text(buffer) {
        return "text/plain".to_string();
    }
    guessed
}

/// True when the first element of a text buffer is `<svg`
pub fn looks_like_svg(buffer: &[u8]) -> bool {
    if !is_probably_text(buffer) {
        return false;
    }
    let text = String::from_utf8_lossy(buffer);
    let mut rest = text.trim_start_matches('\u{feff}').trim_start();

    // Skip the prolog: declaration, processing instructions, comments, doctype.
    loop {
        if rest.starts_with("<?") {
            match rest.find("?>") {
                Some(end) => rest = rest[end + 2..].trim_start(),
                None => return false,
            }
        } else if rest.starts_with("<!--") {
            match rest.find("-->") {
                Some(end) => rest = rest[end + 3..].trim_start(),
                None => return false,
            }
        } else if rest
            .get(..9)
            .map_or(false, |head| head.eq_ignore_ascii_case("<!doctype"))
        {
            match rest.find('>') {
                Some(end) => rest = rest[end + 1..].trim_start(),
                None => return false,
            }
        } else {
            break;
        }
    }

    let Some(tag) = rest.strip_prefix('<') else {
        return false;
    };
    let name: String = tag
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != '>' && *c != '/')
        .collect();
    let local = name.rsplit(':').next().unwrap_or("");
    local.eq_ignore_ascii_case("svg")
}

/// Guess MIME type based on filename extension
pub fn guess_mime_from_extension(filename: &str) -> String {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "svg" | "svgz" => SVG_MIME,
        "xml" => "application/xml",
        "html" | "htm" => "text/html",
        "txt" => "text/plain",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
    .to_string()
}

/// Best-effort heuristic for deciding if a buffer is "text enough" to be markup.
pub fn is_probably_text(buffer: &[u8]) -> bool {
    if buffer.is_empty() {
        return true;
    }

    // NUL is a strong binary signal.
    if buffer.contains(&0) {
        return false;
    }

    if let Err(e) = std::str::from_utf8(buffer) {
        // A sniff window may cut a multi-byte character in half.
        if e.error_len().is_some() {
            return false;
        }
    }

    let control_count = buffer
        .iter()
        .filter(|&&b| b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r'))
        .count();

    // If >10% of bytes are control characters, treat as binary-ish.
    control_count * 10 <= buffer.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn svg_with_prolog_is_detected() {
        let svg = br#"<?xml version="1.0" encoding="UTF-8"?>
<!-- Generator: hand -->
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M0 0h24v24H0z"/></svg>"#;
        assert_eq!(detect_mime_type(svg, "icon.svg"), SVG_MIME);
    }

    #[test]
    fn svg_extension_without_svg_root_is_not_svg() {
        assert_eq!(detect_mime_type(b"just some text", "fake.svg"), "text/plain");
        assert_eq!(detect_mime_type(b"hello", "fake.txt"), "text/plain");
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(detect_mime_type(&png, "fake.svg"), "image/png");
    }

    #[test]
    fn detector_reads_files_from_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("upload.tmp");
        std::fs::write(&path, "<svg xmlns=\"http://www.w3.org/2000/svg\"></svg>").unwrap();

        let detector = SniffingMimeDetector;
        assert_eq!(detector.guess(&path).as_deref(), Some(SVG_MIME));
        assert_eq!(detector.guess(&temp.path().join("missing")), None);
        assert_eq!(detector.guess(temp.path()), None);
    }
}

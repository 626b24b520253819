//! SVG sanitizing.
//!
//! The store only depends on [`SvgSanitizer`]; [`XmlSvgSanitizer`] is the
//! default implementation. It re-emits the document event by event, dropping
//! anything that can execute or pull in external content.

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};

/// Turns untrusted SVG bytes into markup that is safe to inline
pub trait SvgSanitizer: Send + Sync {
    /// Cleaned markup, or `None` when the input is rejected
    fn sanitize(&self, raw: &[u8]) -> Option<String>;
}

const FORBIDDEN_ELEMENTS: &[&str] = &[
    "script",
    "foreignobject",
    "iframe",
    "frame",
    "embed",
    "object",
    "handler",
    "listener",
    "base",
    "link",
    "meta",
    "set",
    "animate",
];

const SAFE_DATA_URIS: &[&str] = &[
    "data:image/png",
    "data:image/jpeg",
    "data:image/jpg",
    "data:image/gif",
    "data:image/webp",
];

/// Event-stream filter built on quick-xml
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlSvgSanitizer;

impl SvgSanitizer for XmlSvgSanitizer {
    fn sanitize(&self, raw: &[u8]) -> Option<String> {
        match clean_document(raw) {
            Ok(svg) if !svg.trim().is_empty() => Some(svg),
            Ok(_) => None,
            Err(reason) => {
                tracing::debug!("Rejected SVG: {}", reason);
                None
            }
        }
    }
}

fn clean_document(raw: &[u8]) -> Result<String, String> {
    let mut reader = Reader::from_reader(raw);
    let mut writer = Writer::new(Vec::with_capacity(raw.len()));
    let mut buf = Vec::new();
    let mut skipped = Vec::new();
    let mut saw_root = false;
    let mut style_depth = 0usize;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| e.to_string())?;
        match event {
            Event::Eof => break,
            Event::Decl(decl) => emit(&mut writer, Event::Decl(decl))?,
            Event::Start(start) => {
                check_root(&start, &mut saw_root)?;
                if is_forbidden(&start) {
                    let end = start.name().as_ref().to_vec();
                    reader
                        .read_to_end_into(QName(&end), &mut skipped)
                        .map_err(|e| e.to_string())?;
                    skipped.clear();
                } else {
                    if local_name_lower(start.local_name().as_ref()) == "style" {
                        style_depth += 1;
                    }
                    emit(&mut writer, Event::Start(clean_element(&start)?))?;
                }
            }
            Event::Empty(start) => {
                check_root(&start, &mut saw_root)?;
                if !is_forbidden(&start) {
                    emit(&mut writer, Event::Empty(clean_element(&start)?))?;
                }
            }
            Event::End(end) => {
                if style_depth > 0 && local_name_lower(end.local_name().as_ref()) == "style" {
                    style_depth -= 1;
                }
                emit(&mut writer, Event::End(end))?;
            }
            Event::Text(text) => {
                if style_depth == 0 || !is_unsafe_value(&String::from_utf8_lossy(&text)) {
                    emit(&mut writer, Event::Text(text))?;
                }
            }
            Event::CData(data) => {
                if style_depth == 0 || !is_unsafe_value(&String::from_utf8_lossy(&data)) {
                    emit(&mut writer, Event::CData(data))?;
                }
            }
            // Comments, processing instructions and DOCTYPE (entity tricks) are dropped.
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err("document has no <svg> root".to_string());
    }
    String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), String> {
    writer.write_event(event).map_err(|e| e.to_string())
}

fn check_root(start: &BytesStart<'_>, saw_root: &mut bool) -> Result<(), String> {
    if *saw_root {
        return Ok(());
    }
    if local_name_lower(start.local_name().as_ref()) != "svg" {
        return Err("root element is not <svg>".to_string());
    }
    *saw_root = true;
    Ok(())
}

fn is_forbidden(start: &BytesStart<'_>) -> bool {
    let name = local_name_lower(start.local_name().as_ref());
    FORBIDDEN_ELEMENTS.contains(&name.as_str())
}

fn clean_element(start: &BytesStart<'_>) -> Result<BytesStart<'static>, String> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut cleaned = BytesStart::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        if is_allowed_attribute(&attr) {
            cleaned.push_attribute(attr);
        }
    }
    Ok(cleaned)
}

fn is_allowed_attribute(attr: &Attribute<'_>) -> bool {
    let key = local_name_lower(attr.key.local_name().as_ref());
    if key.starts_with("on") {
        return false;
    }
    let value = match attr.unescape_value() {
        Ok(value) => value,
        Err(_) => return false,
    };
    if is_unsafe_value(&value) {
        return false;
    }
    if key == "href" || key == "src" {
        return is_safe_reference(&value);
    }
    if key == "attributename" {
        return !is_scriptable_target(&value);
    }
    true
}

/// Animation targets that would re-introduce a handler or a link at render time
fn is_scriptable_target(value: &str) -> bool {
    let target = value.trim().to_ascii_lowercase();
    let local = target.rsplit(':').next().unwrap_or("");
    local.starts_with("on") || local == "href" || local == "src"
}

/// Local fragment or an inline raster image
fn is_safe_reference(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || value.starts_with('#') {
        return true;
    }
    let lower = value.to_ascii_lowercase();
    SAFE_DATA_URIS.iter().any(|prefix| lower.starts_with(prefix))
}

fn is_unsafe_value(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    ["javascript:", "vbscript:", "@import", "expression("]
        .iter()
        .any(|needle| compact.contains(needle))
}

fn local_name_lower(name: &[u8]) -> String {
    String::from_utf8_lossy(name).to_ascii_lowercase()
}

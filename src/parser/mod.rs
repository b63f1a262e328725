//! Decoding and XML parsing.
//!
//! Raw bytes go through a charset ladder (chardet's guess first, then a
//! fixed list of feeds-in-the-wild encodings); the first clean decode wins
//! and a leading byte-order mark is stripped. The decoded text is then
//! parsed into a [`serde_json::Value`] tree following the xmltodict
//! conventions the operators depend on:
//!
//! - attributes become `"@name"` keys
//! - inline text of mixed elements lands under the literal key `"#text"`
//! - repeated sibling elements collapse into an array
//! - text-only elements become plain strings, empty elements become null

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::error::{DecodeError, DecodeResult, XmlError, XmlResult};

/// Key holding the inline text content of a mixed element.
pub const TEXT_KEY: &str = "#text";

/// Prefix for attribute-derived keys.
pub const ATTR_PREFIX: &str = "@";

/// Charsets tried after chardet's detection, in order.
const CHARSET_LADDER: &[&str] = &["utf-8", "windows-1250", "iso-8859-15"];

/// Maximum element nesting depth (prevents stack overflow on hostile input).
const MAX_DEPTH: usize = 100;

// =============================================================================
// Decoding
// =============================================================================

/// Decode raw bytes to text via the charset ladder.
///
/// chardet's detected charset is tried first, then the fixed ladder; the
/// first decode without replacement errors is used. A leading U+FEFF and
/// surrounding whitespace are stripped.
pub fn decode_text(bytes: &[u8]) -> DecodeResult<String> {
    let detected = chardet::detect(bytes).0.to_lowercase();

    let mut candidates: Vec<String> = Vec::new();
    if !detected.is_empty() {
        candidates.push(detected);
    }
    for charset in CHARSET_LADDER {
        if !candidates.iter().any(|c| c == charset) {
            candidates.push((*charset).to_string());
        }
    }

    for charset in &candidates {
        let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) else {
            continue;
        };
        let (text, _, had_errors) = encoding.decode(bytes);
        if had_errors {
            continue;
        }
        let text = text.trim_start_matches('\u{feff}').trim();
        if text.is_empty() {
            return Err(DecodeError::EmptyDocument);
        }
        return Ok(text.to_string());
    }

    Err(DecodeError::NoCharsetMatched(candidates.join(", ")))
}

// =============================================================================
// XML -> Value tree
// =============================================================================

/// Parse XML text into a document tree.
///
/// The result is an object with a single key, the root element's name,
/// mirroring the shape the list collector walks.
pub fn parse_xml(text: &str) -> XmlResult<Value> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = element_name(&e);
                let owned = e.to_owned();
                let content = parse_element(&mut reader, &owned, 0)?;
                let mut root = Map::new();
                root.insert(name, content);
                return Ok(Value::Object(root));
            }
            Ok(Event::Empty(e)) => {
                let name = element_name(&e);
                let mut root = Map::new();
                root.insert(name, empty_element(&e));
                return Ok(Value::Object(root));
            }
            Ok(Event::Eof) => return Err(XmlError::NoRoot),
            Err(e) => return Err(syntax_error(&reader, e)),
            // Declaration, comments, doctype, processing instructions.
            Ok(_) => {}
        }
    }
}

fn parse_element(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    depth: usize,
) -> XmlResult<Value> {
    if depth > MAX_DEPTH {
        return Err(XmlError::TooDeep(MAX_DEPTH));
    }

    let mut attrs = attribute_map(start);
    let mut children: Map<String, Value> = Map::new();
    let mut text_parts: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = element_name(&e);
                let owned = e.to_owned();
                let value = parse_element(reader, &owned, depth + 1)?;
                insert_child(&mut children, name, value);
            }
            Ok(Event::Empty(e)) => {
                let name = element_name(&e);
                insert_child(&mut children, name, empty_element(&e));
            }
            Ok(Event::Text(t)) => match t.unescape() {
                Ok(text) => {
                    if !text.is_empty() {
                        text_parts.push(text.to_string());
                    }
                }
                Err(e) => return Err(syntax_error(reader, e)),
            },
            Ok(Event::CData(t)) => {
                let text = String::from_utf8_lossy(&t.into_inner()).to_string();
                if !text.is_empty() {
                    text_parts.push(text);
                }
            }
            Ok(Event::End(_)) => break,
            Ok(Event::Eof) => {
                return Err(XmlError::Syntax {
                    position: reader.buffer_position() as u64,
                    message: "unexpected end of document".to_string(),
                })
            }
            Err(e) => return Err(syntax_error(reader, e)),
            Ok(_) => {}
        }
    }

    let text = if text_parts.is_empty() {
        None
    } else {
        Some(text_parts.concat())
    };

    // Text-only element -> plain string; fully empty element -> null.
    if attrs.is_empty() && children.is_empty() {
        return Ok(match text {
            Some(t) => Value::String(t),
            None => Value::Null,
        });
    }

    for (name, value) in children {
        attrs.insert(name, value);
    }
    if let Some(t) = text {
        attrs.insert(TEXT_KEY.to_string(), Value::String(t));
    }
    Ok(Value::Object(attrs))
}

/// Repeated sibling names collapse into an array, in document order.
fn insert_child(children: &mut Map<String, Value>, name: String, value: Value) {
    match children.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            children.insert(name, value);
        }
    }
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).to_string()
}

fn attribute_map(start: &BytesStart<'_>) -> Map<String, Value> {
    let mut map = Map::new();
    for attr in start.attributes().flatten() {
        let key = format!(
            "{}{}",
            ATTR_PREFIX,
            String::from_utf8_lossy(attr.key.as_ref())
        );
        let value = attr
            .unescape_value()
            .map(|v| v.to_string())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string());
        map.insert(key, Value::String(value));
    }
    map
}

fn empty_element(start: &BytesStart<'_>) -> Value {
    let attrs = attribute_map(start);
    if attrs.is_empty() {
        Value::Null
    } else {
        Value::Object(attrs)
    }
}

fn syntax_error(reader: &Reader<&[u8]>, error: quick_xml::Error) -> XmlError {
    XmlError::Syntax {
        position: reader.buffer_position() as u64,
        message: error.to_string(),
    }
}

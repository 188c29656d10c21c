//! Plain-text extraction from Word (`.docx`) documents.
//!
//! A `.docx` file is a ZIP container; the body lives in `word/document.xml`
//! as a sequence of `<w:p>` paragraphs whose text sits in `<w:t>` runs.

use crate::error::{Result, ShoptalkError};
use regex::Regex;
use std::io::{Cursor, Read};
use std::sync::LazyLock;
use tracing::debug;

const DOCUMENT_PART: &str = "word/document.xml";

static PARAGRAPH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:p(?:\s[^>]*)?/>|<w:p(?:\s[^>]*)?>(.*?)</w:p>").expect("valid regex")
});

static RUN_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>|<w:tab/>|<w:br(?:\s[^>]*)?/>|<w:cr/>")
        .expect("valid regex")
});

static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|[a-z]+);").expect("valid regex"));

/// Extract the text of a `.docx` document, one line per paragraph.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ShoptalkError::Document(format!("Not a valid .docx archive: {}", e)))?;

    let mut xml = String::new();
    {
        let mut part = archive.by_name(DOCUMENT_PART).map_err(|_| {
            ShoptalkError::Document(format!("Archive has no {} part", DOCUMENT_PART))
        })?;
        part.read_to_string(&mut xml)?;
    }

    let text = document_xml_to_text(&xml);
    debug!("Extracted {} characters from docx", text.chars().count());
    Ok(text)
}

/// Convert WordprocessingML body XML to plain text.
fn document_xml_to_text(xml: &str) -> String {
    PARAGRAPH_RE
        .captures_iter(xml)
        .map(|caps| caps.get(1).map(|m| paragraph_text(m.as_str())).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\n")
}

fn paragraph_text(inner: &str) -> String {
    let mut text = String::new();
    for caps in RUN_TOKEN_RE.captures_iter(inner) {
        match caps.get(1) {
            Some(run) => text.push_str(&decode_entities(run.as_str())),
            None => {
                let token = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
                if token.starts_with("<w:tab") {
                    text.push('\t');
                } else {
                    text.push('\n');
                }
            }
        }
    }
    text
}

fn decode_entities(raw: &str) -> String {
    ENTITY_RE
        .replace_all(raw, |caps: &regex::Captures| {
            let name = &caps[1];
            let decoded = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ if name.starts_with("#x") => u32::from_str_radix(&name[2..], 16)
                    .ok()
                    .and_then(char::from_u32),
                _ if name.starts_with('#') => name[1..].parse().ok().and_then(char::from_u32),
                _ => None,
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text extraction for uploaded documents and fixed-size chunking.
//!
//! Supported formats: plain text and markdown (read as-is), HTML (tags
//! stripped), PDF (via pdf-extract), and DOCX (word/document.xml pulled
//! out of the zip container with quick-xml).

use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use lorebase_core::LorebaseError;

/// Extract plain text from a document, dispatching on `file_type`
/// (lowercase extension without the dot).
pub fn extract_text(path: &Path, file_type: &str) -> Result<String, LorebaseError> {
    match file_type {
        "txt" | "md" => std::fs::read_to_string(path).map_err(|e| {
            LorebaseError::Integration(format!("failed to read {}: {e}", path.display()))
        }),
        "html" => {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                LorebaseError::Integration(format!("failed to read {}: {e}", path.display()))
            })?;
            Ok(strip_html(&raw))
        }
        "pdf" => pdf_extract::extract_text(path).map_err(|e| {
            LorebaseError::Integration(format!("failed to extract pdf {}: {e}", path.display()))
        }),
        "docx" => extract_docx(path),
        other => Err(LorebaseError::Validation(format!(
            "unsupported file type: {other}"
        ))),
    }
}

/// Strip tags from HTML, dropping script/style bodies entirely.
fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len() / 2);
    let mut chars = html.char_indices().peekable();
    let mut skip_until: Option<&str> = None;

    while let Some((i, c)) = chars.next() {
        if let Some(close) = skip_until {
            if c == '<' && html[i..].to_lowercase().starts_with(close) {
                skip_until = None;
            } else {
                continue;
            }
        }
        if c == '<' {
            let rest = html[i..].to_lowercase();
            if rest.starts_with("<script") {
                skip_until = Some("</script");
            } else if rest.starts_with("<style") {
                skip_until = Some("</style");
            }
            // Consume until the closing angle bracket.
            for (_, tc) in chars.by_ref() {
                if tc == '>' {
                    break;
                }
            }
            out.push(' ');
        } else {
            out.push(c);
        }
    }

    // Collapse whitespace runs left behind by removed tags.
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pull the text of `word/document.xml` out of a DOCX container, with a
/// newline per paragraph.
fn extract_docx(path: &Path) -> Result<String, LorebaseError> {
    let file = std::fs::File::open(path).map_err(|e| {
        LorebaseError::Integration(format!("failed to open {}: {e}", path.display()))
    })?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| LorebaseError::Integration(format!("not a docx archive: {e}")))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| LorebaseError::Integration(format!("docx missing document.xml: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| LorebaseError::Integration(format!("failed to read document.xml: {e}")))?;

    let mut reader = Reader::from_str(&xml);
    let mut out = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| LorebaseError::Integration(format!("bad docx xml: {e}")))?;
                out.push_str(&text);
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"w:p" => out.push('\n'),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(LorebaseError::Integration(format!("bad docx xml: {e}")));
            }
        }
    }
    Ok(out)
}

/// Split text into character-bounded chunks with overlap.
///
/// Chunks are `chunk_size` characters long; consecutive chunks share the
/// trailing `overlap` characters. Blank-only chunks are dropped.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() || chunk_size == 0 {
        return Vec::new();
    }
    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        let chunk: String = chars[start..end].iter().collect();
        if !chunk.trim().is_empty() {
            chunks.push(chunk);
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

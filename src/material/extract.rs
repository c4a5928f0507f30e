// src/material/extract.rs
//! Text extraction for uploaded materials (PDF, DOCX, plain text)

use anyhow::{anyhow, Result};
use std::io::{Cursor, Read};
use std::path::Path;

/// Extract plain text from an uploaded file, choosing the parser by extension.
pub fn extract_text(file_name: &str, bytes: &[u8]) -> Result<String> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();

    let raw = match extension.as_str() {
        "pdf" => parse_pdf(bytes)?,
        "docx" => parse_docx(bytes)?,
        "doc" => return Err(anyhow!("Legacy .doc format not supported. Please convert to .docx")),
        "txt" | "md" | "markdown" => parse_text(bytes),
        _ => return Err(anyhow!("Unsupported file type: {}", extension)),
    };

    Ok(clean_text(&raw))
}

fn parse_pdf(bytes: &[u8]) -> Result<String> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| anyhow!("Failed to extract PDF text: {}", e))
}

/// DOCX is a zip archive; body text lives in `w:t` runs of word/document.xml.
fn parse_docx(bytes: &[u8]) -> Result<String> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml_content = String::new();
    match archive.by_name("word/document.xml") {
        Ok(mut doc_file) => {
            doc_file.read_to_string(&mut xml_content)?;
        }
        Err(_) => return Err(anyhow!("Could not find document.xml in DOCX file")),
    }

    let mut reader = Reader::from_str(&xml_content);
    reader.config_mut().trim_text(true);

    let mut content = String::new();
    let mut buf = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if e.name().as_ref() == b"w:t" {
                    in_text = true;
                }
            }
            Ok(Event::Text(e)) => {
                if in_text {
                    let text = e
                        .unescape()
                        .map_err(|err| anyhow!("XML decode error: {}", err))?;
                    content.push_str(&text);
                    content.push(' ');
                }
            }
            Ok(Event::End(ref e)) => {
                if e.name().as_ref() == b"w:t" {
                    in_text = false;
                }
                if e.name().as_ref() == b"w:p" {
                    content.push('\n');
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow!("XML parsing error: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(content)
}

/// UTF-8 first, Windows-1252 when the bytes are not valid UTF-8.
fn parse_text(bytes: &[u8]) -> String {
    let (content, _, had_errors) = encoding_rs::UTF_8.decode(bytes);
    if had_errors {
        let (content, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
        return content.into_owned();
    }
    content.into_owned()
}

/// Collapse runs of blank lines and trailing whitespace.
fn clean_text(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut blank_run = 0;

    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        cleaned.push_str(line);
        cleaned.push('\n');
    }

    cleaned.trim().to_string()
}

//! Line source and sink for evolvable CSV files.
//!
//! Files are read whole: columns need every row before the first one can be
//! built. Reading splits a file into two parts:
//!
//! - **Comments**: `#` lines that appear before the first data line. They are
//!   carried over verbatim.
//! - **Data**: the header and the rows after it. Data ends at the first blank
//!   line.
//!
//! Input is decoded and output re-encoded through `encoding_rs`, defaulting to
//! UTF-8. Output rows go through a `csv::Writer` that never quotes, since
//! fields cannot contain the delimiter in the first place.

use std::{fs, path::Path};

use anyhow::{Context, Result, anyhow};
use csv::{QuoteStyle, Terminator};
use encoding_rs::{Encoding, UTF_8};

use crate::row::Row;

pub const DEFAULT_DELIMITER: u8 = b',';
pub const COMMENT_PREFIX: char = '#';

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSections {
    pub comments: Vec<String>,
    pub data: Vec<String>,
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn encode_text(text: &str, encoding: &'static Encoding) -> Result<Vec<u8>> {
    let (encoded, _, had_errors) = encoding.encode(text);
    if had_errors {
        return Err(anyhow!("Failed to encode text using {}", encoding.name()));
    }
    Ok(encoded.into_owned())
}

pub fn split_lines(text: &str) -> FileSections {
    let mut sections = FileSections::default();
    for line in text.lines().map(str::trim_end) {
        if line.is_empty() {
            break;
        }
        if sections.data.is_empty() && line.starts_with(COMMENT_PREFIX) {
            sections.comments.push(line.to_string());
        } else {
            sections.data.push(line.to_string());
        }
    }
    sections
}

pub fn read_sections(path: &Path, encoding: &'static Encoding) -> Result<FileSections> {
    let bytes = fs::read(path).with_context(|| format!("Reading input file {path:?}"))?;
    let text = decode_bytes(&bytes, encoding).with_context(|| format!("Decoding {path:?}"))?;
    Ok(split_lines(&text))
}

/// Renders `comments` followed by `rows`, one line each, every line ending in `\n`.
pub fn render_lines(comments: &[String], rows: &[Row], delimiter: u8) -> Result<String> {
    let mut buffer = Vec::new();
    for comment in comments {
        buffer.extend_from_slice(comment.as_bytes());
        buffer.push(b'\n');
    }

    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .flexible(true);
    let mut writer = builder.from_writer(buffer);
    for (idx, row) in rows.iter().enumerate() {
        // csv writes a lone empty field as `""`; emit a bare empty line instead.
        if row.width() == 1 && row.key().is_empty() {
            writer.flush().context("Flushing output rows")?;
            let mut inner = writer
                .into_inner()
                .map_err(|err| anyhow!("Flushing output rows: {}", err.error()))?;
            inner.push(b'\n');
            writer = builder.from_writer(inner);
            continue;
        }
        writer
            .write_record(row.iter())
            .with_context(|| format!("Writing output row {}", idx + 1))?;
    }
    let buffer = writer
        .into_inner()
        .map_err(|err| anyhow!("Flushing output rows: {}", err.error()))?;
    String::from_utf8(buffer).context("Rendered output is not valid UTF-8")
}

pub fn write_encoded(path: &Path, text: &str, encoding: &'static Encoding) -> Result<()> {
    let bytes = encode_text(text, encoding)?;
    fs::write(path, bytes).with_context(|| format!("Writing output file {path:?}"))
}

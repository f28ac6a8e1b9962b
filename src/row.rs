//! Fixed-width delimited records.
//!
//! A [`Row`] owns its fields as an immutable boxed slice, so its width is
//! settled once when the line is split and never re-derived afterwards.
//! Quoting is not interpreted: a field can never contain the delimiter.

use std::{fmt, ops::Index};

use itertools::Itertools;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Row {
    fields: Box<[String]>,
}

impl Row {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Splits `line` on `delimiter`. An empty line yields a single empty field.
    pub fn parse(line: &str, delimiter: u8) -> Self {
        Self::new(line.split(delimiter as char))
    }

    pub fn width(&self) -> usize {
        self.fields.len()
    }

    /// First field of the row, used to pair rows across tables.
    pub fn key(&self) -> &str {
        self.fields.first().map(String::as_str).unwrap_or("")
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.fields.get(idx).map(String::as_str)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.fields.iter()
    }

    /// Keeps the first `width` fields.
    pub fn truncated(&self, width: usize) -> Self {
        Self::new(self.fields.iter().take(width).cloned())
    }

    /// Extends the row to `width` fields by repeating its last field.
    pub fn padded(&self, width: usize) -> Self {
        let filler = self.fields.last().cloned().unwrap_or_default();
        let missing = width.saturating_sub(self.width());
        Self::new(
            self.fields
                .iter()
                .cloned()
                .chain(std::iter::repeat_n(filler, missing)),
        )
    }

    pub fn to_line(&self, delimiter: u8) -> String {
        self.fields.iter().join(&(delimiter as char).to_string())
    }
}

impl Index<usize> for Row {
    type Output = str;

    fn index(&self, idx: usize) -> &Self::Output {
        &self.fields[idx]
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl From<Vec<String>> for Row {
    fn from(fields: Vec<String>) -> Self {
        Self {
            fields: fields.into_boxed_slice(),
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line(b','))
    }
}

pub fn parse_rows<I, S>(lines: I, delimiter: u8) -> Vec<Row>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .map(|line| Row::parse(line.as_ref(), delimiter))
        .collect()
}

pub fn render_rows(rows: &[Row], delimiter: u8) -> Vec<String> {
    rows.iter().map(|row| row.to_line(delimiter)).collect()
}

use log::warn;

use crate::{
    core::{
        format::{DataFormat, Decoded},
        row::Row,
    },
    error::{DataFileError, DataFileResult},
};

/// Cells separated by an arbitrary delimiter sequence, with an optional
/// escape sequence.
///
/// The escape sequence works as a toggle while splitting a line: after an
/// escape, the next delimiter does not end the cell, and a second escape
/// cancels the first. When a cell is rebuilt, an escape directly followed by
/// the delimiter or by another escape is removed. An empty escape sequence
/// disables escaping.
///
/// Records never span lines.
///
/// # Examples
///
/// ```
/// use datafile::core::{format::DataFormat, row::Row};
/// use datafile::format::delimited::DelimitedFormat;
///
/// let mut pipes = DelimitedFormat::new("|", "\\").unwrap();
///
/// let row: Row = ["a|b", "c"].into_iter().collect();
/// let line = pipes.encode(&row);
/// assert_eq!(line, "a\\|b|c");
///
/// let decoded = pipes.decode(&line).into_row().unwrap();
/// assert_eq!(decoded.get(0), "a|b");
/// assert_eq!(decoded.get(1), "c");
/// ```
#[derive(Debug, Clone)]
pub struct DelimitedFormat {
    delimiter: String,
    escape: String,
}

impl DelimitedFormat {
    /// Creates a format splitting on `delimiter`; pass `""` as `escape` to disable escaping.
    ///
    /// # Errors
    ///
    /// Returns [`DataFileError::Configuration`] when `delimiter` is empty.
    pub fn new(delimiter: &str, escape: &str) -> DataFileResult<Self> {
        if delimiter.is_empty() {
            return Err(DataFileError::Configuration(
                "delimiter cannot be empty".to_owned(),
            ));
        }

        Ok(Self {
            delimiter: delimiter.to_owned(),
            escape: escape.to_owned(),
        })
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    pub fn escape(&self) -> &str {
        &self.escape
    }

    fn is_escape_at(&self, text: &str) -> bool {
        !self.escape.is_empty() && text.starts_with(self.escape.as_str())
    }

    /// Removes escapes placed in front of a delimiter or another escape.
    fn unescape(&self, cell: &str) -> String {
        if self.escape.is_empty() {
            return cell.to_owned();
        }

        let mut out = String::with_capacity(cell.len());
        let mut i = 0;
        while i < cell.len() {
            let rest = &cell[i..];
            if rest.starts_with(self.escape.as_str()) {
                let after = &rest[self.escape.len()..];
                let escaped = [self.delimiter.as_str(), self.escape.as_str()]
                    .into_iter()
                    .find(|token| after.starts_with(token));
                if let Some(token) = escaped {
                    out.push_str(token);
                    i += self.escape.len() + token.len();
                    continue;
                }
            }
            let c = next_char(rest);
            out.push(c);
            i += c.len_utf8();
        }
        out
    }

    fn escape_into(&self, cell: &str, out: &mut String) {
        let mut i = 0;
        while i < cell.len() {
            let rest = &cell[i..];
            let token = [self.delimiter.as_str(), self.escape.as_str()]
                .into_iter()
                .find(|token| !token.is_empty() && rest.starts_with(token));
            match token {
                Some(token) => {
                    out.push_str(&self.escape);
                    out.push_str(token);
                    i += token.len();
                }
                None => {
                    let c = next_char(rest);
                    out.push(c);
                    i += c.len_utf8();
                }
            }
        }
    }
}

/// First char of a non-empty string.
fn next_char(text: &str) -> char {
    text.chars().next().unwrap_or_default()
}

impl DataFormat for DelimitedFormat {
    fn decode(&mut self, line: &str) -> Decoded {
        let mut row = Row::new();
        if line.is_empty() {
            return Decoded::Row(row);
        }

        let mut start = 0;
        let mut i = 0;
        let mut escaped = false;

        while i < line.len() {
            let rest = &line[i..];
            if rest.starts_with(self.delimiter.as_str()) {
                if escaped {
                    escaped = false;
                } else {
                    row.add(self.unescape(&line[start..i]));
                    start = i + self.delimiter.len();
                }
                i += self.delimiter.len();
            } else if self.is_escape_at(rest) {
                escaped = !escaped;
                i += self.escape.len();
            } else {
                i += next_char(rest).len_utf8();
            }
        }
        row.add(self.unescape(&line[start..]));

        Decoded::Row(row)
    }

    fn encode(&self, row: &Row) -> String {
        let mut out = String::new();
        for (i, cell) in row.values().enumerate() {
            if i > 0 {
                out.push_str(&self.delimiter);
            }
            match cell {
                None => out.push_str("null"),
                Some(value) if self.escape.is_empty() => {
                    if value.contains(self.delimiter.as_str()) {
                        warn!("Cell {value:?} contains the delimiter and no escape sequence is set");
                    }
                    out.push_str(value);
                }
                Some(value) => self.escape_into(value, &mut out),
            }
        }
        out
    }
}

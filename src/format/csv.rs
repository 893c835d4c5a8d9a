use std::borrow::Cow;

use log::trace;

use crate::core::{
    format::{DataFormat, Decoded},
    row::Row,
};

const QUOTE: char = '"';
const COMMA: char = ',';
const NEW_LINE: char = '\n';

/// Comma separated values.
///
/// Cells that contain a quote, a comma or a line break, and cells starting
/// with whitespace, are wrapped in double quotes with inner quotes doubled.
/// A quoted cell may span several physical lines: [`CsvFormat::decode`]
/// then answers [`Decoded::Incomplete`] and buffers the partial record until
/// the quote is closed. There is no limit on how much is buffered.
///
/// # Examples
///
/// ```
/// use datafile::core::format::{DataFormat, Decoded};
/// use datafile::format::csv::CsvFormat;
///
/// let mut csv = CsvFormat::new();
///
/// assert_eq!(csv.decode(r#"a,"b"#), Decoded::Incomplete);
/// let row = csv.decode(r#"c""#).into_row().unwrap();
/// assert_eq!(row.get(1), "b\nc");
///
/// assert_eq!(csv.encode(&row), "a,\"b\nc\"");
/// ```
#[derive(Debug, Default)]
pub struct CsvFormat {
    pending: Option<Pending>,
}

/// A record whose last cell is still inside an open quote.
#[derive(Debug)]
struct Pending {
    row: Row,
    remainder: String,
}

impl CsvFormat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a multi-line record is being buffered.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl DataFormat for CsvFormat {
    fn decode(&mut self, line: &str) -> Decoded {
        let (mut row, text) = match self.pending.take() {
            Some(Pending { row, mut remainder }) => {
                remainder.push(NEW_LINE);
                remainder.push_str(line);
                (row, Cow::Owned(remainder))
            }
            None => (Row::new(), Cow::Borrowed(line)),
        };

        let mut offset = 0;
        let mut paired = true;

        // QUOTE and COMMA are ASCII, so every split lands on a char boundary
        for (i, byte) in text.bytes().enumerate() {
            if byte == QUOTE as u8 {
                paired = !paired;
            } else if byte == COMMA as u8 && paired {
                row.add(decode_cell(&text[offset..i]));
                offset = i + 1;
            }
        }

        if !paired {
            trace!("Quoted cell continues past line: {line:?}");
            self.pending = Some(Pending {
                row,
                remainder: text[offset..].to_owned(),
            });
            return Decoded::Incomplete;
        }

        if offset < text.len() {
            row.add(decode_cell(&text[offset..]));
        } else if offset > 0 {
            // the line ends with a delimiter
            row.add_empty();
        }

        Decoded::Row(row)
    }

    fn encode(&self, row: &Row) -> String {
        let mut out = String::new();
        for (i, cell) in row.values().enumerate() {
            if i > 0 {
                out.push(COMMA);
            }
            encode_cell(cell, &mut out);
        }
        out
    }

    fn reset(&mut self) {
        self.pending = None;
    }
}

/// Strips leading whitespace and, for a quoted cell, the surrounding quotes
/// and the doubling of inner quotes.
fn decode_cell(span: &str) -> String {
    let span = span.trim_start();

    let quoted = span.len() >= 2 && span.starts_with(QUOTE) && span.ends_with(QUOTE);
    if !quoted {
        return span.to_owned();
    }

    let inner = &span[1..span.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == QUOTE {
            // keep the character following a quote, normally the second quote of a pair
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn encode_cell(cell: Option<&str>, out: &mut String) {
    let Some(value) = cell else {
        out.push_str("null");
        return;
    };

    let needs_quotes = value.contains([QUOTE, COMMA, NEW_LINE])
        || value.chars().next().is_some_and(char::is_whitespace);

    if !needs_quotes {
        out.push_str(value);
        return;
    }

    out.push(QUOTE);
    for c in value.chars() {
        if c == QUOTE {
            out.push(QUOTE);
        }
        out.push(c);
    }
    out.push(QUOTE);
}

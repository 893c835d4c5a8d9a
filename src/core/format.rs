use std::fmt::Debug;

use crate::core::row::Row;

/// Outcome of decoding one physical line.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// The line (together with any buffered lines) completed a row.
    Row(Row),
    /// The record continues on the next physical line.
    Incomplete,
}

impl Decoded {
    /// Returns the completed row, if any.
    pub fn into_row(self) -> Option<Row> {
        match self {
            Decoded::Row(row) => Some(row),
            Decoded::Incomplete => None,
        }
    }

    pub fn is_incomplete(&self) -> bool {
        matches!(self, Decoded::Incomplete)
    }
}

/// Encoding of a row as one physical line of text, and back.
///
/// A format may keep state between calls to [`DataFormat::decode`] when a
/// record spans several physical lines (a quoted CSV cell containing a
/// newline). Such formats answer [`Decoded::Incomplete`] until the record
/// is terminated. A format instance follows a single line stream; the data
/// file calls [`DataFormat::reset`] whenever it starts a new one.
pub trait DataFormat: Debug {
    /// Decodes one physical line, without its line terminator.
    fn decode(&mut self, line: &str) -> Decoded;

    /// Encodes `row` as one line, without a line terminator.
    fn encode(&self, row: &Row) -> String;

    /// Drops any partially decoded record.
    fn reset(&mut self) {}
}

impl<F: DataFormat + ?Sized> DataFormat for Box<F> {
    fn decode(&mut self, line: &str) -> Decoded {
        (**self).decode(line)
    }

    fn encode(&self, row: &Row) -> String {
        (**self).encode(row)
    }

    fn reset(&mut self) {
        (**self).reset();
    }
}

//! Data files: a line format driven over a stream of physical lines.
//!
//! A [`reader::DataFileReader`] pulls lines from a [`BufRead`](std::io::BufRead)
//! source and hands them to its [`DataFormat`](crate::core::format::DataFormat)
//! until a row is complete. A [`writer::DataFileWriter`] vends empty rows to
//! fill and writes each one when the next is requested, or when the file is
//! closed.
//!
//! Both are configured with a builder and share the [`DataFile`] lifecycle:
//! `open` binds a stream and resets the session (header index, buffered
//! record), `close` flushes what is pending and releases the stream. An
//! instance can be opened again after it has been closed.
//!
//! # Examples
//!
//! ```
//! use datafile::file::{DataFile, reader::DataFileReaderBuilder, writer::DataFileWriterBuilder};
//!
//! let mut buffer = Vec::new();
//! {
//!     let mut writer = DataFileWriterBuilder::new()
//!         .headers(["name", "qty"])
//!         .from_writer(&mut buffer)
//!         .unwrap();
//!
//!     let row = writer.next_row().unwrap();
//!     row.add("bolts, 5mm");
//!     row.add_int(40);
//!
//!     writer.close().unwrap();
//! }
//! assert_eq!(String::from_utf8(buffer.clone()).unwrap(), "name,qty\n\"bolts, 5mm\",40\n");
//!
//! let mut reader = DataFileReaderBuilder::new()
//!     .has_headers(true)
//!     .from_reader(buffer.as_slice())
//!     .unwrap();
//!
//! assert_eq!(reader.header_list(), ["name", "qty"]);
//! let row = reader.next_row().unwrap().unwrap();
//! assert_eq!(row.get_by_name("name"), "bolts, 5mm");
//! assert_eq!(row.get_int_by_name("qty").unwrap(), 40);
//! assert!(reader.next_row().unwrap().is_none());
//! ```

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

use crate::error::{DataFileError, DataFileResult};

/// Reading rows from a line source.
pub mod reader;

/// Writing rows to a line sink.
pub mod writer;

/// Lifecycle shared by data file readers and writers.
pub trait DataFile {
    /// The source or sink the file is bound to while open.
    type Stream;

    /// Binds the file to `stream`, closing any previous session first.
    ///
    /// # Errors
    ///
    /// Returns an error when the configured encoding is unusable or when
    /// the header row cannot be read or written.
    fn open(&mut self, stream: Self::Stream) -> DataFileResult<()>;

    /// Flushes pending output and releases the stream and header index.
    ///
    /// Rows handed out during the session stop resolving column labels.
    /// Closing a file that is not open does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error when pending output cannot be written.
    fn close(&mut self) -> DataFileResult<()>;

    fn is_open(&self) -> bool;

    /// Whether the first row holds column labels.
    fn has_headers(&self) -> bool;

    /// Column labels in file order; empty when the file has no header row
    /// or is not open.
    fn header_list(&self) -> &[String];
}

/// Line terminator emitted by writers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Resolves an encoding label such as `"iso-8859-2"` or `"utf-8"`.
///
/// # Errors
///
/// Returns [`DataFileError::Configuration`] for unknown labels and for
/// encodings that are not ASCII compatible.
///
/// # Examples
///
/// ```
/// use datafile::file::encoding_for_label;
///
/// assert_eq!(encoding_for_label("latin2").unwrap().name(), "ISO-8859-2");
/// assert!(encoding_for_label("utf-16le").is_err());
/// assert!(encoding_for_label("klingon").is_err());
/// ```
pub fn encoding_for_label(label: &str) -> DataFileResult<&'static Encoding> {
    let encoding = Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
        DataFileError::Configuration(format!("unknown character encoding `{label}`"))
    })?;
    check_encoding(encoding)?;
    Ok(encoding)
}

/// Lines are split on the byte `\n`, which only works for ASCII compatible encodings.
pub(crate) fn check_encoding(encoding: &'static Encoding) -> DataFileResult<()> {
    if encoding.is_ascii_compatible() {
        Ok(())
    } else {
        Err(DataFileError::Configuration(format!(
            "character encoding `{}` is not ASCII compatible",
            encoding.name()
        )))
    }
}

use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::Path,
    sync::Arc,
};

use encoding_rs::{Encoding, UTF_8};
use log::{debug, warn};

use crate::{
    core::{format::DataFormat, header::HeaderIndex, number::NumberFormat, row::Row},
    error::{DataFileError, DataFileResult},
    file::{DataFile, LineEnding, check_encoding},
    format::csv::CsvFormat,
};

/// Writes rows to a line sink through a [`DataFormat`].
///
/// Rows are written lazily: [`DataFileWriter::next_row`] hands out an empty
/// row to fill and writes the row handed out before it. The last row is
/// written by [`DataFile::close`], unless it was left empty.
///
/// With headers enabled, the column labels come either from
/// [`DataFileWriterBuilder::headers`], written as soon as the file is opened,
/// or from the first row written.
///
/// Dropping an open writer releases the sink without writing the pending row;
/// call [`DataFile::close`] or [`DataFileWriter::finish`] first.
///
/// # Type Parameters
///
/// - `W`: The line sink. Must implement `Write`; files opened by path use
///   `BufWriter<File>`.
///
/// # Examples
///
/// ```
/// use datafile::core::number::NumberFormat;
/// use datafile::file::writer::DataFileWriterBuilder;
///
/// let mut writer = DataFileWriterBuilder::new()
///     .headers(["city", "population"])
///     .number_format(NumberFormat::english())
///     .from_writer(Vec::new())
///     .unwrap();
///
/// let row = writer.next_row().unwrap();
/// row.add("Lyon");
/// row.add_int(522_250);
///
/// let row = writer.next_row().unwrap();
/// row.add("Saint-Étienne");
/// row.add_int(173_089);
///
/// let output = writer.finish().unwrap();
/// assert_eq!(
///     String::from_utf8(output).unwrap(),
///     "city,population\nLyon,522250\nSaint-Étienne,173089\n"
/// );
/// ```
#[derive(Debug)]
pub struct DataFileWriter<W: Write = BufWriter<File>> {
    sink: Option<W>,
    format: Box<dyn DataFormat>,
    encoding: &'static Encoding,
    has_headers: bool,
    headers: Option<Vec<String>>,
    number_format: NumberFormat,
    line_ending: LineEnding,
    append: bool,
    header: Option<Arc<HeaderIndex>>,
    row: Option<Row>,
}

impl<W: Write> DataFileWriter<W> {
    /// Writes the pending row, if any, and returns a cleared row to fill.
    ///
    /// A pending row with no cells is written as a blank line. The returned
    /// row uses the number format of this writer and, once known, its header
    /// index, so cells can be looked up by name.
    ///
    /// # Errors
    ///
    /// - [`DataFileError::NotOpen`] when the file is not open
    /// - [`DataFileError::Io`] when the pending row cannot be written
    pub fn next_row(&mut self) -> DataFileResult<&mut Row> {
        if self.sink.is_none() {
            return Err(DataFileError::NotOpen);
        }

        if let Some(previous) = &self.row {
            let line = if previous.is_empty() {
                String::new()
            } else {
                self.format.encode(previous)
            };
            let labels = (self.has_headers && self.header.is_none())
                .then(|| previous.iter().map(str::to_owned).collect::<Vec<_>>());

            self.write_line(&line)?;

            if let Some(labels) = labels {
                debug!("Header row: {labels:?}");
                self.header = Some(Arc::new(HeaderIndex::new(labels)));
            }
        }

        let header = self.header.clone();
        let number_format = self.number_format;
        let row = self
            .row
            .get_or_insert_with(|| Row::with_number_format(number_format));
        row.clear();
        row.set_number_format(number_format);
        row.set_header_index(header);
        Ok(row)
    }

    /// The row handed out by the last call to [`DataFileWriter::next_row`].
    pub fn current_row(&mut self) -> Option<&mut Row> {
        self.row.as_mut()
    }

    pub fn number_format(&self) -> &NumberFormat {
        &self.number_format
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Closes the file and returns the sink.
    ///
    /// # Errors
    ///
    /// - [`DataFileError::NotOpen`] when the file is not open
    /// - [`DataFileError::Io`] when the pending row cannot be written
    pub fn finish(mut self) -> DataFileResult<W> {
        self.write_pending()?;
        self.detach_header();
        let mut sink = self.sink.take().ok_or(DataFileError::NotOpen)?;
        sink.flush()?;
        Ok(sink)
    }

    /// Writes the last row handed out unless it has no cells.
    fn write_pending(&mut self) -> DataFileResult<()> {
        match self.row.take() {
            Some(row) if !row.is_empty() => {
                let line = self.format.encode(&row);
                self.write_line(&line)
            }
            _ => Ok(()),
        }
    }

    fn detach_header(&mut self) {
        if let Some(header) = self.header.take() {
            header.detach();
        }
    }

    fn write_line(&mut self, line: &str) -> DataFileResult<()> {
        let sink = self.sink.as_mut().ok_or(DataFileError::NotOpen)?;

        let (bytes, _, unmappable) = self.encoding.encode(line);
        if unmappable {
            warn!(
                "Line {line:?} has characters that {} cannot represent",
                self.encoding.name()
            );
        }
        sink.write_all(&bytes)?;
        sink.write_all(self.line_ending.as_str().as_bytes())?;
        Ok(())
    }
}

impl DataFileWriter<BufWriter<File>> {
    /// Opens the file at `path` for writing, creating it when missing.
    ///
    /// An existing file is truncated unless the writer appends.
    ///
    /// # Errors
    ///
    /// Returns [`DataFileError::Io`] when the file cannot be opened, and any
    /// error of [`DataFile::open`].
    pub fn open_path<P: AsRef<Path>>(&mut self, path: P) -> DataFileResult<()> {
        let path = path.as_ref();
        debug!(
            "Opening {} for {}",
            path.display(),
            if self.append { "appending" } else { "writing" }
        );

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(self.append)
            .truncate(!self.append)
            .open(path)?;
        self.open(BufWriter::new(file))
    }
}

impl<W: Write> DataFile for DataFileWriter<W> {
    type Stream = W;

    fn open(&mut self, sink: W) -> DataFileResult<()> {
        if self.is_open() {
            self.close()?;
        }
        check_encoding(self.encoding)?;

        self.header = None;
        self.row = None;
        self.sink = Some(sink);

        if let Some(labels) = self.headers.clone() {
            let row: Row = labels.iter().map(String::as_str).collect();
            let line = self.format.encode(&row);
            self.write_line(&line)?;
            self.header = Some(Arc::new(HeaderIndex::new(labels)));
        }
        Ok(())
    }

    fn close(&mut self) -> DataFileResult<()> {
        let written = self.write_pending();
        self.detach_header();

        let Some(mut sink) = self.sink.take() else {
            return written;
        };
        written?;
        sink.flush()?;
        debug!("Closed data file");
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.sink.is_some()
    }

    fn has_headers(&self) -> bool {
        self.has_headers
    }

    fn header_list(&self) -> &[String] {
        self.header
            .as_deref()
            .map(HeaderIndex::names)
            .unwrap_or_default()
    }
}

impl<W: Write> Drop for DataFileWriter<W> {
    fn drop(&mut self) {
        if self.sink.is_some() && self.row.as_ref().is_some_and(|row| !row.is_empty()) {
            warn!("Data file dropped while open, the last row was not written");
        }
    }
}

/// A builder for configuring data file writing.
///
/// # Default Configuration
///
/// - Format: [`CsvFormat`]
/// - Headers: disabled
/// - Number format: [`NumberFormat::default`], taken from the process locale
/// - Encoding: UTF-8
/// - Line ending: `\n`
/// - Existing files are truncated
///
/// # Examples
///
/// ```no_run
/// use datafile::file::{DataFile, LineEnding, writer::DataFileWriterBuilder};
/// use datafile::format::simple::TabFormat;
///
/// let mut writer = DataFileWriterBuilder::new()
///     .format(TabFormat)
///     .line_ending(LineEnding::CrLf)
///     .append(true)
///     .from_path("audit.tsv")
///     .unwrap();
///
/// let row = writer.next_row().unwrap();
/// row.add("2024-03-01");
/// row.add("login");
///
/// writer.close().unwrap();
/// ```
#[derive(Debug)]
pub struct DataFileWriterBuilder {
    format: Option<Box<dyn DataFormat>>,
    encoding: &'static Encoding,
    has_headers: bool,
    headers: Option<Vec<String>>,
    number_format: Option<NumberFormat>,
    line_ending: LineEnding,
    append: bool,
}

impl Default for DataFileWriterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DataFileWriterBuilder {
    pub fn new() -> Self {
        Self {
            format: None,
            encoding: UTF_8,
            has_headers: false,
            headers: None,
            number_format: None,
            line_ending: LineEnding::default(),
            append: false,
        }
    }

    /// Sets the line format (default: CSV).
    pub fn format<F: DataFormat + 'static>(mut self, format: F) -> Self {
        self.format = Some(Box::new(format));
        self
    }

    /// Sets whether the first row written holds column labels (default: false).
    pub fn has_headers(mut self, yes: bool) -> Self {
        self.has_headers = yes;
        self
    }

    /// Sets the column labels written when the file is opened.
    ///
    /// Implies [`DataFileWriterBuilder::has_headers`].
    pub fn headers<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.has_headers = true;
        self.headers = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the number format used by the rows handed out.
    pub fn number_format(mut self, number_format: NumberFormat) -> Self {
        self.number_format = Some(number_format);
        self
    }

    /// Sets the character encoding of the output (default: UTF-8).
    pub fn encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Sets whether files opened by path are appended to (default: false).
    pub fn append(mut self, yes: bool) -> Self {
        self.append = yes;
        self
    }

    /// Builds a writer that is not open yet.
    pub fn build<W: Write>(self) -> DataFileWriter<W> {
        DataFileWriter {
            sink: None,
            format: self.format.unwrap_or_else(|| Box::new(CsvFormat::new())),
            encoding: self.encoding,
            has_headers: self.has_headers,
            headers: self.headers,
            number_format: self.number_format.unwrap_or_default(),
            line_ending: self.line_ending,
            append: self.append,
            header: None,
            row: None,
        }
    }

    /// Builds a writer and opens it on `sink`.
    ///
    /// # Errors
    ///
    /// See [`DataFile::open`].
    pub fn from_writer<W: Write>(self, sink: W) -> DataFileResult<DataFileWriter<W>> {
        let mut writer = self.build();
        writer.open(sink)?;
        Ok(writer)
    }

    /// Builds a writer and opens the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DataFileError::Io`] when the file cannot be opened, and any
    /// error of [`DataFile::open`].
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> DataFileResult<DataFileWriter> {
        let mut writer = self.build();
        writer.open_path(path)?;
        Ok(writer)
    }
}

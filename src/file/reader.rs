use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    sync::Arc,
};

use encoding_rs::{Encoding, UTF_8};
use log::{debug, trace};

use crate::{
    core::{
        format::{DataFormat, Decoded},
        header::HeaderIndex,
        number::NumberFormat,
        row::Row,
    },
    error::{DataFileError, DataFileResult},
    file::{DataFile, check_encoding},
    format::csv::CsvFormat,
};

/// Reads rows from a line source through a [`DataFormat`].
///
/// Each call to [`DataFileReader::next_row`] reads physical lines until the
/// format completes a row, so a quoted CSV cell may span several lines. With
/// headers enabled, the first row is consumed when the file is opened and its
/// cells become the column labels of every row that follows.
///
/// Lines are split on `\n`; a trailing `\r` is dropped. Bytes are decoded with
/// the configured encoding, and invalid sequences are replaced rather than
/// reported.
///
/// # Type Parameters
///
/// - `R`: The line source. Must implement `BufRead`; files opened by path use
///   `BufReader<File>`.
///
/// # Examples
///
/// ```
/// use datafile::file::{DataFile, reader::DataFileReaderBuilder};
///
/// let data = "\
/// id,name
/// 1,\"Smith, John\"
/// 2,\"multi
/// line\"
/// ";
///
/// let mut reader = DataFileReaderBuilder::new()
///     .has_headers(true)
///     .from_reader(data.as_bytes())
///     .unwrap();
///
/// let row = reader.next_row().unwrap().unwrap();
/// assert_eq!(row.get_int_by_name("id").unwrap(), 1);
/// assert_eq!(row.get_by_name("name"), "Smith, John");
///
/// let row = reader.next_row().unwrap().unwrap();
/// assert_eq!(row.get(1), "multi\nline");
///
/// assert!(reader.next_row().unwrap().is_none());
/// reader.close().unwrap();
/// ```
#[derive(Debug)]
pub struct DataFileReader<R = BufReader<File>> {
    source: Option<R>,
    format: Box<dyn DataFormat>,
    encoding: &'static Encoding,
    has_headers: bool,
    number_format: NumberFormat,
    header: Option<Arc<HeaderIndex>>,
    row: Option<Row>,
    line_number: usize,
    buffer: Vec<u8>,
}

impl<R: BufRead> DataFileReader<R> {
    /// Reads the next row.
    ///
    /// The returned row carries the header index of this file and its number
    /// format. It stays available through [`DataFileReader::current_row`]
    /// until the next call.
    ///
    /// # Returns
    /// - `Ok(Some(row))` when a row was read
    /// - `Ok(None)` at the end of the source
    ///
    /// # Errors
    ///
    /// - [`DataFileError::NotOpen`] when the file is not open
    /// - [`DataFileError::MalformedRecord`] when the source ends inside a
    ///   record that spans several lines
    /// - [`DataFileError::Io`] when the source fails
    pub fn next_row(&mut self) -> DataFileResult<Option<&Row>> {
        self.row = None;
        self.row = self.read_record()?;
        Ok(self.row.as_ref())
    }

    /// The row returned by the last call to [`DataFileReader::next_row`].
    pub fn current_row(&self) -> Option<&Row> {
        self.row.as_ref()
    }

    /// Iterates over the remaining rows, yielding owned copies.
    ///
    /// The iterator stops after the first error.
    ///
    /// # Examples
    ///
    /// ```
    /// use datafile::file::reader::DataFileReaderBuilder;
    ///
    /// let mut reader = DataFileReaderBuilder::new()
    ///     .from_reader("1,2\n3,4\n".as_bytes())
    ///     .unwrap();
    ///
    /// let sums: Vec<i64> = reader
    ///     .rows()
    ///     .map(|row| {
    ///         let row = row.unwrap();
    ///         row.get_int(0).unwrap() + row.get_int(1).unwrap()
    ///     })
    ///     .collect();
    ///
    /// assert_eq!(sums, vec![3, 7]);
    /// ```
    pub fn rows(&mut self) -> Rows<'_, R> {
        Rows {
            reader: self,
            done: false,
        }
    }

    /// Number of physical lines read since the file was opened, header included.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn number_format(&self) -> &NumberFormat {
        &self.number_format
    }

    /// Reads lines until the format completes a row.
    fn read_record(&mut self) -> DataFileResult<Option<Row>> {
        let first_line = self.line_number + 1;
        let mut incomplete = false;

        while let Some(line) = self.read_line()? {
            match self.format.decode(&line) {
                Decoded::Row(mut row) => {
                    row.set_number_format(self.number_format);
                    row.set_header_index(self.header.clone());
                    return Ok(Some(row));
                }
                Decoded::Incomplete => {
                    trace!("Record starting at line {first_line} continues past line {}", self.line_number);
                    incomplete = true;
                }
            }
        }

        if incomplete {
            return Err(DataFileError::MalformedRecord(format!(
                "record starting at line {first_line} is not terminated at the end of the input"
            )));
        }
        Ok(None)
    }

    /// Reads one physical line without its terminator.
    fn read_line(&mut self) -> DataFileResult<Option<String>> {
        let source = self.source.as_mut().ok_or(DataFileError::NotOpen)?;

        self.buffer.clear();
        if source.read_until(b'\n', &mut self.buffer)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        if self.buffer.last() == Some(&b'\n') {
            self.buffer.pop();
            if self.buffer.last() == Some(&b'\r') {
                self.buffer.pop();
            }
        }

        let line = if self.line_number == 1 {
            self.encoding.decode_with_bom_removal(&self.buffer).0
        } else {
            self.encoding.decode_without_bom_handling(&self.buffer).0
        };
        Ok(Some(line.into_owned()))
    }
}

impl DataFileReader<BufReader<File>> {
    /// Opens the file at `path` for reading.
    ///
    /// # Errors
    ///
    /// Returns [`DataFileError::Io`] when the file cannot be opened, and any
    /// error of [`DataFile::open`].
    pub fn open_path<P: AsRef<Path>>(&mut self, path: P) -> DataFileResult<()> {
        let path = path.as_ref();
        debug!("Opening {} for reading", path.display());
        let file = File::open(path)?;
        self.open(BufReader::new(file))
    }
}

impl<R: BufRead> DataFile for DataFileReader<R> {
    type Stream = R;

    fn open(&mut self, source: R) -> DataFileResult<()> {
        if self.is_open() {
            self.close()?;
        }
        check_encoding(self.encoding)?;

        self.format.reset();
        self.header = None;
        self.row = None;
        self.line_number = 0;
        self.source = Some(source);

        if self.has_headers {
            let names: Vec<String> = match self.read_record() {
                Ok(Some(row)) => row.iter().map(str::to_owned).collect(),
                Ok(None) => Vec::new(),
                Err(error) => {
                    self.source = None;
                    self.format.reset();
                    return Err(error);
                }
            };
            debug!("Header row: {names:?}");
            self.header = Some(Arc::new(HeaderIndex::new(names)));
        }
        Ok(())
    }

    fn close(&mut self) -> DataFileResult<()> {
        if let Some(header) = self.header.take() {
            header.detach();
        }
        self.row = None;
        self.format.reset();
        if self.source.take().is_some() {
            debug!("Closed data file after {} lines", self.line_number);
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.source.is_some()
    }

    fn has_headers(&self) -> bool {
        self.has_headers
    }

    fn header_list(&self) -> &[String] {
        self.header.as_deref().map(HeaderIndex::names).unwrap_or_default()
    }
}

/// Iterator returned by [`DataFileReader::rows`].
pub struct Rows<'a, R> {
    reader: &'a mut DataFileReader<R>,
    done: bool,
}

impl<R: BufRead> Iterator for Rows<'_, R> {
    type Item = DataFileResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.reader.read_record().transpose();
        if !matches!(next, Some(Ok(_))) {
            self.done = true;
        }
        next
    }
}

/// A builder for configuring data file reading.
///
/// # Default Configuration
///
/// - Format: [`CsvFormat`]
/// - Headers: disabled
/// - Number format: [`NumberFormat::default`], taken from the process locale
/// - Encoding: UTF-8
///
/// # Examples
///
/// ```
/// use datafile::core::number::NumberFormat;
/// use datafile::file::{DataFile, encoding_for_label, reader::DataFileReaderBuilder};
/// use datafile::format::delimited::DelimitedFormat;
///
/// let mut reader = DataFileReaderBuilder::new()
///     .format(DelimitedFormat::new(";", "").unwrap())
///     .number_format(NumberFormat::for_locale("de-DE"))
///     .encoding(encoding_for_label("iso-8859-1").unwrap())
///     .has_headers(true)
///     .from_reader(&b"Artikel;Preis\nM\xfcsli;3,5\n"[..])
///     .unwrap();
///
/// let row = reader.next_row().unwrap().unwrap();
/// assert_eq!(row.get_by_name("Artikel"), "Müsli");
/// assert_eq!(row.get_double_by_name("Preis").unwrap(), 3.5);
/// ```
#[derive(Debug)]
pub struct DataFileReaderBuilder {
    format: Option<Box<dyn DataFormat>>,
    encoding: &'static Encoding,
    has_headers: bool,
    number_format: Option<NumberFormat>,
}

impl Default for DataFileReaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DataFileReaderBuilder {
    pub fn new() -> Self {
        Self {
            format: None,
            encoding: UTF_8,
            has_headers: false,
            number_format: None,
        }
    }

    /// Sets the line format (default: CSV).
    pub fn format<F: DataFormat + 'static>(mut self, format: F) -> Self {
        self.format = Some(Box::new(format));
        self
    }

    /// Sets whether the first row holds column labels (default: false).
    pub fn has_headers(mut self, yes: bool) -> Self {
        self.has_headers = yes;
        self
    }

    /// Sets the number format attached to every row read.
    pub fn number_format(mut self, number_format: NumberFormat) -> Self {
        self.number_format = Some(number_format);
        self
    }

    /// Sets the character encoding of the source (default: UTF-8).
    pub fn encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Builds a reader that is not open yet.
    pub fn build<R: BufRead>(self) -> DataFileReader<R> {
        DataFileReader {
            source: None,
            format: self.format.unwrap_or_else(|| Box::new(CsvFormat::new())),
            encoding: self.encoding,
            has_headers: self.has_headers,
            number_format: self.number_format.unwrap_or_default(),
            header: None,
            row: None,
            line_number: 0,
            buffer: Vec::new(),
        }
    }

    /// Builds a reader and opens it on `source`.
    ///
    /// # Errors
    ///
    /// See [`DataFile::open`].
    pub fn from_reader<R: BufRead>(self, source: R) -> DataFileResult<DataFileReader<R>> {
        let mut reader = self.build();
        reader.open(source)?;
        Ok(reader)
    }

    /// Builds a reader and opens the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DataFileError::Io`] when the file cannot be opened, and any
    /// error of [`DataFile::open`].
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> DataFileResult<DataFileReader> {
        let mut reader = self.build();
        reader.open_path(path)?;
        Ok(reader)
    }
}

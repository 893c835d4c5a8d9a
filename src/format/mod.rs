//! Line formats.
//!
//! Every format implements [`DataFormat`](crate::core::format::DataFormat)
//! and can be plugged into a data file reader or writer:
//!
//! | Format | Cells separated by | Escaping | Multi-line records |
//! |--------|--------------------|----------|--------------------|
//! | [`csv::CsvFormat`] | `,` | double quotes | yes |
//! | [`fixed_width::FixedWidthFormat`] | column widths | none | no |
//! | [`delimited::DelimitedFormat`] | any sequence | optional escape sequence | no |
//! | [`simple::TabFormat`] | tab | none | no |
//! | [`simple::ItemPerLineFormat`] | line break | none | no |
//!
//! # Examples
//!
//! ```
//! use datafile::core::format::DataFormat;
//! use datafile::format::{csv::CsvFormat, delimited::DelimitedFormat};
//!
//! let formats: Vec<Box<dyn DataFormat>> = vec![
//!     Box::new(CsvFormat::new()),
//!     Box::new(DelimitedFormat::new(";", "").unwrap()),
//! ];
//!
//! for mut format in formats {
//!     let row = format.decode("1").into_row().unwrap();
//!     assert_eq!(format.encode(&row), "1");
//! }
//! ```

/// Comma separated values with quoting.
pub mod csv;

/// Fixed width columns.
pub mod fixed_width;

/// Arbitrary delimiter with an optional escape sequence.
pub mod delimited;

/// Tab separated and one item per line.
pub mod simple;

#![cfg_attr(docsrs, feature(doc_cfg))]

/*!
 # Data files for Rust

 Read and write line-oriented tabular text files through a single row-based API.
 A data file pairs a stream of physical lines with a line format: the format turns
 one line into a [`Row`](core::row::Row) of text cells and back, the file handles
 headers, encodings and the buffering of records spanning several lines.

 ## Core Concepts

- **Row:** An ordered list of text cells with typed accessors (`get_int`, `get_double`,
  `get_date`) and lookup by column label when the file has a header row.
- **DataFormat:** The codec between one line and one row. Stateful formats (CSV) may ask
  for more lines before a record is complete.
- **DataFileReader / DataFileWriter:** Drive a format over a source or a sink. Writers
  hand out rows to fill and write each one when the next is requested.

 ## Formats

| **Format**          | **Description**                                                    |
|---------------------|--------------------------------------------------------------------|
| `CsvFormat`         | Comma separated values, double quote escaping, multi-line records  |
| `FixedWidthFormat`  | Columns of fixed character widths                                  |
| `DelimitedFormat`   | Any delimiter sequence with an optional escape sequence            |
| `TabFormat`         | Tab separated values without escaping                              |
| `ItemPerLineFormat` | One value per line                                                 |

 ## Features

| **Feature** | **Description**                                        |
|-------------|--------------------------------------------------------|
| date        | Enables `chrono` based date accessors on `Row` (default) |
| full        | Enables all available features                         |

 ## Getting Started

```toml
[dependencies]
datafile-rs = "<version>"
```

Then, on your main.rs:

```rust
use datafile::{
    core::number::NumberFormat,
    file::{DataFile, reader::DataFileReaderBuilder, writer::DataFileWriterBuilder},
    format::fixed_width::FixedWidthFormat,
};

# fn main() -> Result<(), datafile::DataFileError> {
let csv = "\
sku,label,price
A-1,\"Screws, 4mm\",3.50
B-7,Washers,0.25
";

// Read a CSV stream with a header row
let mut reader = DataFileReaderBuilder::new()
    .has_headers(true)
    .number_format(NumberFormat::english())
    .from_reader(csv.as_bytes())?;

// Write the same rows as fixed width columns
let mut writer = DataFileWriterBuilder::new()
    .format(FixedWidthFormat::new(&[5, 12, 6])?)
    .number_format(NumberFormat::english())
    .from_writer(Vec::new())?;

while let Some(row) = reader.next_row()? {
    let price = row.get_double_by_name("price")?;

    let out = writer.next_row()?;
    out.add(row.get_by_name("sku"));
    out.add(row.get_by_name("label"));
    out.add_double(price * 2.0);
}
reader.close()?;

let output = String::from_utf8(writer.finish()?).unwrap();
assert_eq!(output, "A-1  Screws, 4mm 7     \nB-7  Washers     0.5   \n");
# Ok(())
# }
```

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)

 at your option.

 */

/// Rows, header indexes, number formats and the line format abstraction
pub mod core;

/// Error types for data files
pub mod error;

#[doc(inline)]
pub use error::*;

/// Line formats (for exemple: CSV, fixed width)
pub mod format;

/// Data file readers and writers
pub mod file;

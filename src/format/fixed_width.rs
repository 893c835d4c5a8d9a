use crate::{
    core::{
        format::{DataFormat, Decoded},
        row::Row,
    },
    error::{DataFileError, DataFileResult},
};

const SPACE: char = ' ';

/// Columns of fixed character widths, without separators.
///
/// Widths and offsets count characters, not bytes. Decoding trims each
/// column; the last column takes whatever is left of the line. Encoding pads
/// short cells with spaces and truncates long ones.
///
/// # Examples
///
/// ```
/// use datafile::core::{format::DataFormat, row::Row};
/// use datafile::format::fixed_width::FixedWidthFormat;
///
/// let mut format = FixedWidthFormat::new(&[7, 7, 7, 7]).unwrap();
///
/// let row: Row = ["1.2", "3", "5.7865", "123"].into_iter().collect();
/// assert_eq!(format.encode(&row), "1.2    3      5.7865 123    ");
///
/// let row = format.decode("1.2    3").into_row().unwrap();
/// assert_eq!(row.iter().collect::<Vec<_>>(), vec!["1.2", "3", "", ""]);
/// ```
#[derive(Debug, Clone)]
pub struct FixedWidthFormat {
    offsets: Vec<usize>,
    widths: Vec<usize>,
}

impl FixedWidthFormat {
    /// Creates a format from column widths, in column order.
    ///
    /// # Errors
    ///
    /// Returns [`DataFileError::Configuration`] when `widths` is empty or
    /// the widths add up to more than `usize::MAX`.
    pub fn new(widths: &[usize]) -> DataFileResult<Self> {
        if widths.is_empty() {
            return Err(DataFileError::Configuration(
                "fixed width format needs at least one column".to_owned(),
            ));
        }

        let mut offsets = Vec::with_capacity(widths.len());
        let mut start: usize = 0;
        for &width in widths {
            offsets.push(start);
            start = start.checked_add(width).ok_or_else(|| {
                DataFileError::Configuration(format!(
                    "fixed width columns {widths:?} are wider than a line can be"
                ))
            })?;
        }

        Ok(Self {
            offsets,
            widths: widths.to_vec(),
        })
    }

    pub fn widths(&self) -> &[usize] {
        &self.widths
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }
}

impl DataFormat for FixedWidthFormat {
    fn decode(&mut self, line: &str) -> Decoded {
        // byte position of every char, plus the end of the line
        let boundaries: Vec<usize> = line
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(line.len()))
            .collect();
        let char_count = boundaries.len() - 1;
        let last = self.widths.len() - 1;

        let mut row = Row::new();
        for (column, (&start, &width)) in self.offsets.iter().zip(&self.widths).enumerate() {
            if char_count < start {
                row.add_empty();
                continue;
            }
            let end = if column == last {
                char_count
            } else {
                (start + width).min(char_count)
            };
            row.add(line[boundaries[start]..boundaries[end]].trim());
        }

        Decoded::Row(row)
    }

    fn encode(&self, row: &Row) -> String {
        let mut out = String::new();
        for (cell, &width) in row.iter().zip(&self.widths) {
            let length = cell.chars().count();
            if length > width {
                out.extend(cell.chars().take(width));
            } else {
                out.push_str(cell);
                out.extend(std::iter::repeat_n(SPACE, width - length));
            }
        }
        out
    }
}

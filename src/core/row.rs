use std::{fmt, sync::Arc};

#[cfg(feature = "date")]
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer, ser::SerializeSeq};

use crate::{
    core::{header::HeaderIndex, number::NumberFormat},
    error::{DataFileError, DataFileResult},
};

/// One record of a data file: an ordered list of text cells.
///
/// Cells are stored as text whatever the file format. Numeric and date
/// accessors coerce on demand; string accessors never fail and report a
/// missing cell as an empty string. Rows produced by a file opened with a
/// header row also resolve cells by column label, until that file is closed.
///
/// A cell may be absent (`null`), which is distinct from an empty string
/// only when the row is encoded: codecs that support it emit the literal
/// text `null`.
///
/// # Examples
///
/// ```
/// use datafile::core::{number::NumberFormat, row::Row};
///
/// let mut row = Row::with_number_format(NumberFormat::english());
/// row.add("widget");
/// row.add_int(3);
/// row.add(" 5-");
/// row.add("*2");
///
/// assert_eq!(row.len(), 4);
/// assert_eq!(row.get(0), "widget");
/// assert_eq!(row.get(9), "");
/// assert_eq!(row.get_int(1).unwrap(), 3);
/// // trailing minus and leading "*" (times ten) are legacy spellings
/// assert_eq!(row.get_int(2).unwrap(), -5);
/// assert_eq!(row.get_int(3).unwrap(), 20);
/// assert!(row.get_int(0).is_err());
/// assert_eq!(row.get_int_or(0, -1), -1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Row {
    cells: Vec<Option<String>>,
    header: Option<Arc<HeaderIndex>>,
    number_format: NumberFormat,
}

impl Row {
    /// Creates an empty row using the process locale's number format.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_number_format(number_format: NumberFormat) -> Self {
        Self {
            cells: Vec::new(),
            header: None,
            number_format,
        }
    }

    pub fn add<S: Into<String>>(&mut self, value: S) {
        self.cells.push(Some(value.into()));
    }

    /// Appends an integer formatted with the row's number format.
    pub fn add_int(&mut self, value: i64) {
        self.cells.push(Some(self.number_format.format_i64(value)));
    }

    /// Appends a floating point value formatted with the row's number format.
    pub fn add_double(&mut self, value: f64) {
        self.cells.push(Some(self.number_format.format_f64(value)));
    }

    pub fn add_display<T: fmt::Display + ?Sized>(&mut self, value: &T) {
        self.cells.push(Some(value.to_string()));
    }

    /// Appends an empty cell (spacer).
    pub fn add_empty(&mut self) {
        self.cells.push(Some(String::new()));
    }

    /// Appends an absent value.
    pub fn add_null(&mut self) {
        self.cells.push(None);
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Removes every cell, keeping the header index and number format.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Read-only view of the cells, `None` standing for absent values.
    pub fn values(&self) -> impl ExactSizeIterator<Item = Option<&str>> + '_ {
        self.cells.iter().map(Option::as_deref)
    }

    /// Iterates over the cells as text, absent values read as `""`.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.cells.iter().map(|cell| cell.as_deref().unwrap_or_default())
    }

    pub fn is_null(&self, position: usize) -> bool {
        matches!(self.cells.get(position), Some(None))
    }

    /// Text at `position`, or `""` when there is no such cell.
    pub fn get(&self, position: usize) -> &str {
        self.cells
            .get(position)
            .and_then(Option::as_deref)
            .unwrap_or_default()
    }

    /// Text at `position`, or `default` when the cell is missing or empty.
    pub fn get_or<'a>(&'a self, position: usize, default: &'a str) -> &'a str {
        match self.get(position) {
            "" => default,
            value => value,
        }
    }

    /// Text under the column labelled `name`, or `""` when there is no such column.
    pub fn get_by_name(&self, name: &str) -> &str {
        self.position(name)
            .map_or("", |position| self.get(position))
    }

    pub fn get_by_name_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.position(name)
            .map_or(default, |position| self.get_or(position, default))
    }

    /// Position of the column labelled `name` in the attached header index.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.header.as_ref()?.position(name)
    }

    /// Integer at `position`.
    ///
    /// The cell is trimmed, a trailing minus sign is moved to the front and a
    /// leading `*` multiplies the value by ten. The text is then parsed with the row's
    /// number format and, failing that, as a plain integer literal.
    ///
    /// # Errors
    ///
    /// Returns [`DataFileError::NumberFormat`] when neither parse succeeds.
    pub fn get_int(&self, position: usize) -> DataFileResult<i64> {
        coerce_int(&self.number_format, self.get(position))
    }

    pub fn get_int_or(&self, position: usize, default: i64) -> i64 {
        self.get_int(position).unwrap_or(default)
    }

    /// Integer at `position` parsed with `number_format` instead of the row's own.
    pub fn get_int_with(&self, position: usize, number_format: &NumberFormat, default: i64) -> i64 {
        coerce_int(number_format, self.get(position)).unwrap_or(default)
    }

    /// Integer under the column labelled `name`.
    ///
    /// # Errors
    ///
    /// Returns [`DataFileError::NumberFormat`] when the column does not exist
    /// or its value cannot be parsed.
    pub fn get_int_by_name(&self, name: &str) -> DataFileResult<i64> {
        self.get_int(self.require_position(name)?)
    }

    pub fn get_int_by_name_or(&self, name: &str, default: i64) -> i64 {
        self.position(name)
            .map_or(default, |position| self.get_int_or(position, default))
    }

    /// Floating point value at `position`, coerced like [`Row::get_int`].
    ///
    /// # Errors
    ///
    /// Returns [`DataFileError::NumberFormat`] when the value cannot be parsed.
    pub fn get_double(&self, position: usize) -> DataFileResult<f64> {
        coerce_double(&self.number_format, self.get(position))
    }

    pub fn get_double_or(&self, position: usize, default: f64) -> f64 {
        self.get_double(position).unwrap_or(default)
    }

    pub fn get_double_with(
        &self,
        position: usize,
        number_format: &NumberFormat,
        default: f64,
    ) -> f64 {
        coerce_double(number_format, self.get(position)).unwrap_or(default)
    }

    /// Floating point value under the column labelled `name`.
    ///
    /// # Errors
    ///
    /// Returns [`DataFileError::NumberFormat`] when the column does not exist
    /// or its value cannot be parsed.
    pub fn get_double_by_name(&self, name: &str) -> DataFileResult<f64> {
        self.get_double(self.require_position(name)?)
    }

    pub fn get_double_by_name_or(&self, name: &str, default: f64) -> f64 {
        self.position(name)
            .map_or(default, |position| self.get_double_or(position, default))
    }

    /// Date at `position` parsed with a chrono `pattern` such as `"%Y.%m.%d"`.
    ///
    /// Returns `None` when the trimmed cell does not match the pattern.
    #[cfg(feature = "date")]
    pub fn get_date(&self, position: usize, pattern: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.get(position).trim(), pattern).ok()
    }

    #[cfg(feature = "date")]
    pub fn get_date_by_name(&self, name: &str, pattern: &str) -> Option<NaiveDate> {
        self.get_date(self.position(name)?, pattern)
    }

    /// Date and time at `position` parsed with a chrono `pattern`.
    #[cfg(feature = "date")]
    pub fn get_datetime(&self, position: usize, pattern: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(self.get(position).trim(), pattern).ok()
    }

    #[cfg(feature = "date")]
    pub fn get_datetime_by_name(&self, name: &str, pattern: &str) -> Option<NaiveDateTime> {
        self.get_datetime(self.position(name)?, pattern)
    }

    pub fn header_index(&self) -> Option<&HeaderIndex> {
        self.header.as_deref()
    }

    pub(crate) fn set_header_index(&mut self, header: Option<Arc<HeaderIndex>>) {
        self.header = header;
    }

    pub fn number_format(&self) -> &NumberFormat {
        &self.number_format
    }

    pub fn set_number_format(&mut self, number_format: NumberFormat) {
        self.number_format = number_format;
    }

    fn require_position(&self, name: &str) -> DataFileResult<usize> {
        self.position(name).ok_or_else(|| {
            DataFileError::NumberFormat(format!("no column labelled `{name}` in header"))
        })
    }
}

/// Legacy numeric spellings: `5-` is `-5`, and a leading `*` multiplies by ten
/// (`*3` is `30`, a bare `*` is `10`).
struct Repaired {
    text: String,
    times_ten: bool,
}

fn repair_number(text: &str) -> Repaired {
    let text = match text.strip_suffix('-') {
        Some(rest) => format!("-{rest}"),
        None => text.to_owned(),
    };
    match text.strip_prefix('*') {
        Some("") => Repaired {
            text: "1".to_owned(),
            times_ten: true,
        },
        Some(rest) => Repaired {
            text: rest.to_owned(),
            times_ten: true,
        },
        None => Repaired {
            text,
            times_ten: false,
        },
    }
}

fn coerce_int(number_format: &NumberFormat, raw: &str) -> DataFileResult<i64> {
    let Repaired { text, times_ten } = repair_number(raw.trim());
    number_format
        .parse_i64(&text)
        .or_else(|| text.parse().ok())
        .and_then(|value: i64| if times_ten { value.checked_mul(10) } else { Some(value) })
        .ok_or_else(|| DataFileError::NumberFormat(format!("cannot parse `{raw}` as an integer")))
}

fn coerce_double(number_format: &NumberFormat, raw: &str) -> DataFileResult<f64> {
    let Repaired { text, times_ten } = repair_number(raw.trim());
    number_format
        .parse_f64(&text)
        .or_else(|| text.parse().ok())
        .map(|value: f64| if times_ten { value * 10.0 } else { value })
        .ok_or_else(|| DataFileError::NumberFormat(format!("cannot parse `{raw}` as a number")))
}

/// Rows compare equal when their cells are equal.
impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[Row]")?;
        for cell in &self.cells {
            match cell {
                Some(value) => write!(f, "|'{value}'")?,
                None => f.write_str("|null")?,
            }
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for Row {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut row = Row::new();
        for value in iter {
            row.add(value);
        }
        row
    }
}

impl From<Vec<String>> for Row {
    fn from(cells: Vec<String>) -> Self {
        cells.into_iter().collect()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.cells.len()))?;
        for cell in &self.cells {
            seq.serialize_element(cell)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let cells = Vec::<Option<String>>::deserialize(deserializer)?;
        Ok(Row {
            cells,
            ..Row::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        core::{header::HeaderIndex, number::NumberFormat},
        error::DataFileError,
    };

    use super::Row;

    fn english_row<const N: usize>(cells: [&str; N]) -> Row {
        let mut row = Row::with_number_format(NumberFormat::english());
        for cell in cells {
            row.add(cell);
        }
        row
    }

    fn with_header(mut row: Row, names: &[&str]) -> Row {
        row.set_header_index(Some(Arc::new(HeaderIndex::new(names.iter().copied()))));
        row
    }

    #[test]
    fn size_counts_added_cells() {
        let mut row = Row::new();
        row.add("item 1");
        row.add("item 2");
        row.add_empty();
        row.add_null();

        assert_eq!(row.len(), 4);
        assert!(row.is_null(3));
        assert!(!row.is_null(2));
        assert!(!row.is_null(10));

        row.clear();
        assert!(row.is_empty());
    }

    #[test]
    fn string_access_never_fails() {
        let mut row = english_row(["a", ""]);
        row.add_null();

        assert_eq!(row.get(0), "a");
        assert_eq!(row.get(1), "");
        assert_eq!(row.get(2), "");
        assert_eq!(row.get(99), "");
        assert_eq!(row.get_or(0, "x"), "a");
        assert_eq!(row.get_or(1, "x"), "x");
        assert_eq!(row.get_or(99, "x"), "x");
        assert_eq!(
            row.values().collect::<Vec<_>>(),
            vec![Some("a"), Some(""), None]
        );
        assert_eq!(row.iter().collect::<Vec<_>>(), vec!["a", "", ""]);
    }

    #[test]
    fn numeric_coercion_repairs_legacy_spellings() {
        let row = english_row(["5-", "*3", " 42 ", "1.2", "-5-", "1,234"]);

        assert_eq!(row.get_int(0).unwrap(), -5);
        assert_eq!(row.get_int(1).unwrap(), 30);
        assert_eq!(row.get_double(1).unwrap(), 30.0);
        assert_eq!(row.get_int(2).unwrap(), 42);
        assert_eq!(row.get_int(3).unwrap(), 1);
        assert_eq!(row.get_double(3).unwrap(), 1.2);
        assert!(row.get_int(4).is_err());
        assert_eq!(row.get_int(5).unwrap(), 1234);
    }

    #[test]
    fn star_alone_reads_as_ten() {
        let row = english_row(["*"]);

        assert_eq!(row.get_int(0).unwrap(), 10);
    }

    #[test]
    fn plain_parse_is_the_fallback() {
        let row = english_row(["+7", "inf"]);

        assert_eq!(row.get_int(0).unwrap(), 7);
        assert_eq!(row.get_double(1).unwrap(), f64::INFINITY);
    }

    #[test]
    fn numeric_failure_carries_offending_text() {
        let row = english_row(["abc"]);

        match row.get_double(0) {
            Err(DataFileError::NumberFormat(message)) => assert!(message.contains("abc")),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(row.get_double_or(0, 2.5), 2.5);
        assert_eq!(row.get_int_or(7, 9), 9);
    }

    #[test]
    fn explicit_number_format_overrides_row_format() {
        let row = english_row(["1.234,5"]);
        let german = NumberFormat::for_locale("de_DE");

        assert_eq!(row.get_double_with(0, &german, 0.0), 1234.5);
        assert_eq!(row.get_int_with(0, &german, 0), 1234);
    }

    #[test]
    fn lookup_by_label() {
        let row = with_header(english_row(["1", "2", "3"]), &["col 1", "col 2", "abc"]);

        assert_eq!(row.get_by_name("col 2"), "2");
        assert_eq!(row.get_by_name("nope"), "");
        assert_eq!(row.get_by_name_or("nope", "dflt"), "dflt");
        assert_eq!(row.get_int_by_name("abc").unwrap(), 3);
        assert_eq!(row.get_double_by_name("col 1").unwrap(), 1.0);
        assert_eq!(row.get_int_by_name_or("nope", -1), -1);
        assert_eq!(row.get_double_by_name_or("nope", 0.5), 0.5);
    }

    #[test]
    fn numeric_lookup_of_unknown_label_fails() {
        let row = with_header(english_row(["1"]), &["a"]);

        assert!(matches!(
            row.get_int_by_name("b"),
            Err(DataFileError::NumberFormat(_))
        ));
        assert!(english_row(["1"]).get_double_by_name("a").is_err());
    }

    #[test]
    fn numeric_appenders_use_row_format() {
        let mut row = Row::with_number_format(NumberFormat::for_locale("de_DE"));
        row.add_double(1.5);
        row.add_int(-3);
        row.add_display(&'x');

        assert_eq!(row.iter().collect::<Vec<_>>(), vec!["1,5", "-3", "x"]);
        assert_eq!(row.get_double(0).unwrap(), 1.5);
    }

    #[cfg(feature = "date")]
    #[test]
    fn date_parsing_failure_is_none() {
        use chrono::NaiveDate;

        let row = with_header(english_row([" 2002.10.20 ", "junk", "2024-01-31 13:45"]), &["d"]);

        assert_eq!(
            row.get_date(0, "%Y.%m.%d"),
            NaiveDate::from_ymd_opt(2002, 10, 20)
        );
        assert_eq!(row.get_date_by_name("d", "%Y.%m.%d"), row.get_date(0, "%Y.%m.%d"));
        assert_eq!(row.get_date(1, "%Y.%m.%d"), None);
        assert_eq!(row.get_date(5, "%Y.%m.%d"), None);
        assert_eq!(row.get_date_by_name("missing", "%Y.%m.%d"), None);

        let datetime = row.get_datetime(2, "%Y-%m-%d %H:%M").unwrap();
        assert_eq!(datetime.to_string(), "2024-01-31 13:45:00");
    }

    #[test]
    fn display_is_debug_friendly() {
        let mut row = english_row(["a", "b c"]);
        row.add_null();

        assert_eq!(row.to_string(), "[Row]|'a'|'b c'|null");
    }

    #[test]
    fn equality_ignores_header_and_format() {
        let left = with_header(english_row(["1", "2"]), &["x", "y"]);
        let right: Row = ["1", "2"].into_iter().collect();

        assert_eq!(left, right);
    }

    #[test]
    fn serializes_as_sequence() -> Result<(), serde_json::Error> {
        let mut row = english_row(["a", ""]);
        row.add_null();

        let json = serde_json::to_string(&row)?;
        assert_eq!(json, r#"["a","",null]"#);

        let back: Row = serde_json::from_str(&json)?;
        assert_eq!(back, row);
        assert!(back.is_null(2));
        Ok(())
    }
}

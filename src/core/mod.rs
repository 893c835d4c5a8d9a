/// The row model: an ordered list of text cells with typed accessors.
pub mod row;

/// Column label to position table shared by the rows of one file.
pub mod header;

/// Locale-sensitive number parsing and formatting used by rows.
pub mod number;

/// The contract every line format implements.
pub mod format;

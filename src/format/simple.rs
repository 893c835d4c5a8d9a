use crate::core::{
    format::{DataFormat, Decoded},
    row::Row,
};

const TAB: char = '\t';

/// Tab separated values, without quoting or escaping.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabFormat;

impl DataFormat for TabFormat {
    fn decode(&mut self, line: &str) -> Decoded {
        Decoded::Row(line.split(TAB).collect())
    }

    fn encode(&self, row: &Row) -> String {
        row.iter().collect::<Vec<_>>().join("\t")
    }
}

/// One value per line: the whole line is the only cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemPerLineFormat;

impl DataFormat for ItemPerLineFormat {
    fn decode(&mut self, line: &str) -> Decoded {
        Decoded::Row(std::iter::once(line).collect())
    }

    fn encode(&self, row: &Row) -> String {
        row.get(0).to_owned()
    }
}

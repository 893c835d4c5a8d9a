use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, Ordering},
};

/// Column label to position table shared by every row of one open data file.
///
/// The table is built once per session, from the first row of a reader or
/// from the header list of a writer, and handed to rows behind an `Arc`.
/// When a label appears more than once, lookups resolve to its last position.
///
/// Closing the file detaches the table. From then on it is empty for every
/// row still holding it: no label resolves and the label list is empty.
#[derive(Debug)]
pub struct HeaderIndex {
    names: Vec<String>,
    positions: HashMap<String, usize>,
    attached: AtomicBool,
}

impl HeaderIndex {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut positions = HashMap::with_capacity(names.len());
        for (position, name) in names.iter().enumerate() {
            positions.insert(name.clone(), position);
        }
        Self {
            names,
            positions,
            attached: AtomicBool::new(true),
        }
    }

    /// Position of the column labelled `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        if !self.is_attached() {
            return None;
        }
        self.positions.get(name).copied()
    }

    /// Labels in the order they appear in the header row.
    pub fn names(&self) -> &[String] {
        if self.is_attached() {
            &self.names
        } else {
            &[]
        }
    }

    pub fn len(&self) -> usize {
        self.names().len()
    }

    pub fn is_empty(&self) -> bool {
        self.names().is_empty()
    }

    /// Whether the file this table belongs to is still open.
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    /// Clears the table for every holder of it.
    pub(crate) fn detach(&self) {
        self.attached.store(false, Ordering::Release);
    }
}

impl Default for HeaderIndex {
    fn default() -> Self {
        Self::new(Vec::<String>::new())
    }
}

impl Clone for HeaderIndex {
    fn clone(&self) -> Self {
        Self {
            names: self.names.clone(),
            positions: self.positions.clone(),
            attached: AtomicBool::new(self.is_attached()),
        }
    }
}

/// Tables compare by the labels they currently expose.
impl PartialEq for HeaderIndex {
    fn eq(&self, other: &Self) -> bool {
        self.names() == other.names()
    }
}

impl Eq for HeaderIndex {}

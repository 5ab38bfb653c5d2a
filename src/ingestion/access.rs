use std::collections::HashSet;

/// Answers who may write values and who may read reports.
///
/// Identity is asserted by the caller; implementations only classify it.
pub trait Roster {
    fn is_known_writer(&self, id: &str) -> bool;

    fn is_known_reader(&self, id: &str) -> bool;
}

/// What a caller is allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Appends to, and reports on, its own entity
    Writer,
    /// Reads cross-entity sums and the consolidated report
    Reader,
}

/// Classifies a caller. An id listed as both writer and reader is a writer.
pub fn classify<R: Roster + ?Sized>(roster: &R, id: &str) -> Option<Role> {
    if roster.is_known_writer(id) {
        Some(Role::Writer)
    } else if roster.is_known_reader(id) {
        Some(Role::Reader)
    } else {
        None
    }
}

/// A roster fixed at construction, typically from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticRoster {
    writers: HashSet<String>,
    readers: HashSet<String>,
}

impl StaticRoster {
    pub fn new<W, R>(writers: W, readers: R) -> Self
    where
        W: IntoIterator,
        W::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            writers: writers.into_iter().map(Into::into).collect(),
            readers: readers.into_iter().map(Into::into).collect(),
        }
    }
}

impl Roster for StaticRoster {
    fn is_known_writer(&self, id: &str) -> bool {
        self.writers.contains(id)
    }

    fn is_known_reader(&self, id: &str) -> bool {
        self.readers.contains(id)
    }
}

use serde::{Deserialize, Serialize};

/// Display name assigned to one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub entity_id: String,
    pub display_name: String,
}

/// Ordered mapping from entity ids to display names.
///
/// Membership and order define the consolidated report. Entities missing
/// here are still queryable individually.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameDirectory {
    entries: Vec<DirectoryEntry>,
}

impl NameDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry at the end, or renames the entity in place if it is
    /// already listed.
    pub fn with_entry(mut self, entity_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        let entity_id = entity_id.into();
        let display_name = display_name.into();
        match self.entries.iter_mut().find(|e| e.entity_id == entity_id) {
            Some(existing) => existing.display_name = display_name,
            None => self.entries.push(DirectoryEntry {
                entity_id,
                display_name,
            }),
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &DirectoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for NameDirectory {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |dir, (id, name)| dir.with_entry(id, name))
    }
}

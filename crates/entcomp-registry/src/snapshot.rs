use std::collections::BTreeMap;

///
/// SnapshotEntry
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SnapshotEntry {
    pub id: u32,
    pub revision: u32,
}

///
/// Snapshot
///
/// Read-only name → id view taken after all assignments of a build, handed
/// to emitters so they never touch the registry itself.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Snapshot {
    entries: BTreeMap<String, SnapshotEntry>,
}

impl Snapshot {
    pub(crate) const fn from_entries(entries: BTreeMap<String, SnapshotEntry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<SnapshotEntry> {
        self.entries.get(name).copied()
    }

    #[must_use]
    pub fn id(&self, name: &str) -> Option<u32> {
        self.get(name).map(|entry| entry.id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SnapshotEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), *entry))
    }
}

impl FromIterator<(String, SnapshotEntry)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, SnapshotEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}


use crate::{
    REGISTRY_HEADER,
    error::RegistryError,
    record::{Record, valid_name},
    snapshot::{Snapshot, SnapshotEntry},
};
use std::{
    collections::BTreeMap,
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

///
/// Entry
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Entry {
    id: u32,
    live: bool,
}

///
/// Layout
/// Latest recorded layout revision for one name.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Layout {
    revision: u32,
    hash: u64,
}

///
/// Registry
///
/// In-memory view of the append-only registry log plus the handle used to
/// extend it. Every mutation is validated against the current state before
/// it is written, and written before it is applied, so a failed write
/// leaves the in-memory view unchanged.
///

#[derive(Debug)]
pub struct Registry {
    path: Option<PathBuf>,
    file: Option<File>,
    entries: BTreeMap<String, Entry>,
    owners: BTreeMap<u32, String>,
    layouts: BTreeMap<String, Layout>,
    appended: Vec<Record>,
}

impl Registry {
    /// A registry with no backing file. Used by tests and dry runs.
    #[must_use]
    pub const fn in_memory() -> Self {
        Self {
            path: None,
            file: None,
            entries: BTreeMap::new(),
            owners: BTreeMap::new(),
            layouts: BTreeMap::new(),
            appended: Vec::new(),
        }
    }

    /// Open and replay the registry at `path`. A missing file is an empty
    /// registry; the file is created on the first mutation.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();

        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
            Err(err) => return Err(RegistryError::io(path, err)),
        };

        let mut registry = Self::replay(&source, &path.display().to_string())?;
        registry.path = Some(path.to_path_buf());

        debug!(
            path = %path.display(),
            live = registry.live_names().count(),
            "opened entity registry"
        );

        Ok(registry)
    }

    /// Rebuild registry state from log text without touching the filesystem.
    pub fn replay(source: &str, origin: &str) -> Result<Self, RegistryError> {
        let mut registry = Self::in_memory();

        let corrupt = |line: usize, reason: String| RegistryError::Corrupt {
            origin: origin.to_string(),
            line,
            reason,
        };

        let line_count = source.lines().count();
        if !source.is_empty() && !source.ends_with('\n') {
            return Err(corrupt(line_count, "truncated final record".to_string()));
        }

        for (index, raw) in source.lines().enumerate() {
            let line = index + 1;
            let raw = raw.strip_suffix('\r').unwrap_or(raw);

            if raw.trim().is_empty() || raw.starts_with('#') {
                continue;
            }

            match Record::decode(raw) {
                Ok(Some(record)) => {
                    registry.check(&record).map_err(|reason| corrupt(line, reason))?;
                    registry.apply(record);
                }
                Ok(None) => {
                    warn!(origin, line, "skipping unknown registry record kind");
                }
                Err(reason) => return Err(corrupt(line, reason)),
            }
        }

        Ok(registry)
    }

    /// Backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Live id for `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<u32> {
        self.entries
            .get(name)
            .filter(|entry| entry.live)
            .map(|entry| entry.id)
    }

    /// Whether `name` was assigned once and later retired.
    #[must_use]
    pub fn is_retired(&self, name: &str) -> bool {
        self.entries.get(name).is_some_and(|entry| !entry.live)
    }

    /// Latest recorded layout revision for a live name.
    #[must_use]
    pub fn revision(&self, name: &str) -> Option<u32> {
        self.lookup(name)?;
        self.layouts.get(name).map(|layout| layout.revision)
    }

    /// Live names in id order.
    pub fn live_names(&self) -> impl Iterator<Item = &str> {
        self.owners
            .values()
            .filter(|name| self.lookup(name).is_some())
            .map(String::as_str)
    }

    /// Records appended since this registry was opened or compacted.
    #[must_use]
    pub fn delta(&self) -> &[Record] {
        &self.appended
    }

    /// Return the live id for `name`, assigning one if needed.
    ///
    /// A retired name gets its old id back. Otherwise the id is the smallest
    /// integer never used by any live or retired entry.
    pub fn lookup_or_assign(&mut self, name: &str) -> Result<u32, RegistryError> {
        if !valid_name(name) {
            return Err(RegistryError::InvalidName(name.to_string()));
        }
        if let Some(id) = self.lookup(name) {
            return Ok(id);
        }

        let id = match self.entries.get(name) {
            Some(entry) => entry.id,
            None => self.next_free_id(),
        };

        self.append(Record::Assign {
            name: name.to_string(),
            id,
        })?;
        debug!(name, id, "assigned entity id");

        Ok(id)
    }

    /// Retire a live name. The id stays reserved for that name forever.
    pub fn retire(&mut self, name: &str) -> Result<u32, RegistryError> {
        let id = self
            .lookup(name)
            .ok_or_else(|| RegistryError::UnknownEntity(name.to_string()))?;

        self.append(Record::Retire {
            name: name.to_string(),
            id,
        })?;
        warn!(name, id, "retired entity id");

        Ok(id)
    }

    /// Record the layout hash of a live name and return its revision.
    ///
    /// The first layout seen is revision 0; every later change bumps it by
    /// one. An unchanged layout writes nothing.
    pub fn record_layout(&mut self, name: &str, hash: u64) -> Result<u32, RegistryError> {
        if self.lookup(name).is_none() {
            return Err(RegistryError::UnknownEntity(name.to_string()));
        }

        let revision = match self.layouts.get(name) {
            Some(layout) if layout.hash == hash => return Ok(layout.revision),
            Some(layout) => layout.revision + 1,
            None => 0,
        };

        self.append(Record::Revision {
            name: name.to_string(),
            revision,
            layout: hash,
        })?;
        debug!(name, revision, "recorded layout revision");

        Ok(revision)
    }

    /// Frozen name → (id, revision) view of every live entry.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let entries = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.live)
            .map(|(name, entry)| {
                let revision = self.layouts.get(name).map_or(0, |l| l.revision);

                (
                    name.clone(),
                    SnapshotEntry {
                        id: entry.id,
                        revision,
                    },
                )
            })
            .collect();

        Snapshot::from_entries(entries)
    }

    /// Rewrite the log keeping only live entries and their latest layout.
    ///
    /// Retired ids are forgotten, so a later build could hand them to a new
    /// name. Only run this once no stored data can carry those ids. Returns
    /// the number of retired entries dropped.
    pub fn compact(&mut self) -> Result<usize, RegistryError> {
        let retired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.live)
            .map(|(name, _)| name.clone())
            .collect();

        let mut text = format!("{REGISTRY_HEADER}\n");
        for name in self.live_names() {
            if let Some(id) = self.lookup(name) {
                text.push_str(
                    &Record::Assign {
                        name: name.to_string(),
                        id,
                    }
                    .encode(),
                );
            }
            if let Some(layout) = self.layouts.get(name) {
                text.push_str(
                    &Record::Revision {
                        name: name.to_string(),
                        revision: layout.revision,
                        layout: layout.hash,
                    }
                    .encode(),
                );
            }
        }

        if let Some(path) = self.path.clone() {
            let tmp = tmp_path(&path);
            let write = || -> std::io::Result<()> {
                let mut file = File::create(&tmp)?;
                file.write_all(text.as_bytes())?;
                file.sync_all()?;
                fs::rename(&tmp, &path)
            };
            write().map_err(|err| RegistryError::io(&path, err))?;

            // the old append handle points at the replaced inode
            self.file = None;
        }

        for name in &retired {
            if let Some(entry) = self.entries.remove(name) {
                self.owners.remove(&entry.id);
            }
            self.layouts.remove(name);
        }
        self.appended.clear();

        debug!(dropped = retired.len(), "compacted entity registry");

        Ok(retired.len())
    }

    // -- internals --------------------------------------------------------

    fn next_free_id(&self) -> u32 {
        // owners is sorted, so the first gap is the smallest unused id
        let mut candidate = 0;
        for &id in self.owners.keys() {
            if id != candidate {
                break;
            }
            candidate += 1;
        }

        candidate
    }

    /// Validate a record against the current state.
    fn check(&self, record: &Record) -> Result<(), String> {
        match record {
            Record::Assign { name, id } => {
                if let Some(owner) = self.owners.get(id)
                    && owner != name
                {
                    return Err(format!("id {id} for '{name}' already belongs to '{owner}'"));
                }
                match self.entries.get(name) {
                    Some(entry) if entry.live => {
                        Err(format!("'{name}' assigned again while live (id {})", entry.id))
                    }
                    Some(entry) if entry.id != *id => Err(format!(
                        "retired '{name}' revived with id {id} instead of {}",
                        entry.id
                    )),
                    _ => Ok(()),
                }
            }
            Record::Retire { name, id } => match self.entries.get(name) {
                Some(entry) if entry.live && entry.id == *id => Ok(()),
                Some(entry) if entry.live => Err(format!(
                    "retire of '{name}' names id {id} but live id is {}",
                    entry.id
                )),
                _ => Err(format!("retire of '{name}' which is not live")),
            },
            Record::Revision { name, revision, .. } => {
                if !self.entries.get(name).is_some_and(|entry| entry.live) {
                    return Err(format!("revision for '{name}' which is not live"));
                }
                match self.layouts.get(name) {
                    Some(layout) if *revision <= layout.revision => Err(format!(
                        "revision {revision} for '{name}' does not advance past {}",
                        layout.revision
                    )),
                    _ => Ok(()),
                }
            }
        }
    }

    fn apply(&mut self, record: Record) {
        match record {
            Record::Assign { name, id } => {
                self.owners.insert(id, name.clone());
                self.entries.insert(name, Entry { id, live: true });
            }
            Record::Retire { name, id } => {
                self.entries.insert(name, Entry { id, live: false });
            }
            Record::Revision {
                name,
                revision,
                layout,
            } => {
                self.layouts.insert(
                    name,
                    Layout {
                        revision,
                        hash: layout,
                    },
                );
            }
        }
    }

    /// Validate, persist, then apply one record.
    fn append(&mut self, record: Record) -> Result<(), RegistryError> {
        self.check(&record).map_err(|reason| RegistryError::Corrupt {
            origin: self.origin(),
            line: 0,
            reason,
        })?;

        if let Some(path) = self.path.clone() {
            let line = record.encode();
            let file = self.append_handle(&path)?;

            file.write_all(line.as_bytes())
                .and_then(|()| file.sync_data())
                .map_err(|err| RegistryError::io(&path, err))?;
        }

        self.appended.push(record.clone());
        self.apply(record);

        Ok(())
    }

    fn append_handle(&mut self, path: &Path) -> Result<&mut File, RegistryError> {
        if self.file.is_none() {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|err| RegistryError::io(path, err))?;

            let empty = file
                .metadata()
                .map_err(|err| RegistryError::io(path, err))?
                .len()
                == 0;
            if empty {
                file.write_all(format!("{REGISTRY_HEADER}\n").as_bytes())
                    .map_err(|err| RegistryError::io(path, err))?;
            }

            self.file = Some(file);
        }

        self.file
            .as_mut()
            .ok_or_else(|| RegistryError::io(path, ErrorKind::NotFound.into()))
    }

    fn origin(&self) -> String {
        self.path
            .as_ref()
            .map_or_else(|| "<memory>".to_string(), |p| p.display().to_string())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");

    path.with_file_name(name)
}

use crate::{
    error::{MappingError, SaveError},
    save::SaveRecord,
    traits::Persisted,
};
use std::{any::Any, collections::BTreeMap};
use tracing::debug;

///
/// EntityMapping
///
/// Runtime dispatch table from class id to entity type, filled by the
/// generated `register_all`.
///

#[derive(Debug, Default)]
pub struct EntityMapping {
    by_id: BTreeMap<u32, Registration>,
    by_name: BTreeMap<&'static str, u32>,
}

#[derive(Debug)]
struct Registration {
    name: &'static str,
    revision: u32,
    create: fn() -> Box<dyn Any>,
    decode: fn(&SaveRecord) -> Result<Box<dyn Any>, SaveError>,
}

impl EntityMapping {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Persisted>(&mut self) -> Result<(), MappingError> {
        if let Some(existing) = self.by_id.get(&T::CLASS_ID) {
            return Err(if existing.name == T::NAME {
                MappingError::DuplicateName(T::NAME)
            } else {
                MappingError::DuplicateId {
                    id: T::CLASS_ID,
                    existing: existing.name,
                    name: T::NAME,
                }
            });
        }
        if self.by_name.contains_key(T::NAME) {
            return Err(MappingError::DuplicateName(T::NAME));
        }

        self.by_id.insert(
            T::CLASS_ID,
            Registration {
                name: T::NAME,
                revision: T::REVISION,
                create: create_boxed::<T>,
                decode: decode_boxed::<T>,
            },
        );
        self.by_name.insert(T::NAME, T::CLASS_ID);
        debug!(name = T::NAME, id = T::CLASS_ID, "registered entity");

        Ok(())
    }

    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn name_of(&self, id: u32) -> Option<&'static str> {
        self.by_id.get(&id).map(|r| r.name)
    }

    #[must_use]
    pub fn revision_of(&self, id: u32) -> Option<u32> {
        self.by_id.get(&id).map(|r| r.revision)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Registered (id, name) pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &'static str)> + '_ {
        self.by_id.iter().map(|(&id, r)| (id, r.name))
    }

    /// Construct a fresh instance of the entity registered under `id`.
    pub fn create(&self, id: u32) -> Result<Box<dyn Any>, MappingError> {
        self.by_id
            .get(&id)
            .map(|r| (r.create)())
            .ok_or(MappingError::UnknownId(id))
    }

    /// Decode a save record into whichever entity its class id names.
    pub fn decode_any(&self, record: &SaveRecord) -> Result<Box<dyn Any>, SaveError> {
        let registration = self
            .by_id
            .get(&record.id)
            .ok_or(MappingError::UnknownId(record.id))?;

        (registration.decode)(record)
    }
}

fn create_boxed<T: Persisted>() -> Box<dyn Any> {
    Box::new(T::create())
}

fn decode_boxed<T: Persisted>(record: &SaveRecord) -> Result<Box<dyn Any>, SaveError> {
    record.decode::<T>().map(|entity| Box::new(entity) as Box<dyn Any>)
}

///
/// TESTS
///

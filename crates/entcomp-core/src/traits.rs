use serde::{Serialize, de::DeserializeOwned};

///
/// Entity
///
/// Implemented by every generated entity type.
///

pub trait Entity: Sized + 'static {
    /// Declared entity name.
    const NAME: &'static str;

    /// Runtime groups the entity is enrolled in.
    const GROUPS: &'static [&'static str];

    /// Construct with every field at its declared default.
    fn create() -> Self;

    #[must_use]
    fn in_group(group: &str) -> bool {
        Self::GROUPS.contains(&group)
    }
}

///
/// Persisted
///
/// Entities with a stable registry id. `CLASS_ID` never changes for a given
/// name; `REVISION` advances whenever the persisted field layout does.
///

pub trait Persisted: Entity + Serialize + DeserializeOwned {
    const CLASS_ID: u32;
    const REVISION: u32;
}

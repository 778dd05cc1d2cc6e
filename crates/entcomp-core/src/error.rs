use thiserror::Error as ThisError;

///
/// MappingError
///

#[remain::sorted]
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum MappingError {
    #[error("class id {id} is registered by both '{existing}' and '{name}'")]
    DuplicateId {
        id: u32,
        existing: &'static str,
        name: &'static str,
    },

    #[error("entity '{0}' is already registered")]
    DuplicateName(&'static str),

    #[error("no entity registered for class id {0}")]
    UnknownId(u32),
}

///
/// SaveError
///

#[remain::sorted]
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SaveError {
    #[error("save record holds class id {found}, expected {expected}")]
    ClassMismatch { expected: u32, found: u32 },

    #[error("deserialize error: {0}")]
    Deserialize(String),

    #[error("entity '{entity}': save revision {found} is newer than runtime revision {current}")]
    FutureRevision {
        entity: &'static str,
        found: u32,
        current: u32,
    },

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error("serialize error: {0}")]
    Serialize(String),
}

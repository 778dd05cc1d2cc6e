use thiserror::Error as ThisError;

///
/// RegistryError
///

#[remain::sorted]
#[derive(Debug, ThisError)]
pub enum RegistryError {
    /// The persisted log cannot be replayed. Fatal: restore a known-good
    /// registry from version control.
    #[error("corrupt registry '{origin}' at line {line}: {reason}")]
    Corrupt {
        origin: String,
        line: usize,
        reason: String,
    },

    #[error("invalid entity name '{0}'")]
    InvalidName(String),

    #[error("registry io error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("registry lock poisoned")]
    Poisoned,

    #[error("entity '{0}' has no live registry entry")]
    UnknownEntity(String),
}

impl RegistryError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

use crate::downgrade::DowngradeError;
use entcomp_config_build::ConfigError;
use entcomp_registry::RegistryError;
use entcomp_schema::SchemaError;
use thiserror::Error as ThisError;

///
/// BuildError
/// Anything that aborts a generation pass.
///

#[remain::sorted]
#[derive(Debug, ThisError)]
pub enum BuildError {
    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Downgrade(#[from] DowngradeError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error("output io error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no output directory configured and OUT_DIR is not set")]
    MissingOutDir,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl BuildError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

///
/// ComposeError
/// Semantic failures while composing one entity.
///

#[remain::sorted]
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ComposeError {
    #[error("entity '{entity}': cyclic requirement {}", .cycle.join(" -> "))]
    CyclicDependency { entity: String, cycle: Vec<String> },

    #[error(
        "entity '{entity}': method '{method}' has a base in both '{first}' and '{second}'"
    )]
    DuplicateBase {
        entity: String,
        method: String,
        first: String,
        second: String,
    },

    #[error("entity '{entity}': method '{method}' is replaced by both '{first}' and '{second}'")]
    DuplicateReplace {
        entity: String,
        method: String,
        first: String,
        second: String,
    },

    #[error("entity '{entity}': components '{first}' and '{second}' exclude each other")]
    ExcludedPair {
        entity: String,
        first: String,
        second: String,
    },

    #[error("entity '{entity}': field '{field}' from '{first}' and '{second}': {reason}")]
    FieldConflict {
        entity: String,
        field: String,
        first: String,
        second: String,
        reason: String,
    },

    #[error("entity '{entity}': method '{method}' has no base implementation")]
    MissingBase { entity: String, method: String },

    #[error(
        "entity '{entity}': method '{method}' declared with different signatures in '{first}' and '{second}'"
    )]
    SignatureMismatch {
        entity: String,
        method: String,
        first: String,
        second: String,
    },

    #[error("entity '{entity}': component '{component}' is not in the schema")]
    UnknownComponent { entity: String, component: String },
}

impl ComposeError {
    /// Entity the failure belongs to.
    #[must_use]
    pub fn entity(&self) -> &str {
        match self {
            Self::CyclicDependency { entity, .. }
            | Self::DuplicateBase { entity, .. }
            | Self::DuplicateReplace { entity, .. }
            | Self::ExcludedPair { entity, .. }
            | Self::FieldConflict { entity, .. }
            | Self::MissingBase { entity, .. }
            | Self::SignatureMismatch { entity, .. }
            | Self::UnknownComponent { entity, .. } => entity,
        }
    }
}

///
/// EmitError
///

#[remain::sorted]
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum EmitError {
    #[error("entity '{entity}': {what} '{source_text}' does not parse: {reason}")]
    InvalidTokens {
        entity: String,
        what: String,
        source_text: String,
        reason: String,
    },

    #[error("persisted entity '{0}' has no registry id")]
    MissingId(String),

    #[error("entity '{entity}': generated name '{name}' is defined twice")]
    NameCollision { entity: String, name: String },
}

//! Runtime side of entcomp: the traits generated entity types implement, the
//! id → type mapping built by `register_all`, and the save record codec.

pub mod error;
pub mod mapping;
pub mod save;
pub mod traits;

pub use error::{MappingError, SaveError};
pub use mapping::EntityMapping;
pub use save::SaveRecord;
pub use traits::{Entity, Persisted};

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        mapping::EntityMapping,
        save::SaveRecord,
        traits::{Entity, Persisted},
    };
}

// generated code names serde through this path so downstream crates need no
// direct serde dependency
#[doc(hidden)]
pub mod __reexports {
    pub use serde;
    pub use serde_json;
}

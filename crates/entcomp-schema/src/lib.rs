//! Component/entity metamodel and the definition loader.
//!
//! The loader turns already-discovered declarations ([`decl::Declarations`])
//! into validated descriptors ([`node::Schema`]). It never touches the
//! filesystem; discovery belongs to the build collaborator.

pub mod decl;
pub mod error;
pub mod load;
pub mod node;
pub mod types;
pub mod validate;

/// Maximum length for component and entity identifiers.
pub const MAX_NAME_LEN: usize = 64;

pub use error::{ErrorTree, MalformedDeclaration, SchemaError};
pub use load::load;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        decl::{ComponentDecl, Declarations, EntityDecl, FieldDecl, MethodDecl},
        err,
        error::ErrorTree,
        node::*,
        types::{ChainPolicy, Combinator, MergePolicy},
    };
    pub use serde::{Deserialize, Serialize};
}

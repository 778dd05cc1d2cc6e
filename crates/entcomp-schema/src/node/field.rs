use crate::types::{Combinator, MergePolicy};
use serde::Serialize;

///
/// FieldDescriptor
///
/// `ty` and `default` hold canonical token renderings, so two declarations
/// compare equal exactly when they are the same Rust tokens.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub ty: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    pub policy: MergePolicy,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combinator: Option<Combinator>,

    pub read_only: bool,
    pub transient: bool,
}

impl FieldDescriptor {
    /// Whether `other` is an identical redeclaration, as `shared` requires.
    #[must_use]
    pub fn same_declaration(&self, other: &Self) -> bool {
        self == other
    }
}

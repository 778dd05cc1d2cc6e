use crate::types::ChainPolicy;
use serde::Serialize;

///
/// Receiver
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Receiver {
    None,
    Ref,
    RefMut,
}

///
/// MethodDescriptor
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct MethodDescriptor {
    pub name: String,

    /// Canonical `fn name(...) -> T` tokens.
    pub signature: String,

    /// Parameter names in order, excluding the receiver.
    pub params: Vec<String>,

    pub receiver: Receiver,
    pub returns_unit: bool,

    /// Canonical block tokens, braces included.
    pub body: String,

    pub chain: ChainPolicy,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub when: Vec<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub when_any: bool,
}

impl MethodDescriptor {
    /// Whether this contributor applies to a composition, given `has` to
    /// test membership. With `when_any` one listed component suffices;
    /// otherwise all of them must be present. An empty `when` always applies.
    pub fn applies(&self, has: impl Fn(&str) -> bool) -> bool {
        if self.when.is_empty() {
            return true;
        }
        if self.when_any {
            self.when.iter().any(|c| has(c.as_str()))
        } else {
            self.when.iter().all(|c| has(c.as_str()))
        }
    }
}

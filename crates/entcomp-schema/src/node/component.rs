use crate::node::{FieldDescriptor, MethodDescriptor};
use serde::Serialize;

///
/// ComponentDescriptor
///

#[derive(Clone, Debug, Serialize)]
pub struct ComponentDescriptor {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
    pub methods: Vec<MethodDescriptor>,

    /// Hard dependencies, declaration order, deduplicated.
    pub requires: Vec<String>,

    /// Hard exclusions, declaration order, deduplicated.
    pub excludes: Vec<String>,

    pub universal: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_groups: Vec<String>,
}

impl ComponentDescriptor {
    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn get_method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }

    #[must_use]
    pub fn excludes(&self, component: &str) -> bool {
        self.excludes.iter().any(|c| c == component)
    }
}

use serde::Serialize;

///
/// EntityDefinition
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct EntityDefinition {
    pub name: String,

    /// Requested components in author order; the order is a tie-break hint.
    pub components: Vec<String>,

    pub persisted: bool,
}

impl EntityDefinition {
    /// Position of a component in the requested list.
    #[must_use]
    pub fn request_rank(&self, component: &str) -> Option<usize> {
        self.components.iter().position(|c| c == component)
    }
}

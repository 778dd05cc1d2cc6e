use crate::node::{ComponentDescriptor, EntityDefinition};
use std::collections::BTreeMap;

///
/// Schema
///
/// The loaded metamodel for one build. Components are keyed by name;
/// entities keep declaration order, which drives id assignment order.
///

#[derive(Clone, Debug, Default)]
pub struct Schema {
    components: BTreeMap<String, ComponentDescriptor>,
    entities: Vec<EntityDefinition>,
}

impl Schema {
    #[must_use]
    pub(crate) const fn from_parts(
        components: BTreeMap<String, ComponentDescriptor>,
        entities: Vec<EntityDefinition>,
    ) -> Self {
        Self {
            components,
            entities,
        }
    }

    #[must_use]
    pub fn get_component(&self, name: &str) -> Option<&ComponentDescriptor> {
        self.components.get(name)
    }

    /// All components in name order.
    pub fn components(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.components.values()
    }

    /// Universal components in name order.
    pub fn universal_components(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.components.values().filter(|c| c.universal)
    }

    /// Entities in declaration order.
    #[must_use]
    pub fn entities(&self) -> &[EntityDefinition] {
        &self.entities
    }

    #[must_use]
    pub fn get_entity(&self, name: &str) -> Option<&EntityDefinition> {
        self.entities.iter().find(|e| e.name == name)
    }
}

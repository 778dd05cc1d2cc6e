//! Raw declarations as handed over by the discovery collaborator.
//!
//! Nothing here is validated; [`crate::load`] turns these into descriptors.
//! The builder methods exist for programmatic construction (build scripts,
//! tests) and mirror the JSON shape one-to-one.

use crate::{
    SchemaError,
    types::{ChainPolicy, MergePolicy},
};
use serde::{Deserialize, Serialize};

///
/// Declarations
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Declarations {
    #[serde(default)]
    pub components: Vec<ComponentDecl>,

    #[serde(default)]
    pub entities: Vec<EntityDecl>,
}

impl Declarations {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            components: Vec::new(),
            entities: Vec::new(),
        }
    }

    /// Parse a JSON declaration set.
    pub fn from_json(source: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(source)?)
    }

    #[must_use]
    pub fn component(mut self, component: ComponentDecl) -> Self {
        self.components.push(component);
        self
    }

    #[must_use]
    pub fn entity(mut self, entity: EntityDecl) -> Self {
        self.entities.push(entity);
        self
    }
}

///
/// ComponentDecl
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentDecl {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDecl>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDecl>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<String>,

    /// Implicitly required by every non-universal component.
    #[serde(default)]
    pub universal: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_groups: Vec<String>,
}

impl ComponentDecl {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    #[must_use]
    pub fn requires(mut self, component: impl Into<String>) -> Self {
        self.requires.push(component.into());
        self
    }

    #[must_use]
    pub fn excludes(mut self, component: impl Into<String>) -> Self {
        self.excludes.push(component.into());
        self
    }

    #[must_use]
    pub const fn universal(mut self) -> Self {
        self.universal = true;
        self
    }

    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    #[must_use]
    pub fn exclude_group(mut self, group: impl Into<String>) -> Self {
        self.exclude_groups.push(group.into());
        self
    }
}

///
/// FieldDecl
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDecl {
    pub name: String,

    #[serde(rename = "type", default)]
    pub ty: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(default)]
    pub policy: MergePolicy,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combinator: Option<String>,

    #[serde(default)]
    pub read_only: bool,

    #[serde(default)]
    pub transient: bool,
}

impl FieldDecl {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn default_value(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    #[must_use]
    pub const fn shared(mut self) -> Self {
        self.policy = MergePolicy::Shared;
        self
    }

    #[must_use]
    pub fn additive(mut self, combinator: impl Into<String>) -> Self {
        self.policy = MergePolicy::Additive;
        self.combinator = Some(combinator.into());
        self
    }

    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    #[must_use]
    pub const fn transient(mut self) -> Self {
        self.transient = true;
        self
    }
}

///
/// MethodDecl
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MethodDecl {
    pub name: String,

    #[serde(default)]
    pub signature: String,

    #[serde(default)]
    pub body: String,

    #[serde(default)]
    pub chain: ChainPolicy,

    /// Components that must all be present for this contributor to apply.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub when: Vec<String>,

    /// One component from `when` is enough.
    #[serde(default)]
    pub when_any: bool,
}

impl MethodDecl {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        signature: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            signature: signature.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn chain(mut self, chain: ChainPolicy) -> Self {
        self.chain = chain;
        self
    }

    #[must_use]
    pub fn when(mut self, component: impl Into<String>) -> Self {
        self.when.push(component.into());
        self
    }

    #[must_use]
    pub const fn when_any(mut self) -> Self {
        self.when_any = true;
        self
    }
}

///
/// EntityDecl
///

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EntityDecl {
    pub name: String,

    #[serde(default)]
    pub components: Vec<String>,

    /// Whether the entity needs a stable registry id.
    #[serde(default = "default_persisted")]
    pub persisted: bool,
}

const fn default_persisted() -> bool {
    true
}

impl EntityDecl {
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            components: components.into_iter().map(Into::into).collect(),
            persisted: true,
        }
    }

    #[must_use]
    pub const fn transient(mut self) -> Self {
        self.persisted = false;
        self
    }
}

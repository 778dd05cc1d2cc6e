use entcomp_schema::{node::Receiver, types::Combinator};
use serde::Serialize;
use xxhash_rust::xxh3::xxh3_64;

///
/// MergedModel
///
/// Everything the emitter needs for one entity and nothing else. Field and
/// method order follow the linearization.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct MergedModel {
    pub entity: String,
    pub persisted: bool,

    /// The linearization this model was resolved from.
    pub components: Vec<String>,

    /// Runtime groups after `exclude_groups` were applied.
    pub groups: Vec<String>,

    pub fields: Vec<MergedField>,
    pub methods: Vec<MethodChain>,
}

impl MergedModel {
    /// Stable hash of the whole model, used as the output cache key.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        // serializing plain strings and enums cannot fail
        let json = serde_json::to_vec(self).unwrap_or_default();

        xxh3_64(&json)
    }

    /// Hash of the persisted layout: serialized field names and types.
    #[must_use]
    pub fn layout_hash(&self) -> u64 {
        let mut layout = String::new();
        for field in self.persisted_fields() {
            layout.push_str(&field.name);
            layout.push(':');
            layout.push_str(&field.ty);
            layout.push(';');
        }

        xxh3_64(layout.as_bytes())
    }

    /// Fields that take part in serialization.
    pub fn persisted_fields(&self) -> impl Iterator<Item = &MergedField> {
        self.fields.iter().filter(|f| !f.transient)
    }

    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&MergedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn get_method(&self, name: &str) -> Option<&MethodChain> {
        self.methods.iter().find(|m| m.name == name)
    }
}

///
/// MergedField
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct MergedField {
    pub name: String,

    /// Canonical type tokens.
    pub ty: String,

    pub init: FieldInit,
    pub read_only: bool,
    pub transient: bool,

    /// Declaring components in linearization order.
    pub contributors: Vec<String>,
}

///
/// FieldInit
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldInit {
    /// `Default::default()`.
    Default,

    /// One default expression.
    Expr(String),

    /// Additive field: operands folded with the combinator. A contributor
    /// without a default contributes `None`, rendered as the type default.
    Combined {
        combinator: Combinator,
        operands: Vec<Option<String>>,
    },
}

///
/// Hook
/// One contributor's body for a chained method.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Hook {
    pub component: String,
    pub body: String,
}

///
/// MethodChain
///
/// Call order is `before`, then `base`, then `after`. `base` is either the
/// single `base` contributor or the replacement.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct MethodChain {
    pub name: String,
    pub signature: String,
    pub params: Vec<String>,
    pub receiver: Receiver,
    pub returns_unit: bool,
    pub before: Vec<Hook>,
    pub base: Hook,
    pub after: Vec<Hook>,

    /// Set when `base` came from a `replace` contributor.
    pub replaced: bool,
}

impl MethodChain {
    /// Every hook in call order.
    pub fn hooks(&self) -> impl Iterator<Item = &Hook> {
        self.before
            .iter()
            .chain(std::iter::once(&self.base))
            .chain(&self.after)
    }
}

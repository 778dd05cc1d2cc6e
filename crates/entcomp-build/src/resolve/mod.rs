//! Conflict resolver: merges the linearized components of one entity into a
//! [`MergedModel`]. Ambiguity is always an error.

mod model;


pub use model::{FieldInit, Hook, MergedField, MergedModel, MethodChain};

use crate::{error::ComposeError, graph::Linearization};
use entcomp_schema::{
    node::{ComponentDescriptor, EntityDefinition, FieldDescriptor, MethodDescriptor, Schema},
    types::{ChainPolicy, MergePolicy},
};
use std::collections::BTreeSet;

/// Resolve one entity against its linearization.
pub fn resolve(
    schema: &Schema,
    entity: &EntityDefinition,
    order: &Linearization,
) -> Result<MergedModel, ComposeError> {
    let components = order
        .iter()
        .map(|name| {
            schema
                .get_component(name)
                .ok_or_else(|| ComposeError::UnknownComponent {
                    entity: entity.name.clone(),
                    component: name.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let fields = merge_fields(&entity.name, &components)?;
    let methods = merge_methods(&entity.name, &components, |c| order.contains(c))?;

    Ok(MergedModel {
        entity: entity.name.clone(),
        persisted: entity.persisted,
        components: order.to_vec(),
        groups: merge_groups(&components),
        fields,
        methods,
    })
}

///
/// PendingField
///

struct PendingField<'a> {
    first: &'a str,
    decl: &'a FieldDescriptor,
    merged: MergedField,
}

fn merge_fields(
    entity: &str,
    components: &[&ComponentDescriptor],
) -> Result<Vec<MergedField>, ComposeError> {
    let mut pending: Vec<PendingField> = Vec::new();

    for component in components {
        for field in &component.fields {
            let Some(slot) = pending.iter_mut().find(|p| p.decl.name == field.name) else {
                pending.push(PendingField {
                    first: &component.name,
                    decl: field,
                    merged: MergedField {
                        name: field.name.clone(),
                        ty: field.ty.clone(),
                        init: initial_init(field),
                        read_only: field.read_only,
                        transient: field.transient,
                        contributors: vec![component.name.clone()],
                    },
                });
                continue;
            };

            let conflict = |reason: String| ComposeError::FieldConflict {
                entity: entity.to_string(),
                field: field.name.clone(),
                first: slot.first.to_string(),
                second: component.name.clone(),
                reason,
            };

            let existing = slot.decl;
            if existing.policy != field.policy {
                return Err(conflict(format!(
                    "mixed merge policies {} and {}",
                    existing.policy, field.policy
                )));
            }

            match field.policy {
                MergePolicy::Exclusive => {
                    return Err(conflict("field is exclusive".to_string()));
                }
                MergePolicy::Shared => {
                    if !existing.same_declaration(field) {
                        return Err(conflict("shared declarations differ".to_string()));
                    }
                }
                MergePolicy::Additive => {
                    if existing.ty != field.ty {
                        return Err(conflict(format!(
                            "additive types differ: {} vs {}",
                            existing.ty, field.ty
                        )));
                    }
                    if existing.combinator != field.combinator {
                        return Err(conflict("additive combinators differ".to_string()));
                    }
                    if existing.read_only != field.read_only
                        || existing.transient != field.transient
                    {
                        return Err(conflict("additive flags differ".to_string()));
                    }
                    if let FieldInit::Combined { operands, .. } = &mut slot.merged.init {
                        operands.push(field.default.clone());
                    }
                }
            }

            slot.merged.contributors.push(component.name.clone());
        }
    }

    Ok(pending.into_iter().map(|p| p.merged).collect())
}

fn initial_init(field: &FieldDescriptor) -> FieldInit {
    match (field.policy, field.combinator) {
        (MergePolicy::Additive, Some(combinator)) => FieldInit::Combined {
            combinator,
            operands: vec![field.default.clone()],
        },
        _ => field
            .default
            .clone()
            .map_or(FieldInit::Default, FieldInit::Expr),
    }
}

///
/// PendingMethod
///

struct PendingMethod<'a> {
    first: &'a str,
    decl: &'a MethodDescriptor,
    before: Vec<Hook>,
    base: Option<Hook>,
    after: Vec<Hook>,
    replaced_by: Option<&'a str>,
}

fn merge_methods(
    entity: &str,
    components: &[&ComponentDescriptor],
    has: impl Fn(&str) -> bool,
) -> Result<Vec<MethodChain>, ComposeError> {
    let mut pending: Vec<PendingMethod> = Vec::new();

    for component in components {
        for method in &component.methods {
            if !method.applies(&has) {
                continue;
            }

            let index = match pending.iter().position(|p| p.decl.name == method.name) {
                Some(index) => index,
                None => {
                    pending.push(PendingMethod {
                        first: &component.name,
                        decl: method,
                        before: Vec::new(),
                        base: None,
                        after: Vec::new(),
                        replaced_by: None,
                    });
                    pending.len() - 1
                }
            };
            let slot = &mut pending[index];

            if slot.decl.signature != method.signature {
                return Err(ComposeError::SignatureMismatch {
                    entity: entity.to_string(),
                    method: method.name.clone(),
                    first: slot.first.to_string(),
                    second: component.name.clone(),
                });
            }

            let hook = Hook {
                component: component.name.clone(),
                body: method.body.clone(),
            };

            match method.chain {
                ChainPolicy::Before => slot.before.push(hook),
                ChainPolicy::After => slot.after.push(hook),
                ChainPolicy::Base => {
                    if let Some(existing) = &slot.base {
                        return Err(ComposeError::DuplicateBase {
                            entity: entity.to_string(),
                            method: method.name.clone(),
                            first: existing.component.clone(),
                            second: component.name.clone(),
                        });
                    }
                    slot.base = Some(hook);
                }
                ChainPolicy::Replace => {
                    if let Some(first) = slot.replaced_by {
                        return Err(ComposeError::DuplicateReplace {
                            entity: entity.to_string(),
                            method: method.name.clone(),
                            first: first.to_string(),
                            second: component.name.clone(),
                        });
                    }
                    slot.before.clear();
                    slot.after.clear();
                    slot.base = Some(hook);
                    slot.replaced_by = Some(&component.name);
                }
            }
        }
    }

    pending
        .into_iter()
        .map(|p| {
            let base = p.base.ok_or_else(|| ComposeError::MissingBase {
                entity: entity.to_string(),
                method: p.decl.name.clone(),
            })?;

            Ok(MethodChain {
                name: p.decl.name.clone(),
                signature: p.decl.signature.clone(),
                params: p.decl.params.clone(),
                receiver: p.decl.receiver,
                returns_unit: p.decl.returns_unit,
                before: p.before,
                base,
                after: p.after,
                replaced: p.replaced_by.is_some(),
            })
        })
        .collect()
}

// Union of groups in linearization order, minus every excluded group.
fn merge_groups(components: &[&ComponentDescriptor]) -> Vec<String> {
    let excluded: BTreeSet<&str> = components
        .iter()
        .flat_map(|c| c.exclude_groups.iter().map(String::as_str))
        .collect();

    let mut seen = BTreeSet::new();
    components
        .iter()
        .flat_map(|c| c.groups.iter())
        .filter(|g| !excluded.contains(g.as_str()) && seen.insert(g.as_str()))
        .cloned()
        .collect()
}

//! Definition loader: raw declarations in, validated metamodel out.
//!
//! Invariants on success:
//! - component and entity names are unique identifiers;
//! - every `requires`/`excludes`/`when` name and every requested component
//!   resolves to a declared component;
//! - no component depends on or excludes itself;
//! - every Rust fragment parsed, and is stored in canonical token form;
//! - additive fields carry a commutative combinator.


use crate::{
    SchemaError,
    decl::{ComponentDecl, Declarations, EntityDecl, FieldDecl, MethodDecl},
    err,
    error::{ErrorTree, component_route, entity_route, field_route, method_route},
    node::{ComponentDescriptor, EntityDefinition, FieldDescriptor, MethodDescriptor, Schema},
    types::{Combinator, MergePolicy},
    validate::{
        canonical_block, canonical_expr, canonical_type,
        naming::{module_name, validate_group, validate_ident},
        parse_signature,
    },
};
use std::collections::{BTreeMap, BTreeSet};

/// Validate declarations and build the metamodel.
///
/// Every problem is collected before failing, so one pass reports all
/// malformed declarations.
pub fn load(decls: &Declarations) -> Result<Schema, SchemaError> {
    let mut errs = ErrorTree::new();

    // Phase 1: component-local structure.
    let mut components = BTreeMap::new();
    for decl in &decls.components {
        let route = component_route(&decl.name);
        if let Err(reason) = validate_ident(&decl.name) {
            errs.add(route, reason);
            continue;
        }
        if components.contains_key(&decl.name) {
            err!(errs, route, "duplicate component '{}'", decl.name);
            continue;
        }
        if let Some(component) = load_component(decl, &mut errs) {
            components.insert(decl.name.clone(), component);
        }
    }

    // Phase 2: cross-component references.
    let declared: BTreeSet<&str> = decls.components.iter().map(|c| c.name.as_str()).collect();
    for decl in &decls.components {
        validate_references(decl, &declared, &mut errs);
    }

    // Phase 3: entities.
    let mut entities = Vec::with_capacity(decls.entities.len());
    let mut modules = BTreeMap::<String, &str>::new();
    for decl in &decls.entities {
        let route = entity_route(&decl.name);
        if let Err(reason) = validate_ident(&decl.name) {
            errs.add(route, reason);
            continue;
        }
        if validate_ident(&module_name(&decl.name)).is_err() {
            err!(
                errs,
                route,
                "module name '{}' is not a valid identifier",
                module_name(&decl.name)
            );
            continue;
        }
        if let Some(prev) = modules.insert(module_name(&decl.name), &decl.name) {
            if prev == decl.name {
                err!(errs, route, "duplicate entity '{}'", decl.name);
            } else {
                err!(
                    errs,
                    route,
                    "module name '{}' collides with entity '{prev}'",
                    module_name(&decl.name)
                );
            }
            continue;
        }
        if let Some(entity) = load_entity(decl, &declared, &mut errs) {
            entities.push(entity);
        }
    }

    errs.result().map_err(SchemaError::MalformedDeclaration)?;

    Ok(Schema::from_parts(components, entities))
}

fn load_component(decl: &ComponentDecl, errs: &mut ErrorTree) -> Option<ComponentDescriptor> {
    let route = component_route(&decl.name);
    let before = errs.len();

    if decl.requires.iter().any(|c| c == &decl.name) {
        err!(errs, route, "component requires itself");
    }
    if decl.excludes.iter().any(|c| c == &decl.name) {
        err!(errs, route, "component excludes itself");
    }
    for group in decl.groups.iter().chain(&decl.exclude_groups) {
        if let Err(reason) = validate_group(group) {
            errs.add(route.clone(), reason);
        }
    }

    let mut fields = Vec::with_capacity(decl.fields.len());
    for field in &decl.fields {
        if fields.iter().any(|f: &FieldDescriptor| f.name == field.name) {
            err!(errs, field_route(&decl.name, &field.name), "duplicate field");
            continue;
        }
        if let Some(desc) = load_field(&decl.name, field, errs) {
            fields.push(desc);
        }
    }

    let mut methods = Vec::with_capacity(decl.methods.len());
    for method in &decl.methods {
        if methods.iter().any(|m: &MethodDescriptor| m.name == method.name) {
            err!(errs, method_route(&decl.name, &method.name), "duplicate method");
            continue;
        }
        if let Some(desc) = load_method(&decl.name, method, errs) {
            methods.push(desc);
        }
    }

    if errs.len() > before {
        return None;
    }

    Some(ComponentDescriptor {
        name: decl.name.clone(),
        fields,
        methods,
        requires: dedup(&decl.requires),
        excludes: dedup(&decl.excludes),
        universal: decl.universal,
        groups: dedup(&decl.groups),
        exclude_groups: dedup(&decl.exclude_groups),
    })
}

fn load_field(component: &str, decl: &FieldDecl, errs: &mut ErrorTree) -> Option<FieldDescriptor> {
    let route = field_route(component, &decl.name);
    let before = errs.len();

    if let Err(reason) = validate_ident(&decl.name) {
        errs.add(route.clone(), reason);
    }

    let ty = canonical_type(&decl.ty)
        .map_err(|reason| errs.add(route.clone(), reason))
        .ok();

    let default = match &decl.default {
        Some(expr) => canonical_expr(expr)
            .map(Some)
            .map_err(|reason| errs.add(route.clone(), reason))
            .unwrap_or(None),
        None => None,
    };

    let combinator = match (decl.policy, &decl.combinator) {
        (MergePolicy::Additive, Some(name)) => name
            .parse::<Combinator>()
            .map_err(|e| errs.add(route.clone(), e.to_string()))
            .ok(),
        (MergePolicy::Additive, None) => {
            err!(errs, route, "additive field requires a combinator");
            None
        }
        (policy, Some(name)) => {
            err!(errs, route, "combinator '{name}' given for {policy} field");
            None
        }
        (_, None) => None,
    };

    if errs.len() > before {
        return None;
    }

    Some(FieldDescriptor {
        name: decl.name.clone(),
        ty: ty?,
        default,
        policy: decl.policy,
        combinator,
        read_only: decl.read_only,
        transient: decl.transient,
    })
}

fn load_method(
    component: &str,
    decl: &MethodDecl,
    errs: &mut ErrorTree,
) -> Option<MethodDescriptor> {
    let route = method_route(component, &decl.name);
    let before = errs.len();

    if let Err(reason) = validate_ident(&decl.name) {
        errs.add(route.clone(), reason);
    }

    let sig = parse_signature(&decl.signature)
        .map_err(|reason| errs.add(route.clone(), reason))
        .ok();
    if let Some(sig) = &sig
        && sig.ident != decl.name
    {
        err!(errs, route, "signature names '{}' but method is '{}'", sig.ident, decl.name);
    }

    let body = canonical_block(&decl.body)
        .map_err(|reason| errs.add(route.clone(), reason))
        .ok();

    if decl.when.iter().any(|c| c == component) {
        err!(errs, route, "method condition names its own component");
    }

    if errs.len() > before {
        return None;
    }
    let sig = sig?;

    Some(MethodDescriptor {
        name: decl.name.clone(),
        signature: sig.canonical,
        params: sig.params,
        receiver: sig.receiver,
        returns_unit: sig.returns_unit,
        body: body?,
        chain: decl.chain,
        when: dedup(&decl.when),
        when_any: decl.when_any,
    })
}

fn validate_references(decl: &ComponentDecl, declared: &BTreeSet<&str>, errs: &mut ErrorTree) {
    let route = component_route(&decl.name);

    for name in &decl.requires {
        if !declared.contains(name.as_str()) {
            err!(errs, route, "requires unknown component '{name}'");
        }
    }
    for name in &decl.excludes {
        if !declared.contains(name.as_str()) {
            err!(errs, route, "excludes unknown component '{name}'");
        }
    }
    for method in &decl.methods {
        for name in &method.when {
            if !declared.contains(name.as_str()) {
                err!(
                    errs,
                    method_route(&decl.name, &method.name),
                    "condition names unknown component '{name}'"
                );
            }
        }
    }
}

fn load_entity(
    decl: &EntityDecl,
    declared: &BTreeSet<&str>,
    errs: &mut ErrorTree,
) -> Option<EntityDefinition> {
    let route = entity_route(&decl.name);
    let before = errs.len();

    if decl.components.is_empty() {
        err!(errs, route, "no components requested");
    }

    let mut seen = BTreeSet::new();
    for name in &decl.components {
        if !declared.contains(name.as_str()) {
            err!(errs, route, "requests unknown component '{name}'");
        } else if !seen.insert(name.as_str()) {
            err!(errs, route, "requests component '{name}' twice");
        }
    }

    if errs.len() > before {
        return None;
    }

    Some(EntityDefinition {
        name: decl.name.clone(),
        components: decl.components.clone(),
        persisted: decl.persisted,
    })
}

// Keep first occurrence order.
fn dedup(names: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    names
        .iter()
        .filter(|n| seen.insert(n.as_str()))
        .cloned()
        .collect()
}

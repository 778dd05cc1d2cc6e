//! Syntax checks shared by the loader.
//!
//! Every user-supplied Rust fragment is parsed once here and stored in its
//! canonical token rendering, so later stages compare and re-emit plain
//! strings and never hold `syn` values across threads.

pub mod naming;

use crate::node::Receiver;
use quote::ToTokens;
use syn::{FnArg, Pat, ReturnType, TraitItemFn, Type};

/// Canonical token rendering of any parsed fragment.
fn canonical<T: ToTokens>(node: &T) -> String {
    node.to_token_stream().to_string()
}

/// Validate a Rust type expression and return its canonical form.
pub(crate) fn canonical_type(source: &str) -> Result<String, String> {
    if source.trim().is_empty() {
        return Err("missing type".to_string());
    }

    syn::parse_str::<Type>(source)
        .map(|ty| canonical(&ty))
        .map_err(|e| format!("invalid type '{source}': {e}"))
}

/// Validate a default-value expression and return its canonical form.
pub(crate) fn canonical_expr(source: &str) -> Result<String, String> {
    if source.trim().is_empty() {
        return Err("empty default expression".to_string());
    }

    syn::parse_str::<syn::Expr>(source)
        .map(|expr| canonical(&expr))
        .map_err(|e| format!("invalid default expression '{source}': {e}"))
}

/// Validate a body template. A body may be given with or without the
/// surrounding braces; the canonical form always carries them.
pub(crate) fn canonical_block(source: &str) -> Result<String, String> {
    let trimmed = source.trim();
    let braced = if trimmed.starts_with('{') && syn::parse_str::<syn::Block>(trimmed).is_ok() {
        trimmed.to_string()
    } else {
        format!("{{ {trimmed} }}")
    };

    syn::parse_str::<syn::Block>(&braced)
        .map(|block| canonical(&block))
        .map_err(|e| format!("invalid body: {e}"))
}

///
/// ParsedSignature
///

#[derive(Debug)]
pub(crate) struct ParsedSignature {
    pub canonical: String,
    pub ident: String,
    pub receiver: Receiver,
    pub params: Vec<String>,
    pub returns_unit: bool,
}

/// Parse a method signature such as `fn update(&mut self, dt: f32)`.
///
/// Chained methods forward their arguments to every contributor, so the
/// signature must be plain: reference receiver or none, identifier
/// parameters, no `async`/`unsafe`/`const`/`extern` qualifiers.
pub(crate) fn parse_signature(source: &str) -> Result<ParsedSignature, String> {
    let trimmed = source.trim().trim_end_matches(';').trim();
    if trimmed.is_empty() {
        return Err("missing signature".to_string());
    }

    let item = syn::parse_str::<TraitItemFn>(&format!("{trimmed};"))
        .map_err(|e| format!("invalid signature '{trimmed}': {e}"))?;
    let sig = item.sig;

    if sig.asyncness.is_some()
        || sig.unsafety.is_some()
        || sig.constness.is_some()
        || sig.abi.is_some()
    {
        return Err("qualified signatures (async/unsafe/const/extern) cannot be chained".into());
    }
    if sig.variadic.is_some() {
        return Err("variadic signatures cannot be chained".into());
    }

    let receiver = match sig.receiver() {
        None => Receiver::None,
        Some(r) if r.colon_token.is_some() => {
            return Err("typed receivers cannot be chained".into());
        }
        Some(r) if r.reference.is_none() => {
            return Err("by-value receivers cannot be chained".into());
        }
        Some(r) if r.mutability.is_some() => Receiver::RefMut,
        Some(_) => Receiver::Ref,
    };

    let mut params = Vec::new();
    for input in &sig.inputs {
        let FnArg::Typed(pat_type) = input else {
            continue;
        };
        match pat_type.pat.as_ref() {
            Pat::Ident(pat) if pat.by_ref.is_none() && pat.subpat.is_none() => {
                params.push(pat.ident.to_string());
            }
            other => {
                return Err(format!(
                    "parameter pattern '{}' must be a plain identifier",
                    canonical(other)
                ));
            }
        }
    }

    let returns_unit = match &sig.output {
        ReturnType::Default => true,
        ReturnType::Type(_, ty) => matches!(ty.as_ref(), Type::Tuple(t) if t.elems.is_empty()),
    };

    Ok(ParsedSignature {
        canonical: canonical(&sig),
        ident: sig.ident.to_string(),
        receiver,
        params,
        returns_unit,
    })
}

///
/// TESTS
///

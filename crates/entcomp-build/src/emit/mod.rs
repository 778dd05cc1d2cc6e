//! Code emitter: renders one [`MergedModel`] plus a registry snapshot into
//! the Rust source of one entity module.
//!
//! Emission is pure; identical inputs give byte-identical output.

#[cfg(test)]
mod tests;

use crate::{
    error::EmitError,
    resolve::{FieldInit, MergedField, MergedModel, MethodChain},
};
use entcomp_paths::CratePaths;
use entcomp_registry::Snapshot;
use entcomp_schema::{node::Receiver, types::Combinator, validate::naming::module_name};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use std::collections::BTreeSet;
use syn::{Block, Expr, TraitItemFn, Type, parse::Parse};

/// First line of every generated file.
pub const GENERATED_HEADER: &str = "// @generated by entcomp. Do not edit.";

/// File name of the module index.
pub const INDEX_FILE: &str = "mod.rs";

///
/// ModuleLayout
/// How the index reaches each entity file.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum ModuleLayout {
    /// Files live in a source directory: `pub mod tank;`.
    #[default]
    Source,

    /// Files live under `$OUT_DIR/<subdir>` and are pulled in with `include!`.
    OutDir { subdir: String },
}

///
/// EmitOptions
///

#[derive(Clone, Debug)]
pub struct EmitOptions {
    pub paths: CratePaths,
    pub layout: ModuleLayout,
}

impl EmitOptions {
    #[must_use]
    pub const fn new(paths: CratePaths, layout: ModuleLayout) -> Self {
        Self { paths, layout }
    }
}

/// File name generated for an entity.
#[must_use]
pub fn entity_file_name(entity: &str) -> String {
    format!("{}.rs", module_name(entity))
}

/// Render the module for one entity.
pub fn emit_entity(
    model: &MergedModel,
    snapshot: &Snapshot,
    options: &EmitOptions,
) -> Result<String, EmitError> {
    let tokens = EntityEmitter::new(model, options).emit(snapshot)?;

    Ok(format!(
        "{GENERATED_HEADER}\n// entity: {}\n// fingerprint: {:016x}\n\n{}\n",
        model.entity,
        model.fingerprint(),
        render(tokens, &options.layout)
    ))
}

/// Render the index module declaring every entity and `register_all`.
#[must_use]
pub fn emit_index(models: &[MergedModel], options: &EmitOptions) -> String {
    let rt = options.paths.runtime_tokens();
    let mut mods = Vec::with_capacity(models.len());
    let mut uses = Vec::with_capacity(models.len());
    let mut registers = Vec::new();

    for model in models {
        let module = format_ident!("{}", module_name(&model.entity));
        let ident = format_ident!("{}", model.entity);

        mods.push(match &options.layout {
            ModuleLayout::Source => quote!(pub mod #module;),
            ModuleLayout::OutDir { subdir } => {
                let file = format!("/{subdir}/{}", entity_file_name(&model.entity));
                quote! {
                    pub mod #module {
                        include!(concat!(env!("OUT_DIR"), #file));
                    }
                }
            }
        });
        uses.push(quote!(pub use #module::#ident;));

        if model.persisted {
            registers.push(quote!(mapping.register::<#ident>()?;));
        }
    }

    let tokens = quote! {
        #(#mods)*
        #(#uses)*

        /// Register every persisted entity with a runtime mapping.
        #[allow(unused_variables)]
        pub fn register_all(
            mapping: &mut #rt::EntityMapping,
        ) -> ::core::result::Result<(), #rt::MappingError> {
            #(#registers)*
            Ok(())
        }
    };

    format!("{GENERATED_HEADER}\n\n{}\n", render(tokens, &options.layout))
}

// Source-directory files are pretty-printed; OUT_DIR files keep the raw
// token rendering.
fn render(tokens: TokenStream, layout: &ModuleLayout) -> String {
    match layout {
        ModuleLayout::Source => match syn::parse2::<syn::File>(tokens.clone()) {
            Ok(file) => prettyplease::unparse(&file).trim_end().to_string(),
            Err(_) => tokens.to_string(),
        },
        ModuleLayout::OutDir { .. } => tokens.to_string(),
    }
}

///
/// EntityEmitter
///

struct EntityEmitter<'a> {
    model: &'a MergedModel,
    rt: TokenStream,
    names: BTreeSet<String>,
}

impl<'a> EntityEmitter<'a> {
    fn new(model: &'a MergedModel, options: &EmitOptions) -> Self {
        Self {
            model,
            rt: options.paths.runtime_tokens(),
            names: BTreeSet::from(["create".to_string()]),
        }
    }

    fn emit(mut self, snapshot: &Snapshot) -> Result<TokenStream, EmitError> {
        let model = self.model;
        let rt = self.rt.clone();
        let ident = format_ident!("{}", model.entity);

        // Phase 1: fields, constructor and accessors.
        let mut field_defs = Vec::with_capacity(model.fields.len());
        let mut inits = Vec::with_capacity(model.fields.len());
        let mut accessors = Vec::new();
        for field in &model.fields {
            let name = format_ident!("{}", field.name);
            let ty: Type = self.parse("field type", &field.ty)?;

            let skip = (field.transient && model.persisted).then(|| quote!(#[serde(skip)]));
            field_defs.push(quote!(#skip #name: #ty));

            let init = self.field_init(field, &ty)?;
            inits.push(quote!(#name: #init));

            self.claim(&field.name)?;
            accessors.push(quote! {
                #[must_use]
                pub const fn #name(&self) -> &#ty {
                    &self.#name
                }
            });

            if !field.read_only {
                let setter = format_ident!("set_{}", field.name);
                self.claim(&setter.to_string())?;
                accessors.push(quote! {
                    pub fn #setter(&mut self, value: #ty) {
                        self.#name = value;
                    }
                });
            }
        }

        // Phase 2: hook fns and the public chained methods.
        let mut hooks = Vec::new();
        let mut methods = Vec::with_capacity(model.methods.len());
        for chain in &model.methods {
            let (hook_fns, method) = self.method(chain)?;
            hooks.extend(hook_fns);
            methods.push(method);
        }

        // Phase 3: runtime contract.
        let struct_def = if model.persisted {
            let serde_path = quote!(#rt::__reexports::serde)
                .to_string()
                .replace(' ', "");
            quote! {
                #[derive(
                    Clone,
                    Debug,
                    #rt::__reexports::serde::Serialize,
                    #rt::__reexports::serde::Deserialize
                )]
                #[serde(crate = #serde_path, default)]
                pub struct #ident {
                    #(#field_defs),*
                }
            }
        } else {
            quote! {
                #[derive(Clone, Debug)]
                pub struct #ident {
                    #(#field_defs),*
                }
            }
        };

        let name = model.entity.as_str();
        let groups = model.groups.iter().map(String::as_str);
        let entity_impl = quote! {
            impl #rt::Entity for #ident {
                const NAME: &'static str = #name;
                const GROUPS: &'static [&'static str] = &[#(#groups),*];

                fn create() -> Self {
                    Self::create()
                }
            }
        };

        let persisted_impl = if model.persisted {
            let entry = snapshot
                .get(name)
                .ok_or_else(|| EmitError::MissingId(name.to_string()))?;
            let (id, revision) = (entry.id, entry.revision);

            quote! {
                impl #rt::Persisted for #ident {
                    const CLASS_ID: u32 = #id;
                    const REVISION: u32 = #revision;
                }
            }
        } else {
            quote!()
        };

        Ok(quote! {
            #struct_def

            impl #ident {
                /// Construct with every field at its declared default.
                #[must_use]
                pub fn create() -> Self {
                    Self {
                        #(#inits),*
                    }
                }

                #(#accessors)*
                #(#methods)*
                #(#hooks)*
            }

            impl ::core::default::Default for #ident {
                fn default() -> Self {
                    Self::create()
                }
            }

            #entity_impl
            #persisted_impl
        })
    }

    fn field_init(&self, field: &MergedField, ty: &Type) -> Result<TokenStream, EmitError> {
        let default = quote!(::core::default::Default::default());

        match &field.init {
            FieldInit::Default => Ok(default),
            FieldInit::Expr(expr) => {
                let expr: Expr = self.parse("default expression", expr)?;
                Ok(quote!(#expr))
            }
            FieldInit::Combined {
                combinator,
                operands,
            } => {
                // each operand is pinned to the field type so literal
                // defaults still resolve `.min()`/`.max()`
                let mut typed = Vec::with_capacity(operands.len());
                for operand in operands {
                    let value = match operand {
                        Some(expr) => {
                            let expr: Expr = self.parse("default expression", expr)?;
                            quote!(#expr)
                        }
                        None => default.clone(),
                    };
                    typed.push(quote!({ let value: #ty = #value; value }));
                }

                Ok(combine(*combinator, typed))
            }
        }
    }

    fn method(
        &mut self,
        chain: &MethodChain,
    ) -> Result<(Vec<TokenStream>, TokenStream), EmitError> {
        let item: TraitItemFn = self.parse("signature", &format!("{};", chain.signature))?;
        let sig = item.sig;
        self.claim(&chain.name)?;

        let params: Vec<_> = chain.params.iter().map(|p| format_ident!("{}", p)).collect();

        let mut hook_fns = Vec::new();
        let mut calls = Vec::new();
        for hook in chain.hooks() {
            let hook_ident = format_ident!("__{}_{}", chain.name, module_name(&hook.component));
            self.claim(&hook_ident.to_string())?;

            let mut hook_sig = sig.clone();
            hook_sig.ident = hook_ident.clone();
            let body: Block = self.parse("body", &hook.body)?;
            let doc = format!(" `{}` contribution from `{}`.", chain.name, hook.component);

            hook_fns.push(quote! {
                #[doc = #doc]
                #[allow(unused_variables, clippy::unused_self)]
                #hook_sig #body
            });

            calls.push(match chain.receiver {
                Receiver::None => quote!(Self::#hook_ident(#(#params),*)),
                Receiver::Ref | Receiver::RefMut => quote!(self.#hook_ident(#(#params),*)),
            });
        }

        let after_calls = calls.split_off(chain.before.len() + 1);
        let base_call = calls.pop();
        let before_calls = calls;

        let body = if chain.returns_unit {
            quote! {
                #(#before_calls;)*
                #base_call;
                #(#after_calls;)*
            }
        } else {
            quote! {
                #(let _ = #before_calls;)*
                let __result = #base_call;
                #(let _ = #after_calls;)*
                __result
            }
        };

        Ok((hook_fns, quote!(pub #sig { #body })))
    }

    fn claim(&mut self, name: &str) -> Result<(), EmitError> {
        if self.names.insert(name.to_string()) {
            Ok(())
        } else {
            Err(EmitError::NameCollision {
                entity: self.model.entity.clone(),
                name: name.to_string(),
            })
        }
    }

    fn parse<T: Parse>(&self, what: &str, source: &str) -> Result<T, EmitError> {
        syn::parse_str::<T>(source).map_err(|e| EmitError::InvalidTokens {
            entity: self.model.entity.clone(),
            what: what.to_string(),
            source_text: source.to_string(),
            reason: e.to_string(),
        })
    }
}

// Fold typed operands left to right in linearization order.
fn combine(combinator: Combinator, operands: Vec<TokenStream>) -> TokenStream {
    let mut iter = operands.into_iter();
    let Some(first) = iter.next() else {
        return quote!(::core::default::Default::default());
    };

    let infix = match combinator {
        Combinator::And => quote!(&&),
        Combinator::Or => quote!(||),
        Combinator::Product => quote!(*),
        Combinator::Sum => quote!(+),
        Combinator::Max | Combinator::Min => {
            let method = format_ident!("{}", combinator.as_str());
            return iter.fold(first, |acc, op| quote!((#acc).#method(#op)));
        }
        Combinator::Union => {
            let rest: Vec<TokenStream> = iter.collect();
            if rest.is_empty() {
                return first;
            }
            return quote! {{
                let mut acc = #first;
                #( ::core::iter::Extend::extend(&mut acc, #rest); )*
                acc
            }};
        }
    };

    iter.fold(first, |acc, op| quote!(#acc #infix #op))
}

use super::*;
use crate::{graph::linearize, resolve::resolve};
use entcomp_registry::{Registry, SnapshotEntry};
use entcomp_schema::{
    decl::{ComponentDecl, Declarations, EntityDecl, FieldDecl, MethodDecl},
    load,
    types::ChainPolicy,
};
use quote::ToTokens;
use syn::{ImplItem, Item, ItemImpl, ItemStruct};

fn options() -> EmitOptions {
    EmitOptions::new(
        CratePaths {
            runtime: "::entcomp".to_string(),
        },
        ModuleLayout::Source,
    )
}

fn models(decls: &Declarations) -> Vec<MergedModel> {
    let schema = load(decls).unwrap();

    schema
        .entities()
        .iter()
        .map(|entity| {
            let order = linearize(&schema, entity).unwrap();
            resolve(&schema, entity, &order).unwrap()
        })
        .collect()
}

fn snapshot(entries: &[(&str, u32, u32)]) -> Snapshot {
    entries
        .iter()
        .map(|&(name, id, revision)| (name.to_string(), SnapshotEntry { id, revision }))
        .collect()
}

fn tank_decls() -> Declarations {
    Declarations::new()
        .component(
            ComponentDecl::new("Shielded")
                .field(FieldDecl::new("shield", "f32").default_value("25.0"))
                .group("armored"),
        )
        .component(
            ComponentDecl::new("Armored")
                .requires("Shielded")
                .field(FieldDecl::new("armor", "u32").default_value("3").read_only())
                .field(FieldDecl::new("mass", "f32").additive("sum").default_value("40.0"))
                .method(
                    MethodDecl::new(
                        "update",
                        "fn update(&mut self, dt: f32)",
                        "{ self.shield -= dt; }",
                    )
                    .chain(ChainPolicy::Before),
                ),
        )
        .component(
            ComponentDecl::new("Mobile")
                .field(FieldDecl::new("speed", "f32"))
                .field(FieldDecl::new("mass", "f32").additive("sum").default_value("2.0"))
                .field(FieldDecl::new("path_cache", "Vec<u32>").transient())
                .method(MethodDecl::new(
                    "update",
                    "fn update(&mut self, dt: f32)",
                    "{ self.speed *= dt; }",
                ))
                .method(MethodDecl::new("top_speed", "fn top_speed(&self) -> f32", "self.speed")),
        )
        .entity(EntityDecl::new("Tank", ["Armored", "Mobile"]))
        .entity(EntityDecl::new("Barrel", ["Shielded"]).transient())
}

fn parse_items(source: &str) -> Vec<Item> {
    syn::parse_file(source).unwrap().items
}

fn find_struct<'a>(items: &'a [Item], name: &str) -> &'a ItemStruct {
    items
        .iter()
        .find_map(|item| match item {
            Item::Struct(s) if s.ident == name => Some(s),
            _ => None,
        })
        .unwrap()
}

fn find_impl<'a>(items: &'a [Item], trait_name: Option<&str>) -> &'a ItemImpl {
    items
        .iter()
        .find_map(|item| match item {
            Item::Impl(i) => {
                let name = i
                    .trait_
                    .as_ref()
                    .and_then(|(_, path, _)| path.segments.last())
                    .map(|seg| seg.ident.to_string());
                (name.as_deref() == trait_name).then_some(i)
            }
            _ => None,
        })
        .unwrap()
}

fn impl_fn_names(item: &ItemImpl) -> Vec<String> {
    item.items
        .iter()
        .filter_map(|i| match i {
            ImplItem::Fn(f) => Some(f.sig.ident.to_string()),
            _ => None,
        })
        .collect()
}

fn method_block(items: &[Item], name: &str) -> String {
    find_impl(items, None)
        .items
        .iter()
        .find_map(|i| match i {
            ImplItem::Fn(f) if f.sig.ident == name => Some(f.block.to_token_stream().to_string()),
            _ => None,
        })
        .unwrap()
}

#[test]
fn emits_struct_accessors_and_runtime_contract() {
    let models = models(&tank_decls());
    let source = emit_entity(&models[0], &snapshot(&[("Tank", 0, 2)]), &options()).unwrap();

    assert!(source.starts_with(GENERATED_HEADER));
    assert!(source.contains(&format!("// fingerprint: {:016x}", models[0].fingerprint())));

    let items = parse_items(&source);
    let tank = find_struct(&items, "Tank");
    let fields: Vec<_> = tank
        .fields
        .iter()
        .map(|f| f.ident.as_ref().unwrap().to_string())
        .collect();
    assert_eq!(fields, ["shield", "armor", "mass", "speed", "path_cache"]);

    let inherent = impl_fn_names(find_impl(&items, None));
    for name in ["create", "shield", "set_shield", "armor", "update", "top_speed"] {
        assert!(inherent.contains(&name.to_string()), "missing {name}");
    }
    // read-only field has no setter
    assert!(!inherent.contains(&"set_armor".to_string()));
    assert!(inherent.contains(&"__update_armored".to_string()));
    assert!(inherent.contains(&"__update_mobile".to_string()));

    let persisted = find_impl(&items, Some("Persisted")).to_token_stream().to_string();
    assert!(persisted.contains("CLASS_ID : u32 = 0u32"), "{persisted}");
    assert!(persisted.contains("REVISION : u32 = 2u32"), "{persisted}");

    let entity = find_impl(&items, Some("Entity")).to_token_stream().to_string();
    assert!(entity.contains("\"Tank\""));
    assert!(entity.contains("\"armored\""));
}

#[test]
fn transient_fields_skip_serialization() {
    let models = models(&tank_decls());
    let source = emit_entity(&models[0], &snapshot(&[("Tank", 0, 0)]), &options()).unwrap();
    let items = parse_items(&source);

    let tank = find_struct(&items, "Tank");
    let cache = tank
        .fields
        .iter()
        .find(|f| f.ident.as_ref().is_some_and(|i| i == "path_cache"))
        .unwrap();
    assert_eq!(cache.attrs.len(), 1);
    assert_eq!(cache.attrs[0].to_token_stream().to_string(), "# [serde (skip)]");
}

#[test]
fn chained_method_calls_hooks_in_order() {
    let models = models(&tank_decls());
    let source = emit_entity(&models[0], &snapshot(&[("Tank", 0, 0)]), &options()).unwrap();
    let items = parse_items(&source);

    let update = method_block(&items, "update");

    let armored = update.find("__update_armored").unwrap();
    let mobile = update.find("__update_mobile").unwrap();
    assert!(armored < mobile, "{update}");
}

#[test]
fn non_unit_methods_return_the_base_value() {
    let models = models(&tank_decls());
    let source = emit_entity(&models[0], &snapshot(&[("Tank", 0, 0)]), &options()).unwrap();
    let items = parse_items(&source);

    let top_speed = method_block(&items, "top_speed");

    assert!(top_speed.contains("let __result = self . __top_speed_mobile ()"), "{top_speed}");
}

#[test]
fn additive_defaults_are_folded() {
    let models = models(&tank_decls());
    let source = emit_entity(&models[0], &snapshot(&[("Tank", 0, 0)]), &options()).unwrap();
    let items = parse_items(&source);

    let create = method_block(&items, "create");

    let heavy = create.find("40.0").unwrap();
    let light = create.find("2.0").unwrap();
    assert!(heavy < light);
    assert!(create.contains(" + "), "{create}");
}

#[test]
fn transient_entities_have_no_persisted_impl() {
    let models = models(&tank_decls());
    let source = emit_entity(&models[1], &Snapshot::default(), &options()).unwrap();
    let items = parse_items(&source);

    assert!(items.iter().all(|item| match item {
        Item::Impl(i) => i
            .trait_
            .as_ref()
            .is_none_or(|(_, path, _)| !path.segments.iter().any(|s| s.ident == "Persisted")),
        _ => true,
    }));
}

#[test]
fn persisted_entity_without_id_fails() {
    let models = models(&tank_decls());

    assert_eq!(
        emit_entity(&models[0], &Snapshot::default(), &options()),
        Err(EmitError::MissingId("Tank".into()))
    );
}

#[test]
fn generated_name_collisions_fail() {
    let decls = Declarations::new()
        .component(
            ComponentDecl::new("A")
                .field(FieldDecl::new("update", "u8"))
                .method(MethodDecl::new("update", "fn update(&self)", "{}")),
        )
        .entity(EntityDecl::new("E", ["A"]).transient());
    let models = models(&decls);

    assert_eq!(
        emit_entity(&models[0], &Snapshot::default(), &options()),
        Err(EmitError::NameCollision {
            entity: "E".into(),
            name: "update".into(),
        })
    );
}

#[test]
fn emission_is_deterministic() {
    let snap = snapshot(&[("Tank", 4, 1)]);
    let first = emit_entity(&models(&tank_decls())[0], &snap, &options()).unwrap();
    let second = emit_entity(&models(&tank_decls())[0], &snap, &options()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn index_declares_modules_and_registers_persisted() {
    let models = models(&tank_decls());
    let source = emit_index(&models, &options());
    let items = parse_items(&source);

    let mods: Vec<_> = items
        .iter()
        .filter_map(|item| match item {
            Item::Mod(m) => Some(m.ident.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(mods, ["tank", "barrel"]);

    assert!(source.contains("mapping.register::<Tank>()?;"), "{source}");
    assert!(!source.contains("register::<Barrel>"));
}

#[test]
fn out_dir_layout_includes_files() {
    let models = models(&tank_decls());
    let options = EmitOptions::new(
        CratePaths {
            runtime: "::entcomp".to_string(),
        },
        ModuleLayout::OutDir {
            subdir: "entcomp".to_string(),
        },
    );

    let source = emit_index(&models[..1], &options);
    assert!(source.contains("\"/entcomp/tank.rs\""), "{source}");
    assert!(syn::parse_file(&source).is_ok());
}

#[test]
fn source_layout_is_pretty_printed() {
    let models = models(&tank_decls());
    let source = emit_entity(&models[0], &snapshot(&[("Tank", 3, 0)]), &options()).unwrap();

    assert!(source.starts_with(GENERATED_HEADER));
    assert!(source.contains("\npub struct Tank {\n"), "{source}");
    assert!(source.contains("    const CLASS_ID: u32 = 3u32;\n"), "{source}");
    assert!(syn::parse_file(&source).is_ok());
}

#[test]
fn union_of_one_operand_is_that_operand() {
    let single = combine(Combinator::Union, vec![quote!(vec![1u8])]);
    assert_eq!(single.to_string(), quote!(vec![1u8]).to_string());

    let pair = combine(Combinator::Union, vec![quote!(a), quote!(b)]).to_string();
    assert!(pair.contains("let mut acc = a"), "{pair}");
    assert!(pair.contains("Extend :: extend (& mut acc , b)"), "{pair}");
}

#[test]
fn snapshot_from_registry_feeds_emission() {
    let mut registry = Registry::in_memory();
    registry.lookup_or_assign("Tank").unwrap();

    let models = models(&tank_decls());
    assert!(emit_entity(&models[0], &registry.snapshot(), &options()).is_ok());
}

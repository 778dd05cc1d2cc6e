use entcomp_build::{
    Artifact, BuildError, ComposeError, Downgrade, DowngradeError, FeatureGate, Generator,
    GeneratorOptions, RuntimeVersion,
    emit::{EmitOptions, GENERATED_HEADER, ModuleLayout},
    paths::CratePaths,
    registry::{Record, Registry, SharedRegistry},
    schema::decl::{ComponentDecl, Declarations, EntityDecl, FieldDecl, MethodDecl},
};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

///
/// TempDir
///

struct TempDir(PathBuf);

impl TempDir {
    fn new() -> Self {
        let n = NEXT_DIR.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!("entcomp-pipeline-{}-{n}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        Self(dir)
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

fn options() -> GeneratorOptions {
    GeneratorOptions::new(EmitOptions::new(
        CratePaths {
            runtime: "::entcomp".to_string(),
        },
        ModuleLayout::Source,
    ))
}

fn components() -> Declarations {
    Declarations::new()
        .component(
            ComponentDecl::new("Shielded")
                .field(FieldDecl::new("shield", "f32").default_value("25.0")),
        )
        .component(
            ComponentDecl::new("Armored")
                .requires("Shielded")
                .field(FieldDecl::new("armor", "u32").default_value("3")),
        )
        .component(
            ComponentDecl::new("Mobile")
                .field(FieldDecl::new("speed", "f32"))
                .method(MethodDecl::new(
                    "update",
                    "fn update(&mut self, dt: f32)",
                    "{ let _ = dt; }",
                )),
        )
}

fn first_build() -> Declarations {
    components()
        .entity(EntityDecl::new("Tank", ["Armored", "Mobile"]))
        .entity(EntityDecl::new("Drone", ["Mobile"]))
}

fn second_build() -> Declarations {
    components()
        .entity(EntityDecl::new("Tank", ["Armored", "Mobile"]))
        .entity(EntityDecl::new("Scout", ["Mobile"]))
}

fn artifact<'a>(artifacts: &'a [Artifact], name: &str) -> &'a Artifact {
    artifacts.iter().find(|a| a.name == name).unwrap()
}

#[test]
fn ids_stay_stable_across_builds() {
    let dir = TempDir::new();
    let registry_path = dir.path().join("entities.reg");

    // first build
    let registry = SharedRegistry::new(Registry::open(&registry_path).unwrap());
    let output = Generator::new(options()).generate(&first_build(), &registry).unwrap();

    let tank_model = &output.models[0];
    assert_eq!(tank_model.components, ["Shielded", "Armored", "Mobile"]);
    assert_eq!(registry.lookup("Tank").unwrap(), Some(0));
    assert_eq!(registry.lookup("Drone").unwrap(), Some(1));

    let names: Vec<_> = output.artifacts.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["tank.rs", "drone.rs", "mod.rs"]);

    // second build drops Drone and adds Scout
    let registry = SharedRegistry::new(Registry::open(&registry_path).unwrap());
    let mut options = options();
    options.retire_missing = true;
    let output = Generator::new(options).generate(&second_build(), &registry).unwrap();

    assert_eq!(registry.lookup("Tank").unwrap(), Some(0));
    assert_eq!(registry.lookup("Scout").unwrap(), Some(2));
    assert_eq!(registry.lookup("Drone").unwrap(), None);

    assert!(output.delta.contains(&Record::Assign {
        name: "Scout".into(),
        id: 2
    }));
    assert!(output.delta.contains(&Record::Retire {
        name: "Drone".into(),
        id: 1
    }));

    let scout = &artifact(&output.artifacts, "scout.rs").contents;
    assert!(scout.contains("const CLASS_ID: u32 = 2u32;"), "{scout}");

    // a retired id is never reused
    let reopened = Registry::open(&registry_path).unwrap();
    assert!(reopened.is_retired("Drone"));
}

#[test]
fn same_input_gives_identical_output() {
    let run = || {
        let registry = SharedRegistry::new(Registry::in_memory());
        Generator::new(options()).generate(&first_build(), &registry).unwrap()
    };

    let first = run();
    let second = run();

    assert_eq!(first.artifacts, second.artifacts);
    assert_eq!(first.delta, second.delta);
}

#[test]
fn failed_pass_appends_nothing() {
    let dir = TempDir::new();
    let registry_path = dir.path().join("entities.reg");
    let decls = first_build()
        .component(ComponentDecl::new("Heavy").field(FieldDecl::new("armor", "u32")))
        .entity(EntityDecl::new("Brick", ["Armored", "Heavy"]));

    let registry = SharedRegistry::new(Registry::open(&registry_path).unwrap());
    let err = Generator::new(options()).generate(&decls, &registry).unwrap_err();

    assert!(matches!(
        err,
        BuildError::Compose(ComposeError::FieldConflict { ref field, .. }) if field == "armor"
    ));
    assert_eq!(registry.lookup("Tank").unwrap(), None);
    assert!(!registry_path.exists());
}

#[test]
fn downgrade_failure_aborts_before_registry_changes() {
    let registry = SharedRegistry::new(Registry::in_memory());
    let mut options = options();
    options.min_runtime = Some(RuntimeVersion::new(1, 0));

    let gate = FeatureGate::new().rule("persisted", "Persisted", RuntimeVersion::new(2, 0));
    let err = Generator::new(options)
        .with_downgrader(gate)
        .generate(&first_build(), &registry)
        .unwrap_err();

    assert!(matches!(
        err,
        BuildError::Downgrade(DowngradeError::UnsupportedConstruct(ref name)) if name == "persisted"
    ));
    assert_eq!(registry.snapshot().unwrap().len(), 0);
}

///
/// Banner
/// Test downgrader that prepends a marker line.
///

struct Banner;

impl Downgrade for Banner {
    fn downgrade(
        &self,
        artifact: Artifact,
        target: RuntimeVersion,
    ) -> Result<Artifact, DowngradeError> {
        Ok(Artifact::new(
            artifact.name,
            format!("// target runtime {target}\n{}", artifact.contents),
        ))
    }
}

#[test]
fn downgrader_sees_every_artifact() {
    let registry = SharedRegistry::new(Registry::in_memory());
    let mut options = options();
    options.min_runtime = Some(RuntimeVersion::new(1, 4));

    let output = Generator::new(options)
        .with_downgrader(Banner)
        .generate(&first_build(), &registry)
        .unwrap();

    assert!(
        output
            .artifacts
            .iter()
            .all(|a| a.contents.starts_with("// target runtime 1.4\n"))
    );
}

#[test]
fn layout_changes_bump_the_revision() {
    let registry = SharedRegistry::new(Registry::in_memory());
    let generator = Generator::new(options());

    generator.generate(&first_build(), &registry).unwrap();
    let grown = first_build()
        .component(ComponentDecl::new("Cargo").field(FieldDecl::new("load", "u32")));
    let grown = Declarations {
        entities: vec![
            EntityDecl::new("Tank", ["Armored", "Mobile", "Cargo"]),
            EntityDecl::new("Drone", ["Mobile"]),
        ],
        ..grown
    };
    let output = generator.generate(&grown, &registry).unwrap();

    assert_eq!(registry.lookup("Tank").unwrap(), Some(0));
    assert_eq!(
        output.delta,
        [Record::Revision {
            name: "Tank".into(),
            revision: 1,
            layout: output.models[0].layout_hash(),
        }]
    );
    let tank = &artifact(&output.artifacts, "tank.rs").contents;
    assert!(tank.contains("const REVISION: u32 = 1u32;"), "{tank}");
}

#[test]
fn write_only_touches_changed_files() {
    let dir = TempDir::new();
    let out = dir.path().join("gen");
    let registry = SharedRegistry::new(Registry::in_memory());
    let generator = Generator::new(options());

    let output = generator.generate(&first_build(), &registry).unwrap();
    assert_eq!(Generator::write(&output, &out).unwrap(), 3);
    assert_eq!(Generator::write(&output, &out).unwrap(), 0);

    // files from a previous pass that are no longer produced are removed,
    // hand-written files are left alone
    fs::write(out.join("old.rs"), format!("{GENERATED_HEADER}\n")).unwrap();
    fs::write(out.join("manual.rs"), "pub fn keep() {}\n").unwrap();

    let output = generator.generate(&second_build(), &registry).unwrap();
    assert_eq!(Generator::write(&output, &out).unwrap(), 2);

    assert!(out.join("scout.rs").exists());
    assert!(!out.join("drone.rs").exists());
    assert!(!out.join("old.rs").exists());
    assert!(out.join("manual.rs").exists());
}

#[test]
fn build_script_runs_from_config() {
    let dir = TempDir::new();
    let declarations = dir.path().join("entities.json");
    let config = dir.path().join("entcomp.toml");

    let json = r#"{
        "components": [
            { "name": "Mobile", "fields": [{ "name": "speed", "type": "f32", "default": "1.5" }] }
        ],
        "entities": [{ "name": "Drone", "components": ["Mobile"] }]
    }"#;
    fs::write(&declarations, json).unwrap();
    fs::write(
        &config,
        "[generator]\ndeclarations = \"entities.json\"\nregistry = \"entities.reg\"\nout_dir = \"gen\"\nruntime_crate = \"::entcomp\"\n",
    )
    .unwrap();

    let output = entcomp_build::build_script(&config).unwrap();

    assert_eq!(output.delta.len(), 2);
    assert!(dir.path().join("gen/drone.rs").exists());
    assert!(dir.path().join("gen/mod.rs").exists());
    assert_eq!(Registry::open(dir.path().join("entities.reg")).unwrap().lookup("Drone"), Some(0));
}

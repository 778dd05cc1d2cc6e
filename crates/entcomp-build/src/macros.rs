//! Build-script entry points.

use crate::{
    error::BuildError,
    generator::{GeneratedOutput, Generator, GeneratorOptions, OUT_SUBDIR},
};
use entcomp_config_build::ConfigFile;
use entcomp_paths::RUNTIME_CRATE_ENV;
use entcomp_registry::{Registry, SharedRegistry};
use entcomp_schema::decl::Declarations;
use std::{env, fs, path::PathBuf};

/// Run one generation pass driven by an `entcomp.toml`, printing the cargo
/// directives a build script needs.
pub fn build_script(config_path: impl Into<PathBuf>) -> Result<GeneratedOutput, BuildError> {
    let config_path = config_path.into();

    //
    // CARGO
    //

    println!("cargo:rerun-if-changed={}", config_path.display());
    println!("cargo:rerun-if-env-changed={RUNTIME_CRATE_ENV}");

    let config = ConfigFile::load(&config_path)?.generator;
    println!("cargo:rerun-if-changed={}", config.declarations.display());

    let out_dir = match &config.out_dir {
        Some(dir) => dir.clone(),
        None => env::var_os("OUT_DIR")
            .map(|dir| PathBuf::from(dir).join(OUT_SUBDIR))
            .ok_or(BuildError::MissingOutDir)?,
    };

    //
    // GENERATE
    //

    let source = fs::read_to_string(&config.declarations)
        .map_err(|err| BuildError::io(&config.declarations, err))?;
    let decls = Declarations::from_json(&source)?;

    let registry = SharedRegistry::new(Registry::open(&config.registry)?);
    let generator = Generator::new(GeneratorOptions::from_config(&config)?);

    let output = generator.generate(&decls, &registry)?;
    Generator::write(&output, &out_dir)?;

    Ok(output)
}

/// Build-script helper: `entcomp::build::build!()` reads `entcomp.toml` from
/// the crate root, or `build!("path/to/entcomp.toml")`.
#[macro_export]
macro_rules! build {
    () => {
        $crate::build!($crate::config::CONFIG_FILE)
    };
    ($config:expr) => {{
        let manifest_dir =
            ::std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
        let config = ::std::path::Path::new(&manifest_dir).join($config);

        if let Err(err) = $crate::build_script(config) {
            panic!("entcomp generation failed: {err}");
        }
    }};
}

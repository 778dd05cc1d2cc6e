//! Build-time configuration read from `entcomp.toml`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error as ThisError;

/// Conventional config file name at the consuming crate's root.
pub const CONFIG_FILE: &str = "entcomp.toml";

///
/// ConfigError
///

#[remain::sorted]
#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("invalid config '{path}': {reason}")]
    Invalid { path: String, reason: String },

    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

///
/// ConfigFile
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub generator: GeneratorConfig,
}

///
/// GeneratorConfig
///
/// Relative paths are resolved against the directory holding the config
/// file by [`ConfigFile::load`].
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// JSON declarations file handed over by discovery.
    pub declarations: PathBuf,

    /// Append-only identifier registry.
    pub registry: PathBuf,

    /// Output directory; `None` means cargo's `OUT_DIR`.
    #[serde(default)]
    pub out_dir: Option<PathBuf>,

    /// Runtime path used by generated code; `None` picks the facade, or
    /// `entcomp-core` when building an entcomp crate.
    #[serde(default)]
    pub runtime_crate: Option<String>,

    /// Retire registry names that no longer have an entity.
    #[serde(default)]
    pub retire_missing: bool,

    /// Oldest runtime the emitted code must load on, e.g. `"1.0"`.
    #[serde(default)]
    pub min_runtime: Option<String>,
}

impl ConfigFile {
    /// Read, parse and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut config = Self::parse(&source, path)?;
        if let Some(base) = path.parent() {
            config.generator.resolve_relative(base);
        }

        Ok(config)
    }

    /// Parse and validate config text; `origin` only labels errors.
    pub fn parse(source: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|source| ConfigError::Parse {
            path: origin.display().to_string(),
            source,
        })?;

        config.validate(origin)?;

        Ok(config)
    }

    fn validate(&self, origin: &Path) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::Invalid {
            path: origin.display().to_string(),
            reason: reason.to_string(),
        };
        let generator = &self.generator;

        if generator.declarations.as_os_str().is_empty() {
            return Err(invalid("generator.declarations is empty"));
        }
        if generator.registry.as_os_str().is_empty() {
            return Err(invalid("generator.registry is empty"));
        }
        if generator
            .runtime_crate
            .as_ref()
            .is_some_and(|rt| rt.trim().is_empty())
        {
            return Err(invalid("generator.runtime_crate is empty"));
        }
        if let Some(version) = &generator.min_runtime
            && !valid_version(version)
        {
            return Err(invalid("generator.min_runtime must look like MAJOR or MAJOR.MINOR"));
        }

        Ok(())
    }
}

impl GeneratorConfig {
    fn resolve_relative(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };

        resolve(&mut self.declarations);
        resolve(&mut self.registry);
        if let Some(out_dir) = &mut self.out_dir {
            resolve(out_dir);
        }
    }
}

fn valid_version(version: &str) -> bool {
    let mut parts = version.trim().split('.');
    let major_ok = parts.next().is_some_and(|p| p.parse::<u32>().is_ok());
    let minor_ok = parts.next().is_none_or(|p| p.parse::<u32>().is_ok());

    major_ok && minor_ok && parts.next().is_none()
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<ConfigFile, ConfigError> {
        ConfigFile::parse(source, Path::new("entcomp.toml"))
    }

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config = parse(
            r#"
            [generator]
            declarations = "entities.json"
            registry = "entities.reg"
            "#,
        )
        .unwrap();

        let generator = config.generator;
        assert_eq!(generator.registry, PathBuf::from("entities.reg"));
        assert_eq!(generator.runtime_crate, None);
        assert_eq!(generator.out_dir, None);
        assert!(!generator.retire_missing);
        assert_eq!(generator.min_runtime, None);
    }

    #[test]
    fn parses_full_config() {
        let config = parse(
            r#"
            [generator]
            declarations = "decl/entities.json"
            registry = "entities.reg"
            out_dir = "src/gen"
            runtime_crate = "game::runtime"
            retire_missing = true
            min_runtime = "1.2"
            "#,
        )
        .unwrap();

        assert_eq!(config.generator.out_dir, Some(PathBuf::from("src/gen")));
        assert_eq!(config.generator.runtime_crate.as_deref(), Some("game::runtime"));
        assert!(config.generator.retire_missing);
        assert_eq!(config.generator.min_runtime.as_deref(), Some("1.2"));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = parse(
            r#"
            [generator]
            declarations = "a.json"
            registry = "a.reg"
            colour = "red"
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn rejects_invalid_values() {
        for source in [
            "[generator]\ndeclarations = \"\"\nregistry = \"a.reg\"\n",
            "[generator]\ndeclarations = \"a.json\"\nregistry = \"a.reg\"\nruntime_crate = \" \"\n",
            "[generator]\ndeclarations = \"a.json\"\nregistry = \"a.reg\"\nmin_runtime = \"v1\"\n",
        ] {
            assert!(
                matches!(parse(source), Err(ConfigError::Invalid { .. })),
                "{source}"
            );
        }
    }

    #[test]
    fn resolves_relative_paths_against_config_dir() {
        let mut generator = parse(
            "[generator]\ndeclarations = \"e.json\"\nregistry = \"/abs/e.reg\"\nout_dir = \"gen\"\n",
        )
        .unwrap()
        .generator;

        generator.resolve_relative(Path::new("/project"));

        assert_eq!(generator.declarations, PathBuf::from("/project/e.json"));
        assert_eq!(generator.registry, PathBuf::from("/abs/e.reg"));
        assert_eq!(generator.out_dir, Some(PathBuf::from("/project/gen")));
    }
}

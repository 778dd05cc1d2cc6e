use crate::{
    downgrade::{Artifact, Downgrade, Passthrough, RuntimeVersion},
    emit::{
        EmitOptions, GENERATED_HEADER, INDEX_FILE, ModuleLayout, emit_entity, emit_index,
        entity_file_name,
    },
    error::{BuildError, ComposeError},
    graph::linearize,
    resolve::{MergedModel, resolve},
};
use entcomp_config_build::GeneratorConfig;
use entcomp_paths::CratePaths;
use entcomp_registry::{Record, SharedRegistry, Snapshot, SnapshotEntry};
use entcomp_schema::{decl::Declarations, load, node::Schema};
use rayon::prelude::*;
use std::{collections::BTreeSet, fs, path::Path};
use tracing::{debug, info};

/// Subdirectory of `OUT_DIR` used when no output directory is configured.
pub const OUT_SUBDIR: &str = "entcomp";

///
/// GeneratorOptions
///

#[derive(Clone, Debug)]
pub struct GeneratorOptions {
    pub emit: EmitOptions,

    /// Retire registry names that have no persisted entity in this pass.
    pub retire_missing: bool,

    /// Target handed to the downgrader; `None` skips downgrading.
    pub min_runtime: Option<RuntimeVersion>,
}

impl GeneratorOptions {
    #[must_use]
    pub fn new(emit: EmitOptions) -> Self {
        Self {
            emit,
            retire_missing: false,
            min_runtime: None,
        }
    }

    /// Derive options from `entcomp.toml`. Without an explicit `out_dir`
    /// the index pulls files in from `$OUT_DIR`.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, BuildError> {
        let layout = if config.out_dir.is_some() {
            ModuleLayout::Source
        } else {
            ModuleLayout::OutDir {
                subdir: OUT_SUBDIR.to_string(),
            }
        };

        let min_runtime = config
            .min_runtime
            .as_deref()
            .map(str::parse::<RuntimeVersion>)
            .transpose()?;

        let paths = config
            .runtime_crate
            .as_deref()
            .map_or_else(CratePaths::new, CratePaths::with_runtime);

        Ok(Self {
            emit: EmitOptions::new(paths, layout),
            retire_missing: config.retire_missing,
            min_runtime,
        })
    }
}

///
/// GeneratedOutput
///

#[derive(Clone, Debug)]
pub struct GeneratedOutput {
    /// Entity files in declaration order, then the index.
    pub artifacts: Vec<Artifact>,

    /// Registry records appended by this pass.
    pub delta: Vec<Record>,

    pub models: Vec<MergedModel>,
}

///
/// Generator
///
/// Runs one build pass: load, compose every entity in parallel, assign ids,
/// emit, downgrade. Nothing is appended to the registry unless every entity
/// composes and emits.
///

pub struct Generator {
    options: GeneratorOptions,
    downgrader: Box<dyn Downgrade>,
}

impl Generator {
    #[must_use]
    pub fn new(options: GeneratorOptions) -> Self {
        Self {
            options,
            downgrader: Box::new(Passthrough),
        }
    }

    #[must_use]
    pub fn with_downgrader(mut self, downgrader: impl Downgrade + 'static) -> Self {
        self.downgrader = Box::new(downgrader);
        self
    }

    #[must_use]
    pub const fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Compose every entity. Entities are independent, so they run in
    /// parallel; the first failure in declaration order is reported.
    pub fn compose(schema: &Schema) -> Result<Vec<MergedModel>, ComposeError> {
        let results: Vec<Result<MergedModel, ComposeError>> = schema
            .entities()
            .par_iter()
            .map(|entity| {
                let order = linearize(schema, entity)?;
                debug!(entity = %entity.name, order = ?order.as_slice(), "linearized entity");

                resolve(schema, entity, &order)
            })
            .collect();

        results.into_iter().collect()
    }

    /// Run one full pass against `registry`.
    pub fn generate(
        &self,
        decls: &Declarations,
        registry: &SharedRegistry,
    ) -> Result<GeneratedOutput, BuildError> {
        // Phase 1: load and compose.
        let schema = load(decls)?;
        let models = Self::compose(&schema)?;

        // Phase 2: dry-run emission with placeholder ids so emit and
        // downgrade failures surface before the registry is touched.
        let placeholder: Snapshot = models
            .iter()
            .filter(|m| m.persisted)
            .map(|m| (m.entity.clone(), SnapshotEntry { id: 0, revision: 0 }))
            .collect();
        self.render(&models, &placeholder)?;

        // Phase 3: ids and layout revisions, in declaration order.
        let (delta, snapshot) = registry.with(|reg| {
            let start = reg.delta().len();

            for model in models.iter().filter(|m| m.persisted) {
                let id = reg.lookup_or_assign(&model.entity)?;
                let revision = reg.record_layout(&model.entity, model.layout_hash())?;
                debug!(entity = %model.entity, id, revision, "registry entry");
            }

            if self.options.retire_missing {
                let keep: BTreeSet<&str> = models
                    .iter()
                    .filter(|m| m.persisted)
                    .map(|m| m.entity.as_str())
                    .collect();
                let stale: Vec<String> = reg
                    .live_names()
                    .filter(|name| !keep.contains(name))
                    .map(ToString::to_string)
                    .collect();
                for name in &stale {
                    reg.retire(name)?;
                }
            }

            Ok((reg.delta()[start..].to_vec(), reg.snapshot()))
        })?;

        // Phase 4: emit for real.
        let artifacts = self.render(&models, &snapshot)?;

        info!(
            entities = models.len(),
            artifacts = artifacts.len(),
            appended = delta.len(),
            "entcomp generation pass complete"
        );

        Ok(GeneratedOutput {
            artifacts,
            delta,
            models,
        })
    }

    /// Write artifacts into `dir`, rewriting only files whose content
    /// changed and removing generated files no longer produced. Returns the
    /// number of files written.
    pub fn write(output: &GeneratedOutput, dir: &Path) -> Result<usize, BuildError> {
        fs::create_dir_all(dir).map_err(|err| BuildError::io(dir, err))?;

        let mut written = 0;
        for artifact in &output.artifacts {
            let path = dir.join(&artifact.name);
            if fs::read_to_string(&path).is_ok_and(|current| current == artifact.contents) {
                continue;
            }

            fs::write(&path, &artifact.contents).map_err(|err| BuildError::io(&path, err))?;
            written += 1;
        }

        let produced: BTreeSet<&str> = output.artifacts.iter().map(|a| a.name.as_str()).collect();
        for entry in fs::read_dir(dir).map_err(|err| BuildError::io(dir, err))? {
            let path = entry.map_err(|err| BuildError::io(dir, err))?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if produced.contains(name) || path.extension().is_none_or(|ext| ext != "rs") {
                continue;
            }

            let generated = fs::read_to_string(&path)
                .is_ok_and(|contents| contents.starts_with(GENERATED_HEADER));
            if generated {
                fs::remove_file(&path).map_err(|err| BuildError::io(&path, err))?;
                debug!(path = %path.display(), "removed stale generated file");
            }
        }

        debug!(dir = %dir.display(), written, "wrote generated sources");

        Ok(written)
    }

    // Emit every entity plus the index, then downgrade each artifact.
    fn render(
        &self,
        models: &[MergedModel],
        snapshot: &Snapshot,
    ) -> Result<Vec<Artifact>, BuildError> {
        let emit = &self.options.emit;

        let mut artifacts = models
            .par_iter()
            .map(|model| {
                emit_entity(model, snapshot, emit)
                    .map(|source| Artifact::new(entity_file_name(&model.entity), source))
            })
            .collect::<Result<Vec<_>, _>>()?;
        artifacts.push(Artifact::new(INDEX_FILE, emit_index(models, emit)));

        match self.options.min_runtime {
            Some(target) => artifacts
                .into_iter()
                .map(|artifact| self.downgrader.downgrade(artifact, target).map_err(Into::into))
                .collect(),
            None => Ok(artifacts),
        }
    }
}

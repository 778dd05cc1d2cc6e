//! Build-time composition engine: composition graphs, conflict resolution,
//! source emission and the generation pass that ties them to the registry.

pub mod downgrade;
pub mod emit;
pub mod error;
pub mod generator;
pub mod graph;
mod macros;
pub mod resolve;

pub use downgrade::{
    Artifact, Downgrade, DowngradeError, FeatureGate, Passthrough, RuntimeVersion,
};
pub use error::{BuildError, ComposeError, EmitError};
pub use generator::{GeneratedOutput, Generator, GeneratorOptions};
pub use macros::build_script;

// re-exports for build scripts
pub use entcomp_config_build as config;
pub use entcomp_paths as paths;
pub use entcomp_registry as registry;
pub use entcomp_schema as schema;

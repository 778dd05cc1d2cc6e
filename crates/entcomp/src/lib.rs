//! ## Crate layout
//! - `build`: the build-time generator, for use from `build.rs`.
//! - runtime: `Entity`, `Persisted`, `EntityMapping` and `SaveRecord`, the
//!   surface generated entity modules are written against.
//!
//! A build script runs `entcomp::build::build!()`; the crate then includes the
//! generated `mod.rs` and calls `register_all` on an `EntityMapping`.

#[cfg(feature = "build")]
pub use entcomp_build as build;
pub use entcomp_core as core;

pub use entcomp_core::{
    Entity, EntityMapping, MappingError, Persisted, SaveError, SaveRecord, __reexports, prelude,
};

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Append-only identifier registry for generated entity types.
//!
//! The registry file is the durable contract between builds: once a name is
//! assigned an id the pairing never changes, and a retired id is never handed
//! to a different name. Every mutation is one appended, synced line.

mod error;
mod record;
mod registry;
mod shared;
mod snapshot;

pub use error::RegistryError;
pub use record::Record;
pub use registry::Registry;
pub use shared::SharedRegistry;
pub use snapshot::{Snapshot, SnapshotEntry};

/// First line written to a fresh registry file.
pub const REGISTRY_HEADER: &str = "# entcomp entity registry v1";

//! Entities generated from `entities.json` by this crate's build script.
//!
//! Nothing here is hand-written: `build.rs` runs `entcomp::build::build!()`,
//! which writes one module per entity plus `mod.rs` under `$OUT_DIR/entcomp`.


#[allow(clippy::all, clippy::pedantic, clippy::nursery)]
pub mod entities {
    include!(concat!(env!("OUT_DIR"), "/entcomp/mod.rs"));
}

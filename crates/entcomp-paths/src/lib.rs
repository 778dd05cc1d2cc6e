use proc_macro2::TokenStream;
use quote::quote;
use syn::Path;

/// Env var overriding the runtime crate path used by generated code.
pub const RUNTIME_CRATE_ENV: &str = "ENTCOMP_RUNTIME_CRATE";

/// Runtime path for downstream crates.
pub const DEFAULT_RUNTIME: &str = "::entcomp";

/// Runtime path for the entcomp crates themselves.
pub const INTERNAL_RUNTIME: &str = "::entcomp_core";

const INTERNAL_CRATES: &[&str] = &[
    "entcomp",
    "entcomp-build",
    "entcomp-core",
    "entcomp-paths",
    "entcomp-registry",
    "entcomp-schema",
];

fn env_path(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .and_then(|value| normalize(&value))
}

fn default_path(path: &str) -> String {
    normalize(path).unwrap_or_else(|| path.to_string())
}

/// Canonical rendering of a path, or `None` if it does not parse.
fn normalize(value: &str) -> Option<String> {
    syn::parse_str::<Path>(value.trim())
        .ok()
        .map(|path| quote!(#path).to_string())
}

///
/// CratePaths
///
/// Resolves the runtime crate root referenced by generated entity code.
/// Internal entcomp crates default to `::entcomp_core` to avoid depending on
/// the facade; everything else uses the public `::entcomp` facade. The
/// `ENTCOMP_RUNTIME_CRATE` env var overrides both.
///
/// Paths are held as canonical strings so resolved paths can cross threads.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CratePaths {
    pub runtime: String,
}

impl CratePaths {
    #[must_use]
    /// Resolve paths for the crate being built, honoring the env override.
    pub fn new() -> Self {
        let pkg = std::env::var("CARGO_PKG_NAME").unwrap_or_default();
        let runtime = if INTERNAL_CRATES.contains(&pkg.as_str()) {
            INTERNAL_RUNTIME
        } else {
            DEFAULT_RUNTIME
        };

        Self {
            runtime: env_path(RUNTIME_CRATE_ENV).unwrap_or_else(|| default_path(runtime)),
        }
    }

    #[must_use]
    /// Use `runtime` unless the env override is set. An unparsable
    /// `runtime` falls back to the default facade path.
    pub fn with_runtime(runtime: &str) -> Self {
        let configured = normalize(runtime).unwrap_or_else(|| default_path(DEFAULT_RUNTIME));

        Self {
            runtime: env_path(RUNTIME_CRATE_ENV).unwrap_or(configured),
        }
    }

    /// Runtime path as tokens.
    #[must_use]
    pub fn runtime_tokens(&self) -> TokenStream {
        syn::parse_str::<Path>(&self.runtime)
            .map_or_else(|_| quote!(::entcomp), |path| quote!(#path))
    }
}

impl Default for CratePaths {
    fn default() -> Self {
        Self::new()
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, sync::Mutex};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    struct TempEnv {
        key: &'static str,
        prev: Option<String>,
    }

    impl TempEnv {
        fn set(key: &'static str, value: Option<&str>) -> Self {
            let prev = env::var(key).ok();
            unsafe {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
            Self { key, prev }
        }
    }

    impl Drop for TempEnv {
        fn drop(&mut self) {
            unsafe {
                match &self.prev {
                    Some(value) => env::set_var(self.key, value),
                    None => env::remove_var(self.key),
                }
            }
        }
    }

    #[test]
    fn internal_crates_use_core_directly() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _pkg = TempEnv::set("CARGO_PKG_NAME", Some("entcomp-core"));
        let _rt = TempEnv::set(RUNTIME_CRATE_ENV, None);

        let paths = CratePaths::new();

        assert_eq!(paths.runtime, quote!(::entcomp_core).to_string());
    }

    #[test]
    fn external_crates_use_the_facade() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _pkg = TempEnv::set("CARGO_PKG_NAME", Some("my-game"));
        let _rt = TempEnv::set(RUNTIME_CRATE_ENV, None);

        let paths = CratePaths::new();

        assert_eq!(paths.runtime, quote!(::entcomp).to_string());
        assert_eq!(
            paths.runtime_tokens().to_string(),
            quote!(::entcomp).to_string()
        );
    }

    #[test]
    fn env_override_beats_configuration() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _rt = TempEnv::set(RUNTIME_CRATE_ENV, Some(" game::runtime "));

        assert_eq!(CratePaths::new().runtime, quote!(game::runtime).to_string());
        assert_eq!(
            CratePaths::with_runtime("other").runtime,
            quote!(game::runtime).to_string()
        );
    }

    #[test]
    fn configured_runtime_is_normalized() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _rt = TempEnv::set(RUNTIME_CRATE_ENV, Some("not a path"));

        // an unparsable override is ignored
        assert_eq!(
            CratePaths::with_runtime("crate::rt").runtime,
            quote!(crate::rt).to_string()
        );
        assert_eq!(
            CratePaths::with_runtime("1nvalid").runtime,
            quote!(::entcomp).to_string()
        );
    }
}

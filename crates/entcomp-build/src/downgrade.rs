//! Downgrading collaborator: rewrites emitted artifacts so an older runtime
//! accepts them, or refuses loudly.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error as ThisError;

///
/// DowngradeError
///

#[remain::sorted]
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum DowngradeError {
    #[error("invalid runtime version '{0}'")]
    InvalidVersion(String),

    #[error("construct '{0}' cannot be expressed for the target runtime")]
    UnsupportedConstruct(String),
}

///
/// RuntimeVersion
///

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct RuntimeVersion {
    pub major: u32,
    pub minor: u32,
}

impl RuntimeVersion {
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for RuntimeVersion {
    type Err = DowngradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DowngradeError::InvalidVersion(s.to_string());

        let (major, minor) = s.trim().split_once('.').unwrap_or((s.trim(), "0"));
        let major = major.parse().map_err(|_| invalid())?;
        let minor = minor.parse().map_err(|_| invalid())?;

        Ok(Self { major, minor })
    }
}

///
/// Artifact
/// One emitted file: its name relative to the output directory and contents.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Artifact {
    pub name: String,
    pub contents: String,
}

impl Artifact {
    #[must_use]
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

///
/// Downgrade
///
/// Implementations must return functionally equivalent output or fail with
/// [`DowngradeError::UnsupportedConstruct`]; they never drop behavior.
///

pub trait Downgrade: Send + Sync {
    fn downgrade(
        &self,
        artifact: Artifact,
        target: RuntimeVersion,
    ) -> Result<Artifact, DowngradeError>;
}

///
/// Passthrough
/// The identity downgrader used when no minimum runtime is configured.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct Passthrough;

impl Downgrade for Passthrough {
    fn downgrade(
        &self,
        artifact: Artifact,
        _target: RuntimeVersion,
    ) -> Result<Artifact, DowngradeError> {
        Ok(artifact)
    }
}

///
/// FeatureGate
///
/// Refuses artifacts that use a construct introduced after the target
/// runtime. Rules match on a literal token sequence of the emitted source.
///

#[derive(Clone, Debug, Default)]
pub struct FeatureGate {
    rules: Vec<GateRule>,
}

#[derive(Clone, Debug)]
struct GateRule {
    construct: String,
    needle: String,
    since: RuntimeVersion,
}

impl FeatureGate {
    #[must_use]
    pub const fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Reject `needle` when targeting a runtime older than `since`.
    #[must_use]
    pub fn rule(
        mut self,
        construct: impl Into<String>,
        needle: impl Into<String>,
        since: RuntimeVersion,
    ) -> Self {
        self.rules.push(GateRule {
            construct: construct.into(),
            needle: needle.into(),
            since,
        });
        self
    }
}

impl Downgrade for FeatureGate {
    fn downgrade(
        &self,
        artifact: Artifact,
        target: RuntimeVersion,
    ) -> Result<Artifact, DowngradeError> {
        if let Some(rule) = self
            .rules
            .iter()
            .find(|rule| target < rule.since && artifact.contents.contains(&rule.needle))
        {
            return Err(DowngradeError::UnsupportedConstruct(rule.construct.clone()));
        }

        Ok(artifact)
    }
}

///
/// TESTS
///

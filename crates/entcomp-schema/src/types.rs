use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display},
    str::FromStr,
};
use thiserror::Error as ThisError;

///
/// MergePolicy
///
/// How a field contributed by more than one component collapses into the
/// entity's final field list.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Only one component of a composition may declare the field.
    #[default]
    Exclusive,
    /// Identical declarations collapse into one.
    Shared,
    /// Declarations combine through an associative, commutative combinator.
    Additive,
}

impl MergePolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exclusive => "exclusive",
            Self::Shared => "shared",
            Self::Additive => "additive",
        }
    }
}

impl Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// ChainPolicy
///
/// How a method contributed by more than one component becomes one
/// generated body.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainPolicy {
    #[default]
    Base,
    Before,
    After,
    Replace,
}

impl ChainPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Before => "before",
            Self::After => "after",
            Self::Replace => "replace",
        }
    }
}

impl Display for ChainPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// Combinator
///
/// Folding rule for `additive` fields. Every variant is associative and
/// commutative; the resolver folds in linearization order.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    /// Boolean conjunction.
    And,
    /// Numeric maximum via `.max()`.
    Max,
    /// Numeric minimum via `.min()`.
    Min,
    /// Boolean disjunction.
    Or,
    /// Numeric product.
    Product,
    /// Numeric sum.
    Sum,
    /// Collection union via `Extend`.
    Union,
}

impl Combinator {
    /// Combinator names that are recognised but rejected because folding them
    /// would depend on contributor order.
    pub const NON_COMMUTATIVE: &'static [&'static str] =
        &["concat", "difference", "div", "first", "last", "sub"];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Max => "max",
            Self::Min => "min",
            Self::Or => "or",
            Self::Product => "product",
            Self::Sum => "sum",
            Self::Union => "union",
        }
    }
}

impl Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// CombinatorError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum CombinatorError {
    #[error("combinator '{0}' is not commutative")]
    NonCommutative(String),

    #[error("unknown combinator '{0}'")]
    Unknown(String),
}

impl FromStr for Combinator {
    type Err = CombinatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();

        match name {
            "and" => Ok(Self::And),
            "max" => Ok(Self::Max),
            "min" => Ok(Self::Min),
            "or" => Ok(Self::Or),
            "product" => Ok(Self::Product),
            "sum" => Ok(Self::Sum),
            "union" => Ok(Self::Union),
            _ if Self::NON_COMMUTATIVE.contains(&name) => {
                Err(CombinatorError::NonCommutative(name.to_string()))
            }
            _ => Err(CombinatorError::Unknown(name.to_string())),
        }
    }
}

///
/// TESTS
///

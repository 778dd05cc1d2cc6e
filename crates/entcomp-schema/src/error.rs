use std::fmt::{self, Display};
use thiserror::Error as ThisError;

///
/// SchemaError
///

#[remain::sorted]
#[derive(Debug, ThisError)]
pub enum SchemaError {
    #[error("malformed declarations:\n{0}")]
    MalformedDeclaration(ErrorTree),

    #[error("failed to parse declarations: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SchemaError {
    /// Borrow the aggregated malformed-declaration list, if this is one.
    #[must_use]
    pub const fn malformed(&self) -> Option<&ErrorTree> {
        match self {
            Self::MalformedDeclaration(tree) => Some(tree),
            Self::Parse(_) => None,
        }
    }
}

///
/// MalformedDeclaration
/// One offending declaration and the reason it was rejected.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{declaration}: {reason}")]
pub struct MalformedDeclaration {
    pub declaration: String,
    pub reason: String,
}

///
/// ErrorTree
///
/// Accumulates every malformed declaration found in one loader pass so a
/// single build reports all of them at once. Order follows discovery order,
/// which follows declaration order.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ErrorTree {
    errors: Vec<MalformedDeclaration>,
}

impl ErrorTree {
    #[must_use]
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Record one malformed declaration.
    pub fn add(&mut self, declaration: impl Into<String>, reason: impl Into<String>) {
        self.errors.push(MalformedDeclaration {
            declaration: declaration.into(),
            reason: reason.into(),
        });
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn first(&self) -> Option<&MalformedDeclaration> {
        self.errors.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MalformedDeclaration> {
        self.errors.iter()
    }

    /// Whether any recorded error names this declaration route.
    #[must_use]
    pub fn mentions(&self, declaration: &str) -> bool {
        self.errors.iter().any(|e| e.declaration == declaration)
    }

    /// `Ok(())` when nothing was recorded.
    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {err}")?;
        }

        Ok(())
    }
}

/// Record a formatted malformed-declaration message on an [`ErrorTree`].
#[macro_export]
macro_rules! err {
    ($errs:expr, $decl:expr, $($arg:tt)*) => {
        $errs.add(::std::string::ToString::to_string(&$decl), format!($($arg)*))
    };
}

///
/// Routes
/// Human-readable locations used as the `declaration` of an error.
///

#[must_use]
pub fn component_route(component: &str) -> String {
    format!("component '{component}'")
}

#[must_use]
pub fn field_route(component: &str, field: &str) -> String {
    format!("component '{component}' field '{field}'")
}

#[must_use]
pub fn method_route(component: &str, method: &str) -> String {
    format!("component '{component}' method '{method}'")
}

#[must_use]
pub fn entity_route(entity: &str) -> String {
    format!("entity '{entity}'")
}

///
/// TESTS
///

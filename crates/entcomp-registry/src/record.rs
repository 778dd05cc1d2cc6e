//! Line codec for registry records.
//!
//! One record per line, tab-separated, kind first:
//!
//! ```text
//! assign    <name>  <id>
//! retire    <name>  <id>
//! revision  <name>  <revision>  <layout-hash-hex>
//! ```
//!
//! Readers ignore trailing fields they do not know, so newer writers may
//! extend a record without breaking older readers.

use std::fmt::Write as _;

///
/// Record
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Record {
    Assign { name: String, id: u32 },
    Retire { name: String, id: u32 },
    Revision { name: String, revision: u32, layout: u64 },
}

impl Record {
    pub const ASSIGN: &'static str = "assign";
    pub const RETIRE: &'static str = "retire";
    pub const REVISION: &'static str = "revision";

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Assign { name, .. } | Self::Retire { name, .. } | Self::Revision { name, .. } => {
                name
            }
        }
    }

    /// Encode as one newline-terminated line.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut line = String::new();
        // Writing into a String cannot fail.
        let _ = match self {
            Self::Assign { name, id } => write!(line, "{}\t{name}\t{id}", Self::ASSIGN),
            Self::Retire { name, id } => write!(line, "{}\t{name}\t{id}", Self::RETIRE),
            Self::Revision {
                name,
                revision,
                layout,
            } => write!(line, "{}\t{name}\t{revision}\t{layout:016x}", Self::REVISION),
        };
        line.push('\n');

        line
    }

    /// Decode one line (without its newline).
    ///
    /// Returns `Ok(None)` for record kinds this reader does not know.
    pub fn decode(line: &str) -> Result<Option<Self>, String> {
        let mut parts = line.split('\t');
        let kind = parts.next().unwrap_or_default();

        match kind {
            Self::ASSIGN | Self::RETIRE => {
                let name = name_field(parts.next())?;
                let id = number_field::<u32>(parts.next(), "id")?;

                Ok(Some(if kind == Self::ASSIGN {
                    Self::Assign { name, id }
                } else {
                    Self::Retire { name, id }
                }))
            }
            Self::REVISION => {
                let name = name_field(parts.next())?;
                let revision = number_field::<u32>(parts.next(), "revision")?;
                let layout = parts
                    .next()
                    .ok_or_else(|| "missing layout hash".to_string())
                    .and_then(|hex| {
                        u64::from_str_radix(hex, 16)
                            .map_err(|_| format!("invalid layout hash '{hex}'"))
                    })?;

                Ok(Some(Self::Revision {
                    name,
                    revision,
                    layout,
                }))
            }
            "" => Err("empty record kind".to_string()),
            _ if kind.bytes().all(|b| b.is_ascii_lowercase() || b == b'_') => Ok(None),
            _ => Err(format!("invalid record kind '{kind}'")),
        }
    }
}

fn name_field(field: Option<&str>) -> Result<String, String> {
    match field {
        Some(name) if valid_name(name) => Ok(name.to_string()),
        Some(name) => Err(format!("invalid name '{name}'")),
        None => Err("missing name".to_string()),
    }
}

fn number_field<T: std::str::FromStr>(field: Option<&str>, what: &str) -> Result<T, String> {
    let raw = field.ok_or_else(|| format!("missing {what}"))?;

    raw.parse::<T>()
        .map_err(|_| format!("invalid {what} '{raw}'"))
}

/// Names are written verbatim, so they must not contain separators.
pub(crate) fn valid_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(|c| c.is_whitespace() || c.is_control())
}

///
/// TESTS
///

use crate::MAX_NAME_LEN;
use convert_case::{Case, Casing};

/// Ensure a declaration name is a usable Rust identifier: non-empty, ASCII,
/// bounded, and not a keyword.
pub(crate) fn validate_ident(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name is empty".to_string());
    }
    if name.len() > MAX_NAME_LEN {
        return Err(format!("name '{name}' exceeds max length {MAX_NAME_LEN}"));
    }
    if !name.is_ascii() {
        return Err(format!("name '{name}' must be ASCII"));
    }
    // generated accessors and hooks are formed by prefixing the name
    if name.starts_with("r#") {
        return Err(format!("raw identifier '{name}' is not allowed"));
    }
    if syn::parse_str::<syn::Ident>(name).is_err() {
        return Err(format!("name '{name}' is not a valid identifier"));
    }

    Ok(())
}

/// Group names end up in generated string literals and registry lookups.
pub(crate) fn validate_group(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("group name is empty".to_string());
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(format!(
            "group name '{name}' may only contain ASCII letters, digits, '_' and '-'"
        ));
    }

    Ok(())
}

/// The module file name generated for an entity.
#[must_use]
pub fn module_name(entity: &str) -> String {
    entity.to_case(Case::Snake)
}

///
/// TESTS
///

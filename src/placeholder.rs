//! `{{ .Key }}` placeholder substitution.
//!
//! Catalog entries and override strings share this syntax, so a template
//! calling `t("...")` cannot tell which source served the string.

use crate::error::SubstitutionError;
use regex::Regex;
use std::sync::LazyLock;

static PLACEHOLDER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid regex")
});

/// Returns true if `raw` contains anything that looks like template markup.
pub fn has_placeholders(raw: &str) -> bool {
    raw.contains("{{") || raw.contains("}}")
}

/// Substitutes every `{{ .Key }}` in `raw` with `lookup(Key)`.
///
/// # Errors
/// - `SubstitutionError::Syntax` if braces remain that do not form a placeholder.
/// - `SubstitutionError::MissingKey` if `lookup` has no value for a key.
pub fn substitute<F>(raw: &str, lookup: F) -> Result<String, SubstitutionError>
where
    F: Fn(&str) -> Option<String>,
{
    if !has_placeholders(raw) {
        return Ok(raw.to_string());
    }

    let mut result = String::with_capacity(raw.len());
    let mut last = 0;

    for cap in PLACEHOLDER_REGEX.captures_iter(raw) {
        let Some(full_match) = cap.get(0) else {
            continue;
        };
        let literal = &raw[last..full_match.start()];
        check_literal(literal, last)?;
        result.push_str(literal);

        let key = &cap[1];
        let value = lookup(key).ok_or_else(|| SubstitutionError::MissingKey {
            key: key.to_string(),
        })?;
        result.push_str(&value);
        last = full_match.end();
    }

    let tail = &raw[last..];
    check_literal(tail, last)?;
    result.push_str(tail);

    Ok(result)
}

/// Rejects stray `{{` / `}}` in text between placeholders.
fn check_literal(segment: &str, offset: usize) -> Result<(), SubstitutionError> {
    let stray = [segment.find("{{"), segment.find("}}")]
        .into_iter()
        .flatten()
        .min();
    match stray {
        Some(pos) => Err(SubstitutionError::Syntax {
            offset: offset + pos,
        }),
        None => Ok(()),
    }
}

//! Order and identifier inference for slide documents.
//!
//! Order priority:
//! 1. explicit `order` metadata, when it is a number or a numeric string
//! 2. the leading numeric token of the filename (`01-intro.mdx` -> 1)
//! 3. the character code of the first filename character

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::types::OrderKey;

static NUMERIC_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)[-_. ]*").unwrap());

/// Which tier produced a slide's order key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSource {
    Explicit,
    FilenamePrefix,
    FirstCharacter,
}

/// Resolve the order key for a slide from its metadata value and filename.
pub fn resolve_order(explicit: Option<&toml::Value>, filename: &str) -> (OrderKey, OrderSource) {
    if let Some(order) = explicit.and_then(explicit_order) {
        return (order, OrderSource::Explicit);
    }
    if let Some(order) = filename_prefix_order(filename) {
        return (order, OrderSource::FilenamePrefix);
    }
    (first_character_order(filename), OrderSource::FirstCharacter)
}

/// Interpret a metadata `order` value. Anything non-numeric is "absent".
pub fn explicit_order(value: &toml::Value) -> Option<OrderKey> {
    match value {
        toml::Value::Integer(n) => OrderKey::new(*n as f64),
        toml::Value::Float(f) => OrderKey::new(*f),
        toml::Value::String(s) => s.trim().parse::<f64>().ok().and_then(OrderKey::new),
        _ => None,
    }
}

fn filename_prefix_order(filename: &str) -> Option<OrderKey> {
    let captures = NUMERIC_PREFIX.captures(filename)?;
    let digits = captures.get(1)?.as_str();
    digits.parse::<f64>().ok().and_then(OrderKey::new)
}

fn first_character_order(filename: &str) -> OrderKey {
    filename
        .chars()
        .next()
        .map(|c| OrderKey::from(c as u32))
        .unwrap_or(OrderKey::from(0))
}

/// Derive a slide id from a filename: the stem minus any numeric prefix.
///
/// `01-intro.mdx` -> `intro`, `intro.mdx` -> `intro`, `42.md` -> `42`.
pub fn derive_id(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    let stripped = NUMERIC_PREFIX.replace(stem, "");
    if stripped.is_empty() {
        stem.to_string()
    } else {
        stripped.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_of(explicit: Option<toml::Value>, filename: &str) -> (f64, OrderSource) {
        let (key, source) = resolve_order(explicit.as_ref(), filename);
        (key.value(), source)
    }

    #[test]
    fn explicit_integer_wins_over_prefix() {
        assert_eq!(
            order_of(Some(toml::Value::Integer(7)), "01-intro.mdx"),
            (7.0, OrderSource::Explicit)
        );
    }

    #[test]
    fn explicit_float_and_numeric_string_are_accepted() {
        assert_eq!(
            order_of(Some(toml::Value::Float(1.5)), "intro.mdx"),
            (1.5, OrderSource::Explicit)
        );
        assert_eq!(
            order_of(Some(toml::Value::String(" 4 ".into())), "intro.mdx"),
            (4.0, OrderSource::Explicit)
        );
    }

    #[test]
    fn unparseable_explicit_order_falls_through_to_filename() {
        assert_eq!(
            order_of(Some(toml::Value::String("first".into())), "03-beta.md"),
            (3.0, OrderSource::FilenamePrefix)
        );
        assert_eq!(
            order_of(Some(toml::Value::Boolean(true)), "beta.md"),
            (98.0, OrderSource::FirstCharacter)
        );
    }

    #[test]
    fn numeric_prefix_yields_order() {
        assert_eq!(order_of(None, "01-intro.mdx"), (1.0, OrderSource::FilenamePrefix));
        assert_eq!(order_of(None, "10_end.md"), (10.0, OrderSource::FilenamePrefix));
    }

    #[test]
    fn missing_order_uses_first_character_code() {
        assert_eq!(order_of(None, "intro.mdx"), (105.0, OrderSource::FirstCharacter));
        // Stable across calls.
        assert_eq!(order_of(None, "intro.mdx"), order_of(None, "intro.mdx"));
        assert_eq!(order_of(None, ""), (0.0, OrderSource::FirstCharacter));
    }

    #[test]
    fn derive_id_strips_extension_and_prefix() {
        assert_eq!(derive_id("01-intro.mdx"), "intro");
        assert_eq!(derive_id("02_alfa.md"), "alfa");
        assert_eq!(derive_id("intro.mdx"), "intro");
        assert_eq!(derive_id("42.md"), "42");
        assert_eq!(derive_id("end"), "end");
    }
}

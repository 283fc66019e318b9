//! Metadata block parsing for slide documents.
//!
//! Two fences are recognised at the very start of a document:
//!
//! ```text
//! +++                 ---
//! title = "Intro"     title: Intro
//! order = 1           order: 1
//! +++                 ---
//! ```
//!
//! `+++` blocks are TOML. `---` blocks are line-oriented `key: value` pairs
//! where each value is read as a TOML value if it parses as one and as a bare
//! string otherwise. A malformed block is reported and treated as absent.

/// Metadata keys the registry understands. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    /// Raw value; interpretation lives in `core::order`.
    pub order: Option<toml::Value>,
    pub id: Option<String>,
}

impl Metadata {
    fn from_table(table: &toml::Table) -> Self {
        Self {
            title: table.get("title").and_then(scalar_string),
            order: table.get("order").cloned(),
            id: table.get("id").and_then(scalar_string),
        }
    }
}

/// A document split into metadata and body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document<'a> {
    pub metadata: Metadata,
    pub body: &'a str,
    /// Set when a metadata block was present but could not be used.
    pub warning: Option<String>,
}

impl<'a> Document<'a> {
    fn plain(body: &'a str, warning: Option<String>) -> Self {
        Self {
            metadata: Metadata::default(),
            body,
            warning,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fence {
    Toml,
    KeyValue,
}

impl Fence {
    fn marker(self) -> &'static str {
        match self {
            Fence::Toml => "+++",
            Fence::KeyValue => "---",
        }
    }
}

/// Split `text` into metadata and body.
pub fn parse(text: &str) -> Document<'_> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let Some((fence, rest)) = opening_fence(text) else {
        return Document::plain(text, None);
    };
    let Some((block, body)) = split_at_closing(rest, fence) else {
        return Document::plain(
            text,
            Some(format!(
                "metadata block opened with '{}' is never closed",
                fence.marker()
            )),
        );
    };
    let table = match fence {
        Fence::Toml => toml::from_str::<toml::Table>(block).map_err(|err| err.to_string()),
        Fence::KeyValue => parse_key_values(block),
    };
    match table {
        Ok(table) => Document {
            metadata: Metadata::from_table(&table),
            body,
            warning: None,
        },
        Err(err) => Document::plain(text, Some(format!("invalid metadata block: {}", err))),
    }
}

fn opening_fence(text: &str) -> Option<(Fence, &str)> {
    let (first, rest) = text.split_once('\n')?;
    match first.trim_end() {
        "+++" => Some((Fence::Toml, rest)),
        "---" => Some((Fence::KeyValue, rest)),
        _ => None,
    }
}

/// Returns `(block, body)` around the first closing fence line.
fn split_at_closing(rest: &str, fence: Fence) -> Option<(&str, &str)> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == fence.marker() {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn parse_key_values(block: &str) -> Result<toml::Table, String> {
    let mut table = toml::Table::new();
    for (index, line) in block.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, raw)) = line.split_once(':') else {
            return Err(format!("line {}: expected 'key: value'", index + 1));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("line {}: empty key", index + 1));
        }
        table.insert(key.to_string(), scalar_value(raw.trim()));
    }
    Ok(table)
}

fn scalar_value(raw: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("v = {}", raw))
        .ok()
        .and_then(|mut table| table.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}

fn scalar_string(value: &toml::Value) -> Option<String> {
    let text = match value {
        toml::Value::String(s) => s.trim().to_string(),
        toml::Value::Integer(n) => n.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(d) => d.to_string(),
        toml::Value::Array(_) | toml::Value::Table(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_without_block_is_all_body() {
        let doc = parse("# Hello\n\nworld\n");
        assert_eq!(doc.metadata, Metadata::default());
        assert_eq!(doc.body, "# Hello\n\nworld\n");
        assert!(doc.warning.is_none());
    }

    #[test]
    fn toml_block_is_parsed() {
        let doc = parse("+++\ntitle = \"Intro\"\norder = 2\n+++\n<h1>Hi</h1>\n");
        assert_eq!(doc.metadata.title.as_deref(), Some("Intro"));
        assert_eq!(doc.metadata.order, Some(toml::Value::Integer(2)));
        assert_eq!(doc.body, "<h1>Hi</h1>\n");
    }

    #[test]
    fn key_value_block_reads_typed_and_bare_values() {
        let doc = parse(
            "---\ntitle: Alpha Features: Part 1\norder: 1.5\n# comment\n\nid: \"alfa\"\n---\nbody",
        );
        assert_eq!(doc.metadata.title.as_deref(), Some("Alpha Features: Part 1"));
        assert_eq!(doc.metadata.order, Some(toml::Value::Float(1.5)));
        assert_eq!(doc.metadata.id.as_deref(), Some("alfa"));
        assert_eq!(doc.body, "body");
    }

    #[test]
    fn crlf_fences_are_accepted() {
        let doc = parse("---\r\ntitle: Windows\r\n---\r\nbody\r\n");
        assert_eq!(doc.metadata.title.as_deref(), Some("Windows"));
        assert_eq!(doc.body, "body\r\n");
    }

    #[test]
    fn unclosed_block_is_treated_as_body() {
        let text = "---\ntitle: Oops\nno closing fence\n";
        let doc = parse(text);
        assert_eq!(doc.metadata, Metadata::default());
        assert_eq!(doc.body, text);
        assert!(doc.warning.expect("warning").contains("never closed"));
    }

    #[test]
    fn invalid_toml_block_is_reported() {
        let doc = parse("+++\ntitle = \n+++\nbody");
        assert_eq!(doc.metadata, Metadata::default());
        assert!(doc.warning.expect("warning").contains("invalid metadata"));
    }

    #[test]
    fn empty_title_is_absent() {
        let doc = parse("---\ntitle: \"\"\n---\n");
        assert_eq!(doc.metadata.title, None);
        assert_eq!(doc.body, "");
    }
}

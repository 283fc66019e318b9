//! Deck configuration stored in `deck.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::order::explicit_order;

/// How slide bodies are turned into page content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStrategy {
    /// Read every body once when the server starts.
    #[default]
    Static,
    /// Read a body on first request and cache it.
    Lazy,
}

/// Deck configuration (TOML).
///
/// Missing fields default to values that work for a `slides/` directory next
/// to the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeckConfig {
    /// Deck title shown on the landing and list pages.
    pub title: String,

    /// Directory holding slide documents, relative to the config file.
    pub slides_dir: PathBuf,

    /// File extensions (without dot) treated as slide documents.
    pub extensions: Vec<String>,

    /// Title used for slides whose metadata has none.
    pub default_title: String,

    pub content: ContentStrategy,

    /// Treat each subdirectory of `slides_dir` as its own deck.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub multi_deck: bool,

    /// Fixed manifest. When non-empty, the slides directory is not scanned.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub slides: Vec<ManifestEntry>,
}

/// One `[[slides]]` entry of a fixed manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManifestEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<toml::Value>,
    /// Document inside `slides_dir` holding the body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Inline body; takes precedence over `filename`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            title: "Slides".to_string(),
            slides_dir: PathBuf::from("slides"),
            extensions: vec!["md".to_string(), "mdx".to_string(), "html".to_string()],
            default_title: "Untitled Slide".to_string(),
            content: ContentStrategy::default(),
            multi_deck: false,
            slides: Vec::new(),
        }
    }
}

impl DeckConfig {
    pub fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(anyhow!("extensions must be a non-empty array"));
        }
        if self
            .extensions
            .iter()
            .any(|ext| ext.trim().is_empty() || ext.starts_with('.'))
        {
            return Err(anyhow!("extensions must be non-empty and written without a leading dot"));
        }
        if self.default_title.trim().is_empty() {
            return Err(anyhow!("default_title must not be empty"));
        }
        if self.multi_deck && !self.slides.is_empty() {
            return Err(anyhow!("multi_deck cannot be combined with a [[slides]] manifest"));
        }
        for (index, entry) in self.slides.iter().enumerate() {
            if entry.id.trim().is_empty() {
                return Err(anyhow!("slides[{}]: id must not be empty", index));
            }
            if let Some(order) = &entry.order
                && explicit_order(order).is_none()
            {
                return Err(anyhow!(
                    "slides[{}] ({}): order must be a finite number",
                    index,
                    entry.id
                ));
            }
        }
        Ok(())
    }

    /// Slides directory resolved against the directory holding the config.
    pub fn resolve_slides_dir(&self, base_dir: &Path) -> PathBuf {
        if self.slides_dir.is_absolute() {
            self.slides_dir.clone()
        } else {
            base_dir.join(&self.slides_dir)
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `DeckConfig::default()`.
pub fn load_config(path: &Path) -> Result<DeckConfig> {
    if !path.exists() {
        let cfg = DeckConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: DeckConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &DeckConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

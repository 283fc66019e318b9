//! Slide sources: a scanned directory of documents or a fixed manifest.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::config::{DeckConfig, ManifestEntry};
use crate::core::frontmatter::{self, Metadata};
use crate::core::order::{OrderSource, derive_id, explicit_order, resolve_order};
use crate::core::types::SlideDescriptor;

/// Where a slide body comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum BodySource {
    /// A document on disk; the metadata block is stripped on load.
    File(PathBuf),
    Inline(String),
    /// Manifest entry with neither `body` nor `filename`.
    Missing,
}

impl BodySource {
    /// Read the body text.
    pub fn load(&self) -> Result<String> {
        match self {
            BodySource::File(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("read slide {}", path.display()))?;
                Ok(frontmatter::parse(&text).body.to_string())
            }
            BodySource::Inline(body) => Ok(body.clone()),
            BodySource::Missing => Err(anyhow!("slide has no body or filename configured")),
        }
    }
}

/// A discovered slide: descriptor plus body location.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideDocument {
    pub descriptor: SlideDescriptor,
    pub order_source: OrderSource,
    pub body: BodySource,
}

/// Anything that can enumerate slide documents in discovery order.
pub trait SlideSource: Send + Sync {
    fn enumerate(&self) -> Result<Vec<SlideDocument>>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Build the source a config describes.
pub fn source_from_config(config: &DeckConfig, base_dir: &Path) -> Box<dyn SlideSource> {
    let slides_dir = config.resolve_slides_dir(base_dir);
    if config.slides.is_empty() {
        Box::new(DirectorySource::new(
            slides_dir,
            config.extensions.clone(),
            config.default_title.clone(),
        ))
    } else {
        Box::new(ManifestSource::new(
            config.slides.clone(),
            slides_dir,
            config.default_title.clone(),
        ))
    }
}

/// Non-recursive scan of a directory of slide documents.
///
/// Discovery order is filename order, so ties in `order` are deterministic.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    extensions: Vec<String>,
    default_title: String,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>, extensions: Vec<String>, default_title: String) -> Self {
        Self {
            dir: dir.into(),
            extensions,
            default_title,
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }

    fn read_document(&self, path: &Path, filename: &str) -> SlideDocument {
        let metadata = match fs::read_to_string(path) {
            Ok(text) => {
                let doc = frontmatter::parse(&text);
                if let Some(warning) = doc.warning {
                    warn!(file = %filename, %warning, "ignoring slide metadata");
                }
                doc.metadata
            }
            Err(err) => {
                warn!(file = %filename, error = %err, "failed to read slide metadata");
                Metadata::default()
            }
        };
        let (order, order_source) = resolve_order(metadata.order.as_ref(), filename);
        SlideDocument {
            descriptor: SlideDescriptor {
                id: metadata.id.unwrap_or_else(|| derive_id(filename)),
                title: metadata
                    .title
                    .unwrap_or_else(|| self.default_title.clone()),
                order,
                filename: filename.to_string(),
            },
            order_source,
            body: BodySource::File(path.to_path_buf()),
        }
    }
}

impl SlideSource for DirectorySource {
    fn enumerate(&self) -> Result<Vec<SlideDocument>> {
        let mut documents = Vec::new();
        let walker = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();
        for entry in walker {
            let entry =
                entry.with_context(|| format!("list slides in {}", self.dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(filename) = entry.file_name().to_str() else {
                continue;
            };
            if filename.starts_with('.') || !self.accepts(entry.path()) {
                continue;
            }
            let document = self.read_document(entry.path(), filename);
            debug!(
                id = %document.descriptor.id,
                order = %document.descriptor.order,
                source = ?document.order_source,
                "discovered slide"
            );
            documents.push(document);
        }
        Ok(documents)
    }

    fn describe(&self) -> String {
        format!("directory {}", self.dir.display())
    }
}

/// Fixed list of slides from `[[slides]]` config entries.
#[derive(Debug, Clone)]
pub struct ManifestSource {
    entries: Vec<ManifestEntry>,
    slides_dir: PathBuf,
    default_title: String,
}

impl ManifestSource {
    pub fn new(
        entries: Vec<ManifestEntry>,
        slides_dir: impl Into<PathBuf>,
        default_title: String,
    ) -> Self {
        Self {
            entries,
            slides_dir: slides_dir.into(),
            default_title,
        }
    }

    fn document(&self, entry: &ManifestEntry) -> SlideDocument {
        let filename = entry.filename.clone().unwrap_or_else(|| entry.id.clone());
        let (order, order_source) = match entry.order.as_ref().and_then(explicit_order) {
            Some(order) => (order, OrderSource::Explicit),
            None => resolve_order(None, &filename),
        };
        let body = match (&entry.body, &entry.filename) {
            (Some(body), _) => BodySource::Inline(body.clone()),
            (None, Some(filename)) => BodySource::File(self.slides_dir.join(filename)),
            (None, None) => BodySource::Missing,
        };
        SlideDocument {
            descriptor: SlideDescriptor {
                id: entry.id.clone(),
                title: entry
                    .title
                    .clone()
                    .unwrap_or_else(|| self.default_title.clone()),
                order,
                filename,
            },
            order_source,
            body,
        }
    }
}

impl SlideSource for ManifestSource {
    fn enumerate(&self) -> Result<Vec<SlideDocument>> {
        Ok(self.entries.iter().map(|entry| self.document(entry)).collect())
    }

    fn describe(&self) -> String {
        format!("manifest with {} entries", self.entries.len())
    }
}

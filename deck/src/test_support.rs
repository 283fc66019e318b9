//! Test-only helpers for building slides, sources and scratch decks.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, anyhow};

use crate::core::order::OrderSource;
use crate::core::sequence::SlideSequence;
use crate::core::types::{OrderKey, SlideDescriptor};
use crate::io::source::{BodySource, SlideDocument, SlideSource};

/// Descriptor with deterministic title (`"<id> title"`) and filename (`"<id>.md"`).
pub fn slide(id: &str, order: f64) -> SlideDescriptor {
    SlideDescriptor {
        id: id.to_string(),
        title: format!("{} title", id),
        order: OrderKey::new(order).expect("finite order"),
        filename: format!("{}.md", id),
    }
}

/// Build a sequence, panicking on duplicate ids.
pub fn sequence(slides: Vec<SlideDescriptor>) -> SlideSequence {
    SlideSequence::build(slides).expect("valid sequence")
}

/// Document with an inline body of `"<id> body"`.
pub fn document(id: &str, order: f64) -> SlideDocument {
    SlideDocument {
        descriptor: slide(id, order),
        order_source: OrderSource::Explicit,
        body: BodySource::Inline(format!("{} body", id)),
    }
}

/// Write a slide file into `dir` and return its path.
pub fn write_slide(dir: &Path, filename: &str, contents: &str) -> PathBuf {
    let path = dir.join(filename);
    fs::write(&path, contents).expect("write slide");
    path
}

/// Shared handle on a source's enumeration count.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// In-memory source that counts how often it is enumerated.
pub struct CountingSource {
    documents: Option<Vec<SlideDocument>>,
    calls: CallCounter,
}

impl CountingSource {
    pub fn new(documents: Vec<SlideDocument>) -> Self {
        Self {
            documents: Some(documents),
            calls: CallCounter::default(),
        }
    }

    /// A source whose enumeration always fails.
    pub fn failing() -> Self {
        Self {
            documents: None,
            calls: CallCounter::default(),
        }
    }

    pub fn calls(&self) -> CallCounter {
        self.calls.clone()
    }
}

impl SlideSource for CountingSource {
    fn enumerate(&self) -> Result<Vec<SlideDocument>> {
        self.calls.0.fetch_add(1, Ordering::SeqCst);
        self.documents
            .clone()
            .ok_or_else(|| anyhow!("slide source unavailable"))
    }

    fn describe(&self) -> String {
        "in-memory test source".to_string()
    }
}

//! The ordered slide sequence.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use super::types::SlideDescriptor;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("duplicate slide id '{id}' (from {first} and {second})")]
    DuplicateId {
        id: String,
        first: String,
        second: String,
    },
}

/// Slides sorted ascending by order key, ties kept in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SlideSequence {
    slides: Vec<SlideDescriptor>,
}

impl SlideSequence {
    /// Build a sequence from descriptors in discovery order.
    ///
    /// Rejects duplicate ids rather than letting iteration order pick a winner.
    pub fn build(mut descriptors: Vec<SlideDescriptor>) -> Result<Self, SequenceError> {
        let mut seen: HashMap<&str, &str> = HashMap::new();
        for slide in &descriptors {
            if let Some(first) = seen.insert(&slide.id, &slide.filename) {
                return Err(SequenceError::DuplicateId {
                    id: slide.id.clone(),
                    first: first.to_string(),
                    second: slide.filename.clone(),
                });
            }
        }
        // `sort_by` is stable, which is what keeps ties in discovery order.
        descriptors.sort_by(|a, b| a.order.total_cmp(&b.order));
        Ok(Self {
            slides: descriptors,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn as_slice(&self) -> &[SlideDescriptor] {
        &self.slides
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SlideDescriptor> {
        self.slides.iter()
    }

    pub fn first(&self) -> Option<&SlideDescriptor> {
        self.slides.first()
    }

    pub fn at(&self, index: usize) -> Option<&SlideDescriptor> {
        self.slides.get(index)
    }

    /// Linear lookup by id. Not finding a slide is an ordinary outcome.
    pub fn get(&self, id: &str) -> Option<&SlideDescriptor> {
        self.slides.iter().find(|slide| slide.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.slides.iter().position(|slide| slide.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.slides.iter().map(|slide| slide.id.as_str())
    }
}

impl<'a> IntoIterator for &'a SlideSequence {
    type Item = &'a SlideDescriptor;
    type IntoIter = std::slice::Iter<'a, SlideDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.slides.iter()
    }
}

//! Lazily built, explicitly owned cache of the slide sequence.
//!
//! The registry enumerates its source once and keeps the result until
//! [`SlideRegistry::invalidate`] is called. Enumeration runs outside the
//! lock, so concurrent first callers may each enumerate; the last one to
//! finish fills the cache. A build that started before an `invalidate` is
//! returned to its caller but never cached.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Result;
use tracing::{debug, info, warn};

use super::config::DeckConfig;
use super::source::{BodySource, SlideSource, source_from_config};
use crate::core::sequence::SlideSequence;
use crate::core::types::SlideDescriptor;

/// Immutable snapshot: the ordered sequence plus where each body lives.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    sequence: SlideSequence,
    bodies: HashMap<String, BodySource>,
}

impl Catalog {
    pub fn sequence(&self) -> &SlideSequence {
        &self.sequence
    }

    pub fn body(&self, id: &str) -> Option<&BodySource> {
        self.bodies.get(id)
    }
}

#[derive(Default)]
struct CacheSlot {
    /// Bumped by `invalidate`; builds started under an older value are dropped.
    generation: u64,
    catalog: Option<Arc<Catalog>>,
}

pub struct SlideRegistry {
    source: Box<dyn SlideSource>,
    cache: RwLock<CacheSlot>,
}

impl SlideRegistry {
    pub fn new(source: Box<dyn SlideSource>) -> Self {
        Self {
            source,
            cache: RwLock::new(CacheSlot::default()),
        }
    }

    pub fn from_config(config: &DeckConfig, base_dir: &Path) -> Self {
        Self::new(source_from_config(config, base_dir))
    }

    /// Current catalog. Enumeration or duplicate-id failures degrade to an
    /// empty catalog, which is not cached.
    pub fn catalog(&self) -> Arc<Catalog> {
        match self.try_catalog() {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!(source = %self.source.describe(), error = %format!("{:#}", err), "slide enumeration failed");
                Arc::new(Catalog::default())
            }
        }
    }

    /// Like [`catalog`](Self::catalog) but propagating failures.
    pub fn try_catalog(&self) -> Result<Arc<Catalog>> {
        let generation = {
            let slot = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = &slot.catalog {
                return Ok(Arc::clone(cached));
            }
            slot.generation
        };
        let catalog = Arc::new(self.build()?);

        let mut slot = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if slot.generation == generation {
            info!(
                source = %self.source.describe(),
                slides = catalog.sequence.len(),
                "slide registry built"
            );
            slot.catalog = Some(Arc::clone(&catalog));
        } else {
            debug!("registry invalidated during build, result not cached");
        }
        Ok(catalog)
    }

    /// The ordered slide sequence; empty when the source is unavailable.
    pub fn list(&self) -> SlideSequence {
        self.catalog().sequence.clone()
    }

    pub fn try_list(&self) -> Result<SlideSequence> {
        Ok(self.try_catalog()?.sequence.clone())
    }

    pub fn get(&self, id: &str) -> Option<SlideDescriptor> {
        self.catalog().sequence.get(id).cloned()
    }

    /// Drop the cached catalog; the next call re-enumerates.
    pub fn invalidate(&self) {
        let mut slot = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        slot.generation += 1;
        slot.catalog = None;
    }

    fn build(&self) -> Result<Catalog> {
        let documents = self.source.enumerate()?;
        let mut descriptors = Vec::with_capacity(documents.len());
        let mut bodies = Vec::with_capacity(documents.len());
        for document in documents {
            bodies.push((document.descriptor.id.clone(), document.body));
            descriptors.push(document.descriptor);
        }
        let sequence = SlideSequence::build(descriptors)?;
        Ok(Catalog {
            sequence,
            bodies: bodies.into_iter().collect(),
        })
    }
}

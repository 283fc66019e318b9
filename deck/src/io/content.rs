//! Slide content resolution.
//!
//! Two interchangeable strategies, picked once at startup:
//!
//! - [`StaticContent`]: every body of a catalog is read up front; never
//!   pending. When the registry hands out a different catalog, the map is
//!   rebuilt from it before answering.
//! - [`LazyContent`]: a body is read on first request and cached. Callers that
//!   arrive while another caller is loading the same slide see
//!   [`ContentState::Pending`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use thiserror::Error;
use tracing::{debug, warn};

use super::config::ContentStrategy;
use super::registry::{Catalog, SlideRegistry};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("slide '{0}' not found")]
    NotFound(String),
    #[error("could not load slide '{id}': {reason}")]
    Load { id: String, reason: String },
}

/// Per-request content state shown by the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentState {
    Pending,
    Ready(Arc<str>),
    Failed(ContentError),
}

pub trait ContentResolver: Send + Sync {
    fn resolve(&self, id: &str) -> ContentState;

    /// Called after the registry has been rebuilt from a changed source.
    fn refresh(&self, catalog: &Arc<Catalog>);
}

/// Build the resolver selected by `strategy`.
pub fn resolver_for(
    strategy: ContentStrategy,
    registry: &Arc<SlideRegistry>,
) -> Arc<dyn ContentResolver> {
    match strategy {
        ContentStrategy::Static => Arc::new(StaticContent::new(Arc::clone(registry))),
        ContentStrategy::Lazy => Arc::new(LazyContent::new(Arc::clone(registry))),
    }
}

type Loaded = Result<Arc<str>, ContentError>;

fn load_from(catalog: &Catalog, id: &str) -> Loaded {
    let body = catalog
        .body(id)
        .ok_or_else(|| ContentError::NotFound(id.to_string()))?;
    body.load().map(Arc::from).map_err(|err| ContentError::Load {
        id: id.to_string(),
        reason: format!("{:#}", err),
    })
}

/// Every body of one catalog, read eagerly.
struct Snapshot {
    catalog: Arc<Catalog>,
    entries: HashMap<String, Loaded>,
}

impl Snapshot {
    fn load(catalog: Arc<Catalog>) -> Self {
        let entries = catalog
            .sequence()
            .ids()
            .map(|id| {
                let loaded = load_from(&catalog, id);
                if let Err(err) = &loaded {
                    warn!(error = %err, "slide content unavailable");
                }
                (id.to_string(), loaded)
            })
            .collect();
        Self { catalog, entries }
    }

    fn state(&self, id: &str) -> ContentState {
        match self.entries.get(id) {
            Some(Ok(content)) => ContentState::Ready(Arc::clone(content)),
            Some(Err(err)) => ContentState::Failed(err.clone()),
            None => ContentState::Failed(ContentError::NotFound(id.to_string())),
        }
    }
}

/// Precomputed id -> content map, kept in step with the registry's catalog.
pub struct StaticContent {
    registry: Arc<SlideRegistry>,
    snapshot: RwLock<Snapshot>,
}

impl StaticContent {
    pub fn new(registry: Arc<SlideRegistry>) -> Self {
        let snapshot = Snapshot::load(registry.catalog());
        Self {
            registry,
            snapshot: RwLock::new(snapshot),
        }
    }

    fn replace(&self, snapshot: Snapshot) {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}

impl ContentResolver for StaticContent {
    fn resolve(&self, id: &str) -> ContentState {
        let catalog = self.registry.catalog();
        {
            let snapshot = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
            if Arc::ptr_eq(&snapshot.catalog, &catalog) {
                return snapshot.state(id);
            }
        }
        debug!(slides = catalog.sequence().len(), "catalog changed, reloading slide content");
        let snapshot = Snapshot::load(catalog);
        let state = snapshot.state(id);
        self.replace(snapshot);
        state
    }

    fn refresh(&self, catalog: &Arc<Catalog>) {
        self.replace(Snapshot::load(Arc::clone(catalog)));
    }
}

type Loader = Box<dyn Fn(&str) -> Loaded + Send + Sync>;

enum Slot {
    Loading,
    Ready(Arc<str>),
}

#[derive(Default)]
struct LazyCache {
    /// Bumped on refresh; loads started under an older generation are dropped.
    generation: u64,
    slots: HashMap<String, Slot>,
}

/// Load-on-first-request content with a per-slide cache.
///
/// Failures are not cached; the next request retries.
pub struct LazyContent {
    loader: Loader,
    cache: Mutex<LazyCache>,
}

impl LazyContent {
    pub fn new(registry: Arc<SlideRegistry>) -> Self {
        Self::with_loader(move |id| load_from(&registry.catalog(), id))
    }

    pub fn with_loader(loader: impl Fn(&str) -> Loaded + Send + Sync + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            cache: Mutex::new(LazyCache::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LazyCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ContentResolver for LazyContent {
    fn resolve(&self, id: &str) -> ContentState {
        let generation = {
            let mut cache = self.lock();
            match cache.slots.get(id) {
                Some(Slot::Ready(content)) => return ContentState::Ready(Arc::clone(content)),
                Some(Slot::Loading) => return ContentState::Pending,
                None => {
                    cache.slots.insert(id.to_string(), Slot::Loading);
                    cache.generation
                }
            }
        };

        debug!(id, "loading slide content");
        let loaded = (self.loader)(id);

        let mut cache = self.lock();
        let current = cache.generation == generation;
        match loaded {
            Ok(content) => {
                if current {
                    cache.slots.insert(id.to_string(), Slot::Ready(Arc::clone(&content)));
                }
                ContentState::Ready(content)
            }
            Err(err) => {
                if current {
                    cache.slots.remove(id);
                }
                ContentState::Failed(err)
            }
        }
    }

    fn refresh(&self, _catalog: &Arc<Catalog>) {
        let mut cache = self.lock();
        cache.generation += 1;
        cache.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;

    use super::*;
    use crate::io::source::DirectorySource;
    use crate::test_support::{CountingSource, document, write_slide};

    fn registry() -> Arc<SlideRegistry> {
        Arc::new(SlideRegistry::new(Box::new(CountingSource::new(vec![
            document("intro", 0.0),
            document("alfa", 1.0),
        ]))))
    }

    #[test]
    fn static_content_resolves_known_ids() {
        let resolver = resolver_for(ContentStrategy::Static, &registry());
        assert_eq!(
            resolver.resolve("alfa"),
            ContentState::Ready(Arc::from("alfa body"))
        );
        assert_eq!(
            resolver.resolve("zzz"),
            ContentState::Failed(ContentError::NotFound("zzz".to_string()))
        );
    }

    #[test]
    fn static_content_follows_registry_after_failed_startup() {
        let temp = tempfile::tempdir().expect("tempdir");
        let slides = temp.path().join("slides");
        let registry = Arc::new(SlideRegistry::new(Box::new(DirectorySource::new(
            &slides,
            vec!["md".to_string()],
            "Untitled Slide".to_string(),
        ))));
        let resolver = resolver_for(ContentStrategy::Static, &registry);
        assert!(matches!(
            resolver.resolve("intro"),
            ContentState::Failed(ContentError::NotFound(_))
        ));

        std::fs::create_dir(&slides).expect("mkdir");
        write_slide(&slides, "01-intro.md", "<p>intro</p>");

        assert_eq!(registry.list().len(), 1);
        assert_eq!(
            resolver.resolve("intro"),
            ContentState::Ready(Arc::from("<p>intro</p>"))
        );
    }

    #[test]
    fn static_content_reloads_on_refresh() {
        let temp = tempfile::tempdir().expect("tempdir");
        let registry = Arc::new(SlideRegistry::new(Box::new(DirectorySource::new(
            temp.path(),
            vec!["md".to_string()],
            "Untitled Slide".to_string(),
        ))));
        write_slide(temp.path(), "01-intro.md", "v1");
        let resolver = StaticContent::new(Arc::clone(&registry));
        assert_eq!(resolver.resolve("intro"), ContentState::Ready(Arc::from("v1")));

        write_slide(temp.path(), "01-intro.md", "v2");
        assert_eq!(resolver.resolve("intro"), ContentState::Ready(Arc::from("v1")));

        registry.invalidate();
        resolver.refresh(&registry.catalog());
        assert_eq!(resolver.resolve("intro"), ContentState::Ready(Arc::from("v2")));
    }

    #[test]
    fn lazy_content_loads_once_and_caches() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let resolver = LazyContent::with_loader(move |id| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::from(format!("<p>{}</p>", id)))
        });

        assert_eq!(resolver.resolve("intro"), ContentState::Ready(Arc::from("<p>intro</p>")));
        assert_eq!(resolver.resolve("intro"), ContentState::Ready(Arc::from("<p>intro</p>")));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn lazy_content_resolves_from_registry() {
        let resolver = resolver_for(ContentStrategy::Lazy, &registry());
        assert_eq!(
            resolver.resolve("intro"),
            ContentState::Ready(Arc::from("intro body"))
        );
        assert!(matches!(
            resolver.resolve("zzz"),
            ContentState::Failed(ContentError::NotFound(_))
        ));
    }

    #[test]
    fn lazy_failures_are_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let resolver = LazyContent::with_loader(move |id| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ContentError::Load {
                    id: id.to_string(),
                    reason: "disk hiccup".to_string(),
                })
            } else {
                Ok(Arc::from("recovered"))
            }
        });

        assert!(matches!(
            resolver.resolve("intro"),
            ContentState::Failed(ContentError::Load { .. })
        ));
        assert_eq!(resolver.resolve("intro"), ContentState::Ready(Arc::from("recovered")));
    }

    #[test]
    fn concurrent_request_sees_pending_while_loading() {
        let (started_tx, started_rx) = mpsc::channel::<()>();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = Mutex::new(release_rx);
        let resolver = Arc::new(LazyContent::with_loader(move |_id| {
            let _ = started_tx.send(());
            let _ = release_rx.lock().expect("lock").recv();
            Ok(Arc::from("slow"))
        }));

        let background = {
            let resolver = Arc::clone(&resolver);
            thread::spawn(move || resolver.resolve("intro"))
        };
        started_rx.recv().expect("loader started");

        assert_eq!(resolver.resolve("intro"), ContentState::Pending);

        release_tx.send(()).expect("release");
        assert_eq!(
            background.join().expect("join"),
            ContentState::Ready(Arc::from("slow"))
        );
        assert_eq!(resolver.resolve("intro"), ContentState::Ready(Arc::from("slow")));
    }

    #[test]
    fn refresh_clears_lazy_cache() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let resolver = LazyContent::with_loader(move |_id| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::from(format!("v{}", n)))
        });

        assert_eq!(resolver.resolve("intro"), ContentState::Ready(Arc::from("v0")));
        resolver.refresh(&Arc::new(Catalog::default()));
        assert_eq!(resolver.resolve("intro"), ContentState::Ready(Arc::from("v1")));
    }
}

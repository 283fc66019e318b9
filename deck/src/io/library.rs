//! Decks served from one configuration.
//!
//! A config describes either a single deck or, with `multi_deck = true`, a
//! root directory whose subdirectories are independent decks. Each deck owns
//! its registry and content resolver, so caches never leak between decks.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::config::DeckConfig;
use super::content::{ContentResolver, resolver_for};
use super::registry::{Catalog, SlideRegistry};
use super::source::DirectorySource;

/// One presentation: its slides and how their bodies are resolved.
pub struct Deck {
    /// `None` for the only deck of a single-deck config.
    name: Option<String>,
    title: String,
    /// Directory the slides are scanned from, when there is one.
    dir: Option<PathBuf>,
    registry: Arc<SlideRegistry>,
    content: Arc<dyn ContentResolver>,
}

impl Deck {
    pub fn new(
        name: Option<String>,
        title: impl Into<String>,
        registry: Arc<SlideRegistry>,
        content: Arc<dyn ContentResolver>,
    ) -> Self {
        Self {
            name,
            title: title.into(),
            dir: None,
            registry,
            content,
        }
    }

    /// The single deck a non-multi config describes.
    pub fn from_config(config: &DeckConfig, base_dir: &Path) -> Self {
        let registry = Arc::new(SlideRegistry::from_config(config, base_dir));
        let content = resolver_for(config.content, &registry);
        let mut deck = Self::new(None, config.title.clone(), registry, content);
        if config.slides.is_empty() {
            deck.dir = Some(config.resolve_slides_dir(base_dir));
        }
        deck
    }

    /// A named deck scanned from `dir` with the config's discovery settings.
    fn in_collection(name: &str, dir: PathBuf, config: &DeckConfig) -> Self {
        let registry = Arc::new(SlideRegistry::new(Box::new(DirectorySource::new(
            dir.clone(),
            config.extensions.clone(),
            config.default_title.clone(),
        ))));
        let content = resolver_for(config.content, &registry);
        let mut deck = Self::new(Some(name.to_string()), name, registry, content);
        deck.dir = Some(dir);
        deck
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn registry(&self) -> &Arc<SlideRegistry> {
        &self.registry
    }

    pub fn content(&self) -> &Arc<dyn ContentResolver> {
        &self.content
    }

    /// Whether `path` lies inside this deck's slide directory.
    pub fn contains(&self, path: &Path) -> bool {
        self.dir.as_deref().is_some_and(|dir| path.starts_with(dir))
    }

    /// Drop cached slides and content, rebuild, and return the new catalog.
    pub fn reload(&self) -> Arc<Catalog> {
        self.registry.invalidate();
        let catalog = self.registry.catalog();
        self.content.refresh(&catalog);
        catalog
    }
}

/// Names of the deck directories directly under `root`, sorted, hidden ones skipped.
pub fn discover_decks(root: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.with_context(|| format!("list decks in {}", root.display()))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        names.push(name.to_string());
    }
    Ok(names)
}

/// Every subdirectory of a root is a deck.
///
/// The root is rescanned on each listing, so decks added or removed on disk
/// show up without a restart. Decks that survive a rescan keep their caches.
pub struct DeckCollection {
    root: PathBuf,
    config: DeckConfig,
    known: Mutex<HashMap<String, Arc<Deck>>>,
}

impl DeckCollection {
    pub fn new(root: impl Into<PathBuf>, config: DeckConfig) -> Self {
        Self {
            root: root.into(),
            config,
            known: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn title(&self) -> &str {
        &self.config.title
    }

    /// Decks in name order; a missing or unreadable root yields no decks.
    pub fn decks(&self) -> Vec<Arc<Deck>> {
        match self.try_decks() {
            Ok(decks) => decks,
            Err(err) => {
                warn!(root = %self.root.display(), error = %format!("{:#}", err), "deck discovery failed");
                Vec::new()
            }
        }
    }

    pub fn try_decks(&self) -> Result<Vec<Arc<Deck>>> {
        let names = discover_decks(&self.root)?;
        let mut known = self.known.lock().unwrap_or_else(PoisonError::into_inner);
        known.retain(|name, _| names.contains(name));
        let decks = names
            .iter()
            .map(|name| {
                Arc::clone(known.entry(name.clone()).or_insert_with(|| {
                    debug!(deck = %name, "discovered deck");
                    Arc::new(Deck::in_collection(name, self.root.join(name), &self.config))
                }))
            })
            .collect();
        Ok(decks)
    }

    /// Look up a deck by directory name.
    pub fn get(&self, name: &str) -> Option<Arc<Deck>> {
        self.decks()
            .into_iter()
            .find(|deck| deck.name() == Some(name))
    }
}

/// All decks a server or CLI invocation works with.
pub enum DeckLibrary {
    Single(Arc<Deck>),
    Multi(DeckCollection),
}

impl DeckLibrary {
    pub fn from_config(config: &DeckConfig, base_dir: &Path) -> Self {
        if config.multi_deck {
            DeckLibrary::Multi(DeckCollection::new(
                config.resolve_slides_dir(base_dir),
                config.clone(),
            ))
        } else {
            DeckLibrary::Single(Arc::new(Deck::from_config(config, base_dir)))
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, DeckLibrary::Multi(_))
    }

    pub fn title(&self) -> &str {
        match self {
            DeckLibrary::Single(deck) => deck.title(),
            DeckLibrary::Multi(collection) => collection.title(),
        }
    }

    /// Every deck; the single deck when not in multi-deck mode.
    pub fn decks(&self) -> Vec<Arc<Deck>> {
        match self {
            DeckLibrary::Single(deck) => vec![Arc::clone(deck)],
            DeckLibrary::Multi(collection) => collection.decks(),
        }
    }

    /// The deck served at the top level, if any.
    pub fn single(&self) -> Option<&Arc<Deck>> {
        match self {
            DeckLibrary::Single(deck) => Some(deck),
            DeckLibrary::Multi(_) => None,
        }
    }

    /// A named deck. Single-deck libraries have no named decks.
    pub fn deck(&self, name: &str) -> Option<Arc<Deck>> {
        match self {
            DeckLibrary::Single(_) => None,
            DeckLibrary::Multi(collection) => collection.get(name),
        }
    }

    /// Resolve a deck for the CLI: by name in multi-deck mode, otherwise the single deck.
    pub fn select(&self, name: Option<&str>) -> Result<Arc<Deck>> {
        match (self, name) {
            (DeckLibrary::Single(deck), None) => Ok(Arc::clone(deck)),
            (DeckLibrary::Single(_), Some(name)) => Err(anyhow!(
                "deck '{}' requested but multi_deck is not enabled",
                name
            )),
            (DeckLibrary::Multi(_), None) => Err(anyhow!("multi_deck is enabled; pass --deck <name>")),
            (DeckLibrary::Multi(collection), Some(name)) => {
                let decks = collection.try_decks()?;
                decks
                    .into_iter()
                    .find(|deck| deck.name() == Some(name))
                    .with_context(|| {
                        format!("no deck named '{}' in {}", name, collection.root().display())
                    })
            }
        }
    }

    /// Build every deck once, reporting the first failure.
    pub fn preload(&self) -> Result<()> {
        match self {
            DeckLibrary::Single(deck) => deck.registry().try_list().map(|_| ()),
            DeckLibrary::Multi(collection) => {
                for deck in collection.try_decks()? {
                    if let Err(err) = deck.registry().try_list() {
                        warn!(deck = deck.title(), error = %format!("{:#}", err), "deck unavailable");
                    }
                }
                Ok(())
            }
        }
    }

    /// Decks whose slides live under any of `paths`.
    pub fn decks_containing<'a>(&self, paths: impl IntoIterator<Item = &'a Path>) -> Vec<Arc<Deck>> {
        let paths: Vec<&Path> = paths.into_iter().collect();
        self.decks()
            .into_iter()
            .filter(|deck| paths.iter().any(|path| deck.contains(path)))
            .collect()
    }
}

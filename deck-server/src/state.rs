//! Shared application state for the slide server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use deck::io::config::DeckConfig;
use deck::io::content::ContentResolver;
use deck::io::library::{Deck, DeckLibrary};
use deck::io::registry::SlideRegistry;
use tokio::sync::broadcast;

use crate::pages::Pages;

/// Events broadcast to SSE clients when the deck changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    SlidesChanged,
}

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub library: Arc<DeckLibrary>,
    pub pages: Arc<Pages>,
    /// Directory watched for changes when live reload is on.
    pub watch_dir: Option<PathBuf>,
    /// Broadcast sender for deck change events.
    pub event_tx: Arc<broadcast::Sender<ChangeEvent>>,
}

impl AppState {
    /// State serving one deck at the top level.
    pub fn new(
        registry: Arc<SlideRegistry>,
        content: Arc<dyn ContentResolver>,
        deck_title: &str,
    ) -> Result<Self> {
        Self::with_library(DeckLibrary::Single(Arc::new(Deck::new(
            None, deck_title, registry, content,
        ))))
    }

    pub fn with_library(library: DeckLibrary) -> Result<Self> {
        let (event_tx, _) = broadcast::channel(16);
        Ok(Self {
            library: Arc::new(library),
            pages: Arc::new(Pages::new()?),
            watch_dir: None,
            event_tx: Arc::new(event_tx),
        })
    }

    /// Build the deck or decks a config describes.
    pub fn from_config(config: &DeckConfig, base_dir: &Path) -> Result<Self> {
        Self::with_library(DeckLibrary::from_config(config, base_dir))
    }

    /// Enable live reload for changes under `dir`.
    pub fn with_watch_dir(mut self, dir: PathBuf) -> Self {
        self.watch_dir = Some(dir);
        self
    }

    pub fn live_reload(&self) -> bool {
        self.watch_dir.is_some()
    }
}

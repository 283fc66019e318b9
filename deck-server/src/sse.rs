//! Server-Sent Events stream and slide directory watcher.

use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use notify::{Event as NotifyEvent, EventKind, PollWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::state::{AppState, ChangeEvent};

#[derive(Serialize)]
struct SsePayload {
    #[serde(rename = "type")]
    event_type: &'static str,
}

impl From<&ChangeEvent> for SsePayload {
    fn from(event: &ChangeEvent) -> Self {
        match event {
            ChangeEvent::SlidesChanged => SsePayload {
                event_type: "slides_changed",
            },
        }
    }
}

/// SSE endpoint handler.
pub async fn events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.event_tx.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("connected").data("{}"));

        loop {
            match rx.recv().await {
                Ok(change_event) => {
                    let payload = SsePayload::from(&change_event);
                    if let Ok(json) = serde_json::to_string(&payload) {
                        yield Ok(Event::default().event("change").data(json));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "SSE client lagged, some events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// Start the slide watcher in a background task. No-op without a watch dir.
pub fn start_file_watcher(state: AppState) {
    if state.watch_dir.is_none() {
        return;
    }
    tokio::spawn(async move {
        if let Err(e) = run_file_watcher(state).await {
            warn!(error = %e, "file watcher failed");
        }
    });
}

async fn run_file_watcher(state: AppState) -> anyhow::Result<()> {
    let Some(watch_dir) = state.watch_dir.clone() else {
        return Ok(());
    };
    let (tx, mut rx) = mpsc::channel::<NotifyEvent>(100);

    let mut watcher = PollWatcher::new(
        move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.try_send(event);
            }
        },
        notify::Config::default().with_poll_interval(Duration::from_millis(250)),
    )?;
    // Decks of a multi-deck library live one level down.
    let mode = if state.library.is_multi() {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };
    watcher.watch(&watch_dir, mode)?;
    info!(path = %watch_dir.display(), "watching slides directory");

    // Editors write files in bursts; coalesce them into one rebuild per tick.
    let mut pending_events: Vec<NotifyEvent> = Vec::new();
    let mut flush_tick = tokio::time::interval(Duration::from_millis(100));
    flush_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                pending_events.push(event);
            }
            _ = flush_tick.tick() => {
                if pending_events.is_empty() {
                    continue;
                }
                let events = std::mem::take(&mut pending_events);
                rebuild_in_background(&state, events).await;
            }
        }
    }
}

/// Run [`process_events`] on the blocking pool: rebuilding enumerates the
/// slides directory and, for static content, reads every body.
async fn rebuild_in_background(state: &AppState, events: Vec<NotifyEvent>) -> bool {
    let state = state.clone();
    match tokio::task::spawn_blocking(move || process_events(&state, &events)).await {
        Ok(changed) => changed,
        Err(err) => {
            warn!(error = %err, "slide rebuild task failed");
            false
        }
    }
}

/// Rebuild the affected decks if any event touched the slides dir.
///
/// Returns true when a rebuild happened.
fn process_events(state: &AppState, events: &[NotifyEvent]) -> bool {
    let Some(watch_dir) = state.watch_dir.as_deref() else {
        return false;
    };
    let touched: Vec<&Path> = events
        .iter()
        .filter(|event| {
            matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            )
        })
        .flat_map(|event| event.paths.iter().map(PathBuf::as_path))
        .filter(|path| path.starts_with(watch_dir))
        .collect();
    if touched.is_empty() {
        return false;
    }

    let decks = match state.library.single() {
        Some(deck) => vec![Arc::clone(deck)],
        None => state.library.decks_containing(touched.iter().copied()),
    };
    for deck in &decks {
        let catalog = deck.reload();
        info!(
            deck = deck.title(),
            slides = catalog.sequence().len(),
            "slides changed, registry rebuilt"
        );
    }

    debug!("broadcasting slides change");
    let _ = state.event_tx.send(ChangeEvent::SlidesChanged);
    true
}

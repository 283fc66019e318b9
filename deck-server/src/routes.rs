//! HTTP route handlers: HTML pages and the JSON API.
//!
//! A single-deck server serves its deck at the top level (`/slides/...`).
//! A multi-deck server lists its decks at `/` and `/list` and serves each
//! one under `/decks/<name>/...`.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::get;
use deck::core::navigation::{NavigationState, Resolution, resolve};
use deck::core::sequence::SlideSequence;
use deck::io::library::Deck;
use tracing::{debug, error};

use crate::pages::{DeckLink, DeckView, deck_url};
use crate::sse;
use crate::state::AppState;

/// Full application router: pages, API and the change stream.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/list", get(list_page))
        .route("/slides", get(first_slide))
        .route("/slides/", get(first_slide))
        .route("/slides/{slide_id}", get(slide_page))
        .route("/decks/{deck}", get(deck_landing))
        .route("/decks/{deck}/list", get(deck_list_page))
        .route("/decks/{deck}/slides", get(deck_first_slide))
        .route("/decks/{deck}/slides/", get(deck_first_slide))
        .route("/decks/{deck}/slides/{slide_id}", get(deck_slide_page))
        .nest("/api", api_router())
        .route("/events", get(sse::events_handler))
        .with_state(state)
}

/// Build the API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/slides", get(list_slides))
        .route("/slides/{slide_id}", get(slide_navigation))
        .route("/decks", get(list_decks))
        .route("/decks/{deck}/slides", get(deck_slides))
        .route("/decks/{deck}/slides/{slide_id}", get(deck_slide_navigation))
}

async fn health() -> &'static str {
    "ok"
}

fn render(result: anyhow::Result<String>) -> Response {
    match result {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            error!(error = %format!("{:#}", err), "page render failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn redirect(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// A named deck, or a redirect to the deck index when there is none.
fn named_deck(state: &AppState, name: &str) -> Result<Arc<Deck>, Response> {
    state.library.deck(name).ok_or_else(|| {
        debug!(deck = %name, "unknown deck, redirecting");
        redirect("/list".to_string())
    })
}

/// GET / - landing page of the deck, or the deck index.
async fn landing(State(state): State<AppState>) -> Response {
    match state.library.single() {
        Some(deck) => deck_home(&state, deck),
        None => deck_index(&state),
    }
}

/// GET /list - index of slide ids, or of decks.
async fn list_page(State(state): State<AppState>) -> Response {
    match state.library.single() {
        Some(deck) => slide_index(&state, deck),
        None => deck_index(&state),
    }
}

/// GET /slides - no id given, go to the first slide.
async fn first_slide(State(state): State<AppState>) -> Response {
    match state.library.single() {
        Some(deck) => show_slide(&state, deck, ""),
        None => redirect("/list".to_string()),
    }
}

/// GET /slides/:slide_id - render a slide, redirecting unknown ids.
///
/// On a multi-deck server `/slides/<deck>` leads to that deck.
async fn slide_page(State(state): State<AppState>, Path(slide_id): Path<String>) -> Response {
    if let Some(deck) = state.library.single() {
        return show_slide(&state, deck, &slide_id);
    }
    match state.library.deck(&slide_id) {
        Some(_) => redirect(deck_url(&slide_id)),
        None => redirect("/list".to_string()),
    }
}

/// GET /decks/:deck - landing page of a named deck.
async fn deck_landing(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match named_deck(&state, &name) {
        Ok(deck) => deck_home(&state, &deck),
        Err(response) => response,
    }
}

/// GET /decks/:deck/list - slide index of a named deck.
async fn deck_list_page(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match named_deck(&state, &name) {
        Ok(deck) => slide_index(&state, &deck),
        Err(response) => response,
    }
}

/// GET /decks/:deck/slides - first slide of a named deck.
async fn deck_first_slide(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match named_deck(&state, &name) {
        Ok(deck) => show_slide(&state, &deck, ""),
        Err(response) => response,
    }
}

/// GET /decks/:deck/slides/:slide_id - a slide of a named deck.
async fn deck_slide_page(
    State(state): State<AppState>,
    Path((name, slide_id)): Path<(String, String)>,
) -> Response {
    match named_deck(&state, &name) {
        Ok(deck) => show_slide(&state, &deck, &slide_id),
        Err(response) => response,
    }
}

fn deck_index(state: &AppState) -> Response {
    let decks: Vec<DeckLink> = state
        .library
        .decks()
        .iter()
        .map(|deck| DeckLink::of(deck))
        .collect();
    render(state.pages.decks(state.library.title(), &decks))
}

fn deck_home(state: &AppState, deck: &Deck) -> Response {
    let catalog = deck.registry().catalog();
    render(state.pages.landing(&DeckView::of(deck), catalog.sequence()))
}

fn slide_index(state: &AppState, deck: &Deck) -> Response {
    let catalog = deck.registry().catalog();
    render(state.pages.list(&DeckView::of(deck), catalog.sequence()))
}

fn show_slide(state: &AppState, deck: &Deck, slide_id: &str) -> Response {
    let view = DeckView::of(deck);
    let catalog = deck.registry().catalog();
    let sequence: &SlideSequence = catalog.sequence();
    let nav = resolve(sequence, slide_id);
    match (nav.resolution, nav.slide_id.as_deref()) {
        (Resolution::Exact, Some(id)) => {
            let content = deck.content().resolve(id);
            render(
                state
                    .pages
                    .slide(&view, sequence, &nav, &content, state.live_reload()),
            )
        }
        (Resolution::Fallback, Some(first)) => {
            debug!(requested = %slide_id, redirect = %first, "unknown slide, redirecting");
            redirect(view.slide_url(first))
        }
        _ => render(state.pages.empty(&view)),
    }
}

/// The deck an API call addresses: the top-level deck, or a named one.
fn api_deck(state: &AppState, name: Option<&str>) -> Result<Arc<Deck>, StatusCode> {
    let deck = match name {
        None => state.library.single().cloned(),
        Some(name) => state.library.deck(name),
    };
    deck.ok_or(StatusCode::NOT_FOUND)
}

/// GET /api/slides - slides in presentation order.
async fn list_slides(State(state): State<AppState>) -> Result<Json<SlideSequence>, StatusCode> {
    let deck = api_deck(&state, None)?;
    Ok(Json(deck.registry().catalog().sequence().clone()))
}

/// GET /api/slides/:slide_id - navigation state, without redirecting.
async fn slide_navigation(
    State(state): State<AppState>,
    Path(slide_id): Path<String>,
) -> Result<Json<NavigationState>, StatusCode> {
    let deck = api_deck(&state, None)?;
    let catalog = deck.registry().catalog();
    Ok(Json(resolve(catalog.sequence(), &slide_id)))
}

/// GET /api/decks - every deck with its slide count.
async fn list_decks(State(state): State<AppState>) -> Json<Vec<DeckLink>> {
    Json(
        state
            .library
            .decks()
            .iter()
            .map(|deck| DeckLink::of(deck))
            .collect(),
    )
}

/// GET /api/decks/:deck/slides
async fn deck_slides(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<SlideSequence>, StatusCode> {
    let deck = api_deck(&state, Some(&name))?;
    Ok(Json(deck.registry().catalog().sequence().clone()))
}

/// GET /api/decks/:deck/slides/:slide_id
async fn deck_slide_navigation(
    State(state): State<AppState>,
    Path((name, slide_id)): Path<(String, String)>,
) -> Result<Json<NavigationState>, StatusCode> {
    let deck = api_deck(&state, Some(&name))?;
    let catalog = deck.registry().catalog();
    Ok(Json(resolve(catalog.sequence(), &slide_id)))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use axum::body::{Body, to_bytes};
    use axum::http::{HeaderMap, Request};
    use deck::io::config::DeckConfig;
    use deck::io::content::{ContentResolver, ContentState, StaticContent};
    use deck::io::library::DeckLibrary;
    use deck::io::registry::{Catalog, SlideRegistry};
    use deck::io::source::BodySource;
    use deck::test_support::{CountingSource, document, write_slide};
    use tower::ServiceExt;

    use super::*;

    struct AlwaysPending;

    impl ContentResolver for AlwaysPending {
        fn resolve(&self, _id: &str) -> ContentState {
            ContentState::Pending
        }

        fn refresh(&self, _catalog: &Arc<Catalog>) {}
    }

    fn registry(source: CountingSource) -> Arc<SlideRegistry> {
        Arc::new(SlideRegistry::new(Box::new(source)))
    }

    fn deck_state() -> AppState {
        let registry = registry(CountingSource::new(vec![
            document("intro", 0.0),
            document("alfa", 1.0),
            document("beta", 2.0),
        ]));
        let content = Arc::new(StaticContent::new(Arc::clone(&registry)));
        AppState::new(registry, content, "Demo").expect("state")
    }

    async fn get(state: AppState, uri: &str) -> (StatusCode, HeaderMap, String) {
        let response = app(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, headers, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn slide_page_renders_navigation() {
        let (status, _, body) = get(deck_state(), "/slides/alfa").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("alfa body"));
        assert!(body.contains("2 / 3"));
        assert!(body.contains("data-prev=\"/slides/intro\""));
        assert!(body.contains("data-next=\"/slides/beta\""));
        assert!(body.contains("class=\"dot active\""));
    }

    #[tokio::test]
    async fn boundary_slides_omit_missing_neighbour() {
        let (_, _, first) = get(deck_state(), "/slides/intro").await;
        assert!(first.contains("data-prev=\"\""));
        assert!(!first.contains("aria-label=\"Previous slide\""));

        let (_, _, last) = get(deck_state(), "/slides/beta").await;
        assert!(last.contains("data-next=\"\""));
        assert!(!last.contains("aria-label=\"Next slide\""));
    }

    #[tokio::test]
    async fn unknown_slide_redirects_to_first() {
        let (status, headers, _) = get(deck_state(), "/slides/zzz").await;
        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(headers[header::LOCATION], "/slides/intro");
    }

    #[tokio::test]
    async fn missing_slide_id_redirects_to_first() {
        let (status, headers, _) = get(deck_state(), "/slides").await;
        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(headers[header::LOCATION], "/slides/intro");
    }

    #[tokio::test]
    async fn empty_deck_shows_empty_state() {
        let registry = registry(CountingSource::failing());
        let content = Arc::new(StaticContent::new(Arc::clone(&registry)));
        let state = AppState::new(registry, content, "Demo").expect("state");

        let (status, _, body) = get(state.clone(), "/slides/intro").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("No slides yet"));

        let (status, _, body) = get(state, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("No slides found."));
    }

    #[tokio::test]
    async fn failed_content_is_inline_error() {
        let mut broken = document("intro", 0.0);
        broken.body = BodySource::Missing;
        let registry = registry(CountingSource::new(vec![broken, document("alfa", 1.0)]));
        let content = Arc::new(StaticContent::new(Arc::clone(&registry)));
        let state = AppState::new(registry, content, "Demo").expect("state");

        let (status, _, body) = get(state, "/slides/intro").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Could not load this slide."));
        assert!(body.contains("href=\"/slides/alfa\""));
    }

    #[tokio::test]
    async fn pending_content_shows_refreshing_placeholder() {
        let registry = registry(CountingSource::new(vec![document("intro", 0.0)]));
        let state = AppState::new(registry, Arc::new(AlwaysPending), "Demo").expect("state");

        let (status, _, body) = get(state, "/slides/intro").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("http-equiv=\"refresh\""));
        assert!(body.contains("Loading slide"));
    }

    #[tokio::test]
    async fn landing_and_list_link_to_slides() {
        let (_, _, landing) = get(deck_state(), "/").await;
        assert!(landing.contains("href=\"/slides/intro\""));

        let (status, _, list) = get(deck_state(), "/list").await;
        assert_eq!(status, StatusCode::OK);
        for id in ["intro", "alfa", "beta"] {
            assert!(list.contains(&format!("href=\"/slides/{}\"", id)));
        }
    }

    #[tokio::test]
    async fn api_returns_ordered_slides_and_navigation() {
        let (status, _, body) = get(deck_state(), "/api/slides").await;
        assert_eq!(status, StatusCode::OK);
        let slides: serde_json::Value = serde_json::from_str(&body).expect("json");
        let ids: Vec<&str> = slides
            .as_array()
            .expect("array")
            .iter()
            .filter_map(|slide| slide["id"].as_str())
            .collect();
        assert_eq!(ids, vec!["intro", "alfa", "beta"]);

        let (_, _, body) = get(deck_state(), "/api/slides/zzz").await;
        let nav: serde_json::Value = serde_json::from_str(&body).expect("json");
        assert_eq!(nav["slideId"], "intro");
        assert_eq!(nav["resolution"], "fallback");

        let (_, _, body) = get(deck_state(), "/api/health").await;
        assert_eq!(body, "ok");
    }

    fn multi_deck_state() -> (tempfile::TempDir, AppState) {
        let temp = tempfile::tempdir().expect("tempdir");
        for (deck, file, body) in [
            ("rust-intro", "01-hello.md", "<p>hello rust</p>"),
            ("rust-intro", "02-types.md", "<p>types</p>"),
            ("async", "01-hello.md", "<p>hello async</p>"),
        ] {
            let dir = temp.path().join(deck);
            fs::create_dir_all(&dir).expect("mkdir");
            write_slide(&dir, file, body);
        }
        let config = DeckConfig {
            title: "Library".to_string(),
            multi_deck: true,
            slides_dir: temp.path().to_path_buf(),
            ..DeckConfig::default()
        };
        let state = AppState::with_library(DeckLibrary::from_config(&config, temp.path()))
            .expect("state");
        (temp, state)
    }

    #[tokio::test]
    async fn multi_deck_index_links_each_deck() {
        let (_temp, state) = multi_deck_state();
        for uri in ["/", "/list"] {
            let (status, _, body) = get(state.clone(), uri).await;
            assert_eq!(status, StatusCode::OK);
            assert!(body.contains("href=\"/decks/async\""));
            assert!(body.contains("href=\"/decks/rust-intro\""));
        }
    }

    #[tokio::test]
    async fn multi_deck_slides_are_scoped_per_deck() {
        let (_temp, state) = multi_deck_state();

        let (status, _, body) = get(state.clone(), "/decks/rust-intro/slides/hello").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<p>hello rust</p>"));
        assert!(body.contains("1 / 2"));
        assert!(body.contains("data-next=\"/decks/rust-intro/slides/types\""));

        let (_, _, body) = get(state.clone(), "/decks/async/slides/hello").await;
        assert!(body.contains("<p>hello async</p>"));
        assert!(body.contains("1 / 1"));

        let (status, headers, _) = get(state.clone(), "/decks/async/slides/zzz").await;
        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(headers[header::LOCATION], "/decks/async/slides/hello");

        let (_, _, landing) = get(state, "/decks/rust-intro").await;
        assert!(landing.contains("href=\"/decks/rust-intro/slides/hello\""));
        assert!(landing.contains("href=\"/decks/rust-intro/list\""));
    }

    #[tokio::test]
    async fn unknown_deck_redirects_to_index() {
        let (_temp, state) = multi_deck_state();

        let (status, headers, _) = get(state.clone(), "/decks/missing/slides/hello").await;
        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(headers[header::LOCATION], "/list");

        let (status, headers, _) = get(state.clone(), "/slides/async").await;
        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(headers[header::LOCATION], "/decks/async");

        let (status, headers, _) = get(state, "/slides").await;
        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(headers[header::LOCATION], "/list");
    }

    #[tokio::test]
    async fn deck_api_lists_decks_and_scoped_slides() {
        let (_temp, state) = multi_deck_state();

        let (_, _, body) = get(state.clone(), "/api/decks").await;
        let decks: serde_json::Value = serde_json::from_str(&body).expect("json");
        assert_eq!(decks[0]["name"], "async");
        assert_eq!(decks[1]["name"], "rust-intro");
        assert_eq!(decks[1]["totalSlides"], 2);

        let (_, _, body) = get(state.clone(), "/api/decks/rust-intro/slides/types").await;
        let nav: serde_json::Value = serde_json::from_str(&body).expect("json");
        assert_eq!(nav["prevSlideId"], "hello");
        assert_eq!(nav["resolution"], "exact");

        let (status, _, _) = get(state.clone(), "/api/decks/missing/slides").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, _) = get(state, "/api/slides").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn single_deck_has_no_named_decks() {
        let (status, headers, _) = get(deck_state(), "/decks/intro").await;
        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(headers[header::LOCATION], "/list");

        let (_, _, body) = get(deck_state(), "/api/decks").await;
        let decks: serde_json::Value = serde_json::from_str(&body).expect("json");
        assert_eq!(decks[0]["name"], serde_json::Value::Null);
        assert_eq!(decks[0]["url"], "/");
        assert_eq!(decks[0]["totalSlides"], 3);
    }
}

//! HTML page rendering with minijinja.
//!
//! Templates are compiled into the binary. Names end in `.html`, so values are
//! auto-escaped; slide bodies are the one thing marked `safe`.

use anyhow::{Context, Result};
use deck::core::navigation::NavigationState;
use deck::core::sequence::SlideSequence;
use deck::io::content::ContentState;
use deck::io::library::Deck;
use minijinja::{Environment, context};
use serde::Serialize;

const BASE_TEMPLATE: &str = include_str!("templates/base.html");
const LANDING_TEMPLATE: &str = include_str!("templates/landing.html");
const LIST_TEMPLATE: &str = include_str!("templates/list.html");
const SLIDE_TEMPLATE: &str = include_str!("templates/slide.html");
const EMPTY_TEMPLATE: &str = include_str!("templates/empty.html");
const DECKS_TEMPLATE: &str = include_str!("templates/decks.html");

/// Landing URL of a named deck.
pub fn deck_url(name: &str) -> String {
    format!("/decks/{}", encode_segment(name))
}

/// Percent-encode everything outside RFC 3986 unreserved characters.
fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

/// Title and URL prefix of the deck a page belongs to.
///
/// The single deck of a single-deck server lives at the top level; named
/// decks live under `/decks/<name>`.
#[derive(Debug, Clone)]
pub struct DeckView<'a> {
    title: &'a str,
    base: String,
}

impl<'a> DeckView<'a> {
    pub fn of(deck: &'a Deck) -> Self {
        Self {
            title: deck.title(),
            base: deck.name().map(deck_url).unwrap_or_default(),
        }
    }

    #[cfg(test)]
    fn top_level(title: &'a str) -> Self {
        Self {
            title,
            base: String::new(),
        }
    }

    /// Canonical URL of a slide in this deck.
    pub fn slide_url(&self, id: &str) -> String {
        format!("{}/slides/{}", self.base, encode_segment(id))
    }

    pub fn home_url(&self) -> String {
        if self.base.is_empty() {
            "/".to_string()
        } else {
            self.base.clone()
        }
    }

    fn list_url(&self) -> String {
        format!("{}/list", self.base)
    }
}

/// One entry of the deck index, also returned by the decks API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckLink {
    pub name: Option<String>,
    pub title: String,
    pub url: String,
    pub total_slides: usize,
}

impl DeckLink {
    pub fn of(deck: &Deck) -> Self {
        Self {
            name: deck.name().map(str::to_string),
            title: deck.title().to_string(),
            url: DeckView::of(deck).home_url(),
            total_slides: deck.registry().catalog().sequence().len(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SlideLink {
    id: String,
    title: String,
    url: String,
    active: bool,
}

fn slide_links(
    deck: &DeckView<'_>,
    sequence: &SlideSequence,
    active: Option<&str>,
) -> Vec<SlideLink> {
    sequence
        .iter()
        .map(|slide| SlideLink {
            id: slide.id.clone(),
            title: slide.title.clone(),
            url: deck.slide_url(&slide.id),
            active: active == Some(slide.id.as_str()),
        })
        .collect()
}

/// Content area of a slide page.
#[derive(Debug, Serialize)]
struct ContentView {
    state: &'static str,
    html: Option<String>,
    error: Option<String>,
}

impl From<&ContentState> for ContentView {
    fn from(state: &ContentState) -> Self {
        match state {
            ContentState::Pending => ContentView {
                state: "pending",
                html: None,
                error: None,
            },
            ContentState::Ready(html) => ContentView {
                state: "ready",
                html: Some(html.to_string()),
                error: None,
            },
            ContentState::Failed(err) => ContentView {
                state: "failed",
                html: None,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Template engine wrapper around minijinja.
pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("base.html", BASE_TEMPLATE)
            .context("parse base template")?;
        env.add_template("landing.html", LANDING_TEMPLATE)
            .context("parse landing template")?;
        env.add_template("list.html", LIST_TEMPLATE)
            .context("parse list template")?;
        env.add_template("slide.html", SLIDE_TEMPLATE)
            .context("parse slide template")?;
        env.add_template("empty.html", EMPTY_TEMPLATE)
            .context("parse empty template")?;
        env.add_template("decks.html", DECKS_TEMPLATE)
            .context("parse decks template")?;
        Ok(Self { env })
    }

    pub fn landing(&self, deck: &DeckView<'_>, sequence: &SlideSequence) -> Result<String> {
        let first_url = sequence.first().map(|slide| deck.slide_url(&slide.id));
        let template = self.env.get_template("landing.html")?;
        Ok(template.render(context! {
            deck_title => deck.title,
            first_url => first_url,
            list_url => deck.list_url(),
            nested => !deck.base.is_empty(),
            total => sequence.len(),
        })?)
    }

    pub fn list(&self, deck: &DeckView<'_>, sequence: &SlideSequence) -> Result<String> {
        let template = self.env.get_template("list.html")?;
        Ok(template.render(context! {
            deck_title => deck.title,
            slides => slide_links(deck, sequence, None),
        })?)
    }

    pub fn empty(&self, deck: &DeckView<'_>) -> Result<String> {
        let template = self.env.get_template("empty.html")?;
        Ok(template.render(context! { deck_title => deck.title })?)
    }

    /// Index of every deck on a multi-deck server.
    pub fn decks(&self, title: &str, decks: &[DeckLink]) -> Result<String> {
        let template = self.env.get_template("decks.html")?;
        Ok(template.render(context! {
            deck_title => title,
            decks => decks,
        })?)
    }

    pub fn slide(
        &self,
        deck: &DeckView<'_>,
        sequence: &SlideSequence,
        nav: &NavigationState,
        content: &ContentState,
        live_reload: bool,
    ) -> Result<String> {
        let template = self.env.get_template("slide.html")?;
        Ok(template.render(context! {
            deck_title => deck.title,
            nav => nav,
            position => nav.current_index + 1,
            prev_url => nav.prev_slide_id.as_deref().map(|id| deck.slide_url(id)),
            next_url => nav.next_slide_id.as_deref().map(|id| deck.slide_url(id)),
            slides => slide_links(deck, sequence, nav.slide_id.as_deref()),
            content => ContentView::from(content),
            live_reload => live_reload,
        })?)
    }
}

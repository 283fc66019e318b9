//! Navigation state for a requested slide.

use serde::Serialize;

use super::sequence::SlideSequence;

/// How the requested id was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// The requested id exists.
    Exact,
    /// The requested id was empty or unknown; the first slide was substituted.
    Fallback,
    /// There are no slides.
    Empty,
}

/// Derived view of a slide's position. Computed per request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    pub slide_id: Option<String>,
    pub current_index: usize,
    pub total_slides: usize,
    pub next_slide_id: Option<String>,
    pub prev_slide_id: Option<String>,
    pub title: Option<String>,
    pub resolution: Resolution,
}

impl NavigationState {
    fn empty() -> Self {
        Self {
            slide_id: None,
            current_index: 0,
            total_slides: 0,
            next_slide_id: None,
            prev_slide_id: None,
            title: None,
            resolution: Resolution::Empty,
        }
    }

    /// True when the caller should redirect to the canonical URL of `slide_id`.
    pub fn needs_redirect(&self) -> bool {
        self.resolution == Resolution::Fallback
    }
}

/// Resolve `slide_id` against `sequence`.
///
/// An empty or unknown id resolves to the first slide. Neighbours are purely
/// positional.
pub fn resolve(sequence: &SlideSequence, slide_id: &str) -> NavigationState {
    if sequence.is_empty() {
        return NavigationState::empty();
    }
    let (index, resolution) = match sequence.position(slide_id) {
        Some(index) if !slide_id.is_empty() => (index, Resolution::Exact),
        _ => (0, Resolution::Fallback),
    };

    let id_at = |i: usize| sequence.at(i).map(|slide| slide.id.clone());
    let current = &sequence.as_slice()[index];

    NavigationState {
        slide_id: Some(current.id.clone()),
        current_index: index,
        total_slides: sequence.len(),
        next_slide_id: id_at(index + 1),
        prev_slide_id: index.checked_sub(1).and_then(id_at),
        title: Some(current.title.clone()),
        resolution,
    }
}

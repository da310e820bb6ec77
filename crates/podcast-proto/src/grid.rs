//! EpisodeGrid: declarative view of the episode list.
//!
//! `EpisodeGrid::render` rebuilds the whole view from the episode list and the
//! active index; nothing is patched in place. The search query only flips the
//! `visible` flag of entries, it never reorders or drops them.

use crate::episode::Episode;

/// Characters of description shown under each title.
pub const EXCERPT_CHARS: usize = 40;
pub const ELLIPSIS: &str = "...";
/// Shown when the thumbnail itself fails to load.
pub const FALLBACK_THUMBNAIL_URL: &str = "https://via.placeholder.com/150?text=?";

pub const LOADING_MESSAGE: &str = "loading episodes...";
pub const EMPTY_MESSAGE: &str = "no episodes found";

/// First `max_chars` characters of `text`, with an ellipsis when cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let mut chars = text.char_indices();
    match chars.nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridEntry {
    /// Position in the episode list; what a click selects.
    pub index: usize,
    pub title: String,
    pub excerpt: String,
    pub thumbnail_url: String,
    pub fallback_thumbnail_url: String,
    pub active: bool,
    pub visible: bool,
}

impl GridEntry {
    /// The thumbnail to show: the episode's own, or the fallback when it has
    /// none.
    pub fn shown_thumbnail(&self) -> &str {
        if self.thumbnail_url.trim().is_empty() {
            &self.fallback_thumbnail_url
        } else {
            &self.thumbnail_url
        }
    }
}

/// What the grid container shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridView {
    Loading,
    Failed(String),
    Empty,
    Entries(Vec<GridEntry>),
}

impl GridView {
    /// Text shown in place of entries, if any.
    pub fn placeholder(&self) -> Option<String> {
        match self {
            GridView::Loading => Some(LOADING_MESSAGE.to_string()),
            GridView::Failed(message) => Some(format!("failed to load episodes\n{}", message)),
            GridView::Empty => Some(EMPTY_MESSAGE.to_string()),
            GridView::Entries(_) => None,
        }
    }

    pub fn entries(&self) -> &[GridEntry] {
        match self {
            GridView::Entries(entries) => entries,
            _ => &[],
        }
    }

    pub fn visible_entries(&self) -> impl Iterator<Item = &GridEntry> {
        self.entries().iter().filter(|e| e.visible)
    }

    pub fn active_entry(&self) -> Option<&GridEntry> {
        self.entries().iter().find(|e| e.active)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EpisodeGrid {
    query: String,
}

impl EpisodeGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Stores the normalised (trimmed, lower-cased) search term.
    pub fn set_query(&mut self, query: &str) {
        self.query = query.trim().to_lowercase();
    }

    pub fn render(&self, episodes: &[Episode], current_index: usize) -> GridView {
        if episodes.is_empty() {
            return GridView::Empty;
        }
        let entries = episodes
            .iter()
            .enumerate()
            .map(|(index, episode)| GridEntry {
                index,
                title: episode.title.clone(),
                excerpt: excerpt(&episode.description, EXCERPT_CHARS),
                thumbnail_url: episode.thumbnail_url.clone(),
                fallback_thumbnail_url: FALLBACK_THUMBNAIL_URL.to_string(),
                active: index == current_index,
                visible: self.matches(episode),
            })
            .collect();
        GridView::Entries(entries)
    }

    /// Case-insensitive substring match on title or description.
    pub fn matches(&self, episode: &Episode) -> bool {
        self.query.is_empty()
            || episode.title.to_lowercase().contains(&self.query)
            || episode.description.to_lowercase().contains(&self.query)
    }
}

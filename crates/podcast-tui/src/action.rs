//! Action enum: all user-initiated intents.

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    PlayerPanel,
    EpisodeGrid,
    MiniPlayer,
}

/// Components produce Actions; the App applies them to the `PlayerState`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // ── Playback ─────────────────────────────────────────────────────────────
    TogglePlay,
    Next,
    Prev,
    /// Grid click / Enter: select this episode and play it.
    PlayEpisode(usize),

    // ── Grid ─────────────────────────────────────────────────────────────────
    /// The grid scroll offset (in card rows) moved.
    Scrolled { previous: usize, current: usize },

    // ── Filter/search ────────────────────────────────────────────────────────
    OpenFilter,
    FilterChanged(String),

    // ── System ───────────────────────────────────────────────────────────────
    FocusNext,
    FocusPane(ComponentId),
    Reload,
    Quit,
}

//! PlayerState: the single owner of the episode list, the current index and
//! the play/pause flag.
//!
//! Design principles:
//! - The audio output and the render surface are injected (`AudioSink`,
//!   `PlayerSurface`), so the state machine runs against fakes in tests.
//! - Every mutation ends with one `render()` of a full `PlayerView` snapshot;
//!   surfaces never read state back or patch themselves incrementally.
//! - Invalid input (out-of-range index, empty list) is a silent no-op.
//! - `play()` awaits the audio output before touching `is_playing`, so a
//!   rejected start never leaves a stale "playing" view behind.

use std::future::Future;

use tracing::{debug, info, warn};

use crate::episode::Episode;
use crate::error::{FeedError, PlaybackError};
use crate::grid::{excerpt, EpisodeGrid, GridView, EXCERPT_CHARS};
use crate::scroll::mini_player_visible;

pub const NO_AUDIO_WARNING: &str = "no audio available for this episode";

/// Audio output: mpv in the terminal player, a recorder in tests.
pub trait AudioSink {
    /// Load `url` and start playback. Resolves once the output has accepted
    /// or rejected the source.
    fn play(&mut self, url: &str) -> impl Future<Output = Result<(), PlaybackError>> + Send;

    /// Pause the loaded source. Fire-and-forget.
    fn pause(&mut self);

    /// Drop the loaded source. Fire-and-forget.
    fn stop(&mut self);
}

/// Anything that can display a `PlayerView`: main player, mini-player and
/// episode grid all draw from the same snapshot.
pub trait PlayerSurface {
    fn render(&mut self, view: &PlayerView);

    /// Transient user-facing warning (toast / alert).
    fn warn(&mut self, message: &str);
}

/// What the grid container shows while no episode list is published.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FeedStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Icon on the play/pause buttons: what a press will do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayIcon {
    Play,
    Pause,
}

impl PlayIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            PlayIcon::Play => "▶",
            PlayIcon::Pause => "⏸",
        }
    }
}

/// Metadata of the current episode, shown by both player surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub index: usize,
    pub title: String,
    pub excerpt: String,
    pub thumbnail_url: String,
    pub has_audio: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MiniPlayerView {
    /// Scroll-driven (and forced on by a successful play).
    pub visible: bool,
    /// Highlighted while audio is playing.
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerView {
    pub now_playing: Option<NowPlaying>,
    pub is_playing: bool,
    pub icon: PlayIcon,
    pub mini_player: MiniPlayerView,
    pub grid: GridView,
}

pub struct PlayerState<A, S> {
    audio: A,
    surface: S,
    grid: EpisodeGrid,
    episodes: Vec<Episode>,
    current_index: usize,
    is_playing: bool,
    feed_status: FeedStatus,
    mini_player_visible: bool,
    mini_player_threshold: usize,
}

impl<A: AudioSink, S: PlayerSurface> PlayerState<A, S> {
    pub fn new(audio: A, surface: S) -> Self {
        Self {
            audio,
            surface,
            grid: EpisodeGrid::new(),
            episodes: Vec::new(),
            current_index: 0,
            is_playing: false,
            feed_status: FeedStatus::Idle,
            mini_player_visible: false,
            mini_player_threshold: 3,
        }
    }

    pub fn with_mini_player_threshold(mut self, threshold: usize) -> Self {
        self.mini_player_threshold = threshold;
        self
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_episode(&self) -> Option<&Episode> {
        self.episodes.get(self.current_index)
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn feed_status(&self) -> &FeedStatus {
        &self.feed_status
    }

    pub fn mini_player_visible(&self) -> bool {
        self.mini_player_visible
    }

    pub fn query(&self) -> &str {
        self.grid.query()
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    // ── Feed ──────────────────────────────────────────────────────────────────

    /// Replace the grid content with the loading placeholder.
    pub fn show_loading(&mut self) {
        self.feed_status = FeedStatus::Loading;
        self.render();
    }

    /// Publish a fetch result: episodes on success, an error message in place
    /// of the grid on failure. A failure never touches the current list.
    pub fn apply_feed(&mut self, result: Result<Vec<Episode>, FeedError>) {
        match result {
            Ok(episodes) => self.set_episodes(episodes),
            Err(e) => {
                warn!("feed: {}", e);
                self.feed_status = FeedStatus::Failed(e.to_string());
                self.render();
            }
        }
    }

    /// Replace the episode list wholesale and select the first episode.
    /// An empty list is ignored.
    pub fn set_episodes(&mut self, episodes: Vec<Episode>) {
        if episodes.is_empty() {
            debug!("player: ignoring empty episode list");
            return;
        }
        if self.is_playing {
            self.audio.stop();
            self.is_playing = false;
        }
        info!("player: {} episodes loaded", episodes.len());
        self.episodes = episodes;
        self.current_index = 0;
        self.feed_status = FeedStatus::Ready;
        self.render();
    }

    // ── Transitions ───────────────────────────────────────────────────────────

    pub fn set_current_index(&mut self, index: usize) {
        if index >= self.episodes.len() {
            debug!(
                "player: index {} out of range (have {} episodes)",
                index,
                self.episodes.len()
            );
            return;
        }
        self.current_index = index;
        self.render();
    }

    pub async fn play(&mut self) {
        let Some(episode) = self.episodes.get(self.current_index) else {
            debug!("player: play with no episodes loaded");
            return;
        };
        if !episode.has_audio() {
            warn!("player: episode {:?} has no audio url", episode.title);
            self.surface.warn(NO_AUDIO_WARNING);
            return;
        }
        let url = episode.audio_url.clone();
        info!("player: playing episode {} → {}", self.current_index, url);

        match self.audio.play(&url).await {
            Ok(()) => {
                self.is_playing = true;
                self.mini_player_visible = true;
            }
            Err(e) => {
                warn!("player: {}", e);
                self.is_playing = false;
                self.surface.warn(&format!("could not play episode: {}", e.0));
            }
        }
        self.render();
    }

    /// The audio output gave up on a source it had already accepted (an
    /// unreachable URL or an undecodable format found after loading).
    pub fn playback_failed(&mut self, error: PlaybackError) {
        warn!("player: playback failed: {}", error);
        self.is_playing = false;
        self.surface
            .warn(&format!("could not play episode: {}", error.0));
        self.render();
    }

    /// Fire-and-forget on the audio side, so it completes without awaiting.
    pub fn pause(&mut self) {
        self.audio.pause();
        self.is_playing = false;
        self.render();
    }

    /// Play/pause button.
    pub async fn toggle(&mut self) {
        if self.is_playing {
            self.pause();
        } else {
            self.play().await;
        }
    }

    /// Grid click: select the entry, then play it.
    pub async fn select_and_play(&mut self, index: usize) {
        self.set_current_index(index);
        self.play().await;
    }

    pub async fn next(&mut self) {
        let len = self.episodes.len();
        if len == 0 {
            return;
        }
        self.step_to((self.current_index + 1) % len).await;
    }

    pub async fn prev(&mut self) {
        let len = self.episodes.len();
        if len == 0 {
            return;
        }
        self.step_to((self.current_index + len - 1) % len).await;
    }

    async fn step_to(&mut self, index: usize) {
        let was_playing = self.is_playing;
        self.set_current_index(index);
        if was_playing {
            self.play().await;
        }
    }

    // ── Presentation ──────────────────────────────────────────────────────────

    pub fn set_query(&mut self, query: &str) {
        self.grid.set_query(query);
        self.render();
    }

    /// The episode grid was scrolled from `previous` to `current`.
    pub fn on_scroll(&mut self, previous: usize, current: usize) {
        let visible = mini_player_visible(
            previous,
            current,
            self.mini_player_threshold,
            self.mini_player_visible,
        );
        if visible != self.mini_player_visible {
            self.mini_player_visible = visible;
            self.render();
        }
    }

    pub fn view(&self) -> PlayerView {
        let now_playing = self.current_episode().map(|e| NowPlaying {
            index: self.current_index,
            title: e.title.clone(),
            excerpt: excerpt(&e.description, EXCERPT_CHARS),
            thumbnail_url: e.thumbnail_url.clone(),
            has_audio: e.has_audio(),
        });
        let grid = match &self.feed_status {
            FeedStatus::Loading => GridView::Loading,
            FeedStatus::Failed(message) => GridView::Failed(message.clone()),
            FeedStatus::Idle | FeedStatus::Ready => {
                self.grid.render(&self.episodes, self.current_index)
            }
        };
        PlayerView {
            now_playing,
            is_playing: self.is_playing,
            icon: if self.is_playing {
                PlayIcon::Pause
            } else {
                PlayIcon::Play
            },
            mini_player: MiniPlayerView {
                visible: self.mini_player_visible,
                active: self.is_playing,
            },
            grid,
        }
    }

    fn render(&mut self) {
        let view = self.view();
        self.surface.render(&view);
    }
}

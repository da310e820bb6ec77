//! App: the single-owner event loop.
//!
//! Architecture:
//! - `App` owns the `PlayerState` and every component; nothing else mutates them.
//! - A `tokio::mpsc` channel carries `AppMessage` events in from background
//!   tasks (terminal input, feed fetches, mpv events).
//! - The loop draws each frame from the latest `PlayerView`, then awaits the
//!   next message.
//! - Components return `Vec<Action>`; App applies each Action to the player.

use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use podcast_proto::episode::Episode;
use podcast_proto::error::{FeedError, PlaybackError};
use podcast_proto::ingest::{FeedIngester, HttpFeedSource};
use podcast_proto::player::{PlayerState, PlayerView};

use crate::{
    action::{Action, ComponentId},
    component::Component,
    components::{
        episode_grid::{EpisodeGridPane, CARD_HEIGHT},
        hit,
        mini_player::MiniPlayer,
        player_panel::{PlayerPanel, PANEL_HEIGHT},
    },
    mpv::{MpvEvent, MpvSink},
    surface::TuiSurface,
    theme::{style_muted, style_secondary},
    widgets::filter_input::{FilterAction, FilterInput},
};

pub type TuiPlayer = PlayerState<MpvSink, TuiSurface>;

// ── Internal event bus ────────────────────────────────────────────────────────

enum AppMessage {
    Event(Event),
    Feed(Result<Vec<Episode>, FeedError>),
    Mpv(MpvEvent),
}

const KEY_HINTS: &str = " space play/pause · n/p next/prev · / search · r reload · tab focus · q quit";

/// Where each pane was drawn last frame, for mouse hit-testing.
#[derive(Debug, Clone, Copy, Default)]
struct PaneAreas {
    player_panel: Rect,
    filter: Rect,
    episode_grid: Rect,
    mini_player: Rect,
}

pub struct App {
    player: TuiPlayer,
    ingester: FeedIngester<HttpFeedSource>,

    player_panel: PlayerPanel,
    episode_grid: EpisodeGridPane,
    mini_player: MiniPlayer,
    filter: FilterInput,

    focus: ComponentId,
    pane_areas: PaneAreas,
    msg_tx: Option<mpsc::Sender<AppMessage>>,
    fetching: bool,
    should_quit: bool,
}

impl App {
    pub fn new(player: TuiPlayer, ingester: FeedIngester<HttpFeedSource>) -> Self {
        Self {
            player,
            ingester,
            player_panel: PlayerPanel::new(),
            episode_grid: EpisodeGridPane::new(),
            mini_player: MiniPlayer::new(),
            filter: FilterInput::new("search episodes..."),
            focus: ComponentId::EpisodeGrid,
            pane_areas: PaneAreas::default(),
            msg_tx: None,
            fetching: false,
            should_quit: false,
        }
    }

    pub async fn run(mut self, mut mpv_events: mpsc::Receiver<MpvEvent>) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(1024);
        self.msg_tx = Some(tx.clone());

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: mpv events → AppMessage ──────────────────────────
        let mpv_tx = tx.clone();
        tokio::spawn(async move {
            while let Some(ev) = mpv_events.recv().await {
                if mpv_tx.send(AppMessage::Mpv(ev)).await.is_err() {
                    break;
                }
            }
        });

        self.reload();

        // Toast expiry + spinner animation
        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        loop {
            terminal.draw(|f| self.draw(f))?;

            // A filter or resize may have shrunk the grid under its scroll offset
            let view = self.view();
            for action in self.episode_grid.reflow(&view) {
                self.apply_action(action).await;
            }

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    self.handle_message(msg).await;
                }
                _ = toast_tick.tick() => {
                    self.player.surface_mut().toast_mut().tick();
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        info!("pod exiting");

        Ok(())
    }

    async fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::Event(Event::Key(key)) => {
                for action in self.handle_key(key) {
                    self.apply_action(action).await;
                }
            }
            AppMessage::Event(Event::Mouse(mouse)) => {
                for action in self.handle_mouse(mouse) {
                    self.apply_action(action).await;
                }
            }
            AppMessage::Event(_) => {}
            AppMessage::Feed(result) => self.on_feed(result),
            AppMessage::Mpv(ev) => {
                if let Some(reason) = ev.load_failure() {
                    self.player.playback_failed(PlaybackError::new(reason));
                } else if ev.is_end_of_file() && self.player.is_playing() {
                    info!("mpv: episode finished");
                    self.player.pause();
                }
            }
        }
    }

    // ── Feed ──────────────────────────────────────────────────────────────────

    /// Show the loading placeholder and fetch the feed on a background task.
    fn reload(&mut self) {
        if self.fetching {
            debug!("feed: fetch already in flight");
            return;
        }
        let Some(tx) = self.msg_tx.clone() else {
            return;
        };
        self.fetching = true;
        self.player.show_loading();
        self.player
            .surface_mut()
            .toast_mut()
            .spinner("loading episodes...");

        let ingester = self.ingester.clone();
        tokio::spawn(async move {
            let result = ingester.fetch().await;
            let _ = tx.send(AppMessage::Feed(result)).await;
        });
    }

    fn on_feed(&mut self, result: Result<Vec<Episode>, FeedError>) {
        self.fetching = false;
        let toast = self.player.surface_mut().toast_mut();
        toast.dismiss_spinner();
        match &result {
            Ok(episodes) => toast.success(format!("{} episodes", episodes.len())),
            Err(e) => {
                warn!("feed: fetch failed: {}", e);
                toast.error(e.to_string());
            }
        }
        self.player.apply_feed(result);
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.kind != KeyEventKind::Press {
            return vec![];
        }
        if key.code == KeyCode::Char('c') && key.modifiers == KeyModifiers::CONTROL {
            return vec![Action::Quit];
        }

        // The search bar captures all keys while open
        if self.filter.is_active() {
            return match self.filter.handle_key(key) {
                FilterAction::Changed(query) => vec![Action::FilterChanged(query)],
                FilterAction::Confirmed | FilterAction::Cancelled => {
                    vec![Action::FocusPane(ComponentId::EpisodeGrid)]
                }
            };
        }

        match key.code {
            KeyCode::Char('q') => return vec![Action::Quit],
            KeyCode::Char(' ') => return vec![Action::TogglePlay],
            KeyCode::Char('n') => return vec![Action::Next],
            KeyCode::Char('p') => return vec![Action::Prev],
            KeyCode::Char('/') => return vec![Action::OpenFilter],
            KeyCode::Char('r') => return vec![Action::Reload],
            KeyCode::Tab | KeyCode::BackTab => return vec![Action::FocusNext],
            _ => {}
        }

        let view = self.view();
        match focus_target(self.focus, view.mini_player.visible) {
            ComponentId::PlayerPanel => self.player_panel.handle_key(key, &view),
            ComponentId::EpisodeGrid => self.episode_grid.handle_key(key, &view),
            ComponentId::MiniPlayer => self.mini_player.handle_key(key, &view),
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        if !matches!(
            event.kind,
            MouseEventKind::Down(_) | MouseEventKind::ScrollUp | MouseEventKind::ScrollDown
        ) {
            return vec![];
        }
        let (col, row) = (event.column, event.row);
        let areas = self.pane_areas;
        let view = self.view();

        if hit(areas.filter, col, row) && matches!(event.kind, MouseEventKind::Down(_)) {
            return vec![Action::OpenFilter];
        }
        let (component, area) = if hit(areas.mini_player, col, row) {
            (&mut self.mini_player as &mut dyn Component, areas.mini_player)
        } else if hit(areas.player_panel, col, row) {
            (&mut self.player_panel as &mut dyn Component, areas.player_panel)
        } else if hit(areas.episode_grid, col, row) {
            (&mut self.episode_grid as &mut dyn Component, areas.episode_grid)
        } else {
            return vec![];
        };
        let mut actions = component.handle_mouse(event, area, &view);
        if matches!(event.kind, MouseEventKind::Down(_)) {
            actions.insert(0, Action::FocusPane(component.id()));
        }
        actions
    }

    // ── Action dispatcher ─────────────────────────────────────────────────────

    async fn apply_action(&mut self, action: Action) {
        debug!("action: {:?}", action);
        match action {
            Action::TogglePlay => self.player.toggle().await,
            Action::Next => self.player.next().await,
            Action::Prev => self.player.prev().await,
            Action::PlayEpisode(index) => self.player.select_and_play(index).await,
            Action::Scrolled { previous, current } => self.player.on_scroll(previous, current),
            Action::OpenFilter => {
                self.filter.activate();
                self.focus = ComponentId::EpisodeGrid;
            }
            Action::FilterChanged(query) => self.player.set_query(&query),
            Action::FocusNext => {
                let mini_visible = self.player.mini_player_visible();
                self.focus = next_focus(focus_target(self.focus, mini_visible), mini_visible);
            }
            Action::FocusPane(id) => self.focus = id,
            Action::Reload => self.reload(),
            Action::Quit => self.should_quit = true,
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    /// Latest rendered snapshot; before the first render, a fresh one.
    fn view(&self) -> PlayerView {
        self.player
            .surface()
            .view()
            .cloned()
            .unwrap_or_else(|| self.player.view())
    }

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        let area = frame.area();
        let view = self.view();
        let mini_height = u16::from(view.mini_player.visible);

        let [panel, filter, grid, mini, hints] = Layout::vertical([
            Constraint::Length(PANEL_HEIGHT),
            Constraint::Length(1),
            Constraint::Min(CARD_HEIGHT + 2),
            Constraint::Length(mini_height),
            Constraint::Length(1),
        ])
        .areas(area);

        self.pane_areas = PaneAreas {
            player_panel: panel,
            filter,
            episode_grid: grid,
            mini_player: mini,
        };

        let focus = focus_target(self.focus, view.mini_player.visible);
        self.player_panel
            .draw(frame, panel, focus == ComponentId::PlayerPanel, &view);

        let shown = view.grid.visible_entries().count();
        self.filter
            .draw(frame, filter, shown, view.grid.entries().len());

        self.episode_grid
            .draw(frame, grid, focus == ComponentId::EpisodeGrid, &view);

        if view.mini_player.visible {
            self.mini_player
                .draw(frame, mini, focus == ComponentId::MiniPlayer, &view);
        }

        let query = self.filter.text();
        let hint_line = if query.is_empty() {
            Line::from(Span::styled(KEY_HINTS, style_muted()))
        } else {
            Line::from(vec![
                Span::styled(format!(" filter \"{}\" ·", query), style_secondary()),
                Span::styled(KEY_HINTS, style_muted()),
            ])
        };
        frame.render_widget(Paragraph::new(hint_line), hints);

        self.player.surface().toast().draw(frame, area);
    }
}

/// The pane that owns keyboard focus. A hidden mini-player hands it back to
/// the grid.
fn focus_target(focus: ComponentId, mini_visible: bool) -> ComponentId {
    match focus {
        ComponentId::MiniPlayer if !mini_visible => ComponentId::EpisodeGrid,
        other => other,
    }
}

/// Tab order: grid, player panel, then the mini-player while it is shown.
fn next_focus(focus: ComponentId, mini_visible: bool) -> ComponentId {
    match focus {
        ComponentId::EpisodeGrid => ComponentId::PlayerPanel,
        ComponentId::PlayerPanel if mini_visible => ComponentId::MiniPlayer,
        ComponentId::PlayerPanel | ComponentId::MiniPlayer => ComponentId::EpisodeGrid,
    }
}

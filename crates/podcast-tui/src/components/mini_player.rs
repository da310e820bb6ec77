//! MiniPlayer: one-row bar pinned under the grid once the user has scrolled
//! down. Highlighted while audio is playing.

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

use podcast_proto::player::PlayerView;

use crate::action::{Action, ComponentId};
use crate::component::Component;
use crate::theme::{C_MINI_BG, C_PLAYING, C_PRIMARY, C_SECONDARY};
use crate::widgets::fit_width;

/// Each control is one glyph padded to three cells.
const CONTROL_WIDTH: u16 = 3;
const CONTROLS_WIDTH: u16 = CONTROL_WIDTH * 3 + 1;

#[derive(Default)]
pub struct MiniPlayer;

impl MiniPlayer {
    pub fn new() -> Self {
        Self
    }

    /// The control under column `col`, right-aligned as ` ⏮  ⏯  ⏭ `.
    pub fn control_at(area: Rect, col: u16) -> Option<Action> {
        let start = (area.x + area.width).checked_sub(CONTROLS_WIDTH)?;
        if col < start || col >= area.x + area.width {
            return None;
        }
        match (col - start) / CONTROL_WIDTH {
            0 => Some(Action::Prev),
            1 => Some(Action::TogglePlay),
            2 => Some(Action::Next),
            _ => None,
        }
    }

    /// Title and description excerpt of the current episode.
    pub fn label(view: &PlayerView) -> String {
        match &view.now_playing {
            Some(now) if now.excerpt.is_empty() => now.title.clone(),
            Some(now) => format!("{} · {}", now.title, now.excerpt),
            None => String::new(),
        }
    }
}

impl Component for MiniPlayer {
    fn id(&self) -> ComponentId {
        ComponentId::MiniPlayer
    }

    fn handle_key(&mut self, key: KeyEvent, _view: &PlayerView) -> Vec<Action> {
        if key.kind != KeyEventKind::Press {
            return vec![];
        }
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => vec![Action::Prev],
            KeyCode::Right | KeyCode::Char('l') => vec![Action::Next],
            KeyCode::Enter => vec![Action::TogglePlay],
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, _view: &PlayerView) -> Vec<Action> {
        if event.kind != MouseEventKind::Down(MouseButton::Left) {
            return vec![];
        }
        // Anywhere left of the controls toggles playback.
        vec![Self::control_at(area, event.column).unwrap_or(Action::TogglePlay)]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, view: &PlayerView) {
        let fg = if view.mini_player.active {
            C_PLAYING
        } else {
            C_PRIMARY
        };
        let style = Style::default().bg(C_MINI_BG).fg(fg);

        let title_width = (area.width.saturating_sub(CONTROLS_WIDTH + 4)) as usize;
        let title = fit_width(&Self::label(view), title_width);
        let controls = format!(" ⏮  {}  ⏭ ", view.icon.glyph());
        let controls_fg = if focused { C_PRIMARY } else { C_SECONDARY };
        let pad = (area.width as usize)
            .saturating_sub(title.width() + 3 + controls.width());

        let line = Line::from(vec![
            Span::styled(format!(" {} ", view.icon.glyph()), style),
            Span::styled(title, style),
            Span::styled(" ".repeat(pad), style),
            Span::styled(controls, Style::default().bg(C_MINI_BG).fg(controls_fg)),
        ]);
        frame.render_widget(Paragraph::new(line).style(Style::default().bg(C_MINI_BG)), area);
    }
}

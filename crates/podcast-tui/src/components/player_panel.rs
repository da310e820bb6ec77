//! PlayerPanel: the main player: current episode metadata and the
//! prev / play-pause / next buttons.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use podcast_proto::player::{PlayIcon, PlayerView};

use crate::action::{Action, ComponentId};
use crate::component::Component;
use crate::components::hit;
use crate::theme::{
    style_active, style_border, style_default, style_muted, style_playing, style_secondary,
    style_selected,
};
use crate::widgets::fit_width;

/// Borders plus title, excerpt, artwork, spacer and button rows.
pub const PANEL_HEIGHT: u16 = 7;

const BUTTON_ROW: u16 = 4;
const BUTTON_WIDTH: u16 = 11;
const BUTTON_GAP: u16 = 2;

#[derive(Default)]
pub struct PlayerPanel;

impl PlayerPanel {
    pub fn new() -> Self {
        Self
    }

    /// Prev, play/pause and next button rectangles inside the panel border.
    pub fn buttons(area: Rect) -> [(Rect, Action); 3] {
        let inner = Block::default().borders(Borders::ALL).inner(area);
        let y = inner.y + BUTTON_ROW;
        let height = u16::from(inner.height > BUTTON_ROW);
        let at = |slot: u16| Rect {
            x: inner.x + 1 + slot * (BUTTON_WIDTH + BUTTON_GAP),
            y,
            width: BUTTON_WIDTH.min(inner.width.saturating_sub(1 + slot * (BUTTON_WIDTH + BUTTON_GAP))),
            height,
        };
        [
            (at(0), Action::Prev),
            (at(1), Action::TogglePlay),
            (at(2), Action::Next),
        ]
    }

    fn play_label(icon: PlayIcon) -> String {
        match icon {
            PlayIcon::Play => format!("{} play", icon.glyph()),
            PlayIcon::Pause => format!("{} pause", icon.glyph()),
        }
    }
}

impl Component for PlayerPanel {
    fn id(&self) -> ComponentId {
        ComponentId::PlayerPanel
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
        Self::buttons(area)
            .into_iter()
            .find(|(rect, _)| hit(*rect, event.column, event.row))
            .map(|(_, action)| vec![action])
            .unwrap_or_default()
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, view: &PlayerView) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(style_border(focused))
            .title(Span::styled(" now playing ", style_secondary()));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.width == 0 || inner.height == 0 {
            return;
        }
        let width = inner.width as usize;

        let mut lines = match &view.now_playing {
            Some(now) => {
                let title_style = if view.is_playing {
                    style_playing()
                } else {
                    style_active()
                };
                let mut title = vec![
                    Span::styled(format!("{} ", view.icon.glyph()), title_style),
                    Span::styled(fit_width(&now.title, width.saturating_sub(10)), title_style),
                ];
                if !now.has_audio {
                    title.push(Span::styled("  no audio", style_muted()));
                }
                vec![
                    Line::from(title),
                    Line::from(Span::styled(fit_width(&now.excerpt, width), style_default())),
                    Line::from(Span::styled(
                        fit_width(&format!("art {}", now.thumbnail_url), width),
                        style_muted(),
                    )),
                ]
            }
            None => vec![
                Line::from(Span::styled("nothing selected", style_muted())),
                Line::default(),
                Line::default(),
            ],
        };
        lines.push(Line::default());
        frame.render_widget(Paragraph::new(lines), inner);

        let labels = [
            "⏮ prev".to_string(),
            Self::play_label(view.icon),
            "next ⏭".to_string(),
        ];
        for ((rect, _), label) in Self::buttons(area).iter().zip(labels) {
            if rect.width == 0 || rect.height == 0 {
                continue;
            }
            let text = fit_width(&format!(" {} ", label), rect.width as usize);
            frame.render_widget(Paragraph::new(Span::styled(text, style_selected())), *rect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn view() -> PlayerView {
        PlayerView {
            now_playing: None,
            is_playing: false,
            icon: PlayIcon::Play,
            mini_player: Default::default(),
            grid: podcast_proto::grid::GridView::Empty,
        }
    }

    #[test]
    fn test_buttons_sit_on_the_button_row() {
        let area = Rect::new(0, 0, 80, PANEL_HEIGHT);
        let [(prev, _), (play, _), (next, _)] = PlayerPanel::buttons(area);
        assert_eq!(prev.y, 1 + BUTTON_ROW);
        assert!(prev.x + prev.width < play.x);
        assert!(play.x + play.width < next.x);
    }

    #[test]
    fn test_clicks_map_to_buttons() {
        let area = Rect::new(0, 0, 80, PANEL_HEIGHT);
        let mut panel = PlayerPanel::new();
        let [(prev, _), (play, _), (next, _)] = PlayerPanel::buttons(area);

        assert_eq!(panel.handle_mouse(click(prev.x, prev.y), area, &view()), [Action::Prev]);
        assert_eq!(
            panel.handle_mouse(click(play.x + 2, play.y), area, &view()),
            [Action::TogglePlay]
        );
        assert_eq!(panel.handle_mouse(click(next.x, next.y), area, &view()), [Action::Next]);
        assert!(panel.handle_mouse(click(0, 0), area, &view()).is_empty());
    }
}

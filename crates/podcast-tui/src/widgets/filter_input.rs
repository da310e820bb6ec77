//! Search bar above the episode grid, backed by tui-input.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{C_FILTER_BG, C_FILTER_FG, C_MUTED, C_SECONDARY};

#[derive(Debug, PartialEq, Eq)]
pub enum FilterAction {
    Changed(String),
    /// Enter: keep the query, return keys to the grid.
    Confirmed,
    /// Esc on an empty query.
    Cancelled,
}

pub struct FilterInput {
    input: Input,
    active: bool,
    placeholder: &'static str,
}

impl FilterInput {
    pub fn new(placeholder: &'static str) -> Self {
        Self {
            input: Input::default(),
            active: false,
            placeholder,
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn text(&self) -> &str {
        self.input.value()
    }

    /// Esc clears a non-empty query first and closes the bar second.
    pub fn handle_key(&mut self, key: KeyEvent) -> FilterAction {
        match key.code {
            KeyCode::Esc if !self.input.value().is_empty() => {
                self.input.reset();
                FilterAction::Changed(String::new())
            }
            KeyCode::Esc => {
                self.active = false;
                FilterAction::Cancelled
            }
            KeyCode::Enter => {
                self.active = false;
                FilterAction::Confirmed
            }
            _ => {
                self.input.handle_event(&Event::Key(key));
                FilterAction::Changed(self.input.value().to_string())
            }
        }
    }

    /// One row: `/ query` on the left, `shown/total` on the right.
    pub fn draw(&self, frame: &mut Frame, area: Rect, shown: usize, total: usize) {
        let count = format!("{}/{} ", shown, total);
        let text_width = area.width.saturating_sub(count.len() as u16 + 2) as usize;
        let scroll = self.input.visual_scroll(text_width);
        let value = self.input.value();

        let query = if value.is_empty() && !self.active {
            Span::styled(format!("/ {}", self.placeholder), Style::default().fg(C_MUTED))
        } else {
            let visible: String = value.chars().skip(scroll).collect();
            Span::styled(format!("/ {}", visible), Style::default().fg(C_FILTER_FG))
        };
        let used = query.content.chars().count() + count.len();
        let pad = (area.width as usize).saturating_sub(used);

        let line = Line::from(vec![
            query,
            Span::raw(" ".repeat(pad)),
            Span::styled(count, Style::default().fg(C_SECONDARY)),
        ]);
        frame.render_widget(
            Paragraph::new(line).style(Style::default().bg(C_FILTER_BG)),
            area,
        );

        if self.active && area.width > 0 {
            let cursor_x = area.x + 2 + (self.input.visual_cursor() - scroll) as u16;
            frame.set_cursor_position((cursor_x.min(area.x + area.width - 1), area.y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_typing_reports_query() {
        let mut filter = FilterInput::new("search episodes...");
        filter.activate();
        filter.handle_key(key(KeyCode::Char('j')));
        let action = filter.handle_key(key(KeyCode::Char('s')));
        assert_eq!(action, FilterAction::Changed("js".to_string()));
        assert_eq!(filter.text(), "js");
    }

    #[test]
    fn test_esc_clears_then_closes() {
        let mut filter = FilterInput::new("search episodes...");
        filter.activate();
        filter.handle_key(key(KeyCode::Char('x')));

        assert_eq!(filter.handle_key(key(KeyCode::Esc)), FilterAction::Changed(String::new()));
        assert!(filter.is_active());
        assert_eq!(filter.handle_key(key(KeyCode::Esc)), FilterAction::Cancelled);
        assert!(!filter.is_active());
    }

    #[test]
    fn test_enter_keeps_query() {
        let mut filter = FilterInput::new("search episodes...");
        filter.activate();
        filter.handle_key(key(KeyCode::Char('a')));
        assert_eq!(filter.handle_key(key(KeyCode::Enter)), FilterAction::Confirmed);
        assert!(!filter.is_active());
        assert_eq!(filter.text(), "a");
    }
}

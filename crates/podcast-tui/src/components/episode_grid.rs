//! EpisodeGridPane: the episode list laid out as a grid of cards.
//!
//! Cards are filled row by row from the visible (query-matching) entries.
//! The pane scrolls in whole card rows and reports every offset change as
//! `Action::Scrolled`, which drives the mini-player.

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use podcast_proto::grid::{GridEntry, GridView};
use podcast_proto::player::PlayerView;

use crate::action::{Action, ComponentId};
use crate::component::Component;
use crate::theme::{
    style_active, style_border, style_default, style_focused_border, style_muted,
    style_secondary, style_selected,
};
use crate::widgets::fit_width;

pub const MIN_CARD_WIDTH: u16 = 28;
/// Border, title, excerpt and thumbnail rows.
pub const CARD_HEIGHT: u16 = 5;

/// Card geometry for one pane size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub columns: usize,
    pub card_width: u16,
    pub rows_visible: usize,
}

impl GridLayout {
    /// `area` is the inside of the pane border.
    pub fn for_area(area: Rect) -> Self {
        let columns = (area.width / MIN_CARD_WIDTH).max(1);
        Self {
            columns: columns as usize,
            card_width: area.width / columns,
            rows_visible: (area.height / CARD_HEIGHT).max(1) as usize,
        }
    }

    pub fn total_rows(&self, count: usize) -> usize {
        count.div_ceil(self.columns)
    }

    pub fn max_offset(&self, count: usize) -> usize {
        self.total_rows(count).saturating_sub(self.rows_visible)
    }

    /// Rectangle of the card at `position` (index into the visible entries),
    /// or `None` when it is scrolled out of view.
    pub fn card_rect(&self, area: Rect, position: usize, offset: usize) -> Option<Rect> {
        let row = (position / self.columns).checked_sub(offset)?;
        if row >= self.rows_visible {
            return None;
        }
        let col = position % self.columns;
        let y = area.y + row as u16 * CARD_HEIGHT;
        let height = CARD_HEIGHT.min((area.y + area.height).saturating_sub(y));
        if height == 0 {
            return None;
        }
        Some(Rect {
            x: area.x + col as u16 * self.card_width,
            y,
            width: self.card_width,
            height,
        })
    }

    /// Position (index into the visible entries) of the card under the cell.
    pub fn position_at(&self, area: Rect, col: u16, row: u16, offset: usize, count: usize) -> Option<usize> {
        if col < area.x || row < area.y || col >= area.x + area.width || row >= area.y + area.height {
            return None;
        }
        let column = ((col - area.x) / self.card_width) as usize;
        if column >= self.columns {
            return None;
        }
        let card_row = ((row - area.y) / CARD_HEIGHT) as usize + offset;
        let position = card_row * self.columns + column;
        (position < count).then_some(position)
    }
}

pub struct EpisodeGridPane {
    /// Keyboard cursor, an index into the visible entries.
    cursor: usize,
    /// First card row on screen.
    offset: usize,
    /// Geometry of the last draw; keys and the mouse are resolved against it.
    layout: GridLayout,
}

impl EpisodeGridPane {
    pub fn new() -> Self {
        Self {
            cursor: 0,
            offset: 0,
            layout: GridLayout {
                columns: 1,
                card_width: MIN_CARD_WIDTH,
                rows_visible: 1,
            },
        }
    }

    fn inner(area: Rect) -> Rect {
        Block::default().borders(Borders::ALL).inner(area)
    }

    fn scroll_to(&mut self, offset: usize, count: usize) -> Vec<Action> {
        let offset = offset.min(self.layout.max_offset(count));
        if offset == self.offset {
            return vec![];
        }
        let previous = std::mem::replace(&mut self.offset, offset);
        vec![Action::Scrolled {
            previous,
            current: offset,
        }]
    }

    /// Clamp the cursor and offset to the current visible entries. A shrunk
    /// grid scrolls back through `scroll_to`, so the move is reported.
    pub fn reflow(&mut self, view: &PlayerView) -> Vec<Action> {
        let count = view.grid.visible_entries().count();
        self.cursor = self.cursor.min(count.saturating_sub(1));
        self.scroll_to(self.offset, count)
    }

    /// Move the cursor and scroll just enough to keep it on screen.
    fn move_cursor(&mut self, cursor: usize, count: usize) -> Vec<Action> {
        if count == 0 {
            return vec![];
        }
        self.cursor = cursor.min(count - 1);
        let row = self.cursor / self.layout.columns;
        if row < self.offset {
            self.scroll_to(row, count)
        } else if row >= self.offset + self.layout.rows_visible {
            self.scroll_to(row + 1 - self.layout.rows_visible, count)
        } else {
            vec![]
        }
    }

    fn draw_card(frame: &mut Frame, rect: Rect, entry: &GridEntry, under_cursor: bool) {
        let border = if entry.active {
            style_active()
        } else if under_cursor {
            style_focused_border()
        } else {
            style_border(false)
        };
        let block = Block::default().borders(Borders::ALL).border_style(border);
        let inner = block.inner(rect);
        frame.render_widget(block, rect);

        let width = inner.width as usize;
        let title_style = if entry.active {
            style_active()
        } else {
            style_default()
        };
        let lines = vec![
            Line::from(Span::styled(fit_width(&entry.title, width), title_style)),
            Line::from(Span::styled(fit_width(&entry.excerpt, width), style_secondary())),
            Line::from(Span::styled(
                fit_width(&format!("art {}", entry.shown_thumbnail()), width),
                style_muted(),
            )),
        ];
        let body = Paragraph::new(lines);
        let body = if under_cursor {
            body.style(style_selected())
        } else {
            body
        };
        frame.render_widget(body, inner);
    }
}

impl Default for EpisodeGridPane {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for EpisodeGridPane {
    fn id(&self) -> ComponentId {
        ComponentId::EpisodeGrid
    }

    fn handle_key(&mut self, key: KeyEvent, view: &PlayerView) -> Vec<Action> {
        if key.kind != KeyEventKind::Press {
            return vec![];
        }
        let visible: Vec<&GridEntry> = view.grid.visible_entries().collect();
        let count = visible.len();
        let columns = self.layout.columns;
        let page = columns * self.layout.rows_visible;
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(self.cursor + columns, count),
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_cursor(self.cursor.saturating_sub(columns), count)
            }
            KeyCode::Right | KeyCode::Char('l') => self.move_cursor(self.cursor + 1, count),
            KeyCode::Left | KeyCode::Char('h') => {
                self.move_cursor(self.cursor.saturating_sub(1), count)
            }
            KeyCode::PageDown => self.move_cursor(self.cursor + page, count),
            KeyCode::PageUp => self.move_cursor(self.cursor.saturating_sub(page), count),
            KeyCode::Home | KeyCode::Char('g') => self.move_cursor(0, count),
            KeyCode::End | KeyCode::Char('G') => self.move_cursor(usize::MAX, count),
            KeyCode::Enter => visible
                .get(self.cursor)
                .map(|entry| vec![Action::PlayEpisode(entry.index)])
                .unwrap_or_default(),
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, view: &PlayerView) -> Vec<Action> {
        let visible: Vec<&GridEntry> = view.grid.visible_entries().collect();
        let count = visible.len();
        match event.kind {
            MouseEventKind::ScrollDown => self.scroll_to(self.offset + 1, count),
            MouseEventKind::ScrollUp => self.scroll_to(self.offset.saturating_sub(1), count),
            MouseEventKind::Down(MouseButton::Left) => {
                let inner = Self::inner(area);
                let Some(position) =
                    self.layout
                        .position_at(inner, event.column, event.row, self.offset, count)
                else {
                    return vec![];
                };
                self.cursor = position;
                vec![Action::PlayEpisode(visible[position].index)]
            }
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, view: &PlayerView) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(style_border(focused))
            .title(Span::styled(" episodes ", style_secondary()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if let Some(message) = view.grid.placeholder() {
            let style = match view.grid {
                GridView::Failed(_) => style_active(),
                _ => style_muted(),
            };
            let text: Vec<Line> = message
                .lines()
                .map(|l| Line::from(Span::styled(l.to_string(), style)))
                .collect();
            frame.render_widget(
                Paragraph::new(text)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true }),
                inner,
            );
            return;
        }

        self.layout = GridLayout::for_area(inner);
        let visible: Vec<&GridEntry> = view.grid.visible_entries().collect();
        if visible.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("no matching episodes", style_muted()))
                    .alignment(Alignment::Center),
                inner,
            );
            return;
        }

        // `reflow` runs after this frame and reports the clamp
        let offset = self.offset.min(self.layout.max_offset(visible.len()));

        for (position, entry) in visible.iter().enumerate() {
            let Some(rect) = self.layout.card_rect(inner, position, offset) else {
                continue;
            };
            Self::draw_card(frame, rect, entry, focused && position == self.cursor);
        }
    }
}

pub mod episode_grid;
pub mod mini_player;
pub mod player_panel;

use ratatui::layout::Rect;

/// Is the cell at (`col`, `row`) inside `r`?
pub fn hit(r: Rect, col: u16, row: u16) -> bool {
    r.width > 0
        && r.height > 0
        && col >= r.x
        && col < r.x + r.width
        && row >= r.y
        && row < r.y + r.height
}

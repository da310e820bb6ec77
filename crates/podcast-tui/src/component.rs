//! Component trait: the interface every UI panel implements.
//!
//! - Components draw from the latest `PlayerView`; they never read `PlayerState`.
//! - Components produce `Vec<Action>`; the App event loop applies them.

use ratatui::crossterm::event::{KeyEvent, MouseEvent};
use ratatui::{layout::Rect, Frame};

use podcast_proto::player::PlayerView;

use crate::action::{Action, ComponentId};

pub trait Component {
    fn id(&self) -> ComponentId;

    /// Only called when this component has focus.
    fn handle_key(&mut self, key: KeyEvent, view: &PlayerView) -> Vec<Action>;

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, view: &PlayerView) -> Vec<Action>;

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, view: &PlayerView);
}

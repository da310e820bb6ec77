//! `PlayerSurface` for the terminal: keeps the latest `PlayerView` for the
//! next frame and turns warnings into toasts.

use podcast_proto::player::{PlayerSurface, PlayerView};
use tracing::debug;

use crate::widgets::toast::ToastManager;

pub struct TuiSurface {
    view: Option<PlayerView>,
    toast: ToastManager,
    renders: u64,
}

impl TuiSurface {
    pub fn new() -> Self {
        Self {
            view: None,
            toast: ToastManager::new(),
            renders: 0,
        }
    }

    /// `None` until the player has rendered once.
    pub fn view(&self) -> Option<&PlayerView> {
        self.view.as_ref()
    }

    pub fn toast(&self) -> &ToastManager {
        &self.toast
    }

    pub fn toast_mut(&mut self) -> &mut ToastManager {
        &mut self.toast
    }
}

impl PlayerSurface for TuiSurface {
    fn render(&mut self, view: &PlayerView) {
        self.renders += 1;
        debug!("surface: render #{} playing={}", self.renders, view.is_playing);
        self.view = Some(view.clone());
    }

    fn warn(&mut self, message: &str) {
        self.toast.warning(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podcast_proto::grid::GridView;
    use podcast_proto::player::{MiniPlayerView, PlayIcon};

    #[test]
    fn test_render_keeps_latest_view_and_warn_toasts() {
        let mut surface = TuiSurface::new();
        assert!(surface.view().is_none());

        let view = PlayerView {
            now_playing: None,
            is_playing: false,
            icon: PlayIcon::Play,
            mini_player: MiniPlayerView::default(),
            grid: GridView::Loading,
        };
        surface.render(&view);
        surface.warn("no audio available for this episode");

        assert_eq!(surface.view(), Some(&view));
        assert_eq!(
            surface.toast().messages().collect::<Vec<_>>(),
            ["no audio available for this episode"]
        );
    }
}

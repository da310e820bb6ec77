//! Toast notifications: playback warnings and feed status.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::theme::{C_TOAST_ERROR, C_TOAST_INFO, C_TOAST_SUCCESS, C_TOAST_WARNING};
use crate::widgets::fit_width;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

impl Severity {
    fn color(self) -> ratatui::style::Color {
        match self {
            Severity::Success => C_TOAST_SUCCESS,
            Severity::Warning => C_TOAST_WARNING,
            Severity::Error => C_TOAST_ERROR,
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Severity::Success => "✓",
            Severity::Warning => "!",
            Severity::Error => "✗",
        }
    }
}

struct Toast {
    message: String,
    severity: Severity,
    expires: Instant,
}

/// Persistent toast that animates until resolved (feed loading).
struct SpinnerToast {
    message: String,
    frame: usize,
}

const SPINNER_FRAMES: &[&str] = &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];
const MAX_VISIBLE: usize = 4;

#[derive(Default)]
pub struct ToastManager {
    toasts: VecDeque<Toast>,
    spinner: Option<SpinnerToast>,
}

impl ToastManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>, severity: Severity, duration: Duration) {
        let msg = message.into();
        // Repeated warnings (e.g. play pressed twice) refresh instead of stacking
        self.toasts.retain(|t| t.message != msg);
        self.toasts.push_back(Toast {
            message: msg,
            severity,
            expires: Instant::now() + duration,
        });
        while self.toasts.len() > MAX_VISIBLE * 2 {
            self.toasts.pop_front();
        }
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Success, Duration::from_secs(3));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Warning, Duration::from_secs(4));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Error, Duration::from_secs(6));
    }

    pub fn spinner(&mut self, message: impl Into<String>) {
        self.spinner = Some(SpinnerToast {
            message: message.into(),
            frame: 0,
        });
    }

    pub fn dismiss_spinner(&mut self) {
        self.spinner = None;
    }

    /// Remove expired toasts and advance the spinner frame. Call each tick.
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.toasts.retain(|t| t.expires > now);
        if let Some(ref mut s) = self.spinner {
            s.frame = (s.frame + 1) % SPINNER_FRAMES.len();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty() && self.spinner.is_none()
    }

    /// Messages currently queued, oldest first.
    #[cfg(test)]
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.toasts.iter().map(|t| t.message.as_str())
    }

    /// Render toasts in the top-right corner of `area`, spinner first.
    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        if self.is_empty() {
            return;
        }
        let max_width = (area.width / 2).clamp(30, 60).min(area.width);

        let spinner_line = self.spinner.as_ref().map(|s| {
            let icon = SPINNER_FRAMES[s.frame % SPINNER_FRAMES.len()];
            (format!("{} {}", icon, s.message), C_TOAST_INFO)
        });
        let toast_lines = self
            .toasts
            .iter()
            .rev()
            .take(MAX_VISIBLE)
            .map(|t| (format!("{} {}", t.severity.icon(), t.message), t.severity.color()));

        for (row, (text, color)) in spinner_line.into_iter().chain(toast_lines).enumerate() {
            let y = area.y + 1 + row as u16;
            if y >= area.y + area.height {
                break;
            }
            let text = fit_width(&text, max_width.saturating_sub(2) as usize);
            let w = (text.width() as u16 + 2).min(max_width);
            let toast_area = Rect {
                x: area.x + area.width.saturating_sub(w + 1),
                y,
                width: w,
                height: 1,
            };
            frame.render_widget(Clear, toast_area);
            let paragraph = Paragraph::new(Line::from(Span::styled(
                format!(" {} ", text),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )));
            frame.render_widget(paragraph, toast_area);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_refresh_instead_of_stacking() {
        let mut toasts = ToastManager::new();
        toasts.warning("no audio available for this episode");
        toasts.error("failed to load episodes");
        toasts.warning("no audio available for this episode");
        let messages: Vec<&str> = toasts.messages().collect();
        assert_eq!(
            messages,
            ["failed to load episodes", "no audio available for this episode"]
        );
    }

    #[test]
    fn test_expired_toasts_are_dropped_on_tick() {
        let mut toasts = ToastManager::new();
        toasts.push("gone", Severity::Success, Duration::ZERO);
        toasts.success("stays");
        toasts.tick();
        assert_eq!(toasts.messages().collect::<Vec<_>>(), ["stays"]);
    }

    #[test]
    fn test_spinner_keeps_manager_non_empty() {
        let mut toasts = ToastManager::new();
        assert!(toasts.is_empty());
        toasts.spinner("loading episodes");
        toasts.tick();
        assert!(!toasts.is_empty());
        toasts.dismiss_spinner();
        assert!(toasts.is_empty());
    }

    #[test]
    fn test_queue_is_capped() {
        let mut toasts = ToastManager::new();
        for i in 0..20 {
            toasts.warning(format!("warning {i}"));
        }
        assert_eq!(toasts.messages().count(), MAX_VISIBLE * 2);
        assert_eq!(toasts.messages().last(), Some("warning 19"));
    }
}

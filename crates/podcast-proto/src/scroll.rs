//! Scroll-driven mini-player visibility.
//!
//! The mini-player is shown while the user scrolls *down* past `threshold`
//! and hidden as soon as they scroll back up or return above the threshold.
//! Whether it is *active* (highlighted) is a playback concern and lives in
//! `PlayerState`, not here.

/// Visibility after a scroll from `previous` to `current` (both offsets in the
/// same unit as `threshold`). No movement keeps `was_visible`.
pub fn mini_player_visible(
    previous: usize,
    current: usize,
    threshold: usize,
    was_visible: bool,
) -> bool {
    if current <= threshold {
        return false;
    }
    match current.cmp(&previous) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => was_visible,
    }
}

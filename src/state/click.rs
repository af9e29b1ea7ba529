//! Single/double click disambiguation

use std::time::{Duration, Instant};

use tracing::trace;

use crate::events::{InputEvent, MouseButton};

/// Default window within which a second click counts as a double click
pub const DEFAULT_DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(300);

/// Debounce state for one mouse source
#[derive(Debug, Clone)]
pub struct ClickState {
    last_click_at: Option<Instant>,
    click_count: u32,
    window: Duration,
}

impl Default for ClickState {
    fn default() -> Self {
        Self::new(DEFAULT_DOUBLE_CLICK_WINDOW)
    }
}

impl ClickState {
    /// Create a state with no click seen yet
    pub fn new(window: Duration) -> Self {
        Self {
            last_click_at: None,
            click_count: 0,
            window,
        }
    }

    /// Clicks counted in the current window
    pub fn click_count(&self) -> u32 {
        self.click_count
    }

    /// Classify one button transition
    ///
    /// Only presses are classified. A third or later press inside the same
    /// window is absorbed without producing an event.
    pub fn on_click(
        &mut self,
        x: i32,
        y: i32,
        button: &MouseButton,
        pressed: bool,
        now: Instant,
    ) -> Option<InputEvent> {
        if !pressed {
            return None;
        }

        self.click_count += 1;

        let within_window = self
            .last_click_at
            .is_some_and(|t| now.saturating_duration_since(t) < self.window);

        let event = if within_window {
            if self.click_count == 2 {
                self.click_count = 0;
                Some(InputEvent::double_click(x, y))
            } else {
                trace!(count = self.click_count, "click absorbed");
                None
            }
        } else {
            self.click_count = 1;
            Some(InputEvent::single_click(x, y, button))
        };

        self.last_click_at = Some(now);
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_release_ignored() {
        let mut clicks = ClickState::default();
        assert_eq!(
            clicks.on_click(1, 1, &MouseButton::Left, false, Instant::now()),
            None
        );
        assert_eq!(clicks.click_count(), 0);
    }

    #[test]
    fn test_two_clicks_inside_window() {
        let mut clicks = ClickState::default();
        let t0 = Instant::now();
        let first = clicks.on_click(5, 6, &MouseButton::Left, true, t0);
        let second = clicks.on_click(5, 6, &MouseButton::Left, true, t0 + 150 * MS);

        assert_eq!(first, Some(InputEvent::single_click(5, 6, &MouseButton::Left)));
        // The second press becomes a double click, not another single click
        assert_eq!(second, Some(InputEvent::double_click(5, 6)));
        assert_eq!(clicks.click_count(), 0);
    }

    #[test]
    fn test_two_clicks_outside_window() {
        let mut clicks = ClickState::default();
        let t0 = Instant::now();
        let first = clicks.on_click(0, 0, &MouseButton::Left, true, t0);
        let second = clicks.on_click(0, 0, &MouseButton::Left, true, t0 + 400 * MS);

        assert!(matches!(first, Some(InputEvent::SingleClick { .. })));
        assert!(matches!(second, Some(InputEvent::SingleClick { .. })));
    }

    #[test]
    fn test_third_click_absorbed() {
        let mut clicks = ClickState::default();
        let t0 = Instant::now();
        clicks.on_click(0, 0, &MouseButton::Left, true, t0);
        clicks.on_click(0, 0, &MouseButton::Left, true, t0 + 100 * MS);
        let third = clicks.on_click(0, 0, &MouseButton::Left, true, t0 + 200 * MS);
        assert_eq!(third, None);

        // A fourth press inside the chained window pairs up again
        let fourth = clicks.on_click(0, 0, &MouseButton::Left, true, t0 + 300 * MS);
        assert_eq!(fourth, Some(InputEvent::double_click(0, 0)));
    }

    #[test]
    fn test_button_name_in_payload() {
        let mut clicks = ClickState::default();
        let event = clicks.on_click(3, 4, &MouseButton::Middle, true, Instant::now());
        assert!(matches!(
            event,
            Some(InputEvent::SingleClick { ref button, .. }) if button == "middle_click"
        ));
    }
}

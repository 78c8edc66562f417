//! Small UI state machines: navigation menu, info-sheet drag, click detection.
//!
//! Each one only tracks state. Rendering and the side effects of a choice
//! (navigating, opening a ward) stay with the caller.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::session::View;

/// Rows a drag must cover before the sheet changes height
pub const DRAG_THRESHOLD_ROWS: i32 = 3;

/// Maximum gap between the two clicks of a double-click
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(400);

/// Navigation dropdown
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NavMenu {
    #[default]
    Closed,
    Open {
        highlighted: usize,
    },
}

impl NavMenu {
    pub fn is_open(self) -> bool {
        matches!(self, NavMenu::Open { .. })
    }

    pub fn toggle(&mut self) {
        *self = match self {
            NavMenu::Closed => NavMenu::Open { highlighted: 0 },
            NavMenu::Open { .. } => NavMenu::Closed,
        };
    }

    pub fn close(&mut self) {
        *self = NavMenu::Closed;
    }

    pub fn next(&mut self, len: usize) {
        if let NavMenu::Open { highlighted } = self {
            if len > 0 {
                *highlighted = (*highlighted + 1) % len;
            }
        }
    }

    pub fn prev(&mut self, len: usize) {
        if let NavMenu::Open { highlighted } = self {
            if len > 0 {
                *highlighted = (*highlighted + len - 1) % len;
            }
        }
    }

    /// Pick the highlighted entry and close the menu
    pub fn choose(&mut self, entries: &[View]) -> Option<View> {
        let NavMenu::Open { highlighted } = *self else {
            return None;
        };
        *self = NavMenu::Closed;
        entries.get(highlighted).copied()
    }
}

/// Resting heights of the info sheet
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PanelHeight {
    Min,
    #[default]
    Half,
    Full,
}

impl PanelHeight {
    /// Rows the sheet occupies out of `available`
    pub fn rows(self, available: u16) -> u16 {
        match self {
            PanelHeight::Min => 5.min(available),
            PanelHeight::Half => available / 2,
            PanelHeight::Full => available.saturating_sub(3),
        }
    }
}

/// Identity of whatever started a drag (a mouse button, a touch id)
pub type PointerId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ActiveDrag {
    pointer: PointerId,
    start_row: i32,
    current_row: i32,
}

/// What ending a drag did to the sheet
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SheetOutcome {
    Unchanged,
    Resized(PanelHeight),
    /// Dragged down from the minimum height
    Closed,
}

/// Bottom-sheet drag tracking. One drag at a time.
#[derive(Clone, Debug, Default)]
pub struct SheetDrag {
    height: PanelHeight,
    active: Option<ActiveDrag>,
}

impl SheetDrag {
    pub fn height(&self) -> PanelHeight {
        self.height
    }

    pub fn set_height(&mut self, height: PanelHeight) {
        self.height = height;
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    /// Rows the handle has moved down so far, for live feedback
    pub fn offset(&self) -> i32 {
        self.active
            .map(|d| (d.current_row - d.start_row).max(0))
            .unwrap_or(0)
    }

    /// Begin a drag. Ignored while another pointer is dragging.
    pub fn start(&mut self, pointer: PointerId, row: i32) -> bool {
        if self.active.is_some() {
            return false;
        }
        self.active = Some(ActiveDrag {
            pointer,
            start_row: row,
            current_row: row,
        });
        true
    }

    pub fn move_to(&mut self, pointer: PointerId, row: i32) {
        if let Some(drag) = self.active.as_mut().filter(|d| d.pointer == pointer) {
            drag.current_row = row;
        }
    }

    /// Finish the drag and apply the threshold rule
    pub fn end(&mut self, pointer: PointerId) -> SheetOutcome {
        let Some(drag) = self.active.filter(|d| d.pointer == pointer) else {
            return SheetOutcome::Unchanged;
        };
        self.active = None;

        let delta = drag.current_row - drag.start_row;
        let outcome = if delta > DRAG_THRESHOLD_ROWS {
            match self.height {
                PanelHeight::Full => SheetOutcome::Resized(PanelHeight::Half),
                PanelHeight::Half => SheetOutcome::Resized(PanelHeight::Min),
                PanelHeight::Min => SheetOutcome::Closed,
            }
        } else if delta < -DRAG_THRESHOLD_ROWS {
            match self.height {
                PanelHeight::Min => SheetOutcome::Resized(PanelHeight::Half),
                PanelHeight::Half => SheetOutcome::Resized(PanelHeight::Full),
                PanelHeight::Full => SheetOutcome::Unchanged,
            }
        } else {
            SheetOutcome::Unchanged
        };

        match outcome {
            SheetOutcome::Resized(h) => self.height = h,
            // Reopens at half height next time
            SheetOutcome::Closed => self.height = PanelHeight::Half,
            SheetOutcome::Unchanged => {}
        }
        debug!(delta, ?outcome, "sheet drag ended");
        outcome
    }

    /// Drop a drag whose pointer left the handle
    pub fn abandon(&mut self) {
        self.active = None;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Click {
    Single,
    Double,
}

/// Turns button releases into single and double clicks
#[derive(Clone, Debug, Default)]
pub struct ClickTracker {
    last: Option<(u16, u16, Instant)>,
}

impl ClickTracker {
    pub fn register(&mut self, col: u16, row: u16, at: Instant) -> Click {
        match self.last {
            Some((c, r, t)) if c == col && r == row && at.duration_since(t) <= DOUBLE_CLICK_WINDOW => {
                self.last = None;
                Click::Double
            }
            _ => {
                self.last = Some((col, row, at));
                Click::Single
            }
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nav_menu_wraps_and_chooses() {
        let views = [View::Dashboard, View::Recommendations, View::Explorer];
        let mut menu = NavMenu::default();
        assert_eq!(menu.choose(&views), None);

        menu.toggle();
        menu.prev(views.len());
        assert_eq!(menu, NavMenu::Open { highlighted: 2 });
        menu.next(views.len());
        menu.next(views.len());
        assert_eq!(menu.choose(&views), Some(View::Recommendations));
        assert!(!menu.is_open());
    }

    #[test]
    fn test_drag_down_steps_towards_closed() {
        let mut sheet = SheetDrag::default();
        sheet.set_height(PanelHeight::Full);

        for expected in [
            SheetOutcome::Resized(PanelHeight::Half),
            SheetOutcome::Resized(PanelHeight::Min),
            SheetOutcome::Closed,
        ] {
            assert!(sheet.start(1, 10));
            sheet.move_to(1, 20);
            assert_eq!(sheet.end(1), expected);
        }
        assert_eq!(sheet.height(), PanelHeight::Half);
    }

    #[test]
    fn test_drag_up_expands() {
        let mut sheet = SheetDrag::default();
        sheet.set_height(PanelHeight::Min);
        sheet.start(1, 20);
        sheet.move_to(1, 12);
        assert_eq!(sheet.end(1), SheetOutcome::Resized(PanelHeight::Half));
        sheet.start(1, 20);
        sheet.move_to(1, 12);
        assert_eq!(sheet.end(1), SheetOutcome::Resized(PanelHeight::Full));
    }

    #[test]
    fn test_small_drag_is_ignored() {
        let mut sheet = SheetDrag::default();
        sheet.start(1, 10);
        sheet.move_to(1, 12);
        assert_eq!(sheet.offset(), 2);
        assert_eq!(sheet.end(1), SheetOutcome::Unchanged);
        assert_eq!(sheet.height(), PanelHeight::Half);
    }

    #[test]
    fn test_other_pointer_cannot_interfere() {
        let mut sheet = SheetDrag::default();
        assert!(sheet.start(1, 10));
        assert!(!sheet.start(2, 0));
        sheet.move_to(2, 40);
        assert_eq!(sheet.end(2), SheetOutcome::Unchanged);
        assert!(sheet.is_dragging());
        assert_eq!(sheet.end(1), SheetOutcome::Unchanged);
    }

    #[test]
    fn test_end_without_start_is_noop() {
        let mut sheet = SheetDrag::default();
        assert_eq!(sheet.end(1), SheetOutcome::Unchanged);
        assert!(!sheet.is_dragging());
    }

    #[test]
    fn test_double_click_same_cell_within_window() {
        let mut clicks = ClickTracker::default();
        let t0 = Instant::now();
        assert_eq!(clicks.register(5, 5, t0), Click::Single);
        assert_eq!(clicks.register(5, 5, t0 + Duration::from_millis(200)), Click::Double);
        // A third click starts over
        assert_eq!(clicks.register(5, 5, t0 + Duration::from_millis(300)), Click::Single);
    }

    #[test]
    fn test_slow_or_moved_click_is_single() {
        let mut clicks = ClickTracker::default();
        let t0 = Instant::now();
        clicks.register(5, 5, t0);
        assert_eq!(clicks.register(6, 5, t0 + Duration::from_millis(100)), Click::Single);
        assert_eq!(clicks.register(6, 5, t0 + Duration::from_millis(900)), Click::Single);
    }
}

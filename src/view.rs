//! Presentation modes of the board page.
//!
//! Two axes, both independent of the assignment state: how the unassigned
//! pool is shown (compact preview or the expanded overlay) and whether the
//! board is being edited or published. Nothing here touches badges.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{BoardError, BoardResult};

/// Gap kept between the overlay and the viewport edge
const OVERLAY_MARGIN: f64 = 12.0;
const OVERLAY_MIN_WIDTH: f64 = 320.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnassignedMode {
    #[default]
    Compact,
    Expanded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishMode {
    #[default]
    Editing,
    Published,
}

/// Element that currently hosts the unassigned container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerParent {
    #[default]
    Panel,
    Overlay,
}

/// Scroll and overflow of the panel and page body, taken when the overlay
/// opens and handed back when it closes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollCapture {
    pub panel_scroll_top: f64,
    pub panel_overflow: String,
    pub body_overflow: String,
}

/// What closed the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseTrigger {
    OutsideClick,
    CloseControl,
    CancelKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub scroll_x: f64,
    #[serde(default)]
    pub scroll_y: f64,
}

/// Editing chrome hidden while published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChromeVisibility {
    pub upload_form: bool,
    pub count_inputs: bool,
    pub snapshot_controls: bool,
}

impl Default for ChromeVisibility {
    fn default() -> Self {
        ChromeVisibility {
            upload_form: true,
            count_inputs: true,
            snapshot_controls: true,
        }
    }
}

impl ChromeVisibility {
    const HIDDEN: ChromeVisibility = ChromeVisibility {
        upload_form: false,
        count_inputs: false,
        snapshot_controls: false,
    };
}

/// Current presentation state, serialized into every board view
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ViewModes {
    pub unassigned: UnassignedMode,
    pub publish: PublishMode,
    pub container_parent: ContainerParent,
    pub chrome: ChromeVisibility,
    #[serde(skip)]
    capture: Option<ScrollCapture>,
    #[serde(skip)]
    chrome_before_publish: Option<ChromeVisibility>,
}

impl ViewModes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self) -> bool {
        self.unassigned == UnassignedMode::Expanded
    }

    pub fn is_published(&self) -> bool {
        self.publish == PublishMode::Published
    }

    /// Opens the overlay, keeping the page's scroll state for later.
    /// Opening twice keeps the first capture.
    pub fn open_overlay(&mut self, capture: ScrollCapture) {
        if self.is_expanded() {
            return;
        }
        debug!("unassigned overlay opened");
        self.unassigned = UnassignedMode::Expanded;
        self.container_parent = ContainerParent::Overlay;
        self.capture = Some(capture);
    }

    /// Closes the overlay and returns the scroll state to restore
    pub fn close_overlay(&mut self, trigger: CloseTrigger) -> Option<ScrollCapture> {
        if !self.is_expanded() {
            return None;
        }
        debug!("unassigned overlay closed by {:?}", trigger);
        self.unassigned = UnassignedMode::Compact;
        self.container_parent = ContainerParent::Panel;
        self.capture.take()
    }

    /// Routes a key press; only the cancel key does anything, and only while
    /// the overlay is open
    pub fn handle_key(&mut self, key: &str) -> Option<ScrollCapture> {
        if key == "Escape" || key == "Esc" {
            self.close_overlay(CloseTrigger::CancelKey)
        } else {
            None
        }
    }

    /// Placement of the open overlay: anchored to the panel, clamped inside
    /// the visible viewport. `None` while closed.
    pub fn reposition(&self, viewport: &Viewport, anchor: &Rect) -> Option<Rect> {
        if !self.is_expanded() {
            return None;
        }

        let max_width = (viewport.width - 2.0 * OVERLAY_MARGIN).max(0.0);
        let width = anchor.width.max(OVERLAY_MIN_WIDTH).min(max_width);
        let max_height = (viewport.height - 2.0 * OVERLAY_MARGIN).max(0.0);

        let view_left = viewport.scroll_x + OVERLAY_MARGIN;
        let view_right = viewport.scroll_x + viewport.width - OVERLAY_MARGIN - width;
        let left = anchor.left.min(view_right).max(view_left);

        let view_top = viewport.scroll_y + OVERLAY_MARGIN;
        let top = anchor.top.max(view_top);
        let height = (viewport.scroll_y + viewport.height - OVERLAY_MARGIN - top)
            .min(max_height)
            .max(0.0);

        Some(Rect { left, top, width, height })
    }

    /// Enters published mode after an explicit confirmation. The overlay is
    /// closed first so the container is back in its panel.
    pub fn enter_publish(&mut self, confirmed: bool) -> BoardResult<Option<ScrollCapture>> {
        if !confirmed {
            return Err(BoardError::NotConfirmed);
        }
        if self.is_published() {
            return Ok(None);
        }

        let restored = self.close_overlay(CloseTrigger::CloseControl);
        self.container_parent = ContainerParent::Panel;
        self.chrome_before_publish = Some(self.chrome);
        self.chrome = ChromeVisibility::HIDDEN;
        self.publish = PublishMode::Published;
        debug!("board published");
        Ok(restored)
    }

    /// Leaves published mode, bringing back whatever chrome was visible before
    pub fn exit_publish(&mut self) {
        if !self.is_published() {
            return;
        }
        self.chrome = self.chrome_before_publish.take().unwrap_or_default();
        self.publish = PublishMode::Editing;
        debug!("board back to editing");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture() -> ScrollCapture {
        ScrollCapture {
            panel_scroll_top: 120.0,
            panel_overflow: "auto".to_string(),
            body_overflow: "visible".to_string(),
        }
    }

    #[test]
    fn overlay_round_trip_restores_capture() {
        let mut modes = ViewModes::new();
        modes.open_overlay(capture());
        assert!(modes.is_expanded());
        assert_eq!(modes.container_parent, ContainerParent::Overlay);

        let restored = modes.close_overlay(CloseTrigger::OutsideClick);
        assert_eq!(restored, Some(capture()));
        assert_eq!(modes.unassigned, UnassignedMode::Compact);
        assert_eq!(modes.container_parent, ContainerParent::Panel);
        assert_eq!(modes.close_overlay(CloseTrigger::CloseControl), None);
    }

    #[test]
    fn escape_closes_only_when_open() {
        let mut modes = ViewModes::new();
        assert_eq!(modes.handle_key("Escape"), None);
        modes.open_overlay(capture());
        assert_eq!(modes.handle_key("Enter"), None);
        assert!(modes.is_expanded());
        assert!(modes.handle_key("Escape").is_some());
        assert!(!modes.is_expanded());
    }

    #[test]
    fn reposition_clamps_into_viewport() {
        let mut modes = ViewModes::new();
        let viewport = Viewport { width: 800.0, height: 600.0, scroll_x: 0.0, scroll_y: 100.0 };
        let anchor = Rect { left: 700.0, top: 20.0, width: 200.0, height: 400.0 };
        assert_eq!(modes.reposition(&viewport, &anchor), None);

        modes.open_overlay(capture());
        let placed = modes.reposition(&viewport, &anchor).unwrap();
        assert_eq!(placed.width, OVERLAY_MIN_WIDTH);
        assert_eq!(placed.left, 800.0 - OVERLAY_MARGIN - OVERLAY_MIN_WIDTH);
        assert_eq!(placed.top, 100.0 + OVERLAY_MARGIN);
        assert!(placed.top + placed.height <= 700.0);
    }

    #[test]
    fn publish_requires_confirmation_and_closes_overlay() {
        let mut modes = ViewModes::new();
        modes.open_overlay(capture());

        assert!(matches!(modes.enter_publish(false), Err(BoardError::NotConfirmed)));
        assert!(modes.is_expanded());

        let restored = modes.enter_publish(true).unwrap();
        assert_eq!(restored, Some(capture()));
        assert!(modes.is_published());
        assert!(!modes.is_expanded());
        assert_eq!(modes.container_parent, ContainerParent::Panel);
        assert_eq!(modes.chrome, ChromeVisibility::HIDDEN);
    }

    #[test]
    fn exit_publish_restores_prior_chrome() {
        let mut modes = ViewModes::new();
        modes.chrome.snapshot_controls = false;
        modes.enter_publish(true).unwrap();
        modes.exit_publish();

        assert_eq!(modes.publish, PublishMode::Editing);
        assert!(modes.chrome.upload_form);
        assert!(!modes.chrome.snapshot_controls);
    }
}

//! Disclosure controller - progressive reveal of ledger rows
//!
//! Narrow viewports get rows a page at a time, advanced when a sentinel row
//! comes within a margin of the viewport edge. Wide viewports get the whole
//! table at once.

use serde::{Deserialize, Serialize};

use crate::domain::StatementEntry;

/// Rows revealed per "load more"
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Distance before the viewport edge at which the next page is fetched
pub const DEFAULT_PROXIMITY_MARGIN: f64 = 200.0;

/// Viewports narrower than this are disclosed page by page
pub const CONSTRAINED_VIEWPORT_WIDTH: u32 = 768;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisclosureMode {
    /// Page-by-page, for constrained viewports
    #[default]
    Paged,
    /// Everything at once
    Full,
}

impl DisclosureMode {
    pub fn for_viewport_width(width: u32) -> Self {
        if width < CONSTRAINED_VIEWPORT_WIDTH {
            DisclosureMode::Paged
        } else {
            DisclosureMode::Full
        }
    }
}

/// Visible window of the scroll container, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_offset: f64,
    pub height: f64,
}

impl Viewport {
    /// Whether a row starting at `top` lies within `margin` past the bottom edge
    pub fn is_near(&self, top: f64, margin: f64) -> bool {
        top <= self.scroll_offset + self.height + margin
    }
}

/// Rows appended by one step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub appended: Vec<StatementEntry>,
    pub has_more: bool,
}

/// Page cursor over the currently filtered source
///
/// Whoever changes the filter or the data must call [`reset`] before showing
/// anything, so a partial page from the old view never survives.
///
/// [`reset`]: DisclosureController::reset
#[derive(Debug, Clone)]
pub struct DisclosureController {
    page_size: usize,
    mode: DisclosureMode,
    margin: f64,
    cursor: usize,
    revealed: Vec<StatementEntry>,
}

impl Default for DisclosureController {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, DisclosureMode::default())
    }
}

impl DisclosureController {
    pub fn new(page_size: usize, mode: DisclosureMode) -> Self {
        Self {
            page_size: page_size.max(1),
            mode,
            margin: DEFAULT_PROXIMITY_MARGIN,
            cursor: 0,
            revealed: Vec::new(),
        }
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin.max(0.0);
        self
    }

    pub fn mode(&self) -> DisclosureMode {
        self.mode
    }

    /// Switch mode; the cursor restarts against `source`
    pub fn set_mode(&mut self, mode: DisclosureMode, source: &[StatementEntry]) -> Page {
        self.mode = mode;
        self.reset(source)
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Rows revealed so far
    pub fn revealed(&self) -> &[StatementEntry] {
        &self.revealed
    }

    pub fn has_more(&self, source: &[StatementEntry]) -> bool {
        self.cursor < source.len()
    }

    /// Discard everything revealed and reveal the first page of `source`
    pub fn reset(&mut self, source: &[StatementEntry]) -> Page {
        self.cursor = 0;
        self.revealed.clear();
        self.load_more(source)
    }

    /// Append the next page (or the rest, in full mode)
    pub fn load_more(&mut self, source: &[StatementEntry]) -> Page {
        let start = self.cursor.min(source.len());
        let end = match self.mode {
            DisclosureMode::Paged => start.saturating_add(self.page_size).min(source.len()),
            DisclosureMode::Full => source.len(),
        };

        let appended = source[start..end].to_vec();
        self.revealed.extend(appended.iter().cloned());
        self.cursor = end;

        Page {
            appended,
            has_more: self.has_more(source),
        }
    }

    /// Scroll notification: advances when the sentinel row (the one after the
    /// last revealed row) is within the proximity margin
    pub fn on_scroll(&mut self, sentinel_top: f64, viewport: Viewport, source: &[StatementEntry]) -> Option<Page> {
        if self.mode != DisclosureMode::Paged || !self.has_more(source) {
            return None;
        }
        if viewport.is_near(sentinel_top, self.margin) {
            Some(self.load_more(source))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timestamp;
    use rust_decimal::Decimal;

    fn rows(n: usize) -> Vec<StatementEntry> {
        (0..n)
            .map(|i| StatementEntry::new(Timestamp::INVALID, format!("row {}", i), Decimal::ZERO, Decimal::ONE))
            .collect()
    }

    #[test]
    fn test_pages_until_exhausted() {
        let source = rows(25);
        let mut controller = DisclosureController::default();

        let first = controller.reset(&source);
        assert_eq!(first.appended.len(), 10);
        assert!(first.has_more);

        let second = controller.load_more(&source);
        assert_eq!(second.appended[0].description, "row 10");
        assert!(second.has_more);

        let third = controller.load_more(&source);
        assert_eq!(third.appended.len(), 5);
        assert!(!third.has_more);
        assert_eq!(controller.revealed().len(), 25);

        let past_end = controller.load_more(&source);
        assert!(past_end.appended.is_empty());
        assert!(!past_end.has_more);
    }

    #[test]
    fn test_reset_discards_revealed_rows() {
        let mut controller = DisclosureController::new(3, DisclosureMode::Paged);
        let source = rows(10);
        controller.reset(&source);
        controller.load_more(&source);
        assert_eq!(controller.revealed().len(), 6);

        let narrowed = rows(2);
        let page = controller.reset(&narrowed);
        assert_eq!(page.appended.len(), 2);
        assert!(!page.has_more);
        assert_eq!(controller.revealed().len(), 2);
        assert_eq!(controller.cursor(), 2);
    }

    #[test]
    fn test_full_mode_reveals_everything() {
        let mut controller = DisclosureController::new(10, DisclosureMode::Full);
        let page = controller.reset(&rows(42));
        assert_eq!(page.appended.len(), 42);
        assert!(!page.has_more);
    }

    #[test]
    fn test_empty_source() {
        let mut controller = DisclosureController::default();
        let page = controller.reset(&[]);
        assert!(page.appended.is_empty());
        assert!(!page.has_more);
    }

    #[test]
    fn test_proximity_triggers_before_edge() {
        let source = rows(30);
        let mut controller = DisclosureController::new(10, DisclosureMode::Paged).with_margin(100.0);
        controller.reset(&source);
        let viewport = Viewport {
            scroll_offset: 0.0,
            height: 600.0,
        };

        // Sentinel well below the margin band: nothing happens
        assert!(controller.on_scroll(900.0, viewport, &source).is_none());
        assert_eq!(controller.cursor(), 10);

        // Sentinel not yet visible but inside the band
        let page = controller.on_scroll(650.0, viewport, &source).unwrap();
        assert_eq!(page.appended.len(), 10);
        assert_eq!(controller.cursor(), 20);
    }

    #[test]
    fn test_viewport_width_selects_mode() {
        assert_eq!(DisclosureMode::for_viewport_width(375), DisclosureMode::Paged);
        assert_eq!(DisclosureMode::for_viewport_width(1280), DisclosureMode::Full);
    }
}

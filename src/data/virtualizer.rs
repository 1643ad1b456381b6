//! Viewport virtualization math.
//!
//! Rows have a fixed estimated height, so the whole calculation is a pure
//! function of (scroll offset, viewport height, row height, row count,
//! overscan). Nothing here knows about rendering.
//!
//! ```text
//! top spacer      first_rendered * H
//! rendered rows   [first_rendered, last_rendered]
//! bottom spacer   (row_count - last_rendered - 1) * H
//! ```
//!
//! The three parts always add up to `row_count * H`, whichever window is
//! rendered.

use serde::{Deserialize, Serialize};
use std::ops::Range;

pub const DEFAULT_ROW_HEIGHT: usize = 45;
pub const DEFAULT_OVERSCAN: usize = 10;
pub const DEFAULT_THRESHOLD: usize = 100;

/// A window of rows to materialize, plus the space reserved around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualWindow {
    /// Rows intersecting the viewport
    pub visible: Range<usize>,
    /// Visible rows widened by the overscan margin
    pub rendered: Range<usize>,
    pub top_spacer: usize,
    pub bottom_spacer: usize,
    pub total_height: usize,
}

impl VirtualWindow {
    fn empty() -> Self {
        Self {
            visible: 0..0,
            rendered: 0..0,
            top_spacer: 0,
            bottom_spacer: 0,
            total_height: 0,
        }
    }

    pub fn rendered_count(&self) -> usize {
        self.rendered.len()
    }
}

/// Compute the rendered window for a scroll position.
///
/// Visible indices are clamped to `[0, row_count - 1]`; the overscan margin
/// is added on both sides and clamped again.
pub fn compute_window(
    scroll_offset: usize,
    viewport_height: usize,
    row_height: usize,
    row_count: usize,
    overscan: usize,
) -> VirtualWindow {
    if row_count == 0 || row_height == 0 {
        return VirtualWindow::empty();
    }

    let last_index = row_count - 1;
    let first_visible = (scroll_offset / row_height).min(last_index);
    let last_visible = if viewport_height == 0 {
        first_visible
    } else {
        let bottom = scroll_offset.saturating_add(viewport_height);
        (bottom.div_ceil(row_height) - 1).clamp(first_visible, last_index)
    };

    let first_rendered = first_visible.saturating_sub(overscan);
    let last_rendered = last_visible.saturating_add(overscan).min(last_index);

    VirtualWindow {
        visible: first_visible..last_visible + 1,
        rendered: first_rendered..last_rendered + 1,
        top_spacer: first_rendered * row_height,
        bottom_spacer: (row_count - last_rendered - 1) * row_height,
        total_height: row_count * row_height,
    }
}

/// Row height, overscan and the row count above which windowing kicks in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualizerConfig {
    pub row_height: usize,
    pub overscan: usize,
    pub threshold: usize,
}

impl Default for VirtualizerConfig {
    fn default() -> Self {
        Self {
            row_height: DEFAULT_ROW_HEIGHT,
            overscan: DEFAULT_OVERSCAN,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl VirtualizerConfig {
    /// Settings for read-only side lists (saved queries), which use taller
    /// items and a smaller margin
    pub fn list() -> Self {
        Self {
            row_height: 90,
            overscan: 5,
            threshold: 50,
        }
    }

    pub fn should_virtualize(&self, row_count: usize) -> bool {
        row_count > self.threshold
    }

    pub fn total_height(&self, row_count: usize) -> usize {
        row_count * self.row_height
    }

    /// Decide between rendering every row and rendering a window
    pub fn plan(&self, row_count: usize, scroll_offset: usize, viewport_height: usize) -> RenderPlan {
        if self.should_virtualize(row_count) {
            RenderPlan::Windowed(compute_window(
                scroll_offset,
                viewport_height,
                self.row_height,
                row_count,
                self.overscan,
            ))
        } else {
            RenderPlan::All {
                rows: 0..row_count,
                total_height: self.total_height(row_count),
            }
        }
    }

    /// Largest meaningful scroll offset for `row_count` rows
    pub fn max_scroll_offset(&self, row_count: usize, viewport_height: usize) -> usize {
        self.total_height(row_count).saturating_sub(viewport_height)
    }

    /// Offset that brings `row` to the top of the viewport, clamped so the
    /// viewport never scrolls past the end
    pub fn scroll_offset_for_row(&self, row: usize, row_count: usize, viewport_height: usize) -> usize {
        row.saturating_mul(self.row_height)
            .min(self.max_scroll_offset(row_count, viewport_height))
    }
}

/// What the renderer should materialize for one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderPlan {
    All { rows: Range<usize>, total_height: usize },
    Windowed(VirtualWindow),
}

impl RenderPlan {
    pub fn is_virtualized(&self) -> bool {
        matches!(self, RenderPlan::Windowed(_))
    }

    pub fn rendered_rows(&self) -> Range<usize> {
        match self {
            RenderPlan::All { rows, .. } => rows.clone(),
            RenderPlan::Windowed(window) => window.rendered.clone(),
        }
    }

    pub fn top_spacer(&self) -> usize {
        match self {
            RenderPlan::All { .. } => 0,
            RenderPlan::Windowed(window) => window.top_spacer,
        }
    }

    pub fn bottom_spacer(&self) -> usize {
        match self {
            RenderPlan::All { .. } => 0,
            RenderPlan::Windowed(window) => window.bottom_spacer,
        }
    }

    pub fn total_height(&self) -> usize {
        match self {
            RenderPlan::All { total_height, .. } => *total_height,
            RenderPlan::Windowed(window) => window.total_height,
        }
    }
}

//! Extents of the infinite canvas.

use crate::grid::{GridExtent, GridTransform};
use crate::widget::Widget;
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Grid units of empty space kept around the outermost widgets.
pub const CANVAS_PADDING: u32 = 5;

/// Rectangle in grid units covering every top-level widget plus padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasBounds {
    pub min_x: u32,
    pub max_x: u32,
    pub min_y: u32,
    pub max_y: u32,
}

impl CanvasBounds {
    /// Bounds of an empty canvas: one screen-width square at the origin.
    pub fn empty(grid_size: u32) -> Self {
        Self {
            min_x: 0,
            max_x: grid_size,
            min_y: 0,
            max_y: grid_size,
        }
    }

    pub fn width(&self) -> u32 {
        self.max_x.saturating_sub(self.min_x)
    }

    pub fn height(&self) -> u32 {
        self.max_y.saturating_sub(self.min_y)
    }
}

/// Compute canvas bounds from top-level widgets. Nested widgets are ignored.
pub fn calculate_canvas_bounds(widgets: &[Widget], grid_size: u32) -> CanvasBounds {
    let mut iter = widgets.iter();
    let Some(first) = iter.next() else {
        return CanvasBounds::empty(grid_size);
    };

    let far = |w: &Widget| {
        (
            w.position.x.saturating_add(w.size.width),
            w.position.y.saturating_add(w.size.height),
        )
    };

    let (first_x, first_y) = far(first);
    let mut bounds = CanvasBounds {
        min_x: first.position.x,
        max_x: first_x,
        min_y: first.position.y,
        max_y: first_y,
    };
    for widget in iter {
        let (far_x, far_y) = far(widget);
        bounds.min_x = bounds.min_x.min(widget.position.x);
        bounds.min_y = bounds.min_y.min(widget.position.y);
        bounds.max_x = bounds.max_x.max(far_x);
        bounds.max_y = bounds.max_y.max(far_y);
    }

    CanvasBounds {
        min_x: bounds.min_x.saturating_sub(CANVAS_PADDING),
        max_x: bounds.max_x.saturating_add(CANVAS_PADDING),
        min_y: bounds.min_y.saturating_sub(CANVAS_PADDING),
        max_y: bounds.max_y.saturating_add(CANVAS_PADDING),
    }
}

/// Canvas size in grid units. Never smaller than one screen width on either axis.
pub fn canvas_extent(bounds: &CanvasBounds, grid_size: u32) -> GridExtent {
    GridExtent::new(
        grid_size.max(bounds.width().saturating_add(grid_size)),
        grid_size.max(bounds.height().saturating_add(grid_size)),
    )
}

/// Canvas size in canvas pixels.
pub fn canvas_pixel_size(bounds: &CanvasBounds, transform: &GridTransform) -> Size {
    transform.extent_to_pixels(canvas_extent(bounds, transform.grid_size()))
}

//! Grid transform: conversions between grid units and pixel space.
//!
//! The canvas is always exactly `grid_size` columns wide at zoom 1, whatever the
//! window width. One grid unit therefore maps to
//! `viewport_width / grid_size / zoom` pixels of canvas space. The canvas itself
//! is scaled by `zoom` when rendered, so on screen one grid unit always spans
//! `viewport_width / grid_size` pixels.

use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Default number of columns across the viewport.
pub const DEFAULT_GRID_SIZE: u32 = 30;
/// Fewest columns the grid may have.
pub const MIN_GRID_SIZE: u32 = 10;
/// Most columns the grid may have.
pub const MAX_GRID_SIZE: u32 = 100;

/// Default zoom level.
pub const DEFAULT_ZOOM: f64 = 1.0;
/// Minimum zoom level.
pub const MIN_ZOOM: f64 = 0.5;
/// Maximum zoom level.
pub const MAX_ZOOM: f64 = 2.0;
/// Zoom change applied by a single zoom-in/zoom-out step.
pub const ZOOM_STEP: f64 = 0.1;

/// Viewport width assumed when the host has not reported one yet.
pub const DEFAULT_VIEWPORT_WIDTH: f64 = 1280.0;

/// Clamp a column count into `[MIN_GRID_SIZE, MAX_GRID_SIZE]`.
pub fn clamp_grid_size(size: i64) -> u32 {
    size.clamp(MIN_GRID_SIZE as i64, MAX_GRID_SIZE as i64) as u32
}

/// Clamp a zoom factor into `[MIN_ZOOM, MAX_ZOOM]`.
///
/// Non-finite input resets to [`DEFAULT_ZOOM`].
pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_finite() {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    } else {
        DEFAULT_ZOOM
    }
}

fn sanitize_viewport_width(width: f64) -> f64 {
    if width.is_finite() && width > 0.0 {
        width
    } else {
        DEFAULT_VIEWPORT_WIDTH
    }
}

/// A position in grid units. The origin is the top-left corner of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: u32,
    pub y: u32,
}

impl GridPoint {
    pub const ORIGIN: GridPoint = GridPoint { x: 0, y: 0 };

    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Move by a signed delta, clamping each axis at the origin.
    pub fn offset(self, delta: GridDelta) -> Self {
        Self {
            x: offset_axis(self.x, delta.dx, 0),
            y: offset_axis(self.y, delta.dy, 0),
        }
    }
}

/// A width/height pair in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridExtent {
    pub width: u32,
    pub height: u32,
}

impl GridExtent {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Grow or shrink by a signed delta, never going below `floor` on either axis.
    pub fn resize(self, delta: GridDelta, floor: u32) -> Self {
        Self {
            width: offset_axis(self.width, delta.dx, floor),
            height: offset_axis(self.height, delta.dy, floor),
        }
    }

    /// Raise each axis to at least `floor`.
    pub fn at_least(self, floor: u32) -> Self {
        Self {
            width: self.width.max(floor),
            height: self.height.max(floor),
        }
    }
}

/// A signed movement in whole grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GridDelta {
    pub dx: i64,
    pub dy: i64,
}

impl GridDelta {
    pub const ZERO: GridDelta = GridDelta { dx: 0, dy: 0 };

    pub fn new(dx: i64, dy: i64) -> Self {
        Self { dx, dy }
    }
}

fn offset_axis(value: u32, delta: i64, floor: u32) -> u32 {
    (value as i64)
        .saturating_add(delta)
        .clamp(floor as i64, u32::MAX as i64) as u32
}

/// Converts between grid units and pixels for one grid configuration.
///
/// Construction clamps `grid_size` and `zoom` into their valid ranges, so every
/// transform yields finite, positive unit sizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridTransform {
    viewport_width: f64,
    grid_size: u32,
    zoom: f64,
}

impl Default for GridTransform {
    fn default() -> Self {
        Self::new(DEFAULT_VIEWPORT_WIDTH, DEFAULT_GRID_SIZE, DEFAULT_ZOOM)
    }
}

impl GridTransform {
    /// Create a transform for the given viewport width (pixels), column count and zoom.
    pub fn new(viewport_width: f64, grid_size: u32, zoom: f64) -> Self {
        Self {
            viewport_width: sanitize_viewport_width(viewport_width),
            grid_size: clamp_grid_size(grid_size as i64),
            zoom: clamp_zoom(zoom),
        }
    }

    pub fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Pixel size of one grid unit in canvas space (before the zoom scale is applied).
    pub fn unit_size(&self) -> f64 {
        self.viewport_width / self.grid_size as f64 / self.zoom
    }

    /// Pixel size of one grid unit as it appears on screen.
    pub fn screen_unit_size(&self) -> f64 {
        self.unit_size() * self.zoom
    }

    /// Convert grid units to canvas pixels.
    pub fn grid_to_pixels(&self, units: f64) -> f64 {
        units * self.unit_size()
    }

    /// Convert canvas pixels to the nearest whole grid unit.
    pub fn pixels_to_grid(&self, pixels: f64) -> i64 {
        (pixels / self.unit_size()).round() as i64
    }

    /// Round a pixel value to the nearest grid line.
    pub fn snap_to_grid(&self, pixels: f64) -> f64 {
        let unit = self.unit_size();
        (pixels / unit).round() * unit
    }

    /// Canvas-pixel position of a grid point.
    pub fn point_to_pixels(&self, point: GridPoint) -> Point {
        Point::new(
            self.grid_to_pixels(point.x as f64),
            self.grid_to_pixels(point.y as f64),
        )
    }

    /// Canvas-pixel size of a grid extent.
    pub fn extent_to_pixels(&self, extent: GridExtent) -> Size {
        Size::new(
            self.grid_to_pixels(extent.width as f64),
            self.grid_to_pixels(extent.height as f64),
        )
    }

    /// Convert a pointer delta measured in screen pixels to whole grid units.
    ///
    /// Screen deltas are already scaled by zoom, so they are divided by the
    /// on-screen unit size rather than the canvas unit size.
    pub fn screen_delta_to_grid(&self, delta: Vec2) -> GridDelta {
        let unit = self.screen_unit_size();
        GridDelta {
            dx: (delta.x / unit).round() as i64,
            dy: (delta.y / unit).round() as i64,
        }
    }
}

/// Pixel size of one grid unit. See [`GridTransform::unit_size`].
pub fn grid_unit_size(viewport_width: f64, grid_size: u32, zoom: f64) -> f64 {
    GridTransform::new(viewport_width, grid_size, zoom).unit_size()
}

/// Convert grid units to pixels. See [`GridTransform::grid_to_pixels`].
pub fn grid_to_pixels(units: f64, viewport_width: f64, grid_size: u32, zoom: f64) -> f64 {
    GridTransform::new(viewport_width, grid_size, zoom).grid_to_pixels(units)
}

/// Convert pixels to the nearest grid unit. See [`GridTransform::pixels_to_grid`].
pub fn pixels_to_grid(pixels: f64, viewport_width: f64, grid_size: u32, zoom: f64) -> i64 {
    GridTransform::new(viewport_width, grid_size, zoom).pixels_to_grid(pixels)
}

/// Snap a pixel value to the grid. See [`GridTransform::snap_to_grid`].
pub fn snap_to_grid(pixels: f64, viewport_width: f64, grid_size: u32, zoom: f64) -> f64 {
    GridTransform::new(viewport_width, grid_size, zoom).snap_to_grid(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_size_scenario() {
        let transform = GridTransform::new(1200.0, 30, 1.0);
        assert!((transform.unit_size() - 40.0).abs() < 1e-9);

        let px = transform.point_to_pixels(GridPoint::new(5, 5));
        assert!((px.x - 200.0).abs() < 1e-9);
        assert!((px.y - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_unit_size_inverse_to_zoom() {
        let base = grid_unit_size(1200.0, 30, 1.0);
        let zoomed = grid_unit_size(1200.0, 30, 2.0);
        assert!((zoomed - base / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_screen_unit_size_ignores_zoom() {
        for zoom in [0.5, 0.75, 1.0, 1.3, 2.0] {
            let transform = GridTransform::new(1200.0, 30, zoom);
            assert!((transform.screen_unit_size() - 40.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_roundtrip_across_valid_range() {
        for grid_size in (MIN_GRID_SIZE..=MAX_GRID_SIZE).step_by(7) {
            for zoom in [0.5, 0.8, 1.0, 1.25, 1.7, 2.0] {
                let transform = GridTransform::new(1366.0, grid_size, zoom);
                for units in [0_i64, 1, 2, 5, 17, 99, 250] {
                    let px = transform.grid_to_pixels(units as f64);
                    assert_eq!(transform.pixels_to_grid(px), units);
                }
            }
        }
    }

    #[test]
    fn test_snap_to_grid() {
        let transform = GridTransform::new(1200.0, 30, 1.0);
        assert!((transform.snap_to_grid(59.0) - 40.0).abs() < 1e-9);
        assert!((transform.snap_to_grid(61.0) - 80.0).abs() < 1e-9);
        assert!((snap_to_grid(10.0, 1200.0, 30, 1.0)).abs() < 1e-9);
    }

    #[test]
    fn test_screen_delta_scenario() {
        let transform = GridTransform::new(1200.0, 30, 1.0);
        let delta = transform.screen_delta_to_grid(Vec2::new(-1000.0, 0.0));
        assert_eq!(delta, GridDelta::new(-25, 0));
    }

    #[test]
    fn test_screen_delta_at_zoom() {
        // On screen one unit is still 40px at zoom 2.
        let transform = GridTransform::new(1200.0, 30, 2.0);
        let delta = transform.screen_delta_to_grid(Vec2::new(80.0, 41.0));
        assert_eq!(delta, GridDelta::new(2, 1));
    }

    #[test]
    fn test_construction_clamps() {
        let transform = GridTransform::new(-5.0, 3, 9.0);
        assert_eq!(transform.grid_size(), MIN_GRID_SIZE);
        assert!((transform.zoom() - MAX_ZOOM).abs() < f64::EPSILON);
        assert!((transform.viewport_width() - DEFAULT_VIEWPORT_WIDTH).abs() < f64::EPSILON);

        let transform = GridTransform::new(800.0, 500, f64::NAN);
        assert_eq!(transform.grid_size(), MAX_GRID_SIZE);
        assert!((transform.zoom() - DEFAULT_ZOOM).abs() < f64::EPSILON);
    }

    #[test]
    fn test_point_offset_clamps_at_origin() {
        let point = GridPoint::new(3, 10);
        assert_eq!(point.offset(GridDelta::new(-25, 4)), GridPoint::new(0, 14));
    }

    #[test]
    fn test_offset_saturates_huge_delta() {
        let transform = GridTransform::new(1200.0, 30, 1.0);
        let delta = transform.screen_delta_to_grid(Vec2::new(1e300, -1e300));
        assert_eq!(delta, GridDelta::new(i64::MAX, i64::MIN));

        let point = GridPoint::new(5, 5).offset(delta);
        assert_eq!(point, GridPoint::new(u32::MAX, 0));
        let extent = GridExtent::new(6, 4).resize(delta, 2);
        assert_eq!(extent, GridExtent::new(u32::MAX, 2));
    }

    #[test]
    fn test_extent_resize_respects_floor() {
        let extent = GridExtent::new(6, 4);
        assert_eq!(extent.resize(GridDelta::new(-10, 3), 2), GridExtent::new(2, 7));
        assert_eq!(GridExtent::new(1, 0).at_least(2), GridExtent::new(2, 2));
    }
}

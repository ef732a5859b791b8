//! DM Screen Core Library
//!
//! Platform-agnostic state and interaction logic for a grid-based dashboard of
//! tabletop widgets: the grid transform, canvas bounds, viewport panning,
//! drag/resize gestures, the widget store and persistence.

pub mod bounds;
pub mod gesture;
pub mod grid;
pub mod input;
pub mod interaction;
pub mod screen;
pub mod storage;
pub mod store;
pub mod viewport;
pub mod widget;

pub use bounds::{CANVAS_PADDING, CanvasBounds, calculate_canvas_bounds, canvas_extent};
pub use gesture::{DragController, GestureController, ResizeController};
pub use grid::{
    GridDelta, GridExtent, GridPoint, GridTransform, grid_to_pixels, grid_unit_size,
    pixels_to_grid, snap_to_grid,
};
pub use input::{Modifiers, MouseButton, PointerEvent};
pub use interaction::{HitTarget, InputRouter};
pub use screen::{Mode, Screen, Theme, ThemePatch};
pub use store::{ScreenStore, StoreError, StoreResult};
pub use viewport::{PanState, Viewport, ViewportController};
pub use widget::{
    MIN_SIZE, Widget, WidgetData, WidgetId, WidgetKind, WidgetPatch, WidgetStyle,
    create_default_widget,
};

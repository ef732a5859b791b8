//! Viewport pan offset and the controller that moves it.

use crate::input::{Modifiers, MouseButton};
use crate::store::ScreenStore;
use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Scroll offset of the canvas in screen pixels. Both axes are always >= 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
}

fn clamp_offset(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

impl Viewport {
    pub const ORIGIN: Viewport = Viewport { x: 0.0, y: 0.0 };

    /// Create a viewport, clamping negative or non-finite offsets to zero.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: clamp_offset(x),
            y: clamp_offset(y),
        }
    }

    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Translate by `delta`, clamping at the origin.
    pub fn translated(&self, delta: Vec2) -> Self {
        Self::new(self.x + delta.x, self.y + delta.y)
    }

    /// Transform from canvas pixels to window pixels.
    pub fn canvas_to_screen(&self, zoom: f64) -> Affine {
        Affine::translate(-self.offset()) * Affine::scale(zoom)
    }

    /// Convert a window point to canvas pixels.
    pub fn screen_to_canvas(&self, point: Point, zoom: f64) -> Point {
        self.canvas_to_screen(zoom).inverse() * point
    }
}

/// Pan gesture state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PanState {
    #[default]
    Idle,
    /// Panning; `anchor` is the pointer position minus the viewport at pan start.
    Panning { anchor: Vec2 },
}

/// Pans the viewport from pointer drags and wheel scrolling.
#[derive(Debug, Clone, Default)]
pub struct ViewportController {
    state: PanState,
}

impl ViewportController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PanState {
        self.state
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.state, PanState::Panning { .. })
    }

    /// Whether a button press on the background should start a pan.
    pub fn starts_pan(button: MouseButton, modifiers: Modifiers) -> bool {
        button == MouseButton::Middle || (button == MouseButton::Left && modifiers.alt)
    }

    /// Pointer pressed on the canvas background. Returns true if a pan started.
    pub fn pointer_down(
        &mut self,
        store: &ScreenStore,
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    ) -> bool {
        if self.is_panning() || !Self::starts_pan(button, modifiers) {
            return false;
        }
        let anchor = position.to_vec2() - store.screen().viewport.offset();
        self.state = PanState::Panning { anchor };
        log::debug!("Pan started at {:?}", position);
        true
    }

    /// Pointer moved. Returns true if the viewport was updated.
    pub fn pointer_move(&mut self, store: &mut ScreenStore, position: Point) -> bool {
        let PanState::Panning { anchor } = self.state else {
            return false;
        };
        let offset = position.to_vec2() - anchor;
        store.set_viewport(offset.x, offset.y);
        true
    }

    /// Pointer released anywhere. Ends any pan.
    pub fn pointer_up(&mut self) -> bool {
        self.end()
    }

    /// Pointer left the window. Ends any pan.
    pub fn pointer_leave(&mut self) -> bool {
        self.end()
    }

    /// Wheel scrolled. Ignored while panning.
    ///
    /// Shift scrolls horizontally, otherwise vertically.
    pub fn wheel(&mut self, store: &mut ScreenStore, delta: Vec2, modifiers: Modifiers) -> bool {
        if self.is_panning() {
            return false;
        }
        let scroll = if modifiers.shift {
            Vec2::new(-delta.y, 0.0)
        } else {
            Vec2::new(0.0, -delta.y)
        };
        store.pan_by(scroll);
        true
    }

    fn end(&mut self) -> bool {
        let was_panning = self.is_panning();
        if was_panning {
            log::debug!("Pan ended");
        }
        self.state = PanState::Idle;
        was_panning
    }
}

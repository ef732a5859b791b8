//! Routes pointer events to the viewport and gesture controllers.

use crate::gesture::{DragController, ResizeController};
use crate::input::PointerEvent;
use crate::store::{ScreenStore, StoreResult};
use crate::viewport::ViewportController;
use crate::widget::WidgetId;

/// What the pointer was over when a button went down, as decided by the host's
/// hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// Empty canvas.
    Background,
    /// A widget's move handle.
    DragHandle(WidgetId),
    /// A widget's resize corner.
    ResizeHandle(WidgetId),
    /// A widget's content area. Content interaction is left to the host.
    Content(WidgetId),
}

/// Owns the controllers and dispatches events to whichever one holds the pointer.
///
/// Press events go to the controller for the hit target. Moves and releases are
/// treated as document-level: they go to the active gesture wherever the pointer
/// is, so a gesture keeps tracking after the pointer leaves its widget.
#[derive(Debug, Clone, Default)]
pub struct InputRouter {
    viewport: ViewportController,
    drag: DragController,
    resize: ResizeController,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn resize(&self) -> &ResizeController {
        &self.resize
    }

    /// True while any pan, drag or resize holds the pointer.
    pub fn is_busy(&self) -> bool {
        self.viewport.is_panning() || self.drag.is_active() || self.resize.is_active()
    }

    /// Dispatch one event. `target` only matters for `Down`.
    ///
    /// Returns true if the event changed controller or screen state.
    pub fn handle(
        &mut self,
        store: &mut ScreenStore,
        event: PointerEvent,
        target: HitTarget,
    ) -> StoreResult<bool> {
        match event {
            PointerEvent::Down {
                position,
                button,
                modifiers,
            } => {
                if self.is_busy() {
                    return Ok(false);
                }
                let started = match target {
                    HitTarget::Background => {
                        self.viewport.pointer_down(store, position, button, modifiers)
                    }
                    HitTarget::DragHandle(id) => self.drag.begin(store, id, position, button),
                    HitTarget::ResizeHandle(id) => self.resize.begin(store, id, position, button),
                    HitTarget::Content(_) => false,
                };
                Ok(started)
            }
            PointerEvent::Move { position } => {
                if self.drag.is_active() {
                    Ok(self.drag.update(store, position)?.is_some())
                } else if self.resize.is_active() {
                    Ok(self.resize.update(store, position)?.is_some())
                } else {
                    Ok(self.viewport.pointer_move(store, position))
                }
            }
            PointerEvent::Up { .. } => {
                let drag = self.drag.end();
                let resize = self.resize.end();
                let pan = self.viewport.pointer_up();
                Ok(drag || resize || pan)
            }
            PointerEvent::Leave => self.cancel(store),
            PointerEvent::Wheel {
                delta, modifiers, ..
            } => Ok(self.viewport.wheel(store, delta, modifiers)),
        }
    }

    /// Abort whatever holds the pointer. Gestures restore their anchored geometry.
    pub fn cancel(&mut self, store: &mut ScreenStore) -> StoreResult<bool> {
        let pan = self.viewport.pointer_leave();
        let drag = self.drag.cancel(store)?;
        let resize = self.resize.cancel(store)?;
        Ok(pan || drag || resize)
    }
}

//! Drag and resize gestures.
//!
//! Both gestures follow the same protocol: a left-button press in edit mode
//! anchors the pointer and the widget's current geometry, every move converts the
//! pointer delta to whole grid units and commits the anchored geometry plus that
//! delta, and release ends the gesture. Cancelling restores the anchored
//! geometry. They differ only in which field they read and write.

use crate::grid::{GridDelta, GridExtent, GridPoint};
use crate::input::MouseButton;
use crate::store::{ScreenStore, StoreError, StoreResult};
use crate::widget::{MIN_SIZE, Widget, WidgetId, WidgetPatch};
use kurbo::{Point, Vec2};
use std::marker::PhantomData;

/// The widget field a gesture edits.
pub trait GestureKind {
    /// Geometry the gesture anchors on and commits.
    type Value: Copy + PartialEq + std::fmt::Debug;

    const NAME: &'static str;

    fn read(widget: &Widget) -> Self::Value;

    /// Anchored value moved by a grid delta, clamped to its valid range.
    fn offset(anchor: Self::Value, delta: GridDelta) -> Self::Value;

    fn patch(value: Self::Value) -> WidgetPatch;
}

/// Moves a widget. Position is clamped at the origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct Drag;

impl GestureKind for Drag {
    type Value = GridPoint;

    const NAME: &'static str = "drag";

    fn read(widget: &Widget) -> GridPoint {
        widget.position
    }

    fn offset(anchor: GridPoint, delta: GridDelta) -> GridPoint {
        anchor.offset(delta)
    }

    fn patch(value: GridPoint) -> WidgetPatch {
        WidgetPatch::new().position(value)
    }
}

/// Resizes a widget from its bottom-right corner. Size never drops below `MIN_SIZE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resize;

impl GestureKind for Resize {
    type Value = GridExtent;

    const NAME: &'static str = "resize";

    fn read(widget: &Widget) -> GridExtent {
        widget.size
    }

    fn offset(anchor: GridExtent, delta: GridDelta) -> GridExtent {
        anchor.resize(delta, MIN_SIZE)
    }

    fn patch(value: GridExtent) -> WidgetPatch {
        WidgetPatch::new().size(value)
    }
}

/// State of an in-progress gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureState<V> {
    /// The widget being manipulated.
    pub widget_id: WidgetId,
    /// Pointer position at the start of the gesture, in screen pixels.
    pub start_point: Point,
    /// Latest pointer position.
    pub current_point: Point,
    /// Widget geometry at the start of the gesture.
    pub original: V,
}

impl<V> GestureState<V> {
    /// Pointer movement since the gesture started.
    pub fn delta(&self) -> Vec2 {
        self.current_point - self.start_point
    }
}

/// Drives one gesture kind through idle → active → idle.
#[derive(Debug, Clone)]
pub struct GestureController<K: GestureKind> {
    state: Option<GestureState<K::Value>>,
    _kind: PhantomData<K>,
}

pub type DragController = GestureController<Drag>;
pub type ResizeController = GestureController<Resize>;

impl<K: GestureKind> Default for GestureController<K> {
    fn default() -> Self {
        Self {
            state: None,
            _kind: PhantomData,
        }
    }
}

impl<K: GestureKind> GestureController<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&GestureState<K::Value>> {
        self.state.as_ref()
    }

    /// Start a gesture on `widget_id`. Returns true if the gesture started.
    ///
    /// Ignored unless the left button is pressed in edit mode with no gesture
    /// already active.
    pub fn begin(
        &mut self,
        store: &ScreenStore,
        widget_id: WidgetId,
        position: Point,
        button: MouseButton,
    ) -> bool {
        if self.state.is_some() || button != MouseButton::Left || !store.mode().is_edit() {
            return false;
        }
        let Some(widget) = store.widget(widget_id) else {
            log::warn!("Cannot {} missing widget {}", K::NAME, widget_id);
            return false;
        };
        self.state = Some(GestureState {
            widget_id,
            start_point: position,
            current_point: position,
            original: K::read(widget),
        });
        log::debug!("Began {} of {}", K::NAME, widget_id);
        true
    }

    /// Pointer moved. Returns the committed value, or `None` if nothing was active.
    ///
    /// If the screen has left edit mode the gesture ends without committing. If
    /// the widget has disappeared the gesture ends with `NotFound`.
    pub fn update(
        &mut self,
        store: &mut ScreenStore,
        position: Point,
    ) -> StoreResult<Option<K::Value>> {
        let Some(state) = self.state.as_mut() else {
            return Ok(None);
        };
        if !store.mode().is_edit() {
            log::debug!("Mode changed during {}; ending", K::NAME);
            self.state = None;
            return Ok(None);
        }
        state.current_point = position;
        let delta = store.transform().screen_delta_to_grid(state.delta());
        let value = K::offset(state.original, delta);
        let widget_id = state.widget_id;

        let unchanged = store
            .widget(widget_id)
            .map(|w| K::read(w) == value)
            .unwrap_or(false);
        if unchanged {
            return Ok(Some(value));
        }
        if let Err(err) = store.update_widget(widget_id, K::patch(value)) {
            self.state = None;
            return Err(err);
        }
        Ok(Some(value))
    }

    /// Pointer released. Returns true if a gesture was active.
    pub fn end(&mut self) -> bool {
        match self.state.take() {
            Some(state) => {
                log::debug!("Ended {} of {}", K::NAME, state.widget_id);
                true
            }
            None => false,
        }
    }

    /// Abort the gesture and restore the widget's anchored geometry.
    pub fn cancel(&mut self, store: &mut ScreenStore) -> StoreResult<bool> {
        let Some(state) = self.state.take() else {
            return Ok(false);
        };
        log::debug!("Cancelled {} of {}", K::NAME, state.widget_id);
        match store.update_widget(state.widget_id, K::patch(state.original)) {
            Ok(()) => Ok(true),
            // Nothing left to restore.
            Err(StoreError::NotFound(_)) => Ok(true),
            Err(err) => Err(err),
        }
    }
}

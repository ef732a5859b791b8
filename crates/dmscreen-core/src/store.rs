//! Authoritative screen state and every mutation on it.
//!
//! The store owns a [`Screen`] and is the only place widgets and configuration
//! are changed. Each mutation validates before touching state, so a failed call
//! leaves the screen exactly as it was. Every successful mutation bumps the
//! revision counter, which persistence observes.

use crate::bounds::{CanvasBounds, calculate_canvas_bounds, canvas_extent};
use crate::grid::{
    DEFAULT_VIEWPORT_WIDTH, DEFAULT_ZOOM, GridDelta, GridExtent, GridTransform, ZOOM_STEP,
    clamp_grid_size, clamp_zoom,
};
use crate::screen::{Mode, Screen, ThemePatch};
use crate::viewport::Viewport;
use crate::widget::{
    Widget, WidgetData, WidgetId, WidgetKind, WidgetPatch, create_default_widget,
};
use kurbo::{Size, Vec2};
use thiserror::Error;

/// Errors from store mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Widget not found: {0}")]
    NotFound(WidgetId),
    #[error("Widget id already in use: {0}")]
    DuplicateId(WidgetId),
    #[error("Widget {id} is a {expected} widget, got {found} data")]
    KindMismatch {
        id: WidgetId,
        expected: WidgetKind,
        found: WidgetKind,
    },
    #[error("A {0} widget cannot be nested inside a container")]
    NotNestable(WidgetKind),
    #[error("Widget {0} is not a container")]
    NotAContainer(WidgetId),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Owns the screen and applies every mutation to it.
#[derive(Debug, Clone)]
pub struct ScreenStore {
    screen: Screen,
    viewport_width: f64,
    revision: u64,
}

impl Default for ScreenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenStore {
    /// Create a store holding an empty default screen.
    pub fn new() -> Self {
        Self::from_screen(Screen::default())
    }

    /// Take ownership of an existing screen, repairing it if needed.
    pub fn from_screen(mut screen: Screen) -> Self {
        if screen.normalize() {
            log::warn!("Loaded screen was out of range and has been repaired");
        }
        Self {
            screen,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            revision: 0,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn into_screen(self) -> Screen {
        self.screen
    }

    /// Replace the whole screen, e.g. after loading from storage.
    pub fn replace_screen(&mut self, mut screen: Screen) {
        screen.normalize();
        self.screen = screen;
        self.touch();
    }

    /// Monotonic counter bumped by every successful mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn mode(&self) -> Mode {
        self.screen.mode
    }

    pub fn widgets(&self) -> &[Widget] {
        &self.screen.widgets
    }

    pub fn widget(&self, id: WidgetId) -> Option<&Widget> {
        self.screen.widget(id)
    }

    fn widget_mut(&mut self, id: WidgetId) -> StoreResult<&mut Widget> {
        self.screen
            .widgets
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    fn index_of(&self, id: WidgetId) -> StoreResult<usize> {
        self.screen
            .widgets
            .iter()
            .position(|w| w.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    /// Top-level widgets in paint order: ascending z-index, insertion order on ties.
    pub fn widgets_by_z(&self) -> Vec<&Widget> {
        let mut widgets: Vec<&Widget> = self.screen.widgets.iter().collect();
        widgets.sort_by_key(|w| w.z_index);
        widgets
    }

    fn max_z_index(&self) -> i32 {
        self.screen
            .widgets
            .iter()
            .map(|w| w.z_index)
            .max()
            .unwrap_or(0)
            .max(0)
    }

    // --- Geometry ---

    /// Pixel width of the host viewport. Not persisted.
    pub fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    pub fn set_viewport_width(&mut self, width: f64) {
        self.viewport_width = if width.is_finite() && width > 0.0 {
            width
        } else {
            DEFAULT_VIEWPORT_WIDTH
        };
    }

    /// Grid transform for the current configuration.
    pub fn transform(&self) -> GridTransform {
        GridTransform::new(self.viewport_width, self.screen.grid_size, self.screen.zoom)
    }

    pub fn canvas_bounds(&self) -> CanvasBounds {
        calculate_canvas_bounds(&self.screen.widgets, self.screen.grid_size)
    }

    /// Canvas size in grid units.
    pub fn canvas_size(&self) -> GridExtent {
        canvas_extent(&self.canvas_bounds(), self.screen.grid_size)
    }

    /// Canvas size in canvas pixels.
    pub fn canvas_pixel_size(&self) -> Size {
        self.transform().extent_to_pixels(self.canvas_size())
    }

    // --- Configuration ---

    /// Set the column count, clamped into range. Returns the stored value.
    pub fn set_grid_size(&mut self, grid_size: i64) -> u32 {
        let clamped = clamp_grid_size(grid_size);
        if clamped as i64 != grid_size {
            log::warn!("Grid size {} clamped to {}", grid_size, clamped);
        }
        if clamped != self.screen.grid_size {
            self.screen.grid_size = clamped;
            self.touch();
        }
        clamped
    }

    /// Change the column count by `delta`, clamped into range.
    pub fn adjust_grid_size(&mut self, delta: i64) -> u32 {
        self.set_grid_size(self.screen.grid_size as i64 + delta)
    }

    /// Set the zoom, clamped into range. Returns the stored value.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        let clamped = clamp_zoom(zoom);
        if clamped != zoom {
            log::warn!("Zoom {} clamped to {}", zoom, clamped);
        }
        if clamped != self.screen.zoom {
            self.screen.zoom = clamped;
            self.touch();
        }
        clamped
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.set_zoom(round_zoom(self.screen.zoom + ZOOM_STEP))
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.set_zoom(round_zoom(self.screen.zoom - ZOOM_STEP))
    }

    pub fn reset_zoom(&mut self) -> f64 {
        self.set_zoom(DEFAULT_ZOOM)
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if self.screen.mode != mode {
            log::debug!("Mode set to {}", mode);
            self.screen.mode = mode;
            self.touch();
        }
    }

    pub fn toggle_mode(&mut self) -> Mode {
        self.set_mode(self.screen.mode.toggled());
        self.screen.mode
    }

    /// Set the pan offset. Negative components clamp to zero.
    pub fn set_viewport(&mut self, x: f64, y: f64) -> Viewport {
        let viewport = Viewport::new(x, y);
        if viewport != self.screen.viewport {
            self.screen.viewport = viewport;
            self.touch();
        }
        viewport
    }

    /// Move the pan offset by `delta`, clamping at the origin.
    pub fn pan_by(&mut self, delta: Vec2) -> Viewport {
        let target = self.screen.viewport.offset() + delta;
        self.set_viewport(target.x, target.y)
    }

    pub fn set_theme(&mut self, patch: ThemePatch) {
        self.screen.theme.merge(patch);
        self.touch();
    }

    // --- Widgets ---

    fn check_insertable(&self, widget: &Widget) -> StoreResult<()> {
        let ids = std::iter::once(widget).chain(widget.nested());
        for candidate in ids {
            if self.contains_id(candidate.id) {
                return Err(StoreError::DuplicateId(candidate.id));
            }
        }
        if let Some(child) = widget.data.unnestable_child() {
            return Err(StoreError::NotNestable(child.kind()));
        }
        Ok(())
    }

    fn contains_id(&self, id: WidgetId) -> bool {
        self.screen
            .widgets
            .iter()
            .any(|w| w.id == id || w.nested().iter().any(|n| n.id == id))
    }

    /// Normalize and append a widget. Returns its id.
    pub fn add_widget(&mut self, mut widget: Widget) -> StoreResult<WidgetId> {
        self.check_insertable(&widget)?;
        widget.normalize();
        let id = widget.id;
        log::debug!("Adding {} widget {}", widget.kind(), id);
        self.screen.widgets.push(widget);
        self.touch();
        Ok(id)
    }

    /// Create a widget of `kind` with default placement and content, and add it.
    pub fn add_default_widget(&mut self, kind: WidgetKind) -> WidgetId {
        let widget = create_default_widget(kind);
        let id = widget.id;
        log::debug!("Adding {} widget {}", kind, id);
        self.screen.widgets.push(widget);
        self.touch();
        id
    }

    /// Merge the present fields of `patch` into a widget.
    pub fn update_widget(&mut self, id: WidgetId, patch: WidgetPatch) -> StoreResult<()> {
        let widget = self.widget(id).ok_or(StoreError::NotFound(id))?;
        check_patch(widget, &patch)?;
        self.widget_mut(id)?.apply(patch);
        self.touch();
        Ok(())
    }

    /// Remove a widget and everything it owns. Returns the removed widget.
    pub fn delete_widget(&mut self, id: WidgetId) -> StoreResult<Widget> {
        let index = self.index_of(id)?;
        let removed = self.screen.widgets.remove(index);
        log::debug!("Deleted {} widget {}", removed.kind(), id);
        self.touch();
        Ok(removed)
    }

    /// Deep-copy a widget with fresh ids, offset by (+2, +2) and raised above
    /// every other widget. Returns the new id.
    pub fn clone_widget(&mut self, id: WidgetId) -> StoreResult<WidgetId> {
        let source = self.widget(id).ok_or(StoreError::NotFound(id))?;
        let mut copy = source.duplicate();
        copy.position = copy.position.offset(GridDelta::new(2, 2));
        copy.z_index = self.max_z_index().saturating_add(1);
        let new_id = copy.id;
        log::debug!("Cloned widget {} as {}", id, new_id);
        self.screen.widgets.push(copy);
        self.touch();
        Ok(new_id)
    }

    /// Raise a widget above every other widget. Returns its new z-index.
    pub fn bring_to_front(&mut self, id: WidgetId) -> StoreResult<i32> {
        let widget = self.widget(id).ok_or(StoreError::NotFound(id))?;
        let current = widget.z_index;
        let covered = self
            .screen
            .widgets
            .iter()
            .any(|w| w.id != id && w.z_index >= current);
        if !covered {
            return Ok(current);
        }
        let z_index = self.max_z_index().saturating_add(1);
        self.widget_mut(id)?.z_index = z_index;
        self.touch();
        Ok(z_index)
    }

    /// Run a content operation on a widget's data.
    ///
    /// The closure works on a copy; the result is committed only if it still has
    /// the widget's kind, and it is normalized before being stored.
    pub fn edit_data<R>(
        &mut self,
        id: WidgetId,
        edit: impl FnOnce(&mut WidgetData) -> R,
    ) -> StoreResult<R> {
        let widget = self.widget(id).ok_or(StoreError::NotFound(id))?;
        let (data, result) = edited_data(widget, edit)?;
        self.widget_mut(id)?.data = data;
        self.touch();
        Ok(result)
    }

    // --- Nested widgets ---

    fn container(&self, parent: WidgetId) -> StoreResult<&Widget> {
        let widget = self.widget(parent).ok_or(StoreError::NotFound(parent))?;
        if widget.kind().is_container() {
            Ok(widget)
        } else {
            Err(StoreError::NotAContainer(parent))
        }
    }

    fn nested_list_mut(&mut self, parent: WidgetId) -> StoreResult<&mut Vec<Widget>> {
        self.widget_mut(parent)?
            .character_mut()
            .map(|character| &mut character.widgets)
            .ok_or(StoreError::NotAContainer(parent))
    }

    /// Add a default widget of `kind` inside a container, placed one unit in from
    /// the parent and one layer above it. Returns the new id.
    pub fn add_nested(&mut self, parent: WidgetId, kind: WidgetKind) -> StoreResult<WidgetId> {
        let container = self.container(parent)?;
        if !kind.can_nest() {
            return Err(StoreError::NotNestable(kind));
        }
        let mut widget = create_default_widget(kind);
        widget.position = container.position.offset(GridDelta::new(1, 1));
        widget.z_index = container.z_index.saturating_add(1);
        let id = widget.id;
        self.nested_list_mut(parent)?.push(widget);
        log::debug!("Added nested {} widget {} to {}", kind, id, parent);
        self.touch();
        Ok(id)
    }

    /// Merge a patch into a nested widget.
    pub fn update_nested(
        &mut self,
        parent: WidgetId,
        child: WidgetId,
        patch: WidgetPatch,
    ) -> StoreResult<()> {
        let container = self.container(parent)?;
        let widget = container
            .nested()
            .iter()
            .find(|w| w.id == child)
            .ok_or(StoreError::NotFound(child))?;
        check_patch(widget, &patch)?;
        let nested = self
            .nested_list_mut(parent)?
            .iter_mut()
            .find(|w| w.id == child)
            .ok_or(StoreError::NotFound(child))?;
        nested.apply(patch);
        self.touch();
        Ok(())
    }

    /// Remove a nested widget. Returns the removed widget.
    pub fn delete_nested(&mut self, parent: WidgetId, child: WidgetId) -> StoreResult<Widget> {
        let list = self.nested_list_mut(parent)?;
        let index = list
            .iter()
            .position(|w| w.id == child)
            .ok_or(StoreError::NotFound(child))?;
        let removed = list.remove(index);
        log::debug!("Deleted nested widget {} from {}", child, parent);
        self.touch();
        Ok(removed)
    }

    /// Run a content operation on a nested widget's data. See [`Self::edit_data`].
    pub fn edit_nested_data<R>(
        &mut self,
        parent: WidgetId,
        child: WidgetId,
        edit: impl FnOnce(&mut WidgetData) -> R,
    ) -> StoreResult<R> {
        let container = self.container(parent)?;
        let widget = container
            .nested()
            .iter()
            .find(|w| w.id == child)
            .ok_or(StoreError::NotFound(child))?;
        let (data, result) = edited_data(widget, edit)?;
        let nested = self
            .nested_list_mut(parent)?
            .iter_mut()
            .find(|w| w.id == child)
            .ok_or(StoreError::NotFound(child))?;
        nested.data = data;
        self.touch();
        Ok(result)
    }
}

fn round_zoom(zoom: f64) -> f64 {
    (zoom * 100.0).round() / 100.0
}

fn check_data(widget: &Widget, data: &WidgetData) -> StoreResult<()> {
    if data.kind() != widget.kind() {
        log::warn!(
            "Rejected {} data for {} widget {}",
            data.kind(),
            widget.kind(),
            widget.id
        );
        return Err(StoreError::KindMismatch {
            id: widget.id,
            expected: widget.kind(),
            found: data.kind(),
        });
    }
    if let Some(child) = data.unnestable_child() {
        log::warn!("Rejected nested {} widget in {}", child.kind(), widget.id);
        return Err(StoreError::NotNestable(child.kind()));
    }
    Ok(())
}

fn check_patch(widget: &Widget, patch: &WidgetPatch) -> StoreResult<()> {
    match &patch.data {
        Some(data) => check_data(widget, data),
        None => Ok(()),
    }
}

fn edited_data<R>(
    widget: &Widget,
    edit: impl FnOnce(&mut WidgetData) -> R,
) -> StoreResult<(WidgetData, R)> {
    let mut data = widget.data.clone();
    let result = edit(&mut data);
    check_data(widget, &data)?;
    data.normalize();
    Ok((data, result))
}

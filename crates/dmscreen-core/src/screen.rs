//! The persisted screen document.

use crate::grid::{DEFAULT_GRID_SIZE, DEFAULT_ZOOM, clamp_grid_size, clamp_zoom};
use crate::viewport::Viewport;
use crate::widget::{HexColor, Widget, WidgetId, new_widget_id};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Interaction mode. Layout can only be changed in edit mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Normal,
    #[default]
    Edit,
}

impl Mode {
    pub fn is_edit(&self) -> bool {
        matches!(self, Mode::Edit)
    }

    pub fn toggled(self) -> Self {
        match self {
            Mode::Normal => Mode::Edit,
            Mode::Edit => Mode::Normal,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Normal => f.write_str("normal"),
            Mode::Edit => f.write_str("edit"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Mode::Normal),
            "edit" => Ok(Mode::Edit),
            other => Err(format!("Unknown mode: {}", other)),
        }
    }
}

/// Screen-wide colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub background_color: HexColor,
    pub panel_color: HexColor,
    pub text_color: HexColor,
    pub accent_color: HexColor,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background_color: HexColor::rgb(0x1e, 0x1e, 0x1e),
            panel_color: HexColor::rgb(0x2d, 0x2d, 0x2d),
            text_color: HexColor::rgb(0xe5, 0xe7, 0xeb),
            accent_color: HexColor::rgb(0x4a, 0x9e, 0xff),
        }
    }
}

impl Theme {
    /// Merge the present fields of `patch` into this theme.
    pub fn merge(&mut self, patch: ThemePatch) {
        if let Some(color) = patch.background_color {
            self.background_color = color;
        }
        if let Some(color) = patch.panel_color {
            self.panel_color = color;
        }
        if let Some(color) = patch.text_color {
            self.text_color = color;
        }
        if let Some(color) = patch.accent_color {
            self.accent_color = color;
        }
    }
}

/// Partial theme update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<HexColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panel_color: Option<HexColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<HexColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<HexColor>,
}

fn default_grid_size() -> u32 {
    DEFAULT_GRID_SIZE
}

fn default_zoom() -> f64 {
    DEFAULT_ZOOM
}

/// A complete screen: grid configuration, view state, widgets and theme.
///
/// Fields are public for reading. Mutations should go through
/// [`ScreenStore`](crate::ScreenStore), which keeps them in range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screen {
    #[serde(default = "default_grid_size")]
    pub grid_size: u32,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub widgets: Vec<Widget>,
    #[serde(default)]
    pub theme: Theme,
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            zoom: DEFAULT_ZOOM,
            mode: Mode::default(),
            viewport: Viewport::default(),
            widgets: Vec::new(),
            theme: Theme::default(),
        }
    }
}

impl Screen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize the screen to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a screen from JSON and bring it back inside its invariants.
    ///
    /// Accepts a bare screen or one wrapped as `{"state": {..}, "version": n}`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut value: serde_json::Value = serde_json::from_str(json)?;
        if value.get("state").is_some_and(serde_json::Value::is_object) {
            value = value["state"].take();
        }
        let mut screen: Screen = serde_json::from_value(value)?;
        screen.normalize();
        Ok(screen)
    }

    pub fn widget(&self, id: WidgetId) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id == id)
    }

    /// Clamp configuration and repair every widget.
    ///
    /// Nested widgets of kinds that cannot be nested are dropped, and widgets
    /// whose id was already used elsewhere in the screen get a fresh one.
    /// Returns true if anything had to be changed.
    pub fn normalize(&mut self) -> bool {
        let mut changed = false;

        let grid_size = clamp_grid_size(self.grid_size as i64);
        changed |= grid_size != self.grid_size;
        self.grid_size = grid_size;

        let zoom = clamp_zoom(self.zoom);
        changed |= zoom != self.zoom;
        self.zoom = zoom;

        let viewport = Viewport::new(self.viewport.x, self.viewport.y);
        changed |= viewport != self.viewport;
        self.viewport = viewport;

        let mut seen = HashSet::new();
        for widget in &mut self.widgets {
            changed |= ensure_unique_id(widget, &mut seen);
            if let Some(character) = widget.character_mut() {
                let before = character.widgets.len();
                character.widgets.retain(|nested| {
                    let keep = nested.kind().can_nest();
                    if !keep {
                        log::warn!("Dropping nested {} widget {}", nested.kind(), nested.id);
                    }
                    keep
                });
                changed |= character.widgets.len() != before;
                for nested in &mut character.widgets {
                    changed |= ensure_unique_id(nested, &mut seen);
                }
            }
            changed |= widget.normalize();
        }

        changed
    }
}

fn ensure_unique_id(widget: &mut Widget, seen: &mut HashSet<WidgetId>) -> bool {
    if seen.insert(widget.id) {
        return false;
    }
    let id = new_widget_id();
    log::warn!("Duplicate widget id {}; reassigned to {}", widget.id, id);
    widget.id = id;
    seen.insert(id);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridExtent, MAX_GRID_SIZE};
    use crate::widget::{WidgetData, WidgetKind, create_default_widget};

    #[test]
    fn test_defaults() {
        let screen = Screen::new();
        assert_eq!(screen.grid_size, 30);
        assert!((screen.zoom - 1.0).abs() < 1e-9);
        assert_eq!(screen.mode, Mode::Edit);
        assert_eq!(screen.theme.background_color.to_string(), "#1e1e1e");
    }

    #[test]
    fn test_json_has_no_canvas_size() {
        let screen = Screen::new();
        let json = screen.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("canvasSize").is_none());
        assert_eq!(value["gridSize"], 30);
        assert_eq!(value["mode"], "edit");
        assert_eq!(value["theme"]["accentColor"], "#4a9eff");
    }

    #[test]
    fn test_roundtrip_with_widgets() {
        let mut screen = Screen::new();
        screen.widgets.push(create_default_widget(WidgetKind::Pages));
        screen.widgets.push(create_default_widget(WidgetKind::Character));
        let back = Screen::from_json(&screen.to_json().unwrap()).unwrap();
        assert_eq!(back, screen);
    }

    #[test]
    fn test_from_json_normalizes() {
        let json = r#"{
            "gridSize": 400,
            "zoom": 0.1,
            "mode": "normal",
            "viewport": {"x": -10, "y": 3},
            "widgets": [{
                "id": "00000000-0000-0000-0000-000000000001",
                "position": {"x": 1, "y": 1},
                "size": {"width": 1, "height": 9},
                "zIndex": 2,
                "type": "fraction",
                "data": {"title": "HP", "current": 50, "max": 10}
            }]
        }"#;
        let screen = Screen::from_json(json).unwrap();
        assert_eq!(screen.grid_size, MAX_GRID_SIZE);
        assert!((screen.zoom - 0.5).abs() < 1e-9);
        assert_eq!(screen.mode, Mode::Normal);
        assert!(screen.viewport.x.abs() < 1e-9);
        assert_eq!(screen.widgets[0].size, GridExtent::new(2, 9));
        let WidgetData::Fraction(fraction) = &screen.widgets[0].data else {
            panic!("expected fraction");
        };
        assert_eq!(fraction.current, 10);
    }

    #[test]
    fn test_from_json_reads_wrapped_legacy_document() {
        let json = r#"{
            "state": {
                "gridSize": 24,
                "zoom": 1,
                "mode": "edit",
                "viewport": {"x": 0, "y": 0},
                "canvasSize": {"width": 24, "height": 24},
                "widgets": [{
                    "id": "widget-1700000000000-1",
                    "type": "todos",
                    "position": {"x": 2, "y": 3},
                    "size": {"width": 6, "height": 5},
                    "zIndex": 1,
                    "data": {"items": [
                        {"id": "todo-1700000000001-0.42", "text": "Loot", "completed": true}
                    ]}
                }]
            },
            "version": 0
        }"#;
        let screen = Screen::from_json(json).unwrap();
        assert_eq!(screen.grid_size, 24);
        let widget = &screen.widgets[0];
        assert_eq!(widget.kind(), WidgetKind::Todos);
        assert_eq!(
            widget.id,
            WidgetId::new_v5(&WidgetId::NAMESPACE_OID, b"widget-1700000000000-1")
        );
        let WidgetData::Todos(todos) = &widget.data else {
            panic!("expected todos");
        };
        assert!(todos.items[0].completed);

        let again = Screen::from_json(json).unwrap();
        assert_eq!(again.widgets[0].id, widget.id);
        assert_eq!(Screen::from_json(&screen.to_json().unwrap()).unwrap(), screen);
    }

    #[test]
    fn test_from_json_drops_nested_containers() {
        let mut parent = create_default_widget(WidgetKind::Character);
        let inner = create_default_widget(WidgetKind::Character);
        let note = create_default_widget(WidgetKind::Notepad);
        if let WidgetData::Character(data) = &mut parent.data {
            data.widgets.push(inner);
            data.widgets.push(note.clone());
        }
        let mut screen = Screen::new();
        screen.widgets.push(parent);

        let loaded = Screen::from_json(&screen.to_json().unwrap()).unwrap();
        let nested = loaded.widgets[0].nested();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].id, note.id);
    }

    #[test]
    fn test_from_json_reassigns_duplicate_ids() {
        let first = create_default_widget(WidgetKind::Text);
        let mut second = create_default_widget(WidgetKind::Countdown);
        second.id = first.id;
        let mut parent = create_default_widget(WidgetKind::Character);
        let mut nested = create_default_widget(WidgetKind::Notepad);
        nested.id = first.id;
        if let WidgetData::Character(data) = &mut parent.data {
            data.widgets.push(nested);
        }
        let mut screen = Screen::new();
        screen.widgets = vec![first.clone(), second, parent];

        let loaded = Screen::from_json(&screen.to_json().unwrap()).unwrap();
        let mut ids: Vec<WidgetId> = loaded.widgets.iter().map(|w| w.id).collect();
        ids.push(loaded.widgets[2].nested()[0].id);
        assert_eq!(loaded.widgets[0].id, first.id);
        assert_eq!(loaded.widgets[1].kind(), WidgetKind::Countdown);
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 4);

        let mut clean = loaded.clone();
        assert!(!clean.normalize());
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("Edit".parse::<Mode>().unwrap(), Mode::Edit);
        assert_eq!(Mode::Normal.toggled(), Mode::Edit);
        assert!("view".parse::<Mode>().is_err());
    }

    #[test]
    fn test_theme_merge() {
        let mut theme = Theme::default();
        theme.merge(ThemePatch {
            accent_color: Some(HexColor::rgb(255, 0, 0)),
            ..ThemePatch::default()
        });
        assert_eq!(theme.accent_color, HexColor::rgb(255, 0, 0));
        assert_eq!(theme.panel_color, Theme::default().panel_color);
    }
}

//! Widget definitions for the screen.

mod data;
mod factory;
mod style;

pub use data::{
    CharacterData, CountdownData, FractionData, ImageData, MAX_TOGGLES, MIN_TOGGLES, NotepadData,
    Page, PagesData, TextData, TodoItem, TodosData, ToggleStyle, TogglesData, WidgetData,
};
pub use factory::{DEFAULT_POSITION, create_default_widget, default_data, default_size};
pub use style::{HexColor, ParseColorError, WidgetStyle};

use crate::grid::{GridExtent, GridPoint};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for widgets, todo items and pages.
pub type WidgetId = Uuid;

/// Smallest width and height a widget may have, in grid units.
pub const MIN_SIZE: u32 = 2;

pub(crate) fn new_widget_id() -> WidgetId {
    Uuid::new_v4()
}

/// Read an id, accepting free-form strings as well as UUIDs.
///
/// Older screens used ids like `widget-1700000000000-3`. Those map to a
/// name-based UUID, so the same string always yields the same id.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<WidgetId, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(Uuid::parse_str(&raw).unwrap_or_else(|_| Uuid::new_v5(&Uuid::NAMESPACE_OID, raw.as_bytes())))
}

/// The fixed catalog of widget types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Text,
    Notepad,
    Image,
    Countdown,
    Fraction,
    Toggles,
    Todos,
    Pages,
    Character,
}

impl WidgetKind {
    pub const ALL: [WidgetKind; 9] = [
        WidgetKind::Text,
        WidgetKind::Notepad,
        WidgetKind::Image,
        WidgetKind::Countdown,
        WidgetKind::Fraction,
        WidgetKind::Toggles,
        WidgetKind::Todos,
        WidgetKind::Pages,
        WidgetKind::Character,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetKind::Text => "text",
            WidgetKind::Notepad => "notepad",
            WidgetKind::Image => "image",
            WidgetKind::Countdown => "countdown",
            WidgetKind::Fraction => "fraction",
            WidgetKind::Toggles => "toggles",
            WidgetKind::Todos => "todos",
            WidgetKind::Pages => "pages",
            WidgetKind::Character => "character",
        }
    }

    /// Whether widgets of this kind may live inside a character container.
    pub fn can_nest(&self) -> bool {
        matches!(
            self,
            WidgetKind::Text
                | WidgetKind::Notepad
                | WidgetKind::Countdown
                | WidgetKind::Fraction
                | WidgetKind::Toggles
                | WidgetKind::Todos
        )
    }

    /// Whether widgets of this kind own nested widgets.
    pub fn is_container(&self) -> bool {
        matches!(self, WidgetKind::Character)
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown widget kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown widget kind: {0}")]
pub struct ParseWidgetKindError(pub String);

impl FromStr for WidgetKind {
    type Err = ParseWidgetKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        WidgetKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ParseWidgetKindError(s.to_string()))
    }
}

/// A widget placed on the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: WidgetId,
    pub position: GridPoint,
    pub size: GridExtent,
    #[serde(default)]
    pub style: WidgetStyle,
    #[serde(default)]
    pub z_index: i32,
    /// Serialized as sibling `type` and `data` fields.
    #[serde(flatten)]
    pub data: WidgetData,
}

impl Widget {
    /// Create a widget with a fresh id.
    pub fn new(position: GridPoint, size: GridExtent, data: WidgetData) -> Self {
        Self {
            id: new_widget_id(),
            position,
            size: size.at_least(MIN_SIZE),
            style: WidgetStyle::default(),
            z_index: 1,
            data,
        }
    }

    pub fn kind(&self) -> WidgetKind {
        self.data.kind()
    }

    /// Bring size and data back inside their invariants.
    ///
    /// Returns true if anything had to be changed.
    pub fn normalize(&mut self) -> bool {
        let size = self.size.at_least(MIN_SIZE);
        let mut changed = size != self.size;
        self.size = size;
        changed |= self.data.normalize();
        changed
    }

    /// Deep copy with a fresh id for this widget and everything it owns.
    pub fn duplicate(&self) -> Widget {
        Widget {
            id: new_widget_id(),
            position: self.position,
            size: self.size,
            style: self.style.clone(),
            z_index: self.z_index,
            data: self.data.duplicate(),
        }
    }

    /// Nested widgets, if this is a container.
    pub fn nested(&self) -> &[Widget] {
        self.data.nested().unwrap_or(&[])
    }

    pub(crate) fn character_mut(&mut self) -> Option<&mut CharacterData> {
        match &mut self.data {
            WidgetData::Character(data) => Some(data),
            _ => None,
        }
    }

    /// Apply the present fields of a patch. The caller checks the data kind.
    pub(crate) fn apply(&mut self, patch: WidgetPatch) {
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(size) = patch.size {
            self.size = size;
        }
        if let Some(style) = patch.style {
            self.style = style;
        }
        if let Some(z_index) = patch.z_index {
            self.z_index = z_index;
        }
        if let Some(data) = patch.data {
            self.data = data;
        }
        self.normalize();
    }
}

/// Partial update of a widget. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetPatch {
    pub position: Option<GridPoint>,
    pub size: Option<GridExtent>,
    pub style: Option<WidgetStyle>,
    pub z_index: Option<i32>,
    pub data: Option<WidgetData>,
}

impl WidgetPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(mut self, position: GridPoint) -> Self {
        self.position = Some(position);
        self
    }

    pub fn size(mut self, size: GridExtent) -> Self {
        self.size = Some(size);
        self
    }

    pub fn style(mut self, style: WidgetStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn z_index(mut self, z_index: i32) -> Self {
        self.z_index = Some(z_index);
        self
    }

    pub fn data(mut self, data: WidgetData) -> Self {
        self.data = Some(data);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_none()
            && self.size.is_none()
            && self.style.is_none()
            && self.z_index.is_none()
            && self.data.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_and_display() {
        for kind in WidgetKind::ALL {
            assert_eq!(kind.to_string().parse::<WidgetKind>().unwrap(), kind);
        }
        assert_eq!("Countdown".parse::<WidgetKind>().unwrap(), WidgetKind::Countdown);
        assert!("spaceship".parse::<WidgetKind>().is_err());
    }

    #[test]
    fn test_nesting_rules() {
        assert!(WidgetKind::Todos.can_nest());
        assert!(!WidgetKind::Image.can_nest());
        assert!(!WidgetKind::Pages.can_nest());
        assert!(!WidgetKind::Character.can_nest());
    }

    #[test]
    fn test_normalize_enforces_min_size() {
        let mut widget = create_default_widget(WidgetKind::Text);
        widget.size = GridExtent::new(0, 1);
        assert!(widget.normalize());
        assert_eq!(widget.size, GridExtent::new(MIN_SIZE, MIN_SIZE));
        assert!(!widget.normalize());
    }

    #[test]
    fn test_duplicate_renews_all_ids() {
        let mut parent = create_default_widget(WidgetKind::Character);
        let child = create_default_widget(WidgetKind::Todos);
        parent
            .character_mut()
            .unwrap()
            .widgets
            .push(child.clone());

        let copy = parent.duplicate();
        assert_ne!(copy.id, parent.id);
        assert_eq!(copy.nested().len(), 1);

        let copied_child = &copy.nested()[0];
        assert_ne!(copied_child.id, child.id);
        let (WidgetData::Todos(original), WidgetData::Todos(copied)) =
            (&child.data, &copied_child.data)
        else {
            panic!("expected todos");
        };
        assert_eq!(original.items.len(), copied.items.len());
        for (a, b) in original.items.iter().zip(&copied.items) {
            assert_ne!(a.id, b.id);
            assert_eq!(a.text, b.text);
        }
    }

    #[test]
    fn test_widget_json_shape() {
        let widget = create_default_widget(WidgetKind::Fraction);
        let json = serde_json::to_value(&widget).unwrap();
        assert_eq!(json["zIndex"], 1);
        assert_eq!(json["type"], "fraction");
        assert_eq!(json["data"]["max"], 10);
        assert_eq!(json["position"]["x"], 5);
        assert_eq!(json["style"]["borderColor"], "#4a9eff");

        let back: Widget = serde_json::from_value(json).unwrap();
        assert_eq!(back, widget);
    }

    #[test]
    fn test_patch_applies_present_fields_only() {
        let mut widget = create_default_widget(WidgetKind::Notepad);
        let style = widget.style.clone();
        widget.apply(WidgetPatch::new().position(GridPoint::new(9, 1)).z_index(4));
        assert_eq!(widget.position, GridPoint::new(9, 1));
        assert_eq!(widget.z_index, 4);
        assert_eq!(widget.style, style);
        assert!(WidgetPatch::new().is_empty());
    }
}

//! Default widgets for each kind.

use super::{
    CharacterData, CountdownData, FractionData, ImageData, NotepadData, PagesData, TextData,
    TodoItem, TodosData, TogglesData, Widget, WidgetData, WidgetKind,
};
use crate::grid::{GridExtent, GridPoint};

/// Where new top-level widgets are placed.
pub const DEFAULT_POSITION: GridPoint = GridPoint { x: 5, y: 5 };

/// Initial size for a new widget of `kind`.
pub fn default_size(kind: WidgetKind) -> GridExtent {
    match kind {
        WidgetKind::Image | WidgetKind::Pages => GridExtent::new(8, 6),
        WidgetKind::Countdown | WidgetKind::Fraction => GridExtent::new(4, 3),
        WidgetKind::Todos => GridExtent::new(6, 5),
        WidgetKind::Character => GridExtent::new(10, 8),
        WidgetKind::Text | WidgetKind::Notepad | WidgetKind::Toggles => GridExtent::new(6, 4),
    }
}

/// Initial content for a new widget of `kind`.
pub fn default_data(kind: WidgetKind) -> WidgetData {
    match kind {
        WidgetKind::Text => WidgetData::Text(TextData {
            content: "# Text Widget\n\nAdd your markdown content here.".to_string(),
        }),
        WidgetKind::Notepad => WidgetData::Notepad(NotepadData::default()),
        WidgetKind::Image => WidgetData::Image(ImageData {
            url: String::new(),
            scale: Some(1.0),
        }),
        WidgetKind::Countdown => WidgetData::Countdown(CountdownData {
            title: "Countdown".to_string(),
            value: 0,
            min: Some(0),
            max: None,
        }),
        WidgetKind::Fraction => WidgetData::Fraction(FractionData {
            title: "HP".to_string(),
            current: 10,
            max: 10,
        }),
        WidgetKind::Toggles => WidgetData::Toggles(TogglesData::default()),
        WidgetKind::Todos => WidgetData::Todos(TodosData {
            items: vec![TodoItem::new("Task 1"), TodoItem::new("Task 2")],
        }),
        WidgetKind::Pages => WidgetData::Pages(PagesData::default()),
        WidgetKind::Character => WidgetData::Character(CharacterData::default()),
    }
}

/// Create a widget of `kind` with a fresh id, default placement and default content.
pub fn create_default_widget(kind: WidgetKind) -> Widget {
    Widget::new(DEFAULT_POSITION, default_size(kind), default_data(kind))
}

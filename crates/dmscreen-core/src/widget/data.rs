//! Per-type widget payloads and their content operations.
//!
//! Each variant carries its own invariants. `normalize` brings a payload back
//! inside them and is applied by the store on every mutation, so callers may
//! hand in out-of-range values and get a valid state back.

use super::{Widget, WidgetId, WidgetKind, deserialize_id, new_widget_id};
use super::style::HexColor;
use serde::{Deserialize, Serialize};

/// Fewest toggles a toggles widget may show.
pub const MIN_TOGGLES: u32 = 1;
/// Most toggles a toggles widget may show.
pub const MAX_TOGGLES: u32 = 50;

/// Type-specific content of a widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum WidgetData {
    Text(TextData),
    Notepad(NotepadData),
    Image(ImageData),
    Countdown(CountdownData),
    Fraction(FractionData),
    Toggles(TogglesData),
    Todos(TodosData),
    Pages(PagesData),
    Character(CharacterData),
}

impl WidgetData {
    /// The widget type this payload belongs to.
    pub fn kind(&self) -> WidgetKind {
        match self {
            WidgetData::Text(_) => WidgetKind::Text,
            WidgetData::Notepad(_) => WidgetKind::Notepad,
            WidgetData::Image(_) => WidgetKind::Image,
            WidgetData::Countdown(_) => WidgetKind::Countdown,
            WidgetData::Fraction(_) => WidgetKind::Fraction,
            WidgetData::Toggles(_) => WidgetKind::Toggles,
            WidgetData::Todos(_) => WidgetKind::Todos,
            WidgetData::Pages(_) => WidgetKind::Pages,
            WidgetData::Character(_) => WidgetKind::Character,
        }
    }

    /// Bring the payload back inside its invariants.
    ///
    /// Returns true if anything had to be changed.
    pub fn normalize(&mut self) -> bool {
        match self {
            WidgetData::Text(_) | WidgetData::Notepad(_) | WidgetData::Todos(_) => false,
            WidgetData::Image(d) => d.normalize(),
            WidgetData::Countdown(d) => d.normalize(),
            WidgetData::Fraction(d) => d.normalize(),
            WidgetData::Toggles(d) => d.normalize(),
            WidgetData::Pages(d) => d.normalize(),
            WidgetData::Character(d) => d.normalize(),
        }
    }

    /// Structural copy. Nested widgets, todo items and pages receive fresh ids.
    pub fn duplicate(&self) -> WidgetData {
        match self {
            WidgetData::Text(d) => WidgetData::Text(d.clone()),
            WidgetData::Notepad(d) => WidgetData::Notepad(d.clone()),
            WidgetData::Image(d) => WidgetData::Image(d.clone()),
            WidgetData::Countdown(d) => WidgetData::Countdown(d.clone()),
            WidgetData::Fraction(d) => WidgetData::Fraction(d.clone()),
            WidgetData::Toggles(d) => WidgetData::Toggles(d.clone()),
            WidgetData::Todos(d) => WidgetData::Todos(TodosData {
                items: d
                    .items
                    .iter()
                    .map(|item| TodoItem {
                        id: new_widget_id(),
                        ..item.clone()
                    })
                    .collect(),
            }),
            WidgetData::Pages(d) => WidgetData::Pages(PagesData {
                pages: d
                    .pages
                    .iter()
                    .map(|page| Page {
                        id: new_widget_id(),
                        ..page.clone()
                    })
                    .collect(),
                current_page: d.current_page,
            }),
            WidgetData::Character(d) => WidgetData::Character(CharacterData {
                name: d.name.clone(),
                icon_color: d.icon_color,
                icon_number: d.icon_number,
                widgets: d.widgets.iter().map(Widget::duplicate).collect(),
                collapsed: d.collapsed,
            }),
        }
    }

    /// Nested widgets, if this payload is a container.
    pub fn nested(&self) -> Option<&[Widget]> {
        match self {
            WidgetData::Character(d) => Some(&d.widgets),
            _ => None,
        }
    }

    /// First nested widget whose kind may not live inside a container.
    pub fn unnestable_child(&self) -> Option<&Widget> {
        self.nested()?.iter().find(|w| !w.kind().can_nest())
    }
}

/// Markdown text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextData {
    pub content: String,
}

/// Plain text notes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NotepadData {
    pub content: String,
}

/// Image shown from a URL.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageData {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

impl ImageData {
    pub fn set_scale(&mut self, scale: f64) {
        self.scale = Some(scale);
        self.normalize();
    }

    fn normalize(&mut self) -> bool {
        match self.scale {
            Some(scale) if !scale.is_finite() || scale <= 0.0 => {
                self.scale = Some(1.0);
                true
            }
            _ => false,
        }
    }
}

/// A counter with optional bounds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CountdownData {
    pub title: String,
    pub value: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
}

impl CountdownData {
    pub fn increment(&mut self) {
        self.set_value(self.value.saturating_add(1));
    }

    pub fn decrement(&mut self) {
        self.set_value(self.value.saturating_sub(1));
    }

    /// Set the value, clamped to whichever bounds are present.
    pub fn set_value(&mut self, value: i64) {
        self.value = value;
        self.normalize();
    }

    /// Replace both bounds and re-clamp the value.
    pub fn set_bounds(&mut self, min: Option<i64>, max: Option<i64>) {
        self.min = min;
        self.max = max;
        self.normalize();
    }

    fn normalize(&mut self) -> bool {
        let mut changed = false;
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                self.min = Some(max);
                self.max = Some(min);
                changed = true;
            }
        }
        let mut value = self.value;
        if let Some(min) = self.min {
            value = value.max(min);
        }
        if let Some(max) = self.max {
            value = value.min(max);
        }
        changed |= value != self.value;
        self.value = value;
        changed
    }
}

/// A current/max tracker such as hit points.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FractionData {
    pub title: String,
    pub current: u32,
    pub max: u32,
}

impl FractionData {
    pub fn increment(&mut self) {
        self.set_current(self.current as i64 + 1);
    }

    pub fn decrement(&mut self) {
        self.set_current(self.current as i64 - 1);
    }

    /// Set the current value, clamped to `[0, max]`.
    pub fn set_current(&mut self, current: i64) {
        self.current = current.clamp(0, self.max as i64) as u32;
    }

    /// Set the maximum; the current value follows it down if needed.
    pub fn set_max(&mut self, max: u32) {
        self.max = max;
        self.normalize();
    }

    fn normalize(&mut self) -> bool {
        if self.current > self.max {
            self.current = self.max;
            true
        } else {
            false
        }
    }
}

/// Visual style of a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleStyle {
    #[default]
    Circle,
    #[serde(rename = "box")]
    Square,
}

/// A row of on/off toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TogglesData {
    pub count: u32,
    pub toggles: Vec<bool>,
    #[serde(default)]
    pub style: ToggleStyle,
}

impl Default for TogglesData {
    fn default() -> Self {
        Self::with_count(5)
    }
}

impl TogglesData {
    pub fn with_count(count: u32) -> Self {
        let mut data = Self {
            count,
            toggles: Vec::new(),
            style: ToggleStyle::default(),
        };
        data.normalize();
        data
    }

    /// Flip one toggle. Out-of-range indices are ignored.
    pub fn toggle(&mut self, index: usize) -> bool {
        match self.toggles.get_mut(index) {
            Some(value) => {
                *value = !*value;
                true
            }
            None => false,
        }
    }

    /// Change the number of toggles, keeping the states of those that remain.
    pub fn set_count(&mut self, count: u32) {
        self.count = count;
        self.normalize();
    }

    pub fn set_style(&mut self, style: ToggleStyle) {
        self.style = style;
    }

    fn normalize(&mut self) -> bool {
        let count = self.count.clamp(MIN_TOGGLES, MAX_TOGGLES);
        let changed = count != self.count || self.toggles.len() != count as usize;
        self.count = count;
        self.toggles.resize(count as usize, false);
        changed
    }
}

/// One checklist entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: WidgetId,
    pub text: String,
    pub completed: bool,
}

impl TodoItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: new_widget_id(),
            text: text.into(),
            completed: false,
        }
    }
}

/// A checklist.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TodosData {
    pub items: Vec<TodoItem>,
}

impl TodosData {
    /// Append an item and return its id.
    pub fn add_item(&mut self, text: impl Into<String>) -> WidgetId {
        let item = TodoItem::new(text);
        let id = item.id;
        self.items.push(item);
        id
    }

    pub fn toggle_item(&mut self, id: WidgetId) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.completed = !item.completed;
                true
            }
            None => false,
        }
    }

    pub fn edit_item(&mut self, id: WidgetId, text: impl Into<String>) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.text = text.into();
                true
            }
            None => false,
        }
    }

    pub fn remove_item(&mut self, id: WidgetId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }
}

/// One page of a paginated widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: WidgetId,
    pub content: String,
}

impl Page {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: new_widget_id(),
            content: content.into(),
        }
    }

    /// Default content for the page at `number` (1-based).
    pub fn numbered(number: usize) -> Self {
        Self::new(format!("# Page {}\n\nContent goes here.", number))
    }
}

/// Paginated markdown content. Always holds at least one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagesData {
    pub pages: Vec<Page>,
    pub current_page: usize,
}

impl Default for PagesData {
    fn default() -> Self {
        Self {
            pages: vec![Page::numbered(1)],
            current_page: 0,
        }
    }
}

impl PagesData {
    pub fn current(&self) -> Option<&Page> {
        self.pages.get(self.current_page)
    }

    /// Append a page and make it current. Returns its id.
    pub fn add_page(&mut self) -> WidgetId {
        let page = Page::numbered(self.pages.len() + 1);
        let id = page.id;
        self.pages.push(page);
        self.current_page = self.pages.len() - 1;
        id
    }

    /// Remove a page. The last remaining page cannot be removed.
    pub fn remove_page(&mut self, id: WidgetId) -> bool {
        if self.pages.len() <= 1 {
            return false;
        }
        let before = self.pages.len();
        self.pages.retain(|page| page.id != id);
        let removed = self.pages.len() != before;
        self.normalize();
        removed
    }

    pub fn set_content(&mut self, id: WidgetId, content: impl Into<String>) -> bool {
        match self.pages.iter_mut().find(|page| page.id == id) {
            Some(page) => {
                page.content = content.into();
                true
            }
            None => false,
        }
    }

    pub fn next_page(&mut self) -> bool {
        if self.current_page + 1 < self.pages.len() {
            self.current_page += 1;
            true
        } else {
            false
        }
    }

    pub fn prev_page(&mut self) -> bool {
        if self.current_page > 0 {
            self.current_page -= 1;
            true
        } else {
            false
        }
    }

    fn normalize(&mut self) -> bool {
        let mut changed = false;
        if self.pages.is_empty() {
            self.pages.push(Page::numbered(1));
            changed = true;
        }
        let last = self.pages.len() - 1;
        if self.current_page > last {
            self.current_page = last;
            changed = true;
        }
        changed
    }
}

/// A container representing a character, owning its own widgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterData {
    pub name: String,
    pub icon_color: HexColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_number: Option<u32>,
    #[serde(default)]
    pub widgets: Vec<Widget>,
    #[serde(default)]
    pub collapsed: bool,
}

impl Default for CharacterData {
    fn default() -> Self {
        Self {
            name: "Character".to_string(),
            icon_color: HexColor::rgb(0x4a, 0x9e, 0xff),
            icon_number: None,
            widgets: Vec::new(),
            collapsed: false,
        }
    }
}

impl CharacterData {
    pub fn toggle_collapsed(&mut self) {
        self.collapsed = !self.collapsed;
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn nested(&self, id: WidgetId) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id == id)
    }

    fn normalize(&mut self) -> bool {
        let mut changed = false;
        for widget in &mut self.widgets {
            changed |= widget.normalize();
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_increment_at_max_is_noop() {
        let mut data = FractionData {
            title: "HP".to_string(),
            current: 10,
            max: 10,
        };
        data.increment();
        assert_eq!(data.current, 10);
    }

    #[test]
    fn test_fraction_bounds() {
        let mut data = FractionData {
            title: "HP".to_string(),
            current: 0,
            max: 10,
        };
        data.decrement();
        assert_eq!(data.current, 0);
        data.set_current(42);
        assert_eq!(data.current, 10);
        data.set_max(4);
        assert_eq!(data.current, 4);
    }

    #[test]
    fn test_countdown_clamps_to_present_bounds() {
        let mut data = CountdownData {
            title: "Rounds".to_string(),
            value: 0,
            min: Some(0),
            max: None,
        };
        data.decrement();
        assert_eq!(data.value, 0);
        data.set_value(1000);
        assert_eq!(data.value, 1000);

        data.set_bounds(Some(0), Some(5));
        assert_eq!(data.value, 5);
        data.increment();
        assert_eq!(data.value, 5);
    }

    #[test]
    fn test_countdown_swaps_inverted_bounds() {
        let mut data = CountdownData {
            title: String::new(),
            value: 50,
            min: Some(10),
            max: Some(3),
        };
        assert!(WidgetData::Countdown(data.clone()).normalize());
        data.set_bounds(Some(10), Some(3));
        assert_eq!((data.min, data.max, data.value), (Some(3), Some(10), 10));
    }

    #[test]
    fn test_toggles_count_preserves_prefix() {
        let mut data = TogglesData::with_count(3);
        data.toggle(0);
        data.toggle(2);
        data.set_count(5);
        assert_eq!(data.toggles, vec![true, false, true, false, false]);
        data.set_count(2);
        assert_eq!(data.toggles, vec![true, false]);
        data.set_count(0);
        assert_eq!(data.count, MIN_TOGGLES);
        assert_eq!(data.toggles.len(), 1);
        data.set_count(500);
        assert_eq!(data.toggles.len(), MAX_TOGGLES as usize);
        assert!(!data.toggle(999));
    }

    #[test]
    fn test_todos_lifecycle() {
        let mut data = TodosData::default();
        let first = data.add_item("Roll initiative");
        let second = data.add_item("Loot");
        assert!(data.toggle_item(first));
        assert!(data.items[0].completed);
        assert!(data.edit_item(second, "Loot the dragon"));
        assert_eq!(data.items[1].text, "Loot the dragon");
        assert!(data.remove_item(first));
        assert!(!data.remove_item(first));
        assert_eq!(data.items.len(), 1);
    }

    #[test]
    fn test_pages_navigation_and_removal() {
        let mut data = PagesData::default();
        assert!(!data.prev_page());
        let second = data.add_page();
        assert_eq!(data.current_page, 1);
        assert!(data.current().unwrap().content.starts_with("# Page 2"));
        assert!(!data.next_page());
        assert!(data.prev_page());

        data.current_page = 1;
        assert!(data.remove_page(second));
        assert_eq!(data.current_page, 0);

        let only = data.pages[0].id;
        assert!(!data.remove_page(only));
        assert_eq!(data.pages.len(), 1);
    }

    #[test]
    fn test_pages_normalize_restores_invariants() {
        let mut data = WidgetData::Pages(PagesData {
            pages: Vec::new(),
            current_page: 7,
        });
        assert!(data.normalize());
        let WidgetData::Pages(pages) = data else {
            panic!("expected pages");
        };
        assert_eq!(pages.pages.len(), 1);
        assert_eq!(pages.current_page, 0);
    }

    #[test]
    fn test_image_scale_sanitized() {
        let mut data = ImageData::default();
        data.set_scale(-2.0);
        assert_eq!(data.scale, Some(1.0));
        data.set_scale(1.5);
        assert_eq!(data.scale, Some(1.5));
    }

    #[test]
    fn test_serde_tag_matches_kind() {
        let data = WidgetData::Fraction(FractionData {
            title: "HP".to_string(),
            current: 3,
            max: 10,
        });
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["type"], "fraction");
        assert_eq!(json["data"]["current"], 3);

        let toggles = WidgetData::Toggles(TogglesData {
            style: ToggleStyle::Square,
            ..TogglesData::with_count(2)
        });
        let json = serde_json::to_value(&toggles).unwrap();
        assert_eq!(json["data"]["style"], "box");
        let back: WidgetData = serde_json::from_value(json).unwrap();
        assert_eq!(back, toggles);
    }
}

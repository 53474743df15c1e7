//! Page sections and the free-positioned elements inside them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Hero,
    Features,
    Text,
    Gallery,
    Cta,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Text,
    Image,
    Button,
    Shape,
    Embed,
}

impl ElementKind {
    /// Initial `(width, height)` for a freshly placed element.
    pub fn default_size(self) -> (f64, f64) {
        match self {
            ElementKind::Text => (320.0, 64.0),
            ElementKind::Image => (320.0, 240.0),
            ElementKind::Button => (160.0, 48.0),
            ElementKind::Shape => (120.0, 120.0),
            ElementKind::Embed => (480.0, 270.0),
        }
    }

    pub fn default_content(self) -> Value {
        match self {
            ElementKind::Text => serde_json::json!({ "text": "" }),
            ElementKind::Image => serde_json::json!({ "src": null, "alt": "" }),
            ElementKind::Button => serde_json::json!({ "label": "Button", "href": null }),
            ElementKind::Shape => serde_json::json!({ "shape": "sphere" }),
            ElementKind::Embed => serde_json::json!({ "url": null }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: Uuid,
    pub section_id: Uuid,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub content: Value,
    pub z_index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: Uuid,
    pub page_id: Uuid,
    #[serde(rename = "type")]
    pub kind: SectionKind,
    pub order_index: u32,
    pub config: Value,
    pub background: Value,
    pub min_height: u32,
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl Section {
    pub fn element(&self, id: Uuid) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Renumbers `z_index` to 0..n in current z order.
    pub(crate) fn reindex_elements(&mut self) {
        self.elements.sort_by_key(|e| e.z_index);
        for (i, e) in self.elements.iter_mut().enumerate() {
            e.z_index = i as u32;
        }
    }
}

/// Partial section update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SectionPatch {
    pub kind: Option<SectionKind>,
    pub config: Option<Value>,
    pub background: Option<Value>,
    pub min_height: Option<u32>,
}

impl SectionPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply(&self, section: &mut Section) {
        if let Some(kind) = self.kind {
            section.kind = kind;
        }
        if let Some(config) = &self.config {
            section.config = config.clone();
        }
        if let Some(background) = &self.background {
            section.background = background.clone();
        }
        if let Some(h) = self.min_height {
            section.min_height = h;
        }
    }

    /// Every persisted field of `section`.
    pub fn full(section: &Section) -> Self {
        Self {
            kind: Some(section.kind),
            config: Some(section.config.clone()),
            background: Some(section.background.clone()),
            min_height: Some(section.min_height),
        }
    }
}

/// Partial element update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub content: Option<Value>,
    pub z_index: Option<u32>,
}

impl ElementPatch {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn size(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply(&self, element: &mut Element) {
        if let Some(x) = self.x {
            element.x = x;
        }
        if let Some(y) = self.y {
            element.y = y;
        }
        if let Some(w) = self.width {
            element.width = w;
        }
        if let Some(h) = self.height {
            element.height = h;
        }
        if let Some(content) = &self.content {
            element.content = content.clone();
        }
        if let Some(z) = self.z_index {
            element.z_index = z;
        }
    }

    /// Every persisted field of `element`.
    pub fn full(element: &Element) -> Self {
        Self {
            x: Some(element.x),
            y: Some(element.y),
            width: Some(element.width),
            height: Some(element.height),
            content: Some(element.content.clone()),
            z_index: Some(element.z_index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_json_uses_wire_names() {
        let section = Section {
            id: Uuid::nil(),
            page_id: Uuid::nil(),
            kind: SectionKind::Cta,
            order_index: 2,
            config: Value::Null,
            background: Value::Null,
            min_height: 400,
            elements: vec![],
        };

        let json = serde_json::to_value(&section).unwrap();
        assert_eq!(json["type"], "cta");
        assert_eq!(json["orderIndex"], 2);
        assert_eq!(json["minHeight"], 400);
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut element = Element {
            id: Uuid::nil(),
            section_id: Uuid::nil(),
            kind: ElementKind::Text,
            x: 1.0,
            y: 2.0,
            width: 3.0,
            height: 4.0,
            content: serde_json::json!({ "text": "a" }),
            z_index: 0,
        };

        ElementPatch::position(10.0, 20.0).apply(&mut element);
        assert_eq!((element.x, element.y, element.width), (10.0, 20.0, 3.0));
        assert_eq!(element.content["text"], "a");

        assert!(ElementPatch::default().is_empty());
        assert!(!ElementPatch::full(&element).is_empty());
    }
}

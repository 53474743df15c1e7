use crate::model::SectionKind;
use serde_json::{json, Value};

/// Starting values for a new section of a given kind.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionTemplate {
    pub config: Value,
    pub background: Value,
    pub min_height: u32,
}

pub fn section_template(kind: SectionKind) -> SectionTemplate {
    match kind {
        SectionKind::Hero => SectionTemplate {
            config: json!({ "layout": "centered", "shape": "sphere", "particles": 20000 }),
            background: json!({ "type": "color", "value": "#050608" }),
            min_height: 720,
        },
        SectionKind::Features => SectionTemplate {
            config: json!({ "columns": 3 }),
            background: json!({ "type": "color", "value": "#0b0d12" }),
            min_height: 480,
        },
        SectionKind::Text => SectionTemplate {
            config: json!({ "maxWidth": 720 }),
            background: json!({ "type": "none" }),
            min_height: 240,
        },
        SectionKind::Gallery => SectionTemplate {
            config: json!({ "columns": 4, "gap": 16 }),
            background: json!({ "type": "none" }),
            min_height: 480,
        },
        SectionKind::Cta => SectionTemplate {
            config: json!({ "align": "center" }),
            background: json!({ "type": "gradient", "from": "#101522", "to": "#050608" }),
            min_height: 320,
        },
        SectionKind::Custom => SectionTemplate {
            config: json!({}),
            background: json!({ "type": "none" }),
            min_height: 400,
        },
    }
}

//! Section payloads: the vector geometry for one data tile, independent of
//! rendering resolution.

pub mod source;

use serde::{Deserialize, Serialize};

use crate::core::bounds::Aabb;

pub use source::{HttpSectionFetcher, SectionFetcher, SectionProvider, SectionSource};

/// A style lookup in a section payload: either a palette entry by name or a
/// literal packed `0xRRGGBB` colour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleRef {
    Rgb(u32),
    Name(String),
}

/// A ground polygon or polyline in normalized map coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Shape {
    pub map_points: Vec<[f64; 2]>,
    pub map_aabb: Aabb,
    pub stroke_colour: Option<StyleRef>,
    pub fill_colour: Option<StyleRef>,
    pub stroke_width: f64,
}

/// A free-standing text label, e.g. an airport name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Label {
    pub text: String,
    pub map_position: [f64; 2],
    pub font_size: f64,
}

/// A named navigation fix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Fix {
    pub name: String,
    pub position: [f64; 2],
}

/// A runway centreline with its two threshold identifiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Runway {
    pub points: [[f64; 2]; 2],
    pub primary_id: String,
    pub opposite_id: String,
}

/// The immutable vector payload for one tile address at or below the
/// maximum data level. An absent resource is represented by a well-formed
/// empty section, never by an error: an airspace tile may legitimately
/// contain nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Section {
    pub shapes: Vec<Shape>,
    pub labels: Vec<Label>,
    pub points: Vec<Fix>,
    pub runways: Vec<Runway>,
}

impl Section {
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
            && self.labels.is_empty()
            && self.points.is_empty()
            && self.runways.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_wire_format() {
        let json = r#"{
            "shapes": [{
                "mapPoints": [[0.1, 0.2], [0.3, 0.4]],
                "mapAabb": [0.1, 0.2, 0.3, 0.4],
                "strokeColour": "COAST",
                "fillColour": 2236962,
                "strokeWidth": 1.5
            }],
            "labels": [{"text": "EGLL", "mapPosition": [0.5, 0.5], "fontSize": 10.0}],
            "points": [{"name": "BNN", "position": [0.4, 0.6]}],
            "runways": [{
                "points": [[0.1, 0.1], [0.2, 0.2]],
                "primaryId": "09L",
                "oppositeId": "27R"
            }]
        }"#;

        let section: Section = serde_json::from_str(json).unwrap();
        assert_eq!(section.shapes.len(), 1);
        assert_eq!(
            section.shapes[0].stroke_colour,
            Some(StyleRef::Name("COAST".to_string()))
        );
        assert_eq!(section.shapes[0].fill_colour, Some(StyleRef::Rgb(0x222222)));
        assert_eq!(section.labels[0].text, "EGLL");
        assert_eq!(section.runways[0].primary_id, "09L");
        assert!(!section.is_empty());
    }

    #[test]
    fn test_empty_section_from_empty_object() {
        let section: Section = serde_json::from_str("{}").unwrap();
        assert!(section.is_empty());
    }
}

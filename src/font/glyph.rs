use crate::geometry::{BoundingBox, Outline};

/// A decoded glyph: its name, its outline in font units and its advance width
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub name: String,
    pub outline: Outline,
    pub advance_width: f32,
}

impl Glyph {
    pub fn empty(name: impl Into<String>, advance_width: f32) -> Self {
        Self {
            name: name.into(),
            outline: Outline::empty(),
            advance_width,
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.outline.bounding_box()
    }
}

use crate::data_structures::Matrix;

use super::{BoundingBox, CubicBezierCurve, Point};

/// A single drawing command in absolute coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathOp {
    MoveTo(Point),
    LineTo(Point),
    CurveTo {
        first_control_point: Point,
        second_control_point: Point,
        end: Point,
    },
    Close,
}

impl PathOp {
    pub fn apply_transform(&mut self, transformation: Matrix) {
        match self {
            Self::MoveTo(p) | Self::LineTo(p) => *p *= transformation,
            Self::CurveTo {
                first_control_point,
                second_control_point,
                end,
            } => {
                *first_control_point *= transformation;
                *second_control_point *= transformation;
                *end *= transformation;
            }
            Self::Close => {}
        }
    }
}

/// An ordered list of path operations making up a glyph shape
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Outline {
    pub ops: Vec<PathOp>,
}

impl Outline {
    pub const fn empty() -> Self {
        Self { ops: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn apply_transform(&mut self, transformation: Matrix) {
        for op in &mut self.ops {
            op.apply_transform(transformation);
        }
    }

    /// Append all operations of `other`, transformed by `transformation`
    pub fn append(&mut self, other: &Outline, transformation: Matrix) {
        self.ops.extend(other.ops.iter().map(|op| {
            let mut op = *op;
            op.apply_transform(transformation);
            op
        }));
    }

    /// The number of `CurveTo` operations
    pub fn curve_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, PathOp::CurveTo { .. }))
            .count()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::new();
        let mut current = Point::origin();

        for op in &self.ops {
            match *op {
                PathOp::MoveTo(p) => current = p,
                PathOp::LineTo(p) => {
                    bbox.add_point(current);
                    bbox.add_point(p);
                    current = p;
                }
                PathOp::CurveTo {
                    first_control_point,
                    second_control_point,
                    end,
                } => {
                    let curve = CubicBezierCurve::new(
                        current,
                        end,
                        first_control_point,
                        second_control_point,
                    );
                    bbox.merge(curve.bounding_box());
                    current = end;
                }
                PathOp::Close => {}
            }
        }

        bbox
    }
}

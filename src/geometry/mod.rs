pub use bounding_box::BoundingBox;
pub use cubic_bezier::CubicBezierCurve;
pub use outline::{Outline, PathOp};
pub use path_builder::PathBuilder;
pub use point::Point;

mod bounding_box;
mod cubic_bezier;
mod outline;
mod path_builder;
mod point;

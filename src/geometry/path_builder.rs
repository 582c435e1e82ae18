use super::{Outline, PathOp, Point};

/// Accumulates relative drawing commands into an absolute [`Outline`]
///
/// A subpath is "open" once a line or curve has been drawn after the last
/// move. Moving while a subpath is open closes it first.
#[derive(Debug)]
pub struct PathBuilder {
    outline: Outline,
    current_point: Point,
    open: bool,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self {
            outline: Outline::empty(),
            current_point: Point::origin(),
            open: false,
        }
    }

    pub fn current_point(&self) -> Point {
        self.current_point
    }

    pub fn relative_move_to(&mut self, dx: f32, dy: f32) {
        self.close_path();

        self.current_point = self.current_point.translate(dx, dy);
        self.outline.ops.push(PathOp::MoveTo(self.current_point));
    }

    pub fn relative_line_to(&mut self, dx: f32, dy: f32) {
        self.begin_drawing();

        self.current_point = self.current_point.translate(dx, dy);
        self.outline.ops.push(PathOp::LineTo(self.current_point));
    }

    pub fn horizontal_line_to(&mut self, dx: f32) {
        self.relative_line_to(dx, 0.0);
    }

    pub fn vertical_line_to(&mut self, dy: f32) {
        self.relative_line_to(0.0, dy);
    }

    /// Control points are cumulative: each delta is relative to the point
    /// before it, starting from the current point
    pub fn relative_relative_curve_to(
        &mut self,
        dx1: f32,
        dy1: f32,
        dx2: f32,
        dy2: f32,
        dx3: f32,
        dy3: f32,
    ) {
        self.begin_drawing();

        let first_control_point = self.current_point.translate(dx1, dy1);
        let second_control_point = first_control_point.translate(dx2, dy2);
        let end = second_control_point.translate(dx3, dy3);

        self.outline.ops.push(PathOp::CurveTo {
            first_control_point,
            second_control_point,
            end,
        });
        self.current_point = end;
    }

    /// Close the current subpath if one is open. The current point is left
    /// where the last segment ended
    pub fn close_path(&mut self) {
        if self.open {
            self.outline.ops.push(PathOp::Close);
            self.open = false;
        }
    }

    pub fn finish(mut self) -> Outline {
        self.close_path();
        self.outline
    }

    /// Drawing without a preceding move starts an implicit subpath at the
    /// current point
    fn begin_drawing(&mut self) {
        if !self.open && !matches!(self.outline.ops.last(), Some(PathOp::MoveTo(..))) {
            self.outline.ops.push(PathOp::MoveTo(self.current_point));
        }

        self.open = true;
    }
}

impl Default for PathBuilder {
    fn default() -> Self {
        Self::new()
    }
}

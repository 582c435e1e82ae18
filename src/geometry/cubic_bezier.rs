use super::{point::Point, BoundingBox};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezierCurve {
    pub start: Point,
    pub end: Point,
    pub first_control_point: Point,
    pub second_control_point: Point,
}

impl CubicBezierCurve {
    pub fn new(
        start: Point,
        end: Point,
        first_control_point: Point,
        second_control_point: Point,
    ) -> Self {
        Self {
            start,
            first_control_point,
            second_control_point,
            end,
        }
    }

    pub fn basis(&self, t: f32) -> Point {
        let t2 = t * t;
        let t3 = t2 * t;

        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        self.start * mt3
            + 3.0 * self.first_control_point * mt2 * t
            + 3.0 * self.second_control_point * mt * t2
            + self.end * t3
    }

    /// The tight bounding box: the end points plus any axis extrema, found at
    /// the roots of the curve's derivative
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::new();

        bbox.add_point(self.start);
        bbox.add_point(self.end);

        let x = extrema(
            self.start.x,
            self.first_control_point.x,
            self.second_control_point.x,
            self.end.x,
        );
        let y = extrema(
            self.start.y,
            self.first_control_point.y,
            self.second_control_point.y,
            self.end.y,
        );

        for t in x.into_iter().chain(y).flatten() {
            bbox.add_point(self.basis(t));
        }

        bbox
    }
}

/// Parameters in (0, 1) at which one coordinate of a cubic has a local extremum
fn extrema(p0: f32, p1: f32, p2: f32, p3: f32) -> [Option<f32>; 2] {
    let a = -p0 + 3.0 * p1 - 3.0 * p2 + p3;
    let b = 2.0 * (p0 - 2.0 * p1 + p2);
    let c = p1 - p0;

    let in_range = |t: f32| if t > 0.0 && t < 1.0 { Some(t) } else { None };

    if a.abs() < f32::EPSILON {
        if b.abs() < f32::EPSILON {
            return [None, None];
        }

        return [in_range(-c / b), None];
    }

    let discriminant = b * b - 4.0 * a * c;

    if discriminant < 0.0 {
        return [None, None];
    }

    let sqrt = discriminant.sqrt();

    [
        in_range((-b + sqrt) / (2.0 * a)),
        in_range((-b - sqrt) / (2.0 * a)),
    ]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bounding_box_includes_bulge() {
        let curve = CubicBezierCurve::new(
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(0.0, 100.0),
            Point::new(100.0, 100.0),
        );

        let bbox = curve.bounding_box();

        assert_eq!(bbox.min(), Point::new(0.0, 0.0));
        assert_eq!(bbox.max().x, 100.0);
        assert!((bbox.max().y - 75.0).abs() < 1e-3);
    }

    #[test]
    fn basis_end_points() {
        let curve = CubicBezierCurve::new(
            Point::new(1.0, 2.0),
            Point::new(7.0, 8.0),
            Point::new(3.0, 4.0),
            Point::new(5.0, 6.0),
        );

        assert_eq!(curve.basis(0.0), curve.start);
        assert_eq!(curve.basis(1.0), curve.end);
    }
}

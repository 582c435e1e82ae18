use std::ops::{Mul, MulAssign};

use crate::geometry::Point;

/// A 3x3 matrix
///
/// It is only possible to specify 6 out of the 9 possible values.
///
/// The full matrix is of the form:
///
/// [a b 0]
/// [c d 0]
/// [e f 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

/// `self * other` applies `self` first, then `other`
impl Mul<Matrix> for Matrix {
    type Output = Matrix;
    fn mul(self, other: Matrix) -> Self::Output {
        let a = self.a * other.a + self.b * other.c;
        let b = self.a * other.b + self.b * other.d;

        let c = self.c * other.a + self.d * other.c;
        let d = self.c * other.b + self.d * other.d;

        let e = self.e * other.a + self.f * other.c + other.e;
        let f = self.e * other.b + self.f * other.d + other.f;

        Matrix::new(a, b, c, d, e, f)
    }
}

impl Mul<Point> for Matrix {
    type Output = Point;

    fn mul(self, other: Point) -> Self::Output {
        let x = self.a * other.x + self.c * other.y + self.e;
        let y = self.b * other.x + self.d * other.y + self.f;

        Point::new(x, y)
    }
}

impl MulAssign<Matrix> for Point {
    fn mul_assign(&mut self, rhs: Matrix) {
        *self = rhs * *self;
    }
}

impl Matrix {
    pub const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    pub const fn new_translation(x: f32, y: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, x, y)
    }

    pub const fn new_scale(x: f32, y: f32) -> Self {
        Self::new(x, 0.0, 0.0, y, 0.0, 0.0)
    }

    pub fn from_arr(arr: [f32; 6]) -> Self {
        let [a, b, c, d, e, f] = arr;
        Self { a, b, c, d, e, f }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn translation_then_scale() {
        let m = Matrix::new_translation(10.0, 0.0) * Matrix::new_scale(2.0, 3.0);

        assert_eq!(m * Point::new(1.0, 1.0), Point::new(22.0, 3.0));
    }

    #[test]
    fn identity_is_neutral() {
        let m = Matrix::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);

        assert_eq!(m * Matrix::identity(), m);
        assert_eq!(Matrix::identity() * m, m);
    }
}

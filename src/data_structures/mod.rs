pub use matrix::Matrix;

mod matrix;

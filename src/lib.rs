//! Decoding for two binary encodings embedded in PDF documents: CFF
//! (`Type1C`) font programs and PDF function objects

pub use crate::error::{DecodeError, DecodeResult, EvalError, EvalResult};

pub mod data_structures;
pub mod error;
pub mod font;
pub mod function;
pub mod geometry;

mod parse_binary;

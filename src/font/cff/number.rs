//! Operand encoding shared by DICT data and Type 2 charstrings

use crate::{
    error::{DecodeError, DecodeResult},
    parse_binary::BinaryParser,
};

const END_OF_REAL: u8 = 0xf;

/// Real numbers longer than this many nibbles are rejected
const MAX_REAL_NIBBLES: usize = 64;

/// Where an operand is being decoded. A few encodings are only legal in one
/// of the two contexts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandContext {
    Dict,
    Charstring,
}

/// Decode the operand introduced by `b0`, reading any further bytes it needs
/// from `parser`
///
/// | b0         | value                                  | context    |
/// |------------|----------------------------------------|------------|
/// | 32..=246   | `b0 - 139`                             | both       |
/// | 247..=250  | `(b0 - 247) * 256 + b1 + 108`          | both       |
/// | 251..=254  | `-(b0 - 251) * 256 - b1 - 108`         | both       |
/// | 28         | signed 16-bit                          | both       |
/// | 29         | signed 32-bit                          | dict       |
/// | 30         | packed BCD real                        | dict       |
/// | 255        | 16.16 fixed point                      | charstring |
pub(crate) fn parse_operand<P: BinaryParser + ?Sized>(
    parser: &mut P,
    b0: u8,
    context: OperandContext,
) -> DecodeResult<f64> {
    Ok(match (b0, context) {
        (32..=246, _) => (b0 as i32 - 139) as f64,
        (247..=250, _) => {
            let b1 = parser.next()? as i32;
            ((b0 as i32 - 247) * 256 + b1 + 108) as f64
        }
        (251..=254, _) => {
            let b1 = parser.next()? as i32;
            (-(b0 as i32 - 251) * 256 - b1 - 108) as f64
        }
        (28, _) => parser.parse_i16()? as f64,
        (29, OperandContext::Dict) => parser.parse_i32()? as f64,
        (30, OperandContext::Dict) => parse_real(parser)?,
        (255, OperandContext::Charstring) => {
            let bits = parser.parse_i32()?;
            fixed::FixedI32::<fixed::types::extra::U16>::from_bits(bits).to_num::<f64>()
        }
        (byte, _) => return Err(DecodeError::InvalidOperandEncoding { byte }),
    })
}

/// Decode a single operand from the start of `bytes`, returning the value and
/// the number of bytes consumed
pub fn decode_operand(bytes: &[u8], context: OperandContext) -> DecodeResult<(f64, usize)> {
    struct Operand<'a> {
        buffer: &'a [u8],
        cursor: usize,
    }

    impl<'a> BinaryParser for Operand<'a> {
        fn buffer(&self) -> &[u8] {
            self.buffer
        }
        fn cursor(&self) -> usize {
            self.cursor
        }
        fn cursor_mut(&mut self) -> &mut usize {
            &mut self.cursor
        }
    }

    let mut parser = Operand {
        buffer: bytes,
        cursor: 0,
    };

    let b0 = parser.next()?;
    let value = parse_operand(&mut parser, b0, context)?;

    Ok((value, parser.cursor))
}

/// Nibbles: `0-9` digits, `a` decimal point, `b` `E`, `c` `E-`, `d` reserved
/// (skipped), `e` minus, `f` end of number
fn parse_real<P: BinaryParser + ?Sized>(parser: &mut P) -> DecodeResult<f64> {
    let mut s = String::new();
    let mut nibbles = 0;

    'outer: loop {
        let byte = parser.next()?;

        for nibble in [byte >> 4, byte & 0xf] {
            nibbles += 1;

            match nibble {
                0..=9 => s.push((b'0' + nibble) as char),
                0xa => s.push('.'),
                0xb => s.push('E'),
                0xc => s.push_str("E-"),
                0xd => {}
                0xe => s.push('-'),
                END_OF_REAL => break 'outer,
                _ => unreachable!("nibbles are 4 bits"),
            }
        }

        if nibbles >= MAX_REAL_NIBBLES {
            return Err(DecodeError::InvalidOperandEncoding { byte: 30 });
        }
    }

    if s.is_empty() {
        return Ok(0.0);
    }

    s.parse::<f64>()
        .map_err(|_| DecodeError::InvalidOperandEncoding { byte: 30 })
}

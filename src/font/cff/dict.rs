use std::collections::BTreeMap;

use crate::{
    error::{DecodeError, DecodeResult},
    parse_binary::BinaryParser,
};

use super::number::{parse_operand, OperandContext};

/// Two-byte operators `12 x` are stored as `1200 + x`
pub(crate) const fn escaped(b1: u8) -> u16 {
    1200 + b1 as u16
}

pub(crate) mod op {
    use super::escaped;

    pub const FULL_NAME: u16 = 2;
    pub const FAMILY_NAME: u16 = 3;
    pub const FONT_BBOX: u16 = 5;
    pub const CHARSET: u16 = 15;
    pub const ENCODING: u16 = 16;
    pub const CHAR_STRINGS: u16 = 17;
    pub const PRIVATE: u16 = 18;
    pub const SUBRS: u16 = 19;
    pub const DEFAULT_WIDTH_X: u16 = 20;
    pub const NOMINAL_WIDTH_X: u16 = 21;

    pub const IS_FIXED_PITCH: u16 = escaped(1);
    pub const ITALIC_ANGLE: u16 = escaped(2);
    pub const CHARSTRING_TYPE: u16 = escaped(6);
    pub const FONT_MATRIX: u16 = escaped(7);
    pub const ROS: u16 = escaped(30);
}

/// The DICT operand stack may hold at most this many operands
const MAX_DICT_OPERANDS: usize = 48;

/// A decoded DICT: each operator mapped to the operands that preceded it
///
/// If an operator occurs more than once, the last occurrence wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dict {
    entries: BTreeMap<u16, Vec<f64>>,
}

impl Dict {
    pub fn get(&self, operator: u16) -> Option<&[f64]> {
        self.entries.get(&operator).map(Vec::as_slice)
    }

    pub fn contains(&self, operator: u16) -> bool {
        self.entries.contains_key(&operator)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn operators(&self) -> impl Iterator<Item = u16> + '_ {
        self.entries.keys().copied()
    }

    fn get_single(&self, operator: u16) -> DecodeResult<Option<f64>> {
        match self.get(operator) {
            None => Ok(None),
            Some(&[n]) => Ok(Some(n)),
            Some(..) => Err(DecodeError::MalformedDict),
        }
    }

    pub(crate) fn get_f32(&self, operator: u16) -> DecodeResult<Option<f32>> {
        Ok(self.get_single(operator)?.map(|n| n as f32))
    }

    fn get_integer(&self, operator: u16, max: f64) -> DecodeResult<Option<f64>> {
        match self.get_single(operator)? {
            Some(n) if n.fract() != 0.0 || n < 0.0 || n > max => Err(DecodeError::MalformedDict),
            n => Ok(n),
        }
    }

    pub(crate) fn get_u16(&self, operator: u16) -> DecodeResult<Option<u16>> {
        Ok(self
            .get_integer(operator, u16::MAX as f64)?
            .map(|n| n as u16))
    }

    pub(crate) fn get_u32(&self, operator: u16) -> DecodeResult<Option<u32>> {
        Ok(self
            .get_integer(operator, u32::MAX as f64)?
            .map(|n| n as u32))
    }

    pub(crate) fn get_bool(&self, operator: u16) -> DecodeResult<Option<bool>> {
        match self.get_single(operator)? {
            None => Ok(None),
            Some(n) if n == 0.0 || n == 1.0 => Ok(Some(n != 0.0)),
            Some(..) => Err(DecodeError::MalformedDict),
        }
    }

    pub(crate) fn get_array<const N: usize>(&self, operator: u16) -> DecodeResult<Option<[f32; N]>> {
        let operands = match self.get(operator) {
            Some(operands) => operands,
            None => return Ok(None),
        };

        if operands.len() != N {
            return Err(DecodeError::MalformedDict);
        }

        let mut arr = [0.0; N];
        for (slot, n) in arr.iter_mut().zip(operands) {
            *slot = *n as f32;
        }

        Ok(Some(arr))
    }
}

struct DictParser<'a> {
    buffer: &'a [u8],
    cursor: usize,
}

impl<'a> BinaryParser for DictParser<'a> {
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

/// Decode DICT data
///
/// Operands accumulate until an operator byte is reached, at which point
/// they are attached to that operator and the operand list is cleared.
pub fn read_dict(data: &[u8]) -> DecodeResult<Dict> {
    let mut parser = DictParser {
        buffer: data,
        cursor: 0,
    };

    let mut dict = Dict::default();
    let mut operands = Vec::new();

    while !parser.at_end() {
        let b0 = parser.next()?;

        let operator = match b0 {
            12 => escaped(parser.next().map_err(|_| DecodeError::MalformedDict)?),
            0..=21 => b0 as u16,
            22..=27 | 31 => return Err(DecodeError::MalformedDict),
            _ => {
                if operands.len() == MAX_DICT_OPERANDS {
                    return Err(DecodeError::MalformedDict);
                }

                let n = parse_operand(&mut parser, b0, OperandContext::Dict).map_err(|e| match e {
                    DecodeError::UnexpectedEof => DecodeError::MalformedDict,
                    e => e,
                })?;

                operands.push(n);
                continue;
            }
        };

        dict.entries.insert(operator, std::mem::take(&mut operands));
    }

    if !operands.is_empty() {
        return Err(DecodeError::MalformedDict);
    }

    log::trace!("DICT with {} operators", dict.len());

    Ok(dict)
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TopDict {
    pub full_name: Option<u16>,
    pub family_name: Option<u16>,
    pub is_fixed_pitch: bool,
    pub italic_angle: f32,
    pub charstring_type: u32,
    pub font_matrix: [f32; 6],
    pub font_b_box: [f32; 4],

    /// 0, 1 and 2 name the predefined charsets; anything else is an offset
    pub charset: u32,

    /// 0 and 1 name the predefined encodings; anything else is an offset
    pub encoding: u32,
    pub char_strings: Option<u32>,

    /// Private DICT size and offset
    pub private: Option<(u32, u32)>,
}

impl Default for TopDict {
    fn default() -> Self {
        TopDict {
            full_name: None,
            family_name: None,
            is_fixed_pitch: false,
            italic_angle: 0.0,
            charstring_type: 2,
            font_matrix: [0.001, 0.0, 0.0, 0.001, 0.0, 0.0],
            font_b_box: [0.0, 0.0, 0.0, 0.0],
            charset: 0,
            encoding: 0,
            char_strings: None,
            private: None,
        }
    }
}

impl TopDict {
    pub fn from_dict(dict: &Dict) -> DecodeResult<Self> {
        if dict.contains(op::ROS) {
            return Err(DecodeError::UnsupportedFontKind);
        }

        let default = TopDict::default();

        let charstring_type = dict
            .get_u32(op::CHARSTRING_TYPE)?
            .unwrap_or(default.charstring_type);

        if charstring_type != 2 {
            return Err(DecodeError::UnsupportedCharstringType(charstring_type));
        }

        let font_matrix = match dict.get(op::FONT_MATRIX) {
            None => default.font_matrix,
            Some(&[a, b, c, d]) => [a as f32, b as f32, c as f32, d as f32, 0.0, 0.0],
            Some(..) => dict
                .get_array::<6>(op::FONT_MATRIX)?
                .unwrap_or(default.font_matrix),
        };

        let private = match dict.get(op::PRIVATE) {
            None => None,
            Some(&[size, offset])
                if size >= 0.0
                    && offset >= 0.0
                    && size.fract() == 0.0
                    && offset.fract() == 0.0
                    && size <= u32::MAX as f64
                    && offset <= u32::MAX as f64 =>
            {
                Some((size as u32, offset as u32))
            }
            Some(..) => return Err(DecodeError::MalformedDict),
        };

        Ok(TopDict {
            full_name: dict.get_u16(op::FULL_NAME)?,
            family_name: dict.get_u16(op::FAMILY_NAME)?,
            is_fixed_pitch: dict
                .get_bool(op::IS_FIXED_PITCH)?
                .unwrap_or(default.is_fixed_pitch),
            italic_angle: dict
                .get_f32(op::ITALIC_ANGLE)?
                .unwrap_or(default.italic_angle),
            charstring_type,
            font_matrix,
            font_b_box: dict
                .get_array::<4>(op::FONT_BBOX)?
                .unwrap_or(default.font_b_box),
            charset: dict.get_u32(op::CHARSET)?.unwrap_or(default.charset),
            encoding: dict.get_u32(op::ENCODING)?.unwrap_or(default.encoding),
            char_strings: dict.get_u32(op::CHAR_STRINGS)?,
            private,
        })
    }
}

/// The parts of the Private DICT that outline decoding needs. Hinting
/// values are left unread.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PrivateDict {
    /// Offset of the local subroutine INDEX, relative to the start of the
    /// Private DICT
    pub subrs: Option<u32>,
    pub default_width_x: f32,
    pub nominal_width_x: f32,
}

impl PrivateDict {
    pub fn from_dict(dict: &Dict) -> DecodeResult<Self> {
        Ok(PrivateDict {
            subrs: dict.get_u32(op::SUBRS)?,
            default_width_x: dict.get_f32(op::DEFAULT_WIDTH_X)?.unwrap_or(0.0),
            nominal_width_x: dict.get_f32(op::NOMINAL_WIDTH_X)?.unwrap_or(0.0),
        })
    }
}

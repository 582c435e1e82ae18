use crate::{
    error::{DecodeError, DecodeResult},
    parse_binary::BinaryParser,
};

use super::{
    charset::CffCharset,
    consts::{EXPERT_ENCODING, STANDARD_ENCODING},
};

/// Set on the format byte when a supplemental block follows the encoding
const HAS_SUPPLEMENTS: u8 = 0x80;

/// Maps character codes to glyph indices
///
/// The predefined encodings map codes to SIDs, which are then resolved to
/// glyphs through the font's charset. Custom encodings assign codes to
/// glyphs directly, starting at glyph 1.
#[derive(Debug, Clone, PartialEq)]
pub enum CffEncoding {
    Standard,
    Expert,
    Zero {
        /// `codes[i]` is the code of glyph `i + 1`
        codes: Vec<u8>,
        supplements: Vec<EncodingSupplement>,
    },
    One {
        ranges: Vec<EncodingRange>,
        supplements: Vec<EncodingSupplement>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingRange {
    pub first: u8,
    /// Number of codes after `first`
    pub count: u8,
}

/// An additional code for a glyph already named by the charset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingSupplement {
    pub code: u8,
    pub sid: u16,
}

impl CffEncoding {
    pub fn lookup(&self, code: u8, charset: &CffCharset) -> Option<u16> {
        match self {
            Self::Standard => Self::lookup_predefined(&STANDARD_ENCODING, code, charset),
            Self::Expert => Self::lookup_predefined(&EXPERT_ENCODING, code, charset),
            Self::Zero { codes, supplements } => codes
                .iter()
                .position(|&c| c == code)
                .map(|idx| idx as u16 + 1)
                .or_else(|| Self::lookup_supplement(supplements, code, charset)),
            Self::One {
                ranges,
                supplements,
            } => {
                let mut glyph = 1u16;
                for range in ranges {
                    if code >= range.first && (code - range.first) <= range.count {
                        return Some(glyph + (code - range.first) as u16);
                    }

                    glyph += range.count as u16 + 1;
                }

                Self::lookup_supplement(supplements, code, charset)
            }
        }
    }

    pub fn supplements(&self) -> &[EncodingSupplement] {
        match self {
            Self::Standard | Self::Expert => &[],
            Self::Zero { supplements, .. } | Self::One { supplements, .. } => supplements,
        }
    }

    fn lookup_predefined(table: &[u16; 256], code: u8, charset: &CffCharset) -> Option<u16> {
        match table[code as usize] {
            0 => None,
            sid => charset.glyph_for_sid(sid),
        }
    }

    fn lookup_supplement(
        supplements: &[EncodingSupplement],
        code: u8,
        charset: &CffCharset,
    ) -> Option<u16> {
        let supplement = supplements.iter().find(|s| s.code == code)?;
        let glyph = charset.glyph_for_sid(supplement.sid);

        if glyph.is_none() {
            log::warn!(
                "encoding supplement for code {} names SID {} which is not in the charset",
                code,
                supplement.sid
            );
        }

        glyph
    }
}

struct EncodingParser<'a> {
    buffer: &'a [u8],
    cursor: usize,
}

impl<'a> BinaryParser for EncodingParser<'a> {
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

/// Decode the encoding named by the Top DICT `Encoding` operand
///
/// `0` and `1` select the predefined Standard and Expert encodings; any
/// other value is the offset of a custom encoding.
pub fn read_encoding(buffer: &[u8], base: u32) -> DecodeResult<CffEncoding> {
    match base {
        0 => return Ok(CffEncoding::Standard),
        1 => return Ok(CffEncoding::Expert),
        _ => {}
    }

    let mut parser = EncodingParser {
        buffer,
        cursor: base as usize,
    };

    let format = parser.next()?;

    let encoding = match format & !HAS_SUPPLEMENTS {
        0 => {
            let n_codes = parser.next()?;
            let mut codes = Vec::with_capacity(n_codes as usize);
            for _ in 0..n_codes {
                codes.push(parser.next()?);
            }

            CffEncoding::Zero {
                codes,
                supplements: read_supplements(&mut parser, format)?,
            }
        }
        1 => {
            let n_ranges = parser.next()?;
            let mut ranges = Vec::with_capacity(n_ranges as usize);
            for _ in 0..n_ranges {
                let first = parser.next()?;
                let count = parser.next()?;

                if first.checked_add(count).is_none() {
                    return Err(DecodeError::InvalidEncoding { format });
                }

                ranges.push(EncodingRange { first, count });
            }

            CffEncoding::One {
                ranges,
                supplements: read_supplements(&mut parser, format)?,
            }
        }
        _ => return Err(DecodeError::InvalidEncoding { format }),
    };

    log::debug!(
        "encoding format {} at {} with {} supplements",
        format & !HAS_SUPPLEMENTS,
        base,
        encoding.supplements().len()
    );

    Ok(encoding)
}

fn read_supplements(
    parser: &mut EncodingParser,
    format: u8,
) -> DecodeResult<Vec<EncodingSupplement>> {
    if format & HAS_SUPPLEMENTS == 0 {
        return Ok(Vec::new());
    }

    let n_sups = parser.next()?;
    let mut supplements = Vec::with_capacity(n_sups as usize);
    for _ in 0..n_sups {
        let code = parser.next()?;
        let sid = parser.parse_u16()?;

        supplements.push(EncodingSupplement { code, sid });
    }

    Ok(supplements)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn standard_encoding_goes_through_charset() {
        let charset = CffCharset::Zero {
            sids: vec![66, 34],
        };

        assert_eq!(CffEncoding::Standard.lookup(b'a', &charset), Some(1));
        assert_eq!(CffEncoding::Standard.lookup(b'A', &charset), Some(2));
        assert_eq!(CffEncoding::Standard.lookup(b'B', &charset), None);
        assert_eq!(CffEncoding::Standard.lookup(0, &charset), None);
    }

    #[test]
    fn expert_encoding() {
        assert_eq!(
            read_encoding(&[], 1).unwrap().lookup(b' ', &CffCharset::Expert),
            Some(1)
        );
    }

    #[test]
    fn format_zero_assigns_from_glyph_one() {
        let buffer = [0xaa, 0xaa, 0, 3, b'c', b'a', b'b'];
        let encoding = read_encoding(&buffer, 2).unwrap();

        assert_eq!(
            encoding,
            CffEncoding::Zero {
                codes: vec![b'c', b'a', b'b'],
                supplements: Vec::new()
            }
        );
        assert_eq!(encoding.lookup(b'c', &CffCharset::IsoAdobe), Some(1));
        assert_eq!(encoding.lookup(b'b', &CffCharset::IsoAdobe), Some(3));
        assert_eq!(encoding.lookup(b'd', &CffCharset::IsoAdobe), None);
    }

    #[test]
    fn format_one_ranges() {
        // 'a'..='c' -> glyphs 1..=3, 'x'..='y' -> glyphs 4..=5
        let buffer = [0xaa, 0xaa, 1, 2, b'a', 2, b'x', 1];
        let encoding = read_encoding(&buffer, 2).unwrap();

        assert_eq!(encoding.lookup(b'a', &CffCharset::IsoAdobe), Some(1));
        assert_eq!(encoding.lookup(b'c', &CffCharset::IsoAdobe), Some(3));
        assert_eq!(encoding.lookup(b'x', &CffCharset::IsoAdobe), Some(4));
        assert_eq!(encoding.lookup(b'y', &CffCharset::IsoAdobe), Some(5));
        assert_eq!(encoding.lookup(b'z', &CffCharset::IsoAdobe), None);
    }

    #[test]
    fn supplements_resolve_through_charset() {
        // format 0 with supplements: one code, then 'Z' -> SID 400
        let buffer = [0xaa, 0xaa, 0x80, 1, b'a', 1, b'Z', 0x01, 0x90];
        let encoding = read_encoding(&buffer, 2).unwrap();
        let charset = CffCharset::Zero {
            sids: vec![66, 400],
        };

        assert_eq!(
            encoding.supplements(),
            &[EncodingSupplement {
                code: b'Z',
                sid: 400
            }]
        );
        assert_eq!(encoding.lookup(b'a', &charset), Some(1));
        assert_eq!(encoding.lookup(b'Z', &charset), Some(2));
        assert_eq!(encoding.lookup(b'Z', &CffCharset::Expert), None);
    }

    #[test]
    fn bad_encodings() {
        assert_eq!(
            read_encoding(&[0, 0, 2], 2),
            Err(DecodeError::InvalidEncoding { format: 2 })
        );
        assert_eq!(
            read_encoding(&[0, 0, 0, 3, 1], 2),
            Err(DecodeError::UnexpectedEof)
        );
        assert_eq!(
            read_encoding(&[0, 0, 1, 1, 250, 10], 2),
            Err(DecodeError::InvalidEncoding { format: 1 })
        );
    }
}

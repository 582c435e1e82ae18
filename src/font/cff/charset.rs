use crate::{
    error::{DecodeError, DecodeResult},
    parse_binary::BinaryParser,
};

use super::consts::{EXPERT_CHARSET, EXPERT_SUBSET_CHARSET};

/// Maps glyph indices to SIDs
///
/// Glyph 0 is always `.notdef` (SID 0) and is omitted from the custom
/// formats.
#[derive(Debug, Clone, PartialEq)]
pub enum CffCharset {
    /// Identity: glyph `n` has SID `n`
    IsoAdobe,
    Expert,
    ExpertSubset,
    Zero { sids: Vec<u16> },
    One(Vec<CharsetRange>),
    Two(Vec<CharsetRange>),
}

/// A run of consecutive SIDs assigned to consecutive glyphs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharsetRange {
    pub first: u16,
    /// Number of glyphs after `first`
    pub count: u16,
}

impl CffCharset {
    pub fn sid_for_glyph(&self, glyph: u16) -> Option<u16> {
        if glyph == 0 {
            return Some(0);
        }

        match self {
            Self::IsoAdobe => Some(glyph),
            Self::Expert => EXPERT_CHARSET.get(glyph as usize).copied(),
            Self::ExpertSubset => EXPERT_SUBSET_CHARSET.get(glyph as usize).copied(),
            Self::Zero { sids } => sids.get(glyph as usize - 1).copied(),
            Self::One(ranges) | Self::Two(ranges) => {
                let mut remaining = glyph - 1;
                for range in ranges {
                    if remaining <= range.count {
                        return range.first.checked_add(remaining);
                    }

                    remaining -= range.count + 1;
                }

                None
            }
        }
    }

    pub fn glyph_for_sid(&self, sid: u16) -> Option<u16> {
        if sid == 0 {
            return Some(0);
        }

        let position = |table: &[u16]| table.iter().position(|&s| s == sid).map(|i| i as u16);

        match self {
            Self::IsoAdobe => Some(sid),
            Self::Expert => position(&EXPERT_CHARSET),
            Self::ExpertSubset => position(&EXPERT_SUBSET_CHARSET),
            Self::Zero { sids } => position(sids).map(|i| i + 1),
            Self::One(ranges) | Self::Two(ranges) => {
                let mut glyph = 1u16;
                for range in ranges {
                    if sid >= range.first && sid - range.first <= range.count {
                        return glyph.checked_add(sid - range.first);
                    }

                    glyph = glyph.checked_add(range.count)?.checked_add(1)?;
                }

                None
            }
        }
    }
}

struct CharsetParser<'a> {
    buffer: &'a [u8],
    cursor: usize,
}

impl<'a> BinaryParser for CharsetParser<'a> {
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

/// Decode the charset named by the Top DICT `charset` operand
///
/// `0`, `1` and `2` select the predefined ISOAdobe, Expert and ExpertSubset
/// charsets. Any other value is the offset of a custom charset, which
/// describes `n_glyphs - 1` glyphs. A final range that runs past the glyph
/// count is truncated.
pub fn read_charset(buffer: &[u8], base: u32, n_glyphs: u16) -> DecodeResult<CffCharset> {
    match base {
        0 => return Ok(CffCharset::IsoAdobe),
        1 => return Ok(CffCharset::Expert),
        2 => return Ok(CffCharset::ExpertSubset),
        _ => {}
    }

    let mut parser = CharsetParser {
        buffer,
        cursor: base as usize,
    };

    let format = parser.next()?;
    let needed = n_glyphs.saturating_sub(1);

    let charset = match format {
        0 => {
            let mut sids = Vec::with_capacity(needed as usize);
            for _ in 0..needed {
                sids.push(parser.parse_u16()?);
            }

            CffCharset::Zero { sids }
        }
        1 | 2 => {
            let mut ranges = Vec::new();
            let mut remaining = needed;

            while remaining > 0 {
                let first = parser.parse_u16()?;
                let count = if format == 1 {
                    parser.next()? as u16
                } else {
                    parser.parse_u16()?
                };

                let count = count.min(remaining - 1);

                if first.checked_add(count).is_none() {
                    return Err(DecodeError::InvalidCharset { format });
                }

                remaining -= count + 1;
                ranges.push(CharsetRange { first, count });
            }

            if format == 1 {
                CffCharset::One(ranges)
            } else {
                CffCharset::Two(ranges)
            }
        }
        format => return Err(DecodeError::InvalidCharset { format }),
    };

    log::debug!("charset format {} at {} for {} glyphs", format, base, n_glyphs);

    Ok(charset)
}

use std::ops::Range;

use crate::{
    error::{DecodeError, DecodeResult},
    parse_binary::BinaryParser,
};

/// An INDEX: a counted sequence of byte ranges borrowed from the font buffer
///
/// The entry ranges are stored as absolute positions in the font buffer, so
/// no entry data is ever copied.
#[derive(Debug, Clone)]
pub struct CffIndex<'a> {
    buffer: &'a [u8],
    entries: Vec<Range<usize>>,

    /// The total number of bytes the INDEX structure occupies
    size: usize,
}

impl<'a> CffIndex<'a> {
    pub fn empty(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            entries: Vec::new(),
            size: 2,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// The absolute byte range of entry `idx` within the font buffer
    pub fn range(&self, idx: usize) -> Option<Range<usize>> {
        self.entries.get(idx).cloned()
    }

    pub fn get(&self, idx: usize) -> Option<&'a [u8]> {
        let range = self.entries.get(idx)?;
        self.buffer.get(range.clone())
    }

    pub fn iter(&self) -> CffIndexIterator<'a, '_> {
        CffIndexIterator::new(self)
    }
}

#[derive(Debug)]
pub struct CffIndexIterator<'a, 'b> {
    index: &'b CffIndex<'a>,
    cursor: usize,
}

impl<'a, 'b> CffIndexIterator<'a, 'b> {
    pub fn new(index: &'b CffIndex<'a>) -> Self {
        Self { index, cursor: 0 }
    }
}

impl<'a, 'b> Iterator for CffIndexIterator<'a, 'b> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.index.get(self.cursor)?;
        self.cursor += 1;
        Some(n)
    }
}

struct IndexParser<'a> {
    buffer: &'a [u8],
    cursor: usize,
}

impl<'a> BinaryParser for IndexParser<'a> {
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

/// Read the INDEX starting at `offset` in `buffer`
///
/// Offsets in the offset array are 1-based, relative to the byte immediately
/// preceding the object data, i.e. `offset + 2 + offsize * (count + 1)`.
pub fn read_index(buffer: &[u8], offset: usize) -> DecodeResult<CffIndex<'_>> {
    let mut parser = IndexParser {
        buffer,
        cursor: offset,
    };

    let count = parser
        .parse_u16()
        .map_err(|_| DecodeError::MalformedIndex)? as usize;

    if count == 0 {
        return Ok(CffIndex::empty(buffer));
    }

    let offsize = parser.next().map_err(|_| DecodeError::MalformedIndex)?;

    let mut offsets = Vec::with_capacity(count + 1);
    for _ in 0..=count {
        let n = parser
            .parse_offset(offsize)
            .map_err(|_| DecodeError::MalformedIndex)?;
        offsets.push(n as usize);
    }

    let data_base = parser.cursor - 1;

    if offsets[0] < 1 {
        return Err(DecodeError::MalformedIndex);
    }

    let mut entries = Vec::with_capacity(count);
    for pair in offsets.windows(2) {
        let (start, end) = (pair[0], pair[1]);

        if end < start {
            return Err(DecodeError::MalformedIndex);
        }

        entries.push(data_base + start..data_base + end);
    }

    let last = offsets[count];
    let data_end = data_base
        .checked_add(last)
        .ok_or(DecodeError::MalformedIndex)?;

    if data_end > buffer.len() {
        return Err(DecodeError::MalformedIndex);
    }

    let size = data_end - offset;

    log::debug!(
        "INDEX at {}: {} entries, offsize {}, {} bytes",
        offset,
        count,
        offsize,
        size
    );

    Ok(CffIndex {
        buffer,
        entries,
        size,
    })
}

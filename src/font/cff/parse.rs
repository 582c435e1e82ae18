use std::{collections::HashMap, sync::RwLock};

use crate::{
    error::{DecodeError, DecodeResult},
    parse_binary::BinaryParser,
};

use super::{
    charset::read_charset,
    charstring::CharstringLimits,
    dict::{read_dict, PrivateDict, TopDict},
    encoding::read_encoding,
    index::{read_index, CffIndex},
    CffFont, CffHeader,
};

pub struct CffParser<'a> {
    buffer: &'a [u8],
    cursor: usize,
}

impl<'a> CffParser<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    pub fn parse(mut self) -> DecodeResult<CffFont<'a>> {
        let header = self.parse_header()?;
        self.cursor = header.header_size as usize;

        let name_index = self.parse_index()?;
        let top_dict_index = self.parse_index()?;

        let top_dict_data = top_dict_index.get(0).ok_or(DecodeError::MalformedIndex)?;
        if top_dict_index.len() > 1 {
            log::debug!(
                "CFF font set with {} fonts, using the first",
                top_dict_index.len()
            );
        }

        let top_dict = TopDict::from_dict(&read_dict(top_dict_data)?)?;

        let string_index = self.parse_index()?;
        let global_subr_index = self.parse_index()?;

        let charstrings_offset = top_dict.char_strings.ok_or(DecodeError::MissingCharStrings)?;
        let charstring_index = read_index(self.buffer, charstrings_offset as usize)?;

        if charstring_index.is_empty() {
            return Err(DecodeError::MissingCharStrings);
        }

        let (private_dict, local_subr_index) = self.parse_private(&top_dict)?;

        let n_glyphs = charstring_index.len() as u16;
        let charset = read_charset(self.buffer, top_dict.charset, n_glyphs)?;
        let encoding = read_encoding(self.buffer, top_dict.encoding)?;

        log::debug!(
            "CFF font with {} glyphs, {} strings, {} global subrs, {} local subrs",
            n_glyphs,
            string_index.len(),
            global_subr_index.len(),
            local_subr_index.as_ref().map_or(0, CffIndex::len)
        );

        Ok(CffFont {
            buffer: self.buffer,
            header,
            name_index,
            top_dict,
            string_index,
            global_subr_index,
            charstring_index,
            private_dict,
            local_subr_index,
            charset,
            encoding,
            limits: CharstringLimits::default(),
            cache: RwLock::new(HashMap::new()),
        })
    }

    fn parse_header(&mut self) -> DecodeResult<CffHeader> {
        let mut field = || self.next().map_err(|_| DecodeError::MalformedHeader);

        let major = field()?;
        let minor = field()?;
        let header_size = field()?;
        let off_size = field()?;

        if major != 1 || header_size < 4 || !(1..=4).contains(&off_size) {
            return Err(DecodeError::MalformedHeader);
        }

        if header_size as usize > self.buffer.len() {
            return Err(DecodeError::MalformedHeader);
        }

        log::debug!(
            "CFF header: version {}.{}, header size {}, offset size {}",
            major,
            minor,
            header_size,
            off_size
        );

        Ok(CffHeader {
            major,
            minor,
            header_size,
            off_size,
        })
    }

    /// Read the INDEX at the cursor and move past it
    fn parse_index(&mut self) -> DecodeResult<CffIndex<'a>> {
        let index = read_index(self.buffer, self.cursor)?;
        self.cursor += index.size();

        Ok(index)
    }

    /// The Private DICT and, if it declares one, the local subroutine INDEX.
    /// `Subrs` is relative to the start of the Private DICT
    fn parse_private(
        &self,
        top_dict: &TopDict,
    ) -> DecodeResult<(PrivateDict, Option<CffIndex<'a>>)> {
        let (size, offset) = match top_dict.private {
            Some(private) => private,
            None => return Ok((PrivateDict::default(), None)),
        };

        let start = offset as usize;
        let end = start
            .checked_add(size as usize)
            .ok_or(DecodeError::MalformedDict)?;

        let data = self
            .buffer
            .get(start..end)
            .ok_or(DecodeError::MalformedDict)?;

        let private_dict = PrivateDict::from_dict(&read_dict(data)?)?;

        let local_subr_index = match private_dict.subrs {
            Some(subrs) => {
                let subrs_offset = start
                    .checked_add(subrs as usize)
                    .ok_or(DecodeError::MalformedIndex)?;

                Some(read_index(self.buffer, subrs_offset)?)
            }
            None => None,
        };

        Ok((private_dict, local_subr_index))
    }
}

impl<'a> BinaryParser for CffParser<'a> {
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

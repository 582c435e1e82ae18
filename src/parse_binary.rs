use crate::error::{DecodeError, DecodeResult};

/// Generic trait for parsing binary formats
///
/// Every read is bounds checked against `buffer()`; running off the end is
/// reported as [`DecodeError::UnexpectedEof`].
pub trait BinaryParser {
    fn buffer(&self) -> &[u8];
    fn cursor(&self) -> usize;
    fn cursor_mut(&mut self) -> &mut usize;

    fn next(&mut self) -> DecodeResult<u8> {
        let b = self.buffer().get(self.cursor()).copied();
        if b.is_some() {
            *self.cursor_mut() += 1;
        }
        b.ok_or(DecodeError::UnexpectedEof)
    }

    fn at_end(&self) -> bool {
        self.cursor() >= self.buffer().len()
    }

    /// Advance the cursor by `n` bytes, failing if fewer than `n` remain
    fn skip(&mut self, n: usize) -> DecodeResult<()> {
        let end = self
            .cursor()
            .checked_add(n)
            .ok_or(DecodeError::UnexpectedEof)?;

        if end > self.buffer().len() {
            return Err(DecodeError::UnexpectedEof);
        }

        *self.cursor_mut() = end;

        Ok(())
    }

    fn parse_u16(&mut self) -> DecodeResult<u16> {
        let b1 = self.next()?;
        let b2 = self.next()?;

        Ok(u16::from_be_bytes([b1, b2]))
    }

    fn parse_i16(&mut self) -> DecodeResult<i16> {
        let b1 = self.next()?;
        let b2 = self.next()?;

        Ok(i16::from_be_bytes([b1, b2]))
    }

    fn parse_u32(&mut self) -> DecodeResult<u32> {
        let b1 = self.next()?;
        let b2 = self.next()?;
        let b3 = self.next()?;
        let b4 = self.next()?;

        Ok(u32::from_be_bytes([b1, b2, b3, b4]))
    }

    fn parse_i32(&mut self) -> DecodeResult<i32> {
        let b1 = self.next()?;
        let b2 = self.next()?;
        let b3 = self.next()?;
        let b4 = self.next()?;

        Ok(i32::from_be_bytes([b1, b2, b3, b4]))
    }

    /// Read a big-endian unsigned integer `offsize` bytes wide, as used by
    /// CFF INDEX offset arrays
    fn parse_offset(&mut self, offsize: u8) -> DecodeResult<u32> {
        Ok(match offsize {
            1 => self.next()? as u32,
            2 => self.parse_u16()? as u32,
            3 => {
                let b1 = self.next()?;
                let b2 = self.next()?;
                let b3 = self.next()?;

                u32::from_be_bytes([0, b1, b2, b3])
            }
            4 => self.parse_u32()?,
            _ => return Err(DecodeError::MalformedIndex),
        })
    }
}

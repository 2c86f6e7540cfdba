use crate::error::{Result, SaveError};

/// Little-endian reader over a borrowed byte slice.
///
/// Every read checks the remaining length first and fails with
/// [`SaveError::OutOfBounds`] instead of truncating.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn at(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    pub fn skip(&mut self, n: usize, context: &'static str) -> Result<()> {
        self.read_bytes(n, context).map(|_| ())
    }

    pub fn read_u8(&mut self, context: &'static str) -> Result<u8> {
        Ok(self.read_array::<1>(context)?[0])
    }

    pub fn read_u16(&mut self, context: &'static str) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array(context)?))
    }

    /// Reads a 3-byte little-endian integer.
    pub fn read_u24(&mut self, context: &'static str) -> Result<u32> {
        let [b0, b1, b2] = self.read_array(context)?;
        Ok(u32::from_le_bytes([b0, b1, b2, 0]))
    }

    pub fn read_u32(&mut self, context: &'static str) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array(context)?))
    }

    pub fn read_array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N]> {
        let slice = self.read_bytes(N, context)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<&'a [u8]> {
        let slice = slice_at(self.bytes, self.pos, n, context)?;
        self.pos += n;
        Ok(slice)
    }
}

/// Returns `bytes[offset..offset + n]` or an out-of-bounds error naming
/// `context`.
pub fn slice_at<'a>(
    bytes: &'a [u8],
    offset: usize,
    n: usize,
    context: &'static str,
) -> Result<&'a [u8]> {
    offset
        .checked_add(n)
        .filter(|&end| end <= bytes.len())
        .map(|end| &bytes[offset..end])
        .ok_or(SaveError::OutOfBounds {
            context,
            offset,
            needed: n,
            len: bytes.len(),
        })
}

pub fn read_u32_at(bytes: &[u8], offset: usize, context: &'static str) -> Result<u32> {
    ByteCursor::at(bytes, offset).read_u32(context)
}

pub fn read_u24_at(bytes: &[u8], offset: usize, context: &'static str) -> Result<u32> {
    ByteCursor::at(bytes, offset).read_u24(context)
}

pub fn write_u32_at(
    bytes: &mut [u8],
    offset: usize,
    value: u32,
    context: &'static str,
) -> Result<()> {
    write_at(bytes, offset, &value.to_le_bytes(), context)
}

/// Writes the low three bytes of `value`; values above `0xFF_FFFF` are
/// rejected rather than truncated.
pub fn write_u24_at(
    bytes: &mut [u8],
    offset: usize,
    value: u32,
    context: &'static str,
) -> Result<()> {
    if value > 0x00FF_FFFF {
        return Err(SaveError::mismatch(format!(
            "{context}: value {value} does not fit in 24 bits"
        )));
    }
    write_at(bytes, offset, &value.to_le_bytes()[..3], context)
}

fn write_at(bytes: &mut [u8], offset: usize, data: &[u8], context: &'static str) -> Result<()> {
    let len = bytes.len();
    let end = offset
        .checked_add(data.len())
        .filter(|&end| end <= len)
        .ok_or(SaveError::OutOfBounds {
            context,
            offset,
            needed: data.len(),
            len,
        })?;
    bytes[offset..end].copy_from_slice(data);
    Ok(())
}

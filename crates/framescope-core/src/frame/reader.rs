use super::error::FieldError;

/// Bounds-checked slicing of a frame buffer.
pub struct FrameReader<'a> {
    buffer: &'a [u8],
}

impl<'a> FrameReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn require_len(&self, needed: usize) -> Result<(), FieldError> {
        if self.buffer.len() < needed {
            return Err(FieldError::TooShort {
                needed,
                actual: self.buffer.len(),
            });
        }
        Ok(())
    }

    /// Slice of `size` bytes at `offset`; size 0 takes the remainder.
    pub fn read_field(&self, offset: usize, size: usize) -> Result<&'a [u8], FieldError> {
        if size == 0 {
            return self.read_slice(offset..self.buffer.len().max(offset));
        }
        let end = offset.checked_add(size).ok_or(FieldError::TooShort {
            needed: usize::MAX,
            actual: self.buffer.len(),
        })?;
        self.require_len(end)?;
        self.read_slice(offset..end)
    }

    pub fn read_slice(&self, range: std::ops::Range<usize>) -> Result<&'a [u8], FieldError> {
        self.buffer.get(range.clone()).ok_or(FieldError::TooShort {
            needed: range.end,
            actual: self.buffer.len(),
        })
    }
}

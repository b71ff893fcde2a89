use std::borrow::Cow;

use super::error::FrameError;

/// Raw frame input: bytes, or hex text converted to bytes before decoding.
///
/// Hex text is case-insensitive and may contain ASCII whitespace between
/// digits.
///
/// # Examples
/// ```
/// use framescope_core::RawInput;
///
/// let hex = RawInput::from("5a 00 64 FF");
/// assert_eq!(hex.to_bytes().unwrap().as_ref(), &[0x5A, 0x00, 0x64, 0xFF]);
/// ```
#[derive(Debug, Clone, Copy)]
pub enum RawInput<'a> {
    Bytes(&'a [u8]),
    Hex(&'a str),
}

impl<'a> RawInput<'a> {
    pub fn to_bytes(&self) -> Result<Cow<'a, [u8]>, FrameError> {
        match *self {
            RawInput::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
            RawInput::Hex(text) => {
                let compact: String = text
                    .chars()
                    .filter(|c| !c.is_ascii_whitespace())
                    .collect();
                Ok(Cow::Owned(hex::decode(compact)?))
            }
        }
    }
}

impl<'a> From<&'a [u8]> for RawInput<'a> {
    fn from(value: &'a [u8]) -> Self {
        RawInput::Bytes(value)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for RawInput<'a> {
    fn from(value: &'a [u8; N]) -> Self {
        RawInput::Bytes(value)
    }
}

impl<'a> From<&'a Vec<u8>> for RawInput<'a> {
    fn from(value: &'a Vec<u8>) -> Self {
        RawInput::Bytes(value)
    }
}

impl<'a> From<&'a str> for RawInput<'a> {
    fn from(value: &'a str) -> Self {
        RawInput::Hex(value)
    }
}

impl<'a> From<&'a String> for RawInput<'a> {
    fn from(value: &'a String) -> Self {
        RawInput::Hex(value)
    }
}

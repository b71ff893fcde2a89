use thiserror::Error;

/// Errors raised by a field codec while decoding, validating or formatting.
///
/// # Examples
/// ```
/// use framescope_core::CodecError;
///
/// let err = CodecError::custom("checksum table missing");
/// assert!(err.to_string().contains("checksum table missing"));
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("format {format} requires an integer value, got {value}")]
    NotInteger { format: &'static str, value: String },
    #[error("{0}")]
    Custom(String),
}

impl CodecError {
    pub fn custom(message: impl Into<String>) -> Self {
        CodecError::Custom(message.into())
    }
}

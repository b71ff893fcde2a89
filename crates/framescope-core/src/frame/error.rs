use thiserror::Error;

use crate::field::error::CodecError;

/// Errors raised while building a [`FrameSpec`](crate::FrameSpec); the frame
/// is never usable after one of these.
///
/// # Examples
/// ```
/// use framescope_core::LayoutError;
///
/// let err = LayoutError::OverlappingBits { field: "STATUS".to_string(), position: 3 };
/// assert!(err.to_string().contains("bit 3"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("bit field '{bit}' of '{field}' must span at least one bit")]
    EmptyBitField { field: String, bit: String },
    #[error("overlapping bit positions in '{field}': bit {position} is claimed twice")]
    OverlappingBits { field: String, position: u32 },
    #[error("bit position {position} overflows '{field}' ({width} bits wide)")]
    BitOutOfRange {
        field: String,
        position: u64,
        width: usize,
    },
    #[error("bit field '{bit}' of '{field}' spans {length} bits; at most 128 are read")]
    BitFieldTooLong {
        field: String,
        bit: String,
        length: u32,
    },
    #[error("duplicate field label '{label}'")]
    DuplicateLabel { label: String },
}

/// Failure of a single field within one decode call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("slice runs past buffer end: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Errors that abort one decode call; the frame stays usable.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("invalid hex input: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("incorrect processing of field '{label}': {source}")]
    Field {
        label: String,
        #[source]
        source: FieldError,
    },
}

impl FrameError {
    pub(crate) fn field(label: &str, source: impl Into<FieldError>) -> Self {
        FrameError::Field {
            label: label.to_string(),
            source: source.into(),
        }
    }

    /// Label of the field that failed, if any.
    pub fn label(&self) -> Option<&str> {
        match self {
            FrameError::Field { label, .. } => Some(label),
            FrameError::InvalidHex(_) => None,
        }
    }
}

//! framescope core library for decoding fixed-layout binary frames.
//!
//! A frame is declared once as an ordered list of [`FieldSpec`]s (label,
//! byte size, byte order, bounds, display format, optional bit sub-fields)
//! and built into a [`FrameSpec`]. Decoding applies that declaration to a raw
//! buffer and yields per-field values, validity flags and text; a
//! [`FrameDecoder`] adds error counters that persist across decodes until
//! cleared. Table rendering is left to the caller: the core only produces an
//! ordered row stream.
//!
//! Invariants:
//! - `offset(field[0]) = 0` and each offset is the previous offset plus the
//!   previous size.
//! - Bit sub-fields of one field are disjoint and inside its bit width; this
//!   is checked when the frame is built, never during decoding.
//! - Field bounds are inclusive, bit-field bounds are exclusive.
//! - Error counters only grow until explicitly cleared.
//!
//! Version française (résumé):
//! La crate décode des trames binaires à disposition fixe : description des
//! champs -> `FrameSpec` (offsets, bits vérifiés) -> décodage pur -> lignes de
//! rapport. Les compteurs d'erreurs appartiennent à l'appelant
//! (`FrameDecoder`). Bornes inclusives pour les champs, exclusives pour les
//! champs de bits.
//!
//! # Examples
//! ```
//! use framescope_core::{FieldSpec, Format, FrameDecoder, FrameOptions, FrameSpec};
//!
//! let frame = FrameSpec::new(
//!     "my_frame",
//!     vec![
//!         FieldSpec::new("FIELD_1", 1).with_format(Format::Hex).with_bounds(0.0, 90.0),
//!         FieldSpec::new("FIELD_2", 2).with_format(Format::Hex),
//!         FieldSpec::new("CRC8", 1).with_format(Format::Hex),
//!     ],
//!     FrameOptions::default(),
//! )?;
//!
//! let mut decoder = FrameDecoder::new(&frame);
//! let report = decoder.decode("5B 00 64 FF")?;
//! assert_eq!(report.rows[0].value, "0x5B");
//! assert!(!report.rows[0].is_ok);
//! assert_eq!(report.rows[0].err_cnt, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod config;
mod decoder;
mod field;
mod frame;
mod subframe;

pub use config::{BitConfig, ConfigError, FieldConfig, FieldEntry, FrameConfig, GroupConfig};
pub use decoder::{CounterKey, ErrorCounters, FrameDecoder};
pub use field::bits::{BitDisplay, BitField, BitFlag, BitReading, BitSpec, BitTransform};
pub use field::codec::{
    DefaultCodec, FieldCodec, Value, decode_integer, format_value, within_bounds,
};
pub use field::error::CodecError;
pub use field::{ByteOrder, FieldSpec, Format};
pub use frame::error::{FieldError, FrameError, LayoutError};
pub use frame::input::RawInput;
pub use frame::layout::LayoutEntry;
pub use frame::parser::{DecodedField, DecodedFrame};
pub use frame::{BitOverride, FrameOptions, FrameSpec, HeaderMode};
pub use subframe::SubFrame;

/// Generic first column header.
pub const HEADER_NAME: &str = "Name";
pub const HEADER_VALUE: &str = "Value";
pub const HEADER_IS_OK: &str = "IsOK";
pub const HEADER_ERR_CNT: &str = "ErrCnt";

/// Non-fatal condition observed while decoding.
///
/// # Examples
/// ```
/// use framescope_core::Diagnostic;
///
/// let diagnostic = Diagnostic::SizeMismatch { expected: 18, actual: 6 };
/// assert_eq!(
///     diagnostic.to_string(),
///     "frame size (18) and raw data (6) are different"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Buffer length differs from the declared full size.
    SizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::SizeMismatch { expected, actual } => write!(
                f,
                "frame size ({expected}) and raw data ({actual}) are different"
            ),
        }
    }
}

/// One report row: a field, or a bit sub-field following its field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub label: String,
    pub value: String,
    pub is_ok: bool,
    pub err_cnt: u64,
}

impl ReportRow {
    pub fn as_tuple(&self) -> (&str, &str, bool, u64) {
        (&self.label, &self.value, self.is_ok, self.err_cnt)
    }
}

/// Ordered row stream of one decode call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Frame type name.
    pub frame_type: String,
    /// Column headers: `Name` or the type name, then `Value`, `IsOK`, `ErrCnt`.
    pub header: [String; 4],
    pub rows: Vec<ReportRow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Diagnostic attached to one input of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowDiagnostic {
    pub row: usize,
    pub diagnostic: Diagnostic,
}

/// Aligned tables produced by [`FrameSpec::decode_many`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTable {
    /// Included field labels.
    pub columns: Vec<String>,
    /// Formatted text, one row per input.
    pub values: Vec<Vec<String>>,
    /// Validity, aligned with `values`.
    pub validity: Vec<Vec<bool>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<RowDiagnostic>,
}

//! Field descriptors.
//!
//! A [`FieldSpec`] declares one fixed-position field of a frame: its size,
//! byte order, signedness, inclusive bounds, display format and optional bit
//! sub-fields. Decoding behavior is delegated to a [`FieldCodec`]; the
//! descriptor itself is immutable and carries no per-decode state.
//!
//! Layers mirror the frame module:
//! - `reader`: integer extraction with byte-order conventions
//! - `codec`: decode/validate/format capability and its default
//! - `bits`: single-bit flags and multi-bit groups
//! - `error`: codec errors

pub mod bits;
pub mod codec;
pub mod error;
pub mod reader;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use bits::BitSpec;
use codec::{DefaultCodec, FieldCodec};

/// Byte order used to read a field as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    #[default]
    Big,
    Little,
}

/// Display format of a field value.
///
/// Formats parse from the short notation used in layout files: `d`, `5d`,
/// `X`, `b`, `f`, `.2f`. Hex is always upper-case with a `0x` prefix, so a
/// lower-case `x` is rejected.
///
/// # Examples
/// ```
/// use framescope_core::Format;
///
/// assert_eq!("X".parse::<Format>().unwrap(), Format::Hex);
/// assert_eq!(".2f".parse::<Format>().unwrap(), Format::Float { precision: 2 });
/// assert_eq!(Format::Binary.prefix(), "0b");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Format {
    /// Decimal, right-aligned to `width` characters (0 disables padding).
    Decimal { width: usize },
    /// Upper-case hex, zero-padded to two digits per byte.
    Hex,
    /// Binary, zero-padded to eight digits per byte.
    Binary,
    /// Fixed-precision float.
    Float { precision: usize },
}

/// Float precision used when a decimal format meets a fractional value.
pub const DEFAULT_FLOAT_PRECISION: usize = 6;

impl Default for Format {
    fn default() -> Self {
        Format::Decimal { width: 0 }
    }
}

impl Format {
    pub fn prefix(&self) -> &'static str {
        match self {
            Format::Hex => "0x",
            Format::Binary => "0b",
            Format::Decimal { .. } | Format::Float { .. } => "",
        }
    }

    /// Zero-padding width for a field of `size` bytes (hex/binary only).
    pub fn digits(&self, size: usize) -> usize {
        match self {
            Format::Hex => size * 2,
            Format::Binary => size * 8,
            Format::Decimal { .. } | Format::Float { .. } => 0,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Format::Decimal { .. } => "decimal",
            Format::Hex => "hex",
            Format::Binary => "binary",
            Format::Float { .. } => "float",
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.contains('X') {
            return Ok(Format::Hex);
        }
        if s.contains('x') {
            return Err(format!("lower-case hex '{s}' is not supported, use 'X'"));
        }
        if s.contains('b') {
            return Ok(Format::Binary);
        }
        if let Some(spec) = s.strip_suffix('f') {
            let precision = match spec.strip_prefix('.') {
                Some(digits) => digits
                    .parse()
                    .map_err(|_| format!("invalid float precision in '{s}'"))?,
                None if spec.is_empty() => DEFAULT_FLOAT_PRECISION,
                None => return Err(format!("invalid float format '{s}'")),
            };
            return Ok(Format::Float { precision });
        }
        let width = s.strip_suffix('d').unwrap_or(s);
        if width.is_empty() {
            return Ok(Format::Decimal { width: 0 });
        }
        width
            .parse()
            .map(|width| Format::Decimal { width })
            .map_err(|_| format!("unknown format '{s}'"))
    }
}

impl TryFrom<String> for Format {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Decimal { width: 0 } => write!(f, "d"),
            Format::Decimal { width } => write!(f, "{width}d"),
            Format::Hex => write!(f, "X"),
            Format::Binary => write!(f, "b"),
            Format::Float { precision } => write!(f, ".{precision}f"),
        }
    }
}

impl From<Format> for String {
    fn from(value: Format) -> Self {
        value.to_string()
    }
}

/// Descriptor for one fixed-position field of a frame.
///
/// # Examples
/// ```
/// use framescope_core::{ByteOrder, FieldSpec, Format};
///
/// let field = FieldSpec::new("TEMP", 2)
///     .with_format(Format::Hex)
///     .with_byte_order(ByteOrder::Little)
///     .with_bounds(0.0, 500.0);
/// assert_eq!(field.prefix(), "0x");
/// assert_eq!(field.size(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct FieldSpec {
    label: String,
    size: usize,
    byte_order: Option<ByteOrder>,
    signed: bool,
    min_value: f64,
    max_value: f64,
    format: Format,
    bits: Vec<BitSpec>,
    codec: Arc<dyn FieldCodec>,
}

impl FieldSpec {
    /// A field of `size` bytes; size 0 consumes the rest of the buffer.
    pub fn new(label: impl Into<String>, size: usize) -> Self {
        Self {
            label: label.into(),
            size,
            byte_order: None,
            signed: false,
            min_value: f64::NEG_INFINITY,
            max_value: f64::INFINITY,
            format: Format::default(),
            bits: Vec::new(),
            codec: Arc::new(DefaultCodec),
        }
    }

    /// Trailing field consuming every remaining byte.
    pub fn remainder(label: impl Into<String>) -> Self {
        Self::new(label, 0)
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = Some(order);
        self
    }

    pub fn with_signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    /// Inclusive bounds checked by the default validator.
    pub fn with_bounds(mut self, min_value: f64, max_value: f64) -> Self {
        self.min_value = min_value;
        self.max_value = max_value;
        self
    }

    pub fn with_min(mut self, min_value: f64) -> Self {
        self.min_value = min_value;
        self
    }

    pub fn with_max(mut self, max_value: f64) -> Self {
        self.max_value = max_value;
        self
    }

    pub fn with_bit(mut self, bit: impl Into<BitSpec>) -> Self {
        self.bits.push(bit.into());
        self
    }

    pub fn with_bits<I, B>(mut self, bits: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<BitSpec>,
    {
        self.bits.extend(bits.into_iter().map(Into::into));
        self
    }

    pub fn with_codec(mut self, codec: impl FieldCodec + 'static) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn consumes_remainder(&self) -> bool {
        self.size == 0
    }

    /// Effective byte order; unset fields read as big-endian until a frame
    /// assigns its default.
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order.unwrap_or_default()
    }

    /// Byte order as declared, before frame defaults apply.
    pub fn declared_byte_order(&self) -> Option<ByteOrder> {
        self.byte_order
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn prefix(&self) -> &'static str {
        self.format.prefix()
    }

    pub fn bits(&self) -> &[BitSpec] {
        &self.bits
    }

    pub fn codec(&self) -> &dyn FieldCodec {
        self.codec.as_ref()
    }

    pub(crate) fn bits_mut(&mut self) -> &mut [BitSpec] {
        &mut self.bits
    }

    pub(crate) fn set_label(&mut self, label: String) {
        self.label = label;
    }

    pub(crate) fn inherit_byte_order(&mut self, order: ByteOrder) {
        if self.byte_order.is_none() {
            self.byte_order = Some(order);
        }
    }
}

use std::fmt;

use num_bigint::BigInt;
use num_bigint::Sign::Minus;
use num_traits::ToPrimitive;

use super::error::CodecError;
use super::reader::IntReader;
use super::{DEFAULT_FLOAT_PRECISION, FieldSpec, Format};

/// Decoded value of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unsigned(u128),
    Signed(i128),
    /// Integer read from a slice wider than 16 bytes.
    Wide(BigInt),
    Float(f64),
    Text(String),
}

impl Value {
    /// Numeric view used for bounds checks; `None` for non-numeric values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Unsigned(v) => Some(*v as f64),
            Value::Signed(v) => Some(*v as f64),
            Value::Wide(v) => v.to_f64(),
            Value::Float(v) => Some(*v),
            Value::Text(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unsigned(v) => write!(f, "{v}"),
            Value::Signed(v) => write!(f, "{v}"),
            Value::Wide(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v}"),
        }
    }
}

/// Decode/validate/format capability attached to a field.
///
/// Every method defaults to the standard behavior, so an implementation only
/// overrides what it changes.
///
/// # Examples
/// ```
/// use framescope_core::{CodecError, FieldCodec, FieldSpec, Value};
///
/// #[derive(Debug)]
/// struct Ascii;
///
/// impl FieldCodec for Ascii {
///     fn decode(&self, _field: &FieldSpec, raw: &[u8]) -> Result<Value, CodecError> {
///         Ok(Value::Text(String::from_utf8_lossy(raw).into_owned()))
///     }
/// }
///
/// let field = FieldSpec::new("NAME", 4).with_codec(Ascii);
/// let value = field.codec().decode(&field, b"ABCD").unwrap();
/// assert_eq!(field.codec().format(&field, &value).unwrap(), "ABCD");
/// ```
pub trait FieldCodec: fmt::Debug + Send + Sync {
    fn decode(&self, field: &FieldSpec, raw: &[u8]) -> Result<Value, CodecError> {
        Ok(decode_integer(field, raw))
    }

    /// `Err` is treated as a pass by the frame decoder.
    fn validate(&self, field: &FieldSpec, value: &Value) -> Result<bool, CodecError> {
        Ok(within_bounds(field, value))
    }

    fn format(&self, field: &FieldSpec, value: &Value) -> Result<String, CodecError> {
        format_value(field, value)
    }
}

/// Integer decoding with the field's byte order and signedness.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCodec;

impl FieldCodec for DefaultCodec {}

pub fn decode_integer(field: &FieldSpec, raw: &[u8]) -> Value {
    let reader = IntReader::new(raw, field.byte_order());
    match (reader.fits(), field.is_signed()) {
        (true, true) => Value::Signed(reader.read_signed()),
        (true, false) => Value::Unsigned(reader.read_unsigned()),
        (false, true) => Value::Wide(reader.read_wide_signed()),
        (false, false) => Value::Wide(BigInt::from(reader.read_wide_unsigned())),
    }
}

/// Inclusive `min <= value <= max`; non-numeric values always pass.
pub fn within_bounds(field: &FieldSpec, value: &Value) -> bool {
    match value.as_f64() {
        Some(v) => field.min_value() <= v && v <= field.max_value(),
        None => true,
    }
}

pub fn format_value(field: &FieldSpec, value: &Value) -> Result<String, CodecError> {
    let format = field.format();
    let digits = format.digits(field.size());
    let text = match (format, value) {
        (_, Value::Text(text)) => text.clone(),
        (Format::Decimal { width }, Value::Unsigned(v)) => format!("{v:>width$}"),
        (Format::Decimal { width }, Value::Signed(v)) => format!("{v:>width$}"),
        (Format::Decimal { width }, Value::Wide(v)) => format!("{v:>width$}"),
        (Format::Decimal { width }, Value::Float(v)) => {
            let precision = DEFAULT_FLOAT_PRECISION;
            format!("{v:>width$.precision$}")
        }
        (Format::Float { precision }, Value::Float(v)) => format!("{v:.precision$}"),
        (Format::Float { precision }, integer) => {
            let v = integer.as_f64().unwrap_or(f64::NAN);
            format!("{v:.precision$}")
        }
        (Format::Hex, Value::Unsigned(v)) => format!("0x{v:0digits$X}"),
        (Format::Hex, Value::Signed(v)) => {
            format!("{}0x{:0digits$X}", sign(*v < 0), v.unsigned_abs())
        }
        (Format::Hex, Value::Wide(v)) => {
            format!("{}0x{:0digits$X}", sign(v.sign() == Minus), v.magnitude())
        }
        (Format::Binary, Value::Unsigned(v)) => format!("0b{v:0digits$b}"),
        (Format::Binary, Value::Signed(v)) => {
            format!("{}0b{:0digits$b}", sign(*v < 0), v.unsigned_abs())
        }
        (Format::Binary, Value::Wide(v)) => {
            format!("{}0b{:0digits$b}", sign(v.sign() == Minus), v.magnitude())
        }
        (Format::Hex | Format::Binary, Value::Float(v)) => {
            return Err(CodecError::NotInteger {
                format: format.name(),
                value: v.to_string(),
            });
        }
    };
    Ok(text)
}

fn sign(negative: bool) -> &'static str {
    if negative { "-" } else { "" }
}

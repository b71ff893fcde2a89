use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// Whether a bit sub-field row is emitted when it is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BitDisplay {
    Always,
    OnError,
}

/// Value-to-text mapping for a [`BitField`].
#[derive(Clone)]
pub struct BitTransform(Arc<dyn Fn(u128) -> String + Send + Sync>);

impl BitTransform {
    pub fn new(f: impl Fn(u128) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Lookup table; unmapped values render as their number.
    pub fn from_names(names: BTreeMap<u128, String>) -> Self {
        Self::new(move |value| {
            names
                .get(&value)
                .cloned()
                .unwrap_or_else(|| value.to_string())
        })
    }

    pub fn apply(&self, value: u128) -> String {
        (self.0)(value)
    }
}

impl fmt::Debug for BitTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BitTransform(..)")
    }
}

/// Single-bit sub-field with an expected state.
#[derive(Debug, Clone)]
pub struct BitFlag {
    pos: u32,
    label: String,
    expected: bool,
    display: BitDisplay,
}

impl BitFlag {
    /// Flags only show up in reports when they are not in the expected state.
    pub fn new(pos: u32, label: impl Into<String>, expected: bool) -> Self {
        Self {
            pos,
            label: label.into(),
            expected,
            display: BitDisplay::OnError,
        }
    }

    pub fn with_display(mut self, display: BitDisplay) -> Self {
        self.display = display;
        self
    }

    pub fn pos(&self) -> u32 {
        self.pos
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn expected(&self) -> bool {
        self.expected
    }

    pub fn display(&self) -> BitDisplay {
        self.display
    }

    pub fn extract(&self, word: &BigUint) -> BitReading {
        let value = u128::from(word.bit(u64::from(self.pos)));
        let is_valid = value == u128::from(self.expected);
        BitReading {
            label: format!("    $[{}]{}", self.pos, self.label),
            value,
            is_valid,
            text: value.to_string(),
            shown: self.display == BitDisplay::Always || !is_valid,
        }
    }
}

/// Multi-bit sub-field with exclusive bounds.
#[derive(Debug, Clone)]
pub struct BitField {
    pos: u32,
    label: String,
    length: u32,
    min_value: f64,
    max_value: f64,
    display: BitDisplay,
    transform: Option<BitTransform>,
}

impl BitField {
    /// Groups are always reported; a zero `length` is rejected when the
    /// owning frame is built.
    pub fn new(pos: u32, label: impl Into<String>, length: u32) -> Self {
        Self {
            pos,
            label: label.into(),
            length,
            min_value: f64::NEG_INFINITY,
            max_value: f64::INFINITY,
            display: BitDisplay::Always,
            transform: None,
        }
    }

    /// Exclusive bounds: valid iff `min < value < max`.
    pub fn with_bounds(mut self, min_value: f64, max_value: f64) -> Self {
        self.min_value = min_value;
        self.max_value = max_value;
        self
    }

    pub fn with_display(mut self, display: BitDisplay) -> Self {
        self.display = display;
        self
    }

    pub fn with_transform(mut self, transform: BitTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn pos(&self) -> u32 {
        self.pos
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    pub fn display(&self) -> BitDisplay {
        self.display
    }

    /// `length` is at most 128 bits once the owning frame is built.
    pub fn extract(&self, word: &BigUint) -> BitReading {
        let value = window(word, self.pos) & low_mask(self.length);
        let numeric = value as f64;
        let is_valid = self.min_value < numeric && numeric < self.max_value;
        let text = match &self.transform {
            Some(transform) => transform.apply(value),
            None => value.to_string(),
        };
        BitReading {
            label: format!(
                "    $[{}:{}]{}",
                self.pos,
                u64::from(self.pos) + u64::from(self.length),
                self.label
            ),
            value,
            is_valid,
            text,
            shown: self.display == BitDisplay::Always || !is_valid,
        }
    }
}

/// Bit sub-field of a [`FieldSpec`](crate::FieldSpec).
#[derive(Debug, Clone)]
pub enum BitSpec {
    Flag(BitFlag),
    Field(BitField),
}

impl From<BitFlag> for BitSpec {
    fn from(value: BitFlag) -> Self {
        BitSpec::Flag(value)
    }
}

impl From<BitField> for BitSpec {
    fn from(value: BitField) -> Self {
        BitSpec::Field(value)
    }
}

impl BitSpec {
    pub fn label(&self) -> &str {
        match self {
            BitSpec::Flag(flag) => flag.label(),
            BitSpec::Field(field) => field.label(),
        }
    }

    /// First bit and number of bits occupied.
    pub fn span(&self) -> (u32, u32) {
        match self {
            BitSpec::Flag(flag) => (flag.pos, 1),
            BitSpec::Field(field) => (field.pos, field.length),
        }
    }

    pub fn display(&self) -> BitDisplay {
        match self {
            BitSpec::Flag(flag) => flag.display,
            BitSpec::Field(field) => field.display,
        }
    }

    /// Read this sub-field from the whole field read as one integer.
    pub fn extract(&self, word: &BigUint) -> BitReading {
        match self {
            BitSpec::Flag(flag) => flag.extract(word),
            BitSpec::Field(field) => field.extract(word),
        }
    }

    pub(crate) fn set_display(&mut self, display: BitDisplay) {
        match self {
            BitSpec::Flag(flag) => flag.display = display,
            BitSpec::Field(field) => field.display = display,
        }
    }
}

/// Result of extracting one bit sub-field.
#[derive(Debug, Clone, PartialEq)]
pub struct BitReading {
    /// Indented report label, e.g. `    $[3]READY`.
    pub label: String,
    pub value: u128,
    pub is_valid: bool,
    pub text: String,
    /// Whether the display policy emits a report row.
    pub shown: bool,
}

/// Low 128 bits of `word >> pos`.
fn window(word: &BigUint, pos: u32) -> u128 {
    let shifted = word >> pos;
    let mut digits = shifted.iter_u64_digits();
    let low = digits.next().unwrap_or(0);
    let high = digits.next().unwrap_or(0);
    (u128::from(high) << 64) | u128::from(low)
}

fn low_mask(length: u32) -> u128 {
    if length >= u128::BITS {
        u128::MAX
    } else {
        (1u128 << length) - 1
    }
}

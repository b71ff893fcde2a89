//! Frame layouts and decoding.
//!
//! A [`FrameSpec`] is an ordered list of [`FieldSpec`]s normalized once at
//! construction: byte orders are resolved against the frame default, bit
//! sub-field placement is checked, offsets and the label index are computed.
//! Decoding is then a pure transform from a buffer to a [`DecodedFrame`].
//!
//! Layers:
//! - `layout`: offsets, placement checks and the layout dump
//! - `reader`: bounds-checked slicing of the input buffer
//! - `parser`: per-field decode/validate/format and bit extraction
//! - `batch`: one-row-per-buffer tables
//! - `input`: byte or hex input
//! - `error`: construction and decode errors
//!
//! Version française (résumé):
//! `FrameSpec` normalise les champs à la construction (ordre des octets,
//! positions des bits, offsets) puis décode sans état ; les compteurs
//! d'erreurs sont tenus par l'appelant (`ErrorCounters`).

pub mod batch;
pub mod error;
pub mod input;
pub mod layout;
pub mod parser;
pub mod reader;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::field::bits::BitDisplay;
use crate::field::{ByteOrder, FieldSpec};
use crate::{HEADER_ERR_CNT, HEADER_IS_OK, HEADER_NAME, HEADER_VALUE};

use error::LayoutError;
use layout::LayoutEntry;

/// First report column: the literal `Name` or the frame type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeaderMode {
    Generic,
    #[default]
    TypeName,
}

/// Frame-wide override of bit sub-field display policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BitOverride {
    /// Each sub-field keeps its own policy.
    #[default]
    Auto,
    /// Every sub-field row is emitted.
    Always,
}

/// Frame-level construction options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameOptions {
    pub byte_order: ByteOrder,
    pub header: HeaderMode,
    pub show_bits: BitOverride,
}

impl FrameOptions {
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    pub fn with_header(mut self, header: HeaderMode) -> Self {
        self.header = header;
        self
    }

    pub fn with_show_bits(mut self, show_bits: BitOverride) -> Self {
        self.show_bits = show_bits;
        self
    }
}

/// Ordered set of fields describing a whole message layout.
///
/// # Examples
/// ```
/// use framescope_core::{FieldSpec, Format, FrameOptions, FrameSpec};
///
/// let frame = FrameSpec::new(
///     "status",
///     vec![
///         FieldSpec::new("FIELD_1", 1).with_format(Format::Hex).with_bounds(0.0, 90.0),
///         FieldSpec::new("FIELD_2", 2).with_format(Format::Hex),
///         FieldSpec::new("CRC8", 1).with_format(Format::Hex),
///     ],
///     FrameOptions::default(),
/// )?;
/// assert_eq!(frame.full_size(), 4);
/// assert_eq!(frame.offset_of("CRC8"), Some(3));
/// # Ok::<(), framescope_core::LayoutError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FrameSpec {
    type_name: String,
    fields: Vec<FieldSpec>,
    offsets: Vec<usize>,
    index: HashMap<String, usize>,
    full_size: usize,
    options: FrameOptions,
}

impl FrameSpec {
    pub fn new(
        type_name: impl Into<String>,
        fields: impl IntoIterator<Item = FieldSpec>,
        options: FrameOptions,
    ) -> Result<Self, LayoutError> {
        let mut fields: Vec<FieldSpec> = fields.into_iter().collect();
        for field in &mut fields {
            field.inherit_byte_order(options.byte_order);
            if options.show_bits == BitOverride::Always {
                for bit in field.bits_mut() {
                    bit.set_display(BitDisplay::Always);
                }
            }
            layout::check_bit_placement(field)?;
        }
        let index = layout::index_labels(&fields)?;
        let offsets = layout::compute_offsets(&fields);
        let full_size = fields.iter().map(FieldSpec::size).sum();

        Ok(Self {
            type_name: type_name.into(),
            fields,
            offsets,
            index,
            full_size,
            options,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, label: &str) -> Option<&FieldSpec> {
        self.index_of(label).map(|i| &self.fields[i])
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn offset_of(&self, label: &str) -> Option<usize> {
        self.index_of(label).map(|i| self.offsets[i])
    }

    /// Sum of declared sizes; remainder fields count as 0.
    pub fn full_size(&self) -> usize {
        self.full_size
    }

    pub fn options(&self) -> FrameOptions {
        self.options
    }

    /// Column headers of a single-frame report.
    pub fn header(&self) -> [&str; 4] {
        let first = match self.options.header {
            HeaderMode::Generic => HEADER_NAME,
            HeaderMode::TypeName => self.type_name.as_str(),
        };
        [first, HEADER_VALUE, HEADER_IS_OK, HEADER_ERR_CNT]
    }

    pub fn layout(&self) -> Vec<LayoutEntry> {
        self.fields
            .iter()
            .zip(&self.offsets)
            .map(|(field, offset)| LayoutEntry {
                label: field.label().to_string(),
                size: field.size(),
                offset: *offset,
            })
            .collect()
    }
}

impl fmt::Display for FrameSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&layout::render_layout(&self.layout(), self.full_size))
    }
}

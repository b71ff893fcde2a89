use std::collections::HashMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::error::LayoutError;
use crate::field::FieldSpec;

/// One line of the layout dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutEntry {
    pub label: String,
    pub size: usize,
    pub offset: usize,
}

/// Cumulative offsets: the first field starts at 0, each following field
/// starts where the previous one ends.
pub(crate) fn compute_offsets(fields: &[FieldSpec]) -> Vec<usize> {
    fields
        .iter()
        .scan(0usize, |next, field| {
            let offset = *next;
            *next += field.size();
            Some(offset)
        })
        .collect()
}

/// Bit sub-fields must be non-empty, pairwise disjoint and inside the
/// field's bit width. A remainder field has no width, so it cannot carry bits.
pub(crate) fn check_bit_placement(field: &FieldSpec) -> Result<(), LayoutError> {
    if field.bits().is_empty() {
        return Ok(());
    }
    let width = field.size() * 8;
    let mut occupied = vec![false; width];
    for bit in field.bits() {
        let (pos, length) = bit.span();
        if length == 0 {
            return Err(LayoutError::EmptyBitField {
                field: field.label().to_string(),
                bit: bit.label().to_string(),
            });
        }
        if length > u128::BITS {
            return Err(LayoutError::BitFieldTooLong {
                field: field.label().to_string(),
                bit: bit.label().to_string(),
                length,
            });
        }
        let last = u64::from(pos) + u64::from(length) - 1;
        if last >= width as u64 {
            return Err(LayoutError::BitOutOfRange {
                field: field.label().to_string(),
                position: last,
                width,
            });
        }
        for position in pos..pos + length {
            let slot = &mut occupied[position as usize];
            if *slot {
                return Err(LayoutError::OverlappingBits {
                    field: field.label().to_string(),
                    position,
                });
            }
            *slot = true;
        }
    }
    Ok(())
}

pub(crate) fn index_labels(fields: &[FieldSpec]) -> Result<HashMap<String, usize>, LayoutError> {
    let mut index = HashMap::with_capacity(fields.len());
    for (i, field) in fields.iter().enumerate() {
        if index.insert(field.label().to_string(), i).is_some() {
            return Err(LayoutError::DuplicateLabel {
                label: field.label().to_string(),
            });
        }
    }
    Ok(index)
}

pub(crate) fn render_layout(entries: &[LayoutEntry], full_size: usize) -> String {
    let label_width = entries
        .iter()
        .map(|entry| entry.label.len())
        .chain(std::iter::once("Label".len()))
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    let _ = writeln!(out, "{:<label_width$}  {:>6}  {:>6}", "Label", "Size", "Offset");
    for entry in entries {
        let _ = writeln!(
            out,
            "{:<label_width$}  {:>6}  {:>6}",
            entry.label, entry.size, entry.offset
        );
    }
    let _ = write!(out, "Full size: {full_size}");
    out
}

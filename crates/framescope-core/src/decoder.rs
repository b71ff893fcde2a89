//! Persistent error accounting.
//!
//! Frame specs are immutable; counters live with the caller so that several
//! decoders can share one spec without racing on its state.

use std::collections::BTreeMap;

use crate::frame::error::FrameError;
use crate::frame::input::RawInput;
use crate::frame::parser::DecodedFrame;
use crate::{BatchTable, FrameReport, FrameSpec, ReportRow};

/// Identity of a counted entity within one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CounterKey {
    /// Field by declaration index.
    Field(usize),
    /// Bit sub-field by owning field index and sub-field index.
    Bit { field: usize, bit: usize },
}

/// Keyed store of validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorCounters {
    counts: BTreeMap<CounterKey, u64>,
}

impl ErrorCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: CounterKey) -> u64 {
        self.counts.get(&key).copied().unwrap_or(0)
    }

    pub fn increment(&mut self, key: CounterKey) -> u64 {
        let count = self.counts.entry(key).or_default();
        *count += 1;
        *count
    }

    /// Count every invalid field and bit sub-field of one decode.
    pub fn record(&mut self, decoded: &DecodedFrame) {
        for field in &decoded.fields {
            if !field.is_valid {
                self.increment(CounterKey::Field(field.index));
            }
            for (bit, reading) in field.bits.iter().enumerate() {
                if !reading.is_valid {
                    self.increment(CounterKey::Bit {
                        field: field.index,
                        bit,
                    });
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Non-zero counters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (CounterKey, u64)> + '_ {
        self.counts.iter().map(|(key, count)| (*key, *count))
    }
}

/// Decoder over a shared [`FrameSpec`] with its own error counters.
///
/// # Examples
/// ```
/// use framescope_core::{FieldSpec, FrameDecoder, FrameOptions, FrameSpec};
///
/// let frame = FrameSpec::new(
///     "t",
///     vec![FieldSpec::new("A", 1).with_max(9.0)],
///     FrameOptions::default(),
/// )?;
/// let mut decoder = FrameDecoder::new(&frame);
/// decoder.decode(&[10u8])?;
/// decoder.decode(&[10u8])?;
/// assert_eq!(decoder.error_count("A"), Some(2));
/// decoder.clear_errors();
/// assert_eq!(decoder.error_count("A"), Some(0));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct FrameDecoder<'a> {
    spec: &'a FrameSpec,
    counters: ErrorCounters,
}

impl<'a> FrameDecoder<'a> {
    pub fn new(spec: &'a FrameSpec) -> Self {
        Self {
            spec,
            counters: ErrorCounters::new(),
        }
    }

    pub fn spec(&self) -> &'a FrameSpec {
        self.spec
    }

    pub fn counters(&self) -> &ErrorCounters {
        &self.counters
    }

    /// Decode one buffer and update the counters; a failed call leaves them
    /// untouched.
    pub fn decode_frame<'i>(
        &mut self,
        input: impl Into<RawInput<'i>>,
    ) -> Result<DecodedFrame, FrameError> {
        let decoded = self.spec.decode(input)?;
        self.counters.record(&decoded);
        Ok(decoded)
    }

    /// Decode one buffer into report rows.
    pub fn decode<'i>(&mut self, input: impl Into<RawInput<'i>>) -> Result<FrameReport, FrameError> {
        let decoded = self.decode_frame(input)?;
        Ok(self.report(&decoded))
    }

    /// Report rows for an already decoded frame using the current counters.
    ///
    /// Bit sub-field rows follow their field and are skipped when their
    /// display policy hides them.
    pub fn report(&self, decoded: &DecodedFrame) -> FrameReport {
        let mut rows = Vec::with_capacity(decoded.fields.len());
        for field in &decoded.fields {
            rows.push(ReportRow {
                label: field.label.clone(),
                value: field.text.clone(),
                is_ok: field.is_valid,
                err_cnt: self.counters.get(CounterKey::Field(field.index)),
            });
            for (bit, reading) in field.bits.iter().enumerate() {
                if !reading.shown {
                    continue;
                }
                rows.push(ReportRow {
                    label: reading.label.clone(),
                    value: reading.text.clone(),
                    is_ok: reading.is_valid,
                    err_cnt: self.counters.get(CounterKey::Bit {
                        field: field.index,
                        bit,
                    }),
                });
            }
        }

        FrameReport {
            frame_type: self.spec.type_name().to_string(),
            header: self.spec.header().map(str::to_string),
            rows,
            diagnostics: decoded.diagnostics.clone(),
        }
    }

    /// Batch decode; counters are not affected.
    pub fn decode_many<'i, I, R, S>(&self, inputs: I, excluded: &[S]) -> Result<BatchTable, FrameError>
    where
        I: IntoIterator<Item = R>,
        R: Into<RawInput<'i>>,
        S: AsRef<str>,
    {
        self.spec.decode_many(inputs, excluded)
    }

    pub fn clear_errors(&mut self) {
        self.counters.clear();
    }

    pub fn error_count(&self, label: &str) -> Option<u64> {
        self.spec
            .index_of(label)
            .map(|index| self.counters.get(CounterKey::Field(index)))
    }

    /// Counter of the bit sub-field `bit_label` inside field `label`.
    pub fn bit_error_count(&self, label: &str, bit_label: &str) -> Option<u64> {
        let field = self.spec.index_of(label)?;
        let bit = self.spec.fields()[field]
            .bits()
            .iter()
            .position(|bit| bit.label() == bit_label)?;
        Some(self.counters.get(CounterKey::Bit { field, bit }))
    }
}

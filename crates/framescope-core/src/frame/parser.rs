use super::FrameSpec;
use super::error::FrameError;
use super::input::RawInput;
use super::reader::FrameReader;
use crate::Diagnostic;
use crate::field::bits::BitReading;
use crate::field::codec::Value;
use crate::field::reader::IntReader;

/// Per-call result for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedField {
    pub index: usize,
    pub label: String,
    pub offset: usize,
    pub raw: Vec<u8>,
    pub value: Value,
    pub is_valid: bool,
    pub text: String,
    /// One reading per declared bit sub-field, in declaration order.
    pub bits: Vec<BitReading>,
}

/// Immutable result of decoding one buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub type_name: String,
    pub fields: Vec<DecodedField>,
    pub diagnostics: Vec<Diagnostic>,
}

impl DecodedFrame {
    pub fn field(&self, label: &str) -> Option<&DecodedField> {
        self.fields.iter().find(|field| field.label == label)
    }

    pub fn value(&self, label: &str) -> Option<&Value> {
        self.field(label).map(|field| &field.value)
    }

    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.fields.get(index).map(|field| &field.value)
    }

    /// True when every field and every bit sub-field passed validation.
    pub fn is_valid(&self) -> bool {
        self.fields
            .iter()
            .all(|field| field.is_valid && field.bits.iter().all(|bit| bit.is_valid))
    }
}

impl FrameSpec {
    /// Decode one buffer.
    ///
    /// A length different from [`FrameSpec::full_size`] is reported as a
    /// diagnostic and decoding continues; a field whose slice runs past the
    /// end of the buffer, or whose codec fails, aborts the call.
    ///
    /// # Examples
    /// ```
    /// use framescope_core::{FieldSpec, Format, FrameOptions, FrameSpec, Value};
    ///
    /// let frame = FrameSpec::new(
    ///     "pair",
    ///     vec![FieldSpec::new("A", 1), FieldSpec::new("B", 2).with_format(Format::Hex)],
    ///     FrameOptions::default(),
    /// )?;
    /// let decoded = frame.decode("01 00 64")?;
    /// assert_eq!(decoded.value("B"), Some(&Value::Unsigned(0x64)));
    /// assert_eq!(decoded.fields[1].text, "0x0064");
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn decode<'a>(&self, input: impl Into<RawInput<'a>>) -> Result<DecodedFrame, FrameError> {
        let bytes = input.into().to_bytes()?;
        let reader = FrameReader::new(&bytes);
        let diagnostics = self.check_size(reader.len()).into_iter().collect();
        let fields = (0..self.fields.len())
            .map(|index| self.decode_field(&reader, index, true))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DecodedFrame {
            type_name: self.type_name.clone(),
            fields,
            diagnostics,
        })
    }

    pub(crate) fn check_size(&self, actual: usize) -> Option<Diagnostic> {
        if actual == self.full_size {
            return None;
        }
        tracing::debug!(
            frame = %self.type_name,
            expected = self.full_size,
            actual,
            "frame size mismatch"
        );
        Some(Diagnostic::SizeMismatch {
            expected: self.full_size,
            actual,
        })
    }

    pub(crate) fn decode_field(
        &self,
        reader: &FrameReader<'_>,
        index: usize,
        with_bits: bool,
    ) -> Result<DecodedField, FrameError> {
        let field = &self.fields[index];
        let offset = self.offsets[index];
        let label = field.label();
        let raw = reader
            .read_field(offset, field.size())
            .map_err(|err| FrameError::field(label, err))?;

        let bits = if with_bits && !field.bits().is_empty() {
            let word = IntReader::new(raw, field.byte_order()).read_wide_unsigned();
            field.bits().iter().map(|bit| bit.extract(&word)).collect()
        } else {
            Vec::new()
        };

        let codec = field.codec();
        let value = codec
            .decode(field, raw)
            .map_err(|err| FrameError::field(label, err))?;
        let is_valid = match codec.validate(field, &value) {
            Ok(is_valid) => is_valid,
            Err(err) => {
                tracing::debug!(field = label, error = %err, "validator failed; value accepted");
                true
            }
        };
        let text = codec
            .format(field, &value)
            .map_err(|err| FrameError::field(label, err))?;

        Ok(DecodedField {
            index,
            label: label.to_string(),
            offset,
            raw: raw.to_vec(),
            value,
            is_valid,
            text,
            bits,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        BitField, BitFlag, ByteOrder, CodecError, Diagnostic, FieldCodec, FieldError, FieldSpec,
        Format, FrameError, FrameOptions, FrameSpec, Value,
    };

    #[derive(Debug)]
    struct Exploding;

    impl FieldCodec for Exploding {
        fn decode(&self, _field: &FieldSpec, _raw: &[u8]) -> Result<Value, CodecError> {
            Err(CodecError::custom("boom"))
        }
    }

    #[derive(Debug)]
    struct PickyValidator;

    impl FieldCodec for PickyValidator {
        fn validate(&self, _field: &FieldSpec, _value: &Value) -> Result<bool, CodecError> {
            Err(CodecError::custom("cannot compare"))
        }
    }

    /// Even raw bytes decode as integers, odd ones as halves.
    #[derive(Debug)]
    struct Halves;

    impl FieldCodec for Halves {
        fn decode(&self, _field: &FieldSpec, raw: &[u8]) -> Result<Value, CodecError> {
            Ok(match raw[0] % 2 {
                0 => Value::Unsigned(u128::from(raw[0])),
                _ => Value::Float(f64::from(raw[0]) / 2.0),
            })
        }
    }

    fn frame(fields: Vec<FieldSpec>) -> FrameSpec {
        FrameSpec::new("test", fields, FrameOptions::default()).unwrap()
    }

    #[test]
    fn decodes_fields_in_order() {
        let frame = frame(vec![
            FieldSpec::new("A", 1),
            FieldSpec::new("B", 2).with_byte_order(ByteOrder::Little),
        ]);
        let decoded = frame.decode(&[0x07, 0x01, 0x02]).unwrap();
        assert_eq!(decoded.value_at(0), Some(&Value::Unsigned(7)));
        assert_eq!(decoded.value("B"), Some(&Value::Unsigned(0x0201)));
        assert_eq!(decoded.fields[1].offset, 1);
        assert_eq!(decoded.fields[1].raw, vec![0x01, 0x02]);
        assert!(decoded.diagnostics.is_empty());
    }

    #[test]
    fn bits_use_field_byte_order() {
        let frame = frame(vec![
            FieldSpec::new("W", 2)
                .with_byte_order(ByteOrder::Little)
                .with_bit(BitField::new(8, "HIGH", 8)),
        ]);
        let decoded = frame.decode(&[0x34, 0x12]).unwrap();
        assert_eq!(decoded.fields[0].bits[0].value, 0x12);
    }

    #[test]
    fn codec_failure_names_field() {
        let frame = frame(vec![
            FieldSpec::new("OK", 1),
            FieldSpec::new("BAD", 1).with_codec(Exploding),
        ]);
        let err = frame.decode(&[0, 0]).unwrap_err();
        assert_eq!(err.label(), Some("BAD"));
        assert!(err.to_string().contains("incorrect processing of field 'BAD'"));
        assert!(frame.decode(&[0, 0]).is_err());
    }

    #[test]
    fn validator_errors_fail_open() {
        let frame = frame(vec![
            FieldSpec::new("A", 1)
                .with_bounds(0.0, 1.0)
                .with_codec(PickyValidator),
        ]);
        let decoded = frame.decode(&[0xFF]).unwrap();
        assert!(decoded.fields[0].is_valid);
    }

    #[test]
    fn short_buffer_is_fatal_for_field() {
        let frame = frame(vec![FieldSpec::new("A", 1), FieldSpec::new("B", 2)]);
        let err = frame.decode(&[0x01, 0x02]).unwrap_err();
        match err {
            FrameError::Field { label, source } => {
                assert_eq!(label, "B");
                assert_eq!(source, FieldError::TooShort { needed: 3, actual: 2 });
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn long_buffer_is_only_a_diagnostic() {
        let frame = frame(vec![FieldSpec::new("A", 1).with_format(Format::Hex)]);
        let decoded = frame.decode(&[0xAB, 0xCD]).unwrap();
        assert_eq!(decoded.fields[0].text, "0xAB");
        assert_eq!(
            decoded.diagnostics,
            vec![Diagnostic::SizeMismatch {
                expected: 1,
                actual: 2
            }]
        );
    }

    #[test]
    fn frame_validity_includes_bits() {
        let frame = frame(vec![FieldSpec::new("S", 1).with_bit(BitFlag::new(0, "F", true))]);
        assert!(frame.decode(&[0x01]).unwrap().is_valid());
        assert!(!frame.decode(&[0x00]).unwrap().is_valid());
    }

    #[test]
    fn format_failure_names_field_and_frame_stays_usable() {
        let frame = frame(vec![
            FieldSpec::new("HEAD", 1),
            FieldSpec::new("HALF", 1)
                .with_format(Format::Hex)
                .with_codec(Halves),
        ]);
        let err = frame.decode(&[0x00, 0x03]).unwrap_err();
        match err {
            FrameError::Field { ref label, ref source } => {
                assert_eq!(label, "HALF");
                assert!(matches!(
                    source,
                    FieldError::Codec(CodecError::NotInteger { format: "hex", .. })
                ));
            }
            other => panic!("unexpected error: {other}"),
        }

        let decoded = frame.decode(&[0x00, 0x04]).unwrap();
        assert_eq!(decoded.fields[1].text, "0x04");
    }

    #[test]
    fn wide_remainder_keeps_byte_order() {
        let frame = FrameSpec::new(
            "tail",
            vec![FieldSpec::remainder("TAIL").with_format(Format::Hex)],
            FrameOptions::default().with_byte_order(ByteOrder::Little),
        )
        .unwrap();
        let mut narrow = vec![0u8; 16];
        narrow[0] = 0x01;
        let mut wide = vec![0u8; 17];
        wide[0] = 0x01;
        assert_eq!(frame.decode(&narrow).unwrap().fields[0].text, "0x1");
        assert_eq!(frame.decode(&wide).unwrap().fields[0].text, "0x1");
    }

    #[test]
    fn wide_decimal_field_is_bounds_checked() {
        let frame = frame(vec![FieldSpec::new("BIG", 17).with_max(9.0)]);
        let mut raw = vec![0u8; 17];
        raw[16] = 9;
        let decoded = frame.decode(&raw).unwrap();
        assert_eq!(decoded.fields[0].text, "9");
        assert!(decoded.fields[0].is_valid);

        raw[0] = 1;
        let decoded = frame.decode(&raw).unwrap();
        assert!(!decoded.fields[0].is_valid);
    }

    #[test]
    fn bits_on_wide_fields() {
        let frame = frame(vec![
            FieldSpec::new("BIG", 20)
                .with_bit(BitFlag::new(0, "LOW", true))
                .with_bit(BitField::new(156, "TOP", 4)),
        ]);
        let mut raw = vec![0u8; 20];
        raw[0] = 0xA0;
        raw[19] = 0x01;
        let bits = &frame.decode(&raw).unwrap().fields[0].bits;
        assert_eq!(bits[0].value, 1);
        assert!(bits[0].is_valid);
        assert_eq!(bits[1].value, 0xA);
        assert_eq!(bits[1].label, "    $[156:160]TOP");
    }
}

use std::collections::HashSet;

use super::FrameSpec;
use super::error::FrameError;
use super::input::RawInput;
use super::reader::FrameReader;
use crate::{BatchTable, RowDiagnostic};

impl FrameSpec {
    /// Decode several buffers into aligned value/validity tables.
    ///
    /// Fields listed in `excluded` are neither decoded nor reported. Bit
    /// sub-fields are not expanded and no error counters are involved.
    ///
    /// # Examples
    /// ```
    /// use framescope_core::{FieldSpec, FrameOptions, FrameSpec};
    ///
    /// let frame = FrameSpec::new(
    ///     "pair",
    ///     vec![FieldSpec::new("A", 1).with_max(9.0), FieldSpec::new("CRC", 1)],
    ///     FrameOptions::default(),
    /// )?;
    /// let table = frame.decode_many(["0102", "0A03"], &["CRC"])?;
    /// assert_eq!(table.columns, vec!["A"]);
    /// assert_eq!(table.values, vec![vec!["1"], vec!["10"]]);
    /// assert_eq!(table.validity, vec![vec![true], vec![false]]);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn decode_many<'a, I, R, S>(&self, inputs: I, excluded: &[S]) -> Result<BatchTable, FrameError>
    where
        I: IntoIterator<Item = R>,
        R: Into<RawInput<'a>>,
        S: AsRef<str>,
    {
        let excluded: HashSet<&str> = excluded.iter().map(AsRef::as_ref).collect();
        let included: Vec<usize> = (0..self.fields.len())
            .filter(|&index| !excluded.contains(self.fields[index].label()))
            .collect();

        let mut table = BatchTable {
            columns: included
                .iter()
                .map(|&index| self.fields[index].label().to_string())
                .collect(),
            ..BatchTable::default()
        };

        for (row, input) in inputs.into_iter().enumerate() {
            let bytes = input.into().to_bytes()?;
            let reader = FrameReader::new(&bytes);
            if let Some(diagnostic) = self.check_size(reader.len()) {
                table.diagnostics.push(RowDiagnostic { row, diagnostic });
            }

            let mut values = Vec::with_capacity(included.len());
            let mut validity = Vec::with_capacity(included.len());
            for &index in &included {
                let decoded = self.decode_field(&reader, index, false)?;
                values.push(decoded.text);
                validity.push(decoded.is_valid);
            }
            table.values.push(values);
            table.validity.push(validity);
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Diagnostic, FieldSpec, Format, FrameOptions, FrameSpec};

    fn frame() -> FrameSpec {
        FrameSpec::new(
            "t",
            vec![
                FieldSpec::new("A", 1).with_format(Format::Hex).with_bounds(0.0, 90.0),
                FieldSpec::new("B", 2).with_format(Format::Hex),
                FieldSpec::new("CRC8", 1).with_format(Format::Hex),
            ],
            FrameOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn one_row_per_buffer() {
        let inputs: Vec<Vec<u8>> = vec![vec![0x5A, 0x00, 0x64, 0xFF], vec![0x5B, 0x00, 0x01, 0x00]];
        let table = frame().decode_many(&inputs, &[] as &[&str]).unwrap();
        assert_eq!(table.columns, vec!["A", "B", "CRC8"]);
        assert_eq!(table.values[0], vec!["0x5A", "0x0064", "0xFF"]);
        assert_eq!(table.values[1], vec!["0x5B", "0x0001", "0x00"]);
        assert_eq!(table.validity[1], vec![false, true, true]);
        assert!(table.diagnostics.is_empty());
    }

    #[test]
    fn excluded_fields_are_skipped_entirely() {
        // B would run past the end of the buffer if it were decoded.
        let frame = FrameSpec::new(
            "t",
            vec![FieldSpec::new("A", 1), FieldSpec::new("B", 4)],
            FrameOptions::default(),
        )
        .unwrap();
        let table = frame.decode_many(["01"], &["B"]).unwrap();
        assert_eq!(table.columns, vec!["A"]);
        assert_eq!(table.values, vec![vec!["1"]]);
        assert_eq!(table.diagnostics.len(), 1);
        assert_eq!(table.diagnostics[0].row, 0);
        assert_eq!(
            table.diagnostics[0].diagnostic,
            Diagnostic::SizeMismatch {
                expected: 5,
                actual: 1
            }
        );
    }

    #[test]
    fn failing_row_aborts_batch() {
        let err = frame().decode_many(["5A00", "5A0064FF"], &[] as &[&str]).unwrap_err();
        assert_eq!(err.label(), Some("B"));
    }
}

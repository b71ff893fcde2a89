use std::iter::FusedIterator;
use std::slice;

use crate::field::{ByteOrder, FieldSpec};

/// Relabeled, independently owned copies of a field group.
///
/// Yields each source field once with its label wrapped as
/// `prefix + label + postfix`. The iterator is single-pass; build a new one
/// for every occurrence of the group.
///
/// # Examples
/// ```
/// use framescope_core::{FieldSpec, FrameOptions, FrameSpec, SubFrame};
///
/// let sensor = vec![FieldSpec::new("TEMP", 2), FieldSpec::new("STATE", 1)];
/// let mut fields = vec![FieldSpec::new("HEADER", 1)];
/// fields.extend(SubFrame::new(&sensor, "Sensor[0].", ""));
/// fields.extend(SubFrame::new(&sensor, "Sensor[1].", ""));
///
/// let frame = FrameSpec::new("sensors", fields, FrameOptions::default())?;
/// assert_eq!(frame.offset_of("Sensor[1].TEMP"), Some(4));
/// # Ok::<(), framescope_core::LayoutError>(())
/// ```
///
/// A partly consumed iterator cannot be duplicated and restarted:
/// ```compile_fail
/// use framescope_core::{FieldSpec, SubFrame};
///
/// let group = vec![FieldSpec::new("A", 1), FieldSpec::new("B", 1)];
/// let mut occurrence = SubFrame::new(&group, "G.", "");
/// occurrence.next();
/// let _restarted: SubFrame<'_> = occurrence.clone();
/// ```
#[derive(Debug)]
pub struct SubFrame<'a> {
    source: slice::Iter<'a, FieldSpec>,
    prefix: String,
    postfix: String,
    byte_order: Option<ByteOrder>,
}

impl<'a> SubFrame<'a> {
    pub fn new(
        fields: &'a [FieldSpec],
        prefix: impl Into<String>,
        postfix: impl Into<String>,
    ) -> Self {
        Self {
            source: fields.iter(),
            prefix: prefix.into(),
            postfix: postfix.into(),
            byte_order: None,
        }
    }

    /// Byte order for copies that do not declare one.
    pub fn with_byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = Some(order);
        self
    }
}

impl Iterator for SubFrame<'_> {
    type Item = FieldSpec;

    fn next(&mut self) -> Option<Self::Item> {
        let mut field = self.source.next()?.clone();
        field.set_label(format!("{}{}{}", self.prefix, field.label(), self.postfix));
        if let Some(order) = self.byte_order {
            field.inherit_byte_order(order);
        }
        Some(field)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.source.size_hint()
    }
}

impl ExactSizeIterator for SubFrame<'_> {}

impl FusedIterator for SubFrame<'_> {}

#[cfg(test)]
mod tests {
    use super::SubFrame;
    use crate::{ByteOrder, FieldSpec, FrameDecoder, FrameOptions, FrameSpec};

    fn group() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("V", 1).with_max(9.0),
            FieldSpec::new("W", 2).with_byte_order(ByteOrder::Big),
        ]
    }

    #[test]
    fn relabels_with_prefix_and_postfix() {
        let source = group();
        let labels: Vec<String> = SubFrame::new(&source, "S.", "[2]")
            .map(|field| field.label().to_string())
            .collect();
        assert_eq!(labels, vec!["S.V[2]", "S.W[2]"]);
        assert_eq!(source[0].label(), "V");
    }

    #[test]
    fn single_pass() {
        let source = group();
        let mut sub = SubFrame::new(&source, "", "");
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.by_ref().count(), 2);
        assert!(sub.next().is_none());
    }

    #[test]
    fn fills_unset_byte_order_only() {
        let source = group();
        let copies: Vec<FieldSpec> = SubFrame::new(&source, "", "")
            .with_byte_order(ByteOrder::Little)
            .collect();
        assert_eq!(copies[0].declared_byte_order(), Some(ByteOrder::Little));
        assert_eq!(copies[1].declared_byte_order(), Some(ByteOrder::Big));
    }

    #[test]
    fn occurrences_count_errors_separately() {
        let source = group();
        let fields: Vec<FieldSpec> = SubFrame::new(&source, "A.", "")
            .chain(SubFrame::new(&source, "B.", ""))
            .collect();
        let frame = FrameSpec::new("pair", fields, FrameOptions::default()).unwrap();
        let mut decoder = FrameDecoder::new(&frame);
        decoder.decode(&[10u8, 0, 0, 1, 0, 0]).unwrap();
        assert_eq!(decoder.error_count("A.V"), Some(1));
        assert_eq!(decoder.error_count("B.V"), Some(0));
    }
}

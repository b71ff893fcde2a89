//! JSON frame layouts.
//!
//! A layout file declares the frame the same way the builder API does:
//!
//! ```json
//! {
//!   "name": "status_frame",
//!   "byte_order": "little",
//!   "fields": [
//!     { "label": "FIELD_1", "size": 1, "format": "X", "min": 0, "max": 90 },
//!     { "group": [{ "label": "TEMP", "size": 2 }], "repeat": 2, "prefix": "Sensor[{i}]." },
//!     { "label": "STATUS", "size": 1, "bits": [
//!         { "kind": "flag", "pos": 3, "label": "READY" },
//!         { "kind": "field", "pos": 4, "label": "MODE", "length": 2, "names": { "1": "IDLE" } }
//!     ] },
//!     { "label": "CRC8", "size": 1, "format": "X" }
//!   ]
//! }
//! ```
//!
//! Groups are expanded with [`SubFrame`]; `{i}` in a prefix or postfix is
//! replaced by the occurrence index.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::field::bits::{BitDisplay, BitField, BitFlag, BitSpec, BitTransform};
use crate::field::{ByteOrder, FieldSpec, Format};
use crate::frame::error::LayoutError;
use crate::frame::{BitOverride, FrameOptions, FrameSpec, HeaderMode};
use crate::subframe::SubFrame;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid layout JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid layout: {0}")]
    Layout(#[from] LayoutError),
    #[error("bit field '{bit}' maps non-numeric value '{key}'")]
    InvalidName { bit: String, key: String },
}

/// Whole-frame layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameConfig {
    pub name: String,
    #[serde(default)]
    pub byte_order: ByteOrder,
    #[serde(default)]
    pub header: HeaderMode,
    #[serde(default)]
    pub show_bits: BitOverride,
    pub fields: Vec<FieldEntry>,
}

/// A single field or a repeated group of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldEntry {
    Group(GroupConfig),
    Field(FieldConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupConfig {
    pub group: Vec<FieldConfig>,
    #[serde(default = "default_repeat")]
    pub repeat: usize,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub postfix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_order: Option<ByteOrder>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    pub label: String,
    pub size: usize,
    #[serde(default)]
    pub format: Format,
    #[serde(default)]
    pub signed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_order: Option<ByteOrder>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bits: Vec<BitConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", deny_unknown_fields)]
pub enum BitConfig {
    Flag {
        pos: u32,
        label: String,
        #[serde(default = "default_expected")]
        expected: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display: Option<BitDisplay>,
    },
    Field {
        pos: u32,
        label: String,
        length: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display: Option<BitDisplay>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        names: BTreeMap<String, String>,
    },
}

fn default_repeat() -> usize {
    1
}

fn default_expected() -> bool {
    true
}

impl FrameConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn options(&self) -> FrameOptions {
        FrameOptions::default()
            .with_byte_order(self.byte_order)
            .with_header(self.header)
            .with_show_bits(self.show_bits)
    }

    /// Expand groups and build the frame.
    pub fn build(&self) -> Result<FrameSpec, ConfigError> {
        let mut fields = Vec::new();
        for entry in &self.fields {
            match entry {
                FieldEntry::Field(field) => fields.push(field.to_spec()?),
                FieldEntry::Group(group) => fields.extend(group.expand()?),
            }
        }
        Ok(FrameSpec::new(&self.name, fields, self.options())?)
    }
}

impl GroupConfig {
    pub fn expand(&self) -> Result<Vec<FieldSpec>, ConfigError> {
        let template = self
            .group
            .iter()
            .map(FieldConfig::to_spec)
            .collect::<Result<Vec<_>, _>>()?;
        let mut fields = Vec::with_capacity(template.len() * self.repeat);
        for i in 0..self.repeat {
            let index = i.to_string();
            let mut occurrence = SubFrame::new(
                &template,
                self.prefix.replace("{i}", &index),
                self.postfix.replace("{i}", &index),
            );
            if let Some(order) = self.byte_order {
                occurrence = occurrence.with_byte_order(order);
            }
            fields.extend(occurrence);
        }
        Ok(fields)
    }
}

impl FieldConfig {
    pub fn to_spec(&self) -> Result<FieldSpec, ConfigError> {
        let bits = self
            .bits
            .iter()
            .map(BitConfig::to_spec)
            .collect::<Result<Vec<_>, _>>()?;
        let mut spec = FieldSpec::new(&self.label, self.size)
            .with_format(self.format)
            .with_signed(self.signed)
            .with_bits(bits);
        if let Some(min) = self.min {
            spec = spec.with_min(min);
        }
        if let Some(max) = self.max {
            spec = spec.with_max(max);
        }
        if let Some(order) = self.byte_order {
            spec = spec.with_byte_order(order);
        }
        Ok(spec)
    }
}

impl BitConfig {
    pub fn to_spec(&self) -> Result<BitSpec, ConfigError> {
        match self {
            BitConfig::Flag {
                pos,
                label,
                expected,
                display,
            } => {
                let mut flag = BitFlag::new(*pos, label, *expected);
                if let Some(display) = display {
                    flag = flag.with_display(*display);
                }
                Ok(flag.into())
            }
            BitConfig::Field {
                pos,
                label,
                length,
                min,
                max,
                display,
                names,
            } => {
                let mut field = BitField::new(*pos, label, *length).with_bounds(
                    min.unwrap_or(f64::NEG_INFINITY),
                    max.unwrap_or(f64::INFINITY),
                );
                if let Some(display) = display {
                    field = field.with_display(*display);
                }
                if !names.is_empty() {
                    let names = names
                        .iter()
                        .map(|(key, name)| {
                            let value = key.trim().parse::<u128>().map_err(|_| {
                                ConfigError::InvalidName {
                                    bit: label.clone(),
                                    key: key.clone(),
                                }
                            })?;
                            Ok((value, name.clone()))
                        })
                        .collect::<Result<BTreeMap<_, _>, ConfigError>>()?;
                    field = field.with_transform(BitTransform::from_names(names));
                }
                Ok(field.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, FrameConfig};
    use crate::{BitDisplay, ByteOrder, Format, HeaderMode, LayoutError};

    const LAYOUT: &str = r#"{
        "name": "status_frame",
        "byte_order": "little",
        "header": "generic",
        "fields": [
            { "label": "FIELD_1", "size": 1, "format": "X", "min": 0, "max": 90 },
            { "group": [{ "label": "TEMP", "size": 2 }], "repeat": 2, "prefix": "Sensor[{i}]." },
            { "label": "STATUS", "size": 1, "bits": [
                { "kind": "flag", "pos": 3, "label": "READY" },
                { "kind": "field", "pos": 4, "label": "MODE", "length": 2,
                  "display": "always", "names": { "1": "IDLE" } }
            ] },
            { "label": "CRC8", "size": 1, "format": "X", "byte_order": "big" }
        ]
    }"#;

    #[test]
    fn builds_frame_from_json() {
        let config = FrameConfig::from_json(LAYOUT).unwrap();
        let frame = config.build().unwrap();
        let labels: Vec<_> = frame.fields().iter().map(|f| f.label()).collect();
        assert_eq!(
            labels,
            vec!["FIELD_1", "Sensor[0].TEMP", "Sensor[1].TEMP", "STATUS", "CRC8"]
        );
        assert_eq!(frame.full_size(), 7);
        assert_eq!(frame.options().header, HeaderMode::Generic);
        assert_eq!(frame.fields()[0].format(), Format::Hex);
        assert_eq!(frame.fields()[0].max_value(), 90.0);
        assert_eq!(frame.fields()[1].byte_order(), ByteOrder::Little);
        assert_eq!(frame.fields()[4].byte_order(), ByteOrder::Big);
        assert_eq!(frame.fields()[3].bits()[1].display(), BitDisplay::Always);
    }

    #[test]
    fn names_transform_bit_values() {
        let frame = FrameConfig::from_json(LAYOUT).unwrap().build().unwrap();
        let decoded = frame.decode("00 0000 0000 18 00").unwrap();
        let status = decoded.field("STATUS").unwrap();
        assert!(status.bits[0].is_valid);
        assert_eq!(status.bits[1].text, "IDLE");
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = FrameConfig::from_json(r#"{ "name": "x", "fields": [], "extra": 1 }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn non_numeric_names_rejected() {
        let json = r#"{ "name": "x", "fields": [
            { "label": "S", "size": 1, "bits": [
                { "kind": "field", "pos": 0, "label": "M", "length": 2, "names": { "one": "IDLE" } }
            ] }
        ] }"#;
        let err = FrameConfig::from_json(json).unwrap().build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidName { .. }));
    }

    #[test]
    fn layout_errors_surface() {
        let json = r#"{ "name": "x", "fields": [
            { "label": "S", "size": 1, "bits": [
                { "kind": "flag", "pos": 9, "label": "F" }
            ] }
        ] }"#;
        let err = FrameConfig::from_json(json).unwrap().build().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Layout(LayoutError::BitOutOfRange { .. })
        ));
    }
}

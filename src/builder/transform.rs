use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransformKind {
    FieldTransform,
    #[serde(rename = "JSON")]
    Json,
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformKind::FieldTransform => write!(f, "FieldTransform"),
            TransformKind::Json => write!(f, "JSON"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransformMode {
    #[default]
    Mapping,
}

/// One JSON field extraction: maps fields of a JSON document column to
/// output columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonFieldMap {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub type_field: String,
    #[serde(default)]
    pub mapping: BTreeMap<String, String>,
}

/// Transform payload, discriminated by `type_map` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type_map")]
pub enum Mapping {
    FieldTransform {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        alias_new_column_transform: String,
        #[serde(default)]
        mapping: BTreeMap<String, String>,
    },
    #[serde(rename = "JSON")]
    Json {
        #[serde(default)]
        mapping_json: Vec<JsonFieldMap>,
    },
}

/// A per-column transformation descriptor.
///
/// The mapping body is user-authored JSON text; when it fails to parse the
/// transform degrades to an empty `{}` mapping rather than failing the
/// submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    #[serde(rename = "type")]
    pub kind: TransformKind,
    pub mode: TransformMode,
    pub output_column: String,
    #[serde(
        default,
        serialize_with = "serialize_mapping",
        deserialize_with = "deserialize_mapping"
    )]
    pub mapping: Option<Mapping>,
}

impl Transform {
    /// Value-remapping transform. `mapping_text` is the raw JSON object typed
    /// by the user (`{"raw": "mapped", ...}`).
    pub fn field_transform(output_column: &str, alias: &str, mapping_text: &str) -> Self {
        let mapping = serde_json::from_str::<BTreeMap<String, String>>(mapping_text)
            .ok()
            .map(|mapping| Mapping::FieldTransform {
                alias_new_column_transform: alias.to_string(),
                mapping,
            });
        Self {
            kind: TransformKind::FieldTransform,
            mode: TransformMode::Mapping,
            output_column: output_column.to_string(),
            mapping,
        }
    }

    /// JSON-decomposition transform. `mapping_text` is the raw JSON array
    /// typed by the user (`[{"type_field": ..., "mapping": {...}}, ...]`).
    pub fn json_decompose(output_column: &str, mapping_text: &str) -> Self {
        let mapping = serde_json::from_str::<Vec<JsonFieldMap>>(mapping_text)
            .ok()
            .map(|mapping_json| Mapping::Json { mapping_json });
        Self {
            kind: TransformKind::Json,
            mode: TransformMode::Mapping,
            output_column: output_column.to_string(),
            mapping,
        }
    }
}

/// A missing mapping serializes as `{}` so the submission payload stays
/// structurally valid.
fn serialize_mapping<S: Serializer>(
    mapping: &Option<Mapping>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match mapping {
        Some(mapping) => mapping.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}

/// Anything that does not match a known mapping shape (including `{}`) reads
/// back as "no mapping provided".
fn deserialize_mapping<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Mapping>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

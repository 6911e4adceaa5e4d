//! Declarative schema contract and the validator that enforces it.
//!
//! A contract names each record group of a shaped bundle (`node`,
//! `node_tags`, `way`, `way_nodes`, `way_tags`) and describes its fields. The
//! validator checks a bundle's serialised form against it, so any contract
//! expressed in the same JSON vocabulary can be swapped in without touching
//! the pipeline.
//!
//! ```json
//! { "version": 1,
//!   "records": {
//!     "node": { "shape": "record",
//!               "fields": { "id": { "type": "integer", "required": true, "coerce": true } } } } }
//! ```

use std::{collections::BTreeMap, fmt, io::Read};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::ShapedElement;

/// Contract format version understood by this crate.
pub const CONTRACT_VERSION: u32 = 1;

/// Scalar type a field must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Whole number.
    Integer,
    /// Decimal number.
    Float,
    /// Text.
    String,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
        })
    }
}

/// Constraints on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldRule {
    /// Expected type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the field must be present.
    #[serde(default)]
    pub required: bool,
    /// Accept numeric text for numeric types.
    #[serde(default)]
    pub coerce: bool,
}

/// Whether a record group holds one record or a list of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordShape {
    /// A single record.
    Record,
    /// Zero or more records.
    List,
}

/// Constraints on one record group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordRule {
    /// Single record or list.
    pub shape: RecordShape,
    /// Whether every bundle must carry this group.
    #[serde(default)]
    pub required: bool,
    /// Field constraints keyed by field name.
    pub fields: BTreeMap<String, FieldRule>,
}

/// Versioned description of the record groups a bundle may contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaContract {
    /// Contract format version.
    pub version: u32,
    /// Record group rules keyed by group name.
    pub records: BTreeMap<String, RecordRule>,
}

/// Errors raised while loading a schema contract.
#[derive(Debug, Error)]
pub enum SchemaContractError {
    /// The contract document was not valid JSON for the contract vocabulary.
    #[error("failed to parse schema contract: {source}")]
    Parse {
        /// Source error returned by `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// The contract declares a version this crate does not understand.
    #[error("unsupported schema contract version {found} (expected {CONTRACT_VERSION})")]
    UnsupportedVersion {
        /// Version declared by the document.
        found: u32,
    },
}

impl SchemaContract {
    /// The contract describing the five exported tables.
    ///
    /// Mirrors the `schema/tabular.json` asset shipped with this crate.
    #[must_use]
    pub fn tabular() -> Self {
        let tag_fields = || {
            fields([
                ("id", coerced(FieldType::Integer)),
                ("key", plain(FieldType::String)),
                ("value", plain(FieldType::String)),
                ("type", plain(FieldType::String)),
            ])
        };
        let records = BTreeMap::from([
            (
                "node".to_owned(),
                record(fields([
                    ("id", coerced(FieldType::Integer)),
                    ("lat", coerced(FieldType::Float)),
                    ("lon", coerced(FieldType::Float)),
                    ("user", plain(FieldType::String)),
                    ("uid", coerced(FieldType::Integer)),
                    ("version", plain(FieldType::String)),
                    ("changeset", coerced(FieldType::Integer)),
                    ("timestamp", plain(FieldType::String)),
                ])),
            ),
            ("node_tags".to_owned(), list(tag_fields())),
            (
                "way".to_owned(),
                record(fields([
                    ("id", coerced(FieldType::Integer)),
                    ("user", plain(FieldType::String)),
                    ("uid", coerced(FieldType::Integer)),
                    ("version", plain(FieldType::String)),
                    ("changeset", coerced(FieldType::Integer)),
                    ("timestamp", plain(FieldType::String)),
                ])),
            ),
            (
                "way_nodes".to_owned(),
                list(fields([
                    ("id", coerced(FieldType::Integer)),
                    ("node_id", coerced(FieldType::Integer)),
                    ("position", plain(FieldType::Integer)),
                ])),
            ),
            ("way_tags".to_owned(), list(tag_fields())),
        ]);
        Self {
            version: CONTRACT_VERSION,
            records,
        }
    }

    /// Parse a contract from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, SchemaContractError> {
        serde_json::from_str::<Self>(json)
            .map_err(|source| SchemaContractError::Parse { source })?
            .checked()
    }

    /// Parse a contract from a JSON reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SchemaContractError> {
        serde_json::from_reader::<_, Self>(reader)
            .map_err(|source| SchemaContractError::Parse { source })?
            .checked()
    }

    fn checked(self) -> Result<Self, SchemaContractError> {
        if self.version == CONTRACT_VERSION {
            Ok(self)
        } else {
            Err(SchemaContractError::UnsupportedVersion {
                found: self.version,
            })
        }
    }
}

impl Default for SchemaContract {
    fn default() -> Self {
        Self::tabular()
    }
}

fn fields<const N: usize>(entries: [(&str, FieldRule); N]) -> BTreeMap<String, FieldRule> {
    entries
        .into_iter()
        .map(|(name, rule)| (name.to_owned(), rule))
        .collect()
}

const fn coerced(field_type: FieldType) -> FieldRule {
    FieldRule {
        field_type,
        required: true,
        coerce: true,
    }
}

const fn plain(field_type: FieldType) -> FieldRule {
    FieldRule {
        field_type,
        required: true,
        coerce: false,
    }
}

fn record(fields: BTreeMap<String, FieldRule>) -> RecordRule {
    RecordRule {
        shape: RecordShape::Record,
        required: false,
        fields,
    }
}

fn list(fields: BTreeMap<String, FieldRule>) -> RecordRule {
    RecordRule {
        shape: RecordShape::List,
        required: false,
        fields,
    }
}

/// One field-level contract violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Offending field (or record group, for group-level errors).
    pub field: String,
    /// Position within a list group.
    pub index: Option<usize>,
    /// What was wrong.
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, index: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            index,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "[{index}].{}: {}", self.field, self.message),
            None => write!(f, "{}: {}", self.field, self.message),
        }
    }
}

/// A shaped bundle did not satisfy the schema contract.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("element of type '{record}' has the following errors: {}", join_errors(.errors))]
pub struct ValidationError {
    /// Record group that failed (e.g. `node` or `way_tags`).
    pub record: String,
    /// Field-level violations within that group.
    pub errors: Vec<FieldError>,
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Checks shaped bundles against a [`SchemaContract`].
///
/// # Examples
/// ```
/// use mapclean_core::{
///     PathEntity, SchemaValidator, ShapedElement, ShapedPath,
/// };
///
/// let way = ShapedElement::Path(ShapedPath {
///     entity: PathEntity {
///         id: "not-a-number".into(),
///         user: "mapper".into(),
///         uid: "1".into(),
///         version: "1".into(),
///         changeset: "2".into(),
///         timestamp: "2016-01-01T00:00:00Z".into(),
///     },
///     references: Vec::new(),
///     tags: Vec::new(),
/// });
///
/// let err = SchemaValidator::default().validate(&way).unwrap_err();
/// assert_eq!(err.record, "way");
/// assert_eq!(err.errors[0].field, "id");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaValidator {
    contract: SchemaContract,
}

impl SchemaValidator {
    /// Validate against `contract`.
    #[must_use]
    pub const fn new(contract: SchemaContract) -> Self {
        Self { contract }
    }

    /// The contract in force.
    #[must_use]
    pub const fn contract(&self) -> &SchemaContract {
        &self.contract
    }

    /// Validate one shaped bundle.
    ///
    /// Record groups are checked in name order and the first failing group
    /// is reported with all of its field errors.
    pub fn validate(&self, shaped: &ShapedElement) -> Result<(), ValidationError> {
        let document = serde_json::to_value(shaped).map_err(|err| ValidationError {
            record: shaped.kind().to_string(),
            errors: vec![FieldError::new(shaped.kind().tag_name(), None, err.to_string())],
        })?;
        self.validate_document(&document)
    }

    /// Validate a bundle already in document form.
    pub fn validate_document(&self, document: &Value) -> Result<(), ValidationError> {
        let Value::Object(groups) = document else {
            return Err(ValidationError {
                record: "<document>".to_owned(),
                errors: vec![FieldError::new("<document>", None, "must be an object")],
            });
        };
        for (name, value) in groups {
            let errors = match self.contract.records.get(name) {
                Some(rule) => check_group(rule, value),
                None => vec![FieldError::new(name, None, "unknown record group")],
            };
            if !errors.is_empty() {
                return Err(ValidationError {
                    record: name.clone(),
                    errors,
                });
            }
        }
        if let Some((name, _)) = self
            .contract
            .records
            .iter()
            .find(|(name, rule)| rule.required && !groups.contains_key(name.as_str()))
        {
            return Err(ValidationError {
                record: name.clone(),
                errors: vec![FieldError::new(name, None, "required record group")],
            });
        }
        Ok(())
    }
}

fn check_group(rule: &RecordRule, value: &Value) -> Vec<FieldError> {
    match (rule.shape, value) {
        (RecordShape::Record, Value::Object(record)) => check_record(rule, record, None),
        (RecordShape::List, Value::Array(items)) => items
            .iter()
            .enumerate()
            .flat_map(|(index, item)| match item {
                Value::Object(record) => check_record(rule, record, Some(index)),
                _ => vec![FieldError::new("<item>", Some(index), "must be a record")],
            })
            .collect(),
        (RecordShape::Record, _) => vec![FieldError::new("<group>", None, "must be a record")],
        (RecordShape::List, _) => vec![FieldError::new("<group>", None, "must be a list")],
    }
}

fn check_record(
    rule: &RecordRule,
    record: &Map<String, Value>,
    index: Option<usize>,
) -> Vec<FieldError> {
    let mut errors = Vec::new();
    for (name, field) in &rule.fields {
        match record.get(name) {
            Some(value) => {
                if !matches_type(field, value) {
                    errors.push(FieldError::new(
                        name,
                        index,
                        format!("must be of {} type", field.field_type),
                    ));
                }
            }
            None if field.required => errors.push(FieldError::new(name, index, "required field")),
            None => {}
        }
    }
    errors.extend(
        record
            .keys()
            .filter(|name| !rule.fields.contains_key(name.as_str()))
            .map(|name| FieldError::new(name, index, "unknown field")),
    );
    errors
}

fn matches_type(rule: &FieldRule, value: &Value) -> bool {
    match (rule.field_type, value) {
        (FieldType::String, Value::String(_)) => true,
        (FieldType::Integer, Value::Number(number)) => number.is_i64() || number.is_u64(),
        (FieldType::Float, Value::Number(_)) => true,
        (FieldType::Integer, Value::String(text)) if rule.coerce => text.parse::<i64>().is_ok(),
        (FieldType::Float, Value::String(text)) if rule.coerce => {
            text.parse::<f64>().is_ok_and(f64::is_finite)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests;

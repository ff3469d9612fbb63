//! Aspect descriptor model
//!
//! Descriptors declare:
//! - aspect name: unique registry key
//! - aspect kind: versioned (monotonic version numbers) or timeseries
//!   (append-only, bucketed by timestamp)
//! - an ordered field list with optionality and annotation hints
//!   (searchable, timeseries field, timeseries field collection)
//!
//! Descriptors are built once at boot and never mutated afterward.

use serde::de::Error as DeError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Storage kind of an aspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectKind {
    /// Latest-state storage with strictly monotonic version numbers.
    Versioned,
    /// Append-only storage bucketed by timestamp.
    Timeseries,
}

impl AspectKind {
    /// Returns the kind name for messages and wire output.
    pub fn kind_name(&self) -> &'static str {
        match self {
            AspectKind::Versioned => "versioned",
            AspectKind::Timeseries => "timeseries",
        }
    }
}

/// Value type of a declared field.
///
/// Serialized as a bare name (`"long"`) or, for arrays, as a single-key
/// object naming the element type (`{"array": "urn"}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    /// UTF-8 string
    String,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// 64-bit floating point
    Float,
    /// Boolean
    Boolean,
    /// Structured entity reference (`urn:li:<entityType>:<id>`)
    Urn,
    /// Nested record; structure is opaque to validation
    Record,
    /// Homogeneous array with a single element type
    Array {
        /// Element type (boxed to allow nesting)
        element: Box<ValueType>,
    },
}

impl ValueType {
    /// Create an array type with the given element type.
    pub fn array(element: ValueType) -> Self {
        ValueType::Array {
            element: Box::new(element),
        }
    }

    /// Returns the type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Int => "int",
            ValueType::Long => "long",
            ValueType::Float => "float",
            ValueType::Boolean => "boolean",
            ValueType::Urn => "urn",
            ValueType::Record => "record",
            ValueType::Array { .. } => "array",
        }
    }

    fn from_name(name: &str) -> Result<Self, String> {
        match name {
            "string" => Ok(ValueType::String),
            "int" => Ok(ValueType::Int),
            "long" => Ok(ValueType::Long),
            "float" => Ok(ValueType::Float),
            "boolean" => Ok(ValueType::Boolean),
            "urn" => Ok(ValueType::Urn),
            "record" => Ok(ValueType::Record),
            other => Err(format!("unknown value type '{}'", other)),
        }
    }
}

impl Serialize for ValueType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ValueType::Array { element } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("array", element)?;
                map.end()
            }
            simple => serializer.serialize_str(simple.type_name()),
        }
    }
}

/// Raw wire shape: either a type name or `{"array": <inner>}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ValueTypeRepr {
    Name(String),
    Array { array: Box<ValueTypeRepr> },
}

impl ValueTypeRepr {
    fn resolve(self) -> Result<ValueType, String> {
        match self {
            ValueTypeRepr::Name(name) => ValueType::from_name(&name),
            ValueTypeRepr::Array { array } => Ok(ValueType::array(array.resolve()?)),
        }
    }
}

impl<'de> Deserialize<'de> for ValueType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = ValueTypeRepr::deserialize(deserializer)?;
        repr.resolve().map_err(D::Error::custom)
    }
}

/// Search index target type for a hinted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchFieldType {
    Keyword,
    Text,
    TextPartial,
    Urn,
    Boolean,
    Count,
    Datetime,
    Object,
}

impl SearchFieldType {
    /// Returns the wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchFieldType::Keyword => "KEYWORD",
            SearchFieldType::Text => "TEXT",
            SearchFieldType::TextPartial => "TEXT_PARTIAL",
            SearchFieldType::Urn => "URN",
            SearchFieldType::Boolean => "BOOLEAN",
            SearchFieldType::Count => "COUNT",
            SearchFieldType::Datetime => "DATETIME",
            SearchFieldType::Object => "OBJECT",
        }
    }
}

/// Search projection hint attached to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHint {
    /// Overrides the projected field name when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    /// Index target type.
    pub field_type: SearchFieldType,
    /// Whether the field participates in unqualified queries.
    #[serde(default)]
    pub query_by_default: bool,
}

impl SearchHint {
    /// Hint projected under the declared field name.
    pub fn new(field_type: SearchFieldType) -> Self {
        Self {
            field_name: None,
            field_type,
            query_by_default: false,
        }
    }

    /// Hint projected under an overriding name.
    pub fn named(field_name: impl Into<String>, field_type: SearchFieldType) -> Self {
        Self {
            field_name: Some(field_name.into()),
            field_type,
            query_by_default: false,
        }
    }

    /// Marks the field as queryable by default.
    pub fn query_by_default(mut self) -> Self {
        self.query_by_default = true;
        self
    }
}

/// Time-series projection hint attached to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeseriesHint {
    /// Single-value statistic field.
    #[serde(default)]
    pub is_field: bool,
    /// Collection field; projected once per element.
    #[serde(default)]
    pub is_collection: bool,
    /// Payload key distinguishing collection elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_key: Option<String>,
}

impl TimeseriesHint {
    /// Single-value statistic hint.
    pub fn field() -> Self {
        Self {
            is_field: true,
            is_collection: false,
            collection_key: None,
        }
    }

    /// Collection hint keyed by the given element field.
    pub fn collection(key: impl Into<String>) -> Self {
        Self {
            is_field: false,
            is_collection: true,
            collection_key: Some(key.into()),
        }
    }
}

/// A single declared field of an aspect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Field name as it appears in payloads.
    pub name: String,
    /// Declared value type.
    #[serde(rename = "type")]
    pub value_type: ValueType,
    /// Whether the field may be absent from a payload.
    #[serde(default)]
    pub optional: bool,
    /// Search projection hint, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchHint>,
    /// Time-series projection hint, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeseries: Option<TimeseriesHint>,
}

impl FieldDescriptor {
    /// Create a required field.
    pub fn required(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            optional: false,
            search: None,
            timeseries: None,
        }
    }

    /// Create an optional field.
    pub fn optional(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            optional: true,
            search: None,
            timeseries: None,
        }
    }

    /// Attach a search hint.
    pub fn with_search(mut self, hint: SearchHint) -> Self {
        self.search = Some(hint);
        self
    }

    /// Attach a time-series hint.
    pub fn with_timeseries(mut self, hint: TimeseriesHint) -> Self {
        self.timeseries = Some(hint);
        self
    }

    /// Name under which a search hint projects this field.
    pub fn projected_name(&self) -> &str {
        self.search
            .as_ref()
            .and_then(|hint| hint.field_name.as_deref())
            .unwrap_or(&self.name)
    }
}

/// Complete descriptor for one aspect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectDescriptor {
    /// Unique aspect name.
    pub name: String,
    /// Storage kind.
    pub kind: AspectKind,
    /// Declared fields, in declaration order.
    pub fields: Vec<FieldDescriptor>,
}

impl AspectDescriptor {
    /// Create a versioned aspect descriptor.
    pub fn versioned(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            kind: AspectKind::Versioned,
            fields,
        }
    }

    /// Create a time-series aspect descriptor.
    pub fn timeseries(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            kind: AspectKind::Timeseries,
            fields,
        }
    }

    /// Whether this aspect is stored as a time series.
    pub fn is_timeseries(&self) -> bool {
        self.kind == AspectKind::Timeseries
    }

    /// Look up a declared field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Declared field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    /// Validates the descriptor structure itself (not a payload).
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Aspect name must not be empty".into());
        }

        if self.fields.is_empty() {
            return Err(format!("Aspect '{}' declares no fields", self.name));
        }

        for (position, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(format!(
                    "Aspect '{}' field at position {} has an empty name",
                    self.name, position
                ));
            }

            let duplicated = self.fields[..position]
                .iter()
                .any(|prior| prior.name == field.name);
            if duplicated {
                return Err(format!(
                    "Aspect '{}' declares field '{}' more than once",
                    self.name, field.name
                ));
            }

            if let Some(hint) = &field.timeseries {
                if hint.is_collection && hint.collection_key.is_none() {
                    return Err(format!(
                        "Aspect '{}' field '{}': collection hint requires a key",
                        self.name, field.name
                    ));
                }
            }
        }

        Ok(())
    }
}

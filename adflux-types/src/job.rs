//! Report job descriptors, run parameters and table schemas.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AdfluxError;

/// Per-run string parameters handed to every report job operation,
/// e.g. `startDate` and `endDate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportParameters(BTreeMap<String, String>);

impl ReportParameters {
    /// Empty parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Look up a parameter.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterate over all parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replace every `${key}` in `template` with the matching parameter.
    /// Unknown placeholders are left as they are.
    #[must_use]
    pub fn substitute(&self, template: &str) -> String {
        let mut out = template.to_string();
        for (k, v) in &self.0 {
            out = out.replace(&format!("${{{k}}}"), v);
        }
        out
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ReportParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Information returned by `generate` and consumed by `is_ready` and
/// `get_content`.
///
/// The driver treats it as opaque. Asynchronous platforms store remote ids in
/// `fields`; synchronous platforms may store the finished content directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    fields: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

impl JobDescriptor {
    /// Empty descriptor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptor for a job whose content is already available.
    #[must_use]
    pub fn completed(content: impl Into<String>) -> Self {
        Self {
            fields: BTreeMap::new(),
            content: Some(content.into()),
        }
    }

    /// Builder-style field insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Look up a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Look up a field that must be present.
    ///
    /// # Errors
    /// Returns `AdfluxError::Data` when the field is missing.
    pub fn require(&self, key: &str) -> Result<&str, AdfluxError> {
        self.get(key)
            .ok_or_else(|| AdfluxError::Data(format!("job descriptor is missing '{key}'")))
    }

    /// Content captured at generation time, if any.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }
}

/// BigQuery column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    /// UTF-8 string.
    String,
    /// 64-bit integer.
    Integer,
    /// 64-bit float.
    Float,
    /// Boolean.
    Boolean,
    /// Timestamp.
    Timestamp,
    /// Calendar date.
    Date,
    /// Nested record.
    Record,
}

/// BigQuery column mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldMode {
    /// Column may be null.
    #[default]
    Nullable,
    /// Column must be set.
    Required,
    /// Column is an array.
    Repeated,
}

/// One column of a table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableField {
    /// Column name.
    pub name: String,
    /// Column type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Column mode.
    #[serde(default)]
    pub mode: FieldMode,
    /// Nested columns for `RECORD` fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<TableField>,
}

impl TableField {
    /// A nullable column.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            mode: FieldMode::Nullable,
            fields: Vec::new(),
        }
    }

    /// Builder-style mode override.
    #[must_use]
    pub const fn mode(mut self, mode: FieldMode) -> Self {
        self.mode = mode;
        self
    }

    /// A nested record column.
    pub fn record(name: impl Into<String>, fields: Vec<Self>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Record,
            mode: FieldMode::Nullable,
            fields,
        }
    }
}

/// Tabular schema the content of a report maps to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Columns in load order.
    pub fields: Vec<TableField>,
}

impl TableSchema {
    /// Build a schema from columns.
    #[must_use]
    pub const fn new(fields: Vec<TableField>) -> Self {
        Self { fields }
    }

    /// Column names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitute_fills_known_placeholders_only() {
        let p = ReportParameters::new()
            .with("startDate", "2024-01-01")
            .with("endDate", "2024-01-31");
        assert_eq!(
            p.substitute("segments.date BETWEEN '${startDate}' AND '${endDate}' ${other}"),
            "segments.date BETWEEN '2024-01-01' AND '2024-01-31' ${other}"
        );
    }

    #[test]
    fn schema_serializes_in_load_format() {
        let s = TableSchema::new(vec![
            TableField::new("id", FieldType::String).mode(FieldMode::Required),
            TableField::record("snippet", vec![TableField::new("title", FieldType::String)]),
        ]);
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["fields"][0]["type"], "STRING");
        assert_eq!(v["fields"][0]["mode"], "REQUIRED");
        assert_eq!(v["fields"][1]["fields"][0]["name"], "title");
        assert!(v["fields"][0].get("fields").is_none());
    }
}

//! Building conversion payloads from raw input lines.
//!
//! Each line is a JSON object. The payload for a line is built as:
//!
//! 1. per-batch defaults (`ordinal`, `timestampMicros`) derived from one clock reading;
//! 2. [`merge_fields`] of the defaults, the batch's static template and the
//!    record's allow-listed fields, later layers overriding earlier ones;
//! 3. the join-key field named by the batch's id type, copied from the record;
//! 4. `customVariables`, one `{type, value}` pair per configured name.

use adflux_types::{AdfluxError, BatchConfig, EncryptionInfo};
use serde::Serialize;
use serde_json::Value;

/// A JSON object keyed by field name.
pub type Fields = serde_json::Map<String, Value>;

/// Record fields that may override defaults and template values.
pub const PICKED_PROPERTIES: &[&str] = &["ordinal", "timestampMicros", "value", "quantity"];

/// Parse one input line as a record.
///
/// # Errors
/// Returns `AdfluxError::InvalidRecord` when the line is not a JSON object.
pub fn parse_record(line: &str) -> Result<Fields, AdfluxError> {
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AdfluxError::invalid_record("line is not a JSON object")),
        Err(e) => Err(AdfluxError::invalid_record(format!("line is not valid JSON: {e}"))),
    }
}

/// Defaults for fields the platform requires but records may omit.
#[must_use]
pub fn default_fields(now_millis: i64) -> Fields {
    let mut f = Fields::new();
    f.insert("ordinal".into(), Value::String(now_millis.to_string()));
    f.insert(
        "timestampMicros".into(),
        Value::String(now_millis.saturating_mul(1000).to_string()),
    );
    f
}

/// Project a record onto an allow-list of field names.
#[must_use]
pub fn pick_fields(record: &Fields, allowed: &[&str]) -> Fields {
    allowed
        .iter()
        .filter_map(|k| record.get(*k).map(|v| ((*k).to_string(), v.clone())))
        .collect()
}

/// Merge three layers into one payload. `picked` overrides `template`,
/// which overrides `defaults`.
#[must_use]
pub fn merge_fields(defaults: Fields, template: &Fields, picked: &Fields) -> Fields {
    let mut out = defaults;
    for layer in [template, picked] {
        for (k, v) in layer {
            out.insert(k.clone(), v.clone());
        }
    }
    out
}

/// Builds payloads for every record of one batch.
#[derive(Debug, Clone)]
pub struct ConversionBuilder<'a> {
    config: &'a BatchConfig,
    defaults: Fields,
    template: Fields,
}

impl<'a> ConversionBuilder<'a> {
    /// Prepare a builder for one batch; `now_millis` seeds the shared defaults.
    #[must_use]
    pub fn new(config: &'a BatchConfig, now_millis: i64) -> Self {
        Self {
            config,
            defaults: default_fields(now_millis),
            template: config.conversion.to_fields(),
        }
    }

    /// Build the payload for one parsed record.
    ///
    /// # Errors
    /// Returns `AdfluxError::InvalidRecord` when the record lacks the id-type
    /// field or a configured custom variable.
    pub fn build(&self, record: &Fields) -> Result<Fields, AdfluxError> {
        let mut conversion = merge_fields(
            self.defaults.clone(),
            &self.template,
            &pick_fields(record, PICKED_PROPERTIES),
        );

        let id_field = self.config.id_type.field_name();
        let id = present(record, id_field)
            .ok_or_else(|| AdfluxError::invalid_record(format!("missing {id_field}")))?;
        conversion.insert(id_field.to_string(), id.clone());

        if let Some(names) = &self.config.custom_variables {
            let mut vars = Vec::with_capacity(names.len());
            for name in names {
                let value = present(record, name).ok_or_else(|| {
                    AdfluxError::invalid_record(format!("missing custom variable {name}"))
                })?;
                let mut var = Fields::new();
                var.insert("type".into(), Value::String(name.clone()));
                var.insert("value".into(), value.clone());
                vars.push(Value::Object(var));
            }
            conversion.insert("customVariables".into(), Value::Array(vars));
        }
        Ok(conversion)
    }

    /// Parse and build one line.
    ///
    /// # Errors
    /// Propagates the parse or build failure for this line.
    pub fn build_line(&self, line: &str) -> Result<Fields, AdfluxError> {
        self.build(&parse_record(line)?)
    }
}

fn present<'r>(record: &'r Fields, key: &str) -> Option<&'r Value> {
    record.get(key).filter(|v| !v.is_null())
}

/// Request body for a conversion batch insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionsRequest {
    /// Conversion payloads, one per submitted line.
    pub conversions: Vec<Fields>,
    /// Encryption metadata, present only for encrypted user ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_info: Option<EncryptionInfo>,
}

/// A batch split into a request and the lines rejected locally.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedBatch {
    /// Request for the well-formed lines.
    pub request: ConversionsRequest,
    /// Input index of each submitted conversion, aligned with `request.conversions`.
    pub submitted: Vec<usize>,
    /// Input index and reason of each rejected line.
    pub rejected: Vec<(usize, AdfluxError)>,
}

impl PreparedBatch {
    /// Returns true when nothing is left to send.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.submitted.is_empty()
    }
}

/// Turn a batch of lines into one insert request.
///
/// Lines that fail to parse or lack required fields are set aside in
/// `rejected` instead of aborting the batch. The caller's config is only read.
#[must_use]
pub fn prepare_batch(config: &BatchConfig, lines: &[String], now_millis: i64) -> PreparedBatch {
    let builder = ConversionBuilder::new(config, now_millis);
    let mut conversions = Vec::with_capacity(lines.len());
    let mut submitted = Vec::with_capacity(lines.len());
    let mut rejected = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        match builder.build_line(line) {
            Ok(c) => {
                conversions.push(c);
                submitted.push(i);
            }
            Err(e) => rejected.push((i, e)),
        }
    }
    let encryption_info = if config.id_type.requires_encryption() {
        config.encryption_info.clone()
    } else {
        None
    };
    PreparedBatch {
        request: ConversionsRequest {
            conversions,
            encryption_info,
        },
        submitted,
        rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(v: Value) -> Fields {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn merge_precedence_is_record_over_template_over_defaults() {
        let defaults = fields(json!({"ordinal": "1", "timestampMicros": "1000", "quantity": 9}));
        let template = fields(json!({"quantity": 2, "floodlightActivityId": "a"}));
        let picked = fields(json!({"ordinal": "7"}));
        let out = merge_fields(defaults, &template, &picked);
        assert_eq!(out["ordinal"], "7");
        assert_eq!(out["timestampMicros"], "1000");
        assert_eq!(out["quantity"], 2);
        assert_eq!(out["floodlightActivityId"], "a");
    }

    #[test]
    fn pick_ignores_unknown_fields() {
        let rec = fields(json!({"value": 3.5, "gclid": "x", "other": 1}));
        let picked = pick_fields(&rec, PICKED_PROPERTIES);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked["value"], 3.5);
    }

    #[test]
    fn parse_rejects_non_objects() {
        assert!(matches!(parse_record("[1,2]"), Err(AdfluxError::InvalidRecord(_))));
        assert!(matches!(parse_record("{oops"), Err(AdfluxError::InvalidRecord(_))));
        assert!(parse_record(r#"{"gclid":"g"}"#).is_ok());
    }

    #[test]
    fn defaults_share_one_clock_reading() {
        let d = default_fields(1_700_000_000_000);
        assert_eq!(d["ordinal"], "1700000000000");
        assert_eq!(d["timestampMicros"], "1700000000000000");
    }
}

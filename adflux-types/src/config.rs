//! Configuration types for conversion uploads and the report driver.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AdfluxError;

/// Identifier type that joins a conversion to a user, click or device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdType {
    /// Encrypted user id; requires [`EncryptionInfo`] on the batch.
    EncryptedUserId,
    /// Google click id.
    Gclid,
    /// Mobile device advertising id.
    MobileDeviceId,
}

impl IdType {
    /// Field name used both in input records and in the conversion payload.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::EncryptedUserId => "encryptedUserId",
            Self::Gclid => "gclid",
            Self::MobileDeviceId => "mobileDeviceId",
        }
    }

    /// Whether batches using this id type must carry encryption metadata.
    #[must_use]
    pub const fn requires_encryption(self) -> bool {
        matches!(self, Self::EncryptedUserId)
    }
}

/// Encryption metadata sent alongside encrypted user ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionInfo {
    /// Entity id that owns the encryption key.
    pub encryption_entity_id: String,
    /// Entity type, e.g. `DCM_ADVERTISER`.
    pub encryption_entity_type: String,
    /// Source of the encrypted ids, e.g. `AD_SERVING`.
    pub encryption_source: String,
}

/// Static conversion fields merged into every record of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionTemplate {
    /// Floodlight configuration id.
    pub floodlight_configuration_id: String,
    /// Floodlight activity id.
    pub floodlight_activity_id: String,
    /// Default quantity, overridable by records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u64>,
    /// Any further static conversion fields.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ConversionTemplate {
    /// Render the template as a JSON field map in payload naming.
    #[must_use]
    pub fn to_fields(&self) -> serde_json::Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

/// Immutable configuration for one conversion batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchConfig {
    /// Target user profile.
    pub profile_id: String,
    /// Active id type; selects the join-key field of each record.
    pub id_type: IdType,
    /// Static fields merged into every conversion.
    pub conversion: ConversionTemplate,
    /// Record fields forwarded as custom floodlight variables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_variables: Option<Vec<String>>,
    /// Encryption metadata, required iff the id type is encrypted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_info: Option<EncryptionInfo>,
}

impl BatchConfig {
    /// Check the batch invariants.
    ///
    /// # Errors
    /// Returns `AdfluxError::Config` when the profile id is empty or when
    /// encryption metadata does not match the id type.
    pub fn validate(&self) -> Result<(), AdfluxError> {
        if self.profile_id.trim().is_empty() {
            return Err(AdfluxError::config("batch config has an empty profileId"));
        }
        match (self.id_type.requires_encryption(), &self.encryption_info) {
            (true, None) => Err(AdfluxError::config(format!(
                "idType {} requires encryptionInfo",
                self.id_type.field_name()
            ))),
            (false, Some(_)) => Err(AdfluxError::config(format!(
                "encryptionInfo is only valid with idType encryptedUserId, got {}",
                self.id_type.field_name()
            ))),
            _ => Ok(()),
        }
    }
}

/// Exponential backoff between report attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Minimum backoff delay in milliseconds.
    pub min_backoff_ms: u64,
    /// Maximum backoff delay in milliseconds.
    pub max_backoff_ms: u64,
    /// Exponential factor to increase delay after each failure (>= 1).
    pub factor: u32,
    /// Random jitter percentage [0, 100] added to each delay.
    pub jitter_percent: u8,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_backoff_ms: 1_000,
            max_backoff_ms: 60_000,
            factor: 2,
            jitter_percent: 20,
        }
    }
}

/// Configuration of the report-task driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Wait between two readiness checks of an asynchronous job.
    pub poll_interval: Duration,
    /// Total attempts (generate through content) before giving up.
    pub max_attempts: u32,
    /// Optional overall deadline for one task run. `None` polls without bound.
    pub deadline: Option<Duration>,
    /// Delay policy between attempts.
    pub backoff: BackoffConfig,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            max_attempts: 3,
            deadline: None,
            backoff: BackoffConfig::default(),
        }
    }
}

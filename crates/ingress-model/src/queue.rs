//! Queue attributes managed by the provisioner.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ModelError, ModelResult};

/// Visibility timeout: a claimed but unacknowledged message becomes
/// receivable again after five minutes. Must exceed consumer processing time.
pub const VISIBILITY_TIMEOUT_SECS: u32 = 300;

/// Retention period: unconsumed messages expire after 14 days.
pub const MESSAGE_RETENTION_PERIOD_SECS: u32 = 1_209_600;

/// Attribute names used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueAttributeName {
    /// `QueueArn`.
    QueueArn,
    /// `VisibilityTimeout`.
    VisibilityTimeout,
    /// `MessageRetentionPeriod`.
    MessageRetentionPeriod,
    /// `Policy`.
    Policy,
}

impl QueueAttributeName {
    /// The name as sent to the provider.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::QueueArn => "QueueArn",
            Self::VisibilityTimeout => "VisibilityTimeout",
            Self::MessageRetentionPeriod => "MessageRetentionPeriod",
            Self::Policy => "Policy",
        }
    }
}

impl fmt::Display for QueueAttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The queue settings this tool creates and verifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueAttributes {
    /// Visibility timeout in seconds.
    pub visibility_timeout: u32,
    /// Retention period in seconds.
    pub message_retention_period: u32,
}

impl Default for QueueAttributes {
    fn default() -> Self {
        Self {
            visibility_timeout: VISIBILITY_TIMEOUT_SECS,
            message_retention_period: MESSAGE_RETENTION_PERIOD_SECS,
        }
    }
}

impl QueueAttributes {
    /// Encode as wire attributes.
    #[must_use]
    pub fn to_wire(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                QueueAttributeName::VisibilityTimeout.as_str().to_owned(),
                self.visibility_timeout.to_string(),
            ),
            (
                QueueAttributeName::MessageRetentionPeriod.as_str().to_owned(),
                self.message_retention_period.to_string(),
            ),
        ])
    }

    /// Decode from wire attributes as returned by `GetQueueAttributes`.
    pub fn from_wire(attrs: &BTreeMap<String, String>) -> ModelResult<Self> {
        Ok(Self {
            visibility_timeout: parse_seconds(attrs, QueueAttributeName::VisibilityTimeout)?,
            message_retention_period: parse_seconds(
                attrs,
                QueueAttributeName::MessageRetentionPeriod,
            )?,
        })
    }
}

fn parse_seconds(attrs: &BTreeMap<String, String>, name: QueueAttributeName) -> ModelResult<u32> {
    let raw = attrs
        .get(name.as_str())
        .ok_or(ModelError::MissingQueueAttribute(name.as_str()))?;
    raw.parse().map_err(|_| ModelError::InvalidQueueAttribute {
        name: name.as_str(),
        value: raw.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_default_to_fixed_values() {
        let attrs = QueueAttributes::default();
        assert_eq!(attrs.visibility_timeout, 300);
        assert_eq!(attrs.message_retention_period, 1_209_600);
    }

    #[test]
    fn test_should_encode_wire_attributes() {
        let wire = QueueAttributes::default().to_wire();
        assert_eq!(wire.get("VisibilityTimeout").map(String::as_str), Some("300"));
        assert_eq!(
            wire.get("MessageRetentionPeriod").map(String::as_str),
            Some("1209600")
        );
    }

    #[test]
    fn test_should_report_missing_and_invalid_attributes() {
        let mut wire = BTreeMap::from([("VisibilityTimeout".to_owned(), "300".to_owned())]);
        assert_eq!(
            QueueAttributes::from_wire(&wire),
            Err(ModelError::MissingQueueAttribute("MessageRetentionPeriod"))
        );

        wire.insert("MessageRetentionPeriod".to_owned(), "two weeks".to_owned());
        assert!(matches!(
            QueueAttributes::from_wire(&wire),
            Err(ModelError::InvalidQueueAttribute { .. })
        ));
    }
}

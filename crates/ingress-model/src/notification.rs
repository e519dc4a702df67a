//! Bucket event notification configuration.

use serde::{Deserialize, Serialize};

/// Event class for every object-creation sub-event (put, post, copy,
/// multipart completion).
pub const OBJECT_CREATED_EVENT: &str = "s3:ObjectCreated:*";

/// A single key filter rule (`prefix` or `suffix`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FilterRule {
    /// `prefix` or `suffix`.
    pub name: String,
    /// Value to match.
    pub value: String,
}

/// Object key filter attached to a notification target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyFilter {
    /// Filter rules, all of which must match.
    pub filter_rules: Vec<FilterRule>,
}

/// Delivery of bucket events to an SQS queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueueConfiguration {
    /// Configuration id, unique within the bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Destination queue ARN.
    pub queue_arn: String,
    /// Event classes delivered.
    pub events: Vec<String>,
    /// Optional key filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<KeyFilter>,
}

impl QueueConfiguration {
    /// All object-created events, unfiltered, delivered to `queue_arn`.
    #[must_use]
    pub fn object_created(id: impl Into<String>, queue_arn: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            queue_arn: queue_arn.into(),
            events: vec![OBJECT_CREATED_EVENT.to_owned()],
            filter: None,
        }
    }
}

/// Delivery of bucket events to an SNS topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TopicConfiguration {
    /// Configuration id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Destination topic ARN.
    pub topic_arn: String,
    /// Event classes delivered.
    pub events: Vec<String>,
    /// Optional key filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<KeyFilter>,
}

/// Delivery of bucket events to a Lambda function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LambdaFunctionConfiguration {
    /// Configuration id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Destination function ARN.
    pub lambda_function_arn: String,
    /// Event classes delivered.
    pub events: Vec<String>,
    /// Optional key filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<KeyFilter>,
}

/// The complete notification configuration of a bucket.
///
/// S3 stores this as a single document: a put replaces everything, so
/// callers that want to keep other targets must read, merge, then write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NotificationConfiguration {
    /// SQS targets.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub queue_configurations: Vec<QueueConfiguration>,
    /// SNS targets.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topic_configurations: Vec<TopicConfiguration>,
    /// Lambda targets.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lambda_function_configurations: Vec<LambdaFunctionConfiguration>,
    /// Whether events are also delivered to EventBridge.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub event_bridge_enabled: bool,
}

impl NotificationConfiguration {
    /// Find a queue target by id.
    #[must_use]
    pub fn queue_configuration(&self, id: &str) -> Option<&QueueConfiguration> {
        self.queue_configurations
            .iter()
            .find(|c| c.id.as_deref() == Some(id))
    }

    /// Insert `config`, replacing the queue target with the same id.
    ///
    /// Returns `false` when an identical target was already present.
    pub fn upsert_queue_configuration(&mut self, config: QueueConfiguration) -> bool {
        if self.queue_configurations.contains(&config) {
            return false;
        }

        let position = self
            .queue_configurations
            .iter()
            .position(|c| c.id.is_some() && c.id == config.id);
        match position {
            Some(i) => self.queue_configurations[i] = config,
            None => self.queue_configurations.push(config),
        }
        true
    }

    /// Whether the configuration has no targets at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue_configurations.is_empty()
            && self.topic_configurations.is_empty()
            && self.lambda_function_configurations.is_empty()
            && !self.event_bridge_enabled
    }
}

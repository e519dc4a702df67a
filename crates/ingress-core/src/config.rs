//! Provisioner configuration.
//!
//! Values are loaded from environment variables; the CLI overlays its flags
//! on top. Nothing here talks to AWS.

use std::fmt;
use std::str::FromStr;

use ingress_model::{
    AwsRegion, MESSAGE_RETENTION_PERIOD_SECS, QueueAttributes, VISIBILITY_TIMEOUT_SECS,
};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::{ProvisionError, ProvisionResult};

/// What the bucket and queue steps do when the resource already exists.
///
/// Identity resources are never adopted: a second access key must not be
/// minted silently under an existing user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnExisting {
    /// Surface a name collision without touching the resource.
    #[default]
    Fail,
    /// Reuse the existing bucket or queue and reconcile its settings.
    Adopt,
}

impl FromStr for OnExisting {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "adopt" => Ok(Self::Adopt),
            other => Err(ProvisionError::Config(format!(
                "invalid existing-resource policy {other:?} (expected \"fail\" or \"adopt\")"
            ))),
        }
    }
}

impl fmt::Display for OnExisting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fail => "fail",
            Self::Adopt => "adopt",
        })
    }
}

/// Configuration for one provisioning run.
///
/// # Examples
///
/// ```
/// use ingress_core::config::IngressConfig;
///
/// let config = IngressConfig::builder()
///     .bucket_name("b1")
///     .queue_name("q1")
///     .user_name("u1")
///     .build();
/// assert_eq!(config.region.as_str(), "us-east-1");
/// assert_eq!(config.visibility_timeout, 300);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct IngressConfig {
    /// Region for the bucket and queue.
    #[builder(default)]
    pub region: AwsRegion,

    /// Bucket name (globally unique).
    #[builder(default = String::from(DEFAULT_BUCKET), setter(into))]
    pub bucket_name: String,

    /// Queue name.
    #[builder(default = String::from(DEFAULT_QUEUE), setter(into))]
    pub queue_name: String,

    /// IAM user name.
    #[builder(default = String::from(DEFAULT_USER), setter(into))]
    pub user_name: String,

    /// IAM managed policy name.
    #[builder(default = String::from(DEFAULT_POLICY), setter(into))]
    pub policy_name: String,

    /// Queue visibility timeout in seconds.
    #[builder(default = VISIBILITY_TIMEOUT_SECS)]
    pub visibility_timeout: u32,

    /// Queue retention period in seconds.
    #[builder(default = MESSAGE_RETENTION_PERIOD_SECS)]
    pub message_retention_period: u32,

    /// Existing-resource policy for the bucket and queue.
    #[builder(default)]
    pub on_existing: OnExisting,

    /// Custom service endpoint (LocalStack-compatible servers).
    #[builder(default, setter(strip_option, into))]
    pub endpoint_url: Option<String>,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"), setter(into))]
    pub log_level: String,
}

const DEFAULT_BUCKET: &str = "audio-transcriber-ingress-bucket";
const DEFAULT_QUEUE: &str = "audio-transcriber-ingress-queue";
const DEFAULT_USER: &str = "audio-transcriber-ingress-user";
const DEFAULT_POLICY: &str = "AudioTranscriberIngressPolicy";

impl Default for IngressConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl IngressConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `INGRESS_REGION` (then `AWS_REGION`, `DEFAULT_REGION`) | `us-east-1` |
    /// | `INGRESS_BUCKET` | `audio-transcriber-ingress-bucket` |
    /// | `INGRESS_QUEUE` | `audio-transcriber-ingress-queue` |
    /// | `INGRESS_USER` | `audio-transcriber-ingress-user` |
    /// | `INGRESS_POLICY` | `AudioTranscriberIngressPolicy` |
    /// | `INGRESS_ON_EXISTING` | `fail` |
    /// | `INGRESS_ENDPOINT_URL` (then `AWS_ENDPOINT_URL`) | *(unset)* |
    /// | `LOG_LEVEL` | `info` |
    pub fn from_env() -> ProvisionResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ProvisionResult<Self> {
        let first = |keys: &[&str]| keys.iter().find_map(|k| lookup(*k));
        let mut config = Self::default();

        if let Some(v) = first(&["INGRESS_REGION", "AWS_REGION", "DEFAULT_REGION"]) {
            config.region = AwsRegion::new(v);
        }
        if let Some(v) = lookup("INGRESS_BUCKET") {
            config.bucket_name = v;
        }
        if let Some(v) = lookup("INGRESS_QUEUE") {
            config.queue_name = v;
        }
        if let Some(v) = lookup("INGRESS_USER") {
            config.user_name = v;
        }
        if let Some(v) = lookup("INGRESS_POLICY") {
            config.policy_name = v;
        }
        if let Some(v) = lookup("INGRESS_ON_EXISTING") {
            config.on_existing = v.parse()?;
        }
        if let Some(v) = first(&["INGRESS_ENDPOINT_URL", "AWS_ENDPOINT_URL"]) {
            config.endpoint_url = Some(v);
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        Ok(config)
    }

    /// The queue attributes to create and verify.
    #[must_use]
    pub fn queue_attributes(&self) -> QueueAttributes {
        QueueAttributes {
            visibility_timeout: self.visibility_timeout,
            message_retention_period: self.message_retention_period,
        }
    }

    /// Check names against provider naming rules before any call is made.
    pub fn validate(&self) -> ProvisionResult<()> {
        validate_bucket_name(&self.bucket_name)?;
        validate_name("queue", &self.queue_name, 80, |c| {
            c.is_ascii_alphanumeric() || c == '-' || c == '_'
        })?;
        validate_name("user", &self.user_name, 64, is_iam_name_char)?;
        validate_name("policy", &self.policy_name, 128, is_iam_name_char)?;

        if self.region.as_str().is_empty() {
            return Err(ProvisionError::Config("region must not be empty".to_owned()));
        }
        if self.visibility_timeout > 43_200 {
            return Err(ProvisionError::Config(format!(
                "visibility timeout {} exceeds 43200 seconds",
                self.visibility_timeout
            )));
        }
        if !(60..=1_209_600).contains(&self.message_retention_period) {
            return Err(ProvisionError::Config(format!(
                "retention period {} outside 60..=1209600 seconds",
                self.message_retention_period
            )));
        }
        Ok(())
    }
}

fn is_iam_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "+=,.@_-".contains(c)
}

fn validate_name(
    kind: &str,
    name: &str,
    max: usize,
    allowed: impl Fn(char) -> bool,
) -> ProvisionResult<()> {
    if name.is_empty() || name.len() > max {
        return Err(ProvisionError::Config(format!(
            "{kind} name {name:?} must be 1-{max} characters"
        )));
    }
    if let Some(c) = name.chars().find(|c| !allowed(*c)) {
        return Err(ProvisionError::Config(format!(
            "{kind} name {name:?} contains invalid character {c:?}"
        )));
    }
    Ok(())
}

fn validate_bucket_name(name: &str) -> ProvisionResult<()> {
    validate_name("bucket", name, 63, |c| {
        c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-'
    })?;

    let edges_ok = name.starts_with(|c: char| c.is_ascii_alphanumeric())
        && name.ends_with(|c: char| c.is_ascii_alphanumeric());
    // The 3-character floor is left to the provider.
    if !edges_ok || name.contains("..") {
        return Err(ProvisionError::Config(format!(
            "bucket name {name:?} must start and end with a letter or digit \
             and not contain \"..\""
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_should_create_default_config() {
        let config = IngressConfig::default();
        assert_eq!(config.region.as_str(), "us-east-1");
        assert_eq!(config.bucket_name, "audio-transcriber-ingress-bucket");
        assert_eq!(config.policy_name, "AudioTranscriberIngressPolicy");
        assert_eq!(config.on_existing, OnExisting::Fail);
        assert_eq!(config.queue_attributes(), QueueAttributes::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_should_load_from_lookup() {
        let config = IngressConfig::from_lookup(lookup(&[
            ("AWS_REGION", "eu-west-1"),
            ("INGRESS_BUCKET", "b1"),
            ("INGRESS_QUEUE", "q1"),
            ("INGRESS_USER", "u1"),
            ("INGRESS_ON_EXISTING", "Adopt"),
            ("AWS_ENDPOINT_URL", "http://localhost:4566"),
        ]))
        .unwrap();

        assert_eq!(config.region.as_str(), "eu-west-1");
        assert_eq!(config.bucket_name, "b1");
        assert_eq!(config.queue_name, "q1");
        assert_eq!(config.user_name, "u1");
        assert_eq!(config.on_existing, OnExisting::Adopt);
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:4566"));
    }

    #[test]
    fn test_should_prefer_ingress_region() {
        let config = IngressConfig::from_lookup(lookup(&[
            ("INGRESS_REGION", "ap-south-1"),
            ("AWS_REGION", "eu-west-1"),
        ]))
        .unwrap();
        assert_eq!(config.region.as_str(), "ap-south-1");
    }

    #[test]
    fn test_should_reject_unknown_existing_policy() {
        let result = IngressConfig::from_lookup(lookup(&[("INGRESS_ON_EXISTING", "merge")]));
        assert!(matches!(result, Err(ProvisionError::Config(_))));
    }

    #[test]
    fn test_should_reject_invalid_names() {
        let bad_buckets = ["", "Upper", "-lead", "trail-", "a..b", "under_score"];
        for bucket in bad_buckets {
            let config = IngressConfig::builder().bucket_name(bucket).build();
            assert!(config.validate().is_err(), "{bucket} should be rejected");
        }

        let config = IngressConfig::builder().queue_name("has space").build();
        assert!(config.validate().is_err());

        let config = IngressConfig::builder().user_name("").build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_should_accept_short_names() {
        let config = IngressConfig::builder()
            .bucket_name("b1")
            .queue_name("q1")
            .user_name("u1")
            .build();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_should_reject_out_of_range_queue_settings() {
        let config = IngressConfig::builder().message_retention_period(10).build();
        assert!(config.validate().is_err());

        let config = IngressConfig::builder().visibility_timeout(50_000).build();
        assert!(config.validate().is_err());
    }
}

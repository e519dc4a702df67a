//! Amazon Resource Names.
//!
//! Queue ARNs are only ever produced by parsing what the provider returned;
//! bucket ARNs are built locally because S3 ARNs carry neither region nor
//! account.

use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;
use crate::types::Partition;

/// A parsed ARN: `arn:<partition>:<service>:<region>:<account>:<resource>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Arn {
    partition: Partition,
    service: String,
    region: String,
    account: String,
    resource: String,
}

impl Arn {
    /// ARN of an S3 bucket.
    #[must_use]
    pub fn s3_bucket(partition: Partition, bucket: &str) -> Self {
        Self {
            partition,
            service: "s3".to_owned(),
            region: String::new(),
            account: String::new(),
            resource: bucket.to_owned(),
        }
    }

    /// ARN matching every object in an S3 bucket (`<bucket>/*`).
    #[must_use]
    pub fn s3_objects(partition: Partition, bucket: &str) -> Self {
        Self {
            resource: format!("{bucket}/*"),
            ..Self::s3_bucket(partition, bucket)
        }
    }

    /// Partition segment.
    #[must_use]
    pub fn partition(&self) -> Partition {
        self.partition
    }

    /// Service segment (`s3`, `sqs`, `iam`).
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Region segment; empty for global resources.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Account segment; empty for S3 buckets.
    #[must_use]
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Resource segment.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }
}

impl FromStr for Arn {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| ModelError::InvalidArn {
            arn: s.to_owned(),
            reason,
        };

        if s.chars().any(char::is_whitespace) {
            return Err(invalid("contains whitespace"));
        }

        let parts: Vec<&str> = s.splitn(6, ':').collect();
        let [prefix, partition, service, region, account, resource] = parts[..] else {
            return Err(invalid("expected six ':'-separated segments"));
        };

        if prefix != "arn" {
            return Err(invalid("must start with \"arn:\""));
        }
        let partition =
            Partition::from_segment(partition).ok_or_else(|| invalid("unknown partition"))?;
        if service.is_empty() {
            return Err(invalid("empty service"));
        }
        let account_ok = account.len() == 12 && account.bytes().all(|b| b.is_ascii_digit());
        if !account.is_empty() && !account_ok {
            return Err(invalid("account must be empty or a 12-digit account id"));
        }
        if resource.is_empty() {
            return Err(invalid("empty resource"));
        }

        Ok(Self {
            partition,
            service: service.to_owned(),
            region: region.to_owned(),
            account: account.to_owned(),
            resource: resource.to_owned(),
        })
    }
}

impl TryFrom<String> for Arn {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Arn> for String {
    fn from(arn: Arn) -> Self {
        arn.to_string()
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account, self.resource
        )
    }
}

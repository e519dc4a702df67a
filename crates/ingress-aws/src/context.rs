//! Shared AWS configuration context.

use std::sync::Arc;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use ingress_core::Services;
use ingress_model::AwsRegion;
use tracing::debug;

use crate::{IamIdentity, S3Storage, SqsQueues};

/// Loaded SDK configuration for one region, optionally pointed at a custom
/// endpoint (LocalStack and compatible servers).
#[derive(Clone)]
pub struct AwsContext {
    config: Arc<SdkConfig>,
    region: AwsRegion,
    endpoint_url: Option<String>,
}

impl AwsContext {
    /// Load credentials and settings from the environment, config files and
    /// instance roles, with the region fixed to `region`.
    pub async fn new(region: &AwsRegion, endpoint_url: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.as_str().to_owned()));
        if let Some(url) = endpoint_url {
            debug!(endpoint_url = %url, "using custom endpoint");
            loader = loader.endpoint_url(url);
        }

        Self::from_sdk_config(
            loader.load().await,
            region.clone(),
            endpoint_url.map(ToOwned::to_owned),
        )
    }

    /// Wrap an already loaded SDK config.
    #[must_use]
    pub fn from_sdk_config(
        config: SdkConfig,
        region: AwsRegion,
        endpoint_url: Option<String>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            region,
            endpoint_url,
        }
    }

    /// The underlying SDK config.
    #[must_use]
    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config
    }

    /// The configured region.
    #[must_use]
    pub fn region(&self) -> &AwsRegion {
        &self.region
    }

    /// The endpoint override, if any.
    #[must_use]
    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint_url.as_deref()
    }

    /// S3 client. Path-style addressing is forced when an endpoint override
    /// is set, since local emulators do not serve virtual-hosted buckets.
    #[must_use]
    pub fn s3_client(&self) -> aws_sdk_s3::Client {
        let config = aws_sdk_s3::config::Builder::from(self.sdk_config())
            .force_path_style(self.endpoint_url.is_some())
            .build();
        aws_sdk_s3::Client::from_conf(config)
    }

    /// SQS client.
    #[must_use]
    pub fn sqs_client(&self) -> aws_sdk_sqs::Client {
        aws_sdk_sqs::Client::new(self.sdk_config())
    }

    /// IAM client.
    #[must_use]
    pub fn iam_client(&self) -> aws_sdk_iam::Client {
        aws_sdk_iam::Client::new(self.sdk_config())
    }

    /// All three services, ready for a pipeline.
    #[must_use]
    pub fn services(&self) -> Services {
        Services {
            storage: Arc::new(S3Storage::from_context(self)),
            queues: Arc::new(SqsQueues::from_context(self)),
            identity: Arc::new(IamIdentity::from_context(self)),
        }
    }
}

impl std::fmt::Debug for AwsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsContext")
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .finish_non_exhaustive()
    }
}

//! Integration tests for the ingress provisioner.
//!
//! These tests require a LocalStack-compatible server at `localhost:4566`
//! (override with `INGRESS_ENDPOINT_URL`). They are marked `#[ignore]` so
//! they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p ingress-integration -- --ignored
//! ```

use std::sync::Once;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_credential_types::provider::SharedCredentialsProvider;
use ingress_aws::AwsContext;
use ingress_core::IngressConfig;
use ingress_model::AwsRegion;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the server.
fn endpoint_url() -> String {
    std::env::var("INGRESS_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:4566".to_owned())
}

/// An [`AwsContext`] pointing at the local server with static test
/// credentials.
#[must_use]
pub fn aws_context(region: &str) -> AwsContext {
    init_tracing();

    let creds = Credentials::new("test", "test", None, None, "integration-test");
    let endpoint = endpoint_url();
    let config = SdkConfig::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(region.to_owned()))
        .credentials_provider(SharedCredentialsProvider::new(creds))
        .endpoint_url(&endpoint)
        .build();

    AwsContext::from_sdk_config(config, AwsRegion::new(region), Some(endpoint))
}

/// Unique resource names for one test.
#[derive(Debug, Clone)]
pub struct TestNames {
    /// Bucket name.
    pub bucket: String,
    /// Queue name.
    pub queue: String,
    /// IAM user name.
    pub user: String,
    /// IAM policy name.
    pub policy: String,
}

impl TestNames {
    /// Generate names tagged with `prefix` and a random suffix.
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
        Self {
            bucket: format!("test-{prefix}-{id}"),
            queue: format!("test-{prefix}-{id}"),
            user: format!("test-{prefix}-{id}"),
            policy: format!("test-{prefix}-{id}-policy"),
        }
    }

    /// A config using these names in `region`.
    #[must_use]
    pub fn config(&self, region: &str) -> IngressConfig {
        IngressConfig::builder()
            .region(AwsRegion::new(region))
            .bucket_name(&self.bucket)
            .queue_name(&self.queue)
            .user_name(&self.user)
            .policy_name(&self.policy)
            .endpoint_url(endpoint_url())
            .build()
    }
}

/// Best-effort removal of everything a run may have created.
pub async fn cleanup(ctx: &AwsContext, names: &TestNames) {
    let iam = ctx.iam_client();
    if let Ok(keys) = iam.list_access_keys().user_name(&names.user).send().await {
        for id in keys.access_key_metadata().iter().filter_map(|m| m.access_key_id()) {
            let _ = iam
                .delete_access_key()
                .user_name(&names.user)
                .access_key_id(id)
                .send()
                .await;
        }
    }
    if let Ok(attached) = iam.list_attached_user_policies().user_name(&names.user).send().await {
        for arn in attached.attached_policies().iter().filter_map(|p| p.policy_arn()) {
            let _ = iam
                .detach_user_policy()
                .user_name(&names.user)
                .policy_arn(arn)
                .send()
                .await;
            let _ = iam.delete_policy().policy_arn(arn).send().await;
        }
    }
    let _ = iam.delete_user().user_name(&names.user).send().await;

    let sqs = ctx.sqs_client();
    if let Ok(out) = sqs.get_queue_url().queue_name(&names.queue).send().await {
        if let Some(url) = out.queue_url() {
            let _ = sqs.delete_queue().queue_url(url).send().await;
        }
    }

    let _ = ctx.s3_client().delete_bucket().bucket(&names.bucket).send().await;
}

mod test_pipeline;
mod test_steps;

//! S3 bucket creation and notification configuration.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, Event, EventBridgeConfiguration,
    FilterRule as SdkFilterRule, FilterRuleName, LambdaFunctionConfiguration as SdkLambda,
    NotificationConfiguration as SdkNotification, NotificationConfigurationFilter,
    QueueConfiguration as SdkQueue, S3KeyFilter, TopicConfiguration as SdkTopic,
};
use ingress_core::{ProvisionError, ProvisionResult, ResourceKind, StorageService};
use ingress_model::{
    FilterRule, KeyFilter, LambdaFunctionConfiguration, NotificationConfiguration,
    QueueConfiguration, TopicConfiguration,
};
use tracing::debug;

use crate::context::AwsContext;
use crate::error::classify;

/// [`StorageService`] backed by S3.
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: Client,
}

impl S3Storage {
    /// Build from a loaded context.
    #[must_use]
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.s3_client(),
        }
    }
}

#[async_trait]
impl StorageService for S3Storage {
    async fn bucket_exists(&self, bucket: &str) -> ProvisionResult<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => match err
                .raw_response()
                .and_then(|r| existence_from_status(r.status().as_u16()))
            {
                Some(exists) => Ok(exists),
                None => Err(classify(ResourceKind::Bucket, bucket, &err)),
            },
        }
    }

    async fn create_bucket(
        &self,
        bucket: &str,
        location_constraint: Option<&str>,
    ) -> ProvisionResult<()> {
        let mut request = self.client.create_bucket().bucket(bucket);
        if let Some(constraint) = location_constraint {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(constraint))
                    .build(),
            );
        }

        request
            .send()
            .await
            .map_err(|e| classify(ResourceKind::Bucket, bucket, &e))?;
        debug!(bucket = %bucket, "CreateBucket succeeded");
        Ok(())
    }

    async fn notification_configuration(
        &self,
        bucket: &str,
    ) -> ProvisionResult<NotificationConfiguration> {
        let output = self
            .client
            .get_bucket_notification_configuration()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify(ResourceKind::Notification, bucket, &e))?;

        Ok(NotificationConfiguration {
            queue_configurations: output
                .queue_configurations()
                .iter()
                .map(|c| QueueConfiguration {
                    id: c.id().map(ToOwned::to_owned),
                    queue_arn: c.queue_arn().to_owned(),
                    events: events_from_sdk(c.events()),
                    filter: filter_from_sdk(c.filter()),
                })
                .collect(),
            topic_configurations: output
                .topic_configurations()
                .iter()
                .map(|c| TopicConfiguration {
                    id: c.id().map(ToOwned::to_owned),
                    topic_arn: c.topic_arn().to_owned(),
                    events: events_from_sdk(c.events()),
                    filter: filter_from_sdk(c.filter()),
                })
                .collect(),
            lambda_function_configurations: output
                .lambda_function_configurations()
                .iter()
                .map(|c| LambdaFunctionConfiguration {
                    id: c.id().map(ToOwned::to_owned),
                    lambda_function_arn: c.lambda_function_arn().to_owned(),
                    events: events_from_sdk(c.events()),
                    filter: filter_from_sdk(c.filter()),
                })
                .collect(),
            event_bridge_enabled: output.event_bridge_configuration().is_some(),
        })
    }

    async fn put_notification_configuration(
        &self,
        bucket: &str,
        config: &NotificationConfiguration,
    ) -> ProvisionResult<()> {
        let sdk = notification_to_sdk(config).map_err(|message| {
            ProvisionError::MalformedConfiguration {
                resource: ResourceKind::Notification,
                name: bucket.to_owned(),
                message,
            }
        })?;

        self.client
            .put_bucket_notification_configuration()
            .bucket(bucket)
            .notification_configuration(sdk)
            .send()
            .await
            .map_err(|e| classify(ResourceKind::Notification, bucket, &e))?;
        debug!(bucket = %bucket, "PutBucketNotificationConfiguration succeeded");
        Ok(())
    }
}

fn events_from_sdk(events: &[Event]) -> Vec<String> {
    events.iter().map(|e| e.as_str().to_owned()).collect()
}

fn events_to_sdk(events: &[String]) -> Vec<Event> {
    events.iter().map(|e| Event::from(e.as_str())).collect()
}

fn filter_from_sdk(filter: Option<&NotificationConfigurationFilter>) -> Option<KeyFilter> {
    let key = filter?.key()?;
    Some(KeyFilter {
        filter_rules: key
            .filter_rules()
            .iter()
            .map(|r| FilterRule {
                name: r.name().map(|n| n.as_str().to_owned()).unwrap_or_default(),
                value: r.value().unwrap_or_default().to_owned(),
            })
            .collect(),
    })
}

fn filter_to_sdk(filter: Option<&KeyFilter>) -> Option<NotificationConfigurationFilter> {
    let rules = filter?
        .filter_rules
        .iter()
        .map(|r| {
            SdkFilterRule::builder()
                .name(FilterRuleName::from(r.name.as_str()))
                .value(&r.value)
                .build()
        })
        .collect();
    Some(
        NotificationConfigurationFilter::builder()
            .key(S3KeyFilter::builder().set_filter_rules(Some(rules)).build())
            .build(),
    )
}

/// Rebuild the SDK shape. Every target kind is carried over so a write never
/// drops entries this tool did not create.
fn notification_to_sdk(config: &NotificationConfiguration) -> Result<SdkNotification, String> {
    let queues = config
        .queue_configurations
        .iter()
        .map(|c| {
            SdkQueue::builder()
                .set_id(c.id.clone())
                .queue_arn(&c.queue_arn)
                .set_events(Some(events_to_sdk(&c.events)))
                .set_filter(filter_to_sdk(c.filter.as_ref()))
                .build()
                .map_err(|e| e.to_string())
        })
        .collect::<Result<Vec<_>, _>>()?;

    let topics = config
        .topic_configurations
        .iter()
        .map(|c| {
            SdkTopic::builder()
                .set_id(c.id.clone())
                .topic_arn(&c.topic_arn)
                .set_events(Some(events_to_sdk(&c.events)))
                .set_filter(filter_to_sdk(c.filter.as_ref()))
                .build()
                .map_err(|e| e.to_string())
        })
        .collect::<Result<Vec<_>, _>>()?;

    let lambdas = config
        .lambda_function_configurations
        .iter()
        .map(|c| {
            SdkLambda::builder()
                .set_id(c.id.clone())
                .lambda_function_arn(&c.lambda_function_arn)
                .set_events(Some(events_to_sdk(&c.events)))
                .set_filter(filter_to_sdk(c.filter.as_ref()))
                .build()
                .map_err(|e| e.to_string())
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SdkNotification::builder()
        .set_queue_configurations(Some(queues))
        .set_topic_configurations(Some(topics))
        .set_lambda_function_configurations(Some(lambdas))
        .set_event_bridge_configuration(
            config
                .event_bridge_enabled
                .then(|| EventBridgeConfiguration::builder().build()),
        )
        .build())
}

/// What a failed HeadBucket status says about the name.
///
/// 301 means the bucket lives in another region, 403 that another account
/// owns it. HeadBucket errors carry no body, so the status is all there is.
fn existence_from_status(status: u16) -> Option<bool> {
    match status {
        404 => Some(false),
        301 | 403 => Some(true),
        _ => None,
    }
}

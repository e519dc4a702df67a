//! Step 4: object-created notifications.

use ingress_model::{Arn, QueueConfiguration};
use tracing::{debug, info};

use crate::error::ProvisionResult;
use crate::service::StorageService;

/// Id of the queue target this tool owns in the bucket's notification
/// configuration.
pub const NOTIFICATION_ID: &str = "ingress-object-created";

/// Route every object-created event in `bucket` to `queue_arn`.
///
/// The existing configuration is read first and only the entry with
/// [`NOTIFICATION_ID`] is replaced. Returns whether a write was made.
pub async fn wire_object_created_events(
    storage: &dyn StorageService,
    bucket: &str,
    queue_arn: &Arn,
) -> ProvisionResult<bool> {
    let mut config = storage.notification_configuration(bucket).await?;

    let target = QueueConfiguration::object_created(NOTIFICATION_ID, queue_arn.to_string());
    if !config.upsert_queue_configuration(target) {
        debug!(bucket = %bucket, "notification target already present");
        return Ok(false);
    }

    storage.put_notification_configuration(bucket, &config).await?;
    info!(
        bucket = %bucket,
        queue_arn = %queue_arn,
        targets = config.queue_configurations.len(),
        "notification configuration written",
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use ingress_model::{
        AwsRegion, NotificationConfiguration, OBJECT_CREATED_EVENT, QueueAttributes,
        TopicConfiguration,
    };

    use crate::config::OnExisting;
    use crate::emulator::Emulator;
    use crate::error::ProvisionError;
    use crate::record::QueueRecord;
    use crate::steps::{create_bucket, create_queue, grant_publisher_access};

    use super::*;

    async fn topology(emulator: &Emulator) -> QueueRecord {
        let bucket = create_bucket(emulator, "b1", &AwsRegion::default(), OnExisting::Fail)
            .await
            .unwrap();
        let queue = create_queue(emulator, "q1", QueueAttributes::default(), OnExisting::Fail)
            .await
            .unwrap();
        grant_publisher_access(emulator, &queue, &bucket.arn).await.unwrap();
        queue
    }

    #[tokio::test]
    async fn test_should_wire_all_object_created_events() {
        let emulator = Emulator::new(AwsRegion::default());
        let queue = topology(&emulator).await;

        assert!(wire_object_created_events(&emulator, "b1", &queue.arn).await.unwrap());

        let config = emulator.notification("b1").unwrap();
        assert_eq!(config.queue_configurations.len(), 1);
        let target = config.queue_configuration(NOTIFICATION_ID).unwrap();
        assert_eq!(target.queue_arn, queue.arn.to_string());
        assert_eq!(target.events, vec![OBJECT_CREATED_EVENT.to_owned()]);
        assert_eq!(target.filter, None);
    }

    #[tokio::test]
    async fn test_should_keep_single_entry_when_run_twice() {
        let emulator = Emulator::new(AwsRegion::default());
        let queue = topology(&emulator).await;
        wire_object_created_events(&emulator, "b1", &queue.arn).await.unwrap();
        let writes = emulator.write_count();

        assert!(!wire_object_created_events(&emulator, "b1", &queue.arn).await.unwrap());
        assert_eq!(emulator.write_count(), writes);
        assert_eq!(emulator.notification("b1").unwrap().queue_configurations.len(), 1);
    }

    #[tokio::test]
    async fn test_should_replace_entry_for_different_queue() {
        let emulator = Emulator::new(AwsRegion::default());
        let first = topology(&emulator).await;
        let second = create_queue(&emulator, "q2", QueueAttributes::default(), OnExisting::Fail)
            .await
            .unwrap();
        let bucket_arn = ingress_model::Arn::s3_bucket(ingress_model::Partition::Aws, "b1");
        grant_publisher_access(&emulator, &second, &bucket_arn).await.unwrap();

        wire_object_created_events(&emulator, "b1", &first.arn).await.unwrap();
        assert!(wire_object_created_events(&emulator, "b1", &second.arn).await.unwrap());

        let config = emulator.notification("b1").unwrap();
        assert_eq!(config.queue_configurations.len(), 1);
        assert_eq!(config.queue_configurations[0].queue_arn, second.arn.to_string());
    }

    #[tokio::test]
    async fn test_should_preserve_other_targets() {
        let emulator = Emulator::new(AwsRegion::default());
        let queue = topology(&emulator).await;
        let existing = NotificationConfiguration {
            topic_configurations: vec![TopicConfiguration {
                id: Some("audit".to_owned()),
                topic_arn: "arn:aws:sns:us-east-1:000000000000:audit".to_owned(),
                events: vec!["s3:ObjectRemoved:*".to_owned()],
                filter: None,
            }],
            event_bridge_enabled: true,
            ..NotificationConfiguration::default()
        };
        emulator.put_notification_configuration("b1", &existing).await.unwrap();

        wire_object_created_events(&emulator, "b1", &queue.arn).await.unwrap();

        let config = emulator.notification("b1").unwrap();
        assert_eq!(config.topic_configurations, existing.topic_configurations);
        assert!(config.event_bridge_enabled);
        assert_eq!(config.queue_configurations.len(), 1);
    }

    #[tokio::test]
    async fn test_should_reject_queue_without_publish_policy() {
        let emulator = Emulator::new(AwsRegion::default());
        create_bucket(&emulator, "b1", &AwsRegion::default(), OnExisting::Fail)
            .await
            .unwrap();
        let queue = create_queue(&emulator, "q1", QueueAttributes::default(), OnExisting::Fail)
            .await
            .unwrap();

        let err = wire_object_created_events(&emulator, "b1", &queue.arn)
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::MalformedConfiguration { .. }));
        assert!(emulator.notification("b1").unwrap().is_empty());
    }
}

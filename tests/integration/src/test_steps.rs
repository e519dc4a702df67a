//! Individual steps against the server.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::types::{Event, NotificationConfiguration, TopicConfiguration};
    use ingress_core::steps::{
        create_bucket, create_queue, grant_publisher_access, wire_object_created_events,
    };
    use ingress_core::{OnExisting, StorageService};
    use ingress_model::{AwsRegion, QueueAttributes};

    use crate::{TestNames, aws_context, cleanup};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_create_bucket_outside_default_region() {
        let ctx = aws_context("eu-west-1");
        let names = TestNames::new("region");
        let services = ctx.services();

        let bucket = create_bucket(
            services.storage.as_ref(),
            &names.bucket,
            &AwsRegion::new("eu-west-1"),
            OnExisting::Fail,
        )
        .await
        .expect("create_bucket");
        assert_eq!(bucket.location_constraint.as_deref(), Some("eu-west-1"));

        let location = ctx
            .s3_client()
            .get_bucket_location()
            .bucket(&names.bucket)
            .send()
            .await
            .expect("get_bucket_location");
        assert_eq!(location.location_constraint().map(|c| c.as_str()), Some("eu-west-1"));

        cleanup(&ctx, &names).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_preserve_foreign_notification_targets() {
        let ctx = aws_context("us-east-1");
        let names = TestNames::new("merge");
        let services = ctx.services();
        let region = AwsRegion::default();

        let bucket = create_bucket(
            services.storage.as_ref(),
            &names.bucket,
            &region,
            OnExisting::Fail,
        )
        .await
        .unwrap();
        let queue = create_queue(
            services.queues.as_ref(),
            &names.queue,
            QueueAttributes::default(),
            OnExisting::Fail,
        )
        .await
        .unwrap();
        grant_publisher_access(services.queues.as_ref(), &queue, &bucket.arn)
            .await
            .unwrap();

        let topic = TopicConfiguration::builder()
            .id("audit")
            .topic_arn("arn:aws:sns:us-east-1:000000000000:audit")
            .events(Event::from("s3:ObjectRemoved:*"))
            .build()
            .unwrap();
        let seeded = ctx
            .s3_client()
            .put_bucket_notification_configuration()
            .bucket(&names.bucket)
            .notification_configuration(
                NotificationConfiguration::builder()
                    .topic_configurations(topic)
                    .build(),
            )
            .skip_destination_validation(true)
            .send()
            .await;
        if seeded.is_err() {
            tracing::warn!("server rejected seeded topic target; skipping merge assertion");
            cleanup(&ctx, &names).await;
            return;
        }

        wire_object_created_events(services.storage.as_ref(), &names.bucket, &queue.arn)
            .await
            .expect("wire events");

        let config = services
            .storage
            .notification_configuration(&names.bucket)
            .await
            .unwrap();
        assert_eq!(config.queue_configurations.len(), 1);
        assert_eq!(config.topic_configurations.len(), 1);
        assert_eq!(config.topic_configurations[0].id.as_deref(), Some("audit"));

        cleanup(&ctx, &names).await;
    }
}

//! End-to-end pipeline runs.

#[cfg(test)]
mod tests {
    use aws_sdk_sqs::types::QueueAttributeName;
    use ingress_core::steps::{NOTIFICATION_ID, PUBLISH_STATEMENT_SID};
    use ingress_core::{OnExisting, Pipeline, Step};
    use ingress_model::PolicyDocument;

    use crate::{TestNames, aws_context, cleanup};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_provision_full_topology() {
        let ctx = aws_context("us-east-1");
        let names = TestNames::new("full");
        let pipeline = Pipeline::new(names.config("us-east-1"), ctx.services()).unwrap();

        let mut outcome = pipeline.run().await.expect("pipeline run");
        let queue = outcome.record.queue.clone().unwrap();

        let sqs = ctx.sqs_client();
        let attrs = sqs
            .get_queue_attributes()
            .queue_url(&queue.url)
            .attribute_names(QueueAttributeName::All)
            .send()
            .await
            .expect("get_queue_attributes");
        let attrs = attrs.attributes().unwrap();
        assert_eq!(
            attrs.get(&QueueAttributeName::VisibilityTimeout).map(String::as_str),
            Some("300")
        );
        assert_eq!(
            attrs.get(&QueueAttributeName::MessageRetentionPeriod).map(String::as_str),
            Some("1209600")
        );
        let policy = attrs.get(&QueueAttributeName::Policy).unwrap();
        let policy = PolicyDocument::from_json(policy).unwrap();
        let statement = policy.statement(PUBLISH_STATEMENT_SID).unwrap();
        assert_eq!(statement.resource.0, vec![queue.arn.to_string()]);

        let notification = ctx
            .s3_client()
            .get_bucket_notification_configuration()
            .bucket(&names.bucket)
            .send()
            .await
            .expect("get_bucket_notification_configuration");
        let targets = notification.queue_configurations();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].id(), Some(NOTIFICATION_ID));
        assert_eq!(targets[0].queue_arn(), queue.arn.to_string());

        let key = outcome.take_access_key().expect("access key");
        let keys = ctx
            .iam_client()
            .list_access_keys()
            .user_name(&names.user)
            .send()
            .await
            .expect("list_access_keys");
        assert_eq!(keys.access_key_metadata().len(), 1);
        assert_eq!(keys.access_key_metadata()[0].access_key_id(), Some(key.access_key_id()));

        cleanup(&ctx, &names).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_fail_rerun_at_bucket_step() {
        let ctx = aws_context("us-east-1");
        let names = TestNames::new("rerun");
        let pipeline = Pipeline::new(names.config("us-east-1"), ctx.services()).unwrap();
        pipeline.run().await.expect("first run");

        let failure = pipeline.run().await.unwrap_err();
        assert_eq!(failure.step, Step::CreateBucket);
        assert!(failure.error.is_name_collision(), "{failure}");

        let keys = ctx
            .iam_client()
            .list_access_keys()
            .user_name(&names.user)
            .send()
            .await
            .expect("list_access_keys");
        assert_eq!(keys.access_key_metadata().len(), 1);

        cleanup(&ctx, &names).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_adopt_and_stop_at_identity() {
        let ctx = aws_context("us-east-1");
        let names = TestNames::new("adopt");
        Pipeline::new(names.config("us-east-1"), ctx.services())
            .unwrap()
            .run()
            .await
            .expect("first run");

        let mut config = names.config("us-east-1");
        config.on_existing = OnExisting::Adopt;
        let failure = Pipeline::new(config, ctx.services()).unwrap().run().await.unwrap_err();

        assert_eq!(failure.step, Step::ProvisionIdentity);
        assert_eq!(failure.record.queue_policy_written, Some(false));
        assert_eq!(failure.record.notification_written, Some(false));

        cleanup(&ctx, &names).await;
    }
}

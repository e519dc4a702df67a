//! Step 5: IAM user, scoped policy and one access key.

use ingress_model::{Arn, PolicyDocument, Statement};
use tracing::info;

use crate::credentials::NewAccessKey;
use crate::error::ProvisionResult;
use crate::record::{BucketRecord, IdentityRecord};
use crate::service::IdentityService;

/// Inputs to [`provision_identity`].
#[derive(Debug, Clone, Copy)]
pub struct IdentityRequest<'a> {
    /// IAM user name.
    pub user_name: &'a str,
    /// Managed policy name.
    pub policy_name: &'a str,
    /// Bucket resolved by step 1.
    pub bucket: &'a BucketRecord,
    /// Queue ARN resolved by step 2.
    pub queue_arn: &'a Arn,
}

/// Least-privilege policy for the ingestion consumer: read and write
/// objects in the bucket, consume messages from the queue.
#[must_use]
pub fn identity_policy(bucket: &BucketRecord, queue_arn: &Arn) -> PolicyDocument {
    let objects = Arn::s3_objects(bucket.arn.partition(), &bucket.name);
    PolicyDocument::new()
        .with_statement(
            Statement::allow()
                .with_sid("ObjectReadWrite")
                .with_actions(["s3:GetObject", "s3:PutObject"])
                .with_resources([objects.to_string()]),
        )
        .with_statement(
            Statement::allow()
                .with_sid("QueueConsume")
                .with_actions(["sqs:ReceiveMessage", "sqs:DeleteMessage", "sqs:GetQueueAttributes"])
                .with_resources([queue_arn.to_string()]),
        )
}

/// Create the user and policy, attach, then mint one access key.
///
/// `progress` is updated after each remote call so a failure part way
/// through leaves an accurate inventory. The user is never adopted, so it
/// holds no keys when the one key is minted.
pub async fn provision_identity(
    identity: &dyn IdentityService,
    request: IdentityRequest<'_>,
    progress: &mut IdentityRecord,
) -> ProvisionResult<NewAccessKey> {
    let IdentityRequest {
        user_name,
        policy_name,
        bucket,
        queue_arn,
    } = request;

    let user_arn = identity.create_user(user_name).await?;
    info!(user = %user_name, arn = %user_arn, "user created");
    progress.user = Some((user_name.to_owned(), user_arn));

    let document = identity_policy(bucket, queue_arn);
    let policy_arn = identity.create_policy(policy_name, &document).await?;
    info!(policy = %policy_name, arn = %policy_arn, "policy created");
    progress.policy = Some((policy_name.to_owned(), policy_arn.clone()));

    identity.attach_user_policy(user_name, &policy_arn).await?;
    progress.policy_attached = true;

    let key = identity.create_access_key(user_name).await?;
    info!(user = %user_name, access_key_id = %key.access_key_id(), "access key created");
    progress.access_key_id = Some(key.access_key_id().to_owned());
    Ok(key)
}

#[cfg(test)]
mod tests {
    use ingress_model::{AwsRegion, Partition};

    use crate::emulator::Emulator;
    use crate::record::Disposition;

    use super::*;

    fn bucket() -> BucketRecord {
        BucketRecord {
            name: "b1".to_owned(),
            arn: Arn::s3_bucket(Partition::Aws, "b1"),
            location_constraint: None,
            disposition: Disposition::Created,
        }
    }

    fn queue_arn() -> Arn {
        "arn:aws:sqs:us-east-1:000000000000:q1".parse().unwrap()
    }

    #[test]
    fn test_should_grant_exact_action_set() {
        let policy = identity_policy(&bucket(), &queue_arn());
        let mut actions: Vec<&str> = policy.allowed_actions().collect();
        actions.sort_unstable();

        assert_eq!(
            actions,
            vec![
                "s3:GetObject",
                "s3:PutObject",
                "sqs:DeleteMessage",
                "sqs:GetQueueAttributes",
                "sqs:ReceiveMessage",
            ]
        );
        assert!(policy.statement.iter().all(|s| !s.has_wildcard_resource()));
        assert_eq!(
            policy.statement("ObjectReadWrite").unwrap().resource.0,
            vec!["arn:aws:s3:::b1/*".to_owned()]
        );
        assert_eq!(
            policy.statement("QueueConsume").unwrap().resource.0,
            vec![queue_arn().to_string()]
        );
    }

    #[tokio::test]
    async fn test_should_provision_user_policy_and_key() {
        let emulator = Emulator::new(AwsRegion::default());
        let bucket = bucket();
        let queue_arn = queue_arn();
        let mut progress = IdentityRecord::default();

        let key = provision_identity(
            &emulator,
            IdentityRequest {
                user_name: "u1",
                policy_name: "p1",
                bucket: &bucket,
                queue_arn: &queue_arn,
            },
            &mut progress,
        )
        .await
        .unwrap();

        assert!(progress.policy_attached);
        assert_eq!(progress.access_key_id.as_deref(), Some(key.access_key_id()));
        assert_eq!(emulator.access_key_ids("u1"), vec![key.access_key_id().to_owned()]);
        let attached = emulator.attached_policies("u1");
        assert_eq!(attached.len(), 1);
        assert_eq!(
            emulator.policy_document(&attached[0]),
            Some(identity_policy(&bucket, &queue_arn))
        );
    }

    #[tokio::test]
    async fn test_should_fail_on_existing_user_without_side_effects() {
        let emulator = Emulator::new(AwsRegion::default());
        emulator.create_user("u1").await.unwrap();
        let bucket = bucket();
        let queue_arn = queue_arn();
        let mut progress = IdentityRecord::default();

        let err = provision_identity(
            &emulator,
            IdentityRequest {
                user_name: "u1",
                policy_name: "p1",
                bucket: &bucket,
                queue_arn: &queue_arn,
            },
            &mut progress,
        )
        .await
        .unwrap_err();

        assert!(err.is_name_collision());
        assert_eq!(progress, IdentityRecord::default());
        assert!(emulator.access_key_ids("u1").is_empty());
    }
}

//! Step 3: queue policy allowing the bucket to publish.

use std::collections::BTreeMap;

use ingress_model::{Arn, PolicyDocument, Principal, QueueAttributeName, Statement};
use tracing::{debug, info};

use crate::error::ProvisionResult;
use crate::record::QueueRecord;
use crate::service::QueueService;

/// `Sid` of the statement this tool owns in the queue policy.
pub const PUBLISH_STATEMENT_SID: &str = "AllowS3ObjectCreatedPublish";

/// Service principal S3 publishes notifications as.
pub const S3_SERVICE_PRINCIPAL: &str = "s3.amazonaws.com";

/// The statement granting `sqs:SendMessage` on `queue_arn` to S3, limited to
/// notifications whose source is `bucket_arn`.
#[must_use]
pub fn publisher_statement(queue_arn: &Arn, bucket_arn: &Arn) -> Statement {
    Statement::allow()
        .with_sid(PUBLISH_STATEMENT_SID)
        .with_principal(Principal::service(S3_SERVICE_PRINCIPAL))
        .with_actions(["sqs:SendMessage"])
        .with_resources([queue_arn.to_string()])
        .with_condition("ArnEquals", "aws:SourceArn", bucket_arn.to_string())
}

/// Merge the publisher statement into the queue's policy.
///
/// Statements with other `Sid`s are preserved. Returns whether a write was
/// made; an identical statement already in place is left alone.
pub async fn grant_publisher_access(
    queues: &dyn QueueService,
    queue: &QueueRecord,
    bucket_arn: &Arn,
) -> ProvisionResult<bool> {
    let current = queues
        .queue_attributes(&queue.url, &[QueueAttributeName::Policy])
        .await?;

    let mut document = match current.get(QueueAttributeName::Policy.as_str()) {
        Some(json) if !json.trim().is_empty() => PolicyDocument::from_json(json)?,
        _ => PolicyDocument::new(),
    };

    if !document.upsert_statement(publisher_statement(&queue.arn, bucket_arn)) {
        debug!(queue = %queue.name, "publisher statement already present");
        return Ok(false);
    }

    let attributes = BTreeMap::from([(
        QueueAttributeName::Policy.as_str().to_owned(),
        document.to_json()?,
    )]);
    queues.set_queue_attributes(&queue.url, &attributes).await?;

    info!(
        queue = %queue.name,
        source = %bucket_arn,
        statements = document.statement.len(),
        "queue policy written",
    );
    Ok(true)
}

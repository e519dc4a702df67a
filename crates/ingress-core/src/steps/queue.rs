//! Step 2: queue creation and ARN resolution.

use std::collections::BTreeMap;

use ingress_model::{Arn, ModelError, QueueAttributeName, QueueAttributes};
use tracing::{info, warn};

use crate::config::OnExisting;
use crate::error::{ProvisionError, ProvisionResult, ResourceKind};
use crate::record::{Disposition, QueueRecord};
use crate::service::QueueService;

const DESCRIBE: &[QueueAttributeName] = &[
    QueueAttributeName::QueueArn,
    QueueAttributeName::VisibilityTimeout,
    QueueAttributeName::MessageRetentionPeriod,
];

/// Create the queue and resolve its ARN.
///
/// The ARN is always read back from the provider after creation. The
/// observed visibility timeout and retention must equal `attributes`; an
/// adopted queue with different values is reconciled first.
pub async fn create_queue(
    queues: &dyn QueueService,
    name: &str,
    attributes: QueueAttributes,
    on_existing: OnExisting,
) -> ProvisionResult<QueueRecord> {
    let (url, disposition) = match queues.queue_url(name).await? {
        Some(_) if on_existing == OnExisting::Fail => {
            return Err(ProvisionError::NameCollision {
                resource: ResourceKind::Queue,
                name: name.to_owned(),
            });
        }
        Some(url) => {
            info!(queue = %name, url = %url, "queue exists, adopting");
            (url, Disposition::Adopted)
        }
        None => {
            info!(
                queue = %name,
                visibility_timeout = attributes.visibility_timeout,
                message_retention_period = attributes.message_retention_period,
                "creating queue",
            );
            let url = queues.create_queue(name, &attributes.to_wire()).await?;
            (url, Disposition::Created)
        }
    };

    let (arn, mut observed) = describe(queues, &url).await?;

    if observed != attributes && disposition == Disposition::Adopted {
        warn!(queue = %name, ?observed, expected = ?attributes, "reconciling queue attributes");
        queues.set_queue_attributes(&url, &attributes.to_wire()).await?;
        observed = describe(queues, &url).await?.1;
    }

    if observed != attributes {
        return Err(ProvisionError::MalformedConfiguration {
            resource: ResourceKind::Queue,
            name: name.to_owned(),
            message: format!("observed attributes {observed:?}, expected {attributes:?}"),
        });
    }

    info!(queue = %name, arn = %arn, "queue ready");
    Ok(QueueRecord {
        name: name.to_owned(),
        url,
        arn,
        attributes: observed,
        disposition,
    })
}

async fn describe(queues: &dyn QueueService, url: &str) -> ProvisionResult<(Arn, QueueAttributes)> {
    let attrs: BTreeMap<String, String> = queues.queue_attributes(url, DESCRIBE).await?;
    let arn = attrs
        .get(QueueAttributeName::QueueArn.as_str())
        .ok_or(ModelError::MissingQueueAttribute("QueueArn"))?
        .parse::<Arn>()?;
    Ok((arn, QueueAttributes::from_wire(&attrs)?))
}

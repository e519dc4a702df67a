//! Emulated SQS.

use std::collections::BTreeMap;

use async_trait::async_trait;
use ingress_model::{Arn, PolicyDocument, QueueAttributeName};
use parking_lot::RwLock;
use tracing::debug;

use super::{EmulatedQueue, Emulator, reject};
use crate::error::{ProvisionResult, ResourceKind};
use crate::service::QueueService;

/// Attributes a fresh queue starts with before the request is applied.
const DEFAULT_ATTRIBUTES: &[(&str, &str)] = &[
    ("VisibilityTimeout", "30"),
    ("MessageRetentionPeriod", "345600"),
];

/// Attributes a caller may set.
const SETTABLE: &[&str] = &["VisibilityTimeout", "MessageRetentionPeriod", "Policy"];

impl Emulator {
    fn queue_url_for(&self, name: &str) -> String {
        format!(
            "https://sqs.{}.amazonaws.com/{}/{name}",
            self.region, self.account
        )
    }

    fn queue_arn_for(&self, name: &str) -> ProvisionResult<Arn> {
        Ok(format!(
            "arn:{}:sqs:{}:{}:{name}",
            self.region.partition(),
            self.region,
            self.account
        )
        .parse()?)
    }

    fn queue_name_for_url(&self, url: &str) -> ProvisionResult<String> {
        self.queues
            .iter()
            .find(|q| q.url == url)
            .map(|q| q.key().clone())
            .ok_or_else(|| {
                reject(
                    ResourceKind::Queue,
                    url,
                    "AWS.SimpleQueueService.NonExistentQueue",
                    "The specified queue does not exist.",
                )
            })
    }

    /// Validate a batch of attributes for `queue` without applying it.
    fn check_attributes(
        &self,
        queue: &str,
        queue_arn: &Arn,
        attributes: &BTreeMap<String, String>,
    ) -> ProvisionResult<()> {
        for (name, value) in attributes {
            if !SETTABLE.contains(&name.as_str()) {
                return Err(reject(
                    ResourceKind::Queue,
                    queue,
                    "InvalidAttributeName",
                    format!("Unknown Attribute {name}."),
                ));
            }
            if name == QueueAttributeName::Policy.as_str() && !value.is_empty() {
                check_policy(queue, queue_arn, value)?;
            }
        }
        Ok(())
    }
}

/// A queue policy may only name the queue itself as a resource.
fn check_policy(queue: &str, queue_arn: &Arn, json: &str) -> ProvisionResult<()> {
    let invalid = |detail: String| {
        reject(
            ResourceKind::QueuePolicy,
            queue,
            "InvalidAttributeValue",
            format!("Invalid value for the parameter Policy. Reason: {detail}"),
        )
    };

    let document = PolicyDocument::from_json(json).map_err(|e| invalid(e.to_string()))?;
    let queue_arn = queue_arn.to_string();
    for statement in &document.statement {
        if let Some(resource) = statement.resource.iter().find(|r| **r != queue_arn) {
            return Err(invalid(format!("Value {resource} for parameter Resource is invalid.")));
        }
    }
    Ok(())
}

#[async_trait]
impl QueueService for Emulator {
    async fn queue_url(&self, name: &str) -> ProvisionResult<Option<String>> {
        Ok(self.queues.get(name).map(|q| q.url.clone()))
    }

    async fn create_queue(
        &self,
        name: &str,
        attributes: &BTreeMap<String, String>,
    ) -> ProvisionResult<String> {
        let arn = self.queue_arn_for(name)?;
        self.check_attributes(name, &arn, attributes)?;

        if let Some(existing) = self.queues.get(name) {
            let current = existing.attributes.read();
            if attributes.iter().all(|(k, v)| current.get(k) == Some(v)) {
                return Ok(existing.url.clone());
            }
            return Err(reject(
                ResourceKind::Queue,
                name,
                "QueueAlreadyExists",
                "A queue already exists with the same name and a different value for attribute(s)",
            ));
        }

        let mut stored: BTreeMap<String, String> = DEFAULT_ATTRIBUTES
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        stored.extend(attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
        stored.insert(QueueAttributeName::QueueArn.as_str().to_owned(), arn.to_string());

        let url = self.queue_url_for(name);
        self.queues.insert(
            name.to_owned(),
            EmulatedQueue {
                url: url.clone(),
                arn,
                attributes: RwLock::new(stored),
            },
        );
        self.record_write();
        debug!(queue = %name, url = %url, "emulated queue created");
        Ok(url)
    }

    async fn queue_attributes(
        &self,
        url: &str,
        names: &[QueueAttributeName],
    ) -> ProvisionResult<BTreeMap<String, String>> {
        let name = self.queue_name_for_url(url)?;
        let queue = self.queues.get(&name).ok_or_else(|| {
            reject(
                ResourceKind::Queue,
                url,
                "AWS.SimpleQueueService.NonExistentQueue",
                "The specified queue does not exist.",
            )
        })?;
        let stored = queue.attributes.read();

        Ok(names
            .iter()
            .filter_map(|n| stored.get(n.as_str()).map(|v| (n.as_str().to_owned(), v.clone())))
            .collect())
    }

    async fn set_queue_attributes(
        &self,
        url: &str,
        attributes: &BTreeMap<String, String>,
    ) -> ProvisionResult<()> {
        let name = self.queue_name_for_url(url)?;
        let Some(queue) = self.queues.get(&name) else {
            return Err(reject(
                ResourceKind::Queue,
                url,
                "AWS.SimpleQueueService.NonExistentQueue",
                "The specified queue does not exist.",
            ));
        };
        self.check_attributes(&name, &queue.arn, attributes)?;

        let mut stored = queue.attributes.write();
        for (k, v) in attributes {
            if v.is_empty() {
                stored.remove(k);
            } else {
                stored.insert(k.clone(), v.clone());
            }
        }
        drop(stored);
        drop(queue);

        self.record_write();
        debug!(
            queue = %name,
            keys = ?attributes.keys().collect::<Vec<_>>(),
            "emulated queue attributes set"
        );
        Ok(())
    }
}

//! SQS queue creation and attributes.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use aws_sdk_sqs::Client;
use aws_sdk_sqs::types::QueueAttributeName as SdkAttributeName;
use ingress_core::{ProvisionResult, QueueService, ResourceKind};
use ingress_model::QueueAttributeName;
use tracing::debug;

use crate::context::AwsContext;
use crate::error::{classify, missing_field};

/// [`QueueService`] backed by SQS.
#[derive(Debug, Clone)]
pub struct SqsQueues {
    client: Client,
}

impl SqsQueues {
    /// Build from a loaded context.
    #[must_use]
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.sqs_client(),
        }
    }
}

fn to_sdk(attributes: &BTreeMap<String, String>) -> HashMap<SdkAttributeName, String> {
    attributes
        .iter()
        .map(|(k, v)| (SdkAttributeName::from(k.as_str()), v.clone()))
        .collect()
}

#[async_trait]
impl QueueService for SqsQueues {
    async fn queue_url(&self, name: &str) -> ProvisionResult<Option<String>> {
        match self.client.get_queue_url().queue_name(name).send().await {
            Ok(output) => Ok(output.queue_url().map(ToOwned::to_owned)),
            Err(err) => {
                let err = classify(ResourceKind::Queue, name, &err);
                if err.is_not_found() { Ok(None) } else { Err(err) }
            }
        }
    }

    async fn create_queue(
        &self,
        name: &str,
        attributes: &BTreeMap<String, String>,
    ) -> ProvisionResult<String> {
        let output = self
            .client
            .create_queue()
            .queue_name(name)
            .set_attributes(Some(to_sdk(attributes)))
            .send()
            .await
            .map_err(|e| classify(ResourceKind::Queue, name, &e))?;

        let url = output
            .queue_url()
            .ok_or_else(|| missing_field(ResourceKind::Queue, name, "QueueUrl"))?;
        debug!(queue = %name, url = %url, "CreateQueue succeeded");
        Ok(url.to_owned())
    }

    async fn queue_attributes(
        &self,
        url: &str,
        names: &[QueueAttributeName],
    ) -> ProvisionResult<BTreeMap<String, String>> {
        let names: Vec<SdkAttributeName> = names
            .iter()
            .map(|n| SdkAttributeName::from(n.as_str()))
            .collect();
        let output = self
            .client
            .get_queue_attributes()
            .queue_url(url)
            .set_attribute_names(Some(names))
            .send()
            .await
            .map_err(|e| classify(ResourceKind::Queue, url, &e))?;

        Ok(output
            .attributes()
            .map(|attrs| {
                attrs
                    .iter()
                    .map(|(k, v)| (k.as_str().to_owned(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn set_queue_attributes(
        &self,
        url: &str,
        attributes: &BTreeMap<String, String>,
    ) -> ProvisionResult<()> {
        let resource = if attributes.contains_key(QueueAttributeName::Policy.as_str()) {
            ResourceKind::QueuePolicy
        } else {
            ResourceKind::Queue
        };

        self.client
            .set_queue_attributes()
            .queue_url(url)
            .set_attributes(Some(to_sdk(attributes)))
            .send()
            .await
            .map_err(|e| classify(resource, url, &e))?;
        debug!(url = %url, "SetQueueAttributes succeeded");
        Ok(())
    }
}

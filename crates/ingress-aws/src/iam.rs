//! IAM user, managed policy and access key.

use async_trait::async_trait;
use aws_sdk_iam::Client;
use aws_sdk_iam::types::Tag;
use chrono::Utc;
use ingress_core::{
    IdentityService, NewAccessKey, ProvisionError, ProvisionResult, ResourceKind, SecretAccessKey,
};
use ingress_model::{Arn, PolicyDocument};
use tracing::debug;

use crate::context::AwsContext;
use crate::error::{classify, missing_field};

/// Tag key marking resources this tool created.
pub const TAG_MANAGED_BY: &str = "managed-by";
/// Value for [`TAG_MANAGED_BY`].
pub const TAG_MANAGED_BY_VALUE: &str = "ingress-provisioner";
/// Tag key holding the RFC 3339 creation time.
pub const TAG_CREATED_AT: &str = "created-at";

/// [`IdentityService`] backed by IAM.
#[derive(Debug, Clone)]
pub struct IamIdentity {
    client: Client,
}

impl IamIdentity {
    /// Build from a loaded context.
    #[must_use]
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.iam_client(),
        }
    }
}

fn tags(resource: ResourceKind, name: &str) -> ProvisionResult<Vec<Tag>> {
    let created_at = Utc::now().to_rfc3339();
    [(TAG_MANAGED_BY, TAG_MANAGED_BY_VALUE), (TAG_CREATED_AT, created_at.as_str())]
        .into_iter()
        .map(|(key, value)| {
            Tag::builder()
                .key(key)
                .value(value)
                .build()
                .map_err(|e| ProvisionError::Service {
                    resource,
                    name: name.to_owned(),
                    code: None,
                    message: format!("failed to build IAM tag: {e}"),
                })
        })
        .collect()
}

#[async_trait]
impl IdentityService for IamIdentity {
    async fn create_user(&self, user: &str) -> ProvisionResult<Arn> {
        let output = self
            .client
            .create_user()
            .user_name(user)
            .set_tags(Some(tags(ResourceKind::User, user)?))
            .send()
            .await
            .map_err(|e| classify(ResourceKind::User, user, &e))?;

        let arn = output
            .user()
            .map(|u| u.arn())
            .ok_or_else(|| missing_field(ResourceKind::User, user, "User"))?;
        debug!(user = %user, arn = %arn, "CreateUser succeeded");
        Ok(arn.parse::<Arn>()?)
    }

    async fn create_policy(&self, name: &str, document: &PolicyDocument) -> ProvisionResult<Arn> {
        let output = self
            .client
            .create_policy()
            .policy_name(name)
            .policy_document(document.to_json()?)
            .description("Object read/write and queue consume for the ingress pipeline")
            .set_tags(Some(tags(ResourceKind::Policy, name)?))
            .send()
            .await
            .map_err(|e| classify(ResourceKind::Policy, name, &e))?;

        let arn = output
            .policy()
            .and_then(|p| p.arn())
            .ok_or_else(|| missing_field(ResourceKind::Policy, name, "Policy.Arn"))?;
        debug!(policy = %name, arn = %arn, "CreatePolicy succeeded");
        Ok(arn.parse::<Arn>()?)
    }

    async fn attach_user_policy(&self, user: &str, policy_arn: &Arn) -> ProvisionResult<()> {
        self.client
            .attach_user_policy()
            .user_name(user)
            .policy_arn(policy_arn.to_string())
            .send()
            .await
            .map_err(|e| classify(ResourceKind::Policy, user, &e))?;
        debug!(user = %user, policy_arn = %policy_arn, "AttachUserPolicy succeeded");
        Ok(())
    }

    async fn create_access_key(&self, user: &str) -> ProvisionResult<NewAccessKey> {
        let output = self
            .client
            .create_access_key()
            .user_name(user)
            .send()
            .await
            .map_err(|e| classify(ResourceKind::AccessKey, user, &e))?;

        let key = output
            .access_key()
            .ok_or_else(|| missing_field(ResourceKind::AccessKey, user, "AccessKey"))?;
        debug!(user = %user, access_key_id = %key.access_key_id(), "CreateAccessKey succeeded");
        Ok(NewAccessKey::new(
            key.access_key_id(),
            SecretAccessKey::new(key.secret_access_key()),
        ))
    }
}

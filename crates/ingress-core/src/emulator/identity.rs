//! Emulated IAM.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use ingress_model::{Arn, POLICY_VERSION, PolicyDocument};
use tracing::debug;
use uuid::Uuid;

use super::{EmulatedUser, Emulator, reject};
use crate::credentials::{NewAccessKey, SecretAccessKey};
use crate::error::{ProvisionResult, ResourceKind};
use crate::service::IdentityService;

/// Access keys a user may hold at once.
const MAX_ACCESS_KEYS: usize = 2;

impl Emulator {
    fn iam_arn(&self, kind: &str, name: &str) -> ProvisionResult<Arn> {
        Ok(format!("arn:{}:iam::{}:{kind}/{name}", self.region.partition(), self.account).parse()?)
    }

    fn no_such_user(user: &str) -> crate::error::ProvisionError {
        reject(
            ResourceKind::User,
            user,
            "NoSuchEntity",
            format!("The user with name {user} cannot be found."),
        )
    }
}

/// Identity policies must use the current language version, name at least
/// one action per statement, and give resources as ARNs or `*`.
fn check_identity_policy(name: &str, document: &PolicyDocument) -> ProvisionResult<()> {
    let malformed =
        |detail: String| reject(ResourceKind::Policy, name, "MalformedPolicyDocument", detail);

    if document.version != POLICY_VERSION {
        return Err(malformed(format!("The policy version {} is not supported.", document.version)));
    }
    if document.statement.is_empty() {
        return Err(malformed("Policy document must contain at least one statement.".to_owned()));
    }
    for statement in &document.statement {
        if statement.action.is_empty() {
            return Err(malformed("Policy statement must contain actions.".to_owned()));
        }
        if statement.principal.is_some() {
            return Err(malformed("Policy document should not specify a principal.".to_owned()));
        }
        for resource in statement.resource.iter() {
            if resource != "*" && resource.parse::<Arn>().is_err() {
                return Err(malformed(format!(
                    "Resource {resource} must be in ARN format or \"*\"."
                )));
            }
        }
    }
    Ok(())
}

#[async_trait]
impl IdentityService for Emulator {
    async fn create_user(&self, user: &str) -> ProvisionResult<Arn> {
        let arn = self.iam_arn("user", user)?;
        match self.users.entry(user.to_owned()) {
            Entry::Occupied(_) => {
                return Err(reject(
                    ResourceKind::User,
                    user,
                    "EntityAlreadyExists",
                    format!("User with name {user} already exists."),
                ));
            }
            Entry::Vacant(slot) => {
                slot.insert(EmulatedUser {
                    attached: Vec::new(),
                    access_keys: Vec::new(),
                });
            }
        }
        self.record_write();
        debug!(user = %user, "emulated user created");
        Ok(arn)
    }

    async fn create_policy(&self, name: &str, document: &PolicyDocument) -> ProvisionResult<Arn> {
        let arn = self.iam_arn("policy", name)?;
        if self.policies.contains_key(&arn.to_string()) {
            return Err(reject(
                ResourceKind::Policy,
                name,
                "EntityAlreadyExists",
                format!("A policy called {name} already exists. Duplicate names are not allowed."),
            ));
        }
        check_identity_policy(name, document)?;

        self.policies.insert(arn.to_string(), document.clone());
        self.record_write();
        debug!(policy = %name, "emulated policy created");
        Ok(arn)
    }

    async fn attach_user_policy(&self, user: &str, policy_arn: &Arn) -> ProvisionResult<()> {
        if !self.policies.contains_key(&policy_arn.to_string()) {
            return Err(reject(
                ResourceKind::Policy,
                policy_arn.resource(),
                "NoSuchEntity",
                format!("Policy {policy_arn} does not exist or is not attachable."),
            ));
        }
        let mut entry = self.users.get_mut(user).ok_or_else(|| Self::no_such_user(user))?;
        if !entry.attached.contains(policy_arn) {
            entry.attached.push(policy_arn.clone());
        }
        drop(entry);

        self.record_write();
        Ok(())
    }

    async fn create_access_key(&self, user: &str) -> ProvisionResult<NewAccessKey> {
        let mut entry = self.users.get_mut(user).ok_or_else(|| Self::no_such_user(user))?;
        if entry.access_keys.len() >= MAX_ACCESS_KEYS {
            return Err(reject(
                ResourceKind::AccessKey,
                user,
                "LimitExceeded",
                format!("Cannot exceed quota for AccessKeysPerUser: {MAX_ACCESS_KEYS}"),
            ));
        }

        let id = format!("AKIA{}", &Uuid::new_v4().simple().to_string().to_uppercase()[..16]);
        let tail = Uuid::new_v4().simple().to_string();
        let secret = Uuid::new_v4().simple().to_string() + &tail[..8];
        entry.access_keys.push(id.clone());
        drop(entry);

        self.record_write();
        debug!(user = %user, access_key_id = %id, "emulated access key created");
        Ok(NewAccessKey::new(id, SecretAccessKey::new(secret)))
    }
}

//! JSON access-policy documents.
//!
//! The same document format is used for SQS queue policies and IAM managed
//! policies. Statements that this tool did not write are carried through
//! untouched: unknown keys land in [`Statement::extra`] and are written back
//! as they were read.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ModelError, ModelResult};

/// The only policy language version the providers accept for conditions.
pub const POLICY_VERSION: &str = "2012-10-17";

/// A value the policy grammar allows as either a scalar or a list.
///
/// Serializes a single element as a scalar, anything else as an array.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OneOrMany<T>(pub Vec<T>);

impl<T> OneOrMany<T> {
    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the elements.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }
}

impl<T, U: Into<T>> FromIterator<U> for OneOrMany<T> {
    fn from_iter<I: IntoIterator<Item = U>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<T: Serialize> Serialize for OneOrMany<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.as_slice() {
            [one] => one.serialize(serializer),
            many => many.serialize(serializer),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OneOrMany<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr<T> {
            Many(Vec<T>),
            One(T),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Many(v) => Self(v),
            Repr::One(t) => Self(vec![t]),
        })
    }
}

/// Statement effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Grant.
    Allow,
    /// Explicit deny.
    Deny,
}

/// Statement principal: `"*"` or a map keyed by principal type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Principal {
    /// The anonymous wildcard principal.
    Any(String),
    /// Principals keyed by type (`Service`, `AWS`, `Federated`).
    Typed(BTreeMap<String, OneOrMany<String>>),
}

impl Principal {
    /// A single service principal, e.g. `s3.amazonaws.com`.
    #[must_use]
    pub fn service(name: &str) -> Self {
        Self::Typed(BTreeMap::from([(
            "Service".to_owned(),
            OneOrMany(vec![name.to_owned()]),
        )]))
    }
}

/// Condition block: operator -> condition key -> values.
///
/// Values stay as JSON so `Bool` and numeric operators written by others
/// keep their original type.
pub type Condition = BTreeMap<String, BTreeMap<String, OneOrMany<serde_json::Value>>>;

/// A single policy statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    /// Statement identifier, unique within a document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    /// Allow or deny.
    pub effect: Effect,
    /// Resource-policy principal. Absent in identity policies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    /// Actions granted or denied.
    #[serde(default, skip_serializing_if = "OneOrMany::is_empty")]
    pub action: OneOrMany<String>,
    /// Resources the actions apply to.
    #[serde(default, skip_serializing_if = "OneOrMany::is_empty")]
    pub resource: OneOrMany<String>,
    /// Optional condition block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    /// Keys this model does not interpret (`NotAction`, `NotPrincipal`, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Statement {
    /// An empty `Allow` statement.
    #[must_use]
    pub fn allow() -> Self {
        Self {
            sid: None,
            effect: Effect::Allow,
            principal: None,
            action: OneOrMany::default(),
            resource: OneOrMany::default(),
            condition: None,
            extra: BTreeMap::new(),
        }
    }

    /// Set the statement id.
    #[must_use]
    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    /// Set the principal.
    #[must_use]
    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    /// Set the actions.
    #[must_use]
    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.action = actions.into_iter().collect();
        self
    }

    /// Set the resources.
    #[must_use]
    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource = resources.into_iter().collect();
        self
    }

    /// Add a single-valued condition, e.g. `ArnEquals aws:SourceArn = <arn>`.
    #[must_use]
    pub fn with_condition(
        mut self,
        operator: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.condition
            .get_or_insert_with(Condition::new)
            .entry(operator.into())
            .or_default()
            .insert(key.into(), OneOrMany(vec![serde_json::Value::String(value.into())]));
        self
    }

    /// Value of a single-valued condition, if present.
    #[must_use]
    pub fn condition_value(&self, operator: &str, key: &str) -> Option<&str> {
        match self.condition.as_ref()?.get(operator)?.get(key)?.0.as_slice() {
            [one] => one.as_str(),
            _ => None,
        }
    }

    /// Whether any resource is the bare `*` wildcard.
    #[must_use]
    pub fn has_wildcard_resource(&self) -> bool {
        self.resource.iter().any(|r| r == "*")
    }
}

fn deserialize_statements<'de, D>(deserializer: D) -> Result<Vec<Statement>, D::Error>
where
    D: Deserializer<'de>,
{
    OneOrMany::<Statement>::deserialize(deserializer).map(|s| s.0)
}

/// A complete policy document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    /// Policy language version.
    pub version: String,
    /// Optional document id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Statements, in order.
    #[serde(default, deserialize_with = "deserialize_statements")]
    pub statement: Vec<Statement>,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self {
            version: POLICY_VERSION.to_owned(),
            id: None,
            statement: Vec::new(),
        }
    }
}

impl PolicyDocument {
    /// An empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a statement.
    #[must_use]
    pub fn with_statement(mut self, statement: Statement) -> Self {
        self.statement.push(statement);
        self
    }

    /// Find a statement by `Sid`.
    #[must_use]
    pub fn statement(&self, sid: &str) -> Option<&Statement> {
        self.statement
            .iter()
            .find(|s| s.sid.as_deref() == Some(sid))
    }

    /// Insert `statement`, replacing any statement with the same `Sid`.
    ///
    /// Statements without a `Sid` are matched by full equality. Returns
    /// `false` when the document already contained an identical statement.
    pub fn upsert_statement(&mut self, statement: Statement) -> bool {
        let existing = self.statement.iter_mut().find(|s| match &statement.sid {
            Some(sid) => s.sid.as_deref() == Some(sid.as_str()),
            None => **s == statement,
        });

        match existing {
            Some(s) if *s == statement => false,
            Some(s) => {
                *s = statement;
                true
            }
            None => {
                self.statement.push(statement);
                true
            }
        }
    }

    /// Every action named by an `Allow` statement.
    pub fn allowed_actions(&self) -> impl Iterator<Item = &str> {
        self.statement
            .iter()
            .filter(|s| s.effect == Effect::Allow)
            .flat_map(|s| s.action.iter().map(String::as_str))
    }

    /// Parse a document from its JSON form.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        serde_json::from_str(json).map_err(|e| ModelError::InvalidPolicyDocument(e.to_string()))
    }

    /// Encode the document as compact JSON.
    pub fn to_json(&self) -> ModelResult<String> {
        serde_json::to_string(self).map_err(|e| ModelError::InvalidPolicyDocument(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn publish_statement(queue_arn: &str, bucket_arn: &str) -> Statement {
        Statement::allow()
            .with_sid("AllowPublish")
            .with_principal(Principal::service("s3.amazonaws.com"))
            .with_actions(["sqs:SendMessage"])
            .with_resources([queue_arn])
            .with_condition("ArnEquals", "aws:SourceArn", bucket_arn)
    }

    #[test]
    fn test_should_serialize_provider_shape() {
        let doc = PolicyDocument::new().with_statement(publish_statement(
            "arn:aws:sqs:us-east-1:123456789012:q1",
            "arn:aws:s3:::b1",
        ));

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            value,
            json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Sid": "AllowPublish",
                    "Effect": "Allow",
                    "Principal": { "Service": "s3.amazonaws.com" },
                    "Action": "sqs:SendMessage",
                    "Resource": "arn:aws:sqs:us-east-1:123456789012:q1",
                    "Condition": { "ArnEquals": { "aws:SourceArn": "arn:aws:s3:::b1" } }
                }]
            })
        );
    }

    #[test]
    fn test_should_parse_foreign_statements_losslessly() {
        let raw = json!({
            "Version": "2012-10-17",
            "Id": "existing",
            "Statement": {
                "Sid": "Legacy",
                "Effect": "Deny",
                "Principal": "*",
                "NotAction": ["sqs:SendMessage"],
                "Resource": "*"
            }
        });

        let doc: PolicyDocument = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(doc.statement.len(), 1);
        let stmt = &doc.statement[0];
        assert_eq!(stmt.principal, Some(Principal::Any("*".to_owned())));
        assert!(stmt.action.is_empty());
        assert!(stmt.extra.contains_key("NotAction"));

        let mut back = serde_json::to_value(&doc).unwrap();
        // The single statement is written back as an array.
        back["Statement"] = back["Statement"][0].clone();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_should_upsert_statement_by_sid() {
        let other = Statement::allow()
            .with_sid("Other")
            .with_actions(["sqs:ReceiveMessage"]);
        let mut doc = PolicyDocument::new().with_statement(other);

        let first = publish_statement("arn:aws:sqs:us-east-1:123456789012:q1", "arn:aws:s3:::b1");
        assert!(doc.upsert_statement(first.clone()));
        assert!(!doc.upsert_statement(first));
        assert_eq!(doc.statement.len(), 2);

        let second = publish_statement("arn:aws:sqs:us-east-1:123456789012:q2", "arn:aws:s3:::b1");
        assert!(doc.upsert_statement(second));
        assert_eq!(doc.statement.len(), 2);
        assert_eq!(
            doc.statement("AllowPublish").unwrap().resource,
            OneOrMany(vec!["arn:aws:sqs:us-east-1:123456789012:q2".to_owned()])
        );
        assert!(doc.statement("Other").is_some());
    }

    #[test]
    fn test_should_read_condition_value() {
        let stmt = publish_statement("arn:aws:sqs:us-east-1:123456789012:q1", "arn:aws:s3:::b1");
        assert_eq!(
            stmt.condition_value("ArnEquals", "aws:SourceArn"),
            Some("arn:aws:s3:::b1")
        );
        assert_eq!(stmt.condition_value("ArnLike", "aws:SourceArn"), None);
        assert!(!stmt.has_wildcard_resource());
    }

    #[test]
    fn test_should_keep_typed_condition_values() {
        let raw = json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Sid": "DenyInsecureTransport",
                "Effect": "Deny",
                "Principal": "*",
                "Action": "sqs:*",
                "Resource": "arn:aws:sqs:us-east-1:123456789012:q1",
                "Condition": {
                    "Bool": { "aws:SecureTransport": false },
                    "NumericLessThan": { "s3:max-keys": [10, 20] }
                }
            }]
        });

        let mut doc = PolicyDocument::from_json(&raw.to_string()).unwrap();
        assert_eq!(doc.statement[0].condition_value("Bool", "aws:SecureTransport"), None);

        assert!(doc.upsert_statement(publish_statement(
            "arn:aws:sqs:us-east-1:123456789012:q1",
            "arn:aws:s3:::b1",
        )));
        let back: serde_json::Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        assert_eq!(back["Statement"][0], raw["Statement"][0]);
        assert_eq!(back["Statement"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_should_reject_invalid_json() {
        assert!(matches!(
            PolicyDocument::from_json("{not json"),
            Err(ModelError::InvalidPolicyDocument(_))
        ));
    }
}

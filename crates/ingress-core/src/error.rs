//! Provisioning error taxonomy.
//!
//! Provider errors arrive as an error code plus a message. They are sorted
//! into a small set of categories with a code table so the pipeline and the
//! operator see the same classification whether the call went to AWS or to
//! the emulator.

use std::fmt;

use ingress_model::ModelError;

/// The kind of remote resource an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    /// S3 bucket.
    Bucket,
    /// Bucket notification configuration.
    Notification,
    /// SQS queue.
    Queue,
    /// SQS queue access policy.
    QueuePolicy,
    /// IAM user.
    User,
    /// IAM managed policy.
    Policy,
    /// IAM access key.
    AccessKey,
}

impl ResourceKind {
    /// Human-readable name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bucket => "bucket",
            Self::Notification => "notification configuration",
            Self::Queue => "queue",
            Self::QueuePolicy => "queue policy",
            Self::User => "user",
            Self::Policy => "policy",
            Self::AccessKey => "access key",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by provisioning steps.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// The resource already exists.
    #[error("{resource} {name:?} already exists")]
    NameCollision {
        /// Kind of resource.
        resource: ResourceKind,
        /// Its name.
        name: String,
    },

    /// The caller is not allowed to perform the operation.
    #[error("permission denied on {resource} {name:?}: {message}")]
    PermissionDenied {
        /// Kind of resource.
        resource: ResourceKind,
        /// Its name.
        name: String,
        /// Provider message.
        message: String,
    },

    /// The request was rejected as malformed (wrong location constraint
    /// shape, invalid policy document, mismatched attributes).
    #[error("malformed configuration for {resource} {name:?}: {message}")]
    MalformedConfiguration {
        /// Kind of resource.
        resource: ResourceKind,
        /// Its name.
        name: String,
        /// Provider message.
        message: String,
    },

    /// An account or per-resource quota is used up.
    #[error("quota exceeded for {resource} {name:?}: {message}")]
    QuotaExceeded {
        /// Kind of resource.
        resource: ResourceKind,
        /// Its name.
        name: String,
        /// Provider message.
        message: String,
    },

    /// The referenced resource does not exist.
    #[error("{resource} {name:?} not found")]
    NotFound {
        /// Kind of resource.
        resource: ResourceKind,
        /// Its name.
        name: String,
    },

    /// The request never got a response (connect failure, timeout).
    #[error("transient network failure: {0}")]
    TransientNetwork(String),

    /// A step ran before the identifier it consumes was produced.
    #[error("{0} was not produced by an earlier step")]
    MissingInput(&'static str),

    /// Invalid local configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A value returned by the provider did not parse.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Any provider error not covered above.
    #[error(
        "service error on {resource} {name:?} ({}): {message}",
        code.as_deref().unwrap_or("no code")
    )]
    Service {
        /// Kind of resource.
        resource: ResourceKind,
        /// Its name.
        name: String,
        /// Provider error code, if any.
        code: Option<String>,
        /// Provider message.
        message: String,
    },
}

impl ProvisionError {
    /// Whether this is a name collision.
    #[must_use]
    pub fn is_name_collision(&self) -> bool {
        matches!(self, Self::NameCollision { .. })
    }

    /// Whether this is a "not found" error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether retrying the whole run later could succeed unchanged.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientNetwork(_))
    }

    /// Short category label used in reports.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::NameCollision { .. } => "NameCollision",
            Self::PermissionDenied { .. } => "PermissionDenied",
            Self::MalformedConfiguration { .. } => "MalformedConfiguration",
            Self::QuotaExceeded { .. } => "QuotaExceeded",
            Self::NotFound { .. } => "NotFound",
            Self::TransientNetwork(_) => "TransientNetwork",
            Self::MissingInput(_) => "MissingInput",
            Self::Config(_) => "Config",
            Self::Model(_) => "Model",
            Self::Service { .. } => "Service",
        }
    }
}

/// Convenience result type for provisioning operations.
pub type ProvisionResult<T> = Result<T, ProvisionError>;

/// Codes meaning the named resource already exists.
const NAME_COLLISION_CODES: &[&str] = &[
    "BucketAlreadyExists",
    "BucketAlreadyOwnedByYou",
    "QueueAlreadyExists",
    "QueueNameExists",
    "EntityAlreadyExists",
];

/// Codes meaning the caller lacks permission.
const PERMISSION_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "Forbidden",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "UnauthorizedOperation",
];

/// Codes meaning the request shape or content was rejected.
const MALFORMED_CODES: &[&str] = &[
    "IllegalLocationConstraintException",
    "InvalidLocationConstraint",
    "InvalidArgument",
    "InvalidBucketName",
    "MalformedXML",
    "MalformedPolicyDocument",
    "InvalidAttributeName",
    "InvalidAttributeValue",
    "InvalidInput",
    "ValidationError",
];

/// Codes meaning a quota is used up.
const QUOTA_CODES: &[&str] = &["LimitExceeded", "TooManyBuckets", "OverLimit"];

/// Codes meaning the referenced resource does not exist.
const NOT_FOUND_CODES: &[&str] = &[
    "NoSuchBucket",
    "NotFound",
    "NoSuchEntity",
    "QueueDoesNotExist",
    "AWS.SimpleQueueService.NonExistentQueue",
];

/// Codes for throttling and server-side hiccups.
const TRANSIENT_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "SlowDown",
    "ServiceUnavailable",
    "InternalError",
    "RequestTimeout",
];

/// Classify a provider error code into the taxonomy.
///
/// `resource` and `name` identify what the failed call was operating on.
#[must_use]
pub fn classify_service_error(
    resource: ResourceKind,
    name: &str,
    code: Option<&str>,
    message: Option<&str>,
) -> ProvisionError {
    let message = message.unwrap_or("Unknown error").to_owned();
    let name = name.to_owned();

    match code {
        Some(c) if NAME_COLLISION_CODES.contains(&c) => {
            ProvisionError::NameCollision { resource, name }
        }
        Some(c) if PERMISSION_CODES.contains(&c) => ProvisionError::PermissionDenied {
            resource,
            name,
            message,
        },
        Some(c) if MALFORMED_CODES.contains(&c) => ProvisionError::MalformedConfiguration {
            resource,
            name,
            message,
        },
        Some(c) if QUOTA_CODES.contains(&c) => ProvisionError::QuotaExceeded {
            resource,
            name,
            message,
        },
        Some(c) if NOT_FOUND_CODES.contains(&c) => ProvisionError::NotFound { resource, name },
        Some(c) if TRANSIENT_CODES.contains(&c) => {
            ProvisionError::TransientNetwork(format!("{c}: {message}"))
        }
        _ => ProvisionError::Service {
            resource,
            name,
            code: code.map(ToOwned::to_owned),
            message,
        },
    }
}

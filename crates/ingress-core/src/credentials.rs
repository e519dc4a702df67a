//! One-time access key delivery.
//!
//! The provider returns a secret access key exactly once, at creation. The
//! types here make a second read impossible in-process: the secret is not
//! `Clone`, not `Serialize`, redacts itself in `Debug`, and leaves its holder
//! only by value.

use std::fmt;

/// A secret access key. Consumed by [`SecretAccessKey::expose`].
pub struct SecretAccessKey(String);

impl SecretAccessKey {
    /// Wrap a secret returned by the provider.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Hand the secret to its final sink.
    #[must_use]
    pub fn expose(self) -> String {
        self.0
    }
}

impl fmt::Debug for SecretAccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretAccessKey(<redacted>)")
    }
}

impl fmt::Display for SecretAccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// A freshly minted access key: the id plus its one-time secret.
#[derive(Debug)]
pub struct NewAccessKey {
    access_key_id: String,
    secret: SecretAccessKey,
}

impl NewAccessKey {
    /// Pair a key id with its secret.
    #[must_use]
    pub fn new(access_key_id: impl Into<String>, secret: SecretAccessKey) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret,
        }
    }

    /// The access key id. Safe to log.
    #[must_use]
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Split into the id and the secret.
    #[must_use]
    pub fn into_parts(self) -> (String, SecretAccessKey) {
        (self.access_key_id, self.secret)
    }
}

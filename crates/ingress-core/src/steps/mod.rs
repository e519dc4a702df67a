//! The five provisioning steps.
//!
//! Each step is a free function over the service trait it needs. Inputs are
//! values resolved by earlier steps; no step calls back into an earlier
//! step's service to re-derive them.

mod access;
mod events;
mod identity;
mod queue;
mod storage;

pub use access::{
    PUBLISH_STATEMENT_SID, S3_SERVICE_PRINCIPAL, grant_publisher_access, publisher_statement,
};
pub use events::{NOTIFICATION_ID, wire_object_created_events};
pub use identity::{IdentityRequest, identity_policy, provision_identity};
pub use queue::create_queue;
pub use storage::create_bucket;

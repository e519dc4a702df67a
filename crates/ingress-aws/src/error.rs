//! SDK error classification.

use std::error::Error;
use std::fmt;

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_smithy_runtime_api::client::result::SdkError;
use ingress_core::{ProvisionError, ResourceKind, classify_service_error};

/// Map an SDK error onto the provisioning taxonomy.
///
/// Requests that never got a response (dispatch failures, timeouts) are
/// transient. Everything else is classified by its service error code.
pub(crate) fn classify<E, R>(
    resource: ResourceKind,
    name: &str,
    err: &SdkError<E, R>,
) -> ProvisionError
where
    E: ProvideErrorMetadata + Error + 'static,
    R: fmt::Debug,
{
    let rendered = DisplayErrorContext(err).to_string();
    match err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
            ProvisionError::TransientNetwork(rendered)
        }
        _ => {
            let message = err.message().or(Some(rendered.as_str()));
            classify_service_error(resource, name, err.code(), message)
        }
    }
}

/// A response that parsed but lacked a field the call always returns.
pub(crate) fn missing_field(resource: ResourceKind, name: &str, field: &str) -> ProvisionError {
    ProvisionError::Service {
        resource,
        name: name.to_owned(),
        code: None,
        message: format!("response did not include {field}"),
    }
}

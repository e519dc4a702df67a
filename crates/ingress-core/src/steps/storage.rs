//! Step 1: bucket creation.

use ingress_model::{Arn, AwsRegion};
use tracing::info;

use crate::config::OnExisting;
use crate::error::{ProvisionError, ProvisionResult, ResourceKind};
use crate::record::{BucketRecord, Disposition};
use crate::service::StorageService;

/// Create the bucket.
///
/// The default region takes no location constraint; every other region
/// requires one naming it. An existing bucket is a name collision unless
/// `on_existing` is [`OnExisting::Adopt`].
pub async fn create_bucket(
    storage: &dyn StorageService,
    name: &str,
    region: &AwsRegion,
    on_existing: OnExisting,
) -> ProvisionResult<BucketRecord> {
    let arn = Arn::s3_bucket(region.partition(), name);

    if storage.bucket_exists(name).await? {
        if on_existing == OnExisting::Fail {
            return Err(ProvisionError::NameCollision {
                resource: ResourceKind::Bucket,
                name: name.to_owned(),
            });
        }
        info!(bucket = %name, "bucket exists, adopting");
        return Ok(BucketRecord {
            name: name.to_owned(),
            arn,
            location_constraint: None,
            disposition: Disposition::Adopted,
        });
    }

    let location_constraint = region.location_constraint();
    info!(
        bucket = %name,
        region = %region,
        location_constraint = location_constraint.unwrap_or("<none>"),
        "creating bucket",
    );
    storage.create_bucket(name, location_constraint).await?;

    Ok(BucketRecord {
        name: name.to_owned(),
        arn,
        location_constraint: location_constraint.map(ToOwned::to_owned),
        disposition: Disposition::Created,
    })
}

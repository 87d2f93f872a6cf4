//! Check secret conflict activity
//!
//! A secret is only ever created together with the resource it describes.
//! An existing secret whose resource is missing may be serving another
//! installation, so it is never overwritten with new connection details.

use crate::activity_names::activities;
use crate::activity_types::{CheckSecretConflictInput, CheckSecretConflictOutput};
use crate::context::ActivityContext;
use crate::error::{ProvisionError, Result};
use storeshift_models::ResourceKind;

/// Activity name for scheduling
pub const NAME: &str = activities::CHECK_SECRET_CONFLICT;

pub async fn activity(
    ctx: ActivityContext,
    input: CheckSecretConflictInput,
) -> Result<CheckSecretConflictOutput> {
    let prober = ctx.prober();
    let resource_exists = prober.exists(&input.resource).await?;
    let secret_exists = prober.secret_exists(&input.secret_name).await?;

    match (resource_exists, secret_exists) {
        (false, true) => Err(ProvisionError::conflict(
            ResourceKind::SecretEntry,
            &input.secret_name,
            format!(
                "{} was not created because the secret already exists; delete the secret or choose a unique secret name",
                input.resource
            ),
        )),
        (true, false) if input.require_secret_for_existing => Err(ProvisionError::conflict(
            input.resource.kind,
            &input.resource.name,
            format!(
                "secret '{}' cannot be created because the credentials of the existing resource are unknown; \
                 create a new resource or delete the existing one",
                input.secret_name
            ),
        )),
        _ => {
            ctx.trace_info(format!(
                "{}: resource exists = {}, secret '{}' exists = {}",
                input.resource, resource_exists, input.secret_name, secret_exists
            ));
            Ok(CheckSecretConflictOutput {
                resource_exists,
                secret_exists,
            })
        }
    }
}

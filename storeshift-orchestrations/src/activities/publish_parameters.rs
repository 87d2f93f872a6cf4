//! Publish parameters activity

use crate::activity_names::activities;
use crate::activity_types::{PublishParametersInput, PublishParametersOutput};
use crate::context::ActivityContext;
use crate::error::{ProvisionError, Result};
use storeshift_models::{ConnectionParameters, ResourceSpec};

/// Activity name for scheduling
pub const NAME: &str = activities::PUBLISH_PARAMETERS;

pub async fn activity(
    ctx: ActivityContext,
    input: PublishParametersInput,
) -> Result<PublishParametersOutput> {
    // 1. Resolve the live endpoint
    let info = match ctx.cloud().rds.describe_db_instance(&input.instance_id).await {
        Ok(info) => info,
        Err(e) if e.is_not_found() => {
            return Err(ProvisionError::missing(
                ResourceSpec::db_instance(&input.instance_id, ctx.region()),
                "parameters can only be published for an existing instance",
            ))
        }
        Err(e) => return Err(e.into()),
    };
    let db_host = info
        .endpoint
        .map(|endpoint| endpoint.address)
        .ok_or_else(|| {
            ProvisionError::InvalidConfig(format!(
                "RDS instance '{}' has no endpoint yet",
                input.instance_id
            ))
        })?;

    // 2. Rewrite downstream configuration
    let params = ConnectionParameters {
        region: input.region,
        db_host: db_host.clone(),
        bucket: input.bucket,
        rds_secret_name: input.rds_secret_name,
        s3_secret_name: input.s3_secret_name,
    };
    let files = ctx.publisher().publish(&params)?;
    for file in &files {
        ctx.trace_info(format!("Updated {}", file.display()));
    }

    Ok(PublishParametersOutput {
        db_host,
        files_updated: files.iter().map(|f| f.display().to_string()).collect(),
    })
}

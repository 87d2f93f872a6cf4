//! Create S3 secret activity

use crate::activity_names::activities;
use crate::activity_types::{CreateS3SecretInput, CreateSecretOutput};
use crate::context::ActivityContext;
use crate::error::{ProvisionError, Result};
use storeshift_models::SecretEntry;

/// Activity name for scheduling
pub const NAME: &str = activities::CREATE_S3_SECRET;

pub async fn activity(ctx: ActivityContext, input: CreateS3SecretInput) -> Result<CreateSecretOutput> {
    // 1. Check idempotency
    if ctx.prober().secret_exists(&input.secret_name).await? {
        ctx.trace_info(format!(
            "Skipping S3 secret creation, secret '{}' already exists!",
            input.secret_name
        ));
        return Ok(CreateSecretOutput {
            secret_name: input.secret_name,
            created: false,
        });
    }

    // 2. Build payload
    let entry = SecretEntry::s3(&input.secret_name, &input.access_key_id, &input.secret_access_key);
    let secret_string = entry
        .secret_string()
        .map_err(|e| ProvisionError::InvalidConfig(format!("S3 secret payload: {}", e)))?;

    // 3. Create
    ctx.trace_info(format!("Creating S3 secret '{}'", entry.name));
    ctx.cloud()
        .secrets
        .create_secret(&entry.name, &entry.description, &secret_string)
        .await?;
    ctx.trace_info("S3 secret created!");

    Ok(CreateSecretOutput {
        secret_name: input.secret_name,
        created: true,
    })
}

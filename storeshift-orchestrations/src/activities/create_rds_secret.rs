//! Create RDS secret activity

use crate::activity_names::activities;
use crate::activity_types::{CreateRdsSecretInput, CreateSecretOutput};
use crate::context::ActivityContext;
use crate::error::{ProvisionError, Result};
use storeshift_models::{DbCredentials, ResourceSpec, SecretEntry};

/// Activity name for scheduling
pub const NAME: &str = activities::CREATE_RDS_SECRET;

pub async fn activity(ctx: ActivityContext, input: CreateRdsSecretInput) -> Result<CreateSecretOutput> {
    // 1. Check idempotency
    if ctx.prober().secret_exists(&input.secret_name).await? {
        ctx.trace_info(format!(
            "Skipping RDS secret creation, secret '{}' already exists!",
            input.secret_name
        ));
        return Ok(CreateSecretOutput {
            secret_name: input.secret_name,
            created: false,
        });
    }

    // 2. Resolve connection details from the live instance
    let info = match ctx.cloud().rds.describe_db_instance(&input.instance_id).await {
        Ok(info) => info,
        Err(e) if e.is_not_found() => {
            return Err(ProvisionError::missing(
                ResourceSpec::db_instance(&input.instance_id, ctx.region()),
                "the RDS secret describes an instance that does not exist",
            ))
        }
        Err(e) => return Err(e.into()),
    };
    let endpoint = info.endpoint.ok_or_else(|| {
        ProvisionError::InvalidConfig(format!(
            "RDS instance '{}' has no endpoint yet (status {})",
            input.instance_id, info.status
        ))
    })?;
    if info.master_username.as_deref().is_some_and(|user| user != input.username) {
        ctx.trace_warn(format!(
            "RDS instance '{}' reports master user {:?}, storing '{}'",
            input.instance_id, info.master_username, input.username
        ));
    }
    let credentials = DbCredentials {
        username: input.username,
        password: input.password,
        database: info.db_name.unwrap_or_default(),
    };

    // 3. Create
    let entry = SecretEntry::rds(&input.secret_name, &credentials, &endpoint);
    let secret_string = entry
        .secret_string()
        .map_err(|e| ProvisionError::InvalidConfig(format!("RDS secret payload: {}", e)))?;
    ctx.trace_info(format!(
        "Creating RDS secret '{}' for {}:{}",
        entry.name, endpoint.address, endpoint.port
    ));
    ctx.cloud()
        .secrets
        .create_secret(&entry.name, &entry.description, &secret_string)
        .await?;
    ctx.trace_info("RDS secret created!");

    Ok(CreateSecretOutput {
        secret_name: input.secret_name,
        created: true,
    })
}

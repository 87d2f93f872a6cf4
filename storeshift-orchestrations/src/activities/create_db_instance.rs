//! Create DB instance activity
//!
//! Creates a fresh MySQL instance or restores one from a snapshot, then
//! waits until it reports `available`.

use crate::activity_names::activities;
use crate::activity_types::{CreateDbInstanceInput, CreateDbInstanceOutput, DbSource};
use crate::cloud::{
    CreateDbInstanceRequest, DbInstanceInfo, DbPlacement, PasswordPolicy, RestoreDbInstanceRequest,
};
use crate::context::ActivityContext;
use crate::error::{ProvisionError, Result};
use crate::poller::{wait_until, PollOutcome};
use storeshift_models::{DbCredentials, ResourceSpec};

/// Activity name for scheduling
pub const NAME: &str = activities::CREATE_DB_INSTANCE;

pub const ENGINE: &str = "mysql";

pub fn placement(input: &CreateDbInstanceInput) -> DbPlacement {
    DbPlacement {
        instance_class: input.instance_class.clone(),
        storage_type: input.storage_type.clone(),
        subnet_group_name: input.subnet_group_name.clone(),
        security_group_id: input.security_group_id.clone(),
        multi_az: true,
        publicly_accessible: false,
        deletion_protection: true,
    }
}

pub fn classify(info: DbInstanceInfo) -> PollOutcome<DbInstanceInfo> {
    match info.status.as_str() {
        "available" => PollOutcome::Satisfied(info),
        "failed" => PollOutcome::Fatal(info.status),
        _ => PollOutcome::Pending(info.status),
    }
}

/// Read the `password` key of a prior environment's RDS secret
async fn prior_password(ctx: &ActivityContext, secret_name: &str) -> Result<String> {
    if !ctx.prober().secret_exists(secret_name).await? {
        return Err(ProvisionError::missing(
            ResourceSpec::secret(secret_name, ctx.region()),
            "the prior RDS secret is needed to recover the restored instance's password",
        ));
    }
    let value = ctx.cloud().secrets.get_secret_value(secret_name).await?;
    let payload: serde_json::Value = serde_json::from_str(&value).map_err(|e| {
        ProvisionError::InvalidConfig(format!("secret '{}' is not JSON: {}", secret_name, e))
    })?;
    payload
        .get("password")
        .and_then(|p| p.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            ProvisionError::InvalidConfig(format!("secret '{}' has no password key", secret_name))
        })
}

pub async fn activity(
    ctx: ActivityContext,
    input: CreateDbInstanceInput,
) -> Result<CreateDbInstanceOutput> {
    let prober = ctx.prober();

    // 1. Check idempotency
    if prober.db_instance_exists(&input.identifier).await? {
        ctx.trace_info(format!(
            "Skipping RDS instance creation, instance '{}' already exists!",
            input.identifier
        ));
        return Ok(CreateDbInstanceOutput {
            identifier: input.identifier,
            credentials: None,
            endpoint: None,
            created: false,
        });
    }

    // 2. Dependencies
    if !prober.subnet_group_exists(&input.subnet_group_name).await? {
        return Err(ProvisionError::missing(
            ResourceSpec::subnet_group(&input.subnet_group_name, ctx.region()),
            "the DB subnet group must be created before the instance",
        ));
    }

    let rds = ctx.cloud().rds.clone();

    // 3. Create or restore
    let password = match &input.source {
        DbSource::Fresh { root_password } => {
            let password = match root_password {
                Some(password) => password.clone(),
                None => {
                    ctx.trace_info("Generating a random root password");
                    ctx.cloud()
                        .secrets
                        .random_password(&PasswordPolicy::DB_ROOT)
                        .await?
                }
            };
            ctx.trace_info(format!("Creating RDS instance '{}'", input.identifier));
            rds.create_db_instance(&CreateDbInstanceRequest {
                identifier: input.identifier.clone(),
                db_name: input.db_name.clone(),
                engine: ENGINE.to_string(),
                master_username: input.root_user.clone(),
                master_password: password.clone(),
                allocated_storage_gb: input.initial_storage_gb,
                max_allocated_storage_gb: input.max_storage_gb,
                backup_retention_days: input.backup_retention_days,
                placement: placement(&input),
            })
            .await?;
            Some(password)
        }
        DbSource::Restore {
            snapshot_id,
            prior_secret_name,
        } => {
            if !prober.snapshot_exists(snapshot_id).await? {
                return Err(ProvisionError::missing(
                    ResourceSpec::snapshot(snapshot_id, ctx.region()),
                    "the snapshot to restore from does not exist",
                ));
            }
            let password = match prior_secret_name {
                Some(secret_name) => {
                    let password = prior_password(&ctx, secret_name).await?;
                    ctx.trace_warn(format!(
                        "Reusing the password stored in '{}' for '{}' without verifying it matches the snapshot",
                        secret_name, input.identifier
                    ));
                    Some(password)
                }
                None => None,
            };
            ctx.trace_info(format!(
                "Restoring RDS instance '{}' from snapshot '{}'",
                input.identifier, snapshot_id
            ));
            rds.restore_db_instance_from_snapshot(&RestoreDbInstanceRequest {
                identifier: input.identifier.clone(),
                snapshot_id: snapshot_id.clone(),
                engine: ENGINE.to_string(),
                placement: placement(&input),
            })
            .await?;
            password
        }
    };

    // 4. Wait until available
    let what = format!("db instance {}", input.identifier);
    let identifier = input.identifier.clone();
    let info = wait_until(&what, &input.wait, || {
        let rds = rds.clone();
        let identifier = identifier.clone();
        async move { Ok(classify(rds.describe_db_instance(&identifier).await?)) }
    })
    .await?;
    ctx.trace_info(format!("RDS instance '{}' is available", input.identifier));

    let credentials = password.map(|password| DbCredentials {
        username: info
            .master_username
            .clone()
            .unwrap_or_else(|| input.root_user.clone()),
        password,
        database: info.db_name.clone().unwrap_or_else(|| input.db_name.clone()),
    });

    Ok(CreateDbInstanceOutput {
        identifier: input.identifier,
        credentials,
        endpoint: info.endpoint,
        created: true,
    })
}

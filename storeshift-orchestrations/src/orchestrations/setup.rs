//! Setup orchestration
//!
//! Provisions the S3 bucket and RDS instance Kubeflow stores artifacts and
//! metadata in, stores their credentials in Secrets Manager, wires the
//! cluster up to read them and republishes the connection parameters.
//! With a prior environment the new backends are seeded from it.

use super::{clone_bucket, publish_and_summarize, setup_cluster_secrets};
use crate::activities;
use crate::activity_types::{
    CheckSecretConflictInput, CreateBucketInput, CreateDbInstanceInput, CreateRdsSecretInput,
    CreateS3SecretInput, CreateSubnetGroupInput, DbSource, PublishParametersInput,
    SnapshotDbInput, VerifyPrerequisitesInput,
};
use crate::context::OrchestrationContext;
use crate::error::{ProvisionError, Result};
use crate::types::{SetupInput, SetupOutput};
use storeshift_models::{
    ClusterSummary, MigrationSummary, RdsSummary, ReplicationTask, ResourceKind, ResourceSpec,
    S3Summary,
};

struct S3Outcome {
    bucket_created: bool,
    secret_created: bool,
    replication: Option<ReplicationTask>,
}

struct RdsOutcome {
    instance_created: bool,
    secret_created: bool,
    snapshot_id: Option<String>,
}

pub async fn setup_orchestration(ctx: OrchestrationContext, input: SetupInput) -> Result<SetupOutput> {
    ctx.trace_info(format!(
        "Setting up S3 bucket '{}' and RDS instance '{}' for cluster '{}' in {}{}",
        input.bucket,
        input.database.instance_name,
        input.cluster_name,
        input.region,
        if input.prior.is_some() { " (upgrade)" } else { "" }
    ));

    // Step 1: Prerequisites
    ctx.trace_info("Step 1: Verifying prerequisites");
    let prerequisites = ctx
        .schedule_activity(
            activities::verify_prerequisites::NAME,
            VerifyPrerequisitesInput {
                cluster_name: input.cluster_name.clone(),
            },
            activities::verify_prerequisites::activity,
        )
        .await?;

    // Step 2: S3
    ctx.trace_info("Step 2: S3 setup");
    let s3 = setup_s3(&ctx, &input).await?;

    // Step 3: RDS
    ctx.trace_info("Step 3: RDS setup");
    let rds = setup_rds(&ctx, &input, &prerequisites.security_group_id).await?;

    // Step 4: Cluster access to secrets
    ctx.trace_info("Step 4: Setting up cluster secrets");
    setup_cluster_secrets(&ctx, &input.cluster_name, &input.region, &input.service_account).await?;

    // Step 5: Downstream configuration
    ctx.trace_info("Step 5: Publishing connection parameters");
    let (db_host, summary_path) = publish_and_summarize(
        &ctx,
        PublishParametersInput {
            region: input.region.clone(),
            instance_id: input.database.instance_name.clone(),
            bucket: input.bucket.clone(),
            rds_secret_name: input.rds_secret_name.clone(),
            s3_secret_name: input.s3_secret_name.clone(),
        },
        MigrationSummary {
            s3: S3Summary {
                bucket: input.bucket.clone(),
                secret_name: input.s3_secret_name.clone(),
            },
            rds: RdsSummary {
                instance_name: input.database.instance_name.clone(),
                secret_name: input.rds_secret_name.clone(),
                subnet_group_name: input.database.subnet_group_name.clone(),
            },
            cluster: ClusterSummary {
                region: input.region.clone(),
                name: input.cluster_name.clone(),
            },
        },
    )
    .await?;

    ctx.trace_info("RDS S3 setup complete");

    Ok(SetupOutput {
        bucket_created: s3.bucket_created,
        s3_secret_created: s3.secret_created,
        db_instance_created: rds.instance_created,
        rds_secret_created: rds.secret_created,
        replication: s3.replication,
        snapshot_id: rds.snapshot_id,
        db_host,
        summary_path,
    })
}

async fn setup_s3(ctx: &OrchestrationContext, input: &SetupInput) -> Result<S3Outcome> {
    // An orphaned secret blocks the bucket before anything is created
    ctx.schedule_activity(
        activities::check_secret_conflict::NAME,
        CheckSecretConflictInput {
            resource: ResourceSpec::bucket(&input.bucket, &input.region),
            secret_name: input.s3_secret_name.clone(),
            require_secret_for_existing: false,
        },
        activities::check_secret_conflict::activity,
    )
    .await?;

    let bucket = ctx
        .schedule_activity(
            activities::create_bucket::NAME,
            CreateBucketInput {
                bucket: input.bucket.clone(),
                region: input.region.clone(),
            },
            activities::create_bucket::activity,
        )
        .await?;

    let replication = match &input.prior {
        Some(prior) => {
            ctx.trace_info(format!(
                "Cloning prior bucket '{}' into '{}'",
                prior.bucket, input.bucket
            ));
            Some(
                clone_bucket(
                    ctx,
                    &prior.bucket,
                    &input.bucket,
                    &input.replication_role_name,
                    &input.waits,
                )
                .await?,
            )
        }
        None => None,
    };

    let secret = ctx
        .schedule_activity(
            activities::create_s3_secret::NAME,
            CreateS3SecretInput {
                secret_name: input.s3_secret_name.clone(),
                access_key_id: input.s3_access_key_id.clone(),
                secret_access_key: input.s3_secret_access_key.clone(),
            },
            activities::create_s3_secret::activity,
        )
        .await?;

    Ok(S3Outcome {
        bucket_created: bucket.created,
        secret_created: secret.created,
        replication,
    })
}

async fn setup_rds(
    ctx: &OrchestrationContext,
    input: &SetupInput,
    security_group_id: &str,
) -> Result<RdsOutcome> {
    let db = &input.database;

    let gate = ctx
        .schedule_activity(
            activities::check_secret_conflict::NAME,
            CheckSecretConflictInput {
                resource: ResourceSpec::db_instance(&db.instance_name, &input.region),
                secret_name: input.rds_secret_name.clone(),
                require_secret_for_existing: true,
            },
            activities::check_secret_conflict::activity,
        )
        .await?;

    if gate.resource_exists {
        ctx.trace_info(format!(
            "Skipping RDS setup, DB instance '{}' already exists!",
            db.instance_name
        ));
        return Ok(RdsOutcome {
            instance_created: false,
            secret_created: false,
            snapshot_id: None,
        });
    }

    let (source, snapshot_id) = match &input.prior {
        Some(prior) => {
            let snapshot = ctx
                .schedule_activity(
                    activities::snapshot_db::NAME,
                    SnapshotDbInput {
                        source_instance: prior.db_instance.clone(),
                        wait: input.waits.snapshot,
                    },
                    activities::snapshot_db::activity,
                )
                .await?;
            (
                DbSource::Restore {
                    snapshot_id: snapshot.snapshot_id.clone(),
                    prior_secret_name: Some(prior.rds_secret_name.clone()),
                },
                Some(snapshot.snapshot_id),
            )
        }
        None => (
            DbSource::Fresh {
                root_password: db.root_password.clone(),
            },
            None,
        ),
    };

    ctx.schedule_activity(
        activities::create_subnet_group::NAME,
        CreateSubnetGroupInput {
            name: db.subnet_group_name.clone(),
            cluster_name: input.cluster_name.clone(),
        },
        activities::create_subnet_group::activity,
    )
    .await?;

    let instance = ctx
        .schedule_activity(
            activities::create_db_instance::NAME,
            CreateDbInstanceInput {
                identifier: db.instance_name.clone(),
                db_name: db.db_name.clone(),
                root_user: db.root_user.clone(),
                instance_class: db.instance_class.clone(),
                storage_type: db.storage_type.clone(),
                initial_storage_gb: db.initial_storage_gb,
                max_storage_gb: db.max_storage_gb,
                backup_retention_days: db.backup_retention_days,
                subnet_group_name: db.subnet_group_name.clone(),
                security_group_id: security_group_id.to_string(),
                source,
                wait: input.waits.db_instance,
            },
            activities::create_db_instance::activity,
        )
        .await?;

    // Instance appeared between the gate and the create call
    let credentials = instance.credentials.ok_or_else(|| {
        ProvisionError::conflict(
            ResourceKind::RelationalInstance,
            &db.instance_name,
            format!(
                "secret '{}' cannot be created because the instance's credentials are unknown",
                input.rds_secret_name
            ),
        )
    })?;

    let secret = ctx
        .schedule_activity(
            activities::create_rds_secret::NAME,
            CreateRdsSecretInput {
                secret_name: input.rds_secret_name.clone(),
                instance_id: db.instance_name.clone(),
                username: if credentials.username.is_empty() {
                    db.root_user.clone()
                } else {
                    credentials.username
                },
                password: credentials.password,
            },
            activities::create_rds_secret::activity,
        )
        .await?;

    Ok(RdsOutcome {
        instance_created: instance.created,
        secret_created: secret.created,
        snapshot_id,
    })
}

//! Blue/green upgrade orchestration
//!
//! Moves the backends of a running (green) installation to a new (blue)
//! cluster: the green bucket is cloned into the blue bucket and, unless the
//! blue instance already exists, a snapshot of the green instance is
//! restored into it. No secrets are created; both installations share the
//! secret names, which are republished as-is.

use super::{clone_bucket, publish_and_summarize, setup_cluster_secrets};
use crate::activities;
use crate::activity_types::{
    CreateBucketInput, CreateDbInstanceInput, CreateSubnetGroupInput, DbSource, ProbeResourceInput,
    PublishParametersInput, SnapshotDbInput, TrustClusterOidcInput, VerifyPrerequisitesInput,
};
use crate::context::OrchestrationContext;
use crate::error::Result;
use crate::types::{UpgradeInput, UpgradeOutput};
use storeshift_models::{ClusterSummary, MigrationSummary, RdsSummary, ResourceSpec, S3Summary};

pub async fn upgrade_orchestration(
    ctx: OrchestrationContext,
    input: UpgradeInput,
) -> Result<UpgradeOutput> {
    let db = &input.database;
    ctx.trace_info(format!(
        "Upgrading to cluster '{}': bucket '{}' -> '{}', instance '{}' -> '{}'",
        input.cluster_blue, input.bucket_green, input.bucket_blue, input.db_instance_green, db.instance_name
    ));

    // Step 1: Prerequisites
    ctx.trace_info("Step 1: Verifying prerequisites");
    let prerequisites = ctx
        .schedule_activity(
            activities::verify_prerequisites::NAME,
            VerifyPrerequisitesInput {
                cluster_name: input.cluster_blue.clone(),
            },
            activities::verify_prerequisites::activity,
        )
        .await?;

    // Step 2: Blue bucket seeded from green
    ctx.trace_info("Step 2: S3 setup");
    let bucket = ctx
        .schedule_activity(
            activities::create_bucket::NAME,
            CreateBucketInput {
                bucket: input.bucket_blue.clone(),
                region: input.region.clone(),
            },
            activities::create_bucket::activity,
        )
        .await?;
    let replication = clone_bucket(
        &ctx,
        &input.bucket_green,
        &input.bucket_blue,
        &input.replication_role_name,
        &input.waits,
    )
    .await?;

    // Step 3: Blue instance restored from a green snapshot
    ctx.trace_info("Step 3: RDS setup");
    let blue = ctx
        .schedule_activity(
            activities::probe_resource::NAME,
            ProbeResourceInput {
                resource: ResourceSpec::db_instance(&db.instance_name, &input.region),
            },
            activities::probe_resource::activity,
        )
        .await?;

    let (snapshot_id, db_instance_created) = if blue.exists {
        ctx.trace_info(format!(
            "Skipping RDS setup, DB instance '{}' already exists!",
            db.instance_name
        ));
        (None, false)
    } else {
        let snapshot = ctx
            .schedule_activity(
                activities::snapshot_db::NAME,
                SnapshotDbInput {
                    source_instance: input.db_instance_green.clone(),
                    wait: input.waits.snapshot,
                },
                activities::snapshot_db::activity,
            )
            .await?;

        ctx.schedule_activity(
            activities::create_subnet_group::NAME,
            CreateSubnetGroupInput {
                name: db.subnet_group_name.clone(),
                cluster_name: input.cluster_blue.clone(),
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
                    security_group_id: prerequisites.security_group_id.clone(),
                    source: DbSource::Restore {
                        snapshot_id: snapshot.snapshot_id.clone(),
                        prior_secret_name: None,
                    },
                    wait: input.waits.db_instance,
                },
                activities::create_db_instance::activity,
            )
            .await?;
        (Some(snapshot.snapshot_id), instance.created)
    };

    // Step 4: Cluster access to secrets
    ctx.trace_info("Step 4: Setting up cluster secrets");
    setup_cluster_secrets(&ctx, &input.cluster_blue, &input.region, &input.service_account).await?;
    let trust = ctx
        .schedule_activity(
            activities::trust_cluster_oidc::NAME,
            TrustClusterOidcInput {
                cluster_name: input.cluster_blue.clone(),
            },
            activities::trust_cluster_oidc::activity,
        )
        .await?;

    // Step 5: Downstream configuration
    ctx.trace_info("Step 5: Publishing connection parameters");
    let (db_host, summary_path) = publish_and_summarize(
        &ctx,
        PublishParametersInput {
            region: input.region.clone(),
            instance_id: db.instance_name.clone(),
            bucket: input.bucket_blue.clone(),
            rds_secret_name: input.rds_secret_name.clone(),
            s3_secret_name: input.s3_secret_name.clone(),
        },
        MigrationSummary {
            s3: S3Summary {
                bucket: input.bucket_blue.clone(),
                secret_name: input.s3_secret_name.clone(),
            },
            rds: RdsSummary {
                instance_name: db.instance_name.clone(),
                secret_name: input.rds_secret_name.clone(),
                subnet_group_name: db.subnet_group_name.clone(),
            },
            cluster: ClusterSummary {
                region: input.region.clone(),
                name: input.cluster_blue.clone(),
            },
        },
    )
    .await?;

    ctx.trace_info("RDS S3 upgrade complete");

    Ok(UpgradeOutput {
        bucket_created: bucket.created,
        replication,
        snapshot_id,
        db_instance_created,
        profile_roles_updated: trust.roles_updated,
        db_host,
        summary_path,
    })
}

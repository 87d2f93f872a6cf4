//! Orchestrations: ordered sequences of activities
//!
//! The steps shared by setup and upgrade live here.

pub mod export_vars;
pub mod flows;
pub mod setup;
pub mod upgrade;

use crate::activities;
use crate::activity_types::{
    CloneBucketInput, EnsureReplicationRoleInput, PublishParametersInput,
    SetupClusterSecretsInput,
};
use crate::context::OrchestrationContext;
use crate::error::Result;
use crate::types::{ServiceAccountSettings, WaitSettings};
use std::time::Duration;
use storeshift_models::{MigrationSummary, ReplicationTask};

/// Copy `source_bucket` into `target_bucket`, creating the DataSync role if needed
pub(crate) async fn clone_bucket(
    ctx: &OrchestrationContext,
    source_bucket: &str,
    target_bucket: &str,
    role_name: &str,
    waits: &WaitSettings,
) -> Result<ReplicationTask> {
    let role = ctx
        .schedule_activity(
            activities::ensure_replication_role::NAME,
            EnsureReplicationRoleInput {
                role_name: role_name.to_string(),
                source_bucket: source_bucket.to_string(),
                target_bucket: target_bucket.to_string(),
            },
            activities::ensure_replication_role::activity,
        )
        .await?;

    if role.created {
        ctx.trace_info(format!(
            "Waiting {}s for the new IAM role to propagate",
            waits.iam_propagation_seconds
        ));
        ctx.sleep(Duration::from_secs(waits.iam_propagation_seconds))
            .await;
    }

    ctx.schedule_activity(
        activities::clone_bucket::NAME,
        CloneBucketInput {
            source_bucket: source_bucket.to_string(),
            target_bucket: target_bucket.to_string(),
            role_arn: role.role_arn,
            wait: waits.replication,
        },
        activities::clone_bucket::activity,
    )
    .await
}

pub(crate) async fn setup_cluster_secrets(
    ctx: &OrchestrationContext,
    cluster_name: &str,
    region: &str,
    service_account: &ServiceAccountSettings,
) -> Result<()> {
    let output = ctx
        .schedule_activity(
            activities::setup_cluster_secrets::NAME,
            SetupClusterSecretsInput {
                cluster_name: cluster_name.to_string(),
                region: region.to_string(),
                service_account: service_account.name.clone(),
                namespace: service_account.namespace.clone(),
                policy_arns: service_account.policy_arns.clone(),
            },
            activities::setup_cluster_secrets::activity,
        )
        .await?;
    ctx.trace_info(format!(
        "Cluster secrets ready ({} manifests, {} objects)",
        output.manifests_applied, output.objects_applied
    ));
    Ok(())
}

/// Republish connection parameters and write the summary; returns (db host, summary path)
pub(crate) async fn publish_and_summarize(
    ctx: &OrchestrationContext,
    params: PublishParametersInput,
    summary: MigrationSummary,
) -> Result<(String, String)> {
    let published = ctx
        .schedule_activity(
            activities::publish_parameters::NAME,
            params,
            activities::publish_parameters::activity,
        )
        .await?;

    let written = ctx
        .schedule_activity(
            activities::write_summary::NAME,
            summary,
            activities::write_summary::activity,
        )
        .await?;

    Ok((published.db_host, written.path))
}

//! Verify prerequisites activity

use crate::activity_names::activities;
use crate::activity_types::{VerifyPrerequisitesInput, VerifyPrerequisitesOutput};
use crate::context::ActivityContext;
use crate::error::{ProvisionError, Result};

/// Activity name for scheduling
pub const NAME: &str = activities::VERIFY_PREREQUISITES;

pub async fn activity(
    ctx: ActivityContext,
    input: VerifyPrerequisitesInput,
) -> Result<VerifyPrerequisitesOutput> {
    ctx.trace_info("Verifying prerequisites");

    // 1. Local tooling and cluster access
    ctx.addons().verify_prerequisites().await?;

    // 2. The target cluster must exist in this region
    let cluster = match ctx.cloud().eks.describe_cluster(&input.cluster_name).await {
        Ok(cluster) => cluster,
        Err(e) if e.is_not_found() => {
            return Err(ProvisionError::Prerequisite(format!(
                "EKS cluster '{}' not found in {}",
                input.cluster_name,
                ctx.region()
            )))
        }
        Err(e) => return Err(e.into()),
    };

    let security_group_id = cluster.security_group_id.ok_or_else(|| {
        ProvisionError::Prerequisite(format!(
            "EKS cluster '{}' has no cluster security group",
            input.cluster_name
        ))
    })?;

    ctx.trace_info(format!(
        "Cluster '{}' found (security group {}, {} subnets)",
        input.cluster_name,
        security_group_id,
        cluster.subnet_ids.len()
    ));

    Ok(VerifyPrerequisitesOutput {
        cluster_name: input.cluster_name,
        security_group_id,
        subnet_ids: cluster.subnet_ids,
    })
}

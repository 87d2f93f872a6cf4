//! Setup cluster secrets activity
//!
//! Binds an IRSA service account to Secrets Manager and installs the
//! secrets-store CSI driver with the AWS provider so pods can mount secrets.

use crate::activity_names::activities;
use crate::activity_types::{SetupClusterSecretsInput, SetupClusterSecretsOutput};
use crate::addons::{secrets_store_manifests, ServiceAccountRequest};
use crate::context::ActivityContext;
use crate::error::Result;

/// Activity name for scheduling
pub const NAME: &str = activities::SETUP_CLUSTER_SECRETS;

pub async fn activity(
    ctx: ActivityContext,
    input: SetupClusterSecretsInput,
) -> Result<SetupClusterSecretsOutput> {
    // 1. IRSA service account
    ctx.trace_info(format!(
        "Creating service account {}/{} in cluster '{}'",
        input.namespace, input.service_account, input.cluster_name
    ));
    let role_arn = ctx
        .addons()
        .ensure_service_account(&ServiceAccountRequest {
            name: input.service_account,
            namespace: input.namespace,
            cluster_name: input.cluster_name,
            region: input.region,
            policy_arns: input.policy_arns,
        })
        .await?;
    ctx.trace_info(format!("Service account bound to {}", role_arn));

    // 2. CSI driver and AWS provider, in order
    let manifests = secrets_store_manifests();
    let mut objects_applied = 0;
    for url in &manifests {
        let applied = ctx.addons().apply_manifest(url).await?;
        ctx.trace_info(format!("Applied {} object(s) from {}", applied, url));
        objects_applied += applied;
    }

    Ok(SetupClusterSecretsOutput {
        role_arn,
        manifests_applied: manifests.len(),
        objects_applied,
    })
}

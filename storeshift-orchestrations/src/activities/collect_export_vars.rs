//! Collect export vars activity
//!
//! Reads the live cluster, instance, VPC and file system so an upgrade
//! baseline can be described without access to the original tooling state.

use crate::activity_names::activities;
use crate::activity_types::{ClusterVars, CollectExportVarsInput, CollectExportVarsOutput, UpgradeVars};
use crate::cloud::ClusterInfo;
use crate::context::ActivityContext;
use crate::error::{ProvisionError, Result};
use crate::subnets::{private_subnet_ids, public_subnet_ids};

/// Activity name for scheduling
pub const NAME: &str = activities::COLLECT_EXPORT_VARS;

fn required(value: Option<String>, field: &str, owner: &str) -> Result<String> {
    value.ok_or_else(|| ProvisionError::InvalidConfig(format!("{} reports no {}", owner, field)))
}

fn cluster_vars(cluster: &ClusterInfo, region: &str) -> Result<ClusterVars> {
    let owner = format!("EKS cluster '{}'", cluster.name);
    Ok(ClusterVars {
        eks_cluster_id: cluster.name.clone(),
        eks_cluster_endpoint: required(cluster.endpoint.clone(), "endpoint", &owner)?,
        oidc_provider: required(cluster.oidc_issuer.clone(), "OIDC issuer", &owner)?,
        eks_cluster_version: required(cluster.version.clone(), "version", &owner)?,
        eks_cluster_certificate_authority_data: required(
            cluster.certificate_authority.clone(),
            "certificate authority",
            &owner,
        )?,
        region: region.to_string(),
    })
}

pub async fn activity(
    ctx: ActivityContext,
    input: CollectExportVarsInput,
) -> Result<CollectExportVarsOutput> {
    let cloud = ctx.cloud();

    // 1. Cluster
    ctx.trace_info(format!("Describing EKS cluster '{}'", input.cluster_name));
    let cluster = cloud.eks.describe_cluster(&input.cluster_name).await?;
    let cluster_vars = cluster_vars(&cluster, &input.region)?;
    let cluster_sg = required(
        cluster.security_group_id.clone(),
        "cluster security group",
        &format!("EKS cluster '{}'", cluster.name),
    )?;

    // 2. Network
    let subnets = cloud.ec2.describe_subnets(&cluster.subnet_ids).await?;
    let instance_owner = format!("RDS instance '{}'", input.db_instance);
    let instance = cloud.rds.describe_db_instance(&input.db_instance).await?;
    let vpc_id = required(instance.vpc_id, "VPC", &instance_owner)?;
    let vpc_cidr = cloud.ec2.describe_vpc_cidr(&vpc_id).await?;
    let rds_endpoint = required(
        instance.endpoint.map(|endpoint| endpoint.address),
        "endpoint",
        &instance_owner,
    )?;

    // 3. File system
    let efs_id = cloud.efs.find_file_system(&input.efs_name).await?;
    if efs_id.is_none() {
        ctx.trace_warn(format!("No EFS file system named '{}'", input.efs_name));
    }

    Ok(CollectExportVarsOutput {
        cluster: cluster_vars,
        upgrade: UpgradeVars {
            src_s3_bucket_name: input.bucket,
            src_s3_secret_name: input.s3_secret_name,
            src_rds_secret_name: input.rds_secret_name,
            src_vpc_id: vpc_id,
            src_vpc_cidr: vpc_cidr,
            src_vpc_private_subnets: private_subnet_ids(&subnets),
            src_vpc_public_subnets: public_subnet_ids(&subnets),
            src_rds_endpoint: rds_endpoint,
            src_cluster_sg_id: cluster_sg,
            src_efs_fs_id: efs_id,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::fake::FakeCloud;
    use crate::testing::Harness;

    fn input() -> CollectExportVarsInput {
        CollectExportVarsInput {
            cluster_name: "kf".to_string(),
            region: "us-west-2".to_string(),
            bucket: "kf-artifacts".to_string(),
            efs_name: "kf-efs".to_string(),
            db_instance: "kubeflow-db".to_string(),
            rds_secret_name: "rds-secret".to_string(),
            s3_secret_name: "s3-secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_vars_are_read_from_live_resources() {
        let cloud = FakeCloud::with_cluster("us-west-2", "kf");
        cloud.add_instance("kubeflow-db", "available");
        cloud.add_vpc("vpc-123", "192.168.0.0/16");
        cloud.add_file_system("kf-efs", "fs-0abc");

        let output = Harness::new(cloud)
            .context("test")
            .schedule_activity(NAME, input(), activity)
            .await
            .unwrap();

        assert_eq!(output.cluster.eks_cluster_id, "kf");
        assert_eq!(output.cluster.eks_cluster_version, "1.25");
        assert_eq!(output.upgrade.src_vpc_cidr, "192.168.0.0/16");
        assert_eq!(
            output.upgrade.src_vpc_private_subnets,
            vec!["subnet-private-a", "subnet-private-b"]
        );
        assert_eq!(output.upgrade.src_vpc_public_subnets, vec!["subnet-public-c"]);
        assert_eq!(output.upgrade.src_cluster_sg_id, "sg-cluster");
        assert_eq!(output.upgrade.src_efs_fs_id.as_deref(), Some("fs-0abc"));
    }

    #[tokio::test]
    async fn test_missing_file_system_is_not_fatal() {
        let cloud = FakeCloud::with_cluster("us-west-2", "kf");
        cloud.add_instance("kubeflow-db", "available");
        cloud.add_vpc("vpc-123", "192.168.0.0/16");

        let output = Harness::new(cloud)
            .context("test")
            .schedule_activity(NAME, input(), activity)
            .await
            .unwrap();

        assert_eq!(output.upgrade.src_efs_fs_id, None);
    }
}

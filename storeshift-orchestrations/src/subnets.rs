//! Private/public subnet classification from EC2 tags
//!
//! eksctl names its subnets `.../SubnetPrivate...` and `.../SubnetPublic...`;
//! CDK-generated VPCs carry an `aws-cdk:subnet-type` tag instead.

use crate::cloud::{CloudClients, SubnetInfo};
use crate::error::{ProvisionError, Result};

const CDK_SUBNET_TYPE: &str = "aws-cdk:subnet-type";

fn has_tier(subnet: &SubnetInfo, eksctl_marker: &str, cdk_value: &str) -> bool {
    subnet.tags.iter().any(|tag| {
        tag.value.contains(eksctl_marker)
            || (tag.key.contains(CDK_SUBNET_TYPE) && tag.value.contains(cdk_value))
    })
}

pub fn is_private(subnet: &SubnetInfo) -> bool {
    has_tier(subnet, "SubnetPrivate", "Private")
}

pub fn is_public(subnet: &SubnetInfo) -> bool {
    has_tier(subnet, "SubnetPublic", "Public")
}

/// Ids of the subnets matching `predicate`, in input order, each listed once
fn select(subnets: &[SubnetInfo], predicate: fn(&SubnetInfo) -> bool) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for subnet in subnets.iter().filter(|s| predicate(s)) {
        let id = subnet.subnet_id.trim();
        if !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

pub fn private_subnet_ids(subnets: &[SubnetInfo]) -> Vec<String> {
    select(subnets, is_private)
}

pub fn public_subnet_ids(subnets: &[SubnetInfo]) -> Vec<String> {
    select(subnets, is_public)
}

/// Subnets attached to the cluster's control plane, with their tags
pub async fn cluster_subnets(clients: &CloudClients, cluster_name: &str) -> Result<Vec<SubnetInfo>> {
    let cluster = clients.eks.describe_cluster(cluster_name).await?;
    if cluster.subnet_ids.is_empty() {
        return Err(ProvisionError::InvalidConfig(format!(
            "EKS cluster '{}' reports no subnets",
            cluster_name
        )));
    }
    Ok(clients.ec2.describe_subnets(&cluster.subnet_ids).await?)
}

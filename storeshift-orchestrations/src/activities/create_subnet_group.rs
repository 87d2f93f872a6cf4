//! Create DB subnet group activity

use crate::activity_names::activities;
use crate::activity_types::{CreateSubnetGroupInput, CreateSubnetGroupOutput};
use crate::context::ActivityContext;
use crate::error::{ProvisionError, Result};
use crate::subnets::{cluster_subnets, private_subnet_ids};

/// Activity name for scheduling
pub const NAME: &str = activities::CREATE_SUBNET_GROUP;

const DESCRIPTION: &str = "Subnet group for Kubeflow metadata db";

pub async fn activity(
    ctx: ActivityContext,
    input: CreateSubnetGroupInput,
) -> Result<CreateSubnetGroupOutput> {
    // 1. Check idempotency
    if ctx.prober().subnet_group_exists(&input.name).await? {
        ctx.trace_info(format!(
            "Skipping DB subnet group creation, subnet group '{}' already exists!",
            input.name
        ));
        return Ok(CreateSubnetGroupOutput {
            name: input.name,
            subnet_ids: Vec::new(),
            created: false,
        });
    }

    // 2. Resolve the cluster's private subnets
    let subnets = cluster_subnets(ctx.cloud(), &input.cluster_name).await?;
    let subnet_ids = private_subnet_ids(&subnets);
    if subnet_ids.is_empty() {
        return Err(ProvisionError::InvalidConfig(format!(
            "no private subnets found for EKS cluster '{}'",
            input.cluster_name
        )));
    }

    // 3. Create
    ctx.trace_info(format!(
        "Creating DB subnet group '{}' with subnets {:?}",
        input.name, subnet_ids
    ));
    ctx.cloud()
        .rds
        .create_db_subnet_group(&input.name, DESCRIPTION, &subnet_ids)
        .await?;
    ctx.trace_info("DB subnet group created!");

    Ok(CreateSubnetGroupOutput {
        name: input.name,
        subnet_ids,
        created: true,
    })
}

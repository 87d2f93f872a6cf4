//! Export vars orchestration
//!
//! Renders the Terraform variable files describing an existing installation.

use crate::activities;
use crate::activity_types::{ClusterVars, CollectExportVarsInput, UpgradeVars};
use crate::context::OrchestrationContext;
use crate::error::{ProvisionError, Result};
use crate::types::{ExportVarsInput, ExportVarsOutput};
use tera::{Context as TeraContext, Tera};

pub const CLUSTER_TFVARS_FILE: &str = "sample.auto.tfvars";
pub const UPGRADE_TFVARS_FILE: &str = "upgrade.tfvars";

const CLUSTER_TFVARS_TEMPLATE: &str = include_str!("../templates/sample.auto.tfvars");
const UPGRADE_TFVARS_TEMPLATE: &str = include_str!("../templates/upgrade.tfvars");

fn render(name: &str, template: &str, context: &TeraContext) -> Result<String> {
    let mut tera = Tera::default();
    tera.add_raw_template(name, template)
        .and_then(|_| tera.render(name, context))
        .map_err(|e| ProvisionError::InvalidConfig(format!("{} template: {}", name, e)))
}

fn to_context<T: serde::Serialize>(name: &str, value: &T) -> Result<TeraContext> {
    TeraContext::from_serialize(value)
        .map_err(|e| ProvisionError::InvalidConfig(format!("{} variables: {}", name, e)))
}

pub fn render_cluster_tfvars(vars: &ClusterVars) -> Result<String> {
    let context = to_context(CLUSTER_TFVARS_FILE, vars)?;
    render(CLUSTER_TFVARS_FILE, CLUSTER_TFVARS_TEMPLATE, &context)
}

pub fn render_upgrade_tfvars(vars: &UpgradeVars) -> Result<String> {
    let mut context = to_context(UPGRADE_TFVARS_FILE, vars)?;
    let json = |subnets: &[String]| {
        serde_json::to_string(subnets)
            .map_err(|e| ProvisionError::InvalidConfig(format!("subnet list: {}", e)))
    };
    context.insert("private_subnets_json", &json(&vars.src_vpc_private_subnets)?);
    context.insert("public_subnets_json", &json(&vars.src_vpc_public_subnets)?);
    render(UPGRADE_TFVARS_FILE, UPGRADE_TFVARS_TEMPLATE, &context)
}

pub async fn export_vars_orchestration(
    ctx: OrchestrationContext,
    input: ExportVarsInput,
) -> Result<ExportVarsOutput> {
    ctx.trace_info(format!(
        "Collecting Terraform variables for cluster '{}' in {}",
        input.cluster_name, input.region
    ));

    let vars = ctx
        .schedule_activity(
            activities::collect_export_vars::NAME,
            CollectExportVarsInput {
                cluster_name: input.cluster_name,
                region: input.region,
                bucket: input.bucket,
                efs_name: input.efs_name,
                db_instance: input.db_instance,
                rds_secret_name: input.rds_secret_name,
                s3_secret_name: input.s3_secret_name,
            },
            activities::collect_export_vars::activity,
        )
        .await?;

    Ok(ExportVarsOutput {
        cluster_tfvars: render_cluster_tfvars(&vars.cluster)?,
        upgrade_tfvars: render_upgrade_tfvars(&vars.upgrade)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::fake::FakeCloud;
    use crate::names::orchestrations;
    use crate::testing::Harness;

    fn upgrade_vars(efs: Option<&str>) -> UpgradeVars {
        UpgradeVars {
            src_s3_bucket_name: "kf-artifacts".to_string(),
            src_s3_secret_name: "s3-secret".to_string(),
            src_rds_secret_name: "rds-secret".to_string(),
            src_vpc_id: "vpc-123".to_string(),
            src_vpc_cidr: "192.168.0.0/16".to_string(),
            src_vpc_private_subnets: vec!["subnet-a".to_string(), "subnet-b".to_string()],
            src_vpc_public_subnets: vec![],
            src_rds_endpoint: "kubeflow-db.example.rds.amazonaws.com".to_string(),
            src_cluster_sg_id: "sg-cluster".to_string(),
            src_efs_fs_id: efs.map(str::to_string),
        }
    }

    #[test]
    fn test_subnets_render_as_hcl_lists() {
        let rendered = render_upgrade_tfvars(&upgrade_vars(Some("fs-0abc"))).unwrap();

        assert!(rendered.contains(r#"src_vpc_private_subnets = ["subnet-a","subnet-b"]"#));
        assert!(rendered.contains("src_vpc_public_subnets = []"));
        assert!(rendered.contains(r#"src_efs_fs_id = "fs-0abc""#));
    }

    #[test]
    fn test_missing_file_system_renders_null() {
        let rendered = render_upgrade_tfvars(&upgrade_vars(None)).unwrap();
        assert!(rendered.contains("src_efs_fs_id = null"));
    }

    #[tokio::test]
    async fn test_cluster_tfvars_from_live_cluster() {
        let cloud = FakeCloud::with_cluster("us-west-2", "kf");
        cloud.add_instance("kubeflow-db", "available");
        cloud.add_vpc("vpc-123", "192.168.0.0/16");
        let harness = Harness::new(cloud);

        let output = export_vars_orchestration(
            harness.context(orchestrations::EXPORT_VARS),
            ExportVarsInput {
                region: "us-west-2".to_string(),
                cluster_name: "kf".to_string(),
                bucket: "kf-artifacts".to_string(),
                efs_name: "kf-efs".to_string(),
                db_instance: "kubeflow-db".to_string(),
                rds_secret_name: "rds-secret".to_string(),
                s3_secret_name: "s3-secret".to_string(),
            },
        )
        .await
        .unwrap();

        assert!(output.cluster_tfvars.contains(r#"eks_cluster_id = "kf""#));
        assert!(output.cluster_tfvars.contains(r#"region = "us-west-2""#));
        assert!(output
            .cluster_tfvars
            .contains(r#"oidc_provider = "https://oidc.eks.us-west-2.amazonaws.com/id/ABCDEF""#));
        assert!(output
            .upgrade_tfvars
            .contains(r#"src_rds_endpoint = "kubeflow-db.c9akciq32.us-west-2.rds.amazonaws.com""#));
    }
}

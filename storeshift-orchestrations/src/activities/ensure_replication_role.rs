//! Ensure replication role activity

use crate::activity_names::activities;
use crate::activity_types::{EnsureReplicationRoleInput, EnsureReplicationRoleOutput};
use crate::context::ActivityContext;
use crate::error::{ProvisionError, Result};
use tera::{Context as TeraContext, Tera};

/// Activity name for scheduling
pub const NAME: &str = activities::ENSURE_REPLICATION_ROLE;

/// Inline policy granting DataSync access to both buckets
pub const S3_ACCESS_POLICY_NAME: &str = "datasync_s3_kubeflow";

pub fn bucket_arn(bucket: &str) -> String {
    format!("arn:aws:s3:::{}", bucket)
}

/// Render a JSON policy template and compact it
fn render_policy(name: &str, template: &str, context: &TeraContext) -> Result<String> {
    let mut tera = Tera::default();
    tera.add_raw_template(name, template)
        .and_then(|_| tera.render(name, context))
        .map_err(|e| ProvisionError::InvalidConfig(format!("{} template: {}", name, e)))
        .and_then(|rendered| {
            let document: serde_json::Value = serde_json::from_str(&rendered)
                .map_err(|e| ProvisionError::InvalidConfig(format!("{} is not valid JSON: {}", name, e)))?;
            Ok(document.to_string())
        })
}

pub fn trust_policy() -> Result<String> {
    render_policy(
        "datasync-trust-policy",
        include_str!("../templates/datasync-trust-policy.json"),
        &TeraContext::new(),
    )
}

pub fn s3_access_policy(source_bucket: &str, target_bucket: &str) -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("source_bucket_arn", &bucket_arn(source_bucket));
    context.insert("target_bucket_arn", &bucket_arn(target_bucket));
    render_policy(
        "datasync-s3-access-policy",
        include_str!("../templates/datasync-s3-access-policy.json"),
        &context,
    )
}

pub async fn activity(
    ctx: ActivityContext,
    input: EnsureReplicationRoleInput,
) -> Result<EnsureReplicationRoleOutput> {
    // 1. An existing role is used as-is; its policies are not touched
    if let Some(role_arn) = ctx.prober().role_arn(&input.role_name).await? {
        ctx.trace_info(format!(
            "Skipping DataSync role creation, role '{}' already exists!",
            input.role_name
        ));
        return Ok(EnsureReplicationRoleOutput {
            role_arn,
            created: false,
        });
    }

    // 2. Render policies before any mutation
    let trust = trust_policy()?;
    let access = s3_access_policy(&input.source_bucket, &input.target_bucket)?;

    // 3. Create role and attach the inline policy
    ctx.trace_info(format!("Creating DataSync role '{}'", input.role_name));
    let role = ctx.cloud().iam.create_role(&input.role_name, &trust).await?;
    ctx.cloud()
        .iam
        .put_role_policy(&input.role_name, S3_ACCESS_POLICY_NAME, &access)
        .await?;
    ctx.trace_info(format!("DataSync role created: {}", role.arn));

    Ok(EnsureReplicationRoleOutput {
        role_arn: role.arn,
        created: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::fake::FakeCloud;
    use crate::testing::Harness;

    #[test]
    fn test_access_policy_covers_both_buckets() {
        let policy: serde_json::Value =
            serde_json::from_str(&s3_access_policy("green", "blue").unwrap()).unwrap();

        let bucket_level = &policy["Statement"][0];
        assert_eq!(bucket_level["Resource"][0], "arn:aws:s3:::green");
        assert_eq!(bucket_level["Resource"][1], "arn:aws:s3:::blue");
        assert_eq!(bucket_level["Action"].as_array().unwrap().len(), 3);

        let object_level = &policy["Statement"][1];
        assert_eq!(object_level["Resource"][0], "arn:aws:s3:::green/*");
        assert_eq!(object_level["Resource"][1], "arn:aws:s3:::blue/*");
        assert_eq!(object_level["Action"].as_array().unwrap().len(), 7);
    }

    #[test]
    fn test_trust_policy_names_datasync() {
        let policy: serde_json::Value = serde_json::from_str(&trust_policy().unwrap()).unwrap();
        assert_eq!(
            policy["Statement"][0]["Principal"]["Service"],
            "datasync.amazonaws.com"
        );
        assert_eq!(policy["Statement"][0]["Action"], "sts:AssumeRole");
    }

    #[tokio::test]
    async fn test_existing_role_is_returned_untouched() {
        let cloud = FakeCloud::new("us-west-2");
        cloud.add_role("datasyncrolekubeflow");
        let harness = Harness::new(cloud.clone());

        let output = harness
            .context("test")
            .schedule_activity(
                NAME,
                EnsureReplicationRoleInput {
                    role_name: "datasyncrolekubeflow".to_string(),
                    source_bucket: "green".to_string(),
                    target_bucket: "blue".to_string(),
                },
                activity,
            )
            .await
            .unwrap();

        assert!(!output.created);
        assert!(output.role_arn.ends_with("role/datasyncrolekubeflow"));
        assert!(cloud.mutating_calls().is_empty());
    }

    #[tokio::test]
    async fn test_new_role_gets_inline_policy() {
        let cloud = FakeCloud::new("us-west-2");
        let harness = Harness::new(cloud.clone());

        let output = harness
            .context("test")
            .schedule_activity(
                NAME,
                EnsureReplicationRoleInput {
                    role_name: "datasyncrolekubeflow".to_string(),
                    source_bucket: "green".to_string(),
                    target_bucket: "blue".to_string(),
                },
                activity,
            )
            .await
            .unwrap();

        assert!(output.created);
        let policy = cloud
            .role_policy("datasyncrolekubeflow", S3_ACCESS_POLICY_NAME)
            .unwrap();
        assert!(policy.contains("arn:aws:s3:::blue/*"));
    }
}

//! Trust cluster OIDC activity
//!
//! Profile namespaces carry service accounts annotated with IAM roles that
//! were created for the previous cluster. Those roles only trust the old
//! cluster's OIDC provider, so the new cluster's provider is appended to
//! each role's trust policy.

use crate::activity_names::activities;
use crate::activity_types::{TrustClusterOidcInput, TrustClusterOidcOutput};
use crate::context::ActivityContext;
use crate::error::{ProvisionError, Result};
use serde_json::{json, Value};
use std::collections::BTreeSet;

/// Activity name for scheduling
pub const NAME: &str = activities::TRUST_CLUSTER_OIDC;

pub async fn activity(
    ctx: ActivityContext,
    input: TrustClusterOidcInput,
) -> Result<TrustClusterOidcOutput> {
    // 1. OIDC provider of the cluster
    let cluster = ctx.cloud().eks.describe_cluster(&input.cluster_name).await?;
    let issuer = cluster.oidc_issuer.ok_or_else(|| {
        ProvisionError::InvalidConfig(format!(
            "EKS cluster '{}' has no OIDC issuer",
            input.cluster_name
        ))
    })?;
    let provider = issuer.trim_start_matches("https://").to_string();

    // 2. Roles used by profile workloads
    let role_arns: BTreeSet<String> = ctx.addons().profile_role_arns().await?.into_iter().collect();
    ctx.trace_info(format!(
        "Found {} profile role(s) to check against provider {}",
        role_arns.len(),
        provider
    ));

    // 3. Append a web identity statement where it is missing
    let mut roles_updated = Vec::new();
    let mut roles_already_trusted = Vec::new();
    for role_arn in &role_arns {
        let (account_id, role_name) = parse_role_arn(role_arn)?;
        let role = ctx.cloud().iam.get_role(role_name).await?;
        let trust_policy = role.trust_policy.ok_or_else(|| {
            ProvisionError::InvalidConfig(format!("IAM role '{}' has no trust policy", role_name))
        })?;

        match with_oidc_trust(&trust_policy, account_id, &provider)? {
            None => {
                ctx.trace_info(format!(
                    "Skipping role '{}', it already trusts {}!",
                    role_name, provider
                ));
                roles_already_trusted.push(role_name.to_string());
            }
            Some(updated) => {
                ctx.cloud()
                    .iam
                    .update_assume_role_policy(role_name, &updated)
                    .await?;
                ctx.trace_info(format!("Role '{}' now trusts {}", role_name, provider));
                roles_updated.push(role_name.to_string());
            }
        }
    }

    Ok(TrustClusterOidcOutput {
        provider,
        roles_updated,
        roles_already_trusted,
    })
}

/// Split `arn:aws:iam::<account>:role/<path>/<name>` into account and name
fn parse_role_arn(arn: &str) -> Result<(&str, &str)> {
    let invalid = || ProvisionError::InvalidConfig(format!("'{}' is not an IAM role ARN", arn));
    let mut parts = arn.splitn(6, ':');
    let (Some("arn"), Some(_partition), Some("iam"), Some(_region), Some(account), Some(resource)) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(invalid());
    };
    let name = resource
        .strip_prefix("role/")
        .and_then(|path| path.rsplit('/').next())
        .filter(|name| !name.is_empty())
        .ok_or_else(invalid)?;
    Ok((account, name))
}

/// Returns the trust policy with a statement for `provider` appended, or
/// `None` when a statement already federates it
fn with_oidc_trust(trust_policy: &str, account_id: &str, provider: &str) -> Result<Option<String>> {
    let mut document: Value = serde_json::from_str(trust_policy)
        .map_err(|e| ProvisionError::InvalidConfig(format!("Unreadable trust policy: {}", e)))?;

    let statements = match document.get_mut("Statement") {
        Some(Value::Array(statements)) => std::mem::take(statements),
        Some(Value::Object(statement)) => vec![Value::Object(std::mem::take(statement))],
        Some(_) => {
            return Err(ProvisionError::InvalidConfig(
                "Trust policy Statement must be an object or an array".to_string(),
            ))
        }
        None => Vec::new(),
    };

    let suffix = format!("oidc-provider/{}", provider);
    let trusted = statements.iter().any(|statement| {
        match statement.pointer("/Principal/Federated") {
            Some(Value::String(principal)) => principal.ends_with(&suffix),
            Some(Value::Array(principals)) => principals
                .iter()
                .filter_map(Value::as_str)
                .any(|principal| principal.ends_with(&suffix)),
            _ => false,
        }
    });
    if trusted {
        return Ok(None);
    }

    let mut statements = statements;
    statements.push(json!({
        "Effect": "Allow",
        "Principal": {
            "Federated": format!("arn:aws:iam::{}:{}", account_id, suffix)
        },
        "Action": "sts:AssumeRoleWithWebIdentity",
        "Condition": {
            "StringEquals": {
                format!("{}:aud", provider): "sts.amazonaws.com"
            }
        }
    }));

    let Value::Object(fields) = &mut document else {
        return Err(ProvisionError::InvalidConfig(
            "Trust policy must be a JSON object".to_string(),
        ));
    };
    fields.insert("Statement".to_string(), Value::Array(statements));
    Ok(Some(document.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::fake::FakeCloud;
    use crate::testing::{FakeAddons, Harness};

    const PROVIDER: &str = "oidc.eks.us-west-2.amazonaws.com/id/ABCDEF";

    fn trusting(provider: &str) -> String {
        json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Principal": {
                    "Federated": format!("arn:aws:iam::123456789012:oidc-provider/{}", provider)
                },
                "Action": "sts:AssumeRoleWithWebIdentity"
            }]
        })
        .to_string()
    }

    fn input() -> TrustClusterOidcInput {
        TrustClusterOidcInput {
            cluster_name: "kf-blue".to_string(),
        }
    }

    #[tokio::test]
    async fn test_only_untrusted_roles_are_updated() {
        let cloud = FakeCloud::with_cluster("us-west-2", "kf-blue");
        cloud.add_role_with_trust("profile-trusted", &trusting(PROVIDER));
        cloud.add_role_with_trust(
            "profile-green",
            &trusting("oidc.eks.us-west-2.amazonaws.com/id/GREEN"),
        );
        let harness = Harness::with_addons(
            cloud.clone(),
            FakeAddons::with_profile_roles(&[
                "arn:aws:iam::123456789012:role/profile-trusted",
                "arn:aws:iam::123456789012:role/profile-green",
                "arn:aws:iam::123456789012:role/profile-green",
            ]),
        );

        let output = harness
            .context("test")
            .schedule_activity(NAME, input(), activity)
            .await
            .unwrap();

        assert_eq!(output.provider, PROVIDER);
        assert_eq!(output.roles_updated, vec!["profile-green".to_string()]);
        assert_eq!(output.roles_already_trusted, vec!["profile-trusted".to_string()]);
        assert_eq!(cloud.count("iam:update_assume_role_policy"), 1);

        let policy: Value =
            serde_json::from_str(&cloud.role("profile-green").unwrap().trust_policy.unwrap()).unwrap();
        let statements = policy["Statement"].as_array().unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[1]["Principal"]["Federated"],
            format!("arn:aws:iam::123456789012:oidc-provider/{}", PROVIDER)
        );
        assert_eq!(
            statements[1]["Condition"]["StringEquals"][format!("{}:aud", PROVIDER)],
            "sts.amazonaws.com"
        );
        assert_eq!(cloud.role("profile-trusted").unwrap().trust_policy, Some(trusting(PROVIDER)));
    }

    #[tokio::test]
    async fn test_second_run_changes_nothing() {
        let cloud = FakeCloud::with_cluster("us-west-2", "kf-blue");
        cloud.add_role("profile-user");
        let harness = Harness::with_addons(
            cloud.clone(),
            FakeAddons::with_profile_roles(&["arn:aws:iam::123456789012:role/profile-user"]),
        );

        let first = harness
            .context("test")
            .schedule_activity(NAME, input(), activity)
            .await
            .unwrap();
        assert_eq!(first.roles_updated.len(), 1);

        cloud.clear_calls();
        let second = harness
            .context("test")
            .schedule_activity(NAME, input(), activity)
            .await
            .unwrap();
        assert!(second.roles_updated.is_empty());
        assert_eq!(second.roles_already_trusted, vec!["profile-user".to_string()]);
        assert!(cloud.mutating_calls().is_empty());
    }

    #[tokio::test]
    async fn test_cluster_without_issuer() {
        let cloud = FakeCloud::with_cluster("us-west-2", "kf-blue");
        let mut cluster = cloud.clients().eks.describe_cluster("kf-blue").await.unwrap();
        cluster.oidc_issuer = None;
        cloud.set_cluster(cluster);
        let harness = Harness::new(cloud);

        let err = harness
            .context("test")
            .schedule_activity(NAME, input(), activity)
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::InvalidConfig(_)));
    }

    #[test]
    fn test_single_statement_object_is_extended() {
        let policy = r#"{"Version":"2012-10-17","Statement":{"Effect":"Allow","Principal":{"Service":"ec2.amazonaws.com"},"Action":"sts:AssumeRole"}}"#;

        let updated = with_oidc_trust(policy, "123456789012", PROVIDER).unwrap().unwrap();

        let document: Value = serde_json::from_str(&updated).unwrap();
        let statements = document["Statement"].as_array().unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0]["Principal"]["Service"], "ec2.amazonaws.com");
        assert_eq!(statements[1]["Action"], "sts:AssumeRoleWithWebIdentity");
    }

    #[test]
    fn test_federated_principal_list_counts_as_trusted() {
        let policy = json!({
            "Statement": [{
                "Principal": {
                    "Federated": [
                        "arn:aws:iam::123456789012:oidc-provider/oidc.eks.us-west-2.amazonaws.com/id/OTHER",
                        format!("arn:aws:iam::123456789012:oidc-provider/{}", PROVIDER)
                    ]
                }
            }]
        })
        .to_string();

        assert_eq!(with_oidc_trust(&policy, "123456789012", PROVIDER).unwrap(), None);
    }

    #[test]
    fn test_role_arn_with_path() {
        assert_eq!(
            parse_role_arn("arn:aws:iam::123456789012:role/kubeflow/profile-user").unwrap(),
            ("123456789012", "profile-user")
        );
        assert!(parse_role_arn("arn:aws:iam::123456789012:user/alice").is_err());
        assert!(parse_role_arn("profile-user").is_err());
    }
}

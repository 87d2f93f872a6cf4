//! Cluster-side prerequisites and secrets plumbing
//!
//! Pods reach Secrets Manager through an IRSA-bound service account and the
//! secrets-store CSI driver with its AWS provider. The service account is
//! created with `eksctl` (it also owns the IAM role and trust policy); the
//! driver manifests are fetched over HTTPS and server-side applied.

use crate::error::{CloudError, ProvisionError, Result};
use crate::k8s_client;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

const CSI_DRIVER_BASE: &str =
    "https://raw.githubusercontent.com/kubernetes-sigs/secrets-store-csi-driver/v1.0.0/deploy";

/// Secrets-store CSI driver v1.0.0 followed by the AWS provider, in apply order
pub fn secrets_store_manifests() -> Vec<String> {
    let mut urls: Vec<String> = [
        "rbac-secretproviderclass.yaml",
        "csidriver.yaml",
        "secrets-store.csi.x-k8s.io_secretproviderclasses.yaml",
        "secrets-store.csi.x-k8s.io_secretproviderclasspodstatuses.yaml",
        "secrets-store-csi-driver.yaml",
        "rbac-secretprovidersyncing.yaml",
    ]
    .iter()
    .map(|file| format!("{}/{}", CSI_DRIVER_BASE, file))
    .collect();
    urls.push(
        "https://raw.githubusercontent.com/aws/secrets-store-csi-driver-provider-aws/main/deployment/aws-provider-installer.yaml"
            .to_string(),
    );
    urls
}

/// IRSA service account to create in the cluster
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceAccountRequest {
    pub name: String,
    pub namespace: String,
    pub cluster_name: String,
    pub region: String,
    pub policy_arns: Vec<String>,
}

#[async_trait]
pub trait ClusterAddons: Send + Sync {
    /// Required tooling is installed and the cluster API is reachable
    async fn verify_prerequisites(&self) -> Result<()>;

    /// Create (or update) the service account and return the bound role ARN
    async fn ensure_service_account(&self, request: &ServiceAccountRequest) -> Result<String>;

    /// Fetch and apply one manifest; returns the number of objects applied
    async fn apply_manifest(&self, url: &str) -> Result<usize>;

    /// IAM roles annotated on service accounts in every Kubeflow profile namespace
    async fn profile_role_arns(&self) -> Result<Vec<String>>;
}

/// Addons backed by `eksctl`, the kube API and HTTPS manifest downloads
pub struct KubeAddons {
    http: reqwest::Client,
}

impl KubeAddons {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for KubeAddons {
    fn default() -> Self {
        Self::new()
    }
}

fn kube_fault(operation: &'static str, err: anyhow::Error) -> ProvisionError {
    CloudError::fault(operation, format!("{:#}", err)).into()
}

#[async_trait]
impl ClusterAddons for KubeAddons {
    async fn verify_prerequisites(&self) -> Result<()> {
        tracing::info!("Verifying eksctl is installed...");
        let output = Command::new("eksctl")
            .arg("version")
            .output()
            .await
            .map_err(|e| {
                ProvisionError::Prerequisite(format!(
                    "eksctl could not be executed ({}); install it from https://eksctl.io",
                    e
                ))
            })?;
        if !output.status.success() {
            return Err(ProvisionError::Prerequisite(format!(
                "`eksctl version` exited with {}",
                output.status
            )));
        }
        tracing::info!(
            version = %String::from_utf8_lossy(&output.stdout).trim(),
            "eksctl found"
        );

        let client = k8s_client::get_k8s_client()
            .await
            .map_err(|e| ProvisionError::Prerequisite(format!("{:#}", e)))?;
        let version = k8s_client::server_version(&client)
            .await
            .map_err(|e| ProvisionError::Prerequisite(format!("{:#}", e)))?;
        tracing::info!(%version, "Kubernetes API reachable");
        Ok(())
    }

    async fn ensure_service_account(&self, request: &ServiceAccountRequest) -> Result<String> {
        let mut command = Command::new("eksctl");
        command
            .args(["create", "iamserviceaccount"])
            .args(["--name", &request.name])
            .args(["--namespace", &request.namespace])
            .args(["--cluster", &request.cluster_name])
            .args(["--region", &request.region]);
        for arn in &request.policy_arns {
            command.args(["--attach-policy-arn", arn]);
        }
        command.args(["--override-existing-serviceaccounts", "--approve"]);

        let output = command.output().await.map_err(|e| {
            ProvisionError::Prerequisite(format!("eksctl could not be executed: {}", e))
        })?;
        if !output.status.success() {
            return Err(CloudError::fault(
                "eksctl:create-iamserviceaccount",
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            )
            .into());
        }

        let client = k8s_client::get_k8s_client()
            .await
            .map_err(|e| kube_fault("kube:connect", e))?;
        k8s_client::service_account_role_arn(&client, &request.namespace, &request.name)
            .await
            .map_err(|e| kube_fault("kube:get-serviceaccount", e))?
            .ok_or_else(|| {
                CloudError::fault(
                    "kube:get-serviceaccount",
                    format!(
                        "service account {}/{} has no {} annotation after eksctl completed",
                        request.namespace,
                        request.name,
                        k8s_client::IRSA_ROLE_ANNOTATION
                    ),
                )
                .into()
            })
    }

    async fn apply_manifest(&self, url: &str) -> Result<usize> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| CloudError::fault("https:get-manifest", format!("{}: {}", url, e)))?;
        let body = response
            .text()
            .await
            .map_err(|e| CloudError::fault("https:get-manifest", format!("{}: {}", url, e)))?;

        let client = k8s_client::get_k8s_client()
            .await
            .map_err(|e| kube_fault("kube:connect", e))?;
        k8s_client::apply_manifest(&client, &body)
            .await
            .map_err(|e| kube_fault("kube:apply", e.context(url.to_string())))
    }

    async fn profile_role_arns(&self) -> Result<Vec<String>> {
        let client = k8s_client::get_k8s_client()
            .await
            .map_err(|e| kube_fault("kube:connect", e))?;
        let namespaces = k8s_client::profile_namespaces(&client)
            .await
            .map_err(|e| kube_fault("kube:list-profiles", e))?;

        let mut arns = Vec::new();
        for namespace in &namespaces {
            let found = k8s_client::annotated_role_arns(&client, namespace)
                .await
                .map_err(|e| kube_fault("kube:list-serviceaccounts", e))?;
            tracing::debug!(namespace = %namespace, roles = found.len(), "profile service accounts");
            arns.extend(found);
        }
        Ok(arns)
    }
}

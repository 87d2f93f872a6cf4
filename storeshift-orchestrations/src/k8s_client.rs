//! Shared Kubernetes client utilities

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::ServiceAccount;
use kube::api::{Api, ApiResource, DynamicObject, ListParams, Patch, PatchParams};
use kube::core::GroupVersionKind;
use kube::discovery::{Discovery, Scope};
use kube::Client;
use serde::Deserialize;

/// Annotation eksctl puts on IRSA-bound service accounts
pub const IRSA_ROLE_ANNOTATION: &str = "eks.amazonaws.com/role-arn";

/// Field manager used for server-side apply
const FIELD_MANAGER: &str = "storeshift";

/// Get a Kubernetes client
pub async fn get_k8s_client() -> Result<Client> {
    Client::try_default()
        .await
        .context("Failed to create Kubernetes client")
}

/// Git version reported by the API server
pub async fn server_version(client: &Client) -> Result<String> {
    let info = client
        .apiserver_version()
        .await
        .context("Failed to reach the Kubernetes API server")?;
    Ok(info.git_version)
}

/// IAM role bound to a service account, or `None` if the account or its annotation is missing
pub async fn service_account_role_arn(
    client: &Client,
    namespace: &str,
    name: &str,
) -> Result<Option<String>> {
    let accounts: Api<ServiceAccount> = Api::namespaced(client.clone(), namespace);

    match accounts.get(name).await {
        Ok(account) => Ok(account
            .metadata
            .annotations
            .and_then(|annotations| annotations.get(IRSA_ROLE_ANNOTATION).cloned())),
        Err(kube::Error::Api(response)) if response.code == 404 => Ok(None),
        Err(e) => Err(anyhow::anyhow!("Failed to check ServiceAccount: {}", e)),
    }
}

/// Namespaces owned by Kubeflow profiles (a profile's namespace carries its name)
pub async fn profile_namespaces(client: &Client) -> Result<Vec<String>> {
    let gvk = GroupVersionKind::gvk("kubeflow.org", "v1", "Profile");
    let profiles: Api<DynamicObject> = Api::all_with(client.clone(), &ApiResource::from_gvk(&gvk));
    let list = profiles
        .list(&ListParams::default())
        .await
        .context("Failed to list Kubeflow profiles")?;
    Ok(list.items.into_iter().filter_map(|p| p.metadata.name).collect())
}

/// IRSA role ARNs annotated on the service accounts of `namespace`
pub async fn annotated_role_arns(client: &Client, namespace: &str) -> Result<Vec<String>> {
    let accounts: Api<ServiceAccount> = Api::namespaced(client.clone(), namespace);
    let list = accounts
        .list(&ListParams::default())
        .await
        .with_context(|| format!("Failed to list ServiceAccounts in {}", namespace))?;
    Ok(role_arns(&list.items))
}

pub fn role_arns(accounts: &[ServiceAccount]) -> Vec<String> {
    accounts
        .iter()
        .filter_map(|account| account.metadata.annotations.as_ref())
        .filter_map(|annotations| annotations.get(IRSA_ROLE_ANNOTATION).cloned())
        .collect()
}

/// Split a multi-document manifest into objects, skipping empty documents
pub fn parse_manifest(yaml: &str) -> Result<Vec<DynamicObject>> {
    let mut objects = Vec::new();
    for document in serde_yaml::Deserializer::from_str(yaml) {
        let value = serde_yaml::Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }
        objects.push(serde_yaml::from_value(value)?);
    }
    Ok(objects)
}

/// Server-side apply every object in `yaml`; returns the number applied
pub async fn apply_manifest(client: &Client, yaml: &str) -> Result<usize> {
    let objects = parse_manifest(yaml)?;

    // Discovery runs per manifest so CRDs applied by an earlier one resolve
    let discovery = Discovery::new(client.clone())
        .run()
        .await
        .context("Failed to run API discovery")?;
    let params = PatchParams::apply(FIELD_MANAGER).force();

    for object in &objects {
        let name = object
            .metadata
            .name
            .as_deref()
            .context("Manifest object has no metadata.name")?;
        let types = object
            .types
            .as_ref()
            .with_context(|| format!("Object '{}' has no apiVersion/kind", name))?;
        let gvk = GroupVersionKind::try_from(types)
            .with_context(|| format!("Invalid apiVersion on '{}'", name))?;
        let (resource, capabilities) = discovery
            .resolve_gvk(&gvk)
            .with_context(|| format!("Cluster does not serve {:?}", gvk))?;

        let api: Api<DynamicObject> = match capabilities.scope {
            Scope::Namespaced => {
                let namespace = object.metadata.namespace.as_deref().unwrap_or("default");
                Api::namespaced_with(client.clone(), namespace, &resource)
            }
            Scope::Cluster => Api::all_with(client.clone(), &resource),
        };

        api.patch(name, &params, &Patch::Apply(object))
            .await
            .with_context(|| format!("Failed to apply {} '{}'", gvk.kind, name))?;
        tracing::debug!(kind = %gvk.kind, name, "applied");
    }

    Ok(objects.len())
}

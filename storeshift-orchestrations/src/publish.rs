//! Republishing connection parameters to deployment configuration
//!
//! Three kinds of artifact are edited in place under the deployment root:
//! kustomize `params.env` files, helm `values.yaml` files located through
//! the e2e installation configs, and the secret provider classes that map
//! Secrets Manager entries into pods.

use crate::error::{ProvisionError, Result};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use storeshift_models::{ConnectionParameters, MigrationSummary};

const PIPELINES_CHART: &str = "kubeflow-pipelines";
const SECRETS_MANAGER_CHART: &str = "aws-secrets-manager";

/// Sink for connection parameters and the run summary
pub trait ConfigPublisher: Send + Sync {
    /// Rewrite every downstream artifact; returns the files touched
    fn publish(&self, params: &ConnectionParameters) -> Result<Vec<PathBuf>>;

    fn write_summary(&self, summary: &MigrationSummary) -> Result<PathBuf>;
}

/// Locations of the artifacts relative to the deployment root
#[derive(Debug, Clone)]
pub struct PublishLayout {
    pub root: PathBuf,
}

impl PublishLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory the installation configs' relative chart paths resolve against
    pub fn e2e_dir(&self) -> PathBuf {
        self.root.join("tests/e2e")
    }

    pub fn installation_config(&self, deployment: &str) -> PathBuf {
        self.e2e_dir()
            .join("resources/installation_config")
            .join(format!("{}.yaml", deployment))
    }

    pub fn params_env(&self, module: &str) -> PathBuf {
        self.root
            .join("awsconfigs/apps/pipeline")
            .join(module)
            .join("params.env")
    }

    pub fn secret_provider_class(&self, module: &str) -> PathBuf {
        self.root
            .join("awsconfigs/common/aws-secrets-manager")
            .join(module)
            .join("secret-provider.yaml")
    }

    /// `values.yaml` of `chart` for the given deployment option
    pub fn helm_values(&self, deployment: &str, chart: &str) -> Result<PathBuf> {
        let config_path = self.installation_config(deployment);
        let config = read_yaml(&config_path)?;
        let helm_path = config
            .get(chart)
            .and_then(|c| c.get("installation_options"))
            .and_then(|o| o.get("helm"))
            .and_then(|h| h.get("paths"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ProvisionError::publish(
                    &config_path,
                    format!("no {}.installation_options.helm.paths entry", chart),
                )
            })?;
        Ok(self.e2e_dir().join(helm_path).join("values.yaml"))
    }
}

/// Publisher that edits files under a deployment checkout
pub struct FilePublisher {
    layout: PublishLayout,
    summary_path: PathBuf,
}

impl FilePublisher {
    pub fn new(layout: PublishLayout, summary_path: impl Into<PathBuf>) -> Self {
        Self {
            layout,
            summary_path: summary_path.into(),
        }
    }

    fn publish_module(
        &self,
        module: &str,
        params: &BTreeMap<String, String>,
        secret_name: &str,
        deployments: &[&str],
        touched: &mut Vec<PathBuf>,
    ) -> Result<()> {
        let secret_params = BTreeMap::from([("secretName".to_string(), secret_name.to_string())]);

        let env_file = self.layout.params_env(module);
        update_env_file(&env_file, params)?;
        touched.push(env_file);

        for deployment in deployments {
            let values = self.layout.helm_values(deployment, PIPELINES_CHART)?;
            merge_values_file(&values, module, params)?;
            touched.push(values);

            let values = self.layout.helm_values(deployment, SECRETS_MANAGER_CHART)?;
            merge_values_file(&values, module, &secret_params)?;
            touched.push(values);
        }

        let provider_class = self.layout.secret_provider_class(module);
        update_secret_provider_class(&provider_class, secret_name)?;
        touched.push(provider_class);
        Ok(())
    }
}

impl ConfigPublisher for FilePublisher {
    fn publish(&self, params: &ConnectionParameters) -> Result<Vec<PathBuf>> {
        let mut touched = Vec::new();
        self.publish_module(
            "rds",
            &params.rds_params(),
            &params.rds_secret_name,
            &["rds-s3", "rds-only"],
            &mut touched,
        )?;
        self.publish_module(
            "s3",
            &params.s3_params(),
            &params.s3_secret_name,
            &["rds-s3", "s3-only"],
            &mut touched,
        )?;
        Ok(touched)
    }

    fn write_summary(&self, summary: &MigrationSummary) -> Result<PathBuf> {
        let yaml = serde_yaml::to_string(summary)
            .map_err(|e| ProvisionError::publish(&self.summary_path, e))?;
        if let Some(parent) = self.summary_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ProvisionError::publish(parent, e))?;
        }
        fs::write(&self.summary_path, yaml)
            .map_err(|e| ProvisionError::publish(&self.summary_path, e))?;
        Ok(self.summary_path.clone())
    }
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| ProvisionError::publish(path, e))
}

fn read_yaml(path: &Path) -> Result<Value> {
    let text = read_text(path)?;
    serde_yaml::from_str(&text).map_err(|e| ProvisionError::publish(path, e))
}

fn write_yaml(path: &Path, value: &Value) -> Result<()> {
    let text = serde_yaml::to_string(value).map_err(|e| ProvisionError::publish(path, e))?;
    fs::write(path, text).map_err(|e| ProvisionError::publish(path, e))
}

/// Replace `key=value` lines for known keys, append the rest, keep everything else
pub fn update_env_file(path: &Path, params: &BTreeMap<String, String>) -> Result<()> {
    let text = read_text(path)?;
    let mut pending: BTreeMap<&str, &str> = params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let mut lines: Vec<String> = text
        .lines()
        .map(|line| {
            let key = line.split_once('=').map(|(k, _)| k.trim());
            match key.and_then(|k| pending.remove_entry(k)) {
                Some((key, value)) => format!("{}={}", key, value),
                None => line.to_string(),
            }
        })
        .collect();
    lines.extend(pending.iter().map(|(k, v)| format!("{}={}", k, v)));

    let mut output = lines.join("\n");
    output.push('\n');
    fs::write(path, output).map_err(|e| ProvisionError::publish(path, e))
}

/// Merge `params` into the top-level `module` map of a helm values file
pub fn merge_values_file(path: &Path, module: &str, params: &BTreeMap<String, String>) -> Result<()> {
    let mut values = read_yaml(path)?;
    if values.is_null() {
        values = Value::Mapping(Mapping::new());
    }
    let root = values
        .as_mapping_mut()
        .ok_or_else(|| ProvisionError::publish(path, "top level is not a mapping"))?;

    let section = root
        .entry(Value::from(module))
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    if !section.is_mapping() {
        *section = Value::Mapping(Mapping::new());
    }
    if let Some(section) = section.as_mapping_mut() {
        for (key, value) in params {
            section.insert(Value::from(key.as_str()), Value::from(value.as_str()));
        }
    }

    write_yaml(path, &values)
}

/// Point the first object of a secret provider class at `secret_name`.
///
/// `spec.parameters.objects` is itself a YAML document embedded as a string.
pub fn update_secret_provider_class(path: &Path, secret_name: &str) -> Result<()> {
    let mut provider = read_yaml(path)?;
    let objects_field = provider
        .get_mut("spec")
        .and_then(|spec| spec.get_mut("parameters"))
        .and_then(|parameters| parameters.get_mut("objects"))
        .ok_or_else(|| ProvisionError::publish(path, "missing spec.parameters.objects"))?;

    let embedded = objects_field
        .as_str()
        .ok_or_else(|| ProvisionError::publish(path, "spec.parameters.objects is not a string"))?;
    let mut objects: Value =
        serde_yaml::from_str(embedded).map_err(|e| ProvisionError::publish(path, e))?;
    let first = objects
        .get_mut(0)
        .and_then(Value::as_mapping_mut)
        .ok_or_else(|| ProvisionError::publish(path, "spec.parameters.objects is empty"))?;
    first.insert(Value::from("objectName"), Value::from(secret_name));

    let rendered = serde_yaml::to_string(&objects).map_err(|e| ProvisionError::publish(path, e))?;
    *objects_field = Value::from(rendered);

    write_yaml(path, &provider)
}

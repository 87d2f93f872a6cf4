use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use storeshift_orchestrations::addons::KubeAddons;
use storeshift_orchestrations::cloud::CloudClients;
use storeshift_orchestrations::context::Services;
use storeshift_orchestrations::publish::{FilePublisher, PublishLayout};
use storeshift_orchestrations::WaitSettings;

/// Summary file location relative to the deployment root
const DEFAULT_METADATA_PATH: &str = "tests/e2e/utils/rds-s3/metadata.yaml";

#[derive(Debug, Clone)]
pub struct StoreshiftConfig {
    /// Checkout of the Kubeflow manifests the parameters are published into
    pub deployment_root: PathBuf,
    pub metadata_path: PathBuf,
    pub waits: WaitSettings,
}

impl StoreshiftConfig {
    /// Read settings from the process environment; `.env` is loaded
    /// before arguments are parsed
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let deployment_root = PathBuf::from(
            lookup("STORESHIFT_DEPLOYMENT_ROOT").unwrap_or_else(|| ".".to_string()),
        );
        let metadata_path = lookup("STORESHIFT_METADATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| deployment_root.join(DEFAULT_METADATA_PATH));

        let mut waits = WaitSettings::default();
        if let Some(secs) = lookup("STORESHIFT_DB_TIMEOUT_SECS") {
            let secs = secs
                .parse::<u64>()
                .context("STORESHIFT_DB_TIMEOUT_SECS must be a number of seconds")?;
            waits.db_instance = waits.db_instance.with_timeout(secs);
            waits.snapshot = waits.snapshot.with_timeout(secs);
        }
        if let Some(secs) = lookup("STORESHIFT_CLONE_TIMEOUT_SECS") {
            let secs = secs
                .parse::<u64>()
                .context("STORESHIFT_CLONE_TIMEOUT_SECS must be a number of seconds")?;
            waits.replication = waits.replication.with_timeout(secs);
        }

        Ok(Self {
            deployment_root,
            metadata_path,
            waits,
        })
    }

    /// Connect the AWS clients for `region` and wire up the cluster and
    /// file collaborators
    pub async fn services(&self, region: &str) -> Services {
        tracing::debug!(region, root = %self.deployment_root.display(), "Connecting services");
        Services::new(
            CloudClients::connect(region).await,
            Arc::new(KubeAddons::new()),
            Arc::new(FilePublisher::new(
                PublishLayout::new(self.deployment_root.clone()),
                self.metadata_path.clone(),
            )),
        )
    }
}

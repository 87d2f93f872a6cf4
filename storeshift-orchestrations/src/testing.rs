//! Test doubles for the cluster and publishing seams

use crate::addons::{ClusterAddons, ServiceAccountRequest};
use crate::cloud::fake::FakeCloud;
use crate::context::{OrchestrationContext, Services};
use crate::error::{ProvisionError, Result};
use crate::publish::ConfigPublisher;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use storeshift_models::{ConnectionParameters, MigrationSummary};

#[derive(Default)]
pub struct FakeAddons {
    pub missing_prerequisite: Mutex<Option<String>>,
    pub service_accounts: Mutex<Vec<ServiceAccountRequest>>,
    pub applied: Mutex<Vec<String>>,
    pub profile_roles: Mutex<Vec<String>>,
}

impl FakeAddons {
    pub fn missing(reason: &str) -> Self {
        Self {
            missing_prerequisite: Mutex::new(Some(reason.to_string())),
            ..Self::default()
        }
    }

    pub fn with_profile_roles(role_arns: &[&str]) -> Self {
        Self {
            profile_roles: Mutex::new(role_arns.iter().map(|arn| arn.to_string()).collect()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl ClusterAddons for FakeAddons {
    async fn verify_prerequisites(&self) -> Result<()> {
        match self.missing_prerequisite.lock().unwrap().clone() {
            Some(reason) => Err(ProvisionError::Prerequisite(reason)),
            None => Ok(()),
        }
    }

    async fn ensure_service_account(&self, request: &ServiceAccountRequest) -> Result<String> {
        self.service_accounts.lock().unwrap().push(request.clone());
        Ok(format!("arn:aws:iam::123456789012:role/eksctl-{}", request.name))
    }

    async fn apply_manifest(&self, url: &str) -> Result<usize> {
        self.applied.lock().unwrap().push(url.to_string());
        Ok(3)
    }

    async fn profile_role_arns(&self) -> Result<Vec<String>> {
        Ok(self.profile_roles.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    pub published: Mutex<Vec<ConnectionParameters>>,
    pub summaries: Mutex<Vec<MigrationSummary>>,
}

impl ConfigPublisher for RecordingPublisher {
    fn publish(&self, params: &ConnectionParameters) -> Result<Vec<PathBuf>> {
        self.published.lock().unwrap().push(params.clone());
        Ok(vec![PathBuf::from("awsconfigs/apps/pipeline/rds/params.env")])
    }

    fn write_summary(&self, summary: &MigrationSummary) -> Result<PathBuf> {
        self.summaries.lock().unwrap().push(summary.clone());
        Ok(PathBuf::from("metadata.yaml"))
    }
}

/// Everything a test needs to drive and inspect a run
pub struct Harness {
    pub cloud: FakeCloud,
    pub addons: Arc<FakeAddons>,
    pub publisher: Arc<RecordingPublisher>,
}

impl Harness {
    pub fn new(cloud: FakeCloud) -> Self {
        Self::with_addons(cloud, FakeAddons::default())
    }

    pub fn with_addons(cloud: FakeCloud, addons: FakeAddons) -> Self {
        Self {
            cloud,
            addons: Arc::new(addons),
            publisher: Arc::new(RecordingPublisher::default()),
        }
    }

    pub fn services(&self) -> Services {
        Services::new(self.cloud.clients(), self.addons.clone(), self.publisher.clone())
    }

    pub fn context(&self, name: &'static str) -> OrchestrationContext {
        OrchestrationContext::new(name, self.services())
    }
}

//! Read-only existence checks gating every mutating step

use crate::cloud::{CloudClients, CloudResult};
use crate::error::{ProvisionError, Result};
use storeshift_models::{ResourceKind, ResourceSpec};

/// Answers "does resource X already exist" without mutating anything
pub struct Prober<'a> {
    clients: &'a CloudClients,
}

/// "Not found" means absent; every other fault propagates
fn found<T>(result: CloudResult<T>) -> Result<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(err) if err.is_not_found() => Ok(false),
        Err(err) => Err(err.into()),
    }
}

impl<'a> Prober<'a> {
    pub fn new(clients: &'a CloudClients) -> Self {
        Self { clients }
    }

    pub async fn exists(&self, spec: &ResourceSpec) -> Result<bool> {
        if spec.region != self.clients.region {
            return Err(ProvisionError::InvalidConfig(format!(
                "{} is in region {} but the cloud clients are bound to {}",
                spec, spec.region, self.clients.region
            )));
        }

        match spec.kind {
            ResourceKind::ObjectStore => self.bucket_exists(&spec.name).await,
            ResourceKind::RelationalInstance => self.db_instance_exists(&spec.name).await,
            ResourceKind::IamRole => Ok(self.role_arn(&spec.name).await?.is_some()),
            ResourceKind::SubnetGroup => self.subnet_group_exists(&spec.name).await,
            ResourceKind::SecretEntry => self.secret_exists(&spec.name).await,
            ResourceKind::ReplicationTask => self.replication_task_exists(&spec.name).await,
            ResourceKind::Snapshot => self.snapshot_exists(&spec.name).await,
        }
    }

    /// Buckets are global per account, so this lists rather than describes
    pub async fn bucket_exists(&self, name: &str) -> Result<bool> {
        let buckets = self.clients.s3.list_buckets().await?;
        Ok(buckets.iter().any(|bucket| bucket == name))
    }

    pub async fn db_instance_exists(&self, identifier: &str) -> Result<bool> {
        found(self.clients.rds.describe_db_instance(identifier).await)
    }

    pub async fn subnet_group_exists(&self, name: &str) -> Result<bool> {
        found(self.clients.rds.describe_db_subnet_group(name).await)
    }

    pub async fn secret_exists(&self, name: &str) -> Result<bool> {
        found(self.clients.secrets.describe_secret(name).await)
    }

    pub async fn snapshot_exists(&self, snapshot_id: &str) -> Result<bool> {
        found(self.clients.rds.describe_db_snapshot(snapshot_id, None).await)
    }

    pub async fn replication_task_exists(&self, name: &str) -> Result<bool> {
        let tasks = self.clients.datasync.list_tasks().await?;
        Ok(tasks.iter().any(|task| task.name.as_deref() == Some(name)))
    }

    /// ARN of the role, or `None` when IAM reports no such entity
    pub async fn role_arn(&self, name: &str) -> Result<Option<String>> {
        match self.clients.iam.get_role(name).await {
            Ok(role) => Ok(Some(role.arn)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::fake::FakeCloud;
    use crate::error::CloudError;

    const REGION: &str = "us-west-2";

    fn seeded() -> FakeCloud {
        let cloud = FakeCloud::new(REGION);
        cloud.add_bucket("kf-artifacts");
        cloud.add_instance("kubeflow-db", "available");
        cloud.add_subnet_group("kubeflow-db-subnet-group");
        cloud.add_secret("rds-secret", "{}");
        cloud.add_snapshot("kf-rds-snap-1700000000", "kubeflow-db", "available");
        cloud.add_role("datasyncrolekubeflow");
        cloud.add_task("kubeflow-sync-1700000000");
        cloud
    }

    #[tokio::test]
    async fn test_existing_resources_are_found_without_mutation() {
        let cloud = seeded();
        let clients = cloud.clients();
        let prober = Prober::new(&clients);

        let specs = [
            ResourceSpec::bucket("kf-artifacts", REGION),
            ResourceSpec::db_instance("kubeflow-db", REGION),
            ResourceSpec::subnet_group("kubeflow-db-subnet-group", REGION),
            ResourceSpec::secret("rds-secret", REGION),
            ResourceSpec::snapshot("kf-rds-snap-1700000000", REGION),
            ResourceSpec::role("datasyncrolekubeflow", REGION),
            ResourceSpec::replication_task("kubeflow-sync-1700000000", REGION),
        ];
        for spec in &specs {
            assert!(prober.exists(spec).await.unwrap(), "{spec} should exist");
        }

        assert_eq!(cloud.calls().len(), specs.len());
        assert!(cloud.mutating_calls().is_empty());
    }

    #[tokio::test]
    async fn test_absent_resources_are_not_found() {
        let cloud = FakeCloud::new(REGION);
        let clients = cloud.clients();
        let prober = Prober::new(&clients);

        assert!(!prober.bucket_exists("kf-artifacts").await.unwrap());
        assert!(!prober.db_instance_exists("kubeflow-db").await.unwrap());
        assert!(!prober.subnet_group_exists("kubeflow-db-subnet-group").await.unwrap());
        assert!(!prober.secret_exists("s3-secret").await.unwrap());
        assert!(!prober.snapshot_exists("kf-rds-snap-1").await.unwrap());
        assert!(!prober.replication_task_exists("kubeflow-sync-1").await.unwrap());
        assert_eq!(prober.role_arn("datasyncrolekubeflow").await.unwrap(), None);
        assert!(cloud.mutating_calls().is_empty());
    }

    #[tokio::test]
    async fn test_role_arn_is_returned_for_existing_role() {
        let cloud = seeded();
        let clients = cloud.clients();
        let arn = Prober::new(&clients).role_arn("datasyncrolekubeflow").await.unwrap();
        assert_eq!(
            arn.as_deref(),
            Some("arn:aws:iam::123456789012:role/datasyncrolekubeflow")
        );
    }

    #[tokio::test]
    async fn test_other_faults_propagate() {
        let cloud = FakeCloud::new(REGION);
        cloud.fail(
            "secrets:describe_secret",
            CloudError::fault("secretsmanager:DescribeSecret", "AccessDeniedException"),
        );
        let clients = cloud.clients();

        let err = Prober::new(&clients).secret_exists("s3-secret").await.unwrap_err();
        assert!(matches!(err, ProvisionError::Remote(CloudError::Fault { .. })));
    }

    #[tokio::test]
    async fn test_region_mismatch_is_rejected() {
        let cloud = seeded();
        let clients = cloud.clients();

        let err = Prober::new(&clients)
            .exists(&ResourceSpec::bucket("kf-artifacts", "eu-west-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::InvalidConfig(_)));
        assert!(cloud.calls().is_empty());
    }
}

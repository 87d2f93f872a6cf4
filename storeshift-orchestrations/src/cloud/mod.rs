//! Cloud control-plane seam
//!
//! Every remote call storeshift makes goes through one of the traits below.
//! Describe-style calls report a missing resource as [`CloudError::NotFound`];
//! the existence prober turns that into `false` and propagates everything else.
//!
//! [`aws`] implements the traits over the AWS SDK for Rust.

pub mod aws;
#[cfg(test)]
pub(crate) mod fake;

use crate::error::CloudError;
use async_trait::async_trait;
use std::sync::Arc;
use storeshift_models::DbEndpoint;

pub type CloudResult<T> = std::result::Result<T, CloudError>;

// ============================================================================
// Request / response shapes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBucketRequest {
    pub bucket: String,
    /// Omitted for the provider's default region
    pub location_constraint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbInstanceInfo {
    pub identifier: String,
    pub status: String,
    pub endpoint: Option<DbEndpoint>,
    pub master_username: Option<String>,
    pub db_name: Option<String>,
    pub vpc_id: Option<String>,
}

/// Settings shared by fresh and restored instances
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbPlacement {
    pub instance_class: String,
    pub storage_type: String,
    pub subnet_group_name: String,
    pub security_group_id: String,
    pub multi_az: bool,
    pub publicly_accessible: bool,
    pub deletion_protection: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDbInstanceRequest {
    pub identifier: String,
    pub db_name: String,
    pub engine: String,
    pub master_username: String,
    pub master_password: String,
    pub allocated_storage_gb: i32,
    pub max_allocated_storage_gb: i32,
    pub backup_retention_days: i32,
    pub placement: DbPlacement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreDbInstanceRequest {
    pub identifier: String,
    pub snapshot_id: String,
    pub engine: String,
    pub placement: DbPlacement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSubnetGroupInfo {
    pub name: String,
    pub vpc_id: Option<String>,
    pub subnet_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSnapshotInfo {
    pub snapshot_id: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleInfo {
    pub name: String,
    pub arn: String,
    /// Trust policy JSON, already URL-decoded
    pub trust_policy: Option<String>,
}

/// Character classes requested from the random password generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub length: i64,
    pub exclude_numbers: bool,
    pub exclude_punctuation: bool,
    pub exclude_uppercase: bool,
    pub exclude_lowercase: bool,
    pub include_space: bool,
}

impl PasswordPolicy {
    /// 32 alphanumeric characters; punctuation breaks the MySQL connection URLs
    pub const DB_ROOT: PasswordPolicy = PasswordPolicy {
        length: 32,
        exclude_numbers: false,
        exclude_punctuation: true,
        exclude_uppercase: false,
        exclude_lowercase: false,
        include_space: false,
    };
}

/// DataSync task options, expressed with the service's enum spellings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOptions {
    pub verify_mode: String,
    pub overwrite_mode: String,
    pub atime: String,
    pub mtime: String,
    pub preserve_deleted_files: String,
    pub transfer_mode: String,
}

impl TransferOptions {
    /// Full clone: verify a point-in-time view, always overwrite, remove
    /// files deleted at the source and only move changed data.
    pub fn full_clone() -> Self {
        Self {
            verify_mode: "POINT_IN_TIME_CONSISTENT".to_string(),
            overwrite_mode: "ALWAYS".to_string(),
            atime: "BEST_EFFORT".to_string(),
            mtime: "PRESERVE".to_string(),
            preserve_deleted_files: "REMOVE".to_string(),
            transfer_mode: "CHANGED".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub name: String,
    pub source_location_arn: String,
    pub destination_location_arn: String,
    pub options: TransferOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSummary {
    pub arn: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskExecutionInfo {
    pub execution_arn: String,
    pub status: String,
    pub estimated_files_to_transfer: Option<i64>,
    pub estimated_bytes_to_transfer: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClusterInfo {
    pub name: String,
    pub subnet_ids: Vec<String>,
    pub security_group_id: Option<String>,
    pub endpoint: Option<String>,
    pub version: Option<String>,
    pub oidc_issuer: Option<String>,
    pub certificate_authority: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetTag {
    pub key: String,
    pub value: String,
}

impl SubnetTag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetInfo {
    pub subnet_id: String,
    pub tags: Vec<SubnetTag>,
}

// ============================================================================
// Service traits
// ============================================================================

/// Object storage (S3)
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn list_buckets(&self) -> CloudResult<Vec<String>>;
    async fn create_bucket(&self, request: &CreateBucketRequest) -> CloudResult<()>;
}

/// Relational database service (RDS)
#[async_trait]
pub trait RelationalDb: Send + Sync {
    async fn describe_db_instance(&self, identifier: &str) -> CloudResult<DbInstanceInfo>;
    async fn create_db_instance(&self, request: &CreateDbInstanceRequest) -> CloudResult<()>;
    async fn restore_db_instance_from_snapshot(
        &self,
        request: &RestoreDbInstanceRequest,
    ) -> CloudResult<()>;
    async fn describe_db_subnet_group(&self, name: &str) -> CloudResult<DbSubnetGroupInfo>;
    async fn create_db_subnet_group(
        &self,
        name: &str,
        description: &str,
        subnet_ids: &[String],
    ) -> CloudResult<()>;
    async fn create_db_snapshot(&self, snapshot_id: &str, instance_id: &str) -> CloudResult<()>;
    async fn describe_db_snapshot(
        &self,
        snapshot_id: &str,
        instance_id: Option<&str>,
    ) -> CloudResult<DbSnapshotInfo>;
}

/// Identity and access management (IAM)
#[async_trait]
pub trait Identity: Send + Sync {
    /// Fails with `NotFound` for the service's "no such entity" condition
    async fn get_role(&self, name: &str) -> CloudResult<RoleInfo>;
    async fn create_role(&self, name: &str, trust_policy: &str) -> CloudResult<RoleInfo>;
    async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> CloudResult<()>;
    /// Replace the role's trust policy
    async fn update_assume_role_policy(&self, role_name: &str, policy_document: &str) -> CloudResult<()>;
}

/// Secrets store (Secrets Manager)
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn describe_secret(&self, name: &str) -> CloudResult<String>;
    async fn create_secret(
        &self,
        name: &str,
        description: &str,
        secret_string: &str,
    ) -> CloudResult<String>;
    async fn get_secret_value(&self, name: &str) -> CloudResult<String>;
    async fn random_password(&self, policy: &PasswordPolicy) -> CloudResult<String>;
}

/// Managed bulk replication (DataSync)
#[async_trait]
pub trait DataReplication: Send + Sync {
    async fn create_s3_location(&self, bucket_arn: &str, role_arn: &str) -> CloudResult<String>;
    async fn create_task(&self, request: &CreateTaskRequest) -> CloudResult<String>;
    async fn list_tasks(&self) -> CloudResult<Vec<TaskSummary>>;
    async fn start_task_execution(&self, task_arn: &str) -> CloudResult<String>;
    async fn describe_task_execution(&self, execution_arn: &str) -> CloudResult<TaskExecutionInfo>;
}

/// Cluster control plane (EKS)
#[async_trait]
pub trait ClusterControl: Send + Sync {
    async fn describe_cluster(&self, name: &str) -> CloudResult<ClusterInfo>;
}

/// Virtual networking (EC2)
#[async_trait]
pub trait Network: Send + Sync {
    async fn describe_subnets(&self, subnet_ids: &[String]) -> CloudResult<Vec<SubnetInfo>>;
    async fn describe_vpc_cidr(&self, vpc_id: &str) -> CloudResult<String>;
}

/// Shared file systems (EFS)
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn find_file_system(&self, name: &str) -> CloudResult<Option<String>>;
}

/// Regional bundle of service clients threaded through every call
#[derive(Clone)]
pub struct CloudClients {
    pub region: String,
    pub s3: Arc<dyn ObjectStorage>,
    pub rds: Arc<dyn RelationalDb>,
    pub iam: Arc<dyn Identity>,
    pub secrets: Arc<dyn SecretStore>,
    pub datasync: Arc<dyn DataReplication>,
    pub eks: Arc<dyn ClusterControl>,
    pub ec2: Arc<dyn Network>,
    pub efs: Arc<dyn FileStorage>,
}

impl std::fmt::Debug for CloudClients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudClients")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

//! Input and output types for storeshift activities

use serde::{Deserialize, Serialize};
use storeshift_models::{DbCredentials, DbEndpoint, ResourceSpec, WaitPolicy};

// ============================================================================
// Verify Prerequisites Activity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerifyPrerequisitesInput {
    /// EKS cluster the backends are provisioned for
    pub cluster_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerifyPrerequisitesOutput {
    pub cluster_name: String,
    /// Cluster security group, attached to the DB instance
    pub security_group_id: String,
    /// Subnets of the cluster's VPC config
    pub subnet_ids: Vec<String>,
}

// ============================================================================
// Probe Resource Activity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeResourceInput {
    pub resource: ResourceSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeResourceOutput {
    pub resource: ResourceSpec,
    pub exists: bool,
}

// ============================================================================
// Check Secret Conflict Activity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckSecretConflictInput {
    /// Resource whose connection details the secret stores
    pub resource: ResourceSpec,
    /// Secret that would be created alongside the resource
    pub secret_name: String,
    /// Whether an existing resource without its secret is a conflict
    /// (true when the credentials cannot be recovered after creation)
    pub require_secret_for_existing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckSecretConflictOutput {
    pub resource_exists: bool,
    pub secret_exists: bool,
}

// ============================================================================
// Create Bucket Activity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateBucketInput {
    pub bucket: String,
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateBucketOutput {
    pub bucket: String,
    /// Whether the bucket was created (false if it already existed)
    pub created: bool,
}

// ============================================================================
// Ensure Replication Role Activity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnsureReplicationRoleInput {
    pub role_name: String,
    pub source_bucket: String,
    pub target_bucket: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnsureReplicationRoleOutput {
    pub role_arn: String,
    /// Whether the role was created; a new role needs time to propagate
    pub created: bool,
}

// ============================================================================
// Clone Bucket Activity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CloneBucketInput {
    pub source_bucket: String,
    pub target_bucket: String,
    /// Role DataSync assumes to read the source and write the target
    pub role_arn: String,
    pub wait: WaitPolicy,
}

// Output is storeshift_models::ReplicationTask

// ============================================================================
// Create S3 Secret Activity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateS3SecretInput {
    pub secret_name: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateSecretOutput {
    pub secret_name: String,
    /// Whether the secret was created (false if it already existed)
    pub created: bool,
}

// ============================================================================
// Snapshot DB Activity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotDbInput {
    pub source_instance: String,
    pub wait: WaitPolicy,
}

// Output is storeshift_models::SnapshotJob

// ============================================================================
// Create Subnet Group Activity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateSubnetGroupInput {
    pub name: String,
    /// Cluster whose private subnets make up the group
    pub cluster_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateSubnetGroupOutput {
    pub name: String,
    /// Subnets placed in the group (empty if it already existed)
    pub subnet_ids: Vec<String>,
    pub created: bool,
}

// ============================================================================
// Create DB Instance Activity
// ============================================================================

/// Where a new instance's data comes from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DbSource {
    /// Empty database; password from the operator or generated
    Fresh { root_password: Option<String> },
    /// Restored snapshot; password optionally read from the prior environment's secret
    Restore {
        snapshot_id: String,
        prior_secret_name: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateDbInstanceInput {
    pub identifier: String,
    pub db_name: String,
    pub root_user: String,
    pub instance_class: String,
    pub storage_type: String,
    pub initial_storage_gb: i32,
    pub max_storage_gb: i32,
    pub backup_retention_days: i32,
    pub subnet_group_name: String,
    pub security_group_id: String,
    pub source: DbSource,
    pub wait: WaitPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateDbInstanceOutput {
    pub identifier: String,
    /// Root credentials, known only when the instance was created by this call
    /// and the password could be determined
    pub credentials: Option<DbCredentials>,
    pub endpoint: Option<DbEndpoint>,
    pub created: bool,
}

// ============================================================================
// Create RDS Secret Activity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateRdsSecretInput {
    pub secret_name: String,
    /// Instance whose endpoint and database name go into the secret
    pub instance_id: String,
    /// Master user the instance was created or restored with
    pub username: String,
    pub password: String,
}

// Output is CreateSecretOutput

// ============================================================================
// Setup Cluster Secrets Activity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetupClusterSecretsInput {
    pub cluster_name: String,
    pub region: String,
    pub service_account: String,
    pub namespace: String,
    pub policy_arns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetupClusterSecretsOutput {
    pub role_arn: String,
    pub manifests_applied: usize,
    pub objects_applied: usize,
}

// ============================================================================
// Trust Cluster OIDC Activity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrustClusterOidcInput {
    /// Cluster whose OIDC provider the profile roles must trust
    pub cluster_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrustClusterOidcOutput {
    /// OIDC provider host, without scheme
    pub provider: String,
    pub roles_updated: Vec<String>,
    pub roles_already_trusted: Vec<String>,
}

// ============================================================================
// Publish Parameters Activity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublishParametersInput {
    pub region: String,
    /// Instance whose endpoint becomes `dbHost`
    pub instance_id: String,
    pub bucket: String,
    pub rds_secret_name: String,
    pub s3_secret_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublishParametersOutput {
    pub db_host: String,
    pub files_updated: Vec<String>,
}

// ============================================================================
// Write Summary Activity
// ============================================================================

// Input is storeshift_models::MigrationSummary

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WriteSummaryOutput {
    pub path: String,
}

// ============================================================================
// Collect Export Vars Activity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectExportVarsInput {
    pub cluster_name: String,
    pub region: String,
    pub bucket: String,
    pub efs_name: String,
    pub db_instance: String,
    pub rds_secret_name: String,
    pub s3_secret_name: String,
}

/// Values for the cluster tfvars file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterVars {
    pub eks_cluster_id: String,
    pub eks_cluster_endpoint: String,
    pub oidc_provider: String,
    pub eks_cluster_version: String,
    pub eks_cluster_certificate_authority_data: String,
    pub region: String,
}

/// Values for the upgrade tfvars file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpgradeVars {
    pub src_s3_bucket_name: String,
    pub src_s3_secret_name: String,
    pub src_rds_secret_name: String,
    pub src_vpc_id: String,
    pub src_vpc_cidr: String,
    pub src_vpc_private_subnets: Vec<String>,
    pub src_vpc_public_subnets: Vec<String>,
    pub src_rds_endpoint: String,
    pub src_cluster_sg_id: String,
    /// `None` when no file system carries the requested name
    pub src_efs_fs_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectExportVarsOutput {
    pub cluster: ClusterVars,
    pub upgrade: UpgradeVars,
}

//! Input and output types for storeshift orchestrations

use serde::{Deserialize, Serialize};
use storeshift_models::{ReplicationTask, WaitPolicy};

// ============================================================================
// Shared settings
// ============================================================================

/// Poll intervals and timeouts for every bounded wait in a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaitSettings {
    pub db_instance: WaitPolicy,
    pub snapshot: WaitPolicy,
    pub replication: WaitPolicy,
    /// Grace period after creating an IAM role before DataSync may assume it
    pub iam_propagation_seconds: u64,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            db_instance: WaitPolicy::DB_INSTANCE,
            snapshot: WaitPolicy::SNAPSHOT,
            replication: WaitPolicy::REPLICATION,
            iam_propagation_seconds: 10,
        }
    }
}

/// Shape of the MySQL instance backing Kubeflow metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseSettings {
    /// Instance identifier (default: "kubeflow-db")
    pub instance_name: String,
    /// Metadata database name (default: "kubeflow")
    pub db_name: String,
    /// Master user (default: "admin")
    pub root_user: String,
    /// Master password; generated by Secrets Manager when absent
    pub root_password: Option<String>,
    /// Instance class (default: "db.m5.large")
    pub instance_class: String,
    /// Storage type (default: "gp2")
    pub storage_type: String,
    /// Initial storage in GB (default: 50)
    pub initial_storage_gb: i32,
    /// Storage autoscaling ceiling in GB (default: 1000)
    pub max_storage_gb: i32,
    /// Backup retention in days (default: 7)
    pub backup_retention_days: i32,
    /// DB subnet group (default: "kubeflow-db-subnet-group")
    pub subnet_group_name: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            instance_name: "kubeflow-db".to_string(),
            db_name: "kubeflow".to_string(),
            root_user: "admin".to_string(),
            root_password: None,
            instance_class: "db.m5.large".to_string(),
            storage_type: "gp2".to_string(),
            initial_storage_gb: 50,
            max_storage_gb: 1000,
            backup_retention_days: 7,
            subnet_group_name: "kubeflow-db-subnet-group".to_string(),
        }
    }
}

/// IRSA service account used by the secrets-store CSI driver
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceAccountSettings {
    pub name: String,
    pub namespace: String,
    pub policy_arns: Vec<String>,
}

impl Default for ServiceAccountSettings {
    fn default() -> Self {
        Self {
            name: "kubeflow-secrets-manager-sa".to_string(),
            namespace: "kubeflow".to_string(),
            policy_arns: vec![
                "arn:aws:iam::aws:policy/AmazonSSMReadOnlyAccess".to_string(),
                "arn:aws:iam::aws:policy/SecretsManagerReadWrite".to_string(),
            ],
        }
    }
}

pub const DEFAULT_RDS_SECRET_NAME: &str = "rds-secret";
pub const DEFAULT_S3_SECRET_NAME: &str = "s3-secret";
pub const DEFAULT_REPLICATION_ROLE_NAME: &str = "datasyncrolekubeflow";

// ============================================================================
// Setup Orchestration
// ============================================================================

/// Installation whose data seeds the new backends (in-place upgrade)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriorEnvironment {
    pub bucket: String,
    pub db_instance: String,
    /// Secret holding the prior instance's credentials; its password is reused
    pub rds_secret_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetupInput {
    pub region: String,
    pub cluster_name: String,
    pub bucket: String,
    pub s3_access_key_id: String,
    pub s3_secret_access_key: String,
    /// Default: "s3-secret"
    pub s3_secret_name: String,
    /// Default: "rds-secret"
    pub rds_secret_name: String,
    pub database: DatabaseSettings,
    /// Present when upgrading from a prior installation
    pub prior: Option<PriorEnvironment>,
    /// Default: "datasyncrolekubeflow"
    pub replication_role_name: String,
    pub service_account: ServiceAccountSettings,
    pub waits: WaitSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetupOutput {
    pub bucket_created: bool,
    pub s3_secret_created: bool,
    pub db_instance_created: bool,
    pub rds_secret_created: bool,
    /// Bucket clone, when upgrading and the bucket was new
    pub replication: Option<ReplicationTask>,
    /// Snapshot restored into the new instance, when upgrading
    pub snapshot_id: Option<String>,
    pub db_host: String,
    pub summary_path: String,
}

// ============================================================================
// Upgrade Orchestration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpgradeInput {
    pub region: String,
    /// Cluster the backends move to
    pub cluster_blue: String,
    /// Bucket of the running (green) installation
    pub bucket_green: String,
    pub bucket_blue: String,
    pub db_instance_green: String,
    /// `instance_name` and `subnet_group_name` are the blue ones
    /// (defaults: "kubeflow-db-blue", "kubeflow-db-subnet-group-blue")
    pub database: DatabaseSettings,
    /// Secret names are shared by both installations and republished as-is
    pub rds_secret_name: String,
    pub s3_secret_name: String,
    pub replication_role_name: String,
    pub service_account: ServiceAccountSettings,
    pub waits: WaitSettings,
}

impl UpgradeInput {
    pub const DEFAULT_BLUE_INSTANCE: &'static str = "kubeflow-db-blue";
    pub const DEFAULT_BLUE_SUBNET_GROUP: &'static str = "kubeflow-db-subnet-group-blue";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpgradeOutput {
    pub bucket_created: bool,
    pub replication: ReplicationTask,
    /// Snapshot restored into the blue instance (None if it already existed)
    pub snapshot_id: Option<String>,
    pub db_instance_created: bool,
    /// Profile roles that were extended to trust the blue cluster
    pub profile_roles_updated: Vec<String>,
    pub db_host: String,
    pub summary_path: String,
}

// ============================================================================
// Export Vars Orchestration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportVarsInput {
    pub region: String,
    pub cluster_name: String,
    pub bucket: String,
    pub efs_name: String,
    pub db_instance: String,
    pub rds_secret_name: String,
    pub s3_secret_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportVarsOutput {
    /// Rendered `sample.auto.tfvars`
    pub cluster_tfvars: String,
    /// Rendered `upgrade.tfvars`
    pub upgrade_tfvars: String,
}

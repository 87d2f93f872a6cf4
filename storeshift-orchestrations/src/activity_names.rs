//! Name constants for storeshift activities
//!
//! Naming convention: {crate-name}::{type}::{name}

/// Activity names
pub mod activities {
    /// Verify tooling, cluster access and the target EKS cluster
    ///
    /// **Input:** [`crate::activity_types::VerifyPrerequisitesInput`]
    /// **Output:** [`crate::activity_types::VerifyPrerequisitesOutput`]
    /// **Idempotent:** Yes (read-only)
    /// **Operations:**
    /// - Runs `eksctl version`
    /// - Reaches the Kubernetes API server
    /// - Describes the EKS cluster for its subnets and security group
    pub const VERIFY_PREREQUISITES: &str = "storeshift-orchestrations::activity::verify-prerequisites";

    /// Check whether a resource exists
    ///
    /// **Input:** [`crate::activity_types::ProbeResourceInput`]
    /// **Output:** [`crate::activity_types::ProbeResourceOutput`]
    /// **Idempotent:** Yes (read-only)
    pub const PROBE_RESOURCE: &str = "storeshift-orchestrations::activity::probe-resource";

    /// Refuse to pair a resource with a secret that belongs to something else
    ///
    /// **Input:** [`crate::activity_types::CheckSecretConflictInput`]
    /// **Output:** [`crate::activity_types::CheckSecretConflictOutput`]
    /// **Idempotent:** Yes (read-only)
    /// **Fails with:** `Conflict` when the secret exists without its resource, or
    /// (optionally) the resource exists without its secret
    pub const CHECK_SECRET_CONFLICT: &str = "storeshift-orchestrations::activity::check-secret-conflict";

    /// Create a private S3 bucket
    ///
    /// **Input:** [`crate::activity_types::CreateBucketInput`]
    /// **Output:** [`crate::activity_types::CreateBucketOutput`]
    /// **Idempotent:** Yes (skips an existing bucket)
    pub const CREATE_BUCKET: &str = "storeshift-orchestrations::activity::create-bucket";

    /// Resolve or create the IAM role DataSync assumes
    ///
    /// **Input:** [`crate::activity_types::EnsureReplicationRoleInput`]
    /// **Output:** [`crate::activity_types::EnsureReplicationRoleOutput`]
    /// **Idempotent:** Yes (an existing role is returned untouched)
    /// **Operations:**
    /// - Creates the role with a `datasync.amazonaws.com` trust policy
    /// - Puts the `datasync_s3_kubeflow` inline policy for both buckets
    pub const ENSURE_REPLICATION_ROLE: &str = "storeshift-orchestrations::activity::ensure-replication-role";

    /// Copy every object from one bucket into another
    ///
    /// **Input:** [`crate::activity_types::CloneBucketInput`]
    /// **Output:** [`storeshift_models::ReplicationTask`]
    /// **Idempotent:** No (creates a new task on every call)
    /// **Operations:**
    /// - Registers source and target S3 locations
    /// - Creates and starts a DataSync task
    /// - Polls the execution until SUCCESS (ERROR is fatal)
    pub const CLONE_BUCKET: &str = "storeshift-orchestrations::activity::clone-bucket";

    /// Store the S3 access key pair in Secrets Manager
    ///
    /// **Input:** [`crate::activity_types::CreateS3SecretInput`]
    /// **Output:** [`crate::activity_types::CreateSecretOutput`]
    /// **Idempotent:** Yes (skips an existing secret)
    pub const CREATE_S3_SECRET: &str = "storeshift-orchestrations::activity::create-s3-secret";

    /// Snapshot a DB instance and wait for the snapshot
    ///
    /// **Input:** [`crate::activity_types::SnapshotDbInput`]
    /// **Output:** [`storeshift_models::SnapshotJob`]
    /// **Idempotent:** No (a new snapshot per call; snapshots are never deleted)
    pub const SNAPSHOT_DB: &str = "storeshift-orchestrations::activity::snapshot-db";

    /// Create a DB subnet group from the cluster's private subnets
    ///
    /// **Input:** [`crate::activity_types::CreateSubnetGroupInput`]
    /// **Output:** [`crate::activity_types::CreateSubnetGroupOutput`]
    /// **Idempotent:** Yes (skips an existing group)
    pub const CREATE_SUBNET_GROUP: &str = "storeshift-orchestrations::activity::create-subnet-group";

    /// Create a MySQL instance, fresh or restored from a snapshot
    ///
    /// **Input:** [`crate::activity_types::CreateDbInstanceInput`]
    /// **Output:** [`crate::activity_types::CreateDbInstanceOutput`]
    /// **Idempotent:** Yes (skips an existing instance)
    /// **Operations:**
    /// - Checks the subnet group, snapshot and prior secret are present
    /// - Generates or reads the root password
    /// - Creates or restores the instance
    /// - Waits for "available" (fatal on "failed")
    pub const CREATE_DB_INSTANCE: &str = "storeshift-orchestrations::activity::create-db-instance";

    /// Store the DB credentials and endpoint in Secrets Manager
    ///
    /// **Input:** [`crate::activity_types::CreateRdsSecretInput`]
    /// **Output:** [`crate::activity_types::CreateSecretOutput`]
    /// **Idempotent:** Yes (skips an existing secret)
    pub const CREATE_RDS_SECRET: &str = "storeshift-orchestrations::activity::create-rds-secret";

    /// Give cluster workloads access to Secrets Manager
    ///
    /// **Input:** [`crate::activity_types::SetupClusterSecretsInput`]
    /// **Output:** [`crate::activity_types::SetupClusterSecretsOutput`]
    /// **Idempotent:** Yes (eksctl overrides, server-side apply)
    /// **Operations:**
    /// - Creates the IRSA service account
    /// - Installs the secrets-store CSI driver and AWS provider
    pub const SETUP_CLUSTER_SECRETS: &str = "storeshift-orchestrations::activity::setup-cluster-secrets";

    /// Let profile workloads assume their IAM roles from a new cluster
    ///
    /// **Input:** [`crate::activity_types::TrustClusterOidcInput`]
    /// **Output:** [`crate::activity_types::TrustClusterOidcOutput`]
    /// **Idempotent:** Yes (roles already trusting the provider are skipped)
    /// **Operations:**
    /// - Collects IRSA role ARNs from service accounts in profile namespaces
    /// - Appends an `sts:AssumeRoleWithWebIdentity` statement for the
    ///   cluster's OIDC provider to each role's trust policy
    pub const TRUST_CLUSTER_OIDC: &str = "storeshift-orchestrations::activity::trust-cluster-oidc";

    /// Rewrite deployment configuration with the new connection parameters
    ///
    /// **Input:** [`crate::activity_types::PublishParametersInput`]
    /// **Output:** [`crate::activity_types::PublishParametersOutput`]
    /// **Idempotent:** Yes
    pub const PUBLISH_PARAMETERS: &str = "storeshift-orchestrations::activity::publish-parameters";

    /// Persist the run summary
    ///
    /// **Input:** [`storeshift_models::MigrationSummary`]
    /// **Output:** [`crate::activity_types::WriteSummaryOutput`]
    /// **Idempotent:** Yes (overwrites)
    pub const WRITE_SUMMARY: &str = "storeshift-orchestrations::activity::write-summary";

    /// Gather cluster, network and backend identifiers for Terraform
    ///
    /// **Input:** [`crate::activity_types::CollectExportVarsInput`]
    /// **Output:** [`crate::activity_types::CollectExportVarsOutput`]
    /// **Idempotent:** Yes (read-only)
    pub const COLLECT_EXPORT_VARS: &str = "storeshift-orchestrations::activity::collect-export-vars";
}

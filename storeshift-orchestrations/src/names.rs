//! Name constants for storeshift orchestrations
//!
//! Naming convention: {crate-name}::{type}::{name}

/// Orchestration names
pub mod orchestrations {
    /// Provision S3 and RDS backends for a cluster
    ///
    /// **Input:** [`crate::types::SetupInput`]
    /// **Output:** [`crate::types::SetupOutput`]
    /// **Activities used:**
    /// - [`crate::activity_names::activities::VERIFY_PREREQUISITES`]
    /// - [`crate::activity_names::activities::CHECK_SECRET_CONFLICT`]
    /// - [`crate::activity_names::activities::CREATE_BUCKET`]
    /// - [`crate::activity_names::activities::ENSURE_REPLICATION_ROLE`] (upgrade only)
    /// - [`crate::activity_names::activities::CLONE_BUCKET`] (upgrade only)
    /// - [`crate::activity_names::activities::CREATE_S3_SECRET`]
    /// - [`crate::activity_names::activities::SNAPSHOT_DB`] (upgrade only)
    /// - [`crate::activity_names::activities::CREATE_SUBNET_GROUP`]
    /// - [`crate::activity_names::activities::CREATE_DB_INSTANCE`]
    /// - [`crate::activity_names::activities::CREATE_RDS_SECRET`]
    /// - [`crate::activity_names::activities::SETUP_CLUSTER_SECRETS`]
    /// - [`crate::activity_names::activities::PUBLISH_PARAMETERS`]
    /// - [`crate::activity_names::activities::WRITE_SUMMARY`]
    /// **Duration:** ~15-25 minutes for a fresh instance
    pub const SETUP: &str = "storeshift-orchestrations::orchestration::setup";

    /// Blue/green migration of the backends to a new cluster
    ///
    /// **Input:** [`crate::types::UpgradeInput`]
    /// **Output:** [`crate::types::UpgradeOutput`]
    /// **Activities used:**
    /// - [`crate::activity_names::activities::VERIFY_PREREQUISITES`]
    /// - [`crate::activity_names::activities::CREATE_BUCKET`]
    /// - [`crate::activity_names::activities::ENSURE_REPLICATION_ROLE`]
    /// - [`crate::activity_names::activities::CLONE_BUCKET`]
    /// - [`crate::activity_names::activities::PROBE_RESOURCE`]
    /// - [`crate::activity_names::activities::SNAPSHOT_DB`]
    /// - [`crate::activity_names::activities::CREATE_SUBNET_GROUP`]
    /// - [`crate::activity_names::activities::CREATE_DB_INSTANCE`]
    /// - [`crate::activity_names::activities::SETUP_CLUSTER_SECRETS`]
    /// - [`crate::activity_names::activities::TRUST_CLUSTER_OIDC`]
    /// - [`crate::activity_names::activities::PUBLISH_PARAMETERS`]
    /// - [`crate::activity_names::activities::WRITE_SUMMARY`]
    /// **Note:** The clone creates a new DataSync task on every run
    pub const UPGRADE: &str = "storeshift-orchestrations::orchestration::upgrade";

    /// Describe an existing installation as Terraform variables
    ///
    /// **Input:** [`crate::types::ExportVarsInput`]
    /// **Output:** [`crate::types::ExportVarsOutput`]
    /// **Activities used:**
    /// - [`crate::activity_names::activities::COLLECT_EXPORT_VARS`]
    pub const EXPORT_VARS: &str = "storeshift-orchestrations::orchestration::export-vars";
}

//! Atomic provisioning steps, one per file
//!
//! Each module exposes `NAME` and `activity(ctx, input)`. Creating activities
//! probe first and return `created: false` for resources that already exist.

// Cluster
pub mod verify_prerequisites;
pub mod setup_cluster_secrets;
pub mod trust_cluster_oidc;

// Existence gates
pub mod probe_resource;
pub mod check_secret_conflict;

// S3
pub mod create_bucket;
pub mod ensure_replication_role;
pub mod clone_bucket;
pub mod create_s3_secret;

// RDS
pub mod snapshot_db;
pub mod create_subnet_group;
pub mod create_db_instance;
pub mod create_rds_secret;

// Downstream
pub mod publish_parameters;
pub mod write_summary;
pub mod collect_export_vars;

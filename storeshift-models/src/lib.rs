use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Kinds of cloud resources managed by storeshift
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    ObjectStore,
    RelationalInstance,
    IamRole,
    SubnetGroup,
    SecretEntry,
    ReplicationTask,
    Snapshot,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::ObjectStore => "S3 bucket",
            ResourceKind::RelationalInstance => "DB instance",
            ResourceKind::IamRole => "IAM role",
            ResourceKind::SubnetGroup => "DB subnet group",
            ResourceKind::SecretEntry => "secret",
            ResourceKind::ReplicationTask => "DataSync task",
            ResourceKind::Snapshot => "DB snapshot",
        };
        f.write_str(name)
    }
}

/// Identity of a cloud resource: (kind, name, region)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ResourceSpec {
    pub kind: ResourceKind,
    pub name: String,
    pub region: String,
}

impl ResourceSpec {
    pub fn new(kind: ResourceKind, name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            region: region.into(),
        }
    }

    pub fn bucket(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self::new(ResourceKind::ObjectStore, name, region)
    }

    pub fn db_instance(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self::new(ResourceKind::RelationalInstance, name, region)
    }

    pub fn subnet_group(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self::new(ResourceKind::SubnetGroup, name, region)
    }

    pub fn secret(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self::new(ResourceKind::SecretEntry, name, region)
    }

    pub fn role(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self::new(ResourceKind::IamRole, name, region)
    }

    pub fn snapshot(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self::new(ResourceKind::Snapshot, name, region)
    }

    pub fn replication_task(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self::new(ResourceKind::ReplicationTask, name, region)
    }
}

impl fmt::Display for ResourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' ({})", self.kind, self.name, self.region)
    }
}

/// Status of a DB snapshot as reported by RDS
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotStatus {
    Creating,
    Available,
    Failed,
    #[serde(untagged)]
    Other(String),
}

impl SnapshotStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "creating" => SnapshotStatus::Creating,
            "available" => SnapshotStatus::Available,
            "failed" | "deleted" | "error" => SnapshotStatus::Failed,
            other => SnapshotStatus::Other(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SnapshotStatus::Available | SnapshotStatus::Failed)
    }
}

impl fmt::Display for SnapshotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotStatus::Creating => f.write_str("creating"),
            SnapshotStatus::Available => f.write_str("available"),
            SnapshotStatus::Failed => f.write_str("failed"),
            SnapshotStatus::Other(s) => f.write_str(s),
        }
    }
}

/// A point-in-time snapshot of a DB instance.
///
/// Snapshots are never deleted by storeshift.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotJob {
    pub source_instance_id: String,
    pub snapshot_id: String,
    pub status: SnapshotStatus,
}

impl SnapshotJob {
    /// Prefix of every snapshot identifier created by storeshift
    pub const ID_PREFIX: &'static str = "kf-rds-snap";

    /// New job for `source_instance_id` whose id is derived from `created_at`
    pub fn new(source_instance_id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            source_instance_id: source_instance_id.into(),
            snapshot_id: format!("{}-{}", Self::ID_PREFIX, created_at.timestamp()),
            status: SnapshotStatus::Creating,
        }
    }
}

/// DataSync task execution status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplicationStatus {
    Queued,
    Launching,
    Preparing,
    Transferring,
    Verifying,
    Success,
    Error,
}

impl ReplicationStatus {
    pub fn parse(status: &str) -> Option<Self> {
        match status {
            "QUEUED" => Some(ReplicationStatus::Queued),
            "LAUNCHING" => Some(ReplicationStatus::Launching),
            "PREPARING" => Some(ReplicationStatus::Preparing),
            "TRANSFERRING" => Some(ReplicationStatus::Transferring),
            "VERIFYING" => Some(ReplicationStatus::Verifying),
            "SUCCESS" => Some(ReplicationStatus::Success),
            "ERROR" => Some(ReplicationStatus::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReplicationStatus::Queued => "QUEUED",
            ReplicationStatus::Launching => "LAUNCHING",
            ReplicationStatus::Preparing => "PREPARING",
            ReplicationStatus::Transferring => "TRANSFERRING",
            ReplicationStatus::Verifying => "VERIFYING",
            ReplicationStatus::Success => "SUCCESS",
            ReplicationStatus::Error => "ERROR",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReplicationStatus::Success | ReplicationStatus::Error)
    }
}

impl fmt::Display for ReplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source→target object replication task and its current execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplicationTask {
    pub source_location: String,
    pub target_location: String,
    pub task_id: String,
    pub execution_id: String,
    pub status: ReplicationStatus,
}

impl ReplicationTask {
    /// Name for a replication task created at `created_at`
    pub fn task_name(created_at: DateTime<Utc>) -> String {
        format!("kubeflow-sync-{}", created_at.timestamp())
    }
}

/// A secret and its key/value payload
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecretEntry {
    pub name: String,
    pub description: String,
    pub payload: BTreeMap<String, String>,
}

impl fmt::Debug for SecretEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Payload holds credentials
        f.debug_struct("SecretEntry")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("keys", &self.payload.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SecretEntry {
    /// Secret holding the S3 access key pair used by the pipelines
    pub fn s3(name: impl Into<String>, access_key_id: &str, secret_access_key: &str) -> Self {
        let mut payload = BTreeMap::new();
        payload.insert("accesskey".to_string(), access_key_id.to_string());
        payload.insert("secretkey".to_string(), secret_access_key.to_string());
        Self {
            name: name.into(),
            description: "Kubeflow S3 secret".to_string(),
            payload,
        }
    }

    /// Secret holding the RDS master credentials and endpoint
    pub fn rds(name: impl Into<String>, credentials: &DbCredentials, endpoint: &DbEndpoint) -> Self {
        let mut payload = BTreeMap::new();
        payload.insert("username".to_string(), credentials.username.clone());
        payload.insert("password".to_string(), credentials.password.clone());
        payload.insert("database".to_string(), credentials.database.clone());
        payload.insert("host".to_string(), endpoint.address.clone());
        payload.insert("port".to_string(), endpoint.port.to_string());
        Self {
            name: name.into(),
            description: "Kubeflow RDS secret".to_string(),
            payload,
        }
    }

    /// Payload rendered as the JSON secret string stored by Secrets Manager
    pub fn secret_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.payload)
    }
}

/// Master credentials of a DB instance
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DbCredentials {
    pub username: String,
    pub password: String,
    pub database: String,
}

impl fmt::Debug for DbCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// Resolved network endpoint of a DB instance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DbEndpoint {
    pub address: String,
    pub port: i32,
}

/// Bounded wait configuration attached to every asynchronous wait
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WaitPolicy {
    pub poll_interval_seconds: u64,
    pub timeout_seconds: u64,
}

impl WaitPolicy {
    /// DB instance transitioning to "available"
    pub const DB_INSTANCE: WaitPolicy = WaitPolicy::new(10, 1500);
    /// DB snapshot transitioning to "available"
    pub const SNAPSHOT: WaitPolicy = WaitPolicy::new(10, 1800);
    /// DataSync execution reaching a terminal status
    pub const REPLICATION: WaitPolicy = WaitPolicy::new(30, 4 * 60 * 60);

    pub const fn new(poll_interval_seconds: u64, timeout_seconds: u64) -> Self {
        Self {
            poll_interval_seconds,
            timeout_seconds,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn with_timeout(self, timeout_seconds: u64) -> Self {
        Self {
            timeout_seconds,
            ..self
        }
    }
}

/// Connection parameters republished to downstream deployment configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionParameters {
    pub region: String,
    pub db_host: String,
    pub bucket: String,
    pub rds_secret_name: String,
    pub s3_secret_name: String,
}

impl ConnectionParameters {
    pub const MLMD_DB: &'static str = "metadb";
    pub const S3_SERVICE_HOST: &'static str = "s3.amazonaws.com";

    /// Pipeline parameters for the RDS module
    pub fn rds_params(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("dbHost".to_string(), self.db_host.clone()),
            ("mlmdDb".to_string(), Self::MLMD_DB.to_string()),
        ])
    }

    /// Pipeline parameters for the S3 module
    pub fn s3_params(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("bucketName".to_string(), self.bucket.clone()),
            ("minioServiceRegion".to_string(), self.region.clone()),
            ("minioServiceHost".to_string(), Self::S3_SERVICE_HOST.to_string()),
        ])
    }
}

/// Summary record written for operator inspection after a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MigrationSummary {
    #[serde(rename = "S3")]
    pub s3: S3Summary,
    #[serde(rename = "RDS")]
    pub rds: RdsSummary,
    #[serde(rename = "CLUSTER")]
    pub cluster: ClusterSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct S3Summary {
    pub bucket: String,
    pub secret_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RdsSummary {
    pub instance_name: String,
    pub secret_name: String,
    pub subnet_group_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterSummary {
    pub region: String,
    pub name: String,
}

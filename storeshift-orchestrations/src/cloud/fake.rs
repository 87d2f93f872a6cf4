//! In-memory cloud used by unit tests
//!
//! Every trait call is appended to a call log (`"s3:create_bucket"`, ...),
//! status transitions are scripted per resource and any operation can be
//! made to fail with an injected [`CloudError`].

use super::{
    ClusterControl, ClusterInfo, CloudClients, CloudResult, CreateBucketRequest,
    CreateDbInstanceRequest, CreateTaskRequest, DataReplication, DbInstanceInfo, DbSnapshotInfo,
    DbSubnetGroupInfo, FileStorage, Identity, Network, ObjectStorage, PasswordPolicy,
    RelationalDb, RestoreDbInstanceRequest, RoleInfo, SecretStore, SubnetInfo, SubnetTag,
    TaskExecutionInfo, TaskSummary,
};
use crate::error::CloudError;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use storeshift_models::DbEndpoint;

/// Ordered statuses reported by successive describe calls; the last one sticks
#[derive(Debug, Clone, Default)]
struct Script(VecDeque<String>);

impl Script {
    fn of(statuses: &[&str]) -> Self {
        Self(statuses.iter().map(|s| s.to_string()).collect())
    }

    fn next(&mut self) -> String {
        if self.0.len() > 1 {
            self.0.pop_front().unwrap_or_default()
        } else {
            self.0.front().cloned().unwrap_or_default()
        }
    }
}

#[derive(Debug, Clone)]
struct FakeInstance {
    info: DbInstanceInfo,
    statuses: Script,
}

#[derive(Debug, Clone)]
struct FakeSnapshot {
    instance_id: String,
    statuses: Script,
}

#[derive(Debug, Clone)]
pub struct FakeSecret {
    pub description: String,
    pub value: String,
}

#[derive(Default)]
struct State {
    buckets: Vec<String>,
    bucket_requests: Vec<CreateBucketRequest>,
    instances: BTreeMap<String, FakeInstance>,
    instance_script: Option<Script>,
    create_requests: Vec<CreateDbInstanceRequest>,
    restore_requests: Vec<RestoreDbInstanceRequest>,
    subnet_groups: BTreeMap<String, DbSubnetGroupInfo>,
    snapshots: BTreeMap<String, FakeSnapshot>,
    snapshot_script: Option<Script>,
    roles: BTreeMap<String, RoleInfo>,
    role_policies: BTreeMap<(String, String), String>,
    secrets: BTreeMap<String, FakeSecret>,
    locations: Vec<(String, String)>,
    tasks: Vec<TaskSummary>,
    task_requests: Vec<CreateTaskRequest>,
    executions: BTreeMap<String, Script>,
    execution_script: Option<Script>,
    cluster: Option<ClusterInfo>,
    subnets: Vec<SubnetInfo>,
    vpc_cidrs: BTreeMap<String, String>,
    file_systems: BTreeMap<String, String>,
    faults: HashMap<&'static str, CloudError>,
    calls: Vec<String>,
}

/// Shared handle to a fake account; clones see the same state
#[derive(Clone, Default)]
pub struct FakeCloud {
    region: String,
    state: Arc<Mutex<State>>,
}

const MUTATING: &[&str] = &[
    "s3:create_bucket",
    "rds:create_db_instance",
    "rds:restore_db_instance",
    "rds:create_db_subnet_group",
    "rds:create_db_snapshot",
    "iam:create_role",
    "iam:put_role_policy",
    "iam:update_assume_role_policy",
    "secrets:create_secret",
    "datasync:create_s3_location",
    "datasync:create_task",
    "datasync:start_task_execution",
];

impl FakeCloud {
    pub fn new(region: &str) -> Self {
        Self {
            region: region.to_string(),
            state: Arc::default(),
        }
    }

    /// Account with an EKS cluster whose subnets cover the eksctl, cdk and public cases
    pub fn with_cluster(region: &str, cluster_name: &str) -> Self {
        let cloud = Self::new(region);
        cloud.set_cluster(ClusterInfo {
            name: cluster_name.to_string(),
            subnet_ids: vec![
                "subnet-private-a".to_string(),
                "subnet-private-b".to_string(),
                "subnet-public-c".to_string(),
            ],
            security_group_id: Some("sg-cluster".to_string()),
            endpoint: Some(format!("https://ABCDEF.gr7.{}.eks.amazonaws.com", region)),
            version: Some("1.25".to_string()),
            oidc_issuer: Some(format!("https://oidc.eks.{}.amazonaws.com/id/ABCDEF", region)),
            certificate_authority: Some("LS0tLS1CRUdJTg==".to_string()),
        });
        cloud.add_subnet(
            "subnet-private-a",
            &[("Name", "eksctl-kf/SubnetPrivateUSWEST2A")],
        );
        cloud.add_subnet(
            "subnet-private-b",
            &[("aws-cdk:subnet-type", "Private"), ("Name", "cdk-private")],
        );
        cloud.add_subnet(
            "subnet-public-c",
            &[("Name", "eksctl-kf/SubnetPublicUSWEST2C")],
        );
        cloud
    }

    pub fn clients(&self) -> CloudClients {
        CloudClients {
            region: self.region.clone(),
            s3: Arc::new(self.clone()),
            rds: Arc::new(self.clone()),
            iam: Arc::new(self.clone()),
            secrets: Arc::new(self.clone()),
            datasync: Arc::new(self.clone()),
            eks: Arc::new(self.clone()),
            ec2: Arc::new(self.clone()),
            efs: Arc::new(self.clone()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn record(&self, op: &'static str) -> CloudResult<MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(op.to_string());
        match state.faults.get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(state),
        }
    }

    // Seeding

    pub fn add_bucket(&self, name: &str) {
        self.lock().buckets.push(name.to_string());
    }

    pub fn add_secret(&self, name: &str, value: &str) {
        self.lock().secrets.insert(
            name.to_string(),
            FakeSecret {
                description: "seeded".to_string(),
                value: value.to_string(),
            },
        );
    }

    pub fn add_instance(&self, identifier: &str, status: &str) {
        let info = self.instance_info(identifier, "admin", "kubeflow");
        self.lock().instances.insert(
            identifier.to_string(),
            FakeInstance {
                info,
                statuses: Script::of(&[status]),
            },
        );
    }

    /// Replace a seeded instance's description, keeping its status script
    pub fn set_instance(&self, info: DbInstanceInfo) {
        if let Some(instance) = self.lock().instances.get_mut(&info.identifier) {
            instance.info = info;
        }
    }

    pub fn add_subnet_group(&self, name: &str) {
        self.lock().subnet_groups.insert(
            name.to_string(),
            DbSubnetGroupInfo {
                name: name.to_string(),
                vpc_id: Some("vpc-123".to_string()),
                subnet_ids: vec!["subnet-private-a".to_string()],
            },
        );
    }

    pub fn add_snapshot(&self, snapshot_id: &str, instance_id: &str, status: &str) {
        self.lock().snapshots.insert(
            snapshot_id.to_string(),
            FakeSnapshot {
                instance_id: instance_id.to_string(),
                statuses: Script::of(&[status]),
            },
        );
    }

    pub fn add_role(&self, name: &str) {
        self.add_role_with_trust(name, r#"{"Version":"2012-10-17","Statement":[]}"#);
    }

    pub fn add_role_with_trust(&self, name: &str, trust_policy: &str) {
        self.lock().roles.insert(
            name.to_string(),
            RoleInfo {
                name: name.to_string(),
                arn: format!("arn:aws:iam::123456789012:role/{}", name),
                trust_policy: Some(trust_policy.to_string()),
            },
        );
    }

    pub fn add_task(&self, name: &str) {
        let mut state = self.lock();
        let arn = format!("arn:aws:datasync:task/task-{}", state.tasks.len());
        state.tasks.push(TaskSummary {
            arn,
            name: Some(name.to_string()),
        });
    }

    pub fn set_cluster(&self, cluster: ClusterInfo) {
        self.lock().cluster = Some(cluster);
    }

    pub fn add_subnet(&self, subnet_id: &str, tags: &[(&str, &str)]) {
        self.lock().subnets.push(SubnetInfo {
            subnet_id: subnet_id.to_string(),
            tags: tags.iter().map(|(k, v)| SubnetTag::new(*k, *v)).collect(),
        });
    }

    pub fn add_vpc(&self, vpc_id: &str, cidr: &str) {
        self.lock()
            .vpc_cidrs
            .insert(vpc_id.to_string(), cidr.to_string());
    }

    pub fn add_file_system(&self, name: &str, id: &str) {
        self.lock()
            .file_systems
            .insert(name.to_string(), id.to_string());
    }

    /// Statuses reported by the next created or restored instance
    pub fn script_instance(&self, statuses: &[&str]) {
        self.lock().instance_script = Some(Script::of(statuses));
    }

    pub fn script_snapshot(&self, statuses: &[&str]) {
        self.lock().snapshot_script = Some(Script::of(statuses));
    }

    pub fn script_execution(&self, statuses: &[&str]) {
        self.lock().execution_script = Some(Script::of(statuses));
    }

    pub fn fail(&self, op: &'static str, err: CloudError) {
        self.lock().faults.insert(op, err);
    }

    // Inspection

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.lock().calls.iter().filter(|c| c.as_str() == op).count()
    }

    pub fn mutating_calls(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter(|c| MUTATING.contains(&c.as_str()))
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn buckets(&self) -> Vec<String> {
        self.lock().buckets.clone()
    }

    pub fn bucket_requests(&self) -> Vec<CreateBucketRequest> {
        self.lock().bucket_requests.clone()
    }

    pub fn secret(&self, name: &str) -> Option<FakeSecret> {
        self.lock().secrets.get(name).cloned()
    }

    pub fn instance(&self, identifier: &str) -> Option<DbInstanceInfo> {
        self.lock().instances.get(identifier).map(|i| i.info.clone())
    }

    pub fn create_requests(&self) -> Vec<CreateDbInstanceRequest> {
        self.lock().create_requests.clone()
    }

    pub fn restore_requests(&self) -> Vec<RestoreDbInstanceRequest> {
        self.lock().restore_requests.clone()
    }

    pub fn subnet_group(&self, name: &str) -> Option<DbSubnetGroupInfo> {
        self.lock().subnet_groups.get(name).cloned()
    }

    pub fn role(&self, name: &str) -> Option<RoleInfo> {
        self.lock().roles.get(name).cloned()
    }

    pub fn role_policy(&self, role: &str, policy: &str) -> Option<String> {
        self.lock()
            .role_policies
            .get(&(role.to_string(), policy.to_string()))
            .cloned()
    }

    pub fn locations(&self) -> Vec<(String, String)> {
        self.lock().locations.clone()
    }

    pub fn task_requests(&self) -> Vec<CreateTaskRequest> {
        self.lock().task_requests.clone()
    }

    fn instance_info(&self, identifier: &str, username: &str, db_name: &str) -> DbInstanceInfo {
        DbInstanceInfo {
            identifier: identifier.to_string(),
            status: "available".to_string(),
            endpoint: Some(DbEndpoint {
                address: format!("{}.c9akciq32.{}.rds.amazonaws.com", identifier, self.region),
                port: 3306,
            }),
            master_username: Some(username.to_string()),
            db_name: Some(db_name.to_string()),
            vpc_id: Some("vpc-123".to_string()),
        }
    }
}

#[async_trait]
impl ObjectStorage for FakeCloud {
    async fn list_buckets(&self) -> CloudResult<Vec<String>> {
        let state = self.record("s3:list_buckets")?;
        Ok(state.buckets.clone())
    }

    async fn create_bucket(&self, request: &CreateBucketRequest) -> CloudResult<()> {
        let mut state = self.record("s3:create_bucket")?;
        if state.buckets.contains(&request.bucket) {
            return Err(CloudError::fault("s3:CreateBucket", "BucketAlreadyOwnedByYou"));
        }
        state.buckets.push(request.bucket.clone());
        state.bucket_requests.push(request.clone());
        Ok(())
    }
}

#[async_trait]
impl RelationalDb for FakeCloud {
    async fn describe_db_instance(&self, identifier: &str) -> CloudResult<DbInstanceInfo> {
        let mut state = self.record("rds:describe_db_instance")?;
        let instance = state
            .instances
            .get_mut(identifier)
            .ok_or_else(|| CloudError::not_found(identifier))?;
        instance.info.status = instance.statuses.next();
        Ok(instance.info.clone())
    }

    async fn create_db_instance(&self, request: &CreateDbInstanceRequest) -> CloudResult<()> {
        let info = self.instance_info(&request.identifier, &request.master_username, &request.db_name);
        let mut state = self.record("rds:create_db_instance")?;
        if state.instances.contains_key(&request.identifier) {
            return Err(CloudError::fault("rds:CreateDBInstance", "DBInstanceAlreadyExists"));
        }
        let statuses = state
            .instance_script
            .take()
            .unwrap_or_else(|| Script::of(&["creating", "backing-up", "available"]));
        state
            .instances
            .insert(request.identifier.clone(), FakeInstance { info, statuses });
        state.create_requests.push(request.clone());
        Ok(())
    }

    async fn restore_db_instance_from_snapshot(
        &self,
        request: &RestoreDbInstanceRequest,
    ) -> CloudResult<()> {
        let mut info = self.instance_info(&request.identifier, "admin", "kubeflow");
        let mut state = self.record("rds:restore_db_instance")?;
        let source = state
            .snapshots
            .get(&request.snapshot_id)
            .map(|s| s.instance_id.clone())
            .ok_or_else(|| CloudError::fault("rds:RestoreDBInstanceFromDBSnapshot", "DBSnapshotNotFound"))?;
        if let Some(source) = state.instances.get(&source) {
            info.master_username = source.info.master_username.clone();
            info.db_name = source.info.db_name.clone();
        }
        let statuses = state
            .instance_script
            .take()
            .unwrap_or_else(|| Script::of(&["creating", "available"]));
        state
            .instances
            .insert(request.identifier.clone(), FakeInstance { info, statuses });
        state.restore_requests.push(request.clone());
        Ok(())
    }

    async fn describe_db_subnet_group(&self, name: &str) -> CloudResult<DbSubnetGroupInfo> {
        let state = self.record("rds:describe_db_subnet_group")?;
        state
            .subnet_groups
            .get(name)
            .cloned()
            .ok_or_else(|| CloudError::not_found(name))
    }

    async fn create_db_subnet_group(
        &self,
        name: &str,
        _description: &str,
        subnet_ids: &[String],
    ) -> CloudResult<()> {
        let mut state = self.record("rds:create_db_subnet_group")?;
        state.subnet_groups.insert(
            name.to_string(),
            DbSubnetGroupInfo {
                name: name.to_string(),
                vpc_id: Some("vpc-123".to_string()),
                subnet_ids: subnet_ids.to_vec(),
            },
        );
        Ok(())
    }

    async fn create_db_snapshot(&self, snapshot_id: &str, instance_id: &str) -> CloudResult<()> {
        let mut state = self.record("rds:create_db_snapshot")?;
        if !state.instances.contains_key(instance_id) {
            return Err(CloudError::fault("rds:CreateDBSnapshot", "DBInstanceNotFound"));
        }
        let statuses = state
            .snapshot_script
            .take()
            .unwrap_or_else(|| Script::of(&["creating", "available"]));
        state.snapshots.insert(
            snapshot_id.to_string(),
            FakeSnapshot {
                instance_id: instance_id.to_string(),
                statuses,
            },
        );
        Ok(())
    }

    async fn describe_db_snapshot(
        &self,
        snapshot_id: &str,
        instance_id: Option<&str>,
    ) -> CloudResult<DbSnapshotInfo> {
        let mut state = self.record("rds:describe_db_snapshot")?;
        let snapshot = state
            .snapshots
            .get_mut(snapshot_id)
            .filter(|s| instance_id.map_or(true, |id| s.instance_id == id))
            .ok_or_else(|| CloudError::not_found(snapshot_id))?;
        Ok(DbSnapshotInfo {
            snapshot_id: snapshot_id.to_string(),
            status: snapshot.statuses.next(),
        })
    }
}

#[async_trait]
impl Identity for FakeCloud {
    async fn get_role(&self, name: &str) -> CloudResult<RoleInfo> {
        let state = self.record("iam:get_role")?;
        state
            .roles
            .get(name)
            .cloned()
            .ok_or_else(|| CloudError::not_found(name))
    }

    async fn create_role(&self, name: &str, trust_policy: &str) -> CloudResult<RoleInfo> {
        let mut state = self.record("iam:create_role")?;
        let role = RoleInfo {
            name: name.to_string(),
            arn: format!("arn:aws:iam::123456789012:role/{}", name),
            trust_policy: Some(trust_policy.to_string()),
        };
        state.roles.insert(name.to_string(), role.clone());
        Ok(role)
    }

    async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> CloudResult<()> {
        let mut state = self.record("iam:put_role_policy")?;
        state.role_policies.insert(
            (role_name.to_string(), policy_name.to_string()),
            policy_document.to_string(),
        );
        Ok(())
    }

    async fn update_assume_role_policy(&self, role_name: &str, policy_document: &str) -> CloudResult<()> {
        let mut state = self.record("iam:update_assume_role_policy")?;
        let role = state
            .roles
            .get_mut(role_name)
            .ok_or_else(|| CloudError::not_found(role_name))?;
        role.trust_policy = Some(policy_document.to_string());
        Ok(())
    }
}

#[async_trait]
impl SecretStore for FakeCloud {
    async fn describe_secret(&self, name: &str) -> CloudResult<String> {
        let state = self.record("secrets:describe_secret")?;
        if state.secrets.contains_key(name) {
            Ok(format!("arn:aws:secretsmanager:{}:123456789012:secret:{}", self.region, name))
        } else {
            Err(CloudError::not_found(name))
        }
    }

    async fn create_secret(
        &self,
        name: &str,
        description: &str,
        secret_string: &str,
    ) -> CloudResult<String> {
        let mut state = self.record("secrets:create_secret")?;
        if state.secrets.contains_key(name) {
            return Err(CloudError::fault("secretsmanager:CreateSecret", "ResourceExistsException"));
        }
        state.secrets.insert(
            name.to_string(),
            FakeSecret {
                description: description.to_string(),
                value: secret_string.to_string(),
            },
        );
        Ok(format!("arn:aws:secretsmanager:{}:123456789012:secret:{}", self.region, name))
    }

    async fn get_secret_value(&self, name: &str) -> CloudResult<String> {
        let state = self.record("secrets:get_secret_value")?;
        state
            .secrets
            .get(name)
            .map(|s| s.value.clone())
            .ok_or_else(|| CloudError::not_found(name))
    }

    async fn random_password(&self, policy: &PasswordPolicy) -> CloudResult<String> {
        self.record("secrets:random_password")?;
        Ok("Gen3rated".repeat(4).chars().take(policy.length as usize).collect())
    }
}

#[async_trait]
impl DataReplication for FakeCloud {
    async fn create_s3_location(&self, bucket_arn: &str, role_arn: &str) -> CloudResult<String> {
        let mut state = self.record("datasync:create_s3_location")?;
        state
            .locations
            .push((bucket_arn.to_string(), role_arn.to_string()));
        Ok(format!("arn:aws:datasync:location/loc-{}", state.locations.len()))
    }

    async fn create_task(&self, request: &CreateTaskRequest) -> CloudResult<String> {
        let mut state = self.record("datasync:create_task")?;
        let arn = format!("arn:aws:datasync:task/task-{}", state.tasks.len());
        state.tasks.push(TaskSummary {
            arn: arn.clone(),
            name: Some(request.name.clone()),
        });
        state.task_requests.push(request.clone());
        Ok(arn)
    }

    async fn list_tasks(&self) -> CloudResult<Vec<TaskSummary>> {
        let state = self.record("datasync:list_tasks")?;
        Ok(state.tasks.clone())
    }

    async fn start_task_execution(&self, task_arn: &str) -> CloudResult<String> {
        let mut state = self.record("datasync:start_task_execution")?;
        let arn = format!("{}/execution/exec-{}", task_arn, state.executions.len());
        let statuses = state
            .execution_script
            .take()
            .unwrap_or_else(|| Script::of(&["QUEUED", "TRANSFERRING", "SUCCESS"]));
        state.executions.insert(arn.clone(), statuses);
        Ok(arn)
    }

    async fn describe_task_execution(&self, execution_arn: &str) -> CloudResult<TaskExecutionInfo> {
        let mut state = self.record("datasync:describe_task_execution")?;
        let statuses = state
            .executions
            .get_mut(execution_arn)
            .ok_or_else(|| CloudError::not_found(execution_arn))?;
        Ok(TaskExecutionInfo {
            execution_arn: execution_arn.to_string(),
            status: statuses.next(),
            estimated_files_to_transfer: Some(42),
            estimated_bytes_to_transfer: Some(4096),
        })
    }
}

#[async_trait]
impl ClusterControl for FakeCloud {
    async fn describe_cluster(&self, name: &str) -> CloudResult<ClusterInfo> {
        let state = self.record("eks:describe_cluster")?;
        state
            .cluster
            .clone()
            .filter(|c| c.name == name)
            .ok_or_else(|| CloudError::not_found(name))
    }
}

#[async_trait]
impl Network for FakeCloud {
    async fn describe_subnets(&self, subnet_ids: &[String]) -> CloudResult<Vec<SubnetInfo>> {
        let state = self.record("ec2:describe_subnets")?;
        Ok(state
            .subnets
            .iter()
            .filter(|s| subnet_ids.contains(&s.subnet_id))
            .cloned()
            .collect())
    }

    async fn describe_vpc_cidr(&self, vpc_id: &str) -> CloudResult<String> {
        let state = self.record("ec2:describe_vpc_cidr")?;
        state
            .vpc_cidrs
            .get(vpc_id)
            .cloned()
            .ok_or_else(|| CloudError::not_found(vpc_id))
    }
}

#[async_trait]
impl FileStorage for FakeCloud {
    async fn find_file_system(&self, name: &str) -> CloudResult<Option<String>> {
        let state = self.record("efs:find_file_system")?;
        Ok(state.file_systems.get(name).cloned())
    }
}

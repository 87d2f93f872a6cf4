//! AWS SDK implementations of the cloud traits
//!
//! Each adapter is a thin wrapper over one service client. Error mapping
//! follows a single rule: the service's own "not found" fault becomes
//! [`CloudError::NotFound`], everything else becomes [`CloudError::Fault`]
//! with the full SDK error context as the message.

use super::{
    ClusterControl, ClusterInfo, CloudClients, CloudResult, CreateBucketRequest,
    CreateDbInstanceRequest, CreateTaskRequest, DataReplication, DbInstanceInfo, DbSnapshotInfo,
    DbSubnetGroupInfo, FileStorage, Identity, Network, ObjectStorage, PasswordPolicy,
    RelationalDb, RestoreDbInstanceRequest, RoleInfo, SecretStore, SubnetInfo, SubnetTag,
    TaskExecutionInfo, TaskSummary,
};
use crate::error::CloudError;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use std::sync::Arc;
use storeshift_models::DbEndpoint;

/// Default MySQL port, used when RDS omits the port from an endpoint
const MYSQL_PORT: i32 = 3306;

/// Load shared SDK configuration (credentials chain, retry defaults) for `region`
pub async fn load_sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}

impl CloudClients {
    /// Build AWS-backed clients for the region of `config`
    pub fn from_sdk_config(region: &str, config: &SdkConfig) -> Self {
        Self {
            region: region.to_string(),
            s3: Arc::new(AwsObjectStorage {
                client: aws_sdk_s3::Client::new(config),
            }),
            rds: Arc::new(AwsRelationalDb {
                client: aws_sdk_rds::Client::new(config),
            }),
            iam: Arc::new(AwsIdentity {
                client: aws_sdk_iam::Client::new(config),
            }),
            secrets: Arc::new(AwsSecretStore {
                client: aws_sdk_secretsmanager::Client::new(config),
            }),
            datasync: Arc::new(AwsDataReplication {
                client: aws_sdk_datasync::Client::new(config),
            }),
            eks: Arc::new(AwsClusterControl {
                client: aws_sdk_eks::Client::new(config),
            }),
            ec2: Arc::new(AwsNetwork {
                client: aws_sdk_ec2::Client::new(config),
            }),
            efs: Arc::new(AwsFileStorage {
                client: aws_sdk_efs::Client::new(config),
            }),
        }
    }

    /// Load the default credential chain and build clients for `region`
    pub async fn connect(region: &str) -> Self {
        let config = load_sdk_config(region).await;
        Self::from_sdk_config(region, &config)
    }
}

// Error mapping helpers

fn fault<E: std::error::Error>(operation: &'static str, err: E) -> CloudError {
    CloudError::fault(operation, DisplayErrorContext(err).to_string())
}

/// Map an SDK error, classifying the service's not-found fault via `is_not_found`
fn classify<E, R>(
    operation: &'static str,
    what: &str,
    err: SdkError<E, R>,
    is_not_found: impl Fn(&E) -> bool,
) -> CloudError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    if err.as_service_error().map(is_not_found).unwrap_or(false) {
        CloudError::not_found(what)
    } else {
        fault(operation, err)
    }
}

fn missing_field(operation: &'static str, field: &str) -> CloudError {
    CloudError::fault(operation, format!("response did not include {}", field))
}

// ============================================================================
// S3
// ============================================================================

pub struct AwsObjectStorage {
    client: aws_sdk_s3::Client,
}

#[async_trait]
impl ObjectStorage for AwsObjectStorage {
    async fn list_buckets(&self) -> CloudResult<Vec<String>> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| fault("s3:ListBuckets", e))?;

        Ok(output
            .buckets()
            .iter()
            .filter_map(|bucket| bucket.name().map(str::to_string))
            .collect())
    }

    async fn create_bucket(&self, request: &CreateBucketRequest) -> CloudResult<()> {
        use aws_sdk_s3::types::{BucketCannedAcl, BucketLocationConstraint, CreateBucketConfiguration};

        let mut call = self
            .client
            .create_bucket()
            .bucket(&request.bucket)
            .acl(BucketCannedAcl::Private);

        if let Some(region) = &request.location_constraint {
            call = call.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region.as_str()))
                    .build(),
            );
        }

        call.send().await.map_err(|e| fault("s3:CreateBucket", e))?;
        Ok(())
    }
}

// ============================================================================
// RDS
// ============================================================================

pub struct AwsRelationalDb {
    client: aws_sdk_rds::Client,
}

fn db_instance_info(identifier: &str, instance: &aws_sdk_rds::types::DbInstance) -> DbInstanceInfo {
    let endpoint = instance.endpoint().and_then(|endpoint| {
        let port: Option<i32> = endpoint.port().into();
        Some(DbEndpoint {
            address: endpoint.address()?.to_string(),
            port: port.unwrap_or(MYSQL_PORT),
        })
    });

    DbInstanceInfo {
        identifier: instance
            .db_instance_identifier()
            .unwrap_or(identifier)
            .to_string(),
        status: instance
            .db_instance_status()
            .unwrap_or("unknown")
            .to_string(),
        endpoint,
        master_username: instance.master_username().map(str::to_string),
        db_name: instance.db_name().map(str::to_string),
        vpc_id: instance
            .db_subnet_group()
            .and_then(|group| group.vpc_id())
            .map(str::to_string),
    }
}

#[async_trait]
impl RelationalDb for AwsRelationalDb {
    async fn describe_db_instance(&self, identifier: &str) -> CloudResult<DbInstanceInfo> {
        let output = self
            .client
            .describe_db_instances()
            .db_instance_identifier(identifier)
            .send()
            .await
            .map_err(|e| {
                classify("rds:DescribeDBInstances", identifier, e, |se| {
                    se.is_db_instance_not_found_fault()
                })
            })?;

        output
            .db_instances()
            .first()
            .map(|instance| db_instance_info(identifier, instance))
            .ok_or_else(|| CloudError::not_found(identifier))
    }

    async fn create_db_instance(&self, request: &CreateDbInstanceRequest) -> CloudResult<()> {
        let placement = &request.placement;
        self.client
            .create_db_instance()
            .db_name(&request.db_name)
            .db_instance_identifier(&request.identifier)
            .allocated_storage(request.allocated_storage_gb)
            .max_allocated_storage(request.max_allocated_storage_gb)
            .db_instance_class(&placement.instance_class)
            .engine(&request.engine)
            .master_username(&request.master_username)
            .master_user_password(&request.master_password)
            .vpc_security_group_ids(&placement.security_group_id)
            .db_subnet_group_name(&placement.subnet_group_name)
            .backup_retention_period(request.backup_retention_days)
            .multi_az(placement.multi_az)
            .publicly_accessible(placement.publicly_accessible)
            .storage_type(&placement.storage_type)
            .deletion_protection(placement.deletion_protection)
            .send()
            .await
            .map_err(|e| fault("rds:CreateDBInstance", e))?;
        Ok(())
    }

    async fn restore_db_instance_from_snapshot(
        &self,
        request: &RestoreDbInstanceRequest,
    ) -> CloudResult<()> {
        let placement = &request.placement;
        self.client
            .restore_db_instance_from_db_snapshot()
            .db_instance_identifier(&request.identifier)
            .db_snapshot_identifier(&request.snapshot_id)
            .db_instance_class(&placement.instance_class)
            .engine(&request.engine)
            .multi_az(placement.multi_az)
            .publicly_accessible(placement.publicly_accessible)
            .storage_type(&placement.storage_type)
            .db_subnet_group_name(&placement.subnet_group_name)
            .deletion_protection(placement.deletion_protection)
            .vpc_security_group_ids(&placement.security_group_id)
            .send()
            .await
            .map_err(|e| fault("rds:RestoreDBInstanceFromDBSnapshot", e))?;
        Ok(())
    }

    async fn describe_db_subnet_group(&self, name: &str) -> CloudResult<DbSubnetGroupInfo> {
        let output = self
            .client
            .describe_db_subnet_groups()
            .db_subnet_group_name(name)
            .send()
            .await
            .map_err(|e| {
                classify("rds:DescribeDBSubnetGroups", name, e, |se| {
                    se.is_db_subnet_group_not_found_fault()
                })
            })?;

        let group = output
            .db_subnet_groups()
            .first()
            .ok_or_else(|| CloudError::not_found(name))?;

        Ok(DbSubnetGroupInfo {
            name: group.db_subnet_group_name().unwrap_or(name).to_string(),
            vpc_id: group.vpc_id().map(str::to_string),
            subnet_ids: group
                .subnets()
                .iter()
                .filter_map(|subnet| subnet.subnet_identifier().map(str::to_string))
                .collect(),
        })
    }

    async fn create_db_subnet_group(
        &self,
        name: &str,
        description: &str,
        subnet_ids: &[String],
    ) -> CloudResult<()> {
        self.client
            .create_db_subnet_group()
            .db_subnet_group_name(name)
            .db_subnet_group_description(description)
            .set_subnet_ids(Some(subnet_ids.to_vec()))
            .send()
            .await
            .map_err(|e| fault("rds:CreateDBSubnetGroup", e))?;
        Ok(())
    }

    async fn create_db_snapshot(&self, snapshot_id: &str, instance_id: &str) -> CloudResult<()> {
        self.client
            .create_db_snapshot()
            .db_snapshot_identifier(snapshot_id)
            .db_instance_identifier(instance_id)
            .send()
            .await
            .map_err(|e| fault("rds:CreateDBSnapshot", e))?;
        Ok(())
    }

    async fn describe_db_snapshot(
        &self,
        snapshot_id: &str,
        instance_id: Option<&str>,
    ) -> CloudResult<DbSnapshotInfo> {
        let output = self
            .client
            .describe_db_snapshots()
            .db_snapshot_identifier(snapshot_id)
            .set_db_instance_identifier(instance_id.map(str::to_string))
            .send()
            .await
            .map_err(|e| {
                classify("rds:DescribeDBSnapshots", snapshot_id, e, |se| {
                    se.is_db_snapshot_not_found_fault()
                })
            })?;

        let snapshot = output
            .db_snapshots()
            .first()
            .ok_or_else(|| CloudError::not_found(snapshot_id))?;

        Ok(DbSnapshotInfo {
            snapshot_id: snapshot
                .db_snapshot_identifier()
                .unwrap_or(snapshot_id)
                .to_string(),
            status: snapshot.status().unwrap_or("unknown").to_string(),
        })
    }
}

// ============================================================================
// IAM
// ============================================================================

pub struct AwsIdentity {
    client: aws_sdk_iam::Client,
}

fn role_info(operation: &'static str, role: Option<&aws_sdk_iam::types::Role>) -> CloudResult<RoleInfo> {
    let role = role.ok_or_else(|| missing_field(operation, "Role"))?;
    let name: Option<&str> = role.role_name().into();
    let arn: Option<&str> = role.arn().into();
    let trust_policy = role
        .assume_role_policy_document()
        .map(|encoded| {
            percent_encoding::percent_decode_str(encoded)
                .decode_utf8()
                .map(|decoded| decoded.into_owned())
                .map_err(|e| CloudError::fault(operation, format!("AssumeRolePolicyDocument: {}", e)))
        })
        .transpose()?;
    Ok(RoleInfo {
        name: name.ok_or_else(|| missing_field(operation, "RoleName"))?.to_string(),
        arn: arn.ok_or_else(|| missing_field(operation, "Arn"))?.to_string(),
        trust_policy,
    })
}

#[async_trait]
impl Identity for AwsIdentity {
    async fn get_role(&self, name: &str) -> CloudResult<RoleInfo> {
        let output = self
            .client
            .get_role()
            .role_name(name)
            .send()
            .await
            .map_err(|e| classify("iam:GetRole", name, e, |se| se.is_no_such_entity_exception()))?;

        role_info("iam:GetRole", output.role())
    }

    async fn create_role(&self, name: &str, trust_policy: &str) -> CloudResult<RoleInfo> {
        let output = self
            .client
            .create_role()
            .role_name(name)
            .assume_role_policy_document(trust_policy)
            .send()
            .await
            .map_err(|e| fault("iam:CreateRole", e))?;

        role_info("iam:CreateRole", output.role())
    }

    async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> CloudResult<()> {
        self.client
            .put_role_policy()
            .role_name(role_name)
            .policy_name(policy_name)
            .policy_document(policy_document)
            .send()
            .await
            .map_err(|e| fault("iam:PutRolePolicy", e))?;
        Ok(())
    }

    async fn update_assume_role_policy(&self, role_name: &str, policy_document: &str) -> CloudResult<()> {
        self.client
            .update_assume_role_policy()
            .role_name(role_name)
            .policy_document(policy_document)
            .send()
            .await
            .map_err(|e| fault("iam:UpdateAssumeRolePolicy", e))?;
        Ok(())
    }
}

// ============================================================================
// Secrets Manager
// ============================================================================

pub struct AwsSecretStore {
    client: aws_sdk_secretsmanager::Client,
}

#[async_trait]
impl SecretStore for AwsSecretStore {
    async fn describe_secret(&self, name: &str) -> CloudResult<String> {
        let output = self
            .client
            .describe_secret()
            .secret_id(name)
            .send()
            .await
            .map_err(|e| {
                classify("secretsmanager:DescribeSecret", name, e, |se| {
                    se.is_resource_not_found_exception()
                })
            })?;

        Ok(output.arn().unwrap_or(name).to_string())
    }

    async fn create_secret(
        &self,
        name: &str,
        description: &str,
        secret_string: &str,
    ) -> CloudResult<String> {
        let output = self
            .client
            .create_secret()
            .name(name)
            .description(description)
            .secret_string(secret_string)
            .send()
            .await
            .map_err(|e| fault("secretsmanager:CreateSecret", e))?;

        Ok(output.arn().unwrap_or(name).to_string())
    }

    async fn get_secret_value(&self, name: &str) -> CloudResult<String> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|e| {
                classify("secretsmanager:GetSecretValue", name, e, |se| {
                    se.is_resource_not_found_exception()
                })
            })?;

        output
            .secret_string()
            .map(str::to_string)
            .ok_or_else(|| missing_field("secretsmanager:GetSecretValue", "SecretString"))
    }

    async fn random_password(&self, policy: &PasswordPolicy) -> CloudResult<String> {
        let output = self
            .client
            .get_random_password()
            .password_length(policy.length)
            .exclude_numbers(policy.exclude_numbers)
            .exclude_punctuation(policy.exclude_punctuation)
            .exclude_uppercase(policy.exclude_uppercase)
            .exclude_lowercase(policy.exclude_lowercase)
            .include_space(policy.include_space)
            .send()
            .await
            .map_err(|e| fault("secretsmanager:GetRandomPassword", e))?;

        output
            .random_password()
            .map(str::to_string)
            .ok_or_else(|| missing_field("secretsmanager:GetRandomPassword", "RandomPassword"))
    }
}

// ============================================================================
// DataSync
// ============================================================================

pub struct AwsDataReplication {
    client: aws_sdk_datasync::Client,
}

#[async_trait]
impl DataReplication for AwsDataReplication {
    async fn create_s3_location(&self, bucket_arn: &str, role_arn: &str) -> CloudResult<String> {
        use aws_sdk_datasync::types::{S3Config, S3StorageClass};

        let s3_config = S3Config::builder()
            .bucket_access_role_arn(role_arn)
            .build()
            .map_err(|e| fault("datasync:CreateLocationS3", e))?;

        let output = self
            .client
            .create_location_s3()
            .subdirectory("")
            .s3_storage_class(S3StorageClass::Standard)
            .s3_bucket_arn(bucket_arn)
            .s3_config(s3_config)
            .send()
            .await
            .map_err(|e| fault("datasync:CreateLocationS3", e))?;

        output
            .location_arn()
            .map(str::to_string)
            .ok_or_else(|| missing_field("datasync:CreateLocationS3", "LocationArn"))
    }

    async fn create_task(&self, request: &CreateTaskRequest) -> CloudResult<String> {
        use aws_sdk_datasync::types::{
            Atime, Mtime, Options, OverwriteMode, PreserveDeletedFiles, TransferMode, VerifyMode,
        };

        let opts = &request.options;
        let options = Options::builder()
            .verify_mode(VerifyMode::from(opts.verify_mode.as_str()))
            .overwrite_mode(OverwriteMode::from(opts.overwrite_mode.as_str()))
            .atime(Atime::from(opts.atime.as_str()))
            .mtime(Mtime::from(opts.mtime.as_str()))
            .preserve_deleted_files(PreserveDeletedFiles::from(opts.preserve_deleted_files.as_str()))
            .transfer_mode(TransferMode::from(opts.transfer_mode.as_str()))
            .build();

        let output = self
            .client
            .create_task()
            .source_location_arn(&request.source_location_arn)
            .destination_location_arn(&request.destination_location_arn)
            .name(&request.name)
            .options(options)
            .send()
            .await
            .map_err(|e| fault("datasync:CreateTask", e))?;

        output
            .task_arn()
            .map(str::to_string)
            .ok_or_else(|| missing_field("datasync:CreateTask", "TaskArn"))
    }

    async fn list_tasks(&self) -> CloudResult<Vec<TaskSummary>> {
        let mut tasks = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_tasks()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| fault("datasync:ListTasks", e))?;

            tasks.extend(output.tasks().iter().filter_map(|task| {
                Some(TaskSummary {
                    arn: task.task_arn()?.to_string(),
                    name: task.name().map(str::to_string),
                })
            }));

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(tasks)
    }

    async fn start_task_execution(&self, task_arn: &str) -> CloudResult<String> {
        let output = self
            .client
            .start_task_execution()
            .task_arn(task_arn)
            .send()
            .await
            .map_err(|e| fault("datasync:StartTaskExecution", e))?;

        output
            .task_execution_arn()
            .map(str::to_string)
            .ok_or_else(|| missing_field("datasync:StartTaskExecution", "TaskExecutionArn"))
    }

    async fn describe_task_execution(&self, execution_arn: &str) -> CloudResult<TaskExecutionInfo> {
        let output = self
            .client
            .describe_task_execution()
            .task_execution_arn(execution_arn)
            .send()
            .await
            .map_err(|e| fault("datasync:DescribeTaskExecution", e))?;

        let status = output
            .status()
            .map(|status| status.as_str().to_string())
            .ok_or_else(|| missing_field("datasync:DescribeTaskExecution", "Status"))?;
        let estimated_files_to_transfer: Option<i64> = output.estimated_files_to_transfer().into();
        let estimated_bytes_to_transfer: Option<i64> = output.estimated_bytes_to_transfer().into();

        Ok(TaskExecutionInfo {
            execution_arn: execution_arn.to_string(),
            status,
            estimated_files_to_transfer,
            estimated_bytes_to_transfer,
        })
    }
}

// ============================================================================
// EKS
// ============================================================================

pub struct AwsClusterControl {
    client: aws_sdk_eks::Client,
}

#[async_trait]
impl ClusterControl for AwsClusterControl {
    async fn describe_cluster(&self, name: &str) -> CloudResult<ClusterInfo> {
        let output = self
            .client
            .describe_cluster()
            .name(name)
            .send()
            .await
            .map_err(|e| {
                classify("eks:DescribeCluster", name, e, |se| {
                    se.is_resource_not_found_exception()
                })
            })?;

        let cluster = output
            .cluster()
            .ok_or_else(|| missing_field("eks:DescribeCluster", "Cluster"))?;
        let vpc = cluster.resources_vpc_config();

        Ok(ClusterInfo {
            name: cluster.name().unwrap_or(name).to_string(),
            subnet_ids: vpc.map(|v| v.subnet_ids().to_vec()).unwrap_or_default(),
            security_group_id: vpc
                .and_then(|v| v.cluster_security_group_id())
                .map(str::to_string),
            endpoint: cluster.endpoint().map(str::to_string),
            version: cluster.version().map(str::to_string),
            oidc_issuer: cluster
                .identity()
                .and_then(|identity| identity.oidc())
                .and_then(|oidc| oidc.issuer())
                .map(str::to_string),
            certificate_authority: cluster
                .certificate_authority()
                .and_then(|ca| ca.data())
                .map(str::to_string),
        })
    }
}

// ============================================================================
// EC2
// ============================================================================

pub struct AwsNetwork {
    client: aws_sdk_ec2::Client,
}

#[async_trait]
impl Network for AwsNetwork {
    async fn describe_subnets(&self, subnet_ids: &[String]) -> CloudResult<Vec<SubnetInfo>> {
        let mut subnets = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .describe_subnets()
                .set_subnet_ids(Some(subnet_ids.to_vec()))
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| fault("ec2:DescribeSubnets", e))?;

            subnets.extend(output.subnets().iter().filter_map(|subnet| {
                Some(SubnetInfo {
                    subnet_id: subnet.subnet_id()?.trim().to_string(),
                    tags: subnet
                        .tags()
                        .iter()
                        .map(|tag| {
                            SubnetTag::new(tag.key().unwrap_or_default(), tag.value().unwrap_or_default())
                        })
                        .collect(),
                })
            }));

            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(subnets)
    }

    async fn describe_vpc_cidr(&self, vpc_id: &str) -> CloudResult<String> {
        let output = self
            .client
            .describe_vpcs()
            .vpc_ids(vpc_id)
            .send()
            .await
            .map_err(|e| fault("ec2:DescribeVpcs", e))?;

        output
            .vpcs()
            .first()
            .and_then(|vpc| vpc.cidr_block())
            .map(str::to_string)
            .ok_or_else(|| CloudError::not_found(vpc_id))
    }
}

// ============================================================================
// EFS
// ============================================================================

pub struct AwsFileStorage {
    client: aws_sdk_efs::Client,
}

#[async_trait]
impl FileStorage for AwsFileStorage {
    async fn find_file_system(&self, name: &str) -> CloudResult<Option<String>> {
        let mut marker: Option<String> = None;

        loop {
            let output = self
                .client
                .describe_file_systems()
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| fault("efs:DescribeFileSystems", e))?;

            for fs in output.file_systems() {
                if fs.name() == Some(name) {
                    let id: Option<&str> = fs.file_system_id().into();
                    return Ok(id.map(str::to_string));
                }
            }

            match output.next_marker() {
                Some(next) => marker = Some(next.to_string()),
                None => return Ok(None),
            }
        }
    }
}

//! Clone bucket activity
//!
//! Copies every object of the source bucket into the target bucket with a
//! one-off DataSync task. A new task is created on every invocation.

use crate::activity_names::activities;
use crate::activity_types::CloneBucketInput;
use crate::activities::ensure_replication_role::bucket_arn;
use crate::cloud::{CreateTaskRequest, TaskExecutionInfo, TransferOptions};
use crate::context::ActivityContext;
use crate::error::{ProvisionError, Result};
use crate::poller::{wait_until, PollOutcome};
use storeshift_models::{ReplicationStatus, ReplicationTask, ResourceSpec};

/// Activity name for scheduling
pub const NAME: &str = activities::CLONE_BUCKET;

/// Classify one execution status; unknown statuses keep the wait going
pub fn classify(info: &TaskExecutionInfo) -> PollOutcome<ReplicationStatus> {
    match ReplicationStatus::parse(&info.status) {
        Some(ReplicationStatus::Success) => PollOutcome::Satisfied(ReplicationStatus::Success),
        Some(ReplicationStatus::Error) => PollOutcome::Fatal(info.status.clone()),
        _ => PollOutcome::Pending(info.status.clone()),
    }
}

fn progress(info: &TaskExecutionInfo) -> String {
    let files = info
        .estimated_files_to_transfer
        .map_or_else(|| "?".to_string(), |n| n.to_string());
    let bytes = info
        .estimated_bytes_to_transfer
        .map_or_else(|| "?".to_string(), |n| n.to_string());
    format!("{} (estimated {} files, {} bytes)", info.status, files, bytes)
}

pub async fn activity(ctx: ActivityContext, input: CloneBucketInput) -> Result<ReplicationTask> {
    // 1. Target must already be provisioned
    if !ctx.prober().bucket_exists(&input.target_bucket).await? {
        return Err(ProvisionError::missing(
            ResourceSpec::bucket(&input.target_bucket, ctx.region()),
            "the clone target bucket must be created first",
        ));
    }

    let datasync = ctx.cloud().datasync.clone();

    // 2. Register both locations
    ctx.trace_info(format!(
        "Registering DataSync locations for '{}' -> '{}'",
        input.source_bucket, input.target_bucket
    ));
    let source_location = datasync
        .create_s3_location(&bucket_arn(&input.source_bucket), &input.role_arn)
        .await?;
    let target_location = datasync
        .create_s3_location(&bucket_arn(&input.target_bucket), &input.role_arn)
        .await?;

    // 3. Create and start the task
    let task_name = ReplicationTask::task_name(ctx.utcnow());
    let task_id = datasync
        .create_task(&CreateTaskRequest {
            name: task_name.clone(),
            source_location_arn: source_location.clone(),
            destination_location_arn: target_location.clone(),
            options: TransferOptions::full_clone(),
        })
        .await?;
    ctx.trace_info(format!("DataSync task '{}' created: {}", task_name, task_id));

    let execution_id = datasync.start_task_execution(&task_id).await?;
    ctx.trace_info(format!("Started task execution {}", execution_id));

    // 4. Wait for the copy to finish
    let what = format!("replication {} -> {}", input.source_bucket, input.target_bucket);
    let status = wait_until(&what, &input.wait, || {
        let datasync = datasync.clone();
        let execution_id = execution_id.clone();
        let ctx = ctx.clone();
        async move {
            let info = datasync.describe_task_execution(&execution_id).await?;
            ctx.trace_info(format!("Clone status: {}", progress(&info)));
            Ok(classify(&info))
        }
    })
    .await?;

    ctx.trace_info(format!(
        "Bucket '{}' cloned into '{}'",
        input.source_bucket, input.target_bucket
    ));

    Ok(ReplicationTask {
        source_location,
        target_location,
        task_id,
        execution_id,
        status,
    })
}

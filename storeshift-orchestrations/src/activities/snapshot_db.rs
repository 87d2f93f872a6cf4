//! Snapshot DB activity

use crate::activity_names::activities;
use crate::activity_types::SnapshotDbInput;
use crate::context::ActivityContext;
use crate::error::{ProvisionError, Result};
use crate::poller::{wait_until, PollOutcome};
use storeshift_models::{ResourceSpec, SnapshotJob, SnapshotStatus};

/// Activity name for scheduling
pub const NAME: &str = activities::SNAPSHOT_DB;

pub fn classify(status: &str) -> PollOutcome<SnapshotStatus> {
    match SnapshotStatus::parse(status) {
        SnapshotStatus::Available => PollOutcome::Satisfied(SnapshotStatus::Available),
        SnapshotStatus::Failed => PollOutcome::Fatal(status.to_string()),
        _ => PollOutcome::Pending(status.to_string()),
    }
}

pub async fn activity(ctx: ActivityContext, input: SnapshotDbInput) -> Result<SnapshotJob> {
    // 1. Source instance must exist
    if !ctx.prober().db_instance_exists(&input.source_instance).await? {
        return Err(ProvisionError::missing(
            ResourceSpec::db_instance(&input.source_instance, ctx.region()),
            "cannot snapshot an instance that does not exist",
        ));
    }

    // 2. Create
    let mut job = SnapshotJob::new(&input.source_instance, ctx.utcnow());
    ctx.trace_info(format!(
        "Creating snapshot '{}' of '{}'",
        job.snapshot_id, job.source_instance_id
    ));
    let rds = ctx.cloud().rds.clone();
    rds.create_db_snapshot(&job.snapshot_id, &job.source_instance_id)
        .await?;

    // 3. Wait until available
    let what = format!("snapshot {}", job.snapshot_id);
    let (snapshot_id, instance_id) = (job.snapshot_id.clone(), job.source_instance_id.clone());
    job.status = wait_until(&what, &input.wait, || {
        let rds = rds.clone();
        let snapshot_id = snapshot_id.clone();
        let instance_id = instance_id.clone();
        async move {
            let info = rds
                .describe_db_snapshot(&snapshot_id, Some(&instance_id))
                .await?;
            Ok(classify(&info.status))
        }
    })
    .await?;

    ctx.trace_info(format!("Snapshot '{}' is available", job.snapshot_id));
    Ok(job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::fake::FakeCloud;
    use crate::testing::Harness;
    use storeshift_models::WaitPolicy;

    async fn snapshot(cloud: &FakeCloud, wait: WaitPolicy) -> Result<SnapshotJob> {
        Harness::new(cloud.clone())
            .context("test")
            .schedule_activity(
                NAME,
                SnapshotDbInput {
                    source_instance: "kubeflow-db".to_string(),
                    wait,
                },
                activity,
            )
            .await
    }

    #[test]
    fn test_terminal_statuses_other_than_available_are_fatal() {
        assert_eq!(classify("available"), PollOutcome::Satisfied(SnapshotStatus::Available));
        assert!(matches!(classify("failed"), PollOutcome::Fatal(_)));
        assert!(matches!(classify("deleted"), PollOutcome::Fatal(_)));
        assert!(matches!(classify("creating"), PollOutcome::Pending(_)));
        assert!(matches!(classify("copying"), PollOutcome::Pending(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_becomes_available() {
        let cloud = FakeCloud::new("us-west-2");
        cloud.add_instance("kubeflow-db", "available");
        cloud.script_snapshot(&["creating", "creating", "available"]);

        let job = snapshot(&cloud, WaitPolicy::SNAPSHOT).await.unwrap();

        assert!(job.snapshot_id.starts_with("kf-rds-snap-"));
        assert_eq!(job.status, SnapshotStatus::Available);
        assert_eq!(cloud.count("rds:create_db_snapshot"), 1);
        assert_eq!(cloud.count("rds:describe_db_snapshot"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_snapshot_times_out() {
        let cloud = FakeCloud::new("us-west-2");
        cloud.add_instance("kubeflow-db", "available");
        cloud.script_snapshot(&["creating"]);

        let err = snapshot(&cloud, WaitPolicy::new(10, 60)).await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_missing_source_instance() {
        let cloud = FakeCloud::new("us-west-2");

        let err = snapshot(&cloud, WaitPolicy::SNAPSHOT).await.unwrap_err();
        assert!(matches!(err, ProvisionError::MissingDependency { .. }));
        assert_eq!(cloud.count("rds:create_db_snapshot"), 0);
    }
}

//! Create S3 bucket activity

use crate::activity_names::activities;
use crate::activity_types::{CreateBucketInput, CreateBucketOutput};
use crate::cloud::CreateBucketRequest;
use crate::context::ActivityContext;
use crate::error::Result;

/// Activity name for scheduling
pub const NAME: &str = activities::CREATE_BUCKET;

/// Region where S3 rejects an explicit LocationConstraint
const DEFAULT_S3_REGION: &str = "us-east-1";

pub fn create_request(bucket: &str, region: &str) -> CreateBucketRequest {
    CreateBucketRequest {
        bucket: bucket.to_string(),
        location_constraint: (region != DEFAULT_S3_REGION).then(|| region.to_string()),
    }
}

pub async fn activity(ctx: ActivityContext, input: CreateBucketInput) -> Result<CreateBucketOutput> {
    // 1. Check idempotency
    if ctx.prober().bucket_exists(&input.bucket).await? {
        ctx.trace_info(format!(
            "Skipping S3 bucket creation, bucket '{}' already exists!",
            input.bucket
        ));
        return Ok(CreateBucketOutput {
            bucket: input.bucket,
            created: false,
        });
    }

    // 2. Create
    ctx.trace_info(format!("Creating S3 bucket '{}' in {}", input.bucket, input.region));
    ctx.cloud()
        .s3
        .create_bucket(&create_request(&input.bucket, &input.region))
        .await?;
    ctx.trace_info("S3 bucket created!");

    Ok(CreateBucketOutput {
        bucket: input.bucket,
        created: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::fake::FakeCloud;
    use crate::testing::Harness;

    #[test]
    fn test_location_constraint_omitted_only_in_us_east_1() {
        assert_eq!(create_request("b", "us-east-1").location_constraint, None);
        assert_eq!(
            create_request("b", "us-west-2").location_constraint.as_deref(),
            Some("us-west-2")
        );
        assert_eq!(
            create_request("b", "eu-central-1").location_constraint.as_deref(),
            Some("eu-central-1")
        );
    }

    #[tokio::test]
    async fn test_second_run_skips_existing_bucket() {
        let cloud = FakeCloud::new("us-west-2");
        let harness = Harness::new(cloud.clone());
        let ctx = harness.context("test");
        let input = CreateBucketInput {
            bucket: "kf-artifacts".to_string(),
            region: "us-west-2".to_string(),
        };

        let first = ctx.schedule_activity(NAME, input.clone(), activity).await.unwrap();
        let second = ctx.schedule_activity(NAME, input, activity).await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(cloud.count("s3:create_bucket"), 1);
    }
}

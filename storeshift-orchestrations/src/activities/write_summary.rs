//! Write summary activity

use crate::activity_names::activities;
use crate::activity_types::WriteSummaryOutput;
use crate::context::ActivityContext;
use crate::error::Result;
use storeshift_models::MigrationSummary;

/// Activity name for scheduling
pub const NAME: &str = activities::WRITE_SUMMARY;

pub async fn activity(ctx: ActivityContext, input: MigrationSummary) -> Result<WriteSummaryOutput> {
    let path = ctx.publisher().write_summary(&input)?;
    ctx.trace_info(format!("Summary written to {}", path.display()));
    Ok(WriteSummaryOutput {
        path: path.display().to_string(),
    })
}

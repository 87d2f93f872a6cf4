//! Probe resource activity

use crate::activity_names::activities;
use crate::activity_types::{ProbeResourceInput, ProbeResourceOutput};
use crate::context::ActivityContext;
use crate::error::Result;

/// Activity name for scheduling
pub const NAME: &str = activities::PROBE_RESOURCE;

pub async fn activity(ctx: ActivityContext, input: ProbeResourceInput) -> Result<ProbeResourceOutput> {
    let exists = ctx.prober().exists(&input.resource).await?;
    ctx.trace_info(format!(
        "{} {}",
        input.resource,
        if exists { "exists" } else { "does not exist" }
    ));

    Ok(ProbeResourceOutput {
        resource: input.resource,
        exists,
    })
}

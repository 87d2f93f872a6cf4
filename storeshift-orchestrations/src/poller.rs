//! Bounded wait-until-condition primitive
//!
//! A probe is called at a fixed interval until it reports `Satisfied` or
//! `Fatal`, or until the policy's timeout runs out. The final sleep is
//! clipped to the remaining budget so the last probe lands on the deadline.
//! Remote errors returned by the probe propagate unchanged.

use crate::error::{ProvisionError, Result};
use std::future::Future;
use storeshift_models::WaitPolicy;
use tokio::time::{sleep, Instant};

/// Result of a single probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// Not there yet; carries the observed status for logging
    Pending(String),
    Satisfied(T),
    /// Terminal failure status; stops polling immediately
    Fatal(String),
}

pub async fn wait_until<T, F, Fut>(what: &str, policy: &WaitPolicy, mut probe: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollOutcome<T>>>,
{
    let started = Instant::now();
    let deadline = started + policy.timeout();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        match probe().await? {
            PollOutcome::Satisfied(value) => {
                tracing::debug!(
                    what,
                    attempt,
                    elapsed_secs = started.elapsed().as_secs(),
                    "condition satisfied"
                );
                return Ok(value);
            }
            PollOutcome::Fatal(status) => {
                return Err(ProvisionError::TerminalStatus {
                    what: what.to_string(),
                    status,
                });
            }
            PollOutcome::Pending(detail) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(ProvisionError::Timeout {
                        what: what.to_string(),
                        waited: policy.timeout(),
                    });
                }
                tracing::debug!(what, attempt, status = %detail, "still waiting");
                sleep(policy.poll_interval().min(deadline - now)).await;
            }
        }
    }
}

//! Execution contexts for orchestrations and activities
//!
//! Orchestrations run strictly sequentially: `schedule_activity` awaits the
//! activity to completion before returning, inside an `activity` span so
//! every event it emits carries the activity name.

use crate::addons::ClusterAddons;
use crate::cloud::CloudClients;
use crate::error::Result;
use crate::prober::Prober;
use crate::publish::ConfigPublisher;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Collaborators shared by every step of a run
#[derive(Clone)]
pub struct Services {
    pub cloud: CloudClients,
    pub addons: Arc<dyn ClusterAddons>,
    pub publisher: Arc<dyn ConfigPublisher>,
}

impl Services {
    pub fn new(
        cloud: CloudClients,
        addons: Arc<dyn ClusterAddons>,
        publisher: Arc<dyn ConfigPublisher>,
    ) -> Self {
        Self {
            cloud,
            addons,
            publisher,
        }
    }
}

#[derive(Clone)]
pub struct OrchestrationContext {
    name: &'static str,
    services: Services,
}

impl OrchestrationContext {
    pub fn new(name: &'static str, services: Services) -> Self {
        Self { name, services }
    }

    pub fn trace_info(&self, message: impl AsRef<str>) {
        tracing::info!(orchestration = self.name, "{}", message.as_ref());
    }

    /// Fixed delay between steps (IAM propagation and the like)
    pub async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// Run `activity` to completion and return its output
    pub async fn schedule_activity<I, O, F, Fut>(
        &self,
        name: &'static str,
        input: I,
        activity: F,
    ) -> Result<O>
    where
        F: FnOnce(ActivityContext, I) -> Fut,
        Fut: Future<Output = Result<O>>,
    {
        let ctx = ActivityContext {
            orchestration: self.name,
            services: self.services.clone(),
        };

        let span = tracing::info_span!("activity", name);
        async move {
            tracing::debug!("activity started");
            let result = activity(ctx, input).await;
            match &result {
                Ok(_) => tracing::debug!("activity completed"),
                Err(e) => tracing::error!(error = %e, "activity failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Context handed to a single activity invocation
#[derive(Clone)]
pub struct ActivityContext {
    orchestration: &'static str,
    services: Services,
}

impl ActivityContext {
    pub fn cloud(&self) -> &CloudClients {
        &self.services.cloud
    }

    pub fn addons(&self) -> &dyn ClusterAddons {
        self.services.addons.as_ref()
    }

    pub fn publisher(&self) -> &dyn ConfigPublisher {
        self.services.publisher.as_ref()
    }

    pub fn prober(&self) -> Prober<'_> {
        Prober::new(&self.services.cloud)
    }

    pub fn region(&self) -> &str {
        &self.services.cloud.region
    }

    pub fn utcnow(&self) -> DateTime<Utc> {
        Utc::now()
    }

    pub fn trace_info(&self, message: impl AsRef<str>) {
        tracing::info!(orchestration = self.orchestration, "{}", message.as_ref());
    }

    pub fn trace_warn(&self, message: impl AsRef<str>) {
        tracing::warn!(orchestration = self.orchestration, "{}", message.as_ref());
    }
}

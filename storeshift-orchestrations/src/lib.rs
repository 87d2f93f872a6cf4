//! Storeshift Orchestrations - provisioning and migration of Kubeflow's AWS backends
//!
//! This crate provides orchestrations (ordered workflows) and activities
//! (atomic, idempotent steps) that create an S3 bucket and an RDS MySQL
//! instance for Kubeflow on EKS, store their credentials in Secrets Manager
//! and migrate both to a new cluster.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use storeshift_orchestrations::addons::KubeAddons;
//! use storeshift_orchestrations::cloud::CloudClients;
//! use storeshift_orchestrations::context::{OrchestrationContext, Services};
//! use storeshift_orchestrations::names::orchestrations;
//! use storeshift_orchestrations::orchestrations::export_vars::export_vars_orchestration;
//! use storeshift_orchestrations::publish::{FilePublisher, PublishLayout};
//! use storeshift_orchestrations::ExportVarsInput;
//!
//! # async fn example(input: ExportVarsInput) -> anyhow::Result<()> {
//! let services = Services::new(
//!     CloudClients::connect(&input.region).await,
//!     Arc::new(KubeAddons::new()),
//!     Arc::new(FilePublisher::new(PublishLayout::new("."), "metadata.yaml")),
//! );
//! let ctx = OrchestrationContext::new(orchestrations::EXPORT_VARS, services);
//! let output = export_vars_orchestration(ctx, input).await?;
//! println!("{}", output.cluster_tfvars);
//! # Ok(())
//! # }
//! ```

// Orchestration exports
pub mod names;
pub mod types;
pub mod orchestrations;

// Activity exports
pub mod activity_names;
pub mod activity_types;
pub mod activities;

// Infrastructure
pub mod addons;
pub mod cloud;
pub mod context;
pub mod error;
pub mod k8s_client;
pub mod poller;
pub mod prober;
pub mod publish;
pub mod subnets;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types for convenience
pub use activity_types::*;
pub use error::{CloudError, ProvisionError};
pub use types::*;

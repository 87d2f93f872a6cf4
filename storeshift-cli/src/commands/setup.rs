use anyhow::{Context, Result};
use storeshift_orchestrations::context::OrchestrationContext;
use storeshift_orchestrations::names::orchestrations;
use storeshift_orchestrations::orchestrations::setup::setup_orchestration;
use storeshift_orchestrations::{PriorEnvironment, ServiceAccountSettings, SetupInput, SetupOutput};

use super::{created, print_replication};
use crate::cli::SetupArgs;
use crate::config::StoreshiftConfig;

pub async fn run(config: &StoreshiftConfig, args: SetupArgs) -> Result<()> {
    let output_format = args.output.clone();
    let input = build_input(config, args)?;

    tracing::info!(
        cluster = %input.cluster_name,
        region = %input.region,
        upgrade = input.prior.is_some(),
        "Setting up S3 and RDS"
    );

    let services = config.services(&input.region).await;
    let ctx = OrchestrationContext::new(orchestrations::SETUP, services);
    let output = setup_orchestration(ctx, input)
        .await
        .context("Setup failed")?;

    if output_format == "json" {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_table(&output);
    }

    Ok(())
}

fn build_input(config: &StoreshiftConfig, args: SetupArgs) -> Result<SetupInput> {
    let prior = if args.upgrade {
        Some(PriorEnvironment {
            bucket: args.prior_bucket.context("--prior-bucket is required with --upgrade")?,
            db_instance: args
                .prior_database
                .context("--prior-database is required with --upgrade")?,
            rds_secret_name: args
                .prior_rds_secret_name
                .context("--prior-rds-secret-name is required with --upgrade")?,
        })
    } else {
        None
    };

    Ok(SetupInput {
        database: args
            .database
            .settings(&args.db_instance_name, &args.db_subnet_group_name),
        region: args.target.region,
        cluster_name: args.target.cluster,
        bucket: args.bucket,
        s3_access_key_id: args.s3_access_key_id,
        s3_secret_access_key: args.s3_secret_access_key,
        s3_secret_name: args.s3_secret_name,
        rds_secret_name: args.rds_secret_name,
        prior,
        replication_role_name: args.datasync_role_name,
        service_account: ServiceAccountSettings::default(),
        waits: config.waits.clone(),
    })
}

fn print_table(output: &SetupOutput) {
    println!("S3 and RDS setup complete");
    println!("{}", "=".repeat(60));
    println!();
    println!("S3:");
    println!("  Bucket:             {}", created(output.bucket_created));
    println!("  Secret:             {}", created(output.s3_secret_created));
    if let Some(replication) = &output.replication {
        println!();
        println!("Clone:");
        print_replication(replication);
    }
    println!();
    println!("RDS:");
    println!("  Instance:           {}", created(output.db_instance_created));
    println!("  Secret:             {}", created(output.rds_secret_created));
    if let Some(snapshot) = &output.snapshot_id {
        println!("  Restored from:      {}", snapshot);
    }
    println!("  Host:               {}", output.db_host);
    println!();
    println!("Summary written to {}", output.summary_path);
}

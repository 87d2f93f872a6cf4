use anyhow::{Context, Result};
use storeshift_orchestrations::context::OrchestrationContext;
use storeshift_orchestrations::names::orchestrations;
use storeshift_orchestrations::orchestrations::upgrade::upgrade_orchestration;
use storeshift_orchestrations::{ServiceAccountSettings, UpgradeInput, UpgradeOutput};

use super::{created, print_replication};
use crate::cli::UpgradeArgs;
use crate::config::StoreshiftConfig;

pub async fn run(config: &StoreshiftConfig, args: UpgradeArgs) -> Result<()> {
    let output_format = args.output.clone();
    let input = build_input(config, args);

    tracing::info!(
        cluster = %input.cluster_blue,
        region = %input.region,
        "Upgrading S3 and RDS to the blue cluster"
    );

    let services = config.services(&input.region).await;
    let ctx = OrchestrationContext::new(orchestrations::UPGRADE, services);
    let output = upgrade_orchestration(ctx, input)
        .await
        .context("Upgrade failed")?;

    if output_format == "json" {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_table(&output);
    }

    Ok(())
}

fn build_input(config: &StoreshiftConfig, args: UpgradeArgs) -> UpgradeInput {
    UpgradeInput {
        database: args
            .database
            .settings(&args.db_instance_blue, &args.db_subnet_group_name),
        region: args.region,
        cluster_blue: args.cluster_blue,
        bucket_green: args.bucket_green,
        bucket_blue: args.bucket_blue,
        db_instance_green: args.db_instance_green,
        rds_secret_name: args.rds_secret_name,
        s3_secret_name: args.s3_secret_name,
        replication_role_name: args.datasync_role_name,
        service_account: ServiceAccountSettings::default(),
        waits: config.waits.clone(),
    }
}

fn print_table(output: &UpgradeOutput) {
    println!("RDS S3 upgrade complete");
    println!("{}", "=".repeat(60));
    println!();
    println!("S3:");
    println!("  Blue bucket:        {}", created(output.bucket_created));
    print_replication(&output.replication);
    println!();
    println!("RDS:");
    println!("  Blue instance:      {}", created(output.db_instance_created));
    if let Some(snapshot) = &output.snapshot_id {
        println!("  Restored from:      {}", snapshot);
    }
    println!("  Host:               {}", output.db_host);
    if !output.profile_roles_updated.is_empty() {
        println!();
        println!("Profile roles now trusting the blue cluster:");
        for role in &output.profile_roles_updated {
            println!("  {}", role);
        }
    }
    println!();
    println!("Summary written to {}", output.summary_path);
}

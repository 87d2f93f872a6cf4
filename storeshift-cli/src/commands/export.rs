use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use storeshift_orchestrations::context::OrchestrationContext;
use storeshift_orchestrations::names::orchestrations;
use storeshift_orchestrations::orchestrations::export_vars::{
    export_vars_orchestration, CLUSTER_TFVARS_FILE, UPGRADE_TFVARS_FILE,
};
use storeshift_orchestrations::{ExportVarsInput, ExportVarsOutput};

use crate::cli::ExportVarsArgs;
use crate::config::StoreshiftConfig;

pub async fn run(config: &StoreshiftConfig, args: ExportVarsArgs) -> Result<()> {
    let input = ExportVarsInput {
        region: args.target.region,
        cluster_name: args.target.cluster,
        bucket: args.bucket,
        efs_name: args.efs_name,
        db_instance: args.db_instance_name,
        rds_secret_name: args.rds_secret_name,
        s3_secret_name: args.s3_secret_name,
    };

    let services = config.services(&input.region).await;
    let ctx = OrchestrationContext::new(orchestrations::EXPORT_VARS, services);
    let output = export_vars_orchestration(ctx, input)
        .await
        .context("Collecting Terraform variables failed")?;

    for path in write_tfvars(&args.output_dir, &output)? {
        println!("Wrote {}", path.display());
    }

    Ok(())
}

fn write_tfvars(dir: &Path, output: &ExportVarsOutput) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let files = [
        (CLUSTER_TFVARS_FILE, &output.cluster_tfvars),
        (UPGRADE_TFVARS_FILE, &output.upgrade_tfvars),
    ];
    let mut written = Vec::with_capacity(files.len());
    for (name, content) in files {
        let path = dir.join(name);
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Wrote tfvars");
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_tfvars_creates_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("terraform");
        let output = ExportVarsOutput {
            cluster_tfvars: "eks_cluster_id = \"kf\"\n".to_string(),
            upgrade_tfvars: "src_vpc_id = \"vpc-1\"\n".to_string(),
        };

        let written = write_tfvars(&out, &output).unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(
            std::fs::read_to_string(out.join("sample.auto.tfvars")).unwrap(),
            output.cluster_tfvars
        );
        assert_eq!(
            std::fs::read_to_string(out.join("upgrade.tfvars")).unwrap(),
            output.upgrade_tfvars
        );
    }
}

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use storeshift_orchestrations::{
    DatabaseSettings, UpgradeInput, DEFAULT_RDS_SECRET_NAME, DEFAULT_REPLICATION_ROLE_NAME,
    DEFAULT_S3_SECRET_NAME,
};

/// Storeshift - S3 and RDS backends for Kubeflow on EKS
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub mode: Mode,
}

impl Args {
    /// Load `.env` (from `env_file`, or searched upward from the working
    /// directory) into the process environment, then parse `argv`, so
    /// `env = ...` arguments see values defined there
    pub fn load_from<I, T>(env_file: Option<&Path>, argv: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let loaded = match env_file {
            Some(path) => dotenvy::from_path(path),
            None => dotenvy::dotenv().map(|_| ()),
        };
        if let Err(e) = loaded {
            if !e.not_found() {
                eprintln!("Ignoring unreadable .env file: {}", e);
            }
        }
        Self::try_parse_from(argv)
    }
}

#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Create the S3 bucket, RDS instance and their secrets for a cluster
    Setup(SetupArgs),

    /// Move the backends of a running installation to a new cluster
    Upgrade(UpgradeArgs),

    /// Write the Terraform variable files describing an installation
    ExportVars(ExportVarsArgs),

    /// Print the Mermaid flow diagram of an orchestration
    Flow {
        /// Orchestration name (setup, upgrade, export-vars); all if omitted
        name: Option<String>,
    },
}

/// Options shared by every command that touches a cluster
#[derive(ClapArgs, Debug, Clone)]
pub struct Target {
    /// AWS region of the cluster
    #[arg(long)]
    pub region: String,

    /// EKS cluster name
    #[arg(long)]
    pub cluster: String,
}

/// Shape of the RDS instance to create
#[derive(ClapArgs, Debug, Clone)]
pub struct DatabaseArgs {
    /// Master user of the instance
    #[arg(long, default_value = "admin")]
    pub db_root_user: String,

    /// Master password (generated if omitted)
    #[arg(long)]
    pub db_root_password: Option<String>,

    /// Name of the metadata database
    #[arg(long, default_value = "kubeflow")]
    pub db_name: String,

    /// Instance class
    #[arg(long, default_value = "db.m5.large")]
    pub db_instance_type: String,

    /// Storage type
    #[arg(long, default_value = "gp2")]
    pub db_storage_type: String,

    /// Initial storage in GB
    #[arg(long, default_value_t = 50)]
    pub db_initial_storage: i32,

    /// Storage autoscaling ceiling in GB
    #[arg(long, default_value_t = 1000)]
    pub db_max_storage: i32,

    /// Backup retention in days
    #[arg(long, default_value_t = 7)]
    pub db_backup_retention_period: i32,
}

impl DatabaseArgs {
    pub fn settings(&self, instance_name: &str, subnet_group_name: &str) -> DatabaseSettings {
        DatabaseSettings {
            instance_name: instance_name.to_string(),
            db_name: self.db_name.clone(),
            root_user: self.db_root_user.clone(),
            root_password: self.db_root_password.clone(),
            instance_class: self.db_instance_type.clone(),
            storage_type: self.db_storage_type.clone(),
            initial_storage_gb: self.db_initial_storage,
            max_storage_gb: self.db_max_storage,
            backup_retention_days: self.db_backup_retention_period,
            subnet_group_name: subnet_group_name.to_string(),
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct SetupArgs {
    #[command(flatten)]
    pub target: Target,

    /// S3 bucket for pipeline artifacts
    #[arg(long)]
    pub bucket: String,

    /// Access key the pipelines use to reach S3
    #[arg(long, env = "S3_AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub s3_access_key_id: String,

    /// Secret key the pipelines use to reach S3
    #[arg(long, env = "S3_AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub s3_secret_access_key: String,

    /// RDS instance identifier
    #[arg(long, default_value = "kubeflow-db")]
    pub db_instance_name: String,

    /// RDS subnet group name
    #[arg(long, default_value = "kubeflow-db-subnet-group")]
    pub db_subnet_group_name: String,

    #[command(flatten)]
    pub database: DatabaseArgs,

    /// Secrets Manager name for the RDS credentials
    #[arg(long, default_value = DEFAULT_RDS_SECRET_NAME)]
    pub rds_secret_name: String,

    /// Secrets Manager name for the S3 credentials
    #[arg(long, default_value = DEFAULT_S3_SECRET_NAME)]
    pub s3_secret_name: String,

    /// Seed the new backends from a prior installation
    #[arg(long)]
    pub upgrade: bool,

    /// Bucket of the prior installation
    #[arg(long, required_if_eq("upgrade", "true"))]
    pub prior_bucket: Option<String>,

    /// RDS instance of the prior installation
    #[arg(long, required_if_eq("upgrade", "true"))]
    pub prior_database: Option<String>,

    /// Secret holding the prior instance's credentials
    #[arg(long, required_if_eq("upgrade", "true"))]
    pub prior_rds_secret_name: Option<String>,

    /// IAM role DataSync assumes when cloning the bucket
    #[arg(long, default_value = DEFAULT_REPLICATION_ROLE_NAME)]
    pub datasync_role_name: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table")]
    pub output: String,
}

#[derive(ClapArgs, Debug)]
pub struct UpgradeArgs {
    /// AWS region of both clusters
    #[arg(long)]
    pub region: String,

    /// Cluster the backends move to
    #[arg(long)]
    pub cluster_blue: String,

    /// Bucket of the running installation
    #[arg(long)]
    pub bucket_green: String,

    /// Bucket for the new installation
    #[arg(long)]
    pub bucket_blue: String,

    /// RDS instance of the running installation
    #[arg(long, default_value = "kubeflow-db")]
    pub db_instance_green: String,

    /// RDS instance for the new installation
    #[arg(long, default_value = UpgradeInput::DEFAULT_BLUE_INSTANCE)]
    pub db_instance_blue: String,

    /// RDS subnet group for the new installation
    #[arg(long, default_value = UpgradeInput::DEFAULT_BLUE_SUBNET_GROUP)]
    pub db_subnet_group_name: String,

    #[command(flatten)]
    pub database: DatabaseArgs,

    /// Secret holding the RDS credentials (shared by both installations)
    #[arg(long, default_value = DEFAULT_RDS_SECRET_NAME)]
    pub rds_secret_name: String,

    /// Secret holding the S3 credentials (shared by both installations)
    #[arg(long, default_value = DEFAULT_S3_SECRET_NAME)]
    pub s3_secret_name: String,

    /// IAM role DataSync assumes when cloning the bucket
    #[arg(long, default_value = DEFAULT_REPLICATION_ROLE_NAME)]
    pub datasync_role_name: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table")]
    pub output: String,
}

#[derive(ClapArgs, Debug)]
pub struct ExportVarsArgs {
    #[command(flatten)]
    pub target: Target,

    /// S3 bucket of the installation
    #[arg(long)]
    pub bucket: String,

    /// Name tag of the EFS file system
    #[arg(long, default_value = "kubeflow-efs")]
    pub efs_name: String,

    /// RDS instance of the installation
    #[arg(long, default_value = "kubeflow-db")]
    pub db_instance_name: String,

    #[arg(long, default_value = DEFAULT_RDS_SECRET_NAME)]
    pub rds_secret_name: String,

    #[arg(long, default_value = DEFAULT_S3_SECRET_NAME)]
    pub s3_secret_name: String,

    /// Directory the tfvars files are written to
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETUP: &[&str] = &[
        "storeshift",
        "setup",
        "--region",
        "us-west-2",
        "--cluster",
        "kf",
        "--bucket",
        "kf-artifacts",
        "--s3-access-key-id",
        "AKIA",
        "--s3-secret-access-key",
        "secret",
    ];

    #[test]
    fn test_setup_defaults() {
        let args = Args::try_parse_from(SETUP).unwrap();
        let Mode::Setup(setup) = args.mode else {
            panic!("expected setup");
        };

        assert!(!setup.upgrade);
        assert_eq!(setup.rds_secret_name, "rds-secret");
        assert_eq!(setup.datasync_role_name, "datasyncrolekubeflow");

        let settings = setup
            .database
            .settings(&setup.db_instance_name, &setup.db_subnet_group_name);
        assert_eq!(settings, DatabaseSettings::default());
    }

    #[test]
    fn test_upgrade_flag_requires_prior_environment() {
        let mut argv = SETUP.to_vec();
        argv.push("--upgrade");
        assert!(Args::try_parse_from(argv.clone()).is_err());

        argv.extend([
            "--prior-bucket",
            "kf-old",
            "--prior-database",
            "kubeflow-db-old",
            "--prior-rds-secret-name",
            "rds-secret-old",
        ]);
        let args = Args::try_parse_from(argv).unwrap();
        let Mode::Setup(setup) = args.mode else {
            panic!("expected setup");
        };
        assert_eq!(setup.prior_bucket.as_deref(), Some("kf-old"));
    }

    #[test]
    fn test_s3_keys_from_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let env_file = dir.path().join(".env");
        std::fs::write(
            &env_file,
            "S3_AWS_ACCESS_KEY_ID=AKIAFROMFILE\nS3_AWS_SECRET_ACCESS_KEY=secret-from-file\n",
        )
        .unwrap();

        let args = Args::load_from(
            Some(&env_file),
            SETUP[..SETUP.len() - 4].iter().copied(),
        )
        .unwrap();
        let Mode::Setup(setup) = args.mode else {
            panic!("expected setup");
        };
        assert_eq!(setup.s3_access_key_id, "AKIAFROMFILE");
        assert_eq!(setup.s3_secret_access_key, "secret-from-file");
    }

    #[test]
    fn test_upgrade_blue_defaults() {
        let args = Args::try_parse_from([
            "storeshift",
            "upgrade",
            "--region",
            "us-west-2",
            "--cluster-blue",
            "kf-blue",
            "--bucket-green",
            "kf-green",
            "--bucket-blue",
            "kf-blue",
        ])
        .unwrap();
        let Mode::Upgrade(upgrade) = args.mode else {
            panic!("expected upgrade");
        };

        assert_eq!(upgrade.db_instance_green, "kubeflow-db");
        assert_eq!(upgrade.db_instance_blue, "kubeflow-db-blue");
        assert_eq!(upgrade.db_subnet_group_name, "kubeflow-db-subnet-group-blue");
    }
}

//! Static flow diagrams for orchestrations
//!
//! These Mermaid diagrams describe the expected flow of each orchestration
//! and are printed by `storeshift flow <name>`.

use crate::names::orchestrations;

/// Node IDs map to activity names for matching against logged activity spans
pub struct FlowDiagram {
    /// The orchestration name this flow belongs to
    pub orchestration_name: &'static str,
    /// Mermaid flowchart definition
    pub mermaid: &'static str,
    /// Mapping of node IDs to activity name suffixes
    pub node_mappings: &'static [(&'static str, &'static str)],
}

/// Setup orchestration flow
pub const SETUP_FLOW: FlowDiagram = FlowDiagram {
    orchestration_name: orchestrations::SETUP,
    mermaid: r#"flowchart TD
    subgraph init["Prerequisites"]
        start(["▶ Start"])
        verify["📋 Verify Prerequisites<br/><small>eksctl + kube API + EKS cluster</small>"]
    end

    subgraph s3["S3"]
        s3_gate{"S3 secret without bucket?"}
        bucket["📋 Create Bucket<br/><small>skipped if present</small>"]
        upgrading_s3{"Upgrading?"}
        role["📋 Ensure DataSync Role"]
        iam_wait["⏱ IAM propagation 10s"]
        clone["📋 Clone Bucket<br/><small>poll every 30s</small>"]
        s3_secret["📋 Create S3 Secret<br/><small>skipped if present</small>"]
    end

    subgraph rds["RDS"]
        rds_gate{"Instance / secret state"}
        upgrading_rds{"Upgrading?"}
        snapshot["📋 Snapshot Prior DB<br/><small>poll every 10s</small>"]
        subnet_group["📋 Create Subnet Group<br/><small>private cluster subnets</small>"]
        instance["📋 Create DB Instance<br/><small>fresh or restored, poll every 10s</small>"]
        rds_secret["📋 Create RDS Secret"]
    end

    subgraph finalize["Finalize"]
        cluster_secrets["📋 Setup Cluster Secrets<br/><small>IRSA + CSI driver</small>"]
        publish["📋 Publish Parameters"]
        summary["📋 Write Summary"]
        success(["🏁 Success"])
    end

    conflict(["💥 Conflict"])

    start --> verify
    verify --> s3_gate
    s3_gate -->|Yes| conflict
    s3_gate -->|No| bucket
    bucket --> upgrading_s3
    upgrading_s3 -->|Yes| role
    role -->|created| iam_wait
    iam_wait --> clone
    role -->|existing| clone
    clone --> s3_secret
    upgrading_s3 -->|No| s3_secret
    s3_secret --> rds_gate
    rds_gate -->|secret without instance| conflict
    rds_gate -->|instance without secret| conflict
    rds_gate -->|both present| cluster_secrets
    rds_gate -->|neither| upgrading_rds
    upgrading_rds -->|Yes| snapshot
    snapshot --> subnet_group
    upgrading_rds -->|No| subnet_group
    subnet_group --> instance
    instance --> rds_secret
    rds_secret --> cluster_secrets
    cluster_secrets --> publish
    publish --> summary
    summary --> success

    classDef activity fill:#3b82f6,color:#fff,stroke:#1d4ed8
    classDef timer fill:#06b6d4,color:#fff,stroke:#0891b2
    classDef decision fill:#f59e0b,color:#000,stroke:#d97706
    classDef success fill:#22c55e,color:#fff,stroke:#16a34a
    classDef failure fill:#ef4444,color:#fff,stroke:#dc2626
    classDef start fill:#a855f7,color:#fff,stroke:#9333ea

    class start start
    class verify,bucket,role,clone,s3_secret,snapshot,subnet_group,instance,rds_secret,cluster_secrets,publish,summary activity
    class iam_wait timer
    class s3_gate,upgrading_s3,rds_gate,upgrading_rds decision
    class success success
    class conflict failure"#,
    node_mappings: &[
        ("verify", "verify-prerequisites"),
        ("s3_gate", "check-secret-conflict"),
        ("bucket", "create-bucket"),
        ("role", "ensure-replication-role"),
        ("clone", "clone-bucket"),
        ("s3_secret", "create-s3-secret"),
        ("rds_gate", "check-secret-conflict"),
        ("snapshot", "snapshot-db"),
        ("subnet_group", "create-subnet-group"),
        ("instance", "create-db-instance"),
        ("rds_secret", "create-rds-secret"),
        ("cluster_secrets", "setup-cluster-secrets"),
        ("publish", "publish-parameters"),
        ("summary", "write-summary"),
    ],
};

/// Blue/green upgrade orchestration flow
pub const UPGRADE_FLOW: FlowDiagram = FlowDiagram {
    orchestration_name: orchestrations::UPGRADE,
    mermaid: r#"flowchart TD
    subgraph init["Prerequisites"]
        start(["▶ Start"])
        verify["📋 Verify Prerequisites<br/><small>blue cluster</small>"]
    end

    subgraph s3["S3"]
        bucket["📋 Create Blue Bucket<br/><small>skipped if present</small>"]
        role["📋 Ensure DataSync Role"]
        iam_wait["⏱ IAM propagation 10s"]
        clone["📋 Clone Green → Blue<br/><small>new task every run</small>"]
    end

    subgraph rds["RDS"]
        probe["📋 Probe Blue Instance"]
        exists{"Blue instance exists?"}
        snapshot["📋 Snapshot Green DB"]
        subnet_group["📋 Create Blue Subnet Group"]
        restore["📋 Restore Blue Instance"]
    end

    subgraph finalize["Finalize"]
        cluster_secrets["📋 Setup Cluster Secrets"]
        irsa_trust["📋 Trust Cluster OIDC<br/><small>profile roles, skipped if trusted</small>"]
        publish["📋 Publish Parameters<br/><small>existing secret names</small>"]
        summary["📋 Write Summary"]
        success(["🏁 Success"])
    end

    clone_failed(["💥 Replication ERROR"])

    start --> verify
    verify --> bucket
    bucket --> role
    role -->|created| iam_wait
    iam_wait --> clone
    role -->|existing| clone
    clone -->|SUCCESS| probe
    clone -->|ERROR| clone_failed
    probe --> exists
    exists -->|Yes| cluster_secrets
    exists -->|No| snapshot
    snapshot --> subnet_group
    subnet_group --> restore
    restore --> cluster_secrets
    cluster_secrets --> irsa_trust
    irsa_trust --> publish
    publish --> summary
    summary --> success

    classDef activity fill:#3b82f6,color:#fff,stroke:#1d4ed8
    classDef timer fill:#06b6d4,color:#fff,stroke:#0891b2
    classDef decision fill:#f59e0b,color:#000,stroke:#d97706
    classDef success fill:#22c55e,color:#fff,stroke:#16a34a
    classDef failure fill:#ef4444,color:#fff,stroke:#dc2626
    classDef start fill:#a855f7,color:#fff,stroke:#9333ea

    class start start
    class verify,bucket,role,clone,probe,snapshot,subnet_group,restore,cluster_secrets,irsa_trust,publish,summary activity
    class iam_wait timer
    class exists decision
    class success success
    class clone_failed failure"#,
    node_mappings: &[
        ("verify", "verify-prerequisites"),
        ("bucket", "create-bucket"),
        ("role", "ensure-replication-role"),
        ("clone", "clone-bucket"),
        ("probe", "probe-resource"),
        ("snapshot", "snapshot-db"),
        ("subnet_group", "create-subnet-group"),
        ("restore", "create-db-instance"),
        ("cluster_secrets", "setup-cluster-secrets"),
        ("irsa_trust", "trust-cluster-oidc"),
        ("publish", "publish-parameters"),
        ("summary", "write-summary"),
    ],
};

/// Export vars orchestration flow
pub const EXPORT_VARS_FLOW: FlowDiagram = FlowDiagram {
    orchestration_name: orchestrations::EXPORT_VARS,
    mermaid: r#"flowchart TD
    start(["▶ Start"])
    collect["📋 Collect Export Vars<br/><small>EKS + RDS + EC2 + EFS</small>"]
    render["Render tfvars"]
    success(["🏁 Success"])

    start --> collect
    collect --> render
    render --> success

    classDef activity fill:#3b82f6,color:#fff,stroke:#1d4ed8
    classDef success fill:#22c55e,color:#fff,stroke:#16a34a
    classDef start fill:#a855f7,color:#fff,stroke:#9333ea

    class start start
    class collect activity
    class success success"#,
    node_mappings: &[("collect", "collect-export-vars")],
};

/// Get all flow diagrams
pub fn get_all_flows() -> Vec<&'static FlowDiagram> {
    vec![&SETUP_FLOW, &UPGRADE_FLOW, &EXPORT_VARS_FLOW]
}

/// Get flow diagram by orchestration name
pub fn get_flow_by_name(name: &str) -> Option<&'static FlowDiagram> {
    // Match by full name or short name
    let short_name = name.rsplit("::").next().unwrap_or(name);

    get_all_flows()
        .into_iter()
        .find(|flow| flow.orchestration_name.ends_with(&format!("::{}", short_name)))
}

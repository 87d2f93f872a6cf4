use anyhow::Result;
use storeshift_orchestrations::orchestrations::flows::{get_all_flows, get_flow_by_name};

pub fn run(name: Option<&str>) -> Result<()> {
    let flows = match name {
        Some(name) => match get_flow_by_name(name) {
            Some(flow) => vec![flow],
            None => anyhow::bail!("Unknown orchestration '{}'", name),
        },
        None => get_all_flows(),
    };

    for flow in flows {
        println!("%% {}", flow.orchestration_name);
        println!("{}", flow.mermaid);
        println!();
    }

    Ok(())
}

pub mod export;
pub mod flow;
pub mod setup;
pub mod upgrade;

use storeshift_models::ReplicationTask;

/// Table cell for a resource the run either created or found in place
pub(crate) fn created(flag: bool) -> &'static str {
    if flag {
        "created"
    } else {
        "existing"
    }
}

pub(crate) fn print_replication(task: &ReplicationTask) {
    println!("  Task:               {}", task.task_id);
    println!("  Execution:          {}", task.execution_id);
    println!("  Status:             {:?}", task.status);
}

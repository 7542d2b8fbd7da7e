use warpgrid_scheduler::SchedulerConfig;

use super::open_store;

pub fn faults(config: &SchedulerConfig, uuid: &str, format: &str) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let faults = store.list_faults_for_instance(uuid)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&faults)?);
        }
        _ => {
            if faults.is_empty() {
                println!("no faults recorded for {uuid}");
            }
            for fault in &faults {
                println!("{} [{}] {} (host {})", fault.created_at, fault.code, fault.message, fault.host);
                if let Some(details) = &fault.details {
                    for line in details.lines() {
                        println!("    {line}");
                    }
                }
            }
        }
    }

    Ok(())
}

use tracing::debug;
use warpgrid_scheduler::SchedulerConfig;
use warpgrid_state::{InstanceRecord, epoch_secs};

use super::open_store;

pub fn seed(config: &SchedulerConfig, uuids: &[String]) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let now = epoch_secs();
    for uuid in uuids {
        store.put_instance(&InstanceRecord::pending(uuid.as_str(), now))?;
        debug!(%uuid, "instance seeded");
        println!("✓ {uuid} pending");
    }
    Ok(())
}

use tracing::{debug, info};
use warpgrid_scheduler::{
    ExceptionInfo, FailureReport, FailureReporter, RequestContext, RequestSpec, SchedulerConfig,
    event_type,
};
use warpgrid_state::InstanceUpdates;

use super::open_store;

pub struct FailArgs {
    pub service: String,
    pub method: String,
    pub kind: String,
    pub reason: String,
    pub code: Option<u16>,
    pub uuids: Vec<String>,
}

impl FailArgs {
    fn exception_info(&self) -> ExceptionInfo {
        let exc = ExceptionInfo::new(self.kind.as_str(), self.reason.as_str());
        match self.code {
            Some(code) => exc.with_code(code),
            None => exc,
        }
    }
}

pub fn fail(config: &SchedulerConfig, args: &FailArgs) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let report = run(config, store, args)?;

    info!(
        "Reported {} failure for {} instance(s)",
        event_type(&args.service, &args.method),
        args.uuids.len()
    );
    for uuid in &report.updated {
        debug!(%uuid, "instance marked as error");
        println!("✓ {uuid} marked as error");
    }
    for failure in &report.failures {
        eprintln!("✗ {} {:?}: {}", failure.uuid, failure.step, failure.error);
    }

    if !report.is_clean() {
        anyhow::bail!("{} step(s) failed while reporting", report.failures.len());
    }
    Ok(())
}

fn run(
    config: &SchedulerConfig,
    store: warpgrid_state::StateStore,
    args: &FailArgs,
) -> anyhow::Result<FailureReport> {
    let reporter = FailureReporter::with_state_store(store, config.host.as_str(), config.build_notifier());
    let report = reporter.set_vm_state_and_notify(
        &RequestContext::new(),
        &args.service,
        &args.method,
        &InstanceUpdates::failed(),
        &args.exception_info(),
        &RequestSpec::for_uuids(args.uuids.iter().cloned()),
    )?;
    Ok(report)
}

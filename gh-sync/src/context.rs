use crate::report::SyncReport;
use crate::snapshot::RemoteSnapshot;

/// State one sync run threads through its phases: the remote snapshot the
/// phases read and update, and the report they append to.
#[derive(Debug, Default)]
pub struct SyncContext {
    pub snapshot: RemoteSnapshot,
    pub report: SyncReport
}

impl SyncContext {
    pub fn new(snapshot: RemoteSnapshot, dry_run: bool) -> Self {
        Self {
            snapshot,
            report: SyncReport::new(dry_run)
        }
    }
}

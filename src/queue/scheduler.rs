use crate::queue::execution::run_attempt;
use crate::queue::manager::QueueInner;
use crate::queue::store::all_satisfied;
use crate::queue::types::AttemptOutcome;
use std::sync::Arc;
use tracing::{debug, info};

/// Summary of one re-scan pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Tasks in the snapshot the pass walked
    pub examined: usize,
    /// Attempts that actually ran
    pub attempted: usize,
    /// Tasks whose conditions did not all hold at their turn
    pub ineligible: usize,
    /// Tasks skipped because an attempt was already in flight or they were gone
    pub busy: usize,
}

/// Walk every pending task in insertion order and run the eligible ones.
///
/// The pass works on a snapshot, so tasks retiring themselves mid-pass are safe.
/// Attempts run one after another: task `i + 1` is not looked at until the
/// attempt of task `i` has settled. Eligibility is evaluated at each task's turn,
/// so a condition cleared by an earlier task's callbacks is honoured.
pub(crate) async fn execute_all(inner: &Arc<QueueInner>) -> ScanReport {
    let snapshot = inner.tasks.read().await.snapshot();
    let mut report = ScanReport {
        examined: snapshot.len(),
        ..Default::default()
    };

    for entry in snapshot {
        let eligible = all_satisfied(&entry, &*inner.conditions.read().await);
        if !eligible {
            report.ineligible += 1;
            continue;
        }

        if inner.guard.is_guarded(&entry.id) {
            debug!("Task {} is running elsewhere, leaving it", entry.id);
            report.busy += 1;
            continue;
        }

        match run_attempt(inner.clone(), entry.clone()).await {
            AttemptOutcome::Skipped(_) => report.busy += 1,
            _ => report.attempted += 1,
        }
    }

    if report.attempted > 0 {
        info!(
            "Re-scan ran {} of {} pending tasks",
            report.attempted, report.examined
        );
    } else {
        debug!("Re-scan found nothing to run ({:?})", report);
    }

    report
}

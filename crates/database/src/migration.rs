//! Versioned schema migrations.

use crate::transaction::Transaction;
use tally_core::Result;
use tracing::{info, info_span, warn};

/// Runs `upgrade` once per version step from `from` to `to` inside the
/// version-change transaction `tx`, then commits it.
///
/// Each step is called as `upgrade(tx, new_version, old_version)`. A step that
/// fails is rolled back, the database stays at the last completed step, and
/// the step's error is returned.
pub fn run_migrations<F>(tx: Transaction<'_>, from: u32, to: u32, mut upgrade: F) -> Result<()>
where
    F: FnMut(&Transaction<'_>, u32, u32) -> Result<()>,
{
    for version in from + 1..=to {
        let span = info_span!("migration", from = version - 1, to = version);
        let _entered = span.enter();

        if let Err(err) = upgrade(&tx, version, version - 1) {
            warn!(error = %err, "migration step failed, rolling back");
            if let Err(abort) = tx.abort_to_checkpoint() {
                warn!(error = %abort, "persisting the last completed step failed");
            }
            return Err(err);
        }
        tx.checkpoint(version)?;
        info!("migration step applied");
    }
    tx.commit()
}

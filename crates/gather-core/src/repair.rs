//! Reconciliation pass for relationship invariants.
//!
//! All writes in this crate are transactional, so nothing here should find
//! work on a database only ever touched through it. It exists for data
//! imported from elsewhere or edited by hand, and runs at startup.

use gather_db::Database;
use gather_db::queries::{communities, friends};
use tracing::{info, warn};

use crate::error::{CoreError, Result};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RepairReport {
    /// Friendship rows whose mirror was missing; removed.
    pub asymmetric_friendships: usize,
    /// Friend requests between users who are already friends; removed.
    pub stale_friend_requests: usize,
    /// Join requests and invites held by existing members; removed.
    pub stale_community_pending: usize,
    /// Owners missing from their community's member roster; added.
    pub owners_enrolled: usize,
}

impl RepairReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Runs every fix in one transaction.
///
/// A lone friendship direction is dropped rather than completed: nothing
/// records that the other side ever agreed.
pub fn repair(db: &Database) -> Result<RepairReport> {
    let report = db.transaction(|tx| {
        let mut report = RepairReport::default();

        for (user, friend) in friends::one_directional_edges(tx)? {
            warn!("Dropping one-directional friendship {} -> {}", user, friend);
            report.asymmetric_friendships += friends::delete_friend_edge(tx, user, friend)?;
        }
        report.stale_friend_requests = friends::prune_requests_between_friends(tx)?;
        report.owners_enrolled = communities::enroll_owners_as_members(tx)?;
        report.stale_community_pending = communities::prune_pending_for_members(tx)?;

        Ok::<_, CoreError>(report)
    })?;

    if report.is_clean() {
        info!("Integrity check passed");
    } else {
        warn!("Integrity repair applied: {:?}", report);
    }
    Ok(report)
}

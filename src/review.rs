//! Report review workflow.
//!
//! A single ordered pipeline with two reviewer tiers. The transition table
//! is closed: anything not listed in `validate_review` is rejected and the
//! report row stays untouched.
//!
//! ```text
//! pending ── sector ──▶ reviewed | approved | rejected | requires_revision
//! pending ── district ─▶ approved | rejected | requires_revision
//! reviewed ─ district ─▶ approved | rejected | requires_revision
//! requires_revision ── submitter resubmit ──▶ pending
//! rejected ── submitter delete
//! ```

use rusqlite::{Connection, TransactionBehavior};
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::enums::ReportStatus;
use crate::models::Report;
use crate::scope::ScopeDescriptor;

/// Reviewer tier acting on a report. Sector is tier 1, district tier 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewTier {
    Sector,
    District,
}

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Report not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid transition: {from:?} -> {to:?} at {tier:?} tier")]
    InvalidTransition {
        from: ReportStatus,
        to: ReportStatus,
        tier: ReviewTier,
    },

    #[error("Caller is outside the required review scope")]
    OutOfScope,

    #[error("Only the original submitter may do this")]
    NotSubmitter,

    #[error("Report is not in an actionable state: {0:?}")]
    NotActionable(ReportStatus),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for ReviewError {
    fn from(err: rusqlite::Error) -> Self {
        ReviewError::Database(DatabaseError::Sqlite(err))
    }
}

/// The closed transition table for reviewer verdicts.
pub fn validate_review(
    current: ReportStatus,
    tier: ReviewTier,
    verdict: ReportStatus,
) -> Result<(), ReviewError> {
    let allowed = match (tier, current) {
        (ReviewTier::Sector, ReportStatus::Pending) => matches!(
            verdict,
            ReportStatus::Reviewed
                | ReportStatus::Approved
                | ReportStatus::Rejected
                | ReportStatus::RequiresRevision
        ),
        // District review is layered on top: it may act on fresh reports or
        // on reports the sector tier already marked reviewed.
        (ReviewTier::District, ReportStatus::Pending | ReportStatus::Reviewed) => matches!(
            verdict,
            ReportStatus::Approved | ReportStatus::Rejected | ReportStatus::RequiresRevision
        ),
        _ => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(ReviewError::InvalidTransition {
            from: current,
            to: verdict,
            tier,
        })
    }
}

/// Apply a reviewer verdict. Load, scope check, transition check, and write
/// happen inside one immediate transaction, so transitions are atomic per
/// report.
pub fn review_report(
    conn: &mut Connection,
    report_id: &Uuid,
    reviewer: &ScopeDescriptor,
    tier: ReviewTier,
    verdict: ReportStatus,
    notes: Option<&str>,
) -> Result<Report, ReviewError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let report = repository::get_report(&tx, report_id)?
        .ok_or(ReviewError::NotFound(*report_id))?;

    let in_scope = match tier {
        ReviewTier::Sector => reviewer.reviews_sector(&report.sector),
        ReviewTier::District => reviewer.reviews_district(&report.district),
    };
    if !in_scope {
        return Err(ReviewError::OutOfScope);
    }

    validate_review(report.status, tier, verdict)?;

    match tier {
        ReviewTier::Sector => {
            repository::apply_sector_review(&tx, report_id, verdict, notes, &reviewer.user_id)?
        }
        ReviewTier::District => {
            repository::apply_district_review(&tx, report_id, verdict, notes, &reviewer.user_id)?
        }
    }

    let updated = repository::get_report(&tx, report_id)?
        .ok_or(ReviewError::NotFound(*report_id))?;
    tx.commit()?;

    tracing::info!(%report_id, ?tier, status = verdict.as_str(), "report reviewed");
    Ok(updated)
}

/// Submitter resubmission: only from `requires_revision`, and only by the
/// original submitter. Resets the report to `pending`; prior review notes
/// stay on the record.
pub fn resubmit_report(
    conn: &mut Connection,
    report_id: &Uuid,
    caller: &ScopeDescriptor,
    title: &str,
    content: &str,
) -> Result<Report, ReviewError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let report = repository::get_report(&tx, report_id)?
        .ok_or(ReviewError::NotFound(*report_id))?;
    if !caller.owns(&report.submitter_id) {
        return Err(ReviewError::NotSubmitter);
    }
    if report.status != ReportStatus::RequiresRevision {
        return Err(ReviewError::NotActionable(report.status));
    }

    repository::apply_resubmission(&tx, report_id, title, content)?;
    let updated = repository::get_report(&tx, report_id)?
        .ok_or(ReviewError::NotFound(*report_id))?;
    tx.commit()?;

    tracing::info!(%report_id, "report resubmitted");
    Ok(updated)
}

/// Submitter deletion: only rejected reports, only by the submitter.
pub fn delete_report(
    conn: &mut Connection,
    report_id: &Uuid,
    caller: &ScopeDescriptor,
) -> Result<(), ReviewError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let report = repository::get_report(&tx, report_id)?
        .ok_or(ReviewError::NotFound(*report_id))?;
    if !caller.owns(&report.submitter_id) {
        return Err(ReviewError::NotSubmitter);
    }
    if report.status != ReportStatus::Rejected {
        return Err(ReviewError::NotActionable(report.status));
    }

    repository::delete_report(&tx, report_id)?;
    tx.commit()?;
    Ok(())
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{ReportStatus, ReportType};

/// A periodic or ad hoc activity report routed through tiered review.
///
/// Sector and district reviewers each have their own notes/reviewer/timestamp
/// columns; the columns are disjoint so concurrent reviews from the two tiers
/// cannot clobber each other. `status` is the single pipeline state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub report_type: ReportType,
    pub status: ReportStatus,
    pub submitter_id: Uuid,
    pub province: String,
    pub district: String,
    pub sector: String,
    pub sector_vet_notes: Option<String>,
    pub sector_reviewer_id: Option<Uuid>,
    pub sector_reviewed_at: Option<DateTime<Utc>>,
    pub district_vet_notes: Option<String>,
    pub district_reviewer_id: Option<Uuid>,
    pub district_reviewed_at: Option<DateTime<Utc>>,
    pub attachment_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{LicenseStatus, LicenseType};

/// A practitioner's application for an official practice credential.
/// `license_number` is assigned when a district reviewer approves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseApplication {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub license_type: LicenseType,
    pub specialization: String,
    pub document_ref: Option<String>,
    pub status: LicenseStatus,
    pub license_number: Option<String>,
    pub review_notes: Option<String>,
    pub reviewer_id: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

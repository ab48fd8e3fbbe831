use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{ApprovalStatus, Role};

/// A registered account: field vet, sector/district reviewer, or pharmacy.
/// Dashboard access is unlocked by `approval_status == Approved`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub approval_status: ApprovalStatus,
    pub province: String,
    pub district: String,
    pub sector: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

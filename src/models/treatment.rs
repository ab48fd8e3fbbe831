use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One clinical intervention on a patient. Append-oriented: created by the
/// treating veterinarian and never edited afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Treatment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub veterinarian_id: Uuid,
    pub treatment_date: NaiveDate,
    pub diagnosis: String,
    pub notes: Option<String>,
    pub medicines: Option<String>,
    pub created_at: DateTime<Utc>,
}

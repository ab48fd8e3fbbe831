use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered animal and its owner, located in the national
/// province/district/sector/cell/village hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub animal_name: String,
    pub species: String,
    pub breed: Option<String>,
    pub age_months: Option<i32>,
    pub owner_name: String,
    pub owner_phone: Option<String>,
    pub province: String,
    pub district: String,
    pub sector: String,
    pub cell: Option<String>,
    pub village: Option<String>,
    pub prior_conditions: Option<String>,
    pub veterinarian_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

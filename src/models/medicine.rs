use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::MovementType;

/// A medicine held by a veterinarian or pharmacy. The three counters are
/// kept in lockstep with the movement log by `ledger`; nothing else writes
/// them. Invariant: `current_stock = total_stock + stock_in - stock_out`,
/// never negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medicine {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub unit: String,
    pub total_stock: i64,
    pub current_stock: i64,
    pub stock_in: i64,
    pub stock_out: i64,
    pub expiry_date: Option<NaiveDate>,
    pub veterinarian_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One atomic stock-in or stock-out event. Append-only audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: Uuid,
    pub medicine_id: Uuid,
    pub quantity: i64,
    pub movement_type: MovementType,
    pub recorded_at: DateTime<Utc>,
}

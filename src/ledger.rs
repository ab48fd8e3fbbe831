//! Medicine stock ledger.
//!
//! The three counters on a medicine row (`current_stock`, `stock_in`,
//! `stock_out`) are only ever written here, in lockstep with an append to
//! `stock_movements`, inside a single immediate transaction. The stock-out
//! guard is a conditional UPDATE (`WHERE current_stock >= ?`), so two
//! concurrent stock-outs cannot both pass the balance check: SQLite
//! serializes the writes and the loser sees the reduced balance.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use thiserror::Error;
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::MovementType;
use crate::models::StockMovement;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Quantity must be a positive integer")]
    NonPositiveQuantity,

    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    #[error("Medicine not found: {0}")]
    MedicineNotFound(Uuid),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        LedgerError::Database(DatabaseError::Sqlite(err))
    }
}

/// Record a stock-in: bump `current_stock`/`stock_in` and append the
/// movement. Returns the new balance. No upper bound is enforced.
pub fn stock_in(
    conn: &mut Connection,
    medicine_id: &Uuid,
    quantity: i64,
) -> Result<i64, LedgerError> {
    if quantity <= 0 {
        return Err(LedgerError::NonPositiveQuantity);
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let now = Utc::now();

    let changed = tx.execute(
        "UPDATE medicines SET current_stock = current_stock + ?1, stock_in = stock_in + ?1,
         updated_at = ?2 WHERE id = ?3",
        params![quantity, now.to_rfc3339(), medicine_id.to_string()],
    )?;
    if changed == 0 {
        return Err(LedgerError::MedicineNotFound(*medicine_id));
    }

    append_movement(&tx, medicine_id, quantity, MovementType::StockIn, now)?;
    let balance = current_balance(&tx, medicine_id)?
        .ok_or(LedgerError::MedicineNotFound(*medicine_id))?;
    tx.commit()?;

    tracing::debug!(%medicine_id, quantity, balance, "stock-in recorded");
    Ok(balance)
}

/// Record a stock-out. Fails with `InsufficientStock` — and performs no
/// mutation at all — when the requested quantity exceeds the balance.
pub fn stock_out(
    conn: &mut Connection,
    medicine_id: &Uuid,
    quantity: i64,
) -> Result<i64, LedgerError> {
    if quantity <= 0 {
        return Err(LedgerError::NonPositiveQuantity);
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let now = Utc::now();

    // The balance check and the decrement are one statement; a concurrent
    // stock-out that commits first leaves this UPDATE matching zero rows.
    let changed = tx.execute(
        "UPDATE medicines SET current_stock = current_stock - ?1, stock_out = stock_out + ?1,
         updated_at = ?2 WHERE id = ?3 AND current_stock >= ?1",
        params![quantity, now.to_rfc3339(), medicine_id.to_string()],
    )?;
    if changed == 0 {
        // Transaction dropped without commit: nothing was mutated.
        return match current_balance(&tx, medicine_id)? {
            Some(available) => Err(LedgerError::InsufficientStock {
                requested: quantity,
                available,
            }),
            None => Err(LedgerError::MedicineNotFound(*medicine_id)),
        };
    }

    append_movement(&tx, medicine_id, quantity, MovementType::StockOut, now)?;
    let balance = current_balance(&tx, medicine_id)?
        .ok_or(LedgerError::MedicineNotFound(*medicine_id))?;
    tx.commit()?;

    tracing::debug!(%medicine_id, quantity, balance, "stock-out recorded");
    Ok(balance)
}

/// Movement history for a medicine, newest first.
pub fn movements(
    conn: &Connection,
    medicine_id: &Uuid,
) -> Result<Vec<StockMovement>, LedgerError> {
    let mut stmt = conn.prepare(
        "SELECT id, medicine_id, quantity, movement_type, recorded_at
         FROM stock_movements WHERE medicine_id = ?1 ORDER BY recorded_at DESC, id DESC",
    )?;
    let rows = stmt.query_map(params![medicine_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut log = Vec::new();
    for row in rows {
        let (id, med_id, quantity, movement_type, recorded_at) = row?;
        log.push(StockMovement {
            id: Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            medicine_id: Uuid::parse_str(&med_id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            quantity,
            movement_type: movement_type
                .parse::<MovementType>()
                .map_err(LedgerError::Database)?,
            recorded_at: chrono::DateTime::parse_from_rfc3339(&recorded_at)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        });
    }
    Ok(log)
}

/// Audit check: the live balance must equal
/// `total_stock + Σ stock-in − Σ stock-out` replayed from the movement log.
pub fn verify_balance(conn: &Connection, medicine_id: &Uuid) -> Result<bool, LedgerError> {
    let (total, current): (i64, i64) = conn
        .query_row(
            "SELECT total_stock, current_stock FROM medicines WHERE id = ?1",
            params![medicine_id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?
        .ok_or(LedgerError::MedicineNotFound(*medicine_id))?;

    let replayed: i64 = conn.query_row(
        "SELECT COALESCE(SUM(CASE movement_type WHEN 'stock_in' THEN quantity
         ELSE -quantity END), 0) FROM stock_movements WHERE medicine_id = ?1",
        params![medicine_id.to_string()],
        |row| row.get(0),
    )?;

    Ok(current == total + replayed)
}

fn append_movement(
    conn: &Connection,
    medicine_id: &Uuid,
    quantity: i64,
    movement_type: MovementType,
    now: chrono::DateTime<Utc>,
) -> Result<(), LedgerError> {
    conn.execute(
        "INSERT INTO stock_movements (id, medicine_id, quantity, movement_type, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            Uuid::new_v4().to_string(),
            medicine_id.to_string(),
            quantity,
            movement_type.as_str(),
            now.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn current_balance(conn: &Connection, medicine_id: &Uuid) -> Result<Option<i64>, LedgerError> {
    let balance = conn
        .query_row(
            "SELECT current_stock FROM medicines WHERE id = ?1",
            params![medicine_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(balance)
}

use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::repository::{parse_ts, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::{ApprovalStatus, Role};
use crate::models::User;

const USER_COLUMNS: &str = "id, full_name, email, phone, password_hash, role, approval_status,
     province, district, sector, created_at, updated_at";

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, full_name, email, phone, password_hash, role, approval_status,
         province, district, sector, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            user.id.to_string(),
            user.full_name,
            user.email,
            user.phone,
            user.password_hash,
            user.role.as_str(),
            user.approval_status.as_str(),
            user.province,
            user.district,
            user.sector,
            user.created_at.to_rfc3339(),
            user.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id.to_string()],
            user_row,
        )
        .optional()?;
    row.map(user_from_row).transpose()
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            params![email],
            user_row,
        )
        .optional()?;
    row.map(user_from_row).transpose()
}

/// Pending registrations for a district reviewer's queue.
pub fn list_pending_registrations(
    conn: &Connection,
    district: &str,
) -> Result<Vec<User>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users
         WHERE approval_status = 'pending' AND district = ?1
         ORDER BY created_at"
    ))?;
    let rows = stmt.query_map(params![district], |row| Ok(user_row(row)))?;

    let mut users = Vec::new();
    for row in rows {
        users.push(user_from_row(row??)?);
    }
    Ok(users)
}

pub fn set_approval_status(
    conn: &Connection,
    id: &Uuid,
    status: ApprovalStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET approval_status = ?1, updated_at = ?2 WHERE id = ?3",
        params![
            status.as_str(),
            chrono::Utc::now().to_rfc3339(),
            id.to_string()
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "user".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn delete_user(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM users WHERE id = ?1", params![id.to_string()])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "user".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

// Internal row type for User mapping
struct UserRow {
    id: String,
    full_name: String,
    email: String,
    phone: Option<String>,
    password_hash: String,
    role: String,
    approval_status: String,
    province: String,
    district: String,
    sector: String,
    created_at: String,
    updated_at: String,
}

fn user_row(row: &rusqlite::Row<'_>) -> Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        password_hash: row.get(4)?,
        role: row.get(5)?,
        approval_status: row.get(6)?,
        province: row.get(7)?,
        district: row.get(8)?,
        sector: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn user_from_row(row: UserRow) -> Result<User, DatabaseError> {
    Ok(User {
        id: parse_uuid(&row.id)?,
        full_name: row.full_name,
        email: row.email,
        phone: row.phone,
        password_hash: row.password_hash,
        role: Role::from_str(&row.role)?,
        approval_status: ApprovalStatus::from_str(&row.approval_status)?,
        province: row.province,
        district: row.district,
        sector: row.sector,
        created_at: parse_ts(&row.created_at)?,
        updated_at: parse_ts(&row.updated_at)?,
    })
}

use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::repository::{parse_opt_ts, parse_opt_uuid, parse_ts, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::{LicenseStatus, LicenseType};
use crate::models::LicenseApplication;

const LICENSE_COLUMNS: &str = "id, applicant_id, license_type, specialization, document_ref,
     status, license_number, review_notes, reviewer_id, reviewed_at, created_at, updated_at";

pub fn insert_license_application(
    conn: &Connection,
    app: &LicenseApplication,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO license_applications (id, applicant_id, license_type, specialization,
         document_ref, status, license_number, review_notes, reviewer_id, reviewed_at,
         created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            app.id.to_string(),
            app.applicant_id.to_string(),
            app.license_type.as_str(),
            app.specialization,
            app.document_ref,
            app.status.as_str(),
            app.license_number,
            app.review_notes,
            app.reviewer_id.map(|id| id.to_string()),
            app.reviewed_at.map(|ts| ts.to_rfc3339()),
            app.created_at.to_rfc3339(),
            app.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_license_application(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<LicenseApplication>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {LICENSE_COLUMNS} FROM license_applications WHERE id = ?1"),
            params![id.to_string()],
            license_row,
        )
        .optional()?;
    row.map(license_from_row).transpose()
}

pub fn list_license_applications(conn: &Connection) -> Result<Vec<LicenseApplication>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {LICENSE_COLUMNS} FROM license_applications ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map([], |row| Ok(license_row(row)))?;
    collect_licenses(rows)
}

pub fn list_license_applications_by_applicant(
    conn: &Connection,
    applicant_id: &Uuid,
) -> Result<Vec<LicenseApplication>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {LICENSE_COLUMNS} FROM license_applications
         WHERE applicant_id = ?1 ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map(params![applicant_id.to_string()], |row| Ok(license_row(row)))?;
    collect_licenses(rows)
}

pub fn apply_license_review(
    conn: &Connection,
    id: &Uuid,
    status: LicenseStatus,
    license_number: Option<&str>,
    notes: Option<&str>,
    reviewer_id: &Uuid,
) -> Result<(), DatabaseError> {
    let now = chrono::Utc::now().to_rfc3339();
    let changed = conn.execute(
        "UPDATE license_applications SET status = ?1, license_number = ?2, review_notes = ?3,
         reviewer_id = ?4, reviewed_at = ?5, updated_at = ?5 WHERE id = ?6",
        params![
            status.as_str(),
            license_number,
            notes,
            reviewer_id.to_string(),
            now,
            id.to_string()
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "license_application".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Applicant resubmission: refreshed specialization/documents, back to pending.
pub fn apply_license_resubmission(
    conn: &Connection,
    id: &Uuid,
    specialization: &str,
    document_ref: Option<&str>,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE license_applications SET specialization = ?1, document_ref = ?2,
         status = 'pending', updated_at = ?3 WHERE id = ?4",
        params![
            specialization,
            document_ref,
            chrono::Utc::now().to_rfc3339(),
            id.to_string()
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "license_application".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn delete_license_application(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM license_applications WHERE id = ?1",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "license_application".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// How many licenses have been granted so far; used for number assignment.
pub fn count_approved_licenses(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM license_applications WHERE status = 'approved'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

struct LicenseRow {
    id: String,
    applicant_id: String,
    license_type: String,
    specialization: String,
    document_ref: Option<String>,
    status: String,
    license_number: Option<String>,
    review_notes: Option<String>,
    reviewer_id: Option<String>,
    reviewed_at: Option<String>,
    created_at: String,
    updated_at: String,
}

fn license_row(row: &rusqlite::Row<'_>) -> Result<LicenseRow, rusqlite::Error> {
    Ok(LicenseRow {
        id: row.get(0)?,
        applicant_id: row.get(1)?,
        license_type: row.get(2)?,
        specialization: row.get(3)?,
        document_ref: row.get(4)?,
        status: row.get(5)?,
        license_number: row.get(6)?,
        review_notes: row.get(7)?,
        reviewer_id: row.get(8)?,
        reviewed_at: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn license_from_row(row: LicenseRow) -> Result<LicenseApplication, DatabaseError> {
    Ok(LicenseApplication {
        id: parse_uuid(&row.id)?,
        applicant_id: parse_uuid(&row.applicant_id)?,
        license_type: LicenseType::from_str(&row.license_type)?,
        specialization: row.specialization,
        document_ref: row.document_ref,
        status: LicenseStatus::from_str(&row.status)?,
        license_number: row.license_number,
        review_notes: row.review_notes,
        reviewer_id: parse_opt_uuid(row.reviewer_id)?,
        reviewed_at: parse_opt_ts(row.reviewed_at)?,
        created_at: parse_ts(&row.created_at)?,
        updated_at: parse_ts(&row.updated_at)?,
    })
}

fn collect_licenses<I>(rows: I) -> Result<Vec<LicenseApplication>, DatabaseError>
where
    I: Iterator<Item = rusqlite::Result<Result<LicenseRow, rusqlite::Error>>>,
{
    let mut apps = Vec::new();
    for row in rows {
        apps.push(license_from_row(row??)?);
    }
    Ok(apps)
}

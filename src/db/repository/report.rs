use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::repository::{parse_opt_ts, parse_opt_uuid, parse_ts, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::{ReportStatus, ReportType};
use crate::models::Report;

const REPORT_COLUMNS: &str = "id, title, content, report_type, status, submitter_id,
     province, district, sector, sector_vet_notes, sector_reviewer_id, sector_reviewed_at,
     district_vet_notes, district_reviewer_id, district_reviewed_at, attachment_ref,
     created_at, updated_at";

pub fn insert_report(conn: &Connection, report: &Report) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO reports (id, title, content, report_type, status, submitter_id,
         province, district, sector, sector_vet_notes, sector_reviewer_id, sector_reviewed_at,
         district_vet_notes, district_reviewer_id, district_reviewed_at, attachment_ref,
         created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            report.id.to_string(),
            report.title,
            report.content,
            report.report_type.as_str(),
            report.status.as_str(),
            report.submitter_id.to_string(),
            report.province,
            report.district,
            report.sector,
            report.sector_vet_notes,
            report.sector_reviewer_id.map(|id| id.to_string()),
            report.sector_reviewed_at.map(|ts| ts.to_rfc3339()),
            report.district_vet_notes,
            report.district_reviewer_id.map(|id| id.to_string()),
            report.district_reviewed_at.map(|ts| ts.to_rfc3339()),
            report.attachment_ref,
            report.created_at.to_rfc3339(),
            report.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_report(conn: &Connection, id: &Uuid) -> Result<Option<Report>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?1"),
            params![id.to_string()],
            report_row,
        )
        .optional()?;
    row.map(report_from_row).transpose()
}

pub fn list_reports_by_submitter(
    conn: &Connection,
    submitter_id: &Uuid,
) -> Result<Vec<Report>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REPORT_COLUMNS} FROM reports
         WHERE submitter_id = ?1 ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map(params![submitter_id.to_string()], |row| Ok(report_row(row)))?;
    collect_reports(rows)
}

/// Tier-1 queue: reports tagged with the reviewer's sector.
pub fn list_reports_by_sector(conn: &Connection, sector: &str) -> Result<Vec<Report>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REPORT_COLUMNS} FROM reports
         WHERE sector = ?1 ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map(params![sector], |row| Ok(report_row(row)))?;
    collect_reports(rows)
}

/// Tier-2 queue: all reports of the district, any sector.
pub fn list_reports_by_district(
    conn: &Connection,
    district: &str,
) -> Result<Vec<Report>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REPORT_COLUMNS} FROM reports
         WHERE district = ?1 ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map(params![district], |row| Ok(report_row(row)))?;
    collect_reports(rows)
}

/// Persist a sector-tier verdict. Only sector-tier columns are written, so a
/// concurrent district review cannot be clobbered.
pub fn apply_sector_review(
    conn: &Connection,
    id: &Uuid,
    status: ReportStatus,
    notes: Option<&str>,
    reviewer_id: &Uuid,
) -> Result<(), DatabaseError> {
    let now = chrono::Utc::now().to_rfc3339();
    let changed = conn.execute(
        "UPDATE reports SET status = ?1, sector_vet_notes = ?2, sector_reviewer_id = ?3,
         sector_reviewed_at = ?4, updated_at = ?4 WHERE id = ?5",
        params![status.as_str(), notes, reviewer_id.to_string(), now, id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "report".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Persist a district-tier verdict into the district-tier columns.
pub fn apply_district_review(
    conn: &Connection,
    id: &Uuid,
    status: ReportStatus,
    notes: Option<&str>,
    reviewer_id: &Uuid,
) -> Result<(), DatabaseError> {
    let now = chrono::Utc::now().to_rfc3339();
    let changed = conn.execute(
        "UPDATE reports SET status = ?1, district_vet_notes = ?2, district_reviewer_id = ?3,
         district_reviewed_at = ?4, updated_at = ?4 WHERE id = ?5",
        params![status.as_str(), notes, reviewer_id.to_string(), now, id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "report".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Resubmission rewrite: new title/content, status back to pending. Review
/// notes are intentionally left in place (history stays visible).
pub fn apply_resubmission(
    conn: &Connection,
    id: &Uuid,
    title: &str,
    content: &str,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE reports SET title = ?1, content = ?2, status = 'pending', updated_at = ?3
         WHERE id = ?4",
        params![title, content, chrono::Utc::now().to_rfc3339(), id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "report".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn delete_report(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM reports WHERE id = ?1", params![id.to_string()])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "report".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

// Internal row type for Report mapping
struct ReportRow {
    id: String,
    title: String,
    content: String,
    report_type: String,
    status: String,
    submitter_id: String,
    province: String,
    district: String,
    sector: String,
    sector_vet_notes: Option<String>,
    sector_reviewer_id: Option<String>,
    sector_reviewed_at: Option<String>,
    district_vet_notes: Option<String>,
    district_reviewer_id: Option<String>,
    district_reviewed_at: Option<String>,
    attachment_ref: Option<String>,
    created_at: String,
    updated_at: String,
}

fn report_row(row: &rusqlite::Row<'_>) -> Result<ReportRow, rusqlite::Error> {
    Ok(ReportRow {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        report_type: row.get(3)?,
        status: row.get(4)?,
        submitter_id: row.get(5)?,
        province: row.get(6)?,
        district: row.get(7)?,
        sector: row.get(8)?,
        sector_vet_notes: row.get(9)?,
        sector_reviewer_id: row.get(10)?,
        sector_reviewed_at: row.get(11)?,
        district_vet_notes: row.get(12)?,
        district_reviewer_id: row.get(13)?,
        district_reviewed_at: row.get(14)?,
        attachment_ref: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}

fn report_from_row(row: ReportRow) -> Result<Report, DatabaseError> {
    Ok(Report {
        id: parse_uuid(&row.id)?,
        title: row.title,
        content: row.content,
        report_type: ReportType::from_str(&row.report_type)?,
        status: ReportStatus::from_str(&row.status)?,
        submitter_id: parse_uuid(&row.submitter_id)?,
        province: row.province,
        district: row.district,
        sector: row.sector,
        sector_vet_notes: row.sector_vet_notes,
        sector_reviewer_id: parse_opt_uuid(row.sector_reviewer_id)?,
        sector_reviewed_at: parse_opt_ts(row.sector_reviewed_at)?,
        district_vet_notes: row.district_vet_notes,
        district_reviewer_id: parse_opt_uuid(row.district_reviewer_id)?,
        district_reviewed_at: parse_opt_ts(row.district_reviewed_at)?,
        attachment_ref: row.attachment_ref,
        created_at: parse_ts(&row.created_at)?,
        updated_at: parse_ts(&row.updated_at)?,
    })
}

fn collect_reports<I>(rows: I) -> Result<Vec<Report>, DatabaseError>
where
    I: Iterator<Item = rusqlite::Result<Result<ReportRow, rusqlite::Error>>>,
{
    let mut reports = Vec::new();
    for row in rows {
        reports.push(report_from_row(row??)?);
    }
    Ok(reports)
}

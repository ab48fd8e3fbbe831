use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::repository::{parse_ts, parse_uuid};
use crate::db::DatabaseError;
use crate::models::Patient;

const PATIENT_COLUMNS: &str = "p.id, p.animal_name, p.species, p.breed, p.age_months,
     p.owner_name, p.owner_phone, p.province, p.district, p.sector, p.cell, p.village,
     p.prior_conditions, p.veterinarian_id, p.created_at, p.updated_at";

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, animal_name, species, breed, age_months, owner_name,
         owner_phone, province, district, sector, cell, village, prior_conditions,
         veterinarian_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            patient.id.to_string(),
            patient.animal_name,
            patient.species,
            patient.breed,
            patient.age_months,
            patient.owner_name,
            patient.owner_phone,
            patient.province,
            patient.district,
            patient.sector,
            patient.cell,
            patient.village,
            patient.prior_conditions,
            patient.veterinarian_id.to_string(),
            patient.created_at.to_rfc3339(),
            patient.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {PATIENT_COLUMNS} FROM patients p WHERE p.id = ?1"),
            params![id.to_string()],
            patient_row,
        )
        .optional()?;
    row.map(patient_from_row).transpose()
}

pub fn list_patients_by_vet(conn: &Connection, vet_id: &Uuid) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients p
         WHERE p.veterinarian_id = ?1 ORDER BY p.created_at DESC"
    ))?;
    let rows = stmt.query_map(params![vet_id.to_string()], |row| Ok(patient_row(row)))?;
    collect_patients(rows)
}

/// Sector view: patients registered in the sector, or registered by a
/// veterinarian assigned to it. Unknown sectors yield an empty set.
pub fn list_patients_by_sector(conn: &Connection, sector: &str) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients p
         JOIN users u ON u.id = p.veterinarian_id
         WHERE p.sector = ?1 OR u.sector = ?1
         ORDER BY p.created_at DESC"
    ))?;
    let rows = stmt.query_map(params![sector], |row| Ok(patient_row(row)))?;
    collect_patients(rows)
}

/// District view: aggregates across all sectors of the district.
pub fn list_patients_by_district(
    conn: &Connection,
    district: &str,
) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients p
         WHERE p.district = ?1 ORDER BY p.created_at DESC"
    ))?;
    let rows = stmt.query_map(params![district], |row| Ok(patient_row(row)))?;
    collect_patients(rows)
}

/// Fields a veterinarian may edit after registration.
#[derive(Debug, Default)]
pub struct PatientUpdate {
    pub animal_name: Option<String>,
    pub breed: Option<String>,
    pub age_months: Option<i32>,
    pub owner_name: Option<String>,
    pub owner_phone: Option<String>,
    pub prior_conditions: Option<String>,
}

pub fn update_patient(
    conn: &Connection,
    id: &Uuid,
    update: &PatientUpdate,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE patients SET
         animal_name = COALESCE(?1, animal_name),
         breed = COALESCE(?2, breed),
         age_months = COALESCE(?3, age_months),
         owner_name = COALESCE(?4, owner_name),
         owner_phone = COALESCE(?5, owner_phone),
         prior_conditions = COALESCE(?6, prior_conditions),
         updated_at = ?7
         WHERE id = ?8",
        params![
            update.animal_name,
            update.breed,
            update.age_months,
            update.owner_name,
            update.owner_phone,
            update.prior_conditions,
            chrono::Utc::now().to_rfc3339(),
            id.to_string(),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn delete_patient(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM patients WHERE id = ?1", params![id.to_string()])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

// Internal row type for Patient mapping
struct PatientRow {
    id: String,
    animal_name: String,
    species: String,
    breed: Option<String>,
    age_months: Option<i32>,
    owner_name: String,
    owner_phone: Option<String>,
    province: String,
    district: String,
    sector: String,
    cell: Option<String>,
    village: Option<String>,
    prior_conditions: Option<String>,
    veterinarian_id: String,
    created_at: String,
    updated_at: String,
}

fn patient_row(row: &rusqlite::Row<'_>) -> Result<PatientRow, rusqlite::Error> {
    Ok(PatientRow {
        id: row.get(0)?,
        animal_name: row.get(1)?,
        species: row.get(2)?,
        breed: row.get(3)?,
        age_months: row.get(4)?,
        owner_name: row.get(5)?,
        owner_phone: row.get(6)?,
        province: row.get(7)?,
        district: row.get(8)?,
        sector: row.get(9)?,
        cell: row.get(10)?,
        village: row.get(11)?,
        prior_conditions: row.get(12)?,
        veterinarian_id: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    Ok(Patient {
        id: parse_uuid(&row.id)?,
        animal_name: row.animal_name,
        species: row.species,
        breed: row.breed,
        age_months: row.age_months,
        owner_name: row.owner_name,
        owner_phone: row.owner_phone,
        province: row.province,
        district: row.district,
        sector: row.sector,
        cell: row.cell,
        village: row.village,
        prior_conditions: row.prior_conditions,
        veterinarian_id: parse_uuid(&row.veterinarian_id)?,
        created_at: parse_ts(&row.created_at)?,
        updated_at: parse_ts(&row.updated_at)?,
    })
}

fn collect_patients<I>(rows: I) -> Result<Vec<Patient>, DatabaseError>
where
    I: Iterator<Item = rusqlite::Result<Result<PatientRow, rusqlite::Error>>>,
{
    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row??)?);
    }
    Ok(patients)
}

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::repository::{parse_ts, parse_uuid};
use crate::db::DatabaseError;
use crate::models::Treatment;

pub fn insert_treatment(conn: &Connection, treatment: &Treatment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO treatments (id, patient_id, veterinarian_id, treatment_date, diagnosis,
         notes, medicines, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            treatment.id.to_string(),
            treatment.patient_id.to_string(),
            treatment.veterinarian_id.to_string(),
            treatment.treatment_date.to_string(),
            treatment.diagnosis,
            treatment.notes,
            treatment.medicines,
            treatment.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn list_treatments_by_vet(
    conn: &Connection,
    vet_id: &Uuid,
) -> Result<Vec<Treatment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, veterinarian_id, treatment_date, diagnosis, notes, medicines,
         created_at FROM treatments WHERE veterinarian_id = ?1 ORDER BY treatment_date DESC",
    )?;
    let rows = stmt.query_map(params![vet_id.to_string()], |row| Ok(treatment_row(row)))?;
    collect_treatments(rows)
}

pub fn list_treatments_by_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Treatment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, veterinarian_id, treatment_date, diagnosis, notes, medicines,
         created_at FROM treatments WHERE patient_id = ?1 ORDER BY treatment_date DESC",
    )?;
    let rows = stmt.query_map(params![patient_id.to_string()], |row| Ok(treatment_row(row)))?;
    collect_treatments(rows)
}

struct TreatmentRow {
    id: String,
    patient_id: String,
    veterinarian_id: String,
    treatment_date: String,
    diagnosis: String,
    notes: Option<String>,
    medicines: Option<String>,
    created_at: String,
}

fn treatment_row(row: &rusqlite::Row<'_>) -> Result<TreatmentRow, rusqlite::Error> {
    Ok(TreatmentRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        veterinarian_id: row.get(2)?,
        treatment_date: row.get(3)?,
        diagnosis: row.get(4)?,
        notes: row.get(5)?,
        medicines: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn treatment_from_row(row: TreatmentRow) -> Result<Treatment, DatabaseError> {
    Ok(Treatment {
        id: parse_uuid(&row.id)?,
        patient_id: parse_uuid(&row.patient_id)?,
        veterinarian_id: parse_uuid(&row.veterinarian_id)?,
        treatment_date: chrono::NaiveDate::parse_from_str(&row.treatment_date, "%Y-%m-%d")
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        diagnosis: row.diagnosis,
        notes: row.notes,
        medicines: row.medicines,
        created_at: parse_ts(&row.created_at)?,
    })
}

fn collect_treatments<I>(rows: I) -> Result<Vec<Treatment>, DatabaseError>
where
    I: Iterator<Item = rusqlite::Result<Result<TreatmentRow, rusqlite::Error>>>,
{
    let mut treatments = Vec::new();
    for row in rows {
        treatments.push(treatment_from_row(row??)?);
    }
    Ok(treatments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::models::enums::Role;
    use crate::testutil::{seed_patient, seed_user};
    use chrono::{NaiveDate, Utc};

    fn record(conn: &Connection, patient_id: Uuid, vet_id: Uuid, date: &str) -> Treatment {
        let treatment = Treatment {
            id: Uuid::new_v4(),
            patient_id,
            veterinarian_id: vet_id,
            treatment_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            diagnosis: "East Coast fever".into(),
            notes: Some("follow-up in one week".into()),
            medicines: Some("Buparvaquone 2.5mg/kg".into()),
            created_at: Utc::now(),
        };
        insert_treatment(conn, &treatment).unwrap();
        treatment
    }

    #[test]
    fn patient_history_sorted_newest_first() {
        let conn = open_memory_database().unwrap();
        let vet = seed_user(&conn, Role::BasicVet, "Ngoma", "Huye");
        let patient = seed_patient(&conn, &vet, "Ngoma", "Huye");

        record(&conn, patient.id, vet.id, "2026-01-10");
        record(&conn, patient.id, vet.id, "2026-03-02");

        let history = list_treatments_by_patient(&conn, &patient.id).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].treatment_date > history[1].treatment_date);
    }

    #[test]
    fn deleting_patient_cascades_treatments() {
        let conn = open_memory_database().unwrap();
        let vet = seed_user(&conn, Role::BasicVet, "Ngoma", "Huye");
        let patient = seed_patient(&conn, &vet, "Ngoma", "Huye");
        record(&conn, patient.id, vet.id, "2026-01-10");

        crate::db::repository::delete_patient(&conn, &patient.id).unwrap();
        let history = list_treatments_by_patient(&conn, &patient.id).unwrap();
        assert!(history.is_empty());
    }
}

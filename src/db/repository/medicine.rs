use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::repository::{parse_opt_date, parse_ts, parse_uuid};
use crate::db::DatabaseError;
use crate::models::Medicine;

const MEDICINE_COLUMNS: &str = "id, name, description, unit, total_stock, current_stock,
     stock_in, stock_out, expiry_date, veterinarian_id, created_at, updated_at";

pub fn insert_medicine(conn: &Connection, medicine: &Medicine) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medicines (id, name, description, unit, total_stock, current_stock,
         stock_in, stock_out, expiry_date, veterinarian_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            medicine.id.to_string(),
            medicine.name,
            medicine.description,
            medicine.unit,
            medicine.total_stock,
            medicine.current_stock,
            medicine.stock_in,
            medicine.stock_out,
            medicine.expiry_date.map(|d| d.to_string()),
            medicine.veterinarian_id.to_string(),
            medicine.created_at.to_rfc3339(),
            medicine.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_medicine(conn: &Connection, id: &Uuid) -> Result<Option<Medicine>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {MEDICINE_COLUMNS} FROM medicines WHERE id = ?1"),
            params![id.to_string()],
            medicine_row,
        )
        .optional()?;
    row.map(medicine_from_row).transpose()
}

pub fn list_medicines_by_vet(
    conn: &Connection,
    vet_id: &Uuid,
) -> Result<Vec<Medicine>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MEDICINE_COLUMNS} FROM medicines
         WHERE veterinarian_id = ?1 ORDER BY name"
    ))?;
    let rows = stmt.query_map(params![vet_id.to_string()], |row| Ok(medicine_row(row)))?;

    let mut medicines = Vec::new();
    for row in rows {
        medicines.push(medicine_from_row(row??)?);
    }
    Ok(medicines)
}

/// Descriptive fields only. The stock counters are owned by the ledger and
/// deliberately not reachable from here.
#[derive(Debug, Default)]
pub struct MedicineUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub expiry_date: Option<String>,
}

pub fn update_medicine_details(
    conn: &Connection,
    id: &Uuid,
    update: &MedicineUpdate,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE medicines SET
         name = COALESCE(?1, name),
         description = COALESCE(?2, description),
         unit = COALESCE(?3, unit),
         expiry_date = COALESCE(?4, expiry_date),
         updated_at = ?5
         WHERE id = ?6",
        params![
            update.name,
            update.description,
            update.unit,
            update.expiry_date,
            chrono::Utc::now().to_rfc3339(),
            id.to_string(),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "medicine".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Removes the medicine; movement history goes with it (FK cascade).
pub fn delete_medicine(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM medicines WHERE id = ?1", params![id.to_string()])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "medicine".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

// Internal row type for Medicine mapping
struct MedicineRow {
    id: String,
    name: String,
    description: Option<String>,
    unit: String,
    total_stock: i64,
    current_stock: i64,
    stock_in: i64,
    stock_out: i64,
    expiry_date: Option<String>,
    veterinarian_id: String,
    created_at: String,
    updated_at: String,
}

fn medicine_row(row: &rusqlite::Row<'_>) -> Result<MedicineRow, rusqlite::Error> {
    Ok(MedicineRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        unit: row.get(3)?,
        total_stock: row.get(4)?,
        current_stock: row.get(5)?,
        stock_in: row.get(6)?,
        stock_out: row.get(7)?,
        expiry_date: row.get(8)?,
        veterinarian_id: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn medicine_from_row(row: MedicineRow) -> Result<Medicine, DatabaseError> {
    Ok(Medicine {
        id: parse_uuid(&row.id)?,
        name: row.name,
        description: row.description,
        unit: row.unit,
        total_stock: row.total_stock,
        current_stock: row.current_stock,
        stock_in: row.stock_in,
        stock_out: row.stock_out,
        expiry_date: parse_opt_date(row.expiry_date),
        veterinarian_id: parse_uuid(&row.veterinarian_id)?,
        created_at: parse_ts(&row.created_at)?,
        updated_at: parse_ts(&row.updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::models::enums::Role;
    use crate::testutil::{seed_medicine, seed_user};

    #[test]
    fn new_medicine_starts_with_current_equal_total() {
        let conn = open_memory_database().unwrap();
        let vet = seed_user(&conn, Role::Pharmacy, "Ngoma", "Huye");
        let medicine = seed_medicine(&conn, &vet, 50);

        let fetched = get_medicine(&conn, &medicine.id).unwrap().unwrap();
        assert_eq!(fetched.total_stock, 50);
        assert_eq!(fetched.current_stock, 50);
        assert_eq!(fetched.stock_in, 0);
        assert_eq!(fetched.stock_out, 0);
    }

    #[test]
    fn detail_update_cannot_touch_counters() {
        let conn = open_memory_database().unwrap();
        let vet = seed_user(&conn, Role::Pharmacy, "Ngoma", "Huye");
        let medicine = seed_medicine(&conn, &vet, 50);

        update_medicine_details(
            &conn,
            &medicine.id,
            &MedicineUpdate {
                description: Some("broad-spectrum antibiotic".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let fetched = get_medicine(&conn, &medicine.id).unwrap().unwrap();
        assert_eq!(fetched.current_stock, 50);
        assert_eq!(fetched.description.as_deref(), Some("broad-spectrum antibiotic"));
    }

    #[test]
    fn listing_is_owner_scoped() {
        let conn = open_memory_database().unwrap();
        let vet_a = seed_user(&conn, Role::Pharmacy, "Ngoma", "Huye");
        let vet_b = seed_user(&conn, Role::Pharmacy, "Tumba", "Huye");
        seed_medicine(&conn, &vet_a, 10);
        seed_medicine(&conn, &vet_b, 20);

        let listed = list_medicines_by_vet(&conn, &vet_a.id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].total_stock, 10);
    }
}

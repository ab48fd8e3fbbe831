//! Shared fixtures for repository and domain tests.

use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository;
use crate::models::enums::{ApprovalStatus, ReportStatus, ReportType, Role};
use crate::models::{Medicine, Patient, Report, User};

pub fn seed_user(conn: &Connection, role: Role, sector: &str, district: &str) -> User {
    seed_user_with_status(conn, role, sector, district, ApprovalStatus::Approved)
}

pub fn seed_user_with_status(
    conn: &Connection,
    role: Role,
    sector: &str,
    district: &str,
    approval_status: ApprovalStatus,
) -> User {
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        full_name: "Fixture Vet".into(),
        email: format!("{}@vet.rw", Uuid::new_v4()),
        phone: None,
        password_hash: "fixture-hash".into(),
        role,
        approval_status,
        province: "South".into(),
        district: district.into(),
        sector: sector.into(),
        created_at: now,
        updated_at: now,
    };
    repository::insert_user(conn, &user).expect("seed user");
    user
}

pub fn seed_patient(conn: &Connection, vet: &User, sector: &str, district: &str) -> Patient {
    let now = Utc::now();
    let patient = Patient {
        id: Uuid::new_v4(),
        animal_name: "Inka".into(),
        species: "cattle".into(),
        breed: Some("Ankole".into()),
        age_months: Some(30),
        owner_name: "Mukamana".into(),
        owner_phone: None,
        province: "South".into(),
        district: district.into(),
        sector: sector.into(),
        cell: None,
        village: None,
        prior_conditions: None,
        veterinarian_id: vet.id,
        created_at: now,
        updated_at: now,
    };
    repository::insert_patient(conn, &patient).expect("seed patient");
    patient
}

pub fn seed_medicine(conn: &Connection, vet: &User, total_stock: i64) -> Medicine {
    let now = Utc::now();
    let medicine = Medicine {
        id: Uuid::new_v4(),
        name: "Oxytetracycline".into(),
        description: None,
        unit: "ml".into(),
        total_stock,
        current_stock: total_stock,
        stock_in: 0,
        stock_out: 0,
        expiry_date: None,
        veterinarian_id: vet.id,
        created_at: now,
        updated_at: now,
    };
    repository::insert_medicine(conn, &medicine).expect("seed medicine");
    medicine
}

pub fn seed_report(conn: &Connection, submitter: &User) -> Report {
    let now = Utc::now();
    let report = Report {
        id: Uuid::new_v4(),
        title: "Monthly activity".into(),
        content: "Vaccinated 40 cattle.".into(),
        report_type: ReportType::Monthly,
        status: ReportStatus::Pending,
        submitter_id: submitter.id,
        province: submitter.province.clone(),
        district: submitter.district.clone(),
        sector: submitter.sector.clone(),
        sector_vet_notes: None,
        sector_reviewer_id: None,
        sector_reviewed_at: None,
        district_vet_notes: None,
        district_reviewer_id: None,
        district_reviewed_at: None,
        attachment_ref: None,
        created_at: now,
        updated_at: now,
    };
    repository::insert_report(conn, &report).expect("seed report");
    report
}

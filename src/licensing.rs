//! License application workflow.
//!
//! District-tier reviewers decide applications; approval mints a sequential
//! license number of the form `RVC-<year>-<seq>`. The number is assigned
//! inside the approving transaction so two concurrent approvals cannot
//! observe the same count.

use chrono::{Datelike, Utc};
use rusqlite::{Connection, TransactionBehavior};
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::enums::{LicenseStatus, LicenseType, Role};
use crate::models::LicenseApplication;
use crate::scope::ScopeDescriptor;

#[derive(Debug, Error)]
pub enum LicensingError {
    #[error("License application not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: LicenseStatus,
        to: LicenseStatus,
    },

    #[error("Only district-tier reviewers may decide license applications")]
    NotReviewer,

    #[error("Only the applicant may do this")]
    NotApplicant,

    #[error("Application is not in an actionable state: {0:?}")]
    NotActionable(LicenseStatus),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for LicensingError {
    fn from(err: rusqlite::Error) -> Self {
        LicensingError::Database(DatabaseError::Sqlite(err))
    }
}

/// Reviewer verdicts apply to pending applications only. `pending` itself
/// is never a verdict; resubmission is the only way back.
pub fn validate_decision(
    current: LicenseStatus,
    verdict: LicenseStatus,
) -> Result<(), LicensingError> {
    let allowed = current == LicenseStatus::Pending
        && matches!(
            verdict,
            LicenseStatus::Approved | LicenseStatus::Rejected | LicenseStatus::RequiresDocuments
        );
    if allowed {
        Ok(())
    } else {
        Err(LicensingError::InvalidTransition {
            from: current,
            to: verdict,
        })
    }
}

/// Submit a new application. Always starts pending, with no number.
pub fn submit_application(
    conn: &Connection,
    applicant: &ScopeDescriptor,
    license_type: LicenseType,
    specialization: &str,
    document_ref: Option<&str>,
) -> Result<LicenseApplication, LicensingError> {
    let now = Utc::now();
    let app = LicenseApplication {
        id: Uuid::new_v4(),
        applicant_id: applicant.user_id,
        license_type,
        specialization: specialization.to_string(),
        document_ref: document_ref.map(str::to_string),
        status: LicenseStatus::Pending,
        license_number: None,
        review_notes: None,
        reviewer_id: None,
        reviewed_at: None,
        created_at: now,
        updated_at: now,
    };
    repository::insert_license_application(conn, &app)?;
    tracing::info!(application_id = %app.id, license_type = license_type.as_str(), "license application submitted");
    Ok(app)
}

/// Apply a reviewer decision. On approval the license number is minted from
/// the count of previously approved licenses, read under the same immediate
/// transaction that writes the verdict.
pub fn decide_application(
    conn: &mut Connection,
    application_id: &Uuid,
    reviewer: &ScopeDescriptor,
    verdict: LicenseStatus,
    notes: Option<&str>,
) -> Result<LicenseApplication, LicensingError> {
    if reviewer.role != Role::DistrictVet {
        return Err(LicensingError::NotReviewer);
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let app = repository::get_license_application(&tx, application_id)?
        .ok_or(LicensingError::NotFound(*application_id))?;
    validate_decision(app.status, verdict)?;

    let number = if verdict == LicenseStatus::Approved {
        let seq = repository::count_approved_licenses(&tx)? + 1;
        Some(format_license_number(Utc::now().year(), seq))
    } else {
        None
    };

    repository::apply_license_review(
        &tx,
        application_id,
        verdict,
        number.as_deref(),
        notes,
        &reviewer.user_id,
    )?;

    let updated = repository::get_license_application(&tx, application_id)?
        .ok_or(LicensingError::NotFound(*application_id))?;
    tx.commit()?;

    tracing::info!(%application_id, status = verdict.as_str(), "license application decided");
    Ok(updated)
}

/// Applicant resubmission after a rejection or a documents request.
pub fn resubmit_application(
    conn: &mut Connection,
    application_id: &Uuid,
    caller: &ScopeDescriptor,
    specialization: &str,
    document_ref: Option<&str>,
) -> Result<LicenseApplication, LicensingError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let app = repository::get_license_application(&tx, application_id)?
        .ok_or(LicensingError::NotFound(*application_id))?;
    if !caller.owns(&app.applicant_id) {
        return Err(LicensingError::NotApplicant);
    }
    if !matches!(
        app.status,
        LicenseStatus::Rejected | LicenseStatus::RequiresDocuments
    ) {
        return Err(LicensingError::NotActionable(app.status));
    }

    repository::apply_license_resubmission(&tx, application_id, specialization, document_ref)?;
    let updated = repository::get_license_application(&tx, application_id)?
        .ok_or(LicensingError::NotFound(*application_id))?;
    tx.commit()?;
    Ok(updated)
}

fn format_license_number(year: i32, seq: i64) -> String {
    format!("RVC-{year}-{seq:04}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::testutil::seed_user;

    #[test]
    fn license_numbers_are_sequential() {
        let mut conn = open_memory_database().unwrap();
        let reviewer = seed_user(&conn, Role::DistrictVet, "Tumba", "Huye");
        let scope = ScopeDescriptor::from_user(&reviewer);
        let year = Utc::now().year();

        for expected_seq in 1..=3 {
            let applicant = seed_user(&conn, Role::BasicVet, "Ngoma", "Huye");
            let app = submit_application(
                &conn,
                &ScopeDescriptor::from_user(&applicant),
                LicenseType::BasicPractice,
                "small animal practice",
                None,
            )
            .unwrap();

            let decided =
                decide_application(&mut conn, &app.id, &scope, LicenseStatus::Approved, None)
                    .unwrap();
            assert_eq!(
                decided.license_number.as_deref(),
                Some(format!("RVC-{year}-{expected_seq:04}").as_str())
            );
        }
    }

    #[test]
    fn only_district_tier_decides() {
        let mut conn = open_memory_database().unwrap();
        let applicant = seed_user(&conn, Role::BasicVet, "Ngoma", "Huye");
        let sector_vet = seed_user(&conn, Role::SectorVet, "Ngoma", "Huye");
        let app = submit_application(
            &conn,
            &ScopeDescriptor::from_user(&applicant),
            LicenseType::BasicPractice,
            "poultry",
            None,
        )
        .unwrap();

        let err = decide_application(
            &mut conn,
            &app.id,
            &ScopeDescriptor::from_user(&sector_vet),
            LicenseStatus::Approved,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, LicensingError::NotReviewer));
    }

    #[test]
    fn decided_applications_are_final_until_resubmitted() {
        let mut conn = open_memory_database().unwrap();
        let applicant = seed_user(&conn, Role::BasicVet, "Ngoma", "Huye");
        let reviewer = seed_user(&conn, Role::DistrictVet, "Tumba", "Huye");
        let applicant_scope = ScopeDescriptor::from_user(&applicant);
        let reviewer_scope = ScopeDescriptor::from_user(&reviewer);
        let app = submit_application(
            &conn,
            &applicant_scope,
            LicenseType::SpecialistPractice,
            "bovine surgery",
            Some("uploads/cv.pdf"),
        )
        .unwrap();

        decide_application(
            &mut conn,
            &app.id,
            &reviewer_scope,
            LicenseStatus::RequiresDocuments,
            Some("surgery certification missing"),
        )
        .unwrap();

        // A second decision on a non-pending application is rejected
        let err = decide_application(
            &mut conn,
            &app.id,
            &reviewer_scope,
            LicenseStatus::Approved,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, LicensingError::InvalidTransition { .. }));

        let resubmitted = resubmit_application(
            &mut conn,
            &app.id,
            &applicant_scope,
            "bovine surgery",
            Some("uploads/cert.pdf"),
        )
        .unwrap();
        assert_eq!(resubmitted.status, LicenseStatus::Pending);

        let approved = decide_application(
            &mut conn,
            &app.id,
            &reviewer_scope,
            LicenseStatus::Approved,
            Some("verified"),
        )
        .unwrap();
        assert_eq!(approved.status, LicenseStatus::Approved);
        assert!(approved.license_number.is_some());
    }

    #[test]
    fn resubmission_requires_the_applicant() {
        let mut conn = open_memory_database().unwrap();
        let applicant = seed_user(&conn, Role::BasicVet, "Ngoma", "Huye");
        let stranger = seed_user(&conn, Role::BasicVet, "Ngoma", "Huye");
        let reviewer = seed_user(&conn, Role::DistrictVet, "Tumba", "Huye");
        let app = submit_application(
            &conn,
            &ScopeDescriptor::from_user(&applicant),
            LicenseType::BasicPractice,
            "poultry",
            None,
        )
        .unwrap();
        decide_application(
            &mut conn,
            &app.id,
            &ScopeDescriptor::from_user(&reviewer),
            LicenseStatus::Rejected,
            None,
        )
        .unwrap();

        let err = resubmit_application(
            &mut conn,
            &app.id,
            &ScopeDescriptor::from_user(&stranger),
            "poultry",
            None,
        )
        .unwrap_err();
        assert!(matches!(err, LicensingError::NotApplicant));
    }
}

//! Account registration, credential verification, and registration approval.
//!
//! New accounts start in `pending` and cannot authenticate until a
//! district-tier reviewer approves them. Password hashes are
//! PBKDF2-HMAC-SHA256 over a per-user random salt, stored as
//! `base64(salt)$base64(hash)`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rusqlite::Connection;
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::enums::{ApprovalStatus, Role};
use crate::models::User;
use crate::scope::ScopeDescriptor;

const PBKDF2_ITERATIONS: u32 = 600_000;
const HASH_LENGTH: usize = 32;
const SALT_LENGTH: usize = 16;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is not approved: {0:?}")]
    NotApproved(ApprovalStatus),

    #[error("Registration not found: {0}")]
    NotFound(Uuid),

    #[error("Caller may not administer registrations for this district")]
    OutOfScope,

    #[error("Registration has already been decided: {0:?}")]
    AlreadyDecided(ApprovalStatus),

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub struct NewRegistration<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub password: &'a str,
    pub role: Role,
    pub province: &'a str,
    pub district: &'a str,
    pub sector: &'a str,
}

pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    let mut hash = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut hash);
    format!("{}${}", BASE64.encode(salt), BASE64.encode(hash))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_b64, hash_b64)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (BASE64.decode(salt_b64), BASE64.decode(hash_b64)) else {
        return false;
    };
    let mut hash = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut hash);
    // Not secret-dependent in length; constant-time compare over fixed size
    expected.len() == HASH_LENGTH
        && expected
            .iter()
            .zip(hash.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Create a pending account. Email uniqueness is enforced here and backed
/// by the UNIQUE constraint on the column.
pub fn register(conn: &Connection, reg: &NewRegistration<'_>) -> Result<User, AccountError> {
    if reg.email.trim().is_empty() || !reg.email.contains('@') {
        return Err(AccountError::Invalid("email is not valid".into()));
    }
    if reg.password.len() < 8 {
        return Err(AccountError::Invalid(
            "password must be at least 8 characters".into(),
        ));
    }
    if repository::get_user_by_email(conn, reg.email)?.is_some() {
        return Err(AccountError::EmailTaken);
    }

    let now = chrono::Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        full_name: reg.full_name.to_string(),
        email: reg.email.to_string(),
        phone: reg.phone.map(str::to_string),
        password_hash: hash_password(reg.password),
        role: reg.role,
        approval_status: ApprovalStatus::Pending,
        province: reg.province.to_string(),
        district: reg.district.to_string(),
        sector: reg.sector.to_string(),
        created_at: now,
        updated_at: now,
    };
    repository::insert_user(conn, &user)?;
    tracing::info!(user_id = %user.id, role = user.role.as_str(), "registration submitted");
    Ok(user)
}

/// Verify credentials. Pending and rejected accounts are refused even with
/// a correct password, and the refusal names the status so callers can map
/// it to a distinct response.
pub fn login(conn: &Connection, email: &str, password: &str) -> Result<User, AccountError> {
    let Some(user) = repository::get_user_by_email(conn, email)? else {
        return Err(AccountError::InvalidCredentials);
    };
    if !verify_password(password, &user.password_hash) {
        return Err(AccountError::InvalidCredentials);
    }
    if user.approval_status != ApprovalStatus::Approved {
        return Err(AccountError::NotApproved(user.approval_status));
    }
    Ok(user)
}

/// Pending registrations visible to a district reviewer.
pub fn pending_registrations(
    conn: &Connection,
    reviewer: &ScopeDescriptor,
) -> Result<Vec<User>, AccountError> {
    if reviewer.role != Role::DistrictVet {
        return Err(AccountError::OutOfScope);
    }
    Ok(repository::list_pending_registrations(
        conn,
        &reviewer.district,
    )?)
}

/// Approve or reject a pending registration. Only district reviewers, only
/// for accounts registered in their own district, and only once.
pub fn decide_registration(
    conn: &Connection,
    user_id: &Uuid,
    reviewer: &ScopeDescriptor,
    approve: bool,
) -> Result<User, AccountError> {
    let user = repository::get_user(conn, user_id)?
        .ok_or(AccountError::NotFound(*user_id))?;
    if !reviewer.reviews_district(&user.district) {
        return Err(AccountError::OutOfScope);
    }
    if user.approval_status != ApprovalStatus::Pending {
        return Err(AccountError::AlreadyDecided(user.approval_status));
    }

    let status = if approve {
        ApprovalStatus::Approved
    } else {
        ApprovalStatus::Rejected
    };
    repository::set_approval_status(conn, user_id, status)?;
    tracing::info!(%user_id, status = status.as_str(), "registration decided");
    repository::get_user(conn, user_id)?.ok_or(AccountError::NotFound(*user_id))
}

pub mod license;
pub mod medicine;
pub mod patient;
pub mod report;
pub mod treatment;
pub mod user;

pub use license::*;
pub use medicine::*;
pub use patient::*;
pub use report::*;
pub use treatment::*;
pub use user::*;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::db::DatabaseError;

/// IDs and timestamps are stored as TEXT; these helpers centralize the
/// parse-or-constraint-error mapping used across repositories.
pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

pub(crate) fn parse_ts(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

pub(crate) fn parse_opt_ts(s: Option<String>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    s.map(|v| parse_ts(&v)).transpose()
}

pub(crate) fn parse_opt_uuid(s: Option<String>) -> Result<Option<Uuid>, DatabaseError> {
    s.map(|v| parse_uuid(&v)).transpose()
}

pub(crate) fn parse_opt_date(s: Option<String>) -> Option<NaiveDate> {
    s.and_then(|v| NaiveDate::parse_from_str(&v, "%Y-%m-%d").ok())
}

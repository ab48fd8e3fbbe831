//! Endpoint handlers, one module per resource.

pub mod auth;
pub mod health;
pub mod licenses;
pub mod medicines;
pub mod patients;
pub mod reports;
pub mod treatments;

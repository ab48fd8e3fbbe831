pub mod accounts;
pub mod api;
pub mod config;
pub mod db;
pub mod ledger;
pub mod licensing;
pub mod models;
pub mod review;
pub mod scope;

#[cfg(test)]
mod testutil;

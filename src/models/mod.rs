pub mod enums;
pub mod license;
pub mod medicine;
pub mod patient;
pub mod report;
pub mod treatment;
pub mod user;

pub use license::LicenseApplication;
pub use medicine::{Medicine, StockMovement};
pub use patient::Patient;
pub use report::Report;
pub use treatment::Treatment;
pub use user::User;

//! Data access for hospital records (hospitals, departments, patients and
//! staff) stored in ScyllaDB.

pub mod config;
pub mod database;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod registry;
pub mod repositories;
pub mod types;

pub use config::{AppConfig, DatabaseConfig};
pub use database::{ConnectionManager, ScyllaConnection};
pub use errors::HospitalError;
pub use registry::{Overview, Registry};

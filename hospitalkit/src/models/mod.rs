pub mod department;
pub mod hospital;
pub mod patient;
pub mod person;
pub mod staff;

pub use department::{Department, DepartmentUpdate, NewDepartment};
pub use hospital::{Hospital, HospitalUpdate, NewHospital};
pub use patient::{NewPatient, Patient, PatientUpdate};
pub use staff::{NewStaff, Staff, StaffUpdate};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::errors::HospitalError;
use crate::types::{ColumnValue, RowData};

/// One assignable column in an UPDATE. Each entity exposes an enum of the
/// fields it allows to change; keys and `created_at` are never among them.
pub trait FieldUpdate {
    fn column(&self) -> &'static str;
    fn into_value(self) -> ColumnValue;

    fn validate(&self) -> Result<(), HospitalError> {
        Ok(())
    }
}

/// Parse free-text identifiers. Anything that is not a UUID is `None`, which
/// callers treat as "not found".
pub fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

pub fn parse_date_of_birth(raw: &str) -> Result<NaiveDate, HospitalError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
        HospitalError::Validation(format!("date of birth {:?} is not YYYY-MM-DD: {}", raw, e))
    })
}

/// Whole years between `date_of_birth` and `today`, counted as 365.25-day
/// years. The result is stored and not recomputed on read, so it goes stale.
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> i32 {
    let days = today.signed_duration_since(date_of_birth).num_days();
    if days <= 0 {
        return 0;
    }
    (days as f64 / 365.25).floor() as i32
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<(), HospitalError> {
    if value.trim().is_empty() {
        Err(HospitalError::Validation(format!("{} is required", field)))
    } else {
        Ok(())
    }
}

pub(crate) fn required<T>(column: &str, value: Option<T>) -> Result<T, HospitalError> {
    value.ok_or_else(|| HospitalError::RowMapping(format!("missing column {}", column)))
}

pub(crate) fn required_text(row: &RowData, column: &str) -> Result<String, HospitalError> {
    required(column, row.text(column))
}

pub(crate) fn required_uuid(row: &RowData, column: &str) -> Result<Uuid, HospitalError> {
    required(column, row.uuid(column))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()), Some(id));
        assert_eq!(parse_id(&format!("  {}\n", id)), Some(id));
        assert_eq!(parse_id("patient-42"), None);
        assert_eq!(parse_id(""), None);
    }

    #[test]
    fn test_age_on() {
        let dob = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        assert_eq!(age_on(dob, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()), 35);
        assert_eq!(age_on(dob, NaiveDate::from_ymd_opt(1990, 12, 31).unwrap()), 0);
        assert_eq!(age_on(dob, NaiveDate::from_ymd_opt(1980, 1, 1).unwrap()), 0);
    }

    #[test]
    fn test_parse_date_of_birth() {
        assert_eq!(
            parse_date_of_birth(" 1990-01-01 ").unwrap(),
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()
        );
        assert!(matches!(
            parse_date_of_birth("01/01/1990"),
            Err(HospitalError::Validation(_))
        ));
    }

    #[test]
    fn test_require_text() {
        assert!(require_text("name", "Cardiology").is_ok());
        assert!(require_text("name", "   ").is_err());
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::person::full_name;
use super::{age_on, require_text, required, required_text, required_uuid, FieldUpdate};
use crate::errors::HospitalError;
use crate::types::{ColumnValue, RowData};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub department_id: Uuid,
    pub patient_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub age: i32,
    pub phone: String,
    pub medical_record: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub age: i32,
    pub phone: String,
    #[serde(default)]
    pub medical_record: Option<String>,
}

impl NewPatient {
    /// Build a patient whose age is derived from the date of birth as of
    /// `today`.
    pub fn born_on(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        date_of_birth: NaiveDate,
        phone: impl Into<String>,
        today: NaiveDate,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_birth,
            age: age_on(date_of_birth, today),
            phone: phone.into(),
            medical_record: None,
        }
    }

    /// Keep an explicitly stated age instead of the derived one.
    pub fn with_stated_age(mut self, age: Option<i32>) -> Self {
        if let Some(age) = age {
            self.age = age;
        }
        self
    }

    pub fn with_medical_record(mut self, record: Option<String>) -> Self {
        self.medical_record = record;
        self
    }

    pub fn validate(&self) -> Result<(), HospitalError> {
        require_text("first_name", &self.first_name)?;
        require_text("last_name", &self.last_name)?;
        require_text("phone", &self.phone)?;
        if self.age < 0 {
            return Err(HospitalError::Validation("age must not be negative".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientUpdate {
    FirstName(String),
    LastName(String),
    DateOfBirth(NaiveDate),
    Age(i32),
    Phone(String),
    MedicalRecord(Option<String>),
}

impl FieldUpdate for PatientUpdate {
    fn column(&self) -> &'static str {
        match self {
            PatientUpdate::FirstName(_) => "first_name",
            PatientUpdate::LastName(_) => "last_name",
            PatientUpdate::DateOfBirth(_) => "date_of_birth",
            PatientUpdate::Age(_) => "age",
            PatientUpdate::Phone(_) => "phone",
            PatientUpdate::MedicalRecord(_) => "medical_record",
        }
    }

    fn into_value(self) -> ColumnValue {
        match self {
            PatientUpdate::FirstName(v) | PatientUpdate::LastName(v) | PatientUpdate::Phone(v) => {
                ColumnValue::Text(v)
            }
            PatientUpdate::DateOfBirth(d) => ColumnValue::Date(d),
            PatientUpdate::Age(a) => ColumnValue::Int(a),
            PatientUpdate::MedicalRecord(v) => v.into(),
        }
    }

    fn validate(&self) -> Result<(), HospitalError> {
        match self {
            PatientUpdate::FirstName(v) => require_text("first_name", v),
            PatientUpdate::LastName(v) => require_text("last_name", v),
            PatientUpdate::Phone(v) => require_text("phone", v),
            PatientUpdate::Age(a) if *a < 0 => {
                Err(HospitalError::Validation("age must not be negative".to_string()))
            }
            _ => Ok(()),
        }
    }
}

impl Patient {
    pub fn full_name(&self) -> String {
        full_name(&self.first_name, &self.last_name)
    }

    pub fn view_record(&self) -> String {
        format!(
            "Patient: {} (ID: {}), DOB: {}, Age: {}, Phone: {}, Department: {}, Medical Record: {}",
            self.full_name(),
            self.patient_id,
            self.date_of_birth,
            self.age,
            self.phone,
            self.department_id,
            self.medical_record.as_deref().unwrap_or("N/A")
        )
    }

    pub fn contact_info(&self) -> String {
        format!("{}: {}", self.full_name(), self.phone)
    }
}

impl fmt::Display for Patient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.view_record())
    }
}

impl TryFrom<&RowData> for Patient {
    type Error = HospitalError;

    fn try_from(row: &RowData) -> Result<Self, Self::Error> {
        Ok(Self {
            department_id: required_uuid(row, "department_id")?,
            patient_id: required_uuid(row, "patient_id")?,
            first_name: required_text(row, "first_name")?,
            last_name: required_text(row, "last_name")?,
            date_of_birth: required("date_of_birth", row.date("date_of_birth"))?,
            age: required("age", row.int("age"))?,
            phone: required_text(row, "phone")?,
            medical_record: row.text("medical_record"),
            created_at: row.timestamp("created_at"),
        })
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::person::full_name;
use super::{require_text, required, required_text, required_uuid, FieldUpdate};
use crate::errors::HospitalError;
use crate::types::{ColumnValue, RowData};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    pub department_id: Uuid,
    pub staff_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub position: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStaff {
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub position: String,
}

impl NewStaff {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        age: i32,
        position: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            age,
            position: position.into(),
        }
    }

    pub fn validate(&self) -> Result<(), HospitalError> {
        require_text("first_name", &self.first_name)?;
        require_text("last_name", &self.last_name)?;
        require_text("position", &self.position)?;
        if self.age < 0 {
            return Err(HospitalError::Validation("age must not be negative".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffUpdate {
    FirstName(String),
    LastName(String),
    Age(i32),
    Position(String),
}

impl FieldUpdate for StaffUpdate {
    fn column(&self) -> &'static str {
        match self {
            StaffUpdate::FirstName(_) => "first_name",
            StaffUpdate::LastName(_) => "last_name",
            StaffUpdate::Age(_) => "age",
            StaffUpdate::Position(_) => "position",
        }
    }

    fn into_value(self) -> ColumnValue {
        match self {
            StaffUpdate::FirstName(v) | StaffUpdate::LastName(v) | StaffUpdate::Position(v) => {
                ColumnValue::Text(v)
            }
            StaffUpdate::Age(a) => ColumnValue::Int(a),
        }
    }

    fn validate(&self) -> Result<(), HospitalError> {
        match self {
            StaffUpdate::FirstName(v) => require_text("first_name", v),
            StaffUpdate::LastName(v) => require_text("last_name", v),
            StaffUpdate::Position(v) => require_text("position", v),
            StaffUpdate::Age(a) if *a < 0 => {
                Err(HospitalError::Validation("age must not be negative".to_string()))
            }
            StaffUpdate::Age(_) => Ok(()),
        }
    }
}

impl Staff {
    pub fn full_name(&self) -> String {
        full_name(&self.first_name, &self.last_name)
    }

    pub fn view_info(&self) -> String {
        format!(
            "Staff: {} (ID: {}), Position: {}, Age: {}, Department: {}",
            self.full_name(),
            self.staff_id,
            self.position,
            self.age,
            self.department_id
        )
    }

    pub fn contact_info(&self) -> String {
        format!("{} - {}", self.full_name(), self.position)
    }
}

impl fmt::Display for Staff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.view_info())
    }
}

impl TryFrom<&RowData> for Staff {
    type Error = HospitalError;

    fn try_from(row: &RowData) -> Result<Self, Self::Error> {
        Ok(Self {
            department_id: required_uuid(row, "department_id")?,
            staff_id: required_uuid(row, "staff_id")?,
            first_name: required_text(row, "first_name")?,
            last_name: required_text(row, "last_name")?,
            age: required("age", row.int("age"))?,
            position: required_text(row, "position")?,
            created_at: row.timestamp("created_at"),
        })
    }
}

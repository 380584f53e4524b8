use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{require_text, required_text, required_uuid, FieldUpdate};
use crate::errors::HospitalError;
use crate::types::{ColumnValue, RowData};

/// A department inside one hospital. Partitioned by `hospital_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub hospital_id: Uuid,
    pub department_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub head_doctor_id: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDepartment {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub head_doctor_id: Option<i32>,
}

impl NewDepartment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            head_doctor_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_head_doctor(mut self, head_doctor_id: i32) -> Self {
        self.head_doctor_id = Some(head_doctor_id);
        self
    }

    pub fn validate(&self) -> Result<(), HospitalError> {
        require_text("name", &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepartmentUpdate {
    Name(String),
    Description(Option<String>),
    HeadDoctorId(Option<i32>),
}

impl FieldUpdate for DepartmentUpdate {
    fn column(&self) -> &'static str {
        match self {
            DepartmentUpdate::Name(_) => "name",
            DepartmentUpdate::Description(_) => "description",
            DepartmentUpdate::HeadDoctorId(_) => "head_doctor_id",
        }
    }

    fn into_value(self) -> ColumnValue {
        match self {
            DepartmentUpdate::Name(v) => ColumnValue::Text(v),
            DepartmentUpdate::Description(v) => v.into(),
            DepartmentUpdate::HeadDoctorId(v) => v.into(),
        }
    }

    fn validate(&self) -> Result<(), HospitalError> {
        match self {
            DepartmentUpdate::Name(v) => require_text("name", v),
            _ => Ok(()),
        }
    }
}

impl Department {
    pub fn view_info(&self) -> String {
        format!(
            "Department: {} (ID: {}), Hospital: {}, Description: {}",
            self.name,
            self.department_id,
            self.hospital_id,
            self.description.as_deref().unwrap_or("N/A")
        )
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.view_info())
    }
}

impl TryFrom<&RowData> for Department {
    type Error = HospitalError;

    fn try_from(row: &RowData) -> Result<Self, Self::Error> {
        Ok(Self {
            hospital_id: required_uuid(row, "hospital_id")?,
            department_id: required_uuid(row, "department_id")?,
            name: required_text(row, "name")?,
            description: row.text("description"),
            head_doctor_id: row.int("head_doctor_id"),
            created_at: row.timestamp("created_at"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_row_with_optional_columns_missing() {
        let (hospital_id, department_id) = (Uuid::new_v4(), Uuid::new_v4());
        let row = RowData::from_columns([
            ("hospital_id", ColumnValue::Uuid(hospital_id)),
            ("department_id", ColumnValue::Uuid(department_id)),
            ("name", ColumnValue::Text("Cardiology".to_string())),
        ]);

        let department = Department::try_from(&row).unwrap();
        assert_eq!(department.hospital_id, hospital_id);
        assert_eq!(department.department_id, department_id);
        assert_eq!(department.description, None);
        assert_eq!(department.head_doctor_id, None);
        assert_eq!(department.created_at, None);
    }

    #[test]
    fn test_view_info() {
        let department = Department {
            hospital_id: Uuid::new_v4(),
            department_id: Uuid::new_v4(),
            name: "Cardiology".to_string(),
            description: Some("Heart care".to_string()),
            head_doctor_id: Some(7),
            created_at: None,
        };
        assert_eq!(
            department.view_info(),
            format!(
                "Department: Cardiology (ID: {}), Hospital: {}, Description: Heart care",
                department.department_id, department.hospital_id
            )
        );

        let bare = Department {
            description: None,
            ..department
        };
        assert!(bare.view_info().ends_with("Description: N/A"));
    }

    #[test]
    fn test_update_values() {
        assert_eq!(DepartmentUpdate::HeadDoctorId(None).into_value(), ColumnValue::Null);
        assert_eq!(
            DepartmentUpdate::HeadDoctorId(Some(3)).into_value(),
            ColumnValue::Int(3)
        );
        assert!(DepartmentUpdate::Name(String::new()).validate().is_err());
        assert!(DepartmentUpdate::Description(None).validate().is_ok());
    }

    #[test]
    fn test_new_department_builder() {
        let new = NewDepartment::new("Oncology")
            .with_description("Cancer care")
            .with_head_doctor(12);
        assert!(new.validate().is_ok());
        assert_eq!(new.head_doctor_id, Some(12));
    }
}

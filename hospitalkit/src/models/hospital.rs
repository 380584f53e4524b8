use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{require_text, required_text, required_uuid, FieldUpdate};
use crate::errors::HospitalError;
use crate::types::{ColumnValue, RowData};

/// Top-level record; owns departments through their partition key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    pub hospital_id: Uuid,
    pub name: String,
    pub location: String,
    pub phone: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHospital {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl NewHospital {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            phone: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn validate(&self) -> Result<(), HospitalError> {
        require_text("name", &self.name)?;
        require_text("location", &self.location)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HospitalUpdate {
    Name(String),
    Location(String),
    Phone(Option<String>),
}

impl FieldUpdate for HospitalUpdate {
    fn column(&self) -> &'static str {
        match self {
            HospitalUpdate::Name(_) => "name",
            HospitalUpdate::Location(_) => "location",
            HospitalUpdate::Phone(_) => "phone",
        }
    }

    fn into_value(self) -> ColumnValue {
        match self {
            HospitalUpdate::Name(v) | HospitalUpdate::Location(v) => ColumnValue::Text(v),
            HospitalUpdate::Phone(v) => v.into(),
        }
    }

    fn validate(&self) -> Result<(), HospitalError> {
        match self {
            HospitalUpdate::Name(v) => require_text("name", v),
            HospitalUpdate::Location(v) => require_text("location", v),
            HospitalUpdate::Phone(_) => Ok(()),
        }
    }
}

impl Hospital {
    pub fn view_info(&self) -> String {
        format!(
            "Hospital: {}, Location: {}, Phone: {}",
            self.name,
            self.location,
            self.phone.as_deref().unwrap_or("N/A")
        )
    }
}

impl fmt::Display for Hospital {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.view_info())
    }
}

impl TryFrom<&RowData> for Hospital {
    type Error = HospitalError;

    fn try_from(row: &RowData) -> Result<Self, Self::Error> {
        Ok(Self {
            hospital_id: required_uuid(row, "hospital_id")?,
            name: required_text(row, "name")?,
            location: required_text(row, "location")?,
            phone: row.text("phone"),
            created_at: row.timestamp("created_at"),
        })
    }
}

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::{name_predicates, non_blank, Entity, EntityTable, Repository};
use crate::database::schema::PATIENTS_TABLE;
use crate::database::ScyllaConnection;
use crate::errors::HospitalError;
use crate::models::{NewPatient, Patient, PatientUpdate};
use crate::types::ColumnValue;

impl Entity for Patient {
    const NAME: &'static str = "patient";
    const TABLE: &'static str = PATIENTS_TABLE;
    const ID_COLUMN: &'static str = "patient_id";
    const PARENT_COLUMN: Option<&'static str> = Some("department_id");

    type Update = PatientUpdate;
}

#[derive(Clone)]
pub struct PatientRepository {
    table: EntityTable<Patient>,
}

impl PatientRepository {
    pub fn new(connection: Arc<ScyllaConnection>) -> Self {
        Self {
            table: EntityTable::new(connection),
        }
    }

    pub async fn create(
        &self,
        department_id: Uuid,
        patient: NewPatient,
    ) -> Result<Uuid, HospitalError> {
        patient.validate()?;
        let id = Uuid::new_v4();
        self.table
            .insert(
                id,
                &[
                    "department_id",
                    "patient_id",
                    "first_name",
                    "last_name",
                    "date_of_birth",
                    "age",
                    "phone",
                    "medical_record",
                ],
                vec![
                    ColumnValue::Uuid(department_id),
                    ColumnValue::Uuid(id),
                    ColumnValue::Text(patient.first_name),
                    ColumnValue::Text(patient.last_name),
                    ColumnValue::Date(patient.date_of_birth),
                    ColumnValue::Int(patient.age),
                    ColumnValue::Text(patient.phone),
                    patient.medical_record.into(),
                ],
            )
            .await
    }

    pub async fn find_by_id(&self, patient_id: Uuid, department_id: Option<Uuid>) -> Option<Patient> {
        self.table.find_by_id(patient_id, department_id).await
    }

    pub async fn find_by_department(&self, department_id: Uuid) -> Vec<Patient> {
        self.table.find_by_parent(department_id).await
    }

    /// Exact match on whichever names are given, across all departments.
    /// Returns nothing when neither name is given.
    pub async fn find_by_name(
        &self,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Vec<Patient> {
        self.table
            .find_where("find_by_name", &name_predicates(first_name, last_name))
            .await
    }

    /// Exact match on the phone number, across all departments. A blank
    /// number matches nothing.
    pub async fn find_by_phone(&self, phone: &str) -> Vec<Patient> {
        let predicates: Vec<(&'static str, &str)> =
            non_blank(Some(phone)).map(|p| ("phone", p)).into_iter().collect();
        self.table.find_where("find_by_phone", &predicates).await
    }

    pub async fn get_all(&self) -> Vec<Patient> {
        self.table.get_all().await
    }

    pub async fn update(
        &self,
        department_id: Uuid,
        patient_id: Uuid,
        changes: Vec<PatientUpdate>,
    ) -> Result<bool, HospitalError> {
        self.table.update(Some(department_id), patient_id, changes).await
    }

    pub async fn delete(&self, department_id: Uuid, patient_id: Uuid) -> Result<bool, HospitalError> {
        self.table.delete(Some(department_id), patient_id).await
    }
}

#[async_trait]
impl Repository for PatientRepository {
    type Record = Patient;

    async fn find_by_id_str(&self, id: &str, department_id: Option<&str>) -> Option<Patient> {
        self.table.find_by_id_str(id, department_id).await
    }

    async fn get_all(&self) -> Vec<Patient> {
        self.table.get_all().await
    }
}

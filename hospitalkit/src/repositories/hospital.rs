use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::{Entity, EntityTable, Repository};
use crate::database::schema::HOSPITALS_TABLE;
use crate::database::ScyllaConnection;
use crate::errors::HospitalError;
use crate::models::{Hospital, HospitalUpdate, NewHospital};
use crate::types::ColumnValue;

impl Entity for Hospital {
    const NAME: &'static str = "hospital";
    const TABLE: &'static str = HOSPITALS_TABLE;
    const ID_COLUMN: &'static str = "hospital_id";
    const PARENT_COLUMN: Option<&'static str> = None;

    type Update = HospitalUpdate;
}

#[derive(Clone)]
pub struct HospitalRepository {
    table: EntityTable<Hospital>,
}

impl HospitalRepository {
    pub fn new(connection: Arc<ScyllaConnection>) -> Self {
        Self {
            table: EntityTable::new(connection),
        }
    }

    pub async fn create(&self, hospital: NewHospital) -> Result<Uuid, HospitalError> {
        hospital.validate()?;
        let id = Uuid::new_v4();
        self.table
            .insert(
                id,
                &["hospital_id", "name", "location", "phone"],
                vec![
                    ColumnValue::Uuid(id),
                    ColumnValue::Text(hospital.name),
                    ColumnValue::Text(hospital.location),
                    hospital.phone.into(),
                ],
            )
            .await
    }

    pub async fn find_by_id(&self, hospital_id: Uuid) -> Option<Hospital> {
        self.table.find_by_id(hospital_id, None).await
    }

    pub async fn try_find_by_id(&self, hospital_id: Uuid) -> Result<Option<Hospital>, HospitalError> {
        self.table.try_find_by_id(hospital_id, None).await
    }

    pub async fn get_all(&self) -> Vec<Hospital> {
        self.table.get_all().await
    }

    pub async fn update(
        &self,
        hospital_id: Uuid,
        changes: Vec<HospitalUpdate>,
    ) -> Result<bool, HospitalError> {
        self.table.update(None, hospital_id, changes).await
    }

    /// Departments of the hospital are not removed.
    pub async fn delete(&self, hospital_id: Uuid) -> Result<bool, HospitalError> {
        self.table.delete(None, hospital_id).await
    }
}

#[async_trait]
impl Repository for HospitalRepository {
    type Record = Hospital;

    async fn find_by_id_str(&self, id: &str, _parent_id: Option<&str>) -> Option<Hospital> {
        self.table.find_by_id_str(id, None).await
    }

    async fn get_all(&self) -> Vec<Hospital> {
        self.table.get_all().await
    }
}

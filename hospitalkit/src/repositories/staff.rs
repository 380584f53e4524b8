use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::{name_predicates, Entity, EntityTable, Repository};
use crate::database::schema::STAFF_TABLE;
use crate::database::ScyllaConnection;
use crate::errors::HospitalError;
use crate::models::{NewStaff, Staff, StaffUpdate};
use crate::types::ColumnValue;

impl Entity for Staff {
    const NAME: &'static str = "staff";
    const TABLE: &'static str = STAFF_TABLE;
    const ID_COLUMN: &'static str = "staff_id";
    const PARENT_COLUMN: Option<&'static str> = Some("department_id");

    type Update = StaffUpdate;
}

#[derive(Clone)]
pub struct StaffRepository {
    table: EntityTable<Staff>,
}

impl StaffRepository {
    pub fn new(connection: Arc<ScyllaConnection>) -> Self {
        Self {
            table: EntityTable::new(connection),
        }
    }

    pub async fn create(&self, department_id: Uuid, staff: NewStaff) -> Result<Uuid, HospitalError> {
        staff.validate()?;
        let id = Uuid::new_v4();
        self.table
            .insert(
                id,
                &["department_id", "staff_id", "first_name", "last_name", "age", "position"],
                vec![
                    ColumnValue::Uuid(department_id),
                    ColumnValue::Uuid(id),
                    ColumnValue::Text(staff.first_name),
                    ColumnValue::Text(staff.last_name),
                    ColumnValue::Int(staff.age),
                    ColumnValue::Text(staff.position),
                ],
            )
            .await
    }

    pub async fn find_by_id(&self, staff_id: Uuid, department_id: Option<Uuid>) -> Option<Staff> {
        self.table.find_by_id(staff_id, department_id).await
    }

    pub async fn find_by_department(&self, department_id: Uuid) -> Vec<Staff> {
        self.table.find_by_parent(department_id).await
    }

    pub async fn find_by_name(&self, first_name: Option<&str>, last_name: Option<&str>) -> Vec<Staff> {
        self.table
            .find_where("find_by_name", &name_predicates(first_name, last_name))
            .await
    }

    pub async fn get_all(&self) -> Vec<Staff> {
        self.table.get_all().await
    }

    pub async fn update(
        &self,
        department_id: Uuid,
        staff_id: Uuid,
        changes: Vec<StaffUpdate>,
    ) -> Result<bool, HospitalError> {
        self.table.update(Some(department_id), staff_id, changes).await
    }

    pub async fn delete(&self, department_id: Uuid, staff_id: Uuid) -> Result<bool, HospitalError> {
        self.table.delete(Some(department_id), staff_id).await
    }
}

#[async_trait]
impl Repository for StaffRepository {
    type Record = Staff;

    async fn find_by_id_str(&self, id: &str, department_id: Option<&str>) -> Option<Staff> {
        self.table.find_by_id_str(id, department_id).await
    }

    async fn get_all(&self) -> Vec<Staff> {
        self.table.get_all().await
    }
}

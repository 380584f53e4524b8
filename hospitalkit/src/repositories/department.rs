use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::{Entity, EntityTable, Repository};
use crate::database::schema::DEPARTMENTS_TABLE;
use crate::database::ScyllaConnection;
use crate::errors::HospitalError;
use crate::models::{Department, DepartmentUpdate, NewDepartment};
use crate::types::ColumnValue;

impl Entity for Department {
    const NAME: &'static str = "department";
    const TABLE: &'static str = DEPARTMENTS_TABLE;
    const ID_COLUMN: &'static str = "department_id";
    const PARENT_COLUMN: Option<&'static str> = Some("hospital_id");

    type Update = DepartmentUpdate;
}

/// Departments, partitioned by hospital.
#[derive(Clone)]
pub struct DepartmentRepository {
    table: EntityTable<Department>,
}

impl DepartmentRepository {
    pub fn new(connection: Arc<ScyllaConnection>) -> Self {
        Self {
            table: EntityTable::new(connection),
        }
    }

    /// Insert without checking that the hospital exists; see
    /// `Registry::add_department` for the checked variant.
    pub async fn create(
        &self,
        hospital_id: Uuid,
        department: NewDepartment,
    ) -> Result<Uuid, HospitalError> {
        department.validate()?;
        let id = Uuid::new_v4();
        self.table
            .insert(
                id,
                &["hospital_id", "department_id", "name", "description", "head_doctor_id"],
                vec![
                    ColumnValue::Uuid(hospital_id),
                    ColumnValue::Uuid(id),
                    ColumnValue::Text(department.name),
                    department.description.into(),
                    department.head_doctor_id.into(),
                ],
            )
            .await
    }

    /// Without `hospital_id` this scans the whole table.
    pub async fn find_by_id(
        &self,
        department_id: Uuid,
        hospital_id: Option<Uuid>,
    ) -> Option<Department> {
        self.table.find_by_id(department_id, hospital_id).await
    }

    /// Like `find_by_id`, but a failed read is an error instead of `None`.
    pub async fn try_find_by_id(
        &self,
        department_id: Uuid,
        hospital_id: Option<Uuid>,
    ) -> Result<Option<Department>, HospitalError> {
        self.table.try_find_by_id(department_id, hospital_id).await
    }

    pub async fn find_by_hospital(&self, hospital_id: Uuid) -> Vec<Department> {
        self.table.find_by_parent(hospital_id).await
    }

    pub async fn get_all(&self) -> Vec<Department> {
        self.table.get_all().await
    }

    pub async fn update(
        &self,
        hospital_id: Uuid,
        department_id: Uuid,
        changes: Vec<DepartmentUpdate>,
    ) -> Result<bool, HospitalError> {
        self.table
            .update(Some(hospital_id), department_id, changes)
            .await
    }

    pub async fn delete(&self, hospital_id: Uuid, department_id: Uuid) -> Result<bool, HospitalError> {
        self.table.delete(Some(hospital_id), department_id).await
    }
}

#[async_trait]
impl Repository for DepartmentRepository {
    type Record = Department;

    async fn find_by_id_str(&self, id: &str, hospital_id: Option<&str>) -> Option<Department> {
        self.table.find_by_id_str(id, hospital_id).await
    }

    async fn get_all(&self) -> Vec<Department> {
        self.table.get_all().await
    }
}

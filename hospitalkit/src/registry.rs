use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

use crate::database::ScyllaConnection;
use crate::errors::HospitalError;
use crate::models::{NewDepartment, NewPatient, NewStaff, Patient};
use crate::repositories::{
    DepartmentRepository, HospitalRepository, PatientRepository, Repository, StaffRepository,
};

/// Counts shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub hospitals: usize,
    pub departments: usize,
    pub patients: usize,
    pub staff: usize,
    pub average_patient_age: Option<f64>,
    /// Newest registrations first.
    pub recent_patients: Vec<Patient>,
}

/// Patients listed under "recent registrations" on the dashboard.
pub const RECENT_REGISTRATIONS: usize = 10;

/// Turn a parent lookup into the outcome of a checked create. A missing
/// parent is `NotFound`; a lookup that could not run fails the create.
fn check_parent<T>(
    child: &'static str,
    parent: &'static str,
    parent_id: Uuid,
    lookup: Result<Option<T>, HospitalError>,
) -> Result<(), HospitalError> {
    match lookup {
        Ok(Some(_)) => Ok(()),
        Ok(None) => {
            warn!("Refusing {} for unknown {} {}", child, parent, parent_id);
            Err(HospitalError::NotFound {
                entity: parent,
                id: parent_id,
            })
        }
        Err(e) => {
            error!("Could not look up {} {} for new {}: {}", parent, parent_id, child, e);
            Err(HospitalError::write(child, "create", e))
        }
    }
}

/// The four repositories over one shared session, plus the creates that
/// check the parent record first.
#[derive(Clone)]
pub struct Registry {
    pub hospitals: HospitalRepository,
    pub departments: DepartmentRepository,
    pub patients: PatientRepository,
    pub staff: StaffRepository,
}

impl Registry {
    pub fn new(connection: Arc<ScyllaConnection>) -> Self {
        Self {
            hospitals: HospitalRepository::new(connection.clone()),
            departments: DepartmentRepository::new(connection.clone()),
            patients: PatientRepository::new(connection.clone()),
            staff: StaffRepository::new(connection),
        }
    }

    /// Insert a department once its hospital is known to exist. The check
    /// and the insert are separate round trips.
    pub async fn add_department(
        &self,
        hospital_id: Uuid,
        department: NewDepartment,
    ) -> Result<Uuid, HospitalError> {
        let lookup = self.hospitals.try_find_by_id(hospital_id).await;
        check_parent("department", "hospital", hospital_id, lookup)?;
        self.departments.create(hospital_id, department).await
    }

    pub async fn add_patient(
        &self,
        department_id: Uuid,
        patient: NewPatient,
    ) -> Result<Uuid, HospitalError> {
        self.require_department("patient", department_id).await?;
        self.patients.create(department_id, patient).await
    }

    pub async fn add_staff(&self, department_id: Uuid, staff: NewStaff) -> Result<Uuid, HospitalError> {
        self.require_department("staff", department_id).await?;
        self.staff.create(department_id, staff).await
    }

    // Departments are only reachable by id through a table scan.
    async fn require_department(
        &self,
        child: &'static str,
        department_id: Uuid,
    ) -> Result<(), HospitalError> {
        let lookup = self.departments.try_find_by_id(department_id, None).await;
        check_parent(child, "department", department_id, lookup)
    }

    pub async fn overview(&self) -> Overview {
        let patients = self.patients.get_all().await;
        Overview {
            hospitals: self.hospitals.count().await,
            departments: self.departments.count().await,
            patients: patients.len(),
            staff: self.staff.count().await,
            average_patient_age: average_age(&patients),
            recent_patients: recent_registrations(&patients, RECENT_REGISTRATIONS),
        }
    }
}

/// The `limit` most recently created patients, newest first. Rows without a
/// creation time sort last.
pub fn recent_registrations(patients: &[Patient], limit: usize) -> Vec<Patient> {
    let mut recent = patients.to_vec();
    recent.sort_by_key(|p| Reverse(p.created_at));
    recent.truncate(limit);
    recent
}

pub fn average_age(patients: &[Patient]) -> Option<f64> {
    if patients.is_empty() {
        return None;
    }
    let total: i64 = patients.iter().map(|p| p.age as i64).sum();
    Some(total as f64 / patients.len() as f64)
}

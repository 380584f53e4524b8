// Store-backed tests. They need a ScyllaDB node reachable at SCYLLA_HOST
// (default 127.0.0.1) and run with `cargo test -- --ignored`.

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use hospitalkit::config::{DatabaseConfig, IpFamily};
use hospitalkit::database::schema;
use hospitalkit::models::{
    DepartmentUpdate, HospitalUpdate, NewDepartment, NewHospital, NewPatient, NewStaff,
    PatientUpdate, StaffUpdate,
};
use hospitalkit::repositories::Repository;
use hospitalkit::{ConnectionManager, HospitalError, Registry, ScyllaConnection};

async fn connect() -> Arc<ScyllaConnection> {
    let config = DatabaseConfig {
        hosts: vec![std::env::var("SCYLLA_HOST").unwrap_or_else(|_| "127.0.0.1".to_string())],
        keyspace: "hospital_test".to_string(),
        ip_family: IpFamily::Any,
        ..DatabaseConfig::default()
    };
    let mut manager = ConnectionManager::new(config.clone());
    let connection = manager.connect(3, Duration::from_secs(1)).await.unwrap();
    schema::initialize(&connection, &config.keyspace, config.replication_factor)
        .await
        .unwrap();
    connection
}

fn dob() -> NaiveDate {
    NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()
}

fn ahmed() -> NewPatient {
    NewPatient {
        first_name: "Ahmed".to_string(),
        last_name: "Hassan".to_string(),
        date_of_birth: dob(),
        age: 35,
        phone: "0100".to_string(),
        medical_record: None,
    }
}

async fn hospital_with_department(registry: &Registry) -> (Uuid, Uuid) {
    let hospital_id = registry
        .hospitals
        .create(NewHospital::new("Cairo Medical", "Tahrir, Cairo"))
        .await
        .unwrap();
    let department_id = registry
        .add_department(hospital_id, NewDepartment::new("Cardiology"))
        .await
        .unwrap();
    (hospital_id, department_id)
}

#[tokio::test]
#[ignore] // Requires running ScyllaDB instance
async fn test_initialize_is_idempotent() {
    let connection = connect().await;
    schema::initialize(&connection, "hospital_test", 1).await.unwrap();
    schema::initialize(&connection, "hospital_test", 1).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running ScyllaDB instance
async fn test_hospital_round_trip() {
    let registry = Registry::new(connect().await);

    let first = registry
        .hospitals
        .create(NewHospital::new("Cairo Medical", "Tahrir, Cairo").with_phone("0223"))
        .await
        .unwrap();
    let second = registry
        .hospitals
        .create(NewHospital::new("Alexandria General", "Smouha"))
        .await
        .unwrap();

    let a = registry.hospitals.find_by_id(first).await.unwrap();
    let b = registry.hospitals.find_by_id(second).await.unwrap();
    assert_eq!(a.name, "Cairo Medical");
    assert_eq!(a.location, "Tahrir, Cairo");
    assert_eq!(a.phone.as_deref(), Some("0223"));
    assert_eq!(b.phone, None);
    assert!(a.created_at.unwrap() <= b.created_at.unwrap());
}

#[tokio::test]
#[ignore] // Requires running ScyllaDB instance
async fn test_patient_scenario() {
    let registry = Registry::new(connect().await);
    let (_, department_id) = hospital_with_department(&registry).await;

    let patient_id = registry.add_patient(department_id, ahmed()).await.unwrap();

    let patients = registry.patients.find_by_department(department_id).await;
    assert_eq!(patients.len(), 1);
    let patient = &patients[0];
    assert_eq!(patient.patient_id, patient_id);
    assert_eq!(patient.full_name(), "Ahmed Hassan");
    assert_eq!(patient.date_of_birth, dob());
    assert_eq!(patient.age, 35);
    assert_eq!(patient.phone, "0100");
    assert_eq!(patient.medical_record, None);
}

#[tokio::test]
#[ignore] // Requires running ScyllaDB instance
async fn test_find_by_parent_returns_all_children() {
    let registry = Registry::new(connect().await);
    let (_, department_id) = hospital_with_department(&registry).await;

    for (first, last) in [("Mona", "Ali"), ("Omar", "Farouk"), ("Sara", "Nabil")] {
        registry
            .add_staff(department_id, NewStaff::new(first, last, 40, "Nurse"))
            .await
            .unwrap();
    }

    let staff = registry.staff.find_by_department(department_id).await;
    assert_eq!(staff.len(), 3);
    assert!(staff.iter().all(|s| s.department_id == department_id));
}

#[tokio::test]
#[ignore] // Requires running ScyllaDB instance
async fn test_wrong_parent_is_absent() {
    let registry = Registry::new(connect().await);
    let (hospital_id, department_id) = hospital_with_department(&registry).await;

    assert!(registry
        .departments
        .find_by_id(department_id, Some(Uuid::new_v4()))
        .await
        .is_none());
    assert!(registry
        .departments
        .find_by_id(department_id, Some(hospital_id))
        .await
        .is_some());
    // Slow path without the partition key.
    assert!(registry.departments.find_by_id(department_id, None).await.is_some());
}

#[tokio::test]
#[ignore] // Requires running ScyllaDB instance
async fn test_same_named_departments_get_distinct_ids() {
    let registry = Registry::new(connect().await);
    let (hospital_id, first) = hospital_with_department(&registry).await;
    let second = registry
        .add_department(hospital_id, NewDepartment::new("Cardiology"))
        .await
        .unwrap();

    assert_ne!(first, second);
    assert_eq!(registry.departments.find_by_hospital(hospital_id).await.len(), 2);
}

#[tokio::test]
#[ignore] // Requires running ScyllaDB instance
async fn test_update_changes_only_named_fields() {
    let registry = Registry::new(connect().await);
    let (hospital_id, department_id) = hospital_with_department(&registry).await;
    let patient_id = registry.add_patient(department_id, ahmed()).await.unwrap();

    let updated = registry
        .patients
        .update(
            department_id,
            patient_id,
            vec![
                PatientUpdate::Phone("0111".to_string()),
                PatientUpdate::MedicalRecord(Some("Hypertension".to_string())),
                PatientUpdate::Phone("0122".to_string()),
            ],
        )
        .await
        .unwrap();
    assert!(updated);

    let patient = registry
        .patients
        .find_by_id(patient_id, Some(department_id))
        .await
        .unwrap();
    assert_eq!(patient.phone, "0122");
    assert_eq!(patient.medical_record.as_deref(), Some("Hypertension"));
    assert_eq!(patient.first_name, "Ahmed");
    assert_eq!(patient.age, 35);

    assert!(registry
        .departments
        .update(
            hospital_id,
            department_id,
            vec![DepartmentUpdate::HeadDoctorId(Some(9))],
        )
        .await
        .unwrap());
    let department = registry
        .departments
        .find_by_id(department_id, Some(hospital_id))
        .await
        .unwrap();
    assert_eq!(department.head_doctor_id, Some(9));
    assert_eq!(department.name, "Cardiology");
}

#[tokio::test]
#[ignore] // Requires running ScyllaDB instance
async fn test_empty_update_is_a_no_op() {
    let registry = Registry::new(connect().await);
    let (hospital_id, _) = hospital_with_department(&registry).await;

    let before = registry.hospitals.find_by_id(hospital_id).await.unwrap();
    assert!(!registry.hospitals.update(hospital_id, Vec::new()).await.unwrap());
    let after = registry.hospitals.find_by_id(hospital_id).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
#[ignore] // Requires running ScyllaDB instance
async fn test_update_missing_row_does_not_create_it() {
    let registry = Registry::new(connect().await);
    let ghost = Uuid::new_v4();

    let updated = registry
        .hospitals
        .update(ghost, vec![HospitalUpdate::Name("Ghost".to_string())])
        .await
        .unwrap();
    assert!(!updated);
    assert!(registry.hospitals.find_by_id(ghost).await.is_none());
}

#[tokio::test]
#[ignore] // Requires running ScyllaDB instance
async fn test_delete() {
    let registry = Registry::new(connect().await);
    let (_, department_id) = hospital_with_department(&registry).await;
    let staff_id = registry
        .add_staff(department_id, NewStaff::new("Mona", "Ali", 41, "Surgeon"))
        .await
        .unwrap();

    assert!(registry.staff.delete(department_id, staff_id).await.unwrap());
    assert!(registry.staff.find_by_id(staff_id, Some(department_id)).await.is_none());
    assert!(!registry.staff.delete(department_id, staff_id).await.unwrap());
    assert!(!registry.staff.delete(department_id, Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
#[ignore] // Requires running ScyllaDB instance
async fn test_delete_does_not_cascade() {
    let registry = Registry::new(connect().await);
    let (hospital_id, department_id) = hospital_with_department(&registry).await;

    assert!(registry.hospitals.delete(hospital_id).await.unwrap());
    assert!(registry
        .departments
        .find_by_id(department_id, Some(hospital_id))
        .await
        .is_some());
}

#[tokio::test]
#[ignore] // Requires running ScyllaDB instance
async fn test_find_by_name() {
    let registry = Registry::new(connect().await);
    let (_, department_id) = hospital_with_department(&registry).await;
    let last_name = format!("Search{}", Uuid::new_v4().simple());
    let staff_id = registry
        .add_staff(department_id, NewStaff::new("Karim", last_name.as_str(), 50, "Radiologist"))
        .await
        .unwrap();

    assert!(registry.staff.find_by_name(None, None).await.is_empty());

    let found = registry.staff.find_by_name(None, Some(&last_name)).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].staff_id, staff_id);

    assert_eq!(
        registry
            .staff
            .find_by_name(Some("Karim"), Some(&last_name))
            .await
            .len(),
        1
    );
    assert!(registry
        .staff
        .find_by_name(Some("Someone"), Some(&last_name))
        .await
        .is_empty());

    assert!(registry
        .staff
        .update(department_id, staff_id, vec![StaffUpdate::Position("Head of Radiology".to_string())])
        .await
        .unwrap());
}

#[tokio::test]
#[ignore] // Requires running ScyllaDB instance
async fn test_registry_rejects_missing_parent() {
    let registry = Registry::new(connect().await);

    let result = registry
        .add_department(Uuid::new_v4(), NewDepartment::new("Oncology"))
        .await;
    assert!(matches!(result, Err(HospitalError::NotFound { entity: "hospital", .. })));

    let result = registry.add_patient(Uuid::new_v4(), ahmed()).await;
    assert!(result.unwrap_err().is_not_found());
}

#[tokio::test]
#[ignore] // Requires running ScyllaDB instance
async fn test_string_ids() {
    let registry = Registry::new(connect().await);
    let (hospital_id, department_id) = hospital_with_department(&registry).await;

    let found = registry
        .departments
        .find_by_id_str(&department_id.to_string(), Some(&hospital_id.to_string()))
        .await;
    assert!(found.is_some());
    assert!(registry
        .departments
        .find_by_id_str("not-a-uuid", Some(&hospital_id.to_string()))
        .await
        .is_none());
    assert!(registry
        .departments
        .find_by_id_str(&department_id.to_string(), Some("bogus"))
        .await
        .is_none());

    assert!(registry.overview().await.departments >= 1);
}

#[tokio::test]
#[ignore] // Requires running ScyllaDB instance
async fn test_find_by_phone_and_recent_registrations() {
    let registry = Registry::new(connect().await);
    let (_, department_id) = hospital_with_department(&registry).await;
    let phone = format!("01{}", Uuid::new_v4().simple());
    let patient_id = registry
        .add_patient(
            department_id,
            NewPatient {
                phone: phone.clone(),
                ..ahmed()
            },
        )
        .await
        .unwrap();

    let found = registry.patients.find_by_phone(&phone).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].patient_id, patient_id);
    assert!(registry.patients.find_by_phone("  ").await.is_empty());

    let overview = registry.overview().await;
    assert!(!overview.recent_patients.is_empty());
    assert!(overview.recent_patients.len() <= hospitalkit::registry::RECENT_REGISTRATIONS);
    assert!(overview.recent_patients[0].created_at.is_some());
}

/// Session on a keyspace whose tables were never created, so every
/// statement against them fails on the server.
async fn connect_without_tables() -> Arc<ScyllaConnection> {
    let config = DatabaseConfig {
        hosts: vec![std::env::var("SCYLLA_HOST").unwrap_or_else(|_| "127.0.0.1".to_string())],
        keyspace: "hospital_no_tables".to_string(),
        ip_family: IpFamily::Any,
        ..DatabaseConfig::default()
    };
    let mut manager = ConnectionManager::new(config.clone());
    let connection = manager.connect(3, Duration::from_secs(1)).await.unwrap();
    schema::create_keyspace(&connection, &config.keyspace, config.replication_factor)
        .await
        .unwrap();
    connection
}

#[tokio::test]
#[ignore] // Requires running ScyllaDB instance
async fn test_store_failures_split_reads_from_writes() {
    let registry = Registry::new(connect_without_tables().await);
    let (department_id, patient_id) = (Uuid::new_v4(), Uuid::new_v4());

    let created = registry.patients.create(department_id, ahmed()).await;
    assert!(matches!(created, Err(HospitalError::Write { operation: "create", .. })));

    assert!(registry.patients.get_all().await.is_empty());
    assert!(registry.patients.find_by_department(department_id).await.is_empty());
    assert!(registry.patients.find_by_name(Some("Ahmed"), None).await.is_empty());
    assert!(registry.patients.find_by_id(patient_id, Some(department_id)).await.is_none());

    let updated = registry
        .patients
        .update(department_id, patient_id, vec![PatientUpdate::Age(36)])
        .await;
    assert!(matches!(updated, Err(HospitalError::Write { operation: "update", .. })));

    let deleted = registry.patients.delete(department_id, patient_id).await;
    assert!(matches!(deleted, Err(HospitalError::Write { operation: "delete", .. })));
}

#[tokio::test]
#[ignore] // Requires running ScyllaDB instance
async fn test_registry_reports_failed_parent_lookup() {
    let registry = Registry::new(connect_without_tables().await);

    let result = registry.add_patient(Uuid::new_v4(), ahmed()).await;
    assert!(matches!(
        result,
        Err(HospitalError::Write {
            entity: "patient",
            operation: "create",
            ..
        })
    ));

    let result = registry
        .add_department(Uuid::new_v4(), NewDepartment::new("Oncology"))
        .await;
    assert!(matches!(
        result,
        Err(HospitalError::Write {
            entity: "department",
            ..
        })
    ));

    assert!(registry
        .departments
        .try_find_by_id(Uuid::new_v4(), None)
        .await
        .is_err());
}

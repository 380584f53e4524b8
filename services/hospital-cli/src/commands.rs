use anyhow::{bail, Result};
use chrono::{NaiveDate, Utc};
use hospitalkit::models::person::describe_person;
use hospitalkit::models::{
    age_on, parse_date_of_birth, parse_id, DepartmentUpdate, HospitalUpdate, NewDepartment,
    NewHospital, NewPatient, NewStaff, PatientUpdate, StaffUpdate,
};
use hospitalkit::repositories::Repository;
use hospitalkit::Registry;
use uuid::Uuid;

use super::{DepartmentCommand, HospitalCommand, PatientCommand, PersonName, StaffCommand};

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Ids given for writes must be well formed; lookups treat bad ids as
/// "not found" instead.
fn require_id(kind: &str, raw: &str) -> Result<Uuid> {
    match parse_id(raw) {
        Some(id) => Ok(id),
        None => bail!("{} id {:?} is not a valid UUID", kind, raw),
    }
}

fn report(kind: &str, id: &str, applied: bool, verb: &str) {
    if applied {
        println!("{} {} {}", kind, id, verb);
    } else {
        println!("{} {} not found, nothing {}", kind, id, verb);
    }
}

fn print_all<T>(records: &[T], empty: &str, line: impl Fn(&T) -> String) {
    if records.is_empty() {
        println!("{}", empty);
    }
    for record in records {
        println!("{}", line(record));
    }
}

pub async fn hospital(registry: &Registry, command: HospitalCommand) -> Result<()> {
    let repo = &registry.hospitals;
    match command {
        HospitalCommand::Add {
            name,
            location,
            phone,
        } => {
            let id = repo
                .create(NewHospital {
                    name,
                    location,
                    phone,
                })
                .await?;
            println!("Created hospital {}", id);
        }
        HospitalCommand::List => {
            let hospitals = repo.get_all().await;
            print_all(&hospitals, "No hospitals", |h| {
                format!("{}  {}", h.hospital_id, h.view_info())
            });
        }
        HospitalCommand::Show { id } => match repo.find_by_id_str(&id, None).await {
            Some(hospital) => println!("{}", hospital.view_info()),
            None => println!("Hospital {} not found", id),
        },
        HospitalCommand::Update {
            id,
            name,
            location,
            phone,
            clear_phone,
        } => {
            let mut changes = Vec::new();
            changes.extend(name.map(HospitalUpdate::Name));
            changes.extend(location.map(HospitalUpdate::Location));
            if clear_phone {
                changes.push(HospitalUpdate::Phone(None));
            } else {
                changes.extend(phone.map(|p| HospitalUpdate::Phone(Some(p))));
            }
            let hospital_id = require_id("hospital", &id)?;
            report("Hospital", &id, repo.update(hospital_id, changes).await?, "updated");
        }
        HospitalCommand::Delete { id } => {
            let hospital_id = require_id("hospital", &id)?;
            report("Hospital", &id, repo.delete(hospital_id).await?, "deleted");
        }
    }
    Ok(())
}

pub async fn department(registry: &Registry, command: DepartmentCommand) -> Result<()> {
    let repo = &registry.departments;
    match command {
        DepartmentCommand::Add {
            hospital,
            name,
            description,
            head_doctor_id,
        } => {
            let hospital_id = require_id("hospital", &hospital)?;
            let id = registry
                .add_department(
                    hospital_id,
                    NewDepartment {
                        name,
                        description,
                        head_doctor_id,
                    },
                )
                .await?;
            println!("Created department {}", id);
        }
        DepartmentCommand::List { hospital } => {
            let departments = match hospital {
                Some(raw) => match parse_id(&raw) {
                    Some(hospital_id) => repo.find_by_hospital(hospital_id).await,
                    None => Vec::new(),
                },
                None => repo.get_all().await,
            };
            print_all(&departments, "No departments", |d| d.view_info());
        }
        DepartmentCommand::Show { id, hospital } => {
            match repo.find_by_id_str(&id, hospital.as_deref()).await {
                Some(department) => println!("{}", department.view_info()),
                None => println!("Department {} not found", id),
            }
        }
        DepartmentCommand::Update {
            id,
            hospital,
            name,
            description,
            head_doctor_id,
        } => {
            let mut changes = Vec::new();
            changes.extend(name.map(DepartmentUpdate::Name));
            changes.extend(description.map(|d| DepartmentUpdate::Description(Some(d))));
            changes.extend(head_doctor_id.map(|h| DepartmentUpdate::HeadDoctorId(Some(h))));
            let hospital_id = require_id("hospital", &hospital)?;
            let department_id = require_id("department", &id)?;
            let applied = repo.update(hospital_id, department_id, changes).await?;
            report("Department", &id, applied, "updated");
        }
        DepartmentCommand::Delete { id, hospital } => {
            let hospital_id = require_id("hospital", &hospital)?;
            let department_id = require_id("department", &id)?;
            let applied = repo.delete(hospital_id, department_id).await?;
            report("Department", &id, applied, "deleted");
        }
    }
    Ok(())
}

pub async fn patient(registry: &Registry, command: PatientCommand) -> Result<()> {
    let repo = &registry.patients;
    match command {
        PatientCommand::Add {
            department,
            first_name,
            last_name,
            dob,
            age,
            phone,
            medical_record,
        } => {
            let department_id = require_id("department", &department)?;
            let date_of_birth = parse_date_of_birth(&dob)?;
            let patient = NewPatient::born_on(first_name, last_name, date_of_birth, phone, today())
                .with_stated_age(age)
                .with_medical_record(medical_record);
            let id = registry.add_patient(department_id, patient).await?;
            println!("Created patient {}", id);
        }
        PatientCommand::List { department } => {
            let patients = match department {
                Some(raw) => match parse_id(&raw) {
                    Some(department_id) => repo.find_by_department(department_id).await,
                    None => Vec::new(),
                },
                None => repo.get_all().await,
            };
            print_all(&patients, "No patients", |p| p.view_record());
        }
        PatientCommand::Show { id, department } => {
            match repo.find_by_id_str(&id, department.as_deref()).await {
                Some(patient) => {
                    println!("{}", patient.view_record());
                    println!("Contact: {}", patient.contact_info());
                }
                None => println!("Patient {} not found", id),
            }
        }
        PatientCommand::Update {
            id,
            department,
            name,
            dob,
            phone,
            medical_record,
        } => {
            let mut changes = Vec::new();
            changes.extend(name.first_name.map(PatientUpdate::FirstName));
            changes.extend(name.last_name.map(PatientUpdate::LastName));
            if let Some(raw) = dob {
                let date_of_birth = parse_date_of_birth(&raw)?;
                changes.push(PatientUpdate::DateOfBirth(date_of_birth));
                changes.push(PatientUpdate::Age(age_on(date_of_birth, today())));
            }
            changes.extend(phone.map(PatientUpdate::Phone));
            changes.extend(medical_record.map(|m| PatientUpdate::MedicalRecord(Some(m))));
            let department_id = require_id("department", &department)?;
            let patient_id = require_id("patient", &id)?;
            let applied = repo.update(department_id, patient_id, changes).await?;
            report("Patient", &id, applied, "updated");
        }
        PatientCommand::Delete { id, department } => {
            let department_id = require_id("department", &department)?;
            let patient_id = require_id("patient", &id)?;
            let applied = repo.delete(department_id, patient_id).await?;
            report("Patient", &id, applied, "deleted");
        }
        PatientCommand::Search { name, phone } => {
            let PersonName {
                first_name,
                last_name,
            } = name;
            let patients = match phone {
                Some(phone) => repo.find_by_phone(&phone).await,
                None => {
                    repo.find_by_name(first_name.as_deref(), last_name.as_deref())
                        .await
                }
            };
            print_all(&patients, "No matching patients", |p| {
                format!(
                    "{}  {}",
                    describe_person(&p.first_name, &p.last_name, p.age),
                    p.contact_info()
                )
            });
        }
    }
    Ok(())
}

pub async fn staff(registry: &Registry, command: StaffCommand) -> Result<()> {
    let repo = &registry.staff;
    match command {
        StaffCommand::Add {
            department,
            first_name,
            last_name,
            age,
            position,
        } => {
            let department_id = require_id("department", &department)?;
            let id = registry
                .add_staff(
                    department_id,
                    NewStaff {
                        first_name,
                        last_name,
                        age,
                        position,
                    },
                )
                .await?;
            println!("Created staff member {}", id);
        }
        StaffCommand::List { department } => {
            let staff = match department {
                Some(raw) => match parse_id(&raw) {
                    Some(department_id) => repo.find_by_department(department_id).await,
                    None => Vec::new(),
                },
                None => repo.get_all().await,
            };
            print_all(&staff, "No staff", |s| s.view_info());
        }
        StaffCommand::Show { id, department } => {
            match repo.find_by_id_str(&id, department.as_deref()).await {
                Some(member) => {
                    println!("{}", member.view_info());
                    println!("Contact: {}", member.contact_info());
                }
                None => println!("Staff member {} not found", id),
            }
        }
        StaffCommand::Update {
            id,
            department,
            name,
            age,
            position,
        } => {
            let mut changes = Vec::new();
            changes.extend(name.first_name.map(StaffUpdate::FirstName));
            changes.extend(name.last_name.map(StaffUpdate::LastName));
            changes.extend(age.map(StaffUpdate::Age));
            changes.extend(position.map(StaffUpdate::Position));
            let department_id = require_id("department", &department)?;
            let staff_id = require_id("staff", &id)?;
            let applied = repo.update(department_id, staff_id, changes).await?;
            report("Staff member", &id, applied, "updated");
        }
        StaffCommand::Delete { id, department } => {
            let department_id = require_id("department", &department)?;
            let staff_id = require_id("staff", &id)?;
            let applied = repo.delete(department_id, staff_id).await?;
            report("Staff member", &id, applied, "deleted");
        }
        StaffCommand::Search { name } => {
            let staff = repo
                .find_by_name(name.first_name.as_deref(), name.last_name.as_deref())
                .await;
            print_all(&staff, "No matching staff", |s| {
                format!(
                    "{}  {}",
                    describe_person(&s.first_name, &s.last_name, s.age),
                    s.contact_info()
                )
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_id() {
        let id = Uuid::new_v4();
        assert_eq!(require_id("hospital", &id.to_string()).unwrap(), id);
        let err = require_id("hospital", "h-1").unwrap_err();
        assert!(err.to_string().contains("not a valid UUID"));
    }
}

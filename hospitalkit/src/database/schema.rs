// Idempotent schema setup for the hospital keyspace. Every statement is
// `IF NOT EXISTS`, so running it on each startup is safe.

use tracing::{debug, info};

use crate::config::validate_identifier;
use crate::database::connection::ScyllaConnection;
use crate::errors::HospitalError;

pub const HOSPITALS_TABLE: &str = "hospitals";
pub const DEPARTMENTS_TABLE: &str = "departments";
pub const PATIENTS_TABLE: &str = "patients";
pub const STAFF_TABLE: &str = "staff";

pub fn keyspace_statement(keyspace: &str, replication_factor: u32) -> String {
    format!(
        "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = \
         {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
        keyspace, replication_factor
    )
}

/// `CREATE TABLE` statements in dependency order: parents before children.
pub fn table_statements(keyspace: &str) -> Vec<(&'static str, String)> {
    vec![
        (
            HOSPITALS_TABLE,
            format!(
                "CREATE TABLE IF NOT EXISTS {}.hospitals (
                    hospital_id uuid PRIMARY KEY,
                    name text,
                    location text,
                    phone text,
                    created_at timestamp
                )",
                keyspace
            ),
        ),
        (
            DEPARTMENTS_TABLE,
            format!(
                "CREATE TABLE IF NOT EXISTS {}.departments (
                    hospital_id uuid,
                    department_id uuid,
                    name text,
                    description text,
                    head_doctor_id int,
                    created_at timestamp,
                    PRIMARY KEY (hospital_id, department_id)
                )",
                keyspace
            ),
        ),
        (
            PATIENTS_TABLE,
            format!(
                "CREATE TABLE IF NOT EXISTS {}.patients (
                    department_id uuid,
                    patient_id uuid,
                    first_name text,
                    last_name text,
                    date_of_birth date,
                    age int,
                    phone text,
                    medical_record text,
                    created_at timestamp,
                    PRIMARY KEY (department_id, patient_id)
                )",
                keyspace
            ),
        ),
        (
            STAFF_TABLE,
            format!(
                "CREATE TABLE IF NOT EXISTS {}.staff (
                    department_id uuid,
                    staff_id uuid,
                    first_name text,
                    last_name text,
                    age int,
                    position text,
                    created_at timestamp,
                    PRIMARY KEY (department_id, staff_id)
                )",
                keyspace
            ),
        ),
    ]
}

pub async fn create_keyspace(
    connection: &ScyllaConnection,
    keyspace: &str,
    replication_factor: u32,
) -> Result<(), HospitalError> {
    validate_identifier(keyspace)?;
    debug!("Creating keyspace {} (replication_factor={})", keyspace, replication_factor);
    connection
        .execute_simple(&keyspace_statement(keyspace, replication_factor))
        .await?;
    Ok(())
}

pub async fn create_tables(connection: &ScyllaConnection, keyspace: &str) -> Result<(), HospitalError> {
    for (table, statement) in table_statements(keyspace) {
        debug!("Creating table {}.{}", keyspace, table);
        connection.execute_simple(&statement).await?;
    }
    Ok(())
}

/// Create the keyspace, switch the session to it, then create the four
/// tables. Must run before any repository is used.
pub async fn initialize(
    connection: &ScyllaConnection,
    keyspace: &str,
    replication_factor: u32,
) -> Result<(), HospitalError> {
    create_keyspace(connection, keyspace, replication_factor).await?;
    connection.use_keyspace(keyspace).await?;
    create_tables(connection, keyspace).await?;

    info!("Schema ready in keyspace {}", keyspace);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyspace_statement() {
        let statement = keyspace_statement("hospital", 3);
        assert!(statement.starts_with("CREATE KEYSPACE IF NOT EXISTS hospital"));
        assert!(statement.contains("'class': 'SimpleStrategy', 'replication_factor': 3"));
    }

    #[test]
    fn test_tables_are_idempotent_and_ordered() {
        let statements = table_statements("hospital");
        let names: Vec<_> = statements.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["hospitals", "departments", "patients", "staff"]);

        for (name, ddl) in &statements {
            assert!(ddl.contains(&format!("IF NOT EXISTS hospital.{} (", name)));
        }
    }

    #[test]
    fn test_key_layout() {
        let statements = table_statements("hospital");
        assert!(statements[0].1.contains("hospital_id uuid PRIMARY KEY"));
        assert!(statements[1].1.contains("PRIMARY KEY (hospital_id, department_id)"));
        assert!(statements[2].1.contains("PRIMARY KEY (department_id, patient_id)"));
        assert!(statements[3].1.contains("PRIMARY KEY (department_id, staff_id)"));
    }

    #[test]
    fn test_final_columns_present() {
        let statements = table_statements("hospital");
        assert!(statements[2].1.contains("medical_record text"));
        assert!(statements[2].1.contains("date_of_birth date"));
        assert!(statements[3].1.contains("first_name text"));
        assert!(statements[3].1.contains("last_name text"));
    }
}

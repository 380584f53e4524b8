/// CQL text for the hospital tables. Column names come from the entity
/// definitions, never from user input; values are always bound with `?`.
pub struct QueryBuilder;

impl QueryBuilder {
    /// Build a parameterized INSERT; `created_at` is stamped server-side.
    pub fn build_insert_query(keyspace: &str, table: &str, columns: &[&str]) -> String {
        let placeholders = vec!["?"; columns.len()].join(", ");
        format!(
            "INSERT INTO {}.{} ({}, created_at) VALUES ({}, toTimestamp(now()))",
            keyspace,
            table,
            columns.join(", "),
            placeholders
        )
    }

    /// Build a simple SELECT over the whole table
    pub fn build_select_query(keyspace: &str, table: &str) -> String {
        format!("SELECT * FROM {}.{}", keyspace, table)
    }

    /// Build a SELECT restricted by key columns (partition, then clustering).
    pub fn build_select_by_key(keyspace: &str, table: &str, key_columns: &[&str]) -> String {
        format!(
            "SELECT * FROM {}.{} WHERE {}",
            keyspace,
            table,
            Self::equality_predicate(key_columns)
        )
    }

    /// Build an unindexed, cross-partition filter. Returns `None` when there
    /// is nothing to filter on, so callers never fall through to a full read.
    pub fn build_filter_query(keyspace: &str, table: &str, columns: &[&str]) -> Option<String> {
        if columns.is_empty() {
            return None;
        }
        Some(format!(
            "SELECT * FROM {}.{} WHERE {} ALLOW FILTERING",
            keyspace,
            table,
            Self::equality_predicate(columns)
        ))
    }

    /// Build an UPDATE; `None` when there is nothing to set.
    pub fn build_update_query(
        keyspace: &str,
        table: &str,
        set_columns: &[&str],
        key_columns: &[&str],
    ) -> Option<String> {
        if set_columns.is_empty() {
            return None;
        }
        let set_clause = set_columns
            .iter()
            .map(|c| format!("{} = ?", c))
            .collect::<Vec<_>>()
            .join(", ");
        Some(format!(
            "UPDATE {}.{} SET {} WHERE {}",
            keyspace,
            table,
            set_clause,
            Self::equality_predicate(key_columns)
        ))
    }

    /// Build a DELETE of a single row
    pub fn build_delete_query(keyspace: &str, table: &str, key_columns: &[&str]) -> String {
        format!(
            "DELETE FROM {}.{} WHERE {}",
            keyspace,
            table,
            Self::equality_predicate(key_columns)
        )
    }

    fn equality_predicate(columns: &[&str]) -> String {
        columns
            .iter()
            .map(|c| format!("{} = ?", c))
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_insert_query() {
        let query = QueryBuilder::build_insert_query(
            "hospital",
            "hospitals",
            &["hospital_id", "name", "location", "phone"],
        );
        assert_eq!(
            query,
            "INSERT INTO hospital.hospitals (hospital_id, name, location, phone, created_at) \
             VALUES (?, ?, ?, ?, toTimestamp(now()))"
        );
    }

    #[test]
    fn test_build_select_by_key() {
        let query = QueryBuilder::build_select_by_key(
            "hospital",
            "patients",
            &["department_id", "patient_id"],
        );
        assert_eq!(
            query,
            "SELECT * FROM hospital.patients WHERE department_id = ? AND patient_id = ?"
        );
    }

    #[test]
    fn test_build_filter_query() {
        let query =
            QueryBuilder::build_filter_query("hospital", "staff", &["first_name", "last_name"])
                .unwrap();
        assert!(query.ends_with("WHERE first_name = ? AND last_name = ? ALLOW FILTERING"));
        assert!(QueryBuilder::build_filter_query("hospital", "staff", &[]).is_none());
    }

    #[test]
    fn test_build_update_query() {
        let query = QueryBuilder::build_update_query(
            "hospital",
            "departments",
            &["name", "description"],
            &["hospital_id", "department_id"],
        )
        .unwrap();
        assert_eq!(
            query,
            "UPDATE hospital.departments SET name = ?, description = ? \
             WHERE hospital_id = ? AND department_id = ?"
        );
        assert!(QueryBuilder::build_update_query("hospital", "departments", &[], &["hospital_id"])
            .is_none());
    }

    #[test]
    fn test_build_delete_query() {
        let query = QueryBuilder::build_delete_query("hospital", "hospitals", &["hospital_id"]);
        assert_eq!(query, "DELETE FROM hospital.hospitals WHERE hospital_id = ?");
    }
}

//! Data access for the four hospital tables.
//!
//! Every repository is a thin typed wrapper over [`EntityTable`], which owns
//! the statement text, the key layout and the failure policy shared by all
//! entities: reads log store errors and come back empty, writes return
//! `HospitalError`.

pub mod department;
pub mod hospital;
pub mod patient;
pub mod staff;

pub use department::DepartmentRepository;
pub use hospital::HospitalRepository;
pub use patient::PatientRepository;
pub use staff::StaffRepository;

use async_trait::async_trait;
use scylla::frame::response::result::CqlValue;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::database::{QueryBuilder, ScyllaConnection};
use crate::errors::HospitalError;
use crate::metrics::OperationTimer;
use crate::models::{parse_id, FieldUpdate};
use crate::types::{ColumnValue, RowData};

/// Static description of a stored record: its table and key layout.
pub trait Entity: for<'a> TryFrom<&'a RowData, Error = HospitalError> + Send + Sync {
    /// Label used in logs, metrics and errors.
    const NAME: &'static str;
    const TABLE: &'static str;
    const ID_COLUMN: &'static str;
    /// Partition key for child entities; `None` when the id is the whole key.
    const PARENT_COLUMN: Option<&'static str>;

    type Update: FieldUpdate + Send;
}

/// Operations every repository offers regardless of entity.
#[async_trait]
pub trait Repository: Send + Sync {
    type Record: Send;

    /// Look up by textual ids. Malformed ids are reported as "not found".
    async fn find_by_id_str(&self, id: &str, parent_id: Option<&str>) -> Option<Self::Record>;

    async fn get_all(&self) -> Vec<Self::Record>;

    async fn count(&self) -> usize {
        self.get_all().await.len()
    }
}

/// Resolve the key used for single-row statements. `None` when a child
/// entity is addressed without its partition key.
fn primary_key<E: Entity>(
    parent_id: Option<Uuid>,
    id: Uuid,
) -> Option<(Vec<&'static str>, Vec<Option<CqlValue>>)> {
    match (E::PARENT_COLUMN, parent_id) {
        (None, _) => Some((vec![E::ID_COLUMN], vec![Some(CqlValue::Uuid(id))])),
        (Some(parent_column), Some(parent_id)) => Some((
            vec![parent_column, E::ID_COLUMN],
            vec![Some(CqlValue::Uuid(parent_id)), Some(CqlValue::Uuid(id))],
        )),
        (Some(_), None) => None,
    }
}

/// Validate a change list and fold it into `(column, value)` pairs. A
/// column named twice keeps the position of its first mention and the value
/// of its last.
pub fn collapse_updates<U: FieldUpdate>(
    changes: Vec<U>,
) -> Result<Vec<(&'static str, ColumnValue)>, HospitalError> {
    let mut assignments: Vec<(&'static str, ColumnValue)> = Vec::with_capacity(changes.len());

    for change in changes {
        change.validate()?;
        let column = change.column();
        let value = change.into_value();
        match assignments.iter_mut().find(|(existing, _)| *existing == column) {
            Some(slot) => slot.1 = value,
            None => assignments.push((column, value)),
        }
    }

    Ok(assignments)
}

/// Parse an optional textual parent id. `Err(())` means it was supplied but
/// malformed, which callers treat as "not found".
pub(crate) fn parse_parent(parent_id: Option<&str>) -> Result<Option<Uuid>, ()> {
    match parent_id {
        None => Ok(None),
        Some(raw) => parse_id(raw).map(Some).ok_or(()),
    }
}

fn map_rows<E: Entity>(rows: Vec<RowData>) -> Vec<E> {
    rows.iter()
        .filter_map(|row| match <E as TryFrom<&RowData>>::try_from(row) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping unreadable {} row: {}", E::NAME, e);
                None
            }
        })
        .collect()
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Build the equality filter for a name search over the supplied names.
pub(crate) fn name_predicates<'a>(
    first_name: Option<&'a str>,
    last_name: Option<&'a str>,
) -> Vec<(&'static str, &'a str)> {
    let mut predicates = Vec::new();
    if let Some(first) = non_blank(first_name) {
        predicates.push(("first_name", first));
    }
    if let Some(last) = non_blank(last_name) {
        predicates.push(("last_name", last));
    }
    predicates
}

/// Statement execution and row mapping for one entity table.
pub struct EntityTable<E: Entity> {
    connection: Arc<ScyllaConnection>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for EntityTable<E> {
    fn clone(&self) -> Self {
        Self {
            connection: self.connection.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> EntityTable<E> {
    pub fn new(connection: Arc<ScyllaConnection>) -> Self {
        Self {
            connection,
            _entity: PhantomData,
        }
    }

    fn keyspace(&self) -> &str {
        self.connection.keyspace()
    }

    /// Run a read and map its rows, reporting store failures.
    async fn fetch_rows(
        &self,
        operation: &'static str,
        query: &str,
        values: Vec<Option<CqlValue>>,
    ) -> Result<Vec<E>, HospitalError> {
        let timer = OperationTimer::start(E::NAME, operation);
        match self.connection.fetch(query, values).await {
            Ok(rows) => {
                timer.finish(true);
                Ok(map_rows(rows))
            }
            Err(e) => {
                timer.finish(false);
                Err(e)
            }
        }
    }

    /// Run a read and map its rows. Store failures are logged and yield an
    /// empty result.
    async fn read(
        &self,
        operation: &'static str,
        query: &str,
        values: Vec<Option<CqlValue>>,
    ) -> Vec<E> {
        self.fetch_rows(operation, query, values)
            .await
            .unwrap_or_else(|e| {
                error!("Failed to {} {}: {}", operation, E::NAME, e);
                Vec::new()
            })
    }

    /// Insert a new row; `created_at` is stamped by the server.
    pub async fn insert(
        &self,
        id: Uuid,
        columns: &[&str],
        values: Vec<ColumnValue>,
    ) -> Result<Uuid, HospitalError> {
        let query = QueryBuilder::build_insert_query(self.keyspace(), E::TABLE, columns);
        let values: Vec<Option<CqlValue>> = values.into_iter().map(ColumnValue::into_cql).collect();

        let timer = OperationTimer::start(E::NAME, "create");
        match self.connection.execute_with_values(&query, values).await {
            Ok(_) => {
                timer.finish(true);
                info!("Created {} {}", E::NAME, id);
                Ok(id)
            }
            Err(e) => {
                timer.finish(false);
                error!("Failed to create {}: {}", E::NAME, e);
                Err(HospitalError::write(E::NAME, "create", e))
            }
        }
    }

    /// Statement, bind values and metric label for a single-row lookup. A
    /// child entity without its parent id falls back to an unindexed scan
    /// over the whole table.
    fn lookup(&self, id: Uuid, parent_id: Option<Uuid>) -> (&'static str, String, Vec<Option<CqlValue>>) {
        match primary_key::<E>(parent_id, id) {
            Some((key_columns, key_values)) => {
                let query = QueryBuilder::build_select_by_key(self.keyspace(), E::TABLE, &key_columns);
                ("find_by_id", query, key_values)
            }
            None => {
                warn!(
                    "Looking up {} {} without its parent id; scanning {} with ALLOW FILTERING",
                    E::NAME,
                    id,
                    E::TABLE
                );
                let query = QueryBuilder::build_filter_query(self.keyspace(), E::TABLE, &[E::ID_COLUMN])
                    .unwrap_or_default();
                ("scan_by_id", query, vec![Some(CqlValue::Uuid(id))])
            }
        }
    }

    /// Single-row lookup; store failures read as "absent".
    pub async fn find_by_id(&self, id: Uuid, parent_id: Option<Uuid>) -> Option<E> {
        let (operation, query, values) = self.lookup(id, parent_id);
        self.read(operation, &query, values).await.into_iter().next()
    }

    /// Single-row lookup that tells a missing row apart from a failed read.
    pub async fn try_find_by_id(
        &self,
        id: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<Option<E>, HospitalError> {
        let (operation, query, values) = self.lookup(id, parent_id);
        Ok(self.fetch_rows(operation, &query, values).await?.into_iter().next())
    }

    pub async fn find_by_id_str(&self, id: &str, parent_id: Option<&str>) -> Option<E> {
        let id = parse_id(id)?;
        let parent_id = parse_parent(parent_id).ok()?;
        self.find_by_id(id, parent_id).await
    }

    /// Every row of one partition.
    pub async fn find_by_parent(&self, parent_id: Uuid) -> Vec<E> {
        let Some(parent_column) = E::PARENT_COLUMN else {
            return Vec::new();
        };
        let query = QueryBuilder::build_select_by_key(self.keyspace(), E::TABLE, &[parent_column]);
        self.read("find_by_parent", &query, vec![Some(CqlValue::Uuid(parent_id))])
            .await
    }

    /// Conjunctive equality filter over text columns. No predicates means no
    /// query and no rows.
    pub async fn find_where(
        &self,
        operation: &'static str,
        predicates: &[(&'static str, &str)],
    ) -> Vec<E> {
        let columns: Vec<&str> = predicates.iter().map(|(column, _)| *column).collect();
        let Some(query) = QueryBuilder::build_filter_query(self.keyspace(), E::TABLE, &columns) else {
            return Vec::new();
        };
        let values = predicates
            .iter()
            .map(|(_, value)| Some(CqlValue::Text(value.to_string())))
            .collect();
        self.read(operation, &query, values).await
    }

    pub async fn get_all(&self) -> Vec<E> {
        let query = QueryBuilder::build_select_query(self.keyspace(), E::TABLE);
        self.read("get_all", &query, Vec::new()).await
    }

    /// Whether the keyed row is present. Part of a write, so failures are
    /// reported rather than swallowed.
    async fn exists(
        &self,
        operation: &'static str,
        key_columns: &[&str],
        key_values: Vec<Option<CqlValue>>,
    ) -> Result<bool, HospitalError> {
        let query = QueryBuilder::build_select_by_key(self.keyspace(), E::TABLE, key_columns);
        self.connection
            .fetch(&query, key_values)
            .await
            .map(|rows| !rows.is_empty())
            .map_err(|e| HospitalError::write(E::NAME, operation, e))
    }

    /// Apply field changes to an existing row. Returns `false` when there is
    /// nothing to change or the row is not in that partition.
    pub async fn update(
        &self,
        parent_id: Option<Uuid>,
        id: Uuid,
        changes: Vec<E::Update>,
    ) -> Result<bool, HospitalError> {
        let assignments = collapse_updates(changes)?;
        let Some((key_columns, key_values)) = primary_key::<E>(parent_id, id) else {
            return Ok(false);
        };
        let set_columns: Vec<&str> = assignments.iter().map(|(column, _)| *column).collect();
        let Some(query) =
            QueryBuilder::build_update_query(self.keyspace(), E::TABLE, &set_columns, &key_columns)
        else {
            return Ok(false);
        };

        let timer = OperationTimer::start(E::NAME, "update");
        match self.exists("update", &key_columns, key_values.clone()).await {
            Ok(true) => {}
            Ok(false) => {
                timer.finish(true);
                return Ok(false);
            }
            Err(e) => {
                timer.finish(false);
                return Err(e);
            }
        }

        let mut values: Vec<Option<CqlValue>> = assignments
            .into_iter()
            .map(|(_, value)| value.into_cql())
            .collect();
        values.extend(key_values);

        match self.connection.execute_with_values(&query, values).await {
            Ok(_) => {
                timer.finish(true);
                info!("Updated {} {} ({})", E::NAME, id, set_columns.join(", "));
                Ok(true)
            }
            Err(e) => {
                timer.finish(false);
                error!("Failed to update {} {}: {}", E::NAME, id, e);
                Err(HospitalError::write(E::NAME, "update", e))
            }
        }
    }

    /// Physically delete one row. Children are left in place.
    pub async fn delete(&self, parent_id: Option<Uuid>, id: Uuid) -> Result<bool, HospitalError> {
        let Some((key_columns, key_values)) = primary_key::<E>(parent_id, id) else {
            return Ok(false);
        };

        let timer = OperationTimer::start(E::NAME, "delete");
        match self.exists("delete", &key_columns, key_values.clone()).await {
            Ok(true) => {}
            Ok(false) => {
                timer.finish(true);
                return Ok(false);
            }
            Err(e) => {
                timer.finish(false);
                return Err(e);
            }
        }

        let query = QueryBuilder::build_delete_query(self.keyspace(), E::TABLE, &key_columns);
        match self.connection.execute_with_values(&query, key_values).await {
            Ok(_) => {
                timer.finish(true);
                info!("Deleted {} {}", E::NAME, id);
                Ok(true)
            }
            Err(e) => {
                timer.finish(false);
                error!("Failed to delete {} {}: {}", E::NAME, id, e);
                Err(HospitalError::write(E::NAME, "delete", e))
            }
        }
    }
}

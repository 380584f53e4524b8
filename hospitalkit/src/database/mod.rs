pub mod connection;
pub mod query_builder;
pub mod retry;
pub mod schema;

pub use connection::{ConnectionManager, ScyllaConnection};
pub use query_builder::QueryBuilder;
pub use retry::RetryPolicy;

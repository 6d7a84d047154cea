//! Infrastructure Database Layer
//!
//! PostgreSQL access for the case overview, built on SQLx.
//!
//! # Architecture
//!
//! `repositories` hold the SQL and return row structs. `adapters` implement
//! the domain's `CaseStorePort` on top of them and classify failures by
//! SQLSTATE, so a missing join table becomes
//! `PortError::RelationshipUnavailable` and a row-level security rejection
//! becomes `PortError::PermissionDenied`.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, DatabaseConfig, PostgresCaseStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/cases")).await?;
//! let store = PostgresCaseStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{create_pool, create_pool_from_url, DatabaseConfig, DatabasePool};
pub use error::DatabaseError;
pub use repositories::CaseRepository;
pub use adapters::PostgresCaseStore;

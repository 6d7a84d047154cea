//! Domain Adapters
//!
//! Implementations of domain ports backed by the PostgreSQL repositories.
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresCaseStore;
//! use domain_case::CaseStorePort;
//!
//! let store = PostgresCaseStore::new(pool);
//! let case = store.find_case_file(CaseId::new(101)).await?;
//! ```

pub mod case_store;

pub use case_store::PostgresCaseStore;

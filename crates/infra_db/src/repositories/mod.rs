//! Repository implementations
//!
//! Repositories own the SQL and return plain row structs. Mapping rows onto
//! domain types happens in the adapters.

pub mod case;

pub use case::CaseRepository;

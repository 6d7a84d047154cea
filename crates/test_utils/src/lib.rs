//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! case overview test suite.
//!
//! # Modules
//!
//! - `fixtures`: Fixed ids, dates and complete case scenarios
//! - `builders`: Builders for case entities and mock store tables
//! - `database`: PostgreSQL container management and scenario seeding
//! - `assertions`: Assertion helpers for merged adjusters and load states
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;

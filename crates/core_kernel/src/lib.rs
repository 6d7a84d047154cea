//! Core Kernel - Foundational types for the case overview system
//!
//! This crate provides the building blocks shared by every other crate:
//! - Strongly-typed identifiers for case entities
//! - The statute calendar used for deadline countdowns
//! - Port error taxonomy and adapter marker traits

pub mod temporal;
pub mod identifiers;
pub mod ports;
pub mod error;

pub use temporal::{Timezone, TemporalError, days_until};
pub use identifiers::{
    CaseId, WorkLogId, ClientId, DefendantId, InsurerId, ClaimId,
    AdjusterId, MedicalBillId, ProviderId, raw_keys,
};
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
pub use error::CoreError;

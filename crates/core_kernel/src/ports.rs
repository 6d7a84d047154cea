//! Ports and Adapters Infrastructure
//!
//! This module provides the foundational types for the hexagonal architecture
//! used by the case overview core.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Case Overview Pipeline                      │
//! │   (fetch → load → resolve → aggregate → reconcile → view)    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       CaseStorePort                          │
//! │       Defined in domain_case, depends only on core_kernel    │
//! └─────────────────────────────────────────────────────────────┘
//!                    ▲                         ▲
//!                    │                         │
//!         ┌─────────┴─────────┐     ┌────────┴────────┐
//!         │  PostgreSQL store │     │  In-memory mock  │
//!         │    (infra_db)     │     │   (tests only)   │
//!         └───────────────────┘     └──────────────────┘
//! ```
//!
//! # Error contract
//!
//! Adapters must classify failures structurally. The pipeline decides whether
//! to degrade or fail purely from the `PortError` variant; it never inspects
//! message text.

use std::fmt;
use thiserror::Error;
use serde::{Deserialize, Serialize};

/// Error type for port operations
///
/// Provides a unified error type that all port implementations must use,
/// ensuring consistent error handling across the database adapter and mocks.
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// An embedded relation could not be resolved because the relationship
    /// (join table, foreign key or column) does not exist in the store
    #[error("Relationship unavailable: {relation}: {message}")]
    RelationshipUnavailable {
        relation: String,
        message: String,
    },

    /// The store refused access to the resource (row-level security, grants)
    #[error("Permission denied on {resource}: {message}")]
    PermissionDenied {
        resource: String,
        message: String,
    },

    /// Connection to the underlying system failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The operation timed out
    #[error("Timeout after {duration_ms}ms: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
    },

    /// The query reached the store but failed there
    #[error("Query failed: {message}")]
    Query {
        message: String,
    },

    /// A row could not be mapped to its domain shape
    #[error("Transformation error: {message}")]
    Transformation {
        message: String,
    },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a RelationshipUnavailable error
    pub fn relationship_unavailable(relation: impl Into<String>, message: impl Into<String>) -> Self {
        PortError::RelationshipUnavailable {
            relation: relation.into(),
            message: message.into(),
        }
    }

    /// Creates a PermissionDenied error
    pub fn permission_denied(resource: impl Into<String>, message: impl Into<String>) -> Self {
        PortError::PermissionDenied {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a Query error
    pub fn query(message: impl Into<String>) -> Self {
        PortError::Query {
            message: message.into(),
        }
    }

    /// Returns true if this error indicates a transient failure that may succeed on retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PortError::Connection { .. } | PortError::Timeout { .. }
        )
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    /// Returns true if an embedded relation is missing from the store's schema
    pub fn is_relationship_unavailable(&self) -> bool {
        matches!(self, PortError::RelationshipUnavailable { .. })
    }

    /// Returns true if the store rejected the read for lack of privileges
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, PortError::PermissionDenied { .. })
    }
}

/// Marker trait for all domain ports
///
/// All port traits should extend this marker to ensure they are
/// thread-safe and can be used in async contexts.
pub trait DomainPort: Send + Sync + 'static {}

/// Health status for an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    /// Adapter is healthy and operational
    Healthy,
    /// Adapter is degraded but operational
    Degraded,
    /// Adapter is unhealthy and not operational
    Unhealthy,
    /// Health status is unknown
    Unknown,
}

/// Health check result for an adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Adapter identifier
    pub adapter_id: String,
    /// Current health status
    pub status: AdapterHealth,
    /// Latency of the health check in milliseconds
    pub latency_ms: u64,
    /// Optional message with additional details
    pub message: Option<String>,
    /// Timestamp of the health check
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

/// Trait for adapters that support health checks
#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    /// Performs a health check on the adapter
    async fn health_check(&self) -> HealthCheckResult;
}

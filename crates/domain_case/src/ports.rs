//! Case Store Port
//!
//! This module defines the relational query interface the case overview
//! pipeline reads through. Each method maps to one operation against one
//! logical table (or one embedded-relation variant of it):
//!
//! | method                        | table(s)                                  | shape            |
//! |-------------------------------|-------------------------------------------|------------------|
//! | `find_case_file`              | `casefiles`                               | single or none   |
//! | `update_days_until_statute`   | `casefiles`                               | one-column write |
//! | `clients_for_case`            | `clients`                                 | by equal         |
//! | `defendants_with_insurer`     | `defendants` + `auto_insurance`           | embedded         |
//! | `defendants_for_case`         | `defendants`                              | by equal         |
//! | `find_auto_insurer`           | `auto_insurance_complete`/`auto_insurance`| single or none   |
//! | `first_party_claims`          | `first_party_claims` + `auto_insurance`   | embedded, by in  |
//! | `third_party_claims`          | `third_party_claims` + `auto_insurance`   | embedded, by in  |
//! | `health_claims`               | `health_claims` + `health_insurance`      | embedded, by in  |
//! | `adjusters_by_claims`         | `auto_adjusters`/`health_adjusters`       | by in            |
//! | `adjusters_by_insurers`       | `auto_adjusters`/`health_adjusters`       | by in            |
//! | `medical_bills`               | `medical_bills`                           | by in            |
//! | `work_logs`                   | `work_logs`                               | by equal         |
//!
//! # Error contract
//!
//! Implementations return `PortError::RelationshipUnavailable` when an
//! embedded relation is missing from the schema and
//! `PortError::PermissionDenied` when row-level security rejects a read.
//! Everything else is a genuine failure.

use async_trait::async_trait;

use core_kernel::{
    CaseId, ClaimId, ClientId, DefendantId, DomainPort, HealthCheckable, InsurerId, PortError,
};

use crate::case_file::CaseFile;
use crate::insurance::{
    Adjuster, CoverageLine, FirstPartyClaim, HealthClaim, Insurer, InsurerSource, ThirdPartyClaim,
};
use crate::medical::MedicalBill;
use crate::party::{Client, Defendant};
use crate::work_log::WorkLogEntry;

/// Selection for a batch claim query
///
/// Matches every claim owned by one of `owner_ids`, plus legacy rows that
/// carry no owner but belong to `case_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimScope<O> {
    pub case_id: CaseId,
    pub owner_ids: Vec<O>,
}

impl<O> ClaimScope<O> {
    pub fn new(case_id: CaseId, owner_ids: Vec<O>) -> Self {
        Self { case_id, owner_ids }
    }
}

/// The relational query interface for case overview data
///
/// Ordering contract: clients by `client_order`, defendants by
/// `defendant_number`, work logs by `timestamp` descending. Other
/// collections come back in primary-key order.
#[async_trait]
pub trait CaseStorePort: DomainPort + HealthCheckable {
    /// Retrieves a case file, `None` when it does not exist
    async fn find_case_file(&self, id: CaseId) -> Result<Option<CaseFile>, PortError>;

    /// Persists the statute countdown of a case
    async fn update_days_until_statute(&self, id: CaseId, days: i64) -> Result<(), PortError>;

    /// Retrieves the clients of a case
    async fn clients_for_case(&self, case_id: CaseId) -> Result<Vec<Client>, PortError>;

    /// Retrieves the defendants of a case with their carrier joined in
    async fn defendants_with_insurer(&self, case_id: CaseId) -> Result<Vec<Defendant>, PortError>;

    /// Retrieves the defendants of a case without any embedded relation
    async fn defendants_for_case(&self, case_id: CaseId) -> Result<Vec<Defendant>, PortError>;

    /// Looks up one auto carrier in the given source
    async fn find_auto_insurer(
        &self,
        source: InsurerSource,
        id: InsurerId,
    ) -> Result<Option<Insurer>, PortError>;

    /// Retrieves first-party claims for a set of clients
    async fn first_party_claims(
        &self,
        scope: &ClaimScope<ClientId>,
    ) -> Result<Vec<FirstPartyClaim>, PortError>;

    /// Retrieves third-party claims for a set of defendants
    async fn third_party_claims(
        &self,
        scope: &ClaimScope<DefendantId>,
    ) -> Result<Vec<ThirdPartyClaim>, PortError>;

    /// Retrieves health claims for a set of clients
    async fn health_claims(
        &self,
        scope: &ClaimScope<ClientId>,
    ) -> Result<Vec<HealthClaim>, PortError>;

    /// Retrieves adjusters directly assigned to any of the given claims
    async fn adjusters_by_claims(
        &self,
        line: CoverageLine,
        claim_ids: &[ClaimId],
    ) -> Result<Vec<Adjuster>, PortError>;

    /// Retrieves adjusters employed by any of the given carriers
    async fn adjusters_by_insurers(
        &self,
        line: CoverageLine,
        insurer_ids: &[InsurerId],
    ) -> Result<Vec<Adjuster>, PortError>;

    /// Retrieves medical bills for a set of clients
    async fn medical_bills(&self, client_ids: &[ClientId]) -> Result<Vec<MedicalBill>, PortError>;

    /// Retrieves the activity log of a case, newest first
    async fn work_logs(&self, case_id: CaseId) -> Result<Vec<WorkLogEntry>, PortError>;
}

/// Mock implementation of CaseStorePort for testing
///
/// Holds every table in memory, records each call it receives, and can be
/// told to fail specific operations.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;
    use tokio::sync::{Notify, RwLock};

    use core_kernel::{AdapterHealth, HealthCheckResult};

    /// Operations that can be made to fail
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum StoreOp {
        FindCaseFile,
        UpdateDaysUntilStatute,
        Clients,
        DefendantsWithInsurer,
        Defendants,
        FindAutoInsurer(InsurerSource),
        FirstPartyClaims,
        ThirdPartyClaims,
        HealthClaims,
        AdjustersByClaims(CoverageLine),
        AdjustersByInsurers(CoverageLine),
        MedicalBills,
        WorkLogs,
    }

    /// Failure to inject for an operation
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Fault {
        RelationshipUnavailable,
        PermissionDenied,
        QueryFailed,
        Timeout,
    }

    impl Fault {
        fn to_error(self, op: StoreOp) -> PortError {
            let operation = format!("{:?}", op);
            match self {
                Fault::RelationshipUnavailable => {
                    PortError::relationship_unavailable(operation, "injected schema error")
                }
                Fault::PermissionDenied => {
                    PortError::permission_denied(operation, "injected row-level security denial")
                }
                Fault::QueryFailed => PortError::query(format!("injected failure in {}", operation)),
                Fault::Timeout => PortError::Timeout {
                    operation,
                    duration_ms: 30_000,
                },
            }
        }
    }

    /// A call received by the mock, with its arguments
    #[derive(Debug, Clone, PartialEq)]
    pub enum StoreCall {
        FindCaseFile(CaseId),
        UpdateDaysUntilStatute(CaseId, i64),
        Clients(CaseId),
        DefendantsWithInsurer(CaseId),
        Defendants(CaseId),
        FindAutoInsurer(InsurerSource, InsurerId),
        FirstPartyClaims(ClaimScope<ClientId>),
        ThirdPartyClaims(ClaimScope<DefendantId>),
        HealthClaims(ClaimScope<ClientId>),
        AdjustersByClaims(CoverageLine, Vec<ClaimId>),
        AdjustersByInsurers(CoverageLine, Vec<InsurerId>),
        MedicalBills(Vec<ClientId>),
        WorkLogs(CaseId),
    }

    /// In-memory tables
    ///
    /// Defendants and claims are stored without embedded carriers; the
    /// embedded-relation methods join them against `auto_insurance` and
    /// `health_insurance` the way the database does.
    #[derive(Debug, Clone, Default)]
    pub struct MockTables {
        pub case_files: HashMap<CaseId, CaseFile>,
        pub clients: Vec<Client>,
        pub defendants: Vec<Defendant>,
        pub auto_insurance: HashMap<InsurerId, Insurer>,
        pub auto_insurance_complete: HashMap<InsurerId, Insurer>,
        pub health_insurance: HashMap<InsurerId, Insurer>,
        pub first_party_claims: Vec<FirstPartyClaim>,
        pub third_party_claims: Vec<ThirdPartyClaim>,
        pub health_claims: Vec<HealthClaim>,
        pub auto_adjusters: Vec<Adjuster>,
        pub health_adjusters: Vec<Adjuster>,
        pub medical_bills: Vec<MedicalBill>,
        pub work_logs: Vec<WorkLogEntry>,
    }

    /// In-memory mock implementation of CaseStorePort
    #[derive(Debug, Default)]
    pub struct MockCaseStore {
        tables: RwLock<MockTables>,
        faults: HashMap<StoreOp, Fault>,
        insurer_faults: HashSet<InsurerId>,
        write_back_gate: Option<Arc<Notify>>,
        calls: RwLock<Vec<StoreCall>>,
    }

    impl MockCaseStore {
        /// Creates a mock over the given tables
        pub fn new(tables: MockTables) -> Self {
            Self {
                tables: RwLock::new(tables),
                ..Default::default()
            }
        }

        /// Makes every call to `op` fail with `fault`
        pub fn with_fault(mut self, op: StoreOp, fault: Fault) -> Self {
            self.faults.insert(op, fault);
            self
        }

        /// Makes lookups of one carrier fail in every source
        pub fn with_insurer_fault(mut self, id: InsurerId) -> Self {
            self.insurer_faults.insert(id);
            self
        }

        /// Holds statute write-backs until `gate` is notified
        pub fn with_write_back_gate(mut self, gate: Arc<Notify>) -> Self {
            self.write_back_gate = Some(gate);
            self
        }

        /// Returns every call received so far
        pub async fn calls(&self) -> Vec<StoreCall> {
            self.calls.read().await.clone()
        }

        /// Counts calls matching a predicate
        pub async fn count_calls(&self, predicate: impl Fn(&StoreCall) -> bool) -> usize {
            self.calls.read().await.iter().filter(|c| predicate(c)).count()
        }

        /// Returns the persisted state of a case file
        pub async fn stored_case_file(&self, id: CaseId) -> Option<CaseFile> {
            self.tables.read().await.case_files.get(&id).cloned()
        }

        async fn record(&self, op: StoreOp, call: StoreCall) -> Result<(), PortError> {
            self.calls.write().await.push(call);
            match self.faults.get(&op) {
                Some(fault) => Err(fault.to_error(op)),
                None => Ok(()),
            }
        }
    }

    fn join_insurer(
        insurer_ref: Option<InsurerId>,
        table: &HashMap<InsurerId, Insurer>,
    ) -> Option<Insurer> {
        insurer_ref.and_then(|id| table.get(&id).cloned())
    }

    fn in_scope<O: PartialEq>(owner: &Option<O>, case_id: Option<CaseId>, scope: &ClaimScope<O>) -> bool {
        match owner {
            Some(owner) => scope.owner_ids.contains(owner),
            None => case_id == Some(scope.case_id),
        }
    }

    fn scoped_claims<O: PartialEq + Clone>(
        claims: &[crate::insurance::Claim<O>],
        scope: &ClaimScope<O>,
        carriers: &HashMap<InsurerId, Insurer>,
    ) -> Vec<crate::insurance::Claim<O>> {
        let mut rows: Vec<_> = claims
            .iter()
            .filter(|c| in_scope(&c.owner, c.case_id, scope))
            .cloned()
            .map(|mut c| {
                c.insurer = join_insurer(c.insurer_ref, carriers);
                c
            })
            .collect();
        rows.sort_by_key(|c| c.id);
        rows
    }

    impl DomainPort for MockCaseStore {}

    #[async_trait]
    impl HealthCheckable for MockCaseStore {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "mock-case-store".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("Mock adapter always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl CaseStorePort for MockCaseStore {
        async fn find_case_file(&self, id: CaseId) -> Result<Option<CaseFile>, PortError> {
            self.record(StoreOp::FindCaseFile, StoreCall::FindCaseFile(id)).await?;
            Ok(self.tables.read().await.case_files.get(&id).cloned())
        }

        async fn update_days_until_statute(&self, id: CaseId, days: i64) -> Result<(), PortError> {
            if let Some(gate) = &self.write_back_gate {
                gate.notified().await;
            }
            self.record(
                StoreOp::UpdateDaysUntilStatute,
                StoreCall::UpdateDaysUntilStatute(id, days),
            )
            .await?;
            let mut tables = self.tables.write().await;
            let case = tables
                .case_files
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("CaseFile", id))?;
            case.days_until_statute = Some(days);
            Ok(())
        }

        async fn clients_for_case(&self, case_id: CaseId) -> Result<Vec<Client>, PortError> {
            self.record(StoreOp::Clients, StoreCall::Clients(case_id)).await?;
            let mut rows: Vec<_> = self
                .tables
                .read()
                .await
                .clients
                .iter()
                .filter(|c| c.case_id == case_id)
                .cloned()
                .collect();
            rows.sort_by_key(|c| c.client_order);
            Ok(rows)
        }

        async fn defendants_with_insurer(&self, case_id: CaseId) -> Result<Vec<Defendant>, PortError> {
            self.record(
                StoreOp::DefendantsWithInsurer,
                StoreCall::DefendantsWithInsurer(case_id),
            )
            .await?;
            let tables = self.tables.read().await;
            let mut rows: Vec<_> = tables
                .defendants
                .iter()
                .filter(|d| d.case_id == case_id)
                .cloned()
                .map(|mut d| {
                    d.insurer = join_insurer(d.insurer_ref, &tables.auto_insurance);
                    d
                })
                .collect();
            rows.sort_by_key(|d| d.defendant_number);
            Ok(rows)
        }

        async fn defendants_for_case(&self, case_id: CaseId) -> Result<Vec<Defendant>, PortError> {
            self.record(StoreOp::Defendants, StoreCall::Defendants(case_id)).await?;
            let mut rows: Vec<_> = self
                .tables
                .read()
                .await
                .defendants
                .iter()
                .filter(|d| d.case_id == case_id)
                .cloned()
                .map(|mut d| {
                    d.insurer = None;
                    d
                })
                .collect();
            rows.sort_by_key(|d| d.defendant_number);
            Ok(rows)
        }

        async fn find_auto_insurer(
            &self,
            source: InsurerSource,
            id: InsurerId,
        ) -> Result<Option<Insurer>, PortError> {
            self.record(
                StoreOp::FindAutoInsurer(source),
                StoreCall::FindAutoInsurer(source, id),
            )
            .await?;
            if self.insurer_faults.contains(&id) {
                return Err(PortError::query(format!("injected failure looking up {}", id)));
            }
            let tables = self.tables.read().await;
            let table = match source {
                InsurerSource::Complete => &tables.auto_insurance_complete,
                InsurerSource::Basic => &tables.auto_insurance,
            };
            Ok(table.get(&id).cloned())
        }

        async fn first_party_claims(
            &self,
            scope: &ClaimScope<ClientId>,
        ) -> Result<Vec<FirstPartyClaim>, PortError> {
            self.record(StoreOp::FirstPartyClaims, StoreCall::FirstPartyClaims(scope.clone()))
                .await?;
            let tables = self.tables.read().await;
            Ok(scoped_claims(&tables.first_party_claims, scope, &tables.auto_insurance))
        }

        async fn third_party_claims(
            &self,
            scope: &ClaimScope<DefendantId>,
        ) -> Result<Vec<ThirdPartyClaim>, PortError> {
            self.record(StoreOp::ThirdPartyClaims, StoreCall::ThirdPartyClaims(scope.clone()))
                .await?;
            let tables = self.tables.read().await;
            Ok(scoped_claims(&tables.third_party_claims, scope, &tables.auto_insurance))
        }

        async fn health_claims(
            &self,
            scope: &ClaimScope<ClientId>,
        ) -> Result<Vec<HealthClaim>, PortError> {
            self.record(StoreOp::HealthClaims, StoreCall::HealthClaims(scope.clone()))
                .await?;
            let tables = self.tables.read().await;
            Ok(scoped_claims(&tables.health_claims, scope, &tables.health_insurance))
        }

        async fn adjusters_by_claims(
            &self,
            line: CoverageLine,
            claim_ids: &[ClaimId],
        ) -> Result<Vec<Adjuster>, PortError> {
            self.record(
                StoreOp::AdjustersByClaims(line),
                StoreCall::AdjustersByClaims(line, claim_ids.to_vec()),
            )
            .await?;
            let tables = self.tables.read().await;
            let table = match line {
                CoverageLine::Auto => &tables.auto_adjusters,
                CoverageLine::Health => &tables.health_adjusters,
            };
            Ok(table
                .iter()
                .filter(|a| a.claim_ref.map_or(false, |c| claim_ids.contains(&c)))
                .cloned()
                .collect())
        }

        async fn adjusters_by_insurers(
            &self,
            line: CoverageLine,
            insurer_ids: &[InsurerId],
        ) -> Result<Vec<Adjuster>, PortError> {
            self.record(
                StoreOp::AdjustersByInsurers(line),
                StoreCall::AdjustersByInsurers(line, insurer_ids.to_vec()),
            )
            .await?;
            let tables = self.tables.read().await;
            let table = match line {
                CoverageLine::Auto => &tables.auto_adjusters,
                CoverageLine::Health => &tables.health_adjusters,
            };
            Ok(table
                .iter()
                .filter(|a| a.insurer_ref.map_or(false, |i| insurer_ids.contains(&i)))
                .cloned()
                .collect())
        }

        async fn medical_bills(&self, client_ids: &[ClientId]) -> Result<Vec<MedicalBill>, PortError> {
            self.record(StoreOp::MedicalBills, StoreCall::MedicalBills(client_ids.to_vec()))
                .await?;
            let mut rows: Vec<_> = self
                .tables
                .read()
                .await
                .medical_bills
                .iter()
                .filter(|b| client_ids.contains(&b.client_id))
                .cloned()
                .collect();
            rows.sort_by_key(|b| b.id);
            Ok(rows)
        }

        async fn work_logs(&self, case_id: CaseId) -> Result<Vec<WorkLogEntry>, PortError> {
            self.record(StoreOp::WorkLogs, StoreCall::WorkLogs(case_id)).await?;
            let mut rows: Vec<_> = self
                .tables
                .read()
                .await
                .work_logs
                .iter()
                .filter(|w| w.case_id == case_id)
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            Ok(rows)
        }
    }
}

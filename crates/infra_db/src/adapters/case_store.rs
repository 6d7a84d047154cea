//! PostgreSQL Case Store Adapter
//!
//! Implements `CaseStorePort` on top of [`CaseRepository`], translating
//! rows into domain types and database failures into the port taxonomy.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    raw_keys, AdapterHealth, CaseId, ClaimId, ClientId, DefendantId, DomainPort, HealthCheckResult,
    HealthCheckable, InsurerId, PortError,
};
use domain_case::{
    Adjuster, CaseFile, CaseStorePort, Claim, ClaimKind, ClaimScope, Client, CoverageLine,
    Defendant, FirstPartyClaim, HealthClaim, Insurer, InsurerSource, MedicalBill, ThirdPartyClaim,
    WorkLogEntry,
};

use crate::repositories::case::{
    AdjusterRow, AdjusterTable, CaseFileRow, CaseRepository, ClaimRow, ClaimTable, ClientRow,
    DefendantRow, InsurerRow, InsurerTable, MedicalBillRow, WorkLogRow,
};

const ADAPTER_ID: &str = "postgres-case-store";

/// PostgreSQL implementation of CaseStorePort
#[derive(Debug, Clone)]
pub struct PostgresCaseStore {
    repository: CaseRepository,
}

impl PostgresCaseStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: CaseRepository::new(pool),
        }
    }

    async fn claims<O: From<i64>>(
        &self,
        table: ClaimTable,
        kind: ClaimKind,
        line: CoverageLine,
        owner_ids: Vec<i64>,
        case_id: CaseId,
    ) -> Result<Vec<Claim<O>>, PortError> {
        let rows = self
            .repository
            .claims(table, &owner_ids, case_id.get())
            .await
            .map_err(|e| e.into_port_error(&table.relation()))?;

        debug!(table = table.table, rows = rows.len(), "Loaded claims");
        Ok(rows.into_iter().map(|row| row_to_claim(row, kind, line)).collect())
    }
}

impl DomainPort for PostgresCaseStore {}

#[async_trait]
impl HealthCheckable for PostgresCaseStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(self.repository.pool())
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(_) => (AdapterHealth::Healthy, None),
            Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
        };
        HealthCheckResult {
            adapter_id: ADAPTER_ID.to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl CaseStorePort for PostgresCaseStore {
    #[instrument(skip(self), fields(case_id = %id))]
    async fn find_case_file(&self, id: CaseId) -> Result<Option<CaseFile>, PortError> {
        let row = self
            .repository
            .find_case_file(id.get())
            .await
            .map_err(|e| e.into_port_error("casefiles"))?;

        Ok(row.map(row_to_case_file))
    }

    #[instrument(skip(self), fields(case_id = %id))]
    async fn update_days_until_statute(&self, id: CaseId, days: i64) -> Result<(), PortError> {
        let days = i32::try_from(days).map_err(|_| PortError::Transformation {
            message: format!("statute countdown {} does not fit the column", days),
        })?;

        self.repository
            .update_days_until_statute(id.get(), days)
            .await
            .map_err(|e| e.into_port_error("casefiles"))
    }

    #[instrument(skip(self), fields(case_id = %case_id))]
    async fn clients_for_case(&self, case_id: CaseId) -> Result<Vec<Client>, PortError> {
        let rows = self
            .repository
            .clients_for_case(case_id.get())
            .await
            .map_err(|e| e.into_port_error("clients"))?;

        Ok(rows.into_iter().map(row_to_client).collect())
    }

    #[instrument(skip(self), fields(case_id = %case_id))]
    async fn defendants_with_insurer(&self, case_id: CaseId) -> Result<Vec<Defendant>, PortError> {
        let rows = self
            .repository
            .defendants_with_insurer(case_id.get())
            .await
            .map_err(|e| e.into_port_error("defendants->auto_insurance"))?;

        Ok(rows.into_iter().map(row_to_defendant).collect())
    }

    #[instrument(skip(self), fields(case_id = %case_id))]
    async fn defendants_for_case(&self, case_id: CaseId) -> Result<Vec<Defendant>, PortError> {
        let rows = self
            .repository
            .defendants_for_case(case_id.get())
            .await
            .map_err(|e| e.into_port_error("defendants"))?;

        Ok(rows.into_iter().map(row_to_defendant).collect())
    }

    #[instrument(skip(self), fields(insurer_id = %id))]
    async fn find_auto_insurer(
        &self,
        source: InsurerSource,
        id: InsurerId,
    ) -> Result<Option<Insurer>, PortError> {
        let table = match source {
            InsurerSource::Complete => InsurerTable::AutoComplete,
            InsurerSource::Basic => InsurerTable::AutoBasic,
        };
        let row = self
            .repository
            .find_insurer(table, id.get())
            .await
            .map_err(|e| e.into_port_error(table.name()))?;

        Ok(row.map(|r| row_to_insurer(r, CoverageLine::Auto)))
    }

    #[instrument(skip(self, scope), fields(case_id = %scope.case_id, owners = scope.owner_ids.len()))]
    async fn first_party_claims(
        &self,
        scope: &ClaimScope<ClientId>,
    ) -> Result<Vec<FirstPartyClaim>, PortError> {
        self.claims(
            ClaimTable::FIRST_PARTY,
            ClaimKind::FirstParty,
            CoverageLine::Auto,
            raw_keys(&scope.owner_ids),
            scope.case_id,
        )
        .await
    }

    #[instrument(skip(self, scope), fields(case_id = %scope.case_id, owners = scope.owner_ids.len()))]
    async fn third_party_claims(
        &self,
        scope: &ClaimScope<DefendantId>,
    ) -> Result<Vec<ThirdPartyClaim>, PortError> {
        self.claims(
            ClaimTable::THIRD_PARTY,
            ClaimKind::ThirdParty,
            CoverageLine::Auto,
            raw_keys(&scope.owner_ids),
            scope.case_id,
        )
        .await
    }

    #[instrument(skip(self, scope), fields(case_id = %scope.case_id, owners = scope.owner_ids.len()))]
    async fn health_claims(
        &self,
        scope: &ClaimScope<ClientId>,
    ) -> Result<Vec<HealthClaim>, PortError> {
        self.claims(
            ClaimTable::HEALTH,
            ClaimKind::Health,
            CoverageLine::Health,
            raw_keys(&scope.owner_ids),
            scope.case_id,
        )
        .await
    }

    #[instrument(skip(self, claim_ids), fields(count = claim_ids.len()))]
    async fn adjusters_by_claims(
        &self,
        line: CoverageLine,
        claim_ids: &[ClaimId],
    ) -> Result<Vec<Adjuster>, PortError> {
        let table = adjuster_table(line);
        let rows = self
            .repository
            .adjusters_by_claims(table, &raw_keys(claim_ids))
            .await
            .map_err(|e| e.into_port_error(table.table))?;

        Ok(rows.into_iter().map(|r| row_to_adjuster(r, line)).collect())
    }

    #[instrument(skip(self, insurer_ids), fields(count = insurer_ids.len()))]
    async fn adjusters_by_insurers(
        &self,
        line: CoverageLine,
        insurer_ids: &[InsurerId],
    ) -> Result<Vec<Adjuster>, PortError> {
        let table = adjuster_table(line);
        let rows = self
            .repository
            .adjusters_by_insurers(table, &raw_keys(insurer_ids))
            .await
            .map_err(|e| e.into_port_error(table.table))?;

        Ok(rows.into_iter().map(|r| row_to_adjuster(r, line)).collect())
    }

    #[instrument(skip(self, client_ids), fields(count = client_ids.len()))]
    async fn medical_bills(&self, client_ids: &[ClientId]) -> Result<Vec<MedicalBill>, PortError> {
        let rows = self
            .repository
            .medical_bills(&raw_keys(client_ids))
            .await
            .map_err(|e| e.into_port_error("medical_bills"))?;

        Ok(rows.into_iter().map(row_to_medical_bill).collect())
    }

    #[instrument(skip(self), fields(case_id = %case_id))]
    async fn work_logs(&self, case_id: CaseId) -> Result<Vec<WorkLogEntry>, PortError> {
        let rows = self
            .repository
            .work_logs(case_id.get())
            .await
            .map_err(|e| e.into_port_error("work_logs"))?;

        Ok(rows.into_iter().map(row_to_work_log).collect())
    }
}

// Row conversions

fn adjuster_table(line: CoverageLine) -> AdjusterTable {
    match line {
        CoverageLine::Auto => AdjusterTable::AUTO,
        CoverageLine::Health => AdjusterTable::HEALTH,
    }
}

fn row_to_case_file(row: CaseFileRow) -> CaseFile {
    CaseFile {
        id: CaseId::new(row.id),
        created_at: row.created_at,
        title: row.title,
        status: row.status,
        stage: row.stage,
        incident_date: row.incident_date,
        statute_deadline: row.statute_deadline,
        days_until_statute: row.days_until_statute.map(i64::from),
    }
}

fn row_to_client(row: ClientRow) -> Client {
    Client {
        id: ClientId::new(row.id),
        case_id: CaseId::new(row.case_id),
        client_order: row.client_order,
        first_name: row.first_name,
        last_name: row.last_name,
        date_of_birth: row.date_of_birth,
        phone: row.phone,
        email: row.email,
        address: row.address,
        injuries: row.injuries,
    }
}

fn row_to_insurer(row: InsurerRow, line: CoverageLine) -> Insurer {
    Insurer {
        id: InsurerId::new(row.id),
        line,
        name: row.name,
        phone: row.phone,
        email: row.email,
        address: row.address,
    }
}

fn row_to_defendant(row: DefendantRow) -> Defendant {
    Defendant {
        id: DefendantId::new(row.id),
        case_id: CaseId::new(row.case_id),
        defendant_number: row.defendant_number,
        first_name: row.first_name,
        last_name: row.last_name,
        insurer_ref: row.insurer_ref.map(InsurerId::new),
        insurer: row
            .joined
            .into_row()
            .map(|r| row_to_insurer(r, CoverageLine::Auto)),
        policy_number: row.policy_number,
        policy_limit: row.policy_limit,
        liability_percentage: row.liability_percentage,
    }
}

fn row_to_claim<O: From<i64>>(row: ClaimRow, kind: ClaimKind, line: CoverageLine) -> Claim<O> {
    Claim {
        id: ClaimId::new(row.id),
        kind,
        owner: row.owner_id.map(O::from),
        case_id: row.case_id.map(CaseId::new),
        claim_number: row.claim_number,
        policy_number: row.policy_number,
        insurer_ref: row.insurer_ref.map(InsurerId::new),
        insurer: row.joined.into_row().map(|r| row_to_insurer(r, line)),
        coverage_limit: row.coverage_limit,
        amount_paid: row.amount_paid,
        adjuster_name: row.adjuster_name,
    }
}

fn row_to_adjuster(row: AdjusterRow, line: CoverageLine) -> Adjuster {
    Adjuster {
        id: row.id.into(),
        line,
        first_name: row.first_name,
        last_name: row.last_name,
        phone: row.phone,
        email: row.email,
        insurer_ref: row.insurer_ref.map(InsurerId::new),
        claim_ref: row.claim_id.map(ClaimId::new),
    }
}

fn row_to_medical_bill(row: MedicalBillRow) -> MedicalBill {
    MedicalBill {
        id: row.id.into(),
        client_id: ClientId::new(row.client_id),
        provider_id: row.provider_id.map(Into::into),
        provider_name: row.provider_name,
        service_date: row.service_date,
        amount_billed: row.amount_billed,
        amount_paid: row.amount_paid,
        adjustments: row.adjustments,
    }
}

fn row_to_work_log(row: WorkLogRow) -> WorkLogEntry {
    WorkLogEntry {
        id: row.id.into(),
        case_id: CaseId::new(row.case_id),
        description: row.description,
        timestamp: row.timestamp,
        actor: row.actor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::case::JoinedInsurerColumns;
    use rust_decimal::Decimal;

    fn claim_row(owner: Option<i64>, joined: JoinedInsurerColumns) -> ClaimRow {
        ClaimRow {
            id: 31,
            owner_id: owner,
            case_id: Some(101),
            claim_number: Some("HC-31".to_string()),
            policy_number: None,
            insurer_ref: Some(4),
            coverage_limit: Some(Decimal::new(1_000_000, 2)),
            amount_paid: None,
            adjuster_name: None,
            joined,
        }
    }

    #[test]
    fn test_claim_row_keeps_missing_owner() {
        let claim: HealthClaim = row_to_claim(claim_row(None, JoinedInsurerColumns::default()), ClaimKind::Health, CoverageLine::Health);
        assert!(claim.owner.is_none());
        assert_eq!(claim.case_id, Some(CaseId::new(101)));
        assert_eq!(claim.insurer_ref, Some(InsurerId::new(4)));
        assert!(claim.insurer.is_none());
    }

    #[test]
    fn test_claim_row_embeds_joined_carrier_with_line() {
        let joined = JoinedInsurerColumns {
            joined_insurer_id: Some(4),
            joined_insurer_name: Some("Blue Ridge Health".to_string()),
            ..Default::default()
        };
        let claim: HealthClaim = row_to_claim(claim_row(Some(1), joined), ClaimKind::Health, CoverageLine::Health);
        let insurer = claim.insurer.unwrap();
        assert_eq!(insurer.line, CoverageLine::Health);
        assert_eq!(insurer.name, "Blue Ridge Health");
        assert_eq!(claim.owner, Some(ClientId::new(1)));
    }

    #[test]
    fn test_adjuster_table_by_line() {
        assert_eq!(adjuster_table(CoverageLine::Auto), AdjusterTable::AUTO);
        assert_eq!(adjuster_table(CoverageLine::Health).table, "health_adjusters");
    }
}

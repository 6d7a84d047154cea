//! Case overview pipeline
//!
//! Runs the load steps in dependency order: the case file, then its parties,
//! then everything keyed by party ids, then insurer backfills, then
//! adjusters. Within a step independent reads run concurrently.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use core_kernel::{CaseId, ClientId, DefendantId, Timezone};

use crate::aggregator::{ClaimAggregator, ClaimBatch, LegacyOwnerPolicy};
use crate::error::{or_empty_on_denied, CaseLoadError};
use crate::fetcher::{CaseRecordFetcher, FetchedCase};
use crate::insurance::CoverageLine;
use crate::loader::{CaseParties, RelationalEntityLoader};
use crate::medical::MedicalBill;
use crate::ports::CaseStorePort;
use crate::reconciler::{fill_adjuster_names, AdjusterReconciler, ClaimLink, OwnerLink};
use crate::resolver::RelationshipResolver;
use crate::view::{CaseOverview, OverviewParts, ViewModelAssembler};
use crate::work_log::WorkLogEntry;

/// Tunables for a pipeline instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Jurisdiction whose calendar date counts as "today"
    #[serde(default)]
    pub timezone: Timezone,
    #[serde(default)]
    pub legacy_owner_policy: LegacyOwnerPolicy,
}

/// Lifecycle of one overview load
///
/// There is no retry state; retrying means running the pipeline again.
#[derive(Debug)]
pub enum LoadState {
    Loading,
    Ready(Box<CaseOverview>),
    Failed(CaseLoadError),
}

impl LoadState {
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LoadState::Failed(_))
    }

    pub fn overview(&self) -> Option<&CaseOverview> {
        match self {
            LoadState::Ready(overview) => Some(overview.as_ref()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&CaseLoadError> {
        match self {
            LoadState::Failed(error) => Some(error),
            _ => None,
        }
    }
}

impl From<Result<CaseOverview, CaseLoadError>> for LoadState {
    fn from(result: Result<CaseOverview, CaseLoadError>) -> Self {
        match result {
            Ok(overview) => LoadState::Ready(Box::new(overview)),
            Err(error) => LoadState::Failed(error),
        }
    }
}

/// Assembles a [`CaseOverview`] from a [`CaseStorePort`]
pub struct CaseOverviewPipeline {
    store: Arc<dyn CaseStorePort>,
    options: PipelineOptions,
    fetcher: CaseRecordFetcher,
    loader: RelationalEntityLoader,
    resolver: RelationshipResolver,
    claims: ClaimAggregator,
    reconciler: AdjusterReconciler,
    assembler: ViewModelAssembler,
}

impl CaseOverviewPipeline {
    pub fn new(store: Arc<dyn CaseStorePort>, options: PipelineOptions) -> Self {
        Self {
            fetcher: CaseRecordFetcher::new(Arc::clone(&store)),
            loader: RelationalEntityLoader::new(Arc::clone(&store)),
            resolver: RelationshipResolver::new(Arc::clone(&store)),
            claims: ClaimAggregator::new(Arc::clone(&store), options.legacy_owner_policy),
            reconciler: AdjusterReconciler::new(Arc::clone(&store)),
            assembler: ViewModelAssembler,
            store,
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Runs a load and reports it as a terminal [`LoadState`]
    pub async fn run(&self, case_id: CaseId) -> LoadState {
        let state = LoadState::from(self.load(case_id).await);
        if let LoadState::Failed(error) = &state {
            error!(
                %case_id,
                %error,
                transient = error.is_transient(),
                "Case overview failed to load"
            );
        }
        state
    }

    /// Loads a case overview with the countdown taken against today in the
    /// configured timezone
    #[instrument(skip_all, fields(case_id = %case_id))]
    pub async fn load(&self, case_id: CaseId) -> Result<CaseOverview, CaseLoadError> {
        self.load_as_of(case_id, self.options.timezone.today()).await
    }

    /// Loads a case overview with the countdown taken against `today`
    #[instrument(skip_all, fields(case_id = %case_id, today = %today))]
    pub async fn load_as_of(&self, case_id: CaseId, today: NaiveDate) -> Result<CaseOverview, CaseLoadError> {
        // The write-back handle is dropped, which detaches the task
        let FetchedCase { case_file, .. } = self.fetcher.fetch(case_id, today).await?;

        let CaseParties {
            clients,
            mut defendants,
            defendants_degraded,
        } = self.loader.load(case_id).await?;

        let client_ids: Vec<ClientId> = clients.iter().map(|c| c.id).collect();
        let defendant_ids: Vec<DefendantId> = defendants.iter().map(|d| d.id).collect();

        let (defendant_backfill, first_party, third_party, health, medical_bills, work_logs) = tokio::join!(
            self.resolver.backfill(&mut defendants, "defendants"),
            self.claims.first_party(case_id, &client_ids),
            self.claims.third_party(case_id, &defendant_ids),
            self.claims.health(case_id, &client_ids),
            self.medical_bills(case_id, &client_ids),
            self.work_logs(case_id),
        );
        let mut first_party = first_party?;
        let mut third_party = third_party?;
        let mut health = health?;
        let medical_bills = medical_bills?;
        let work_logs = work_logs?;

        let (third_party_backfill, first_party_backfill) = tokio::join!(
            self.resolver.backfill(third_party.claims_mut(), "third_party_claims"),
            self.resolver.backfill(first_party.claims_mut(), "first_party_claims"),
        );

        let defendant_links: Vec<_> = defendants
            .iter()
            .map(|d| OwnerLink {
                owner: d.id,
                insurer_ref: d.effective_insurer_id(),
            })
            .collect();
        let client_links: Vec<_> = clients
            .iter()
            .map(|c| OwnerLink {
                owner: c.id,
                insurer_ref: None,
            })
            .collect();
        let third_party_links = claim_links(&third_party);
        let first_party_links = claim_links(&first_party);
        let health_links = claim_links(&health);

        let (defendant_adjusters, first_party_adjusters, health_adjusters) = tokio::join!(
            self.reconciler.reconcile(CoverageLine::Auto, &defendant_links, &third_party_links),
            self.reconciler.reconcile(CoverageLine::Auto, &client_links, &first_party_links),
            self.reconciler.reconcile(CoverageLine::Health, &client_links, &health_links),
        );
        fill_adjuster_names(third_party.claims_mut(), &defendant_adjusters);
        fill_adjuster_names(first_party.claims_mut(), &first_party_adjusters);
        fill_adjuster_names(health.claims_mut(), &health_adjusters);

        debug!(
            %case_id,
            defendants_degraded,
            defendant_backfills = defendant_backfill.resolved,
            third_party_backfills = third_party_backfill.resolved,
            first_party_backfills = first_party_backfill.resolved,
            "Case relationships resolved"
        );

        let overview = self.assembler.assemble(OverviewParts {
            case_file,
            clients,
            defendants,
            first_party,
            third_party,
            health,
            defendant_adjusters,
            first_party_adjusters,
            health_adjusters,
            medical_bills,
            work_logs,
        });

        info!(
            %case_id,
            clients = overview.clients().len(),
            defendants = overview.defendants().len(),
            bills = overview.medical_bills().len(),
            "Case overview loaded"
        );
        Ok(overview)
    }

    async fn medical_bills(&self, case_id: CaseId, client_ids: &[ClientId]) -> Result<Vec<MedicalBill>, CaseLoadError> {
        if client_ids.is_empty() {
            return Ok(Vec::new());
        }
        or_empty_on_denied(self.store.medical_bills(client_ids).await, case_id, "medical_bills")
    }

    async fn work_logs(&self, case_id: CaseId) -> Result<Vec<WorkLogEntry>, CaseLoadError> {
        or_empty_on_denied(self.store.work_logs(case_id).await, case_id, "work_logs")
    }
}

fn claim_links<O: Copy + Ord>(batch: &ClaimBatch<O>) -> Vec<ClaimLink<O>> {
    batch
        .claims()
        .iter()
        .map(|claim| ClaimLink::new(claim, batch.owner_of(claim)))
        .collect()
}

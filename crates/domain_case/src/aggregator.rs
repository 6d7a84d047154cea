//! Claim aggregator
//!
//! Reads every claim of one kind for all owners of a case in a single batch
//! query and partitions the rows by owner.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use core_kernel::{CaseId, ClaimId, ClientId, DefendantId};

use crate::error::{or_empty_on_denied, CaseLoadError};
use crate::insurance::{Claim, FirstPartyClaim, HealthClaim, ThirdPartyClaim};
use crate::ports::{CaseStorePort, ClaimScope};

/// Owner id to the owner's items, in query order
pub type OwnerMap<O, T> = BTreeMap<O, Vec<T>>;

/// What to do with claim rows that carry no owner id
///
/// Such rows predate owner tracking. Assigning them to the first owner of
/// the case is an unconfirmed business rule carried over from the intake
/// screens; it is kept explicit so it can be switched off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyOwnerPolicy {
    /// Attribute the row to the first owner in display order
    ///
    /// First-party and health rows go to the first client of the case.
    /// Third-party rows go to the first defendant instead, because their
    /// owner column references defendants; listing them under a client
    /// departs from the intake screens and still needs product sign-off.
    #[default]
    FirstOwnerOfCase,
    /// Leave the row out of the grouping
    Drop,
}

/// Claims of one kind for a case, before grouping
#[derive(Debug, Clone)]
pub struct ClaimBatch<O> {
    claims: Vec<Claim<O>>,
    fallback_owner: Option<O>,
}

impl<O: Copy + Ord> ClaimBatch<O> {
    pub fn new(claims: Vec<Claim<O>>, fallback_owner: Option<O>) -> Self {
        Self {
            claims,
            fallback_owner,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), None)
    }

    pub fn claims(&self) -> &[Claim<O>] {
        &self.claims
    }

    pub fn claims_mut(&mut self) -> &mut [Claim<O>] {
        &mut self.claims
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Owner a claim is grouped under
    pub fn owner_of(&self, claim: &Claim<O>) -> Option<O> {
        claim.owner.or(self.fallback_owner)
    }

    /// Owner of the claim with the given id
    pub fn owner_of_id(&self, claim_id: ClaimId) -> Option<O> {
        self.claims
            .iter()
            .find(|c| c.id == claim_id)
            .and_then(|c| self.owner_of(c))
    }

    /// Partitions the claims by owner
    ///
    /// Only owners with at least one claim get an entry. Rows without an
    /// owner and without a fallback are dropped.
    pub fn into_grouped(self) -> OwnerMap<O, Claim<O>> {
        let mut grouped: OwnerMap<O, Claim<O>> = BTreeMap::new();
        for claim in self.claims {
            match claim.owner.or(self.fallback_owner) {
                Some(owner) => grouped.entry(owner).or_default().push(claim),
                None => warn!(claim_id = %claim.id, "Claim has no owner and no fallback owner, dropping"),
            }
        }
        grouped
    }
}

pub struct ClaimAggregator {
    store: Arc<dyn CaseStorePort>,
    policy: LegacyOwnerPolicy,
}

impl ClaimAggregator {
    pub fn new(store: Arc<dyn CaseStorePort>, policy: LegacyOwnerPolicy) -> Self {
        Self { store, policy }
    }

    /// First-party claims of the given clients, in display order
    pub async fn first_party(
        &self,
        case_id: CaseId,
        client_ids: &[ClientId],
    ) -> Result<ClaimBatch<ClientId>, CaseLoadError> {
        if client_ids.is_empty() {
            return Ok(ClaimBatch::empty());
        }
        let scope = ClaimScope::new(case_id, client_ids.to_vec());
        let rows: Vec<FirstPartyClaim> = or_empty_on_denied(
            self.store.first_party_claims(&scope).await,
            case_id,
            "first_party_claims",
        )?;
        Ok(self.batch(case_id, "first_party_claims", rows, client_ids))
    }

    /// Third-party claims against the given defendants, in display order
    pub async fn third_party(
        &self,
        case_id: CaseId,
        defendant_ids: &[DefendantId],
    ) -> Result<ClaimBatch<DefendantId>, CaseLoadError> {
        if defendant_ids.is_empty() {
            return Ok(ClaimBatch::empty());
        }
        let scope = ClaimScope::new(case_id, defendant_ids.to_vec());
        let rows: Vec<ThirdPartyClaim> = or_empty_on_denied(
            self.store.third_party_claims(&scope).await,
            case_id,
            "third_party_claims",
        )?;
        Ok(self.batch(case_id, "third_party_claims", rows, defendant_ids))
    }

    /// Health claims of the given clients, in display order
    pub async fn health(
        &self,
        case_id: CaseId,
        client_ids: &[ClientId],
    ) -> Result<ClaimBatch<ClientId>, CaseLoadError> {
        if client_ids.is_empty() {
            return Ok(ClaimBatch::empty());
        }
        let scope = ClaimScope::new(case_id, client_ids.to_vec());
        let rows: Vec<HealthClaim> = or_empty_on_denied(
            self.store.health_claims(&scope).await,
            case_id,
            "health_claims",
        )?;
        Ok(self.batch(case_id, "health_claims", rows, client_ids))
    }

    fn batch<O: Copy + Ord>(
        &self,
        case_id: CaseId,
        collection: &'static str,
        rows: Vec<Claim<O>>,
        owner_ids: &[O],
    ) -> ClaimBatch<O> {
        let fallback_owner = match self.policy {
            LegacyOwnerPolicy::FirstOwnerOfCase => owner_ids.first().copied(),
            LegacyOwnerPolicy::Drop => None,
        };
        let legacy = rows.iter().filter(|c| c.owner.is_none()).count();
        if legacy > 0 {
            warn!(
                %case_id,
                collection,
                legacy,
                policy = ?self.policy,
                "Claims without owner id, applying legacy owner policy"
            );
        }
        debug!(%case_id, collection, claims = rows.len(), "Claim batch loaded");
        ClaimBatch::new(rows, fallback_owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insurance::ClaimKind;
    use crate::ports::mock::{Fault, MockCaseStore, MockTables, StoreCall, StoreOp};
    use proptest::prelude::*;

    fn claim(id: i64, owner: Option<i64>) -> FirstPartyClaim {
        Claim {
            id: ClaimId::new(id),
            kind: ClaimKind::FirstParty,
            owner: owner.map(ClientId::new),
            case_id: Some(CaseId::new(101)),
            claim_number: None,
            policy_number: None,
            insurer_ref: None,
            insurer: None,
            coverage_limit: None,
            amount_paid: None,
            adjuster_name: None,
        }
    }

    fn ids(claims: &[FirstPartyClaim]) -> Vec<i64> {
        claims.iter().map(|c| c.id.get()).collect()
    }

    #[test]
    fn test_grouping_preserves_order_and_omits_empty_owners() {
        let batch = ClaimBatch::new(
            vec![claim(1, Some(2)), claim(2, Some(1)), claim(3, Some(2))],
            Some(ClientId::new(1)),
        );
        let grouped = batch.into_grouped();

        assert_eq!(grouped.len(), 2);
        assert_eq!(ids(&grouped[&ClientId::new(2)]), vec![1, 3]);
        assert_eq!(ids(&grouped[&ClientId::new(1)]), vec![2]);
        assert!(!grouped.contains_key(&ClientId::new(3)));
    }

    #[test]
    fn test_legacy_rows_go_to_fallback_owner() {
        let batch = ClaimBatch::new(vec![claim(1, None), claim(2, Some(5))], Some(ClientId::new(4)));
        assert_eq!(batch.owner_of_id(ClaimId::new(1)), Some(ClientId::new(4)));
        let grouped = batch.into_grouped();
        assert_eq!(ids(&grouped[&ClientId::new(4)]), vec![1]);
    }

    #[test]
    fn test_legacy_rows_dropped_without_fallback() {
        let grouped = ClaimBatch::new(vec![claim(1, None)], None).into_grouped();
        assert!(grouped.is_empty());
    }

    #[tokio::test]
    async fn test_single_batch_query_for_all_owners() {
        let tables = MockTables {
            first_party_claims: vec![claim(1, Some(1)), claim(2, Some(2)), claim(3, None)],
            ..Default::default()
        };
        let store = Arc::new(MockCaseStore::new(tables));
        let aggregator = ClaimAggregator::new(store.clone(), LegacyOwnerPolicy::FirstOwnerOfCase);

        let owners = [ClientId::new(2), ClientId::new(1)];
        let grouped = aggregator
            .first_party(CaseId::new(101), &owners)
            .await
            .unwrap()
            .into_grouped();

        assert_eq!(
            store.count_calls(|c| matches!(c, StoreCall::FirstPartyClaims(_))).await,
            1
        );
        // Legacy claim 3 lands under the first client in display order
        assert_eq!(ids(&grouped[&ClientId::new(2)]), vec![2, 3]);
        assert_eq!(ids(&grouped[&ClientId::new(1)]), vec![1]);
    }

    #[tokio::test]
    async fn test_drop_policy_excludes_legacy_rows() {
        let tables = MockTables {
            first_party_claims: vec![claim(1, Some(1)), claim(3, None)],
            ..Default::default()
        };
        let aggregator =
            ClaimAggregator::new(Arc::new(MockCaseStore::new(tables)), LegacyOwnerPolicy::Drop);

        let grouped = aggregator
            .first_party(CaseId::new(101), &[ClientId::new(1)])
            .await
            .unwrap()
            .into_grouped();
        assert_eq!(ids(&grouped[&ClientId::new(1)]), vec![1]);
        assert_eq!(grouped.values().map(Vec::len).sum::<usize>(), 1);
    }

    #[tokio::test]
    async fn test_no_owners_issues_no_query() {
        let store = Arc::new(MockCaseStore::new(MockTables::default()));
        let aggregator = ClaimAggregator::new(store.clone(), LegacyOwnerPolicy::default());

        let batch = aggregator.health(CaseId::new(101), &[]).await.unwrap();
        assert!(batch.is_empty());
        assert!(store.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_denied_claims_are_empty_and_failures_propagate() {
        let denied = Arc::new(
            MockCaseStore::new(MockTables::default())
                .with_fault(StoreOp::HealthClaims, Fault::PermissionDenied),
        );
        let aggregator = ClaimAggregator::new(denied, LegacyOwnerPolicy::default());
        let batch = aggregator.health(CaseId::new(101), &[ClientId::new(1)]).await.unwrap();
        assert!(batch.is_empty());

        let broken = Arc::new(
            MockCaseStore::new(MockTables::default())
                .with_fault(StoreOp::HealthClaims, Fault::QueryFailed),
        );
        let aggregator = ClaimAggregator::new(broken, LegacyOwnerPolicy::default());
        assert!(aggregator.health(CaseId::new(101), &[ClientId::new(1)]).await.is_err());
    }

    proptest! {
        #[test]
        fn grouping_is_owner_complete(owners in proptest::collection::vec(proptest::option::of(1i64..5), 0..40)) {
            let claims: Vec<_> = owners
                .iter()
                .enumerate()
                .map(|(i, owner)| claim(i as i64, *owner))
                .collect();
            let total = claims.len();
            let grouped = ClaimBatch::new(claims, Some(ClientId::new(1))).into_grouped();

            // Every row appears exactly once and no owner has an empty list
            let mut seen: Vec<i64> = grouped.values().flat_map(|c| ids(c)).collect();
            seen.sort();
            prop_assert_eq!(seen, (0..total as i64).collect::<Vec<_>>());
            prop_assert!(grouped.values().all(|c| !c.is_empty()));
            for (owner, claims) in &grouped {
                for c in claims {
                    prop_assert_eq!(c.owner.unwrap_or(ClientId::new(1)), *owner);
                }
            }
        }
    }
}

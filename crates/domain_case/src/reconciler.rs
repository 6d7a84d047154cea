//! Adjuster reconciler
//!
//! An adjuster can be linked to a claim directly or to the carrier behind
//! it, and the carrier of an owner may differ from the carrier named on its
//! claims. Both paths are read as batches and merged per owner and per
//! claim through an id-keyed arena, so every adjuster appears at most once
//! in any merged list.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, warn};

use core_kernel::{AdjusterId, ClaimId, InsurerId, PortError};

use crate::insurance::{Adjuster, Claim, CoverageLine};
use crate::ports::CaseStorePort;

/// An owner and the carrier it names directly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerLink<O> {
    pub owner: O,
    pub insurer_ref: Option<InsurerId>,
}

/// A claim, its resolved owner and the carrier it names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimLink<O> {
    pub claim_id: ClaimId,
    /// `None` for legacy rows that could not be attributed
    pub owner: Option<O>,
    pub insurer_ref: Option<InsurerId>,
}

impl<O: Copy> ClaimLink<O> {
    pub fn new(claim: &Claim<O>, owner: Option<O>) -> Self {
        Self {
            claim_id: claim.id,
            owner,
            insurer_ref: claim.effective_insurer_id(),
        }
    }
}

/// Merged adjuster lists, per owner and per claim
#[derive(Debug, Clone)]
pub struct AdjusterLinks<O> {
    by_owner: BTreeMap<O, Vec<Adjuster>>,
    by_claim: BTreeMap<ClaimId, Vec<Adjuster>>,
}

impl<O: Copy + Ord> Default for AdjusterLinks<O> {
    fn default() -> Self {
        Self {
            by_owner: BTreeMap::new(),
            by_claim: BTreeMap::new(),
        }
    }
}

impl<O: Copy + Ord> AdjusterLinks<O> {
    pub fn for_owner(&self, owner: O) -> &[Adjuster] {
        self.by_owner.get(&owner).map_or(&[], Vec::as_slice)
    }

    pub fn for_claim(&self, claim_id: ClaimId) -> &[Adjuster] {
        self.by_claim.get(&claim_id).map_or(&[], Vec::as_slice)
    }

    /// Merges the rows of both paths
    ///
    /// Claim-path adjusters come first in every list, followed by
    /// carrier-path adjusters not already present. An owner's list pools the
    /// carriers of all its claims; a claim's list is limited to the owner's
    /// direct carrier and the carrier the claim itself names.
    pub fn merge(
        owners: &[OwnerLink<O>],
        claims: &[ClaimLink<O>],
        claim_path: Vec<Adjuster>,
        insurer_path: Vec<Adjuster>,
    ) -> Self {
        let mut arena: BTreeMap<AdjusterId, Adjuster> = BTreeMap::new();
        let mut via_claim: BTreeMap<ClaimId, Vec<AdjusterId>> = BTreeMap::new();
        let mut via_insurer: BTreeMap<InsurerId, Vec<AdjusterId>> = BTreeMap::new();

        for adjuster in claim_path {
            if let Some(claim_id) = adjuster.claim_ref {
                via_claim.entry(claim_id).or_default().push(adjuster.id);
            }
            arena.entry(adjuster.id).or_insert(adjuster);
        }
        for adjuster in insurer_path {
            if let Some(insurer_id) = adjuster.insurer_ref {
                via_insurer.entry(insurer_id).or_default().push(adjuster.id);
            }
            arena.entry(adjuster.id).or_insert(adjuster);
        }

        // Carriers reachable from each owner, directly or through its claims
        let mut owner_insurers: BTreeMap<O, BTreeSet<InsurerId>> = owners
            .iter()
            .map(|link| (link.owner, link.insurer_ref.into_iter().collect()))
            .collect();
        for claim in claims {
            if let (Some(owner), Some(insurer_id)) = (claim.owner, claim.insurer_ref) {
                owner_insurers.entry(owner).or_default().insert(insurer_id);
            }
        }

        let insurer_ids_of = |owner: O| -> Vec<AdjusterId> {
            owner_insurers
                .get(&owner)
                .into_iter()
                .flatten()
                .flat_map(|insurer_id| via_insurer.get(insurer_id).into_iter().flatten().copied())
                .collect()
        };
        let claim_ids_of = |claim_id: ClaimId| -> Vec<AdjusterId> {
            via_claim.get(&claim_id).cloned().unwrap_or_default()
        };

        let mut by_owner = BTreeMap::new();
        for link in owners {
            let from_claims = claims
                .iter()
                .filter(|c| c.owner == Some(link.owner))
                .flat_map(|c| claim_ids_of(c.claim_id));
            let ids = from_claims.chain(insurer_ids_of(link.owner));
            by_owner.insert(link.owner, collect_unique(ids, &arena));
        }

        // A claim only sees its owner's direct carrier and the carrier it names
        let direct_insurer: BTreeMap<O, InsurerId> = owners
            .iter()
            .filter_map(|link| link.insurer_ref.map(|insurer_id| (link.owner, insurer_id)))
            .collect();
        let adjusters_of = |insurer_id: Option<InsurerId>| -> Vec<AdjusterId> {
            insurer_id
                .and_then(|id| via_insurer.get(&id))
                .cloned()
                .unwrap_or_default()
        };

        let mut by_claim = BTreeMap::new();
        for claim in claims {
            let owner_carrier = claim.owner.and_then(|owner| direct_insurer.get(&owner).copied());
            let ids = claim_ids_of(claim.claim_id)
                .into_iter()
                .chain(adjusters_of(owner_carrier))
                .chain(adjusters_of(claim.insurer_ref));
            by_claim.insert(claim.claim_id, collect_unique(ids, &arena));
        }

        Self { by_owner, by_claim }
    }
}

/// Resolves ids against the arena, keeping the first occurrence of each
fn collect_unique(
    ids: impl IntoIterator<Item = AdjusterId>,
    arena: &BTreeMap<AdjusterId, Adjuster>,
) -> Vec<Adjuster> {
    let mut seen = BTreeSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(*id))
        .filter_map(|id| arena.get(&id).cloned())
        .collect()
}

/// Copies the first merged adjuster's name onto claims that have none
pub fn fill_adjuster_names<O: Copy + Ord>(claims: &mut [Claim<O>], links: &AdjusterLinks<O>) {
    for claim in claims.iter_mut().filter(|c| c.lacks_adjuster_name()) {
        if let Some(first) = links.for_claim(claim.id).first() {
            let name = first.display_name();
            if !name.is_empty() {
                claim.adjuster_name = Some(name);
            }
        }
    }
}

pub struct AdjusterReconciler {
    store: Arc<dyn CaseStorePort>,
}

impl AdjusterReconciler {
    pub fn new(store: Arc<dyn CaseStorePort>) -> Self {
        Self { store }
    }

    /// Reads both adjuster paths for one coverage line and merges them
    ///
    /// A failed batch is logged and counted as empty.
    pub async fn reconcile<O: Copy + Ord>(
        &self,
        line: CoverageLine,
        owners: &[OwnerLink<O>],
        claims: &[ClaimLink<O>],
    ) -> AdjusterLinks<O> {
        let claim_ids: Vec<ClaimId> = claims
            .iter()
            .map(|c| c.claim_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let insurer_ids: Vec<InsurerId> = owners
            .iter()
            .filter_map(|o| o.insurer_ref)
            .chain(claims.iter().filter_map(|c| c.insurer_ref))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let (claim_path, insurer_path) = tokio::join!(
            self.batch(line, "claim", &claim_ids, |ids| self.store.adjusters_by_claims(line, ids)),
            self.batch(line, "insurer", &insurer_ids, |ids| self.store.adjusters_by_insurers(line, ids)),
        );

        debug!(
            ?line,
            via_claim = claim_path.len(),
            via_insurer = insurer_path.len(),
            "Adjuster paths loaded"
        );
        AdjusterLinks::merge(owners, claims, claim_path, insurer_path)
    }

    async fn batch<'a, K, F, Fut>(
        &self,
        line: CoverageLine,
        path: &'static str,
        keys: &'a [K],
        query: F,
    ) -> Vec<Adjuster>
    where
        F: FnOnce(&'a [K]) -> Fut,
        Fut: std::future::Future<Output = Result<Vec<Adjuster>, PortError>>,
    {
        if keys.is_empty() {
            return Vec::new();
        }
        match query(keys).await {
            Ok(rows) => rows,
            Err(error) => {
                warn!(?line, path, %error, "Adjuster batch failed, continuing without it");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insurance::ClaimKind;
    use crate::ports::mock::{Fault, MockCaseStore, MockTables, StoreCall, StoreOp};
    use core_kernel::{CaseId, ClientId, DefendantId};
    use proptest::prelude::*;

    fn adjuster(id: i64, first: &str, insurer: Option<i64>, claim: Option<i64>) -> Adjuster {
        Adjuster {
            id: AdjusterId::new(id),
            line: CoverageLine::Auto,
            first_name: first.to_string(),
            last_name: "Adams".to_string(),
            phone: None,
            email: None,
            insurer_ref: insurer.map(InsurerId::new),
            claim_ref: claim.map(ClaimId::new),
        }
    }

    fn names(adjusters: &[Adjuster]) -> Vec<&str> {
        adjusters.iter().map(|a| a.first_name.as_str()).collect()
    }

    fn defendant_a() -> OwnerLink<DefendantId> {
        OwnerLink {
            owner: DefendantId::new(1),
            insurer_ref: Some(InsurerId::new(7)),
        }
    }

    fn claim_c1() -> ClaimLink<DefendantId> {
        ClaimLink {
            claim_id: ClaimId::new(1),
            owner: Some(DefendantId::new(1)),
            insurer_ref: Some(InsurerId::new(7)),
        }
    }

    #[tokio::test]
    async fn test_both_paths_merge_for_owner_and_claim() {
        let tables = MockTables {
            auto_adjusters: vec![
                adjuster(1, "X", Some(7), None),
                adjuster(2, "Y", None, Some(1)),
            ],
            ..Default::default()
        };
        let reconciler = AdjusterReconciler::new(Arc::new(MockCaseStore::new(tables)));
        let links = reconciler
            .reconcile(CoverageLine::Auto, &[defendant_a()], &[claim_c1()])
            .await;

        assert_eq!(names(links.for_owner(DefendantId::new(1))), vec!["Y", "X"]);
        assert_eq!(names(links.for_claim(ClaimId::new(1))), vec!["Y", "X"]);
    }

    #[tokio::test]
    async fn test_adjuster_on_both_paths_appears_once() {
        let tables = MockTables {
            auto_adjusters: vec![
                adjuster(1, "X", Some(7), Some(1)),
                adjuster(2, "Y", None, Some(1)),
            ],
            ..Default::default()
        };
        let reconciler = AdjusterReconciler::new(Arc::new(MockCaseStore::new(tables)));
        let links = reconciler
            .reconcile(CoverageLine::Auto, &[defendant_a()], &[claim_c1()])
            .await;

        assert_eq!(links.for_owner(DefendantId::new(1)).len(), 2);
        assert_eq!(links.for_claim(ClaimId::new(1)).len(), 2);
    }

    #[tokio::test]
    async fn test_claim_carrier_differs_from_owner_carrier() {
        let tables = MockTables {
            auto_adjusters: vec![adjuster(1, "X", Some(7), None), adjuster(3, "Z", Some(8), None)],
            ..Default::default()
        };
        let store = Arc::new(MockCaseStore::new(tables));
        let reconciler = AdjusterReconciler::new(store.clone());
        let claim = ClaimLink {
            insurer_ref: Some(InsurerId::new(8)),
            ..claim_c1()
        };
        let links = reconciler.reconcile(CoverageLine::Auto, &[defendant_a()], &[claim]).await;

        assert_eq!(names(links.for_owner(DefendantId::new(1))), vec!["X", "Z"]);
        assert_eq!(names(links.for_claim(ClaimId::new(1))), vec!["X", "Z"]);
        assert_eq!(
            store
                .count_calls(|c| matches!(c, StoreCall::AdjustersByInsurers(CoverageLine::Auto, ids) if ids.len() == 2))
                .await,
            1
        );
    }

    #[tokio::test]
    async fn test_sibling_claim_carriers_stay_isolated() {
        let tables = MockTables {
            auto_adjusters: vec![
                adjuster(1, "Seven", Some(7), None),
                adjuster(2, "Eight", Some(8), None),
            ],
            ..Default::default()
        };
        let reconciler = AdjusterReconciler::new(Arc::new(MockCaseStore::new(tables)));
        let owners = [OwnerLink {
            owner: ClientId::new(1),
            insurer_ref: None,
        }];
        let claims = [
            ClaimLink {
                claim_id: ClaimId::new(10),
                owner: Some(ClientId::new(1)),
                insurer_ref: Some(InsurerId::new(8)),
            },
            ClaimLink {
                claim_id: ClaimId::new(11),
                owner: Some(ClientId::new(1)),
                insurer_ref: Some(InsurerId::new(7)),
            },
        ];
        let links = reconciler.reconcile(CoverageLine::Auto, &owners, &claims).await;

        assert_eq!(names(links.for_claim(ClaimId::new(10))), vec!["Eight"]);
        assert_eq!(names(links.for_claim(ClaimId::new(11))), vec!["Seven"]);
        assert_eq!(names(links.for_owner(ClientId::new(1))), vec!["Seven", "Eight"]);

        let blank = Claim {
            id: ClaimId::new(10),
            kind: ClaimKind::FirstParty,
            owner: Some(ClientId::new(1)),
            case_id: Some(CaseId::new(101)),
            claim_number: None,
            policy_number: None,
            insurer_ref: Some(InsurerId::new(8)),
            insurer: None,
            coverage_limit: None,
            amount_paid: None,
            adjuster_name: None,
        };
        let sibling = Claim {
            id: ClaimId::new(11),
            insurer_ref: Some(InsurerId::new(7)),
            ..blank.clone()
        };
        let mut filled = vec![blank, sibling];
        fill_adjuster_names(&mut filled, &links);

        assert_eq!(filled[0].adjuster_name.as_deref(), Some("Eight Adams"));
        assert_eq!(filled[1].adjuster_name.as_deref(), Some("Seven Adams"));
    }

    #[tokio::test]
    async fn test_failed_batch_keeps_other_path() {
        let tables = MockTables {
            auto_adjusters: vec![adjuster(1, "X", Some(7), None), adjuster(2, "Y", None, Some(1))],
            ..Default::default()
        };
        let store = MockCaseStore::new(tables)
            .with_fault(StoreOp::AdjustersByClaims(CoverageLine::Auto), Fault::QueryFailed);
        let reconciler = AdjusterReconciler::new(Arc::new(store));
        let links = reconciler
            .reconcile(CoverageLine::Auto, &[defendant_a()], &[claim_c1()])
            .await;

        assert_eq!(names(links.for_claim(ClaimId::new(1))), vec!["X"]);
    }

    #[tokio::test]
    async fn test_no_keys_issues_no_queries() {
        let store = Arc::new(MockCaseStore::new(MockTables::default()));
        let reconciler = AdjusterReconciler::new(store.clone());
        let owners = [OwnerLink {
            owner: ClientId::new(1),
            insurer_ref: None,
        }];
        let links = reconciler.reconcile(CoverageLine::Health, &owners, &[]).await;

        assert!(links.for_owner(ClientId::new(1)).is_empty());
        assert!(store.calls().await.is_empty());
    }

    #[test]
    fn test_fill_adjuster_names_only_when_missing() {
        let owners = [defendant_a()];
        let claims = [claim_c1()];
        let links = AdjusterLinks::merge(&owners, &claims, vec![adjuster(2, "Yara", None, Some(1))], vec![]);

        let blank = Claim {
            id: ClaimId::new(1),
            kind: ClaimKind::ThirdParty,
            owner: Some(DefendantId::new(1)),
            case_id: Some(CaseId::new(101)),
            claim_number: None,
            policy_number: None,
            insurer_ref: None,
            insurer: None,
            coverage_limit: None,
            amount_paid: None,
            adjuster_name: Some("  ".to_string()),
        };
        let named = Claim {
            adjuster_name: Some("Pat Lee".to_string()),
            ..blank.clone()
        };
        let mut claims = vec![blank, named];
        fill_adjuster_names(&mut claims, &links);

        assert_eq!(claims[0].adjuster_name.as_deref(), Some("Yara Adams"));
        assert_eq!(claims[1].adjuster_name.as_deref(), Some("Pat Lee"));
    }

    fn arb_adjuster() -> impl Strategy<Value = Adjuster> {
        (0i64..12, proptest::option::of(1i64..4), proptest::option::of(1i64..4))
            .prop_map(|(id, insurer, claim)| adjuster(id, "A", insurer, claim))
    }

    proptest! {
        #[test]
        fn merged_lists_never_repeat_an_adjuster(
            claim_path in proptest::collection::vec(arb_adjuster(), 0..20),
            insurer_path in proptest::collection::vec(arb_adjuster(), 0..20),
        ) {
            let owners: Vec<_> = (1..3)
                .map(|i| OwnerLink { owner: DefendantId::new(i), insurer_ref: Some(InsurerId::new(i)) })
                .collect();
            let claims: Vec<_> = (1..4)
                .map(|i| ClaimLink {
                    claim_id: ClaimId::new(i),
                    owner: Some(DefendantId::new(1 + i % 2)),
                    insurer_ref: Some(InsurerId::new(i)),
                })
                .collect();
            let links = AdjusterLinks::merge(&owners, &claims, claim_path, insurer_path);

            let lists = owners
                .iter()
                .map(|o| links.for_owner(o.owner))
                .chain(claims.iter().map(|c| links.for_claim(c.claim_id)));
            for list in lists {
                let unique: BTreeSet<_> = list.iter().map(|a| a.id).collect();
                prop_assert_eq!(unique.len(), list.len());
            }
        }
    }
}

//! End-to-end tests of the case overview pipeline against the mock store

use std::sync::Arc;
use std::time::Duration;

use core_kernel::{AdjusterId, ClaimId, ClientId, InsurerId};
use domain_case::ports::mock::{Fault, MockCaseStore, StoreCall, StoreOp};
use domain_case::{CaseOverviewPipeline, InsurerSource, LegacyOwnerPolicy, LoadState, PipelineOptions};
use rust_decimal_macros::dec;
use test_utils::{
    assert_adjuster_ids, assert_failed_not_found, assert_ready, AdjusterBuilder,
    CaseTablesBuilder, ClaimBuilder, ClientBuilder, DateFixtures, IdFixtures, InsurerBuilder,
    ScenarioFixtures,
};
use tokio::sync::Notify;

fn pipeline(store: MockCaseStore) -> (Arc<MockCaseStore>, CaseOverviewPipeline) {
    let store = Arc::new(store);
    let pipeline = CaseOverviewPipeline::new(store.clone(), PipelineOptions::default());
    (store, pipeline)
}

#[tokio::test]
async fn test_adjusters_merge_across_claim_and_insurer_paths() {
    let (store, pipeline) = pipeline(MockCaseStore::new(ScenarioFixtures::adjuster_paths()));

    let state: LoadState = pipeline
        .load_as_of(IdFixtures::case_id(), DateFixtures::today())
        .await
        .into();
    let overview = assert_ready(&state);

    let defendant = overview.defendant(IdFixtures::defendant_a()).unwrap();
    assert_adjuster_ids(
        &defendant.adjusters,
        &[IdFixtures::adjuster_x(), IdFixtures::adjuster_y()],
    );

    let claims = overview.third_party_claims(IdFixtures::defendant_a());
    assert_eq!(claims.len(), 1);
    assert_adjuster_ids(
        &claims[0].adjusters,
        &[IdFixtures::adjuster_x(), IdFixtures::adjuster_y()],
    );

    // One complete-source lookup each for defendant A and claim C1
    let lookups = store
        .count_calls(|c| {
            *c == StoreCall::FindAutoInsurer(InsurerSource::Complete, IdFixtures::insurer_7())
        })
        .await;
    assert_eq!(lookups, 2);
}

#[tokio::test]
async fn test_backfilled_insurer_and_derived_fields() {
    let (_, pipeline) = pipeline(MockCaseStore::new(ScenarioFixtures::adjuster_paths()));

    let overview = pipeline
        .load_as_of(IdFixtures::case_id(), DateFixtures::today())
        .await
        .unwrap();

    assert_eq!(overview.case_file().days_until_statute, Some(31));

    let defendant = overview.defendant(IdFixtures::defendant_a()).unwrap();
    let insurer = defendant.defendant.insurer.as_ref().unwrap();
    assert_eq!(insurer.id, IdFixtures::insurer_7());
    assert_eq!(insurer.name, "Keystone Mutual");

    let claim = &overview.third_party_claims(IdFixtures::defendant_a())[0];
    assert_eq!(claim.claim.insurer.as_ref().unwrap().id, IdFixtures::insurer_7());
    assert_eq!(claim.remaining_limit, Some(dec!(20000.00)));
    // Name taken from the claim-path adjuster, which merges first
    assert_eq!(claim.claim.adjuster_name.as_deref(), Some("Yolanda Park"));
}

#[tokio::test]
async fn test_adjuster_linked_both_ways_is_listed_once() {
    let mut tables = ScenarioFixtures::adjuster_paths();
    for adjuster in &mut tables.auto_adjusters {
        adjuster.claim_ref = Some(IdFixtures::claim_c1());
    }
    let (_, pipeline) = pipeline(MockCaseStore::new(tables));

    let overview = pipeline
        .load_as_of(IdFixtures::case_id(), DateFixtures::today())
        .await
        .unwrap();

    let claim = &overview.third_party_claims(IdFixtures::defendant_a())[0];
    assert_adjuster_ids(
        &claim.adjusters,
        &[IdFixtures::adjuster_x(), IdFixtures::adjuster_y()],
    );
}

#[tokio::test]
async fn test_missing_case_fails_with_not_found() {
    let (store, pipeline) = pipeline(MockCaseStore::new(ScenarioFixtures::adjuster_paths()));

    let state = pipeline.run(IdFixtures::missing_case_id()).await;

    assert_failed_not_found(&state);
    assert!(state.overview().is_none());
    // Nothing past the case file is read
    assert_eq!(store.calls().await.len(), 1);
}

#[tokio::test]
async fn test_relationship_error_on_defendants_still_reaches_ready() {
    let store = MockCaseStore::new(ScenarioFixtures::adjuster_paths())
        .with_fault(StoreOp::DefendantsWithInsurer, Fault::RelationshipUnavailable);
    let (store, pipeline) = pipeline(store);

    let state: LoadState = pipeline
        .load_as_of(IdFixtures::case_id(), DateFixtures::today())
        .await
        .into();
    let overview = assert_ready(&state);

    assert_eq!(overview.defendants().len(), 1);
    assert!(overview.defendants()[0].defendant.insurer.is_some());
    assert_eq!(
        store.count_calls(|c| matches!(c, StoreCall::Defendants(_))).await,
        1
    );
}

#[tokio::test]
async fn test_genuine_query_failure_fails_the_load() {
    let store = MockCaseStore::new(ScenarioFixtures::adjuster_paths())
        .with_fault(StoreOp::ThirdPartyClaims, Fault::Timeout);
    let (_, pipeline) = pipeline(store);

    let state = pipeline.run(IdFixtures::case_id()).await;

    assert!(state.is_failed());
    assert!(!state.error().unwrap().is_not_found());
}

#[tokio::test]
async fn test_result_does_not_wait_for_write_back() {
    let gate = Arc::new(Notify::new());
    let store = MockCaseStore::new(ScenarioFixtures::adjuster_paths()).with_write_back_gate(gate.clone());
    let (store, pipeline) = pipeline(store);

    let overview = pipeline
        .load_as_of(IdFixtures::case_id(), DateFixtures::today())
        .await
        .unwrap();

    assert_eq!(overview.case_file().days_until_statute, Some(31));
    let stored = store.stored_case_file(IdFixtures::case_id()).await.unwrap();
    assert_eq!(stored.days_until_statute, None);

    gate.notify_one();
    let persisted = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let stored = store.stored_case_file(IdFixtures::case_id()).await.unwrap();
            if stored.days_until_statute.is_some() {
                return stored.days_until_statute;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(persisted, Some(31));
}

#[tokio::test]
async fn test_failed_write_back_does_not_change_result() {
    let store = MockCaseStore::new(ScenarioFixtures::adjuster_paths())
        .with_fault(StoreOp::UpdateDaysUntilStatute, Fault::QueryFailed);
    let (_, pipeline) = pipeline(store);

    let state = pipeline.run(IdFixtures::case_id()).await;
    assert!(state.is_ready());
}

#[tokio::test]
async fn test_client_collections_are_grouped_and_summarised() {
    let (_, pipeline) = pipeline(MockCaseStore::new(ScenarioFixtures::two_clients()));

    let overview = pipeline
        .load_as_of(IdFixtures::case_id(), DateFixtures::today())
        .await
        .unwrap();

    let client_ids: Vec<_> = overview.clients().iter().map(|c| c.client.id).collect();
    assert_eq!(client_ids, vec![IdFixtures::client_one(), IdFixtures::client_two()]);

    // Legacy first-party claim 22 lands under the first client
    let first_party = overview.first_party_claims(IdFixtures::client_one());
    assert_eq!(first_party.len(), 1);
    assert_eq!(first_party[0].claim.id, ClaimId::new(22));
    assert!(first_party[0].claim.owner.is_none());
    assert_eq!(overview.first_party_claims(IdFixtures::client_two())[0].claim.id, ClaimId::new(21));

    let health = overview.health_claims(IdFixtures::client_one());
    assert_eq!(health[0].claim.insurer.as_ref().unwrap().id, InsurerId::new(4));
    assert_eq!(health[0].claim.adjuster_name.as_deref(), Some("Hana Ito"));
    assert_eq!(overview.clients()[0].health_adjusters.len(), 1);
    assert!(overview.health_claims(IdFixtures::client_two()).is_empty());
    assert!(!overview.health_claims_by_owner().contains_key(&IdFixtures::client_two()));

    let bills = overview.medical_bills();
    assert_eq!(bills[0].owner_name, "Jane Doe");
    assert_eq!(bills[1].owner_name, "Sam Lee");
    let summary = overview.billing_summary(IdFixtures::client_one()).unwrap();
    assert_eq!(summary.outstanding, dec!(1200.00));

    let descriptions: Vec<_> = overview.work_logs().iter().map(|w| w.description.as_str()).collect();
    assert_eq!(
        descriptions,
        vec!["Sent letter of representation", "Requested police report"]
    );
}

#[tokio::test]
async fn test_drop_policy_leaves_legacy_claims_out() {
    let store = Arc::new(MockCaseStore::new(ScenarioFixtures::two_clients()));
    let pipeline = CaseOverviewPipeline::new(
        store,
        PipelineOptions {
            legacy_owner_policy: LegacyOwnerPolicy::Drop,
            ..Default::default()
        },
    );

    let overview = pipeline
        .load_as_of(IdFixtures::case_id(), DateFixtures::today())
        .await
        .unwrap();

    assert!(overview.first_party_claims(IdFixtures::client_one()).is_empty());
    assert_eq!(overview.first_party_claims(IdFixtures::client_two()).len(), 1);
}

#[tokio::test]
async fn test_permission_denied_collections_render_empty() {
    let store = MockCaseStore::new(ScenarioFixtures::two_clients())
        .with_fault(StoreOp::MedicalBills, Fault::PermissionDenied)
        .with_fault(StoreOp::WorkLogs, Fault::PermissionDenied);
    let (_, pipeline) = pipeline(store);

    let state = pipeline.run(IdFixtures::case_id()).await;
    let overview = assert_ready(&state);

    assert!(overview.medical_bills().is_empty());
    assert!(overview.work_logs().is_empty());
    assert_eq!(overview.clients().len(), 2);
    assert_eq!(
        overview.billing_summary(ClientId::new(1)).unwrap().total_billed,
        dec!(0)
    );
}

#[tokio::test]
async fn test_claims_of_one_client_keep_their_own_carriers_adjusters() {
    let case_id = IdFixtures::case_id();
    let client = IdFixtures::client_one();
    let tables = CaseTablesBuilder::with_default_case()
        .client(ClientBuilder::new(client, case_id).build())
        .basic_auto_insurer(InsurerBuilder::auto(InsurerId::new(7)).build())
        .basic_auto_insurer(InsurerBuilder::auto(InsurerId::new(8)).build())
        .first_party_claim(
            ClaimBuilder::first_party(ClaimId::new(10), client)
                .with_insurer_ref(InsurerId::new(8))
                .build(),
        )
        .first_party_claim(
            ClaimBuilder::first_party(ClaimId::new(11), client)
                .with_insurer_ref(InsurerId::new(7))
                .build(),
        )
        .adjuster(
            AdjusterBuilder::auto(AdjusterId::new(70))
                .named("Seven", "Adams")
                .for_insurer(InsurerId::new(7))
                .build(),
        )
        .adjuster(
            AdjusterBuilder::auto(AdjusterId::new(80))
                .named("Eight", "Adams")
                .for_insurer(InsurerId::new(8))
                .build(),
        )
        .build();
    let (_, pipeline) = pipeline(MockCaseStore::new(tables));

    let overview = pipeline
        .load_as_of(case_id, DateFixtures::today())
        .await
        .unwrap();

    let claims = overview.first_party_claims(client);
    assert_eq!(claims.len(), 2);
    let claim_10 = claims.iter().find(|c| c.claim.id == ClaimId::new(10)).unwrap();
    let claim_11 = claims.iter().find(|c| c.claim.id == ClaimId::new(11)).unwrap();

    assert_adjuster_ids(&claim_10.adjusters, &[AdjusterId::new(80)]);
    assert_adjuster_ids(&claim_11.adjusters, &[AdjusterId::new(70)]);
    assert_eq!(claim_10.claim.adjuster_name.as_deref(), Some("Eight Adams"));
    assert_eq!(claim_11.claim.adjuster_name.as_deref(), Some("Seven Adams"));

    // The client's own list pools both carriers
    assert_adjuster_ids(
        &overview.clients()[0].auto_adjusters,
        &[AdjusterId::new(70), AdjusterId::new(80)],
    );
}

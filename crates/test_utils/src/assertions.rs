//! Custom Test Assertions
//!
//! Assertion helpers for case overview types that give more meaningful
//! failure messages than a bare `assert_eq!` on nested structures.

use std::collections::BTreeSet;

use core_kernel::AdjusterId;
use domain_case::{Adjuster, CaseLoadError, CaseOverview, LoadState};

/// Asserts that no adjuster id appears twice in a merged list
///
/// # Panics
///
/// Panics with the duplicated ids when the list repeats an adjuster
pub fn assert_no_duplicate_adjusters(adjusters: &[Adjuster]) {
    let mut seen = BTreeSet::new();
    let duplicates: Vec<AdjusterId> = adjusters
        .iter()
        .map(|a| a.id)
        .filter(|id| !seen.insert(*id))
        .collect();
    assert!(
        duplicates.is_empty(),
        "Duplicate adjusters in merged list: {:?}",
        duplicates
    );
}

/// Asserts that a merged list holds exactly the given adjusters, in any order
pub fn assert_adjuster_ids(adjusters: &[Adjuster], expected: &[AdjusterId]) {
    assert_no_duplicate_adjusters(adjusters);
    let actual: BTreeSet<AdjusterId> = adjusters.iter().map(|a| a.id).collect();
    let expected: BTreeSet<AdjusterId> = expected.iter().copied().collect();
    assert_eq!(actual, expected, "Merged adjuster ids differ");
}

/// Asserts that a load reached `Ready` and returns the overview
///
/// # Panics
///
/// Panics with the load error when the state is not `Ready`
pub fn assert_ready(state: &LoadState) -> &CaseOverview {
    match state {
        LoadState::Ready(overview) => overview.as_ref(),
        LoadState::Failed(error) => panic!("Expected Ready, load failed: {}", error),
        LoadState::Loading => panic!("Expected Ready, load still in progress"),
    }
}

/// Asserts that a load failed because the case does not exist
pub fn assert_failed_not_found(state: &LoadState) {
    match state {
        LoadState::Failed(CaseLoadError::NotFound(_)) => {}
        LoadState::Failed(error) => panic!("Expected NotFound, got: {}", error),
        _ => panic!("Expected Failed(NotFound), got {}", state_name(state)),
    }
}

fn state_name(state: &LoadState) -> &'static str {
    match state {
        LoadState::Loading => "Loading",
        LoadState::Ready(_) => "Ready",
        LoadState::Failed(_) => "Failed",
    }
}

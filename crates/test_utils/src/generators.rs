//! Property-Based Test Generators
//!
//! Proptest strategies for case data. Ids are drawn from small ranges on
//! purpose so generated rows collide on owners, claims and carriers.

use core_kernel::{AdjusterId, CaseId, ClaimId, ClientId, InsurerId};
use domain_case::{Adjuster, Claim};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::builders::{AdjusterBuilder, ClaimBuilder};

/// Strategy for small positive ids
pub fn small_id_strategy() -> impl Strategy<Value = i64> {
    1i64..6i64
}

/// Strategy for monetary amounts between 0 and 100,000.00
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for auto adjusters linked to a claim, a carrier, both or neither
pub fn auto_adjuster_strategy() -> impl Strategy<Value = Adjuster> {
    (
        0i64..20i64,
        proptest::option::of(small_id_strategy()),
        proptest::option::of(small_id_strategy()),
    )
        .prop_map(|(id, insurer, claim)| {
            let mut builder = AdjusterBuilder::auto(AdjusterId::new(id));
            if let Some(insurer) = insurer {
                builder = builder.for_insurer(InsurerId::new(insurer));
            }
            if let Some(claim) = claim {
                builder = builder.for_claim(ClaimId::new(claim));
            }
            builder.build()
        })
}

/// Strategy for first-party claim rows of case 101, some without an owner
pub fn first_party_claims_strategy(max: usize) -> impl Strategy<Value = Vec<Claim<ClientId>>> {
    proptest::collection::vec(proptest::option::of(small_id_strategy()), 0..max).prop_map(|owners| {
        owners
            .into_iter()
            .enumerate()
            .map(|(index, owner)| {
                let builder = ClaimBuilder::first_party(ClaimId::new(index as i64 + 1), ClientId::new(owner.unwrap_or(1)));
                match owner {
                    Some(_) => builder.build(),
                    None => builder.without_owner(CaseId::new(101)).build(),
                }
            })
            .collect()
    })
}

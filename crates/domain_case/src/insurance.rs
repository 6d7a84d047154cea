//! Insurance entities: carriers, claims and adjusters

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{AdjusterId, CaseId, ClaimId, ClientId, DefendantId, InsurerId};
use crate::party::join_name;

/// Line of coverage a carrier or adjuster belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageLine {
    Auto,
    Health,
}

/// Storage source for auto carriers
///
/// The same carrier may be described by a fully populated record or by a
/// basic one created during intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsurerSource {
    /// `auto_insurance_complete`
    Complete,
    /// `auto_insurance`
    Basic,
}

/// An insurance carrier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insurer {
    pub id: InsurerId,
    pub line: CoverageLine,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Kind of claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimKind {
    /// Against the client's own auto policy (PIP, med-pay, UM/UIM)
    FirstParty,
    /// Against a defendant's liability carrier
    ThirdParty,
    /// Health insurance paying for the client's treatment
    Health,
}

/// An insurance claim owned by a client or a defendant
///
/// `O` is the owner's identifier type. Legacy rows may lack an owner, in
/// which case `owner` is `None` and grouping falls back to a policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim<O> {
    pub id: ClaimId,
    pub kind: ClaimKind,
    /// Owning client or defendant
    pub owner: Option<O>,
    /// Owning case, recorded on newer rows only
    pub case_id: Option<CaseId>,
    pub claim_number: Option<String>,
    pub policy_number: Option<String>,
    /// Foreign key to the carrier handling the claim
    pub insurer_ref: Option<InsurerId>,
    /// Embedded carrier, present when the join or a backfill resolved it
    pub insurer: Option<Insurer>,
    /// Coverage limit available under the claim
    pub coverage_limit: Option<Decimal>,
    /// Amount paid or used so far
    pub amount_paid: Option<Decimal>,
    /// Human-readable adjuster name entered on the claim
    pub adjuster_name: Option<String>,
}

pub type FirstPartyClaim = Claim<ClientId>;
pub type ThirdPartyClaim = Claim<DefendantId>;
pub type HealthClaim = Claim<ClientId>;

impl<O> Claim<O> {
    /// Insurer id from the foreign key, or from the embedded carrier
    pub fn effective_insurer_id(&self) -> Option<InsurerId> {
        self.insurer_ref.or_else(|| self.insurer.as_ref().map(|i| i.id))
    }

    /// Limit left after payments, never negative
    pub fn remaining_limit(&self) -> Option<Decimal> {
        let limit = self.coverage_limit?;
        let paid = self.amount_paid.unwrap_or(Decimal::ZERO);
        Some((limit - paid).max(Decimal::ZERO))
    }

    /// True when no usable adjuster name was entered
    pub fn lacks_adjuster_name(&self) -> bool {
        self.adjuster_name
            .as_deref()
            .map_or(true, |name| name.trim().is_empty())
    }
}

/// An insurance company contact handling claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjuster {
    pub id: AdjusterId,
    pub line: CoverageLine,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Carrier employing the adjuster
    pub insurer_ref: Option<InsurerId>,
    /// Claim the adjuster is assigned to
    pub claim_ref: Option<ClaimId>,
}

impl Adjuster {
    pub fn display_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }
}

//! Parties to a case: the firm's clients and the opposing defendants

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{CaseId, ClientId, DefendantId, InsurerId};
use crate::insurance::Insurer;

/// A person the firm represents in a case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// Unique identifier
    pub id: ClientId,
    /// Owning case
    pub case_id: CaseId,
    /// Display position within the case, unique per case
    pub client_order: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Free-text description of injuries
    pub injuries: Option<String>,
}

impl Client {
    /// Full name as shown on bills and headers
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }
}

/// An opposing party, typically an at-fault driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defendant {
    /// Unique identifier
    pub id: DefendantId,
    /// Owning case
    pub case_id: CaseId,
    /// Sequence number within the case, used for ordering
    pub defendant_number: i32,
    pub first_name: String,
    pub last_name: String,
    /// Foreign key to the defendant's liability carrier
    pub insurer_ref: Option<InsurerId>,
    /// Embedded carrier, present when the join or a backfill resolved it
    pub insurer: Option<Insurer>,
    pub policy_number: Option<String>,
    /// Bodily injury policy limit
    pub policy_limit: Option<Decimal>,
    /// Share of fault assigned to this defendant, 0-100
    pub liability_percentage: Option<Decimal>,
}

impl Defendant {
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }

    /// Insurer id from the foreign key, or from the embedded carrier
    pub fn effective_insurer_id(&self) -> Option<InsurerId> {
        self.insurer_ref.or_else(|| self.insurer.as_ref().map(|i| i.id))
    }
}

pub(crate) fn join_name(first: &str, last: &str) -> String {
    let first = first.trim();
    let last = last.trim();
    match (first.is_empty(), last.is_empty()) {
        (false, false) => format!("{} {}", first, last),
        (false, true) => first.to_string(),
        (true, false) => last.to_string(),
        (true, true) => String::new(),
    }
}

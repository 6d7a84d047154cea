//! Test Data Builders
//!
//! Builders for case entities with sensible defaults, so tests only spell out
//! the fields they care about. `CaseTablesBuilder` assembles them into the
//! in-memory tables of the mock case store.

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{
    AdjusterId, CaseId, ClaimId, ClientId, DefendantId, InsurerId, MedicalBillId, ProviderId,
    WorkLogId,
};
use domain_case::ports::mock::MockTables;
use domain_case::{
    Adjuster, CaseFile, Claim, ClaimKind, Client, CoverageLine, Defendant, Insurer, MedicalBill,
    WorkLogEntry,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::fixtures::{DateFixtures, IdFixtures};

/// Builder for case files
pub struct CaseFileBuilder {
    case_file: CaseFile,
}

impl CaseFileBuilder {
    pub fn new(id: CaseId) -> Self {
        Self {
            case_file: CaseFile {
                id,
                created_at: DateFixtures::created_at(),
                title: Some(format!("Case {}", id.get())),
                status: "open".to_string(),
                stage: "treatment".to_string(),
                incident_date: Some(DateFixtures::incident_date()),
                statute_deadline: None,
                days_until_statute: None,
            },
        }
    }

    pub fn with_statute_deadline(mut self, deadline: NaiveDate) -> Self {
        self.case_file.statute_deadline = Some(deadline);
        self
    }

    pub fn with_stored_countdown(mut self, days: i64) -> Self {
        self.case_file.days_until_statute = Some(days);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.case_file.status = status.into();
        self
    }

    pub fn build(self) -> CaseFile {
        self.case_file
    }
}

/// Builder for clients
pub struct ClientBuilder {
    client: Client,
}

impl ClientBuilder {
    pub fn new(id: ClientId, case_id: CaseId) -> Self {
        Self {
            client: Client {
                id,
                case_id,
                client_order: 1,
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1985, 3, 14),
                phone: Some("555-0100".to_string()),
                email: None,
                address: None,
                injuries: Some("Whiplash".to_string()),
            },
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.client.client_order = order;
        self
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.client.first_name = first.into();
        self.client.last_name = last.into();
        self
    }

    pub fn build(self) -> Client {
        self.client
    }
}

/// Builder for defendants
pub struct DefendantBuilder {
    defendant: Defendant,
}

impl DefendantBuilder {
    pub fn new(id: DefendantId, case_id: CaseId) -> Self {
        Self {
            defendant: Defendant {
                id,
                case_id,
                defendant_number: 1,
                first_name: "Dale".to_string(),
                last_name: "Roe".to_string(),
                insurer_ref: None,
                insurer: None,
                policy_number: None,
                policy_limit: Some(dec!(50000.00)),
                liability_percentage: Some(dec!(100)),
            },
        }
    }

    pub fn with_number(mut self, number: i32) -> Self {
        self.defendant.defendant_number = number;
        self
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.defendant.first_name = first.into();
        self.defendant.last_name = last.into();
        self
    }

    pub fn with_insurer_ref(mut self, insurer: InsurerId) -> Self {
        self.defendant.insurer_ref = Some(insurer);
        self
    }

    pub fn build(self) -> Defendant {
        self.defendant
    }
}

/// Builder for carriers
pub struct InsurerBuilder {
    insurer: Insurer,
}

impl InsurerBuilder {
    pub fn auto(id: InsurerId) -> Self {
        Self::new(id, CoverageLine::Auto)
    }

    pub fn health(id: InsurerId) -> Self {
        Self::new(id, CoverageLine::Health)
    }

    fn new(id: InsurerId, line: CoverageLine) -> Self {
        Self {
            insurer: Insurer {
                id,
                line,
                name: format!("Carrier {}", id.get()),
                phone: Some("800-555-0199".to_string()),
                email: None,
                address: None,
            },
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.insurer.name = name.into();
        self
    }

    pub fn build(self) -> Insurer {
        self.insurer
    }
}

/// Builder for claims of any kind
pub struct ClaimBuilder<O> {
    claim: Claim<O>,
}

impl ClaimBuilder<ClientId> {
    pub fn first_party(id: ClaimId, owner: ClientId) -> Self {
        Self::new(id, ClaimKind::FirstParty, Some(owner))
    }

    pub fn health(id: ClaimId, owner: ClientId) -> Self {
        Self::new(id, ClaimKind::Health, Some(owner))
    }
}

impl ClaimBuilder<DefendantId> {
    pub fn third_party(id: ClaimId, owner: DefendantId) -> Self {
        Self::new(id, ClaimKind::ThirdParty, Some(owner))
    }
}

impl<O> ClaimBuilder<O> {
    fn new(id: ClaimId, kind: ClaimKind, owner: Option<O>) -> Self {
        Self {
            claim: Claim {
                id,
                kind,
                owner,
                case_id: None,
                claim_number: Some(format!("CN-{}", id.get())),
                policy_number: None,
                insurer_ref: None,
                insurer: None,
                coverage_limit: None,
                amount_paid: None,
                adjuster_name: None,
            },
        }
    }

    /// Turns the claim into a legacy row of `case_id` with no owner
    pub fn without_owner(mut self, case_id: CaseId) -> Self {
        self.claim.owner = None;
        self.claim.case_id = Some(case_id);
        self
    }

    pub fn in_case(mut self, case_id: CaseId) -> Self {
        self.claim.case_id = Some(case_id);
        self
    }

    pub fn with_insurer_ref(mut self, insurer: InsurerId) -> Self {
        self.claim.insurer_ref = Some(insurer);
        self
    }

    pub fn with_limit(mut self, limit: Decimal, paid: Decimal) -> Self {
        self.claim.coverage_limit = Some(limit);
        self.claim.amount_paid = Some(paid);
        self
    }

    pub fn with_adjuster_name(mut self, name: impl Into<String>) -> Self {
        self.claim.adjuster_name = Some(name.into());
        self
    }

    pub fn build(self) -> Claim<O> {
        self.claim
    }
}

/// Builder for adjusters
pub struct AdjusterBuilder {
    adjuster: Adjuster,
}

impl AdjusterBuilder {
    pub fn auto(id: AdjusterId) -> Self {
        Self::new(id, CoverageLine::Auto)
    }

    pub fn health(id: AdjusterId) -> Self {
        Self::new(id, CoverageLine::Health)
    }

    fn new(id: AdjusterId, line: CoverageLine) -> Self {
        Self {
            adjuster: Adjuster {
                id,
                line,
                first_name: "Alex".to_string(),
                last_name: format!("Adjuster{}", id.get()),
                phone: None,
                email: None,
                insurer_ref: None,
                claim_ref: None,
            },
        }
    }

    pub fn named(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.adjuster.first_name = first.into();
        self.adjuster.last_name = last.into();
        self
    }

    pub fn for_insurer(mut self, insurer: InsurerId) -> Self {
        self.adjuster.insurer_ref = Some(insurer);
        self
    }

    pub fn for_claim(mut self, claim: ClaimId) -> Self {
        self.adjuster.claim_ref = Some(claim);
        self
    }

    pub fn build(self) -> Adjuster {
        self.adjuster
    }
}

/// Builds a medical bill with no payments or adjustments
pub fn medical_bill(id: MedicalBillId, client: ClientId, billed: Decimal) -> MedicalBill {
    MedicalBill {
        id,
        client_id: client,
        provider_id: Some(ProviderId::new(1)),
        provider_name: Some("Northside Physical Therapy".to_string()),
        service_date: Some(DateFixtures::incident_date()),
        amount_billed: billed,
        amount_paid: Decimal::ZERO,
        adjustments: Decimal::ZERO,
    }
}

/// Builds a work log entry
pub fn work_log(id: WorkLogId, case_id: CaseId, timestamp: DateTime<Utc>, description: &str) -> WorkLogEntry {
    WorkLogEntry {
        id,
        case_id,
        description: description.to_string(),
        timestamp,
        actor: Some("paralegal".to_string()),
    }
}

/// Assembles the in-memory tables of a mock case store
#[derive(Default)]
pub struct CaseTablesBuilder {
    tables: MockTables,
}

impl CaseTablesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a case with the default id and no deadline
    pub fn with_default_case() -> Self {
        Self::new().case(CaseFileBuilder::new(IdFixtures::case_id()).build())
    }

    pub fn case(mut self, case_file: CaseFile) -> Self {
        self.tables.case_files.insert(case_file.id, case_file);
        self
    }

    pub fn client(mut self, client: Client) -> Self {
        self.tables.clients.push(client);
        self
    }

    pub fn defendant(mut self, defendant: Defendant) -> Self {
        self.tables.defendants.push(defendant);
        self
    }

    /// Adds a carrier to `auto_insurance`, the source the embedded joins use
    pub fn basic_auto_insurer(mut self, insurer: Insurer) -> Self {
        self.tables.auto_insurance.insert(insurer.id, insurer);
        self
    }

    /// Adds a carrier to `auto_insurance_complete`, reachable only by backfill
    pub fn complete_auto_insurer(mut self, insurer: Insurer) -> Self {
        self.tables.auto_insurance_complete.insert(insurer.id, insurer);
        self
    }

    pub fn health_insurer(mut self, insurer: Insurer) -> Self {
        self.tables.health_insurance.insert(insurer.id, insurer);
        self
    }

    pub fn first_party_claim(mut self, claim: Claim<ClientId>) -> Self {
        self.tables.first_party_claims.push(claim);
        self
    }

    pub fn third_party_claim(mut self, claim: Claim<DefendantId>) -> Self {
        self.tables.third_party_claims.push(claim);
        self
    }

    pub fn health_claim(mut self, claim: Claim<ClientId>) -> Self {
        self.tables.health_claims.push(claim);
        self
    }

    pub fn adjuster(mut self, adjuster: Adjuster) -> Self {
        match adjuster.line {
            CoverageLine::Auto => self.tables.auto_adjusters.push(adjuster),
            CoverageLine::Health => self.tables.health_adjusters.push(adjuster),
        }
        self
    }

    pub fn medical_bill(mut self, bill: MedicalBill) -> Self {
        self.tables.medical_bills.push(bill);
        self
    }

    pub fn work_log(mut self, entry: WorkLogEntry) -> Self {
        self.tables.work_logs.push(entry);
        self
    }

    pub fn build(self) -> MockTables {
        self.tables
    }
}

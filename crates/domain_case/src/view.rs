//! Case overview view model
//!
//! The assembled aggregate handed to presentation layers. Assembly is pure:
//! every store read has already happened by the time [`ViewModelAssembler`]
//! runs, so it cannot fail.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use core_kernel::{ClientId, DefendantId};

use crate::aggregator::{ClaimBatch, OwnerMap};
use crate::case_file::CaseFile;
use crate::insurance::{Adjuster, Claim};
use crate::medical::MedicalBill;
use crate::party::{Client, Defendant};
use crate::reconciler::AdjusterLinks;
use crate::work_log::WorkLogEntry;

/// A client with the adjusters handling their own claims
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientOverview {
    #[serde(flatten)]
    pub client: Client,
    /// Merged over first-party claims and the carriers behind them
    pub auto_adjusters: Vec<Adjuster>,
    /// Merged over health claims and the carriers behind them
    pub health_adjusters: Vec<Adjuster>,
}

/// A defendant with every adjuster reachable through its carrier or claims
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefendantOverview {
    #[serde(flatten)]
    pub defendant: Defendant,
    pub adjusters: Vec<Adjuster>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimOverview<O> {
    #[serde(flatten)]
    pub claim: Claim<O>,
    pub adjusters: Vec<Adjuster>,
    /// Coverage limit left after payments, floored at zero
    pub remaining_limit: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedicalBillOverview {
    #[serde(flatten)]
    pub bill: MedicalBill,
    /// Full name of the treated client, empty when the client is not loaded
    pub owner_name: String,
    pub balance: Decimal,
}

/// Medical billing totals for one client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BillingSummary {
    pub total_billed: Decimal,
    pub total_paid: Decimal,
    pub outstanding: Decimal,
}

impl BillingSummary {
    fn add(&mut self, bill: &MedicalBill) {
        self.total_billed += bill.amount_billed;
        self.total_paid += bill.amount_paid;
        self.outstanding += bill.balance();
    }
}

/// Everything known about one case, ready to render
#[derive(Debug, Clone, Serialize)]
pub struct CaseOverview {
    case_file: CaseFile,
    clients: Vec<ClientOverview>,
    defendants: Vec<DefendantOverview>,
    first_party_claims: OwnerMap<ClientId, ClaimOverview<ClientId>>,
    third_party_claims: OwnerMap<DefendantId, ClaimOverview<DefendantId>>,
    health_claims: OwnerMap<ClientId, ClaimOverview<ClientId>>,
    medical_bills: Vec<MedicalBillOverview>,
    billing: BTreeMap<ClientId, BillingSummary>,
    work_logs: Vec<WorkLogEntry>,
}

impl CaseOverview {
    pub fn case_file(&self) -> &CaseFile {
        &self.case_file
    }

    pub fn clients(&self) -> &[ClientOverview] {
        &self.clients
    }

    pub fn defendants(&self) -> &[DefendantOverview] {
        &self.defendants
    }

    pub fn defendant(&self, id: DefendantId) -> Option<&DefendantOverview> {
        self.defendants.iter().find(|d| d.defendant.id == id)
    }

    /// First-party claims of a client, empty when they have none
    pub fn first_party_claims(&self, client: ClientId) -> &[ClaimOverview<ClientId>] {
        self.first_party_claims.get(&client).map_or(&[], Vec::as_slice)
    }

    pub fn third_party_claims(&self, defendant: DefendantId) -> &[ClaimOverview<DefendantId>] {
        self.third_party_claims.get(&defendant).map_or(&[], Vec::as_slice)
    }

    pub fn health_claims(&self, client: ClientId) -> &[ClaimOverview<ClientId>] {
        self.health_claims.get(&client).map_or(&[], Vec::as_slice)
    }

    pub fn first_party_claims_by_owner(&self) -> &OwnerMap<ClientId, ClaimOverview<ClientId>> {
        &self.first_party_claims
    }

    pub fn third_party_claims_by_owner(&self) -> &OwnerMap<DefendantId, ClaimOverview<DefendantId>> {
        &self.third_party_claims
    }

    pub fn health_claims_by_owner(&self) -> &OwnerMap<ClientId, ClaimOverview<ClientId>> {
        &self.health_claims
    }

    pub fn medical_bills(&self) -> &[MedicalBillOverview] {
        &self.medical_bills
    }

    pub fn billing_summary(&self, client: ClientId) -> Option<&BillingSummary> {
        self.billing.get(&client)
    }

    pub fn work_logs(&self) -> &[WorkLogEntry] {
        &self.work_logs
    }
}

/// Outputs of the load steps, as consumed by the assembler
#[derive(Debug)]
pub struct OverviewParts {
    pub case_file: CaseFile,
    pub clients: Vec<Client>,
    pub defendants: Vec<Defendant>,
    pub first_party: ClaimBatch<ClientId>,
    pub third_party: ClaimBatch<DefendantId>,
    pub health: ClaimBatch<ClientId>,
    pub defendant_adjusters: AdjusterLinks<DefendantId>,
    pub first_party_adjusters: AdjusterLinks<ClientId>,
    pub health_adjusters: AdjusterLinks<ClientId>,
    pub medical_bills: Vec<MedicalBill>,
    pub work_logs: Vec<WorkLogEntry>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ViewModelAssembler;

impl ViewModelAssembler {
    pub fn assemble(&self, parts: OverviewParts) -> CaseOverview {
        let OverviewParts {
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
        } = parts;

        let owner_names: BTreeMap<ClientId, String> =
            clients.iter().map(|c| (c.id, c.full_name())).collect();

        let mut billing: BTreeMap<ClientId, BillingSummary> = clients
            .iter()
            .map(|c| (c.id, BillingSummary::default()))
            .collect();
        for bill in &medical_bills {
            if let Some(summary) = billing.get_mut(&bill.client_id) {
                summary.add(bill);
            }
        }

        let medical_bills = medical_bills
            .into_iter()
            .map(|bill| MedicalBillOverview {
                owner_name: owner_names.get(&bill.client_id).cloned().unwrap_or_default(),
                balance: bill.balance(),
                bill,
            })
            .collect();

        let clients = clients
            .into_iter()
            .map(|client| ClientOverview {
                auto_adjusters: first_party_adjusters.for_owner(client.id).to_vec(),
                health_adjusters: health_adjusters.for_owner(client.id).to_vec(),
                client,
            })
            .collect();

        let defendants = defendants
            .into_iter()
            .map(|defendant| DefendantOverview {
                adjusters: defendant_adjusters.for_owner(defendant.id).to_vec(),
                defendant,
            })
            .collect();

        CaseOverview {
            case_file,
            clients,
            defendants,
            first_party_claims: claim_overviews(first_party, &first_party_adjusters),
            third_party_claims: claim_overviews(third_party, &defendant_adjusters),
            health_claims: claim_overviews(health, &health_adjusters),
            medical_bills,
            billing,
            work_logs,
        }
    }
}

fn claim_overviews<O: Copy + Ord>(
    batch: ClaimBatch<O>,
    links: &AdjusterLinks<O>,
) -> OwnerMap<O, ClaimOverview<O>> {
    batch
        .into_grouped()
        .into_iter()
        .map(|(owner, claims)| {
            let overviews = claims
                .into_iter()
                .map(|claim| ClaimOverview {
                    adjusters: links.for_claim(claim.id).to_vec(),
                    remaining_limit: claim.remaining_limit(),
                    claim,
                })
                .collect();
            (owner, overviews)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_kernel::{CaseId, ClaimId, MedicalBillId};
    use rust_decimal_macros::dec;

    use crate::insurance::ClaimKind;

    fn case_file() -> CaseFile {
        CaseFile {
            id: CaseId::new(101),
            created_at: Utc::now(),
            title: None,
            status: "open".to_string(),
            stage: "intake".to_string(),
            incident_date: None,
            statute_deadline: None,
            days_until_statute: None,
        }
    }

    fn client(id: i64, first: &str) -> Client {
        Client {
            id: ClientId::new(id),
            case_id: CaseId::new(101),
            client_order: id as i32,
            first_name: first.to_string(),
            last_name: "Doe".to_string(),
            date_of_birth: None,
            phone: None,
            email: None,
            address: None,
            injuries: None,
        }
    }

    fn bill(id: i64, client: i64, billed: Decimal, paid: Decimal) -> MedicalBill {
        MedicalBill {
            id: MedicalBillId::new(id),
            client_id: ClientId::new(client),
            provider_id: None,
            provider_name: Some("County General".to_string()),
            service_date: None,
            amount_billed: billed,
            amount_paid: paid,
            adjustments: Decimal::ZERO,
        }
    }

    fn parts() -> OverviewParts {
        OverviewParts {
            case_file: case_file(),
            clients: Vec::new(),
            defendants: Vec::new(),
            first_party: ClaimBatch::empty(),
            third_party: ClaimBatch::empty(),
            health: ClaimBatch::empty(),
            defendant_adjusters: AdjusterLinks::default(),
            first_party_adjusters: AdjusterLinks::default(),
            health_adjusters: AdjusterLinks::default(),
            medical_bills: Vec::new(),
            work_logs: Vec::new(),
        }
    }

    #[test]
    fn test_empty_case_assembles() {
        let overview = ViewModelAssembler.assemble(parts());
        assert_eq!(overview.case_file().id, CaseId::new(101));
        assert!(overview.clients().is_empty());
        assert!(overview.first_party_claims_by_owner().is_empty());
        assert!(overview.first_party_claims(ClientId::new(1)).is_empty());
    }

    #[test]
    fn test_bills_carry_owner_name_and_roll_up() {
        let overview = ViewModelAssembler.assemble(OverviewParts {
            clients: vec![client(1, "Jane")],
            medical_bills: vec![
                bill(1, 1, dec!(1200.00), dec!(200.00)),
                bill(2, 1, dec!(300.00), dec!(300.00)),
                bill(3, 9, dec!(50.00), dec!(0)),
            ],
            ..parts()
        });

        let bills = overview.medical_bills();
        assert_eq!(bills[0].owner_name, "Jane Doe");
        assert_eq!(bills[0].balance, dec!(1000.00));
        assert_eq!(bills[2].owner_name, "");

        let summary = overview.billing_summary(ClientId::new(1)).unwrap();
        assert_eq!(summary.total_billed, dec!(1500.00));
        assert_eq!(summary.total_paid, dec!(500.00));
        assert_eq!(summary.outstanding, dec!(1000.00));
        assert!(overview.billing_summary(ClientId::new(9)).is_none());
    }

    #[test]
    fn test_claims_grouped_with_remaining_limit() {
        let claim = Claim {
            id: ClaimId::new(5),
            kind: ClaimKind::FirstParty,
            owner: None,
            case_id: Some(CaseId::new(101)),
            claim_number: Some("FP-5".to_string()),
            policy_number: None,
            insurer_ref: None,
            insurer: None,
            coverage_limit: Some(dec!(10000)),
            amount_paid: Some(dec!(12500)),
            adjuster_name: None,
        };
        let overview = ViewModelAssembler.assemble(OverviewParts {
            clients: vec![client(1, "Jane")],
            first_party: ClaimBatch::new(vec![claim], Some(ClientId::new(1))),
            ..parts()
        });

        let claims = overview.first_party_claims(ClientId::new(1));
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].remaining_limit, Some(Decimal::ZERO));
    }

    #[test]
    fn test_serializes_flattened_entities() {
        let overview = ViewModelAssembler.assemble(OverviewParts {
            clients: vec![client(1, "Jane")],
            ..parts()
        });
        let json = serde_json::to_value(&overview).unwrap();
        assert_eq!(json["clients"][0]["first_name"], "Jane");
        assert!(json["clients"][0]["auto_adjusters"].as_array().unwrap().is_empty());
        assert_eq!(json["case_file"]["id"], 101);
    }
}

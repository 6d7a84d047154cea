//! Pre-built Test Fixtures
//!
//! Fixed ids, dates and complete case scenarios. Scenario tables are plain
//! `MockTables`, so tests can tweak them before handing them to the store.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use core_kernel::{AdjusterId, CaseId, ClaimId, ClientId, DefendantId, InsurerId, MedicalBillId, WorkLogId};
use domain_case::ports::mock::MockTables;
use rust_decimal_macros::dec;

use crate::builders::{
    medical_bill, work_log, AdjusterBuilder, CaseFileBuilder, CaseTablesBuilder, ClaimBuilder,
    ClientBuilder, DefendantBuilder, InsurerBuilder,
};

/// Fixture ids shared across scenarios
pub struct IdFixtures;

impl IdFixtures {
    /// The case every scenario is built around
    pub fn case_id() -> CaseId {
        CaseId::new(101)
    }

    /// A case id that never exists
    pub fn missing_case_id() -> CaseId {
        CaseId::new(202)
    }

    pub fn defendant_a() -> DefendantId {
        DefendantId::new(1)
    }

    pub fn client_one() -> ClientId {
        ClientId::new(1)
    }

    pub fn client_two() -> ClientId {
        ClientId::new(2)
    }

    pub fn insurer_7() -> InsurerId {
        InsurerId::new(7)
    }

    pub fn claim_c1() -> ClaimId {
        ClaimId::new(1)
    }

    pub fn adjuster_x() -> AdjusterId {
        AdjusterId::new(10)
    }

    pub fn adjuster_y() -> AdjusterId {
        AdjusterId::new(11)
    }
}

/// Fixture dates
pub struct DateFixtures;

impl DateFixtures {
    pub fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 4, 15, 30, 0).unwrap()
    }

    pub fn incident_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 28).unwrap()
    }

    /// The "today" scenarios are loaded against
    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()
    }

    /// Statute deadline 31 days after `today`
    pub fn statute_deadline() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }
}

/// Complete case scenarios
pub struct ScenarioFixtures;

impl ScenarioFixtures {
    /// Defendant A with carrier 7 known only to the complete source, claim C1
    /// against A naming carrier 7, adjuster X employed by carrier 7 and
    /// adjuster Y assigned to C1
    pub fn adjuster_paths() -> MockTables {
        let case_id = IdFixtures::case_id();
        CaseTablesBuilder::new()
            .case(
                CaseFileBuilder::new(case_id)
                    .with_statute_deadline(DateFixtures::statute_deadline())
                    .build(),
            )
            .defendant(
                DefendantBuilder::new(IdFixtures::defendant_a(), case_id)
                    .with_name("Avery", "Stone")
                    .with_insurer_ref(IdFixtures::insurer_7())
                    .build(),
            )
            .complete_auto_insurer(
                InsurerBuilder::auto(IdFixtures::insurer_7())
                    .with_name("Keystone Mutual")
                    .build(),
            )
            .third_party_claim(
                ClaimBuilder::third_party(IdFixtures::claim_c1(), IdFixtures::defendant_a())
                    .in_case(case_id)
                    .with_insurer_ref(IdFixtures::insurer_7())
                    .with_limit(dec!(25000.00), dec!(5000.00))
                    .build(),
            )
            .adjuster(
                AdjusterBuilder::auto(IdFixtures::adjuster_x())
                    .named("Xavier", "Quinn")
                    .for_insurer(IdFixtures::insurer_7())
                    .build(),
            )
            .adjuster(
                AdjusterBuilder::auto(IdFixtures::adjuster_y())
                    .named("Yolanda", "Park")
                    .for_claim(IdFixtures::claim_c1())
                    .build(),
            )
            .build()
    }

    /// Two clients with bills, claims of every client-owned kind, a legacy
    /// first-party claim with no owner, and a short activity log
    pub fn two_clients() -> MockTables {
        let case_id = IdFixtures::case_id();
        let one = IdFixtures::client_one();
        let two = IdFixtures::client_two();
        CaseTablesBuilder::new()
            .case(CaseFileBuilder::new(case_id).build())
            .client(ClientBuilder::new(two, case_id).with_order(2).with_name("Sam", "Lee").build())
            .client(ClientBuilder::new(one, case_id).with_order(1).with_name("Jane", "Doe").build())
            .basic_auto_insurer(InsurerBuilder::auto(InsurerId::new(3)).build())
            .health_insurer(InsurerBuilder::health(InsurerId::new(4)).with_name("Blue Ridge Health").build())
            .first_party_claim(
                ClaimBuilder::first_party(ClaimId::new(21), two)
                    .with_insurer_ref(InsurerId::new(3))
                    .with_limit(dec!(10000.00), dec!(2500.00))
                    .build(),
            )
            .first_party_claim(
                ClaimBuilder::first_party(ClaimId::new(22), one)
                    .without_owner(case_id)
                    .build(),
            )
            .health_claim(
                ClaimBuilder::health(ClaimId::new(31), one)
                    .with_insurer_ref(InsurerId::new(4))
                    .build(),
            )
            .adjuster(
                AdjusterBuilder::health(AdjusterId::new(40))
                    .named("Hana", "Ito")
                    .for_insurer(InsurerId::new(4))
                    .build(),
            )
            .medical_bill(medical_bill(MedicalBillId::new(1), one, dec!(1200.00)))
            .medical_bill(medical_bill(MedicalBillId::new(2), two, dec!(800.00)))
            .work_log(work_log(
                WorkLogId::new(1),
                case_id,
                Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap(),
                "Requested police report",
            ))
            .work_log(work_log(
                WorkLogId::new(2),
                case_id,
                Utc.with_ymd_and_hms(2025, 4, 20, 14, 0, 0).unwrap(),
                "Sent letter of representation",
            ))
            .build()
    }
}

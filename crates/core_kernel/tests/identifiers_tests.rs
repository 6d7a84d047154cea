//! Unit tests for the Identifiers module
//!
//! Tests cover creation, parsing, conversion, and display formatting
//! of the case entity identifiers.

use core_kernel::{
    CaseId, WorkLogId, ClientId, DefendantId, InsurerId, ClaimId,
    AdjusterId, MedicalBillId, ProviderId,
};

mod case_id_tests {
    use super::*;

    #[test]
    fn test_new_and_get() {
        let id = CaseId::new(101);
        assert_eq!(id.get(), 101);
    }

    #[test]
    fn test_prefix() {
        assert_eq!(CaseId::prefix(), "CASE");
    }

    #[test]
    fn test_display_format() {
        assert_eq!(CaseId::new(202).to_string(), "CASE-202");
    }

    #[test]
    fn test_from_str_with_prefix() {
        let parsed: CaseId = "CASE-101".parse().unwrap();
        assert_eq!(parsed, CaseId::new(101));
    }

    #[test]
    fn test_from_str_without_prefix() {
        let parsed: CaseId = "101".parse().unwrap();
        assert_eq!(parsed, CaseId::new(101));
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        assert!("CASE-abc".parse::<CaseId>().is_err());
        assert!("".parse::<CaseId>().is_err());
    }

    #[test]
    fn test_raw_conversion() {
        let id: CaseId = 55_i64.into();
        let back: i64 = id.into();
        assert_eq!(back, 55);
    }

    #[test]
    fn test_json_is_bare_integer() {
        let json = serde_json::to_string(&CaseId::new(101)).unwrap();
        assert_eq!(json, "101");
        let deserialized: CaseId = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, CaseId::new(101));
    }
}

mod ordering_tests {
    use super::*;

    #[test]
    fn test_ids_order_by_raw_key() {
        let mut ids = vec![ClientId::new(3), ClientId::new(1), ClientId::new(2)];
        ids.sort();
        assert_eq!(ids, vec![ClientId::new(1), ClientId::new(2), ClientId::new(3)]);
    }

    #[test]
    fn test_ids_usable_as_map_keys() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(DefendantId::new(9), "late");
        map.insert(DefendantId::new(2), "early");
        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys, vec![DefendantId::new(2), DefendantId::new(9)]);
    }
}

mod prefix_tests {
    use super::*;

    #[test]
    fn test_all_prefixes_are_distinct() {
        let prefixes = [
            CaseId::prefix(),
            WorkLogId::prefix(),
            ClientId::prefix(),
            DefendantId::prefix(),
            InsurerId::prefix(),
            ClaimId::prefix(),
            AdjusterId::prefix(),
            MedicalBillId::prefix(),
            ProviderId::prefix(),
        ];
        let unique: std::collections::HashSet<_> = prefixes.iter().collect();
        assert_eq!(unique.len(), prefixes.len());
    }

    #[test]
    fn test_display_uses_own_prefix() {
        assert_eq!(InsurerId::new(7).to_string(), "INS-7");
        assert_eq!(AdjusterId::new(12).to_string(), "ADJ-12");
        assert_eq!(MedicalBillId::new(4).to_string(), "BILL-4");
    }
}

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn display_then_parse_is_identity(raw in any::<i64>()) {
            let id = ClaimId::new(raw);
            let parsed: ClaimId = id.to_string().parse().unwrap();
            prop_assert_eq!(parsed, id);
        }
    }
}

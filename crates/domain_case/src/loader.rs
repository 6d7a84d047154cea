//! Relational entity loader
//!
//! Loads the clients and defendants of a case. Defendants are read with
//! their carrier joined in; when the store reports that the join's
//! relationship does not exist, the loader reads them flat and leaves the
//! carrier to the backfill resolver.

use std::sync::Arc;

use tracing::{debug, warn};

use core_kernel::{CaseId, PortError};

use crate::error::{or_empty_on_denied, CaseLoadError};
use crate::party::{Client, Defendant};
use crate::ports::CaseStorePort;

/// Clients and defendants of a case, in display order
#[derive(Debug, Clone, Default)]
pub struct CaseParties {
    /// Ordered by `client_order`
    pub clients: Vec<Client>,
    /// Ordered by `defendant_number`
    pub defendants: Vec<Defendant>,
    /// True when defendants were read without their embedded carrier
    pub defendants_degraded: bool,
}

pub struct RelationalEntityLoader {
    store: Arc<dyn CaseStorePort>,
}

impl RelationalEntityLoader {
    pub fn new(store: Arc<dyn CaseStorePort>) -> Self {
        Self { store }
    }

    /// Loads both collections concurrently
    pub async fn load(&self, case_id: CaseId) -> Result<CaseParties, CaseLoadError> {
        let (clients, defendants) = tokio::join!(
            self.store.clients_for_case(case_id),
            self.load_defendants(case_id),
        );

        let mut clients = or_empty_on_denied(clients, case_id, "clients")?;
        let (mut defendants, defendants_degraded) = match defendants {
            Ok(loaded) => loaded,
            Err(error) => (or_empty_on_denied(Err(error), case_id, "defendants")?, false),
        };

        // Stable sorts keep store order for ties
        clients.sort_by_key(|c| c.client_order);
        defendants.sort_by_key(|d| d.defendant_number);

        debug!(
            %case_id,
            clients = clients.len(),
            defendants = defendants.len(),
            defendants_degraded,
            "Case parties loaded"
        );

        Ok(CaseParties {
            clients,
            defendants,
            defendants_degraded,
        })
    }

    async fn load_defendants(&self, case_id: CaseId) -> Result<(Vec<Defendant>, bool), PortError> {
        match self.store.defendants_with_insurer(case_id).await {
            Ok(defendants) => Ok((defendants, false)),
            Err(error) if error.is_relationship_unavailable() => {
                warn!(
                    %case_id,
                    %error,
                    "Defendant carrier join unavailable, falling back to flat query"
                );
                let defendants = self.store.defendants_for_case(case_id).await?;
                Ok((defendants, true))
            }
            Err(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::{Fault, MockCaseStore, MockTables, StoreCall, StoreOp};
    use core_kernel::{ClientId, DefendantId};

    fn client(id: i64, order: i32) -> Client {
        Client {
            id: ClientId::new(id),
            case_id: CaseId::new(101),
            client_order: order,
            first_name: format!("Client{}", id),
            last_name: "Doe".to_string(),
            date_of_birth: None,
            phone: None,
            email: None,
            address: None,
            injuries: None,
        }
    }

    fn defendant(id: i64, number: i32) -> Defendant {
        Defendant {
            id: DefendantId::new(id),
            case_id: CaseId::new(101),
            defendant_number: number,
            first_name: format!("Defendant{}", id),
            last_name: "Roe".to_string(),
            insurer_ref: None,
            insurer: None,
            policy_number: None,
            policy_limit: None,
            liability_percentage: None,
        }
    }

    fn tables() -> MockTables {
        MockTables {
            clients: vec![client(1, 2), client(2, 1)],
            defendants: vec![defendant(10, 2), defendant(11, 1)],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_load_orders_both_collections() {
        let loader = RelationalEntityLoader::new(Arc::new(MockCaseStore::new(tables())));
        let parties = loader.load(CaseId::new(101)).await.unwrap();

        let client_ids: Vec<_> = parties.clients.iter().map(|c| c.id.get()).collect();
        let defendant_ids: Vec<_> = parties.defendants.iter().map(|d| d.id.get()).collect();
        assert_eq!(client_ids, vec![2, 1]);
        assert_eq!(defendant_ids, vec![11, 10]);
        assert!(!parties.defendants_degraded);
    }

    #[tokio::test]
    async fn test_relationship_error_falls_back_to_flat_query() {
        let store = Arc::new(
            MockCaseStore::new(tables())
                .with_fault(StoreOp::DefendantsWithInsurer, Fault::RelationshipUnavailable),
        );
        let loader = RelationalEntityLoader::new(store.clone());
        let parties = loader.load(CaseId::new(101)).await.unwrap();

        assert_eq!(parties.defendants.len(), 2);
        assert!(parties.defendants_degraded);
        assert_eq!(
            store.count_calls(|c| matches!(c, StoreCall::Defendants(_))).await,
            1
        );
    }

    #[tokio::test]
    async fn test_genuine_defendant_failure_is_not_masked() {
        let store = Arc::new(
            MockCaseStore::new(tables())
                .with_fault(StoreOp::DefendantsWithInsurer, Fault::QueryFailed),
        );
        let loader = RelationalEntityLoader::new(store.clone());
        let error = loader.load(CaseId::new(101)).await.unwrap_err();

        assert!(matches!(error, CaseLoadError::QueryFailed { collection: "defendants", .. }));
        assert_eq!(
            store.count_calls(|c| matches!(c, StoreCall::Defendants(_))).await,
            0
        );
    }

    #[tokio::test]
    async fn test_denied_clients_render_empty() {
        let store = Arc::new(
            MockCaseStore::new(tables()).with_fault(StoreOp::Clients, Fault::PermissionDenied),
        );
        let loader = RelationalEntityLoader::new(store);
        let parties = loader.load(CaseId::new(101)).await.unwrap();

        assert!(parties.clients.is_empty());
        assert_eq!(parties.defendants.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_case_is_valid() {
        let loader = RelationalEntityLoader::new(Arc::new(MockCaseStore::new(MockTables::default())));
        let parties = loader.load(CaseId::new(101)).await.unwrap();
        assert!(parties.clients.is_empty());
        assert!(parties.defendants.is_empty());
    }
}

//! Relationship resolver
//!
//! Guarantees that an entity holding an insurer foreign key also carries the
//! insurer itself. The embedded join fills most of them; whatever it missed
//! is looked up one entity at a time, concurrently, with each lookup allowed
//! to fail on its own.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use core_kernel::{InsurerId, PortError};

use crate::insurance::{Claim, Insurer, InsurerSource};
use crate::party::Defendant;
use crate::ports::CaseStorePort;

/// An entity with an optional insurer foreign key and embedded insurer
pub trait InsurerLinked {
    fn insurer_ref(&self) -> Option<InsurerId>;
    fn embedded_insurer(&self) -> Option<&Insurer>;
    fn attach_insurer(&mut self, insurer: Insurer);

    /// True when the foreign key is set but the insurer is absent
    fn needs_backfill(&self) -> bool {
        self.insurer_ref().is_some() && self.embedded_insurer().is_none()
    }
}

impl InsurerLinked for Defendant {
    fn insurer_ref(&self) -> Option<InsurerId> {
        self.insurer_ref
    }

    fn embedded_insurer(&self) -> Option<&Insurer> {
        self.insurer.as_ref()
    }

    fn attach_insurer(&mut self, insurer: Insurer) {
        self.insurer = Some(insurer);
    }
}

impl<O> InsurerLinked for Claim<O> {
    fn insurer_ref(&self) -> Option<InsurerId> {
        self.insurer_ref
    }

    fn embedded_insurer(&self) -> Option<&Insurer> {
        self.insurer.as_ref()
    }

    fn attach_insurer(&mut self, insurer: Insurer) {
        self.insurer = Some(insurer);
    }
}

/// Outcome counts of one backfill pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Lookups issued
    pub attempted: usize,
    /// Entities that received an insurer
    pub resolved: usize,
    /// Lookups that found the insurer in neither source
    pub missing: usize,
    /// Lookups that failed
    pub failed: usize,
}

pub struct RelationshipResolver {
    store: Arc<dyn CaseStorePort>,
}

impl RelationshipResolver {
    pub fn new(store: Arc<dyn CaseStorePort>) -> Self {
        Self { store }
    }

    /// Backfills the auto insurer of every entity that needs one
    ///
    /// Issues one lookup per entity needing a backfill. Lookups run
    /// concurrently and their failures are logged and skipped.
    pub async fn backfill<E: InsurerLinked>(&self, entities: &mut [E], relation: &'static str) -> BackfillReport {
        let pending: Vec<(usize, InsurerId)> = entities
            .iter()
            .enumerate()
            .filter(|(_, entity)| entity.needs_backfill())
            .filter_map(|(index, entity)| entity.insurer_ref().map(|id| (index, id)))
            .collect();

        let mut report = BackfillReport {
            attempted: pending.len(),
            ..Default::default()
        };
        if pending.is_empty() {
            return report;
        }

        let outcomes = join_all(pending.into_iter().map(|(index, insurer_id)| async move {
            (index, insurer_id, self.lookup(insurer_id).await)
        }))
        .await;

        for (index, insurer_id, outcome) in outcomes {
            match outcome {
                Ok(Some(insurer)) if insurer.id == insurer_id => {
                    entities[index].attach_insurer(insurer);
                    report.resolved += 1;
                }
                Ok(Some(insurer)) => {
                    warn!(relation, %insurer_id, returned = %insurer.id, "Backfill returned a different insurer, ignoring");
                    report.failed += 1;
                }
                Ok(None) => {
                    warn!(relation, %insurer_id, "Insurer not found in any source");
                    report.missing += 1;
                }
                Err(error) => {
                    warn!(relation, %insurer_id, %error, "Insurer backfill lookup failed");
                    report.failed += 1;
                }
            }
        }

        debug!(
            relation,
            attempted = report.attempted,
            resolved = report.resolved,
            missing = report.missing,
            failed = report.failed,
            "Insurer backfill finished"
        );
        report
    }

    /// Looks in the complete source first, then in the basic one
    async fn lookup(&self, insurer_id: InsurerId) -> Result<Option<Insurer>, PortError> {
        match self.store.find_auto_insurer(InsurerSource::Complete, insurer_id).await {
            Ok(Some(insurer)) => return Ok(Some(insurer)),
            Ok(None) => {}
            Err(error) => {
                debug!(%insurer_id, %error, "Complete insurer source unavailable, trying basic source");
            }
        }
        self.store.find_auto_insurer(InsurerSource::Basic, insurer_id).await
    }
}

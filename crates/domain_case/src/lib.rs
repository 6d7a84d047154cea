//! Case Overview Domain
//!
//! This crate assembles everything the firm knows about one legal case into
//! a single view model: the case file, its clients and defendants, their
//! insurance claims, the adjusters handling them, medical bills and the
//! activity log.
//!
//! # Load Order
//!
//! ```text
//! CaseRecordFetcher -> RelationalEntityLoader -> RelationshipResolver
//!     -> ClaimAggregator -> AdjusterReconciler -> ViewModelAssembler
//! ```
//!
//! Each step only starts once the ids it needs from the previous step are
//! known. Reads that fail in a recoverable way degrade the overview instead
//! of failing it.

pub mod case_file;
pub mod party;
pub mod insurance;
pub mod medical;
pub mod work_log;
pub mod error;
pub mod ports;
pub mod fetcher;
pub mod loader;
pub mod resolver;
pub mod aggregator;
pub mod reconciler;
pub mod view;
pub mod pipeline;

pub use case_file::CaseFile;
pub use party::{Client, Defendant};
pub use insurance::{
    Adjuster, Claim, ClaimKind, CoverageLine, FirstPartyClaim, HealthClaim, Insurer,
    InsurerSource, ThirdPartyClaim,
};
pub use medical::MedicalBill;
pub use work_log::WorkLogEntry;
pub use error::CaseLoadError;
pub use ports::{CaseStorePort, ClaimScope};
pub use fetcher::{CaseRecordFetcher, FetchedCase};
pub use loader::{CaseParties, RelationalEntityLoader};
pub use resolver::{BackfillReport, InsurerLinked, RelationshipResolver};
pub use aggregator::{ClaimAggregator, ClaimBatch, LegacyOwnerPolicy, OwnerMap};
pub use reconciler::{fill_adjuster_names, AdjusterLinks, AdjusterReconciler, ClaimLink, OwnerLink};
pub use view::{
    BillingSummary, CaseOverview, ClaimOverview, ClientOverview, DefendantOverview,
    MedicalBillOverview, OverviewParts, ViewModelAssembler,
};
pub use pipeline::{CaseOverviewPipeline, LoadState, PipelineOptions};

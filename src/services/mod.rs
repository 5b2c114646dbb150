//! Service layer: the backfill job and the status report.

pub mod backfill_service;
pub mod status_service;

pub use backfill_service::{BackfillObserver, BackfillOptions, BackfillService};
pub use status_service::StatusService;

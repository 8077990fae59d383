//! Download orchestrator.
//!
//! Walks the paginated listing forward from the start page and downloads
//! every item in order:
//! - **Pagination**: strictly increasing page numbers, no upper bound
//! - **Termination**: the first page with zero items ends the run
//! - **Downloads**: sequential, one image at a time
//!
//! Individual download failures are reported and skipped; page fetch
//! errors, browser launch errors and filesystem errors end the run.

mod naming;
mod runner;
mod types;

pub use naming::{destination_for, file_name_from_url};
pub use runner::{error_chain, DownloadOrchestrator};
pub use types::{OrchestratorError, RunOutcome, RunRequest, RunSummary, StopSignal};

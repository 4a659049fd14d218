//! In-process adapters for every collaborator port.
//!
//! Used by the integration tests and by callers that embed the controller
//! without a database.

pub mod adjustment_log;
pub mod attempt_history;
pub mod profile_store;
pub mod question_bank;
pub mod state_store;

pub use adjustment_log::InMemoryAdjustmentLog;
pub use attempt_history::InMemoryAttemptHistory;
pub use profile_store::InMemoryProfileStore;
pub use question_bank::InMemoryQuestionBank;
pub use state_store::InMemoryStateStore;

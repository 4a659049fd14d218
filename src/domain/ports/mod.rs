//! Port trait definitions (Hexagonal Architecture)
//!
//! The orchestration service talks to its collaborators only through these
//! traits so storage, profiling and grading can be swapped or faked:
//! - DifficultyStateRepository: per learner × topic state with optimistic concurrency
//! - PerformanceHistory: recent graded attempts
//! - LearningProfileSource: learning-style profile lookup
//! - QuestionBank: answer keys and available difficulty levels
//! - AdjustmentLog: append-only audit trail

pub mod adjustment_log;
pub mod difficulty_state_repository;
pub mod learning_profile_source;
pub mod performance_history;
pub mod question_bank;

pub use adjustment_log::AdjustmentLog;
pub use difficulty_state_repository::DifficultyStateRepository;
pub use learning_profile_source::LearningProfileSource;
pub use performance_history::PerformanceHistory;
pub use question_bank::QuestionBank;

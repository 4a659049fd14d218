//! Pacer - adaptive difficulty controller
//!
//! Pacer keeps each learner near a target success rate per topic by moving
//! question difficulty after every answer.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and the port traits for every collaborator
//! - **Service Layer** (`services`): the pure difficulty engine and the orchestration service
//! - **Adapters** (`adapters`): SQLite and in-memory implementations of the ports
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pacer::adapters::memory::*;
//! use pacer::services::DifficultyService;
//!
//! let service = DifficultyService::new(
//!     Arc::new(InMemoryStateStore::new()),
//!     Arc::new(InMemoryAttemptHistory::new()),
//!     Arc::new(InMemoryProfileStore::new()),
//!     Arc::new(InMemoryQuestionBank::new()),
//!     Arc::new(InMemoryAdjustmentLog::new()),
//! );
//! let state = service.initialize_user_difficulty("alice", "algebra").await?;
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    AdjustmentOutcome, AnswerEvent, Config, DifficultyCalculation, DifficultyContext,
    DifficultyState, SessionConfig, SessionDifficulty,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{DifficultyEngine, DifficultyService};

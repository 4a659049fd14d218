pub mod difficulty_engine;
pub mod difficulty_service;
pub mod persistence_retry;
pub mod progression;

pub use difficulty_engine::DifficultyEngine;
pub use difficulty_service::DifficultyService;
pub use persistence_retry::IoPolicy;

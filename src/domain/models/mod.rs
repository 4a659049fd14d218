pub mod adjustment;
pub mod analytics;
pub mod config;
pub mod difficulty;
pub mod learning_style;
pub mod question;
pub mod session;

pub use adjustment::{AdjustmentLogEntry, AdjustmentReason, ALGORITHM_VERSION};
pub use analytics::{
    DifficultyProgression, ProgressionPoint, SessionRecommendations, TopicRecommendation, Trend,
};
pub use config::{Config, DatabaseConfig, DifficultyConfig, IoConfig, LoggingConfig, RetryConfig};
pub use difficulty::{
    bounded, DifficultyCalculation, DifficultyContext, DifficultyState, ManualOverride,
    PerformancePoint, StateSnapshot, MAX_CONFIDENCE_INTERVAL, MAX_DIFFICULTY, MAX_STABILITY,
    MIN_CONFIDENCE_INTERVAL, MIN_DIFFICULTY, MIN_STABILITY,
};
pub use learning_style::{LearningProfile, LearningStyle, StyleBias};
pub use question::Question;
pub use session::{
    AdjustmentOutcome, AnswerEvent, DifficultySource, SessionConfig, SessionDifficulty,
};

//! CLI command implementations

pub mod answer;
pub mod init;
pub mod overrides;
pub mod profile;
pub mod progression;
pub mod question;
pub mod recommend;
pub mod session;
pub mod state;

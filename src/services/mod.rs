pub mod analysis;
pub mod auth;
pub mod llm;
pub mod prompt;
pub mod report;
pub mod settings;
pub mod snapshot;

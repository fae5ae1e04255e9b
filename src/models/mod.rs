//! Domain models shared across parsers, services, and routes.

pub mod analysis;
pub mod report;
pub mod request;
pub mod settings;
pub mod user;

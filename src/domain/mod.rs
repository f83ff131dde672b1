//! Domain layer: models, ports, and errors for the Auditor.

pub mod errors;
pub mod models;
pub mod ports;

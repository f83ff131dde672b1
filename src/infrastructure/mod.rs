//! Ambient infrastructure: configuration loading and logging wiring.
//!
//! Neither module is part of the Auditor's specified surface (§6) — both
//! are the ordinary engineering scaffolding a production service carries
//! regardless of what its control plane does, grounded in the teacher's
//! `infrastructure::{config, logging}` layering.

pub mod config;
pub mod logging;

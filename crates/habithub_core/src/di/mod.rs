//! Dependency provisioning for HabitHub services.
//!
//! # Responsibility
//! - `graph`: generic lazy singleton registry with construct-once semantics.
//! - `app_module`: the HabitHub wiring installed on that registry.

pub mod app_module;
pub mod graph;

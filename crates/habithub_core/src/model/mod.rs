//! Habit tracking records persisted by HabitHub.
//!
//! # Responsibility
//! - Define daily notes, monthly objectives and their completions.
//! - Own the textual date keys (`YYYY-MM-DD`, `YYYY-MM`) used as storage keys.
//!
//! # Invariants
//! - Dates are stored as zero-padded ISO strings so prefix matching on a
//!   year-month selects exactly that month.

pub mod keys;
pub mod records;

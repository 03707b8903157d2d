//! Flutter bridge for HabitHub core services.

pub mod api;

//! Monthly revenue, cost and capacity planning for a language school.
//!
//! [`engine::compute`] turns a schedule grid, scenario volumes and a
//! [`rates::RateTable`] into a [`models::Results`] snapshot. It is a pure
//! function: callers own the inputs and recompute whenever they change.

pub mod allocation;
pub mod engine;
pub mod error;
pub mod format;
pub mod io;
pub mod models;
pub mod offsite;
pub mod rates;
pub mod report;
pub mod schedule;

pub use engine::{compare, compute};
pub use error::ConfigError;
pub use models::{Delta, Results, ScenarioInputs, ScheduleGrid};
pub use rates::RateTable;

use thiserror::Error;

/// Problems with a rate table or facility topology.
///
/// These are raised when a table is loaded, never while computing a scenario.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("open enrollment curve is missing the {0}-seat tier")]
    MissingSeatTier(u32),

    #[error(
        "open enrollment revenue must increase with seat count \
         ({lower} seats: {lower_rate}, {upper} seats: {upper_rate})"
    )]
    NonIncreasingRevenue {
        lower: u32,
        lower_rate: f64,
        upper: u32,
        upper_rate: f64,
    },

    #[error(
        "open enrollment teacher cost must be flat across the curve \
         ({seats} seats: {found}, expected {expected})"
    )]
    UnevenTeacherCost { seats: u32, found: f64, expected: f64 },

    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidAmount { field: String, value: f64 },

    #[error("{field} must be greater than zero (got {value})")]
    NotPositive { field: String, value: f64 },

    #[error("topology has no {0}")]
    EmptyTopology(&'static str),

    #[error("room id `{0}` appears more than once")]
    DuplicateRoom(String),

    #[error("day pattern `{0}` appears more than once")]
    DuplicateDayPattern(String),
}

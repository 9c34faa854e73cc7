//! Multistage Routing
//!
//! Maps the Stage-1 interim ability estimate to a Stage-2 item track.

use serde::{Deserialize, Serialize};

/// Calibration constant validated against item-bank exposure rates.
/// Re-tuning it requires a new exposure study; never inline this value.
pub const ROUTE_THRESHOLD: f64 = 0.35;

/// Stage-2 item track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    Harder,
    Easier,
}

/// Threshold routing; the boundary itself routes to the harder track.
pub fn route(theta_stage1: f64) -> Track {
    if theta_stage1 >= ROUTE_THRESHOLD {
        Track::Harder
    } else {
        Track::Easier
    }
}

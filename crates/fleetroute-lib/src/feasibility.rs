use std::fmt;

use serde::Serialize;

use crate::fleet::{ConstraintProfile, Unit};
use crate::path::Route;

/// Slack applied to every limit comparison so that accumulated floating point
/// error does not reject a route sitting exactly on a limit.
pub const FEASIBILITY_TOLERANCE: f64 = 1e-6;

/// Why a route cannot be flown or driven by a unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InfeasibleReason {
    RangeExceeded {
        distance: f64,
        limit: f64,
        overage: f64,
    },
    EnergyExceeded {
        energy: f64,
        budget: f64,
        overage: f64,
    },
    /// The unit has an energy budget but the route crosses an edge with no
    /// energy cost, so consumption cannot be verified.
    EnergyUnknown,
    TimeExceeded {
        duration: f64,
        limit: f64,
        overage: f64,
    },
}

impl InfeasibleReason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            InfeasibleReason::RangeExceeded { .. } => "RANGE_EXCEEDED",
            InfeasibleReason::EnergyExceeded { .. } => "ENERGY_EXCEEDED",
            InfeasibleReason::EnergyUnknown => "ENERGY_UNKNOWN",
            InfeasibleReason::TimeExceeded { .. } => "TIME_EXCEEDED",
        }
    }
}

impl fmt::Display for InfeasibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfeasibleReason::RangeExceeded {
                distance,
                limit,
                overage,
            } => write!(
                f,
                "route distance {distance:.2} exceeds max range {limit:.2} by {overage:.2}"
            ),
            InfeasibleReason::EnergyExceeded {
                energy,
                budget,
                overage,
            } => write!(
                f,
                "route energy {energy:.2} exceeds energy budget {budget:.2} by {overage:.2}"
            ),
            InfeasibleReason::EnergyUnknown => {
                f.write_str("route crosses edges without an energy cost; budget cannot be verified")
            }
            InfeasibleReason::TimeExceeded {
                duration,
                limit,
                overage,
            } => write!(
                f,
                "travel time {duration:.2} exceeds max duration {limit:.2} by {overage:.2}"
            ),
        }
    }
}

/// Result of checking a route against a unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Feasibility {
    Feasible,
    Infeasible(InfeasibleReason),
}

impl Feasibility {
    pub fn is_feasible(&self) -> bool {
        matches!(self, Feasibility::Feasible)
    }

    pub fn reason(&self) -> Option<&InfeasibleReason> {
        match self {
            Feasibility::Feasible => None,
            Feasibility::Infeasible(reason) => Some(reason),
        }
    }
}

/// Check a route against the unit's constraint profile.
///
/// Range is checked first, then energy, then time; the first failing rule
/// is reported.
pub fn check(route: &Route, unit: &Unit) -> Feasibility {
    check_profile(route, &unit.profile)
}

/// [`check`] against a bare constraint profile.
pub fn check_profile(route: &Route, profile: &ConstraintProfile) -> Feasibility {
    if let Some(limit) = profile.max_range {
        if exceeds(route.distance, limit) {
            return Feasibility::Infeasible(InfeasibleReason::RangeExceeded {
                distance: route.distance,
                limit,
                overage: route.distance - limit,
            });
        }
    }

    if let Some(budget) = profile.energy_budget() {
        match route.energy {
            None => return Feasibility::Infeasible(InfeasibleReason::EnergyUnknown),
            Some(energy) if exceeds(energy, budget) => {
                return Feasibility::Infeasible(InfeasibleReason::EnergyExceeded {
                    energy,
                    budget,
                    overage: energy - budget,
                });
            }
            Some(_) => {}
        }
    }

    if let (Some(limit), Some(speed)) = (profile.max_duration, profile.speed) {
        let duration = route.distance / speed;
        if exceeds(duration, limit) {
            return Feasibility::Infeasible(InfeasibleReason::TimeExceeded {
                duration,
                limit,
                overage: duration - limit,
            });
        }
    }

    Feasibility::Feasible
}

fn exceeds(value: f64, limit: f64) -> bool {
    value > limit + FEASIBILITY_TOLERANCE
}

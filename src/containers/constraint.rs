//! Eligibility Constraints

use std::fmt;

use jiff::{civil::Weekday, tz::Offset};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::events::Event;

/// Kind of eligibility constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintType {
    /// Only new customers qualify.
    NewCustomer,

    /// The customer must register for the promotion.
    Register,

    /// The promotion has a limited quota.
    LimitCount,

    /// Only some days of the week qualify.
    LimitWeekDay,
}

impl ConstraintType {
    /// Stable label recorded in container matches.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewCustomer => "new_customer",
            Self::Register => "register",
            Self::LimitCount => "limit_count",
            Self::LimitWeekDay => "limit_week_day",
        }
    }
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single eligibility constraint held by a constraint container.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Constraint kind.
    pub constraint_type: ConstraintType,

    /// Human-readable name.
    pub name: String,

    /// Qualifying week-days, only consulted by [`ConstraintType::LimitWeekDay`].
    pub week_days: SmallVec<[Weekday; 7]>,

    /// Offset the event date is read in when resolving its week-day.
    pub offset: Offset,
}

impl Constraint {
    /// Create a constraint that carries no week-days.
    pub fn new(constraint_type: ConstraintType, name: impl Into<String>) -> Self {
        Self {
            constraint_type,
            name: name.into(),
            week_days: SmallVec::new(),
            offset: Offset::UTC,
        }
    }

    /// Create a week-day constraint.
    pub fn week_days(
        name: impl Into<String>,
        week_days: impl IntoIterator<Item = Weekday>,
        offset: Offset,
    ) -> Self {
        Self {
            constraint_type: ConstraintType::LimitWeekDay,
            name: name.into(),
            week_days: week_days.into_iter().collect(),
            offset,
        }
    }

    /// Whether the event satisfies this constraint.
    ///
    /// Customer-status, registration and quota constraints are enforced outside
    /// the engine and always count as matched here.
    pub fn is_satisfied_by(&self, event: &Event) -> bool {
        match self.constraint_type {
            ConstraintType::NewCustomer | ConstraintType::Register | ConstraintType::LimitCount => {
                true
            }
            ConstraintType::LimitWeekDay => event
                .weekday(self.offset)
                .is_some_and(|day| self.week_days.contains(&day)),
        }
    }
}

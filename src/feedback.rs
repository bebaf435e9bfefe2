//! Feedback
//!
//! Reward calculation rules and the pure calculator that turns an event's
//! cost into a reward amount.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

/// Kind of reward a promotion pays out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
    /// Cash back, in currency minor units.
    Currency,

    /// Loyalty points.
    Point,
}

impl fmt::Display for RewardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Currency => f.write_str("currency"),
            Self::Point => f.write_str("point"),
        }
    }
}

/// How a feedback amount is derived from the cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculateType {
    /// A percentage of the whole cost, optionally capped.
    Multiply,

    /// A fixed amount regardless of cost.
    Fixed,

    /// A percentage of the part of the cost above the minimum.
    Area,
}

/// Reward calculation rule attached to a gated payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    /// Calculation strategy.
    pub calculate_type: CalculateType,

    /// Minimum cost required before anything is returned.
    pub min_cost: i64,

    /// Amount returned by [`CalculateType::Fixed`].
    pub fixed: i64,

    /// Fractional percentage (`0.1` is 10%) used by multiply and area.
    pub percentage: Decimal,

    /// Upper bound on a multiply return, when set.
    pub return_max: Option<i64>,
}

impl Feedback {
    /// A fixed-amount rule.
    #[must_use]
    pub fn fixed(amount: i64) -> Self {
        Self {
            calculate_type: CalculateType::Fixed,
            min_cost: 0,
            fixed: amount,
            percentage: Decimal::ZERO,
            return_max: None,
        }
    }

    /// A percentage-of-cost rule.
    #[must_use]
    pub fn multiply(percentage: Decimal, min_cost: i64, return_max: Option<i64>) -> Self {
        Self {
            calculate_type: CalculateType::Multiply,
            min_cost,
            fixed: 0,
            percentage,
            return_max,
        }
    }

    /// A tiered rule paying `percentage` of the cost above `min_cost`.
    #[must_use]
    pub fn area(percentage: Decimal, min_cost: i64) -> Self {
        Self {
            calculate_type: CalculateType::Area,
            min_cost,
            fixed: 0,
            percentage,
            return_max: None,
        }
    }

    /// Require at least `min_cost` before this rule returns anything.
    #[must_use]
    pub fn with_min_cost(mut self, min_cost: i64) -> Self {
        self.min_cost = min_cost;
        self
    }
}

/// How much of a reward an event obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    /// Nothing was returned.
    #[default]
    GetNone,

    /// A limit was hit and only part of the reward was returned.
    GetSome,

    /// The full reward was returned.
    GetAll,
}

impl FeedbackStatus {
    /// Whether this status represents any reward.
    pub const fn is_rewarded(self) -> bool {
        !matches!(self, Self::GetNone)
    }
}

/// Outcome of applying a [`Feedback`] rule (or a combination of them).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResult {
    /// Strategy that produced the amount, if any rule contributed.
    pub calculate_type: Option<CalculateType>,

    /// Cost of the originating event.
    pub cost: i64,

    /// Amount returned.
    pub get_return: i64,

    /// Percentage earned, summed when results are added together.
    pub get_percentage: Decimal,

    /// Reward status.
    pub status: FeedbackStatus,
}

impl FeedbackResult {
    /// A result carrying no reward for `cost`.
    #[must_use]
    pub fn none(cost: i64) -> Self {
        Self {
            calculate_type: None,
            cost,
            get_return: 0,
            get_percentage: Decimal::ZERO,
            status: FeedbackStatus::GetNone,
        }
    }

    /// Whether any reward was obtained.
    pub const fn is_rewarded(&self) -> bool {
        self.status.is_rewarded()
    }
}

/// Calculate the reward a `feedback` rule yields for `cost`.
pub fn calculate(feedback: &Feedback, cost: i64) -> FeedbackResult {
    let calculate_type = Some(feedback.calculate_type);

    if cost < feedback.min_cost {
        return FeedbackResult {
            calculate_type,
            ..FeedbackResult::none(cost)
        };
    }

    match feedback.calculate_type {
        CalculateType::Fixed => FeedbackResult {
            calculate_type,
            cost,
            get_return: feedback.fixed,
            get_percentage: Decimal::ZERO,
            status: FeedbackStatus::GetAll,
        },
        CalculateType::Multiply => {
            let amount = percent_of(feedback.percentage, cost);

            let (get_return, status) = match feedback.return_max {
                Some(cap) if cap > 0 && amount > cap => (cap, FeedbackStatus::GetSome),
                _ => (amount, FeedbackStatus::GetAll),
            };

            FeedbackResult {
                calculate_type,
                cost,
                get_return,
                get_percentage: feedback.percentage,
                status,
            }
        }
        CalculateType::Area => {
            // Stricter than the gate above: reaching the tier exactly earns nothing.
            let (get_return, status) = if cost <= feedback.min_cost {
                (0, FeedbackStatus::GetNone)
            } else {
                (
                    percent_of(feedback.percentage, cost.saturating_sub(feedback.min_cost)),
                    FeedbackStatus::GetAll,
                )
            };

            FeedbackResult {
                calculate_type,
                cost,
                get_return,
                get_percentage: feedback.percentage,
                status,
            }
        }
    }
}

/// `percentage * amount`, rounded half away from zero to whole minor units.
fn percent_of(percentage: Decimal, amount: i64) -> i64 {
    let applied = percentage
        .checked_mul(Decimal::from(amount))
        .unwrap_or(if percentage.is_sign_negative() == (amount < 0) {
            Decimal::MAX
        } else {
            Decimal::MIN
        });

    let rounded = applied.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    rounded.to_i64().unwrap_or(if rounded.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

//! Payloads
//!
//! Value-computation trees. A gate payload checks a [`Container`] and runs
//! its [`Feedback`] rule on success; a combining payload merges the results
//! of its children with a [`PayloadOperator`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    containers::Container,
    events::Event,
    feedback::{Feedback, FeedbackResult, FeedbackStatus, calculate},
    results::PayloadResult,
};

/// How a combining payload merges its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadOperator {
    /// Every child must pass; the largest return wins.
    MaxAnd,

    /// Any child may pass; the largest passing return wins.
    MaxOr,

    /// Exactly one child may earn a reward.
    Xor,

    /// Returns of every rewarded child are summed.
    Add,
}

/// What a payload node holds.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadNode {
    /// Combine child payloads.
    Combine {
        /// Combination operator.
        operator: PayloadOperator,

        /// Child payloads, evaluated in order. Never empty.
        children: Vec<Payload>,
    },

    /// Gate a feedback rule on a container.
    Gate {
        /// Reward rule applied when the container passes.
        feedback: Feedback,

        /// Condition tree.
        container: Container,
    },
}

/// A value-computation node.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    /// Payload identifier.
    pub id: String,

    /// Children or gate.
    pub node: PayloadNode,
}

impl Payload {
    /// Create a combining payload.
    pub fn combine(id: impl Into<String>, operator: PayloadOperator, children: Vec<Payload>) -> Self {
        Self {
            id: id.into(),
            node: PayloadNode::Combine { operator, children },
        }
    }

    /// Create a gate payload.
    pub fn gate(id: impl Into<String>, feedback: Feedback, container: Container) -> Self {
        Self {
            id: id.into(),
            node: PayloadNode::Gate {
                feedback,
                container,
            },
        }
    }

    /// Evaluate the payload against `event`.
    pub fn judge(&self, event: &Event) -> PayloadResult {
        match &self.node {
            PayloadNode::Gate {
                feedback,
                container,
            } => {
                let container = container.satisfy(event);

                let feedback = if container.pass {
                    calculate(feedback, event.cost)
                } else {
                    FeedbackResult {
                        calculate_type: Some(feedback.calculate_type),
                        ..FeedbackResult::none(event.cost)
                    }
                };

                PayloadResult {
                    id: self.id.clone(),
                    pass: container.pass,
                    feedback,
                    children: Vec::new(),
                    container: Some(container),
                }
            }
            PayloadNode::Combine { operator, children } => {
                let children: Vec<_> = children.iter().map(|child| child.judge(event)).collect();
                let (pass, feedback) = combine(*operator, &children, event.cost);

                debug!(
                    payload_id = %self.id,
                    ?operator,
                    pass,
                    get_return = feedback.get_return,
                    "combined payload children"
                );

                PayloadResult {
                    id: self.id.clone(),
                    pass,
                    feedback,
                    children,
                    container: None,
                }
            }
        }
    }
}

/// Merge child payload results with `operator`.
///
/// Returns whether the combination passed and the resulting feedback. The
/// feedback always carries `cost`, whichever branch produced it.
pub fn combine(
    operator: PayloadOperator,
    children: &[PayloadResult],
    cost: i64,
) -> (bool, FeedbackResult) {
    let (pass, mut feedback) = match operator {
        PayloadOperator::MaxAnd => max_and(children),
        PayloadOperator::MaxOr => max_or(children),
        PayloadOperator::Xor => xor(children),
        PayloadOperator::Add => add(children),
    };

    feedback.cost = cost;

    (pass, feedback)
}

fn max_and(children: &[PayloadResult]) -> (bool, FeedbackResult) {
    let mut best: Option<&PayloadResult> = None;

    for child in children {
        if !child.pass {
            return (false, FeedbackResult::none(child.feedback.cost));
        }

        if best.is_none_or(|best| child.feedback.get_return > best.feedback.get_return) {
            best = Some(child);
        }
    }

    match best {
        Some(best) => (true, best.feedback.clone()),
        None => (false, FeedbackResult::none(0)),
    }
}

fn max_or(children: &[PayloadResult]) -> (bool, FeedbackResult) {
    children
        .iter()
        .filter(|child| child.pass)
        .fold(None::<&PayloadResult>, |best, child| match best {
            Some(best) if best.feedback.get_return >= child.feedback.get_return => Some(best),
            _ => Some(child),
        })
        .map_or_else(
            || (false, FeedbackResult::none(0)),
            |best| (true, best.feedback.clone()),
        )
}

fn xor(children: &[PayloadResult]) -> (bool, FeedbackResult) {
    let mut rewarded = children.iter().filter(|child| child.feedback.is_rewarded());

    match (rewarded.next(), rewarded.next()) {
        (Some(only), None) => (true, only.feedback.clone()),
        _ => (false, FeedbackResult::none(0)),
    }
}

fn add(children: &[PayloadResult]) -> (bool, FeedbackResult) {
    let mut total = FeedbackResult::none(0);
    let mut contributed = false;

    for child in children.iter().filter(|child| child.feedback.is_rewarded()) {
        let feedback = &child.feedback;

        if contributed {
            if total.status != feedback.status {
                total.status = FeedbackStatus::GetSome;
            }

            if total.calculate_type != feedback.calculate_type {
                total.calculate_type = None;
            }
        } else {
            total.status = feedback.status;
            total.calculate_type = feedback.calculate_type;
            contributed = true;
        }

        total.get_return = total.get_return.saturating_add(feedback.get_return);
        total.get_percentage = total.get_percentage.saturating_add(feedback.get_percentage);
    }

    (total.get_return > 0, total)
}

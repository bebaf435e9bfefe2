//! Results
//!
//! Result trees produced by evaluating containers, payloads and evaluations.
//! They mirror the rule trees and are built fresh on every call.

use serde::Serialize;

use crate::{
    containers::ContainerType,
    evaluations::Owner,
    feedback::{FeedbackResult, RewardType},
};

/// Outcome of [`Container::satisfy`](crate::containers::Container::satisfy).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerResult {
    /// Container identifier.
    pub id: String,

    /// Container type.
    pub container_type: ContainerType,

    /// Whether the container passed.
    pub pass: bool,

    /// Criteria the event satisfied. Always empty on inner containers.
    pub matches: Vec<String>,

    /// Criteria the event did not satisfy. Always empty on inner containers.
    pub mis_matches: Vec<String>,

    /// Child results of an inner container.
    pub children: Vec<ContainerResult>,
}

impl ContainerResult {
    /// Create an empty, failing result.
    pub fn new(id: impl Into<String>, container_type: ContainerType) -> Self {
        Self {
            id: id.into(),
            container_type,
            pass: false,
            matches: Vec::new(),
            mis_matches: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// Outcome of [`Payload::judge`](crate::payloads::Payload::judge).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadResult {
    /// Payload identifier.
    pub id: String,

    /// Whether the payload passed.
    pub pass: bool,

    /// Feedback earned by this payload.
    pub feedback: FeedbackResult,

    /// Child results of a combining payload.
    pub children: Vec<PayloadResult>,

    /// Result of the gating container.
    pub container: Option<ContainerResult>,
}

/// Outcome of [`Evaluation::judge`](crate::evaluations::Evaluation::judge).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    /// Evaluation identifier.
    pub id: String,

    /// Entity the evaluation is attached to.
    pub owner: Owner,

    /// Reward type paid out.
    pub reward_type: RewardType,

    /// Final feedback of the evaluation.
    pub feedback: FeedbackResult,

    /// Result tree of the root payload.
    pub payload: PayloadResult,
}

impl EvaluationResult {
    /// Whether the root payload passed.
    pub const fn pass(&self) -> bool {
        self.payload.pass
    }
}

//! Containers
//!
//! Boolean condition trees evaluated against an [`Event`]. Inner containers
//! combine nested containers; leaf containers classify each configured
//! criterion as matched or mismatched.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::{
    events::{Event, PayStatus},
    labels::LabelSet,
    results::ContainerResult,
};

pub mod constraint;

pub use constraint::{Constraint, ConstraintType};

/// Boolean operator applied by a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerOperator {
    /// Every criterion (or child) must hold.
    And,

    /// At least one criterion (or child) must hold.
    Or,

    /// No criterion may hold. Only valid on leaves.
    Not,
}

/// Kind of container node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerType {
    /// Combines nested containers.
    Inner,

    /// Eligibility constraints.
    Constraint,

    /// Task labels on the card event.
    TaskLabel,

    /// Channels the event went through.
    Channel,

    /// Payment methods.
    Pay,

    /// Channel labels.
    ChannelLabel,
}

/// A configured channel and the labels that also count as hitting it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelCriterion {
    /// Channel identifier.
    pub id: String,

    /// Labels of the channel, resolved from the channel catalog.
    pub labels: LabelSet,
}

impl ChannelCriterion {
    /// Create a channel criterion.
    pub fn new(id: impl Into<String>, labels: LabelSet) -> Self {
        Self {
            id: id.into(),
            labels,
        }
    }

    fn is_hit_by(&self, event: &Event) -> bool {
        event.channel_event.as_ref().is_some_and(|channels| {
            channels.has_channel(&self.id) || channels.labels.intersects(&self.labels)
        })
    }
}

/// What a container node holds.
#[derive(Debug, Clone, PartialEq)]
pub enum ContainerNode {
    /// Nested containers, evaluated in order.
    Inner(Vec<Container>),

    /// Eligibility constraints.
    Constraints(Vec<Constraint>),

    /// Task label ids.
    TaskLabels(Vec<String>),

    /// Channels.
    Channels(Vec<ChannelCriterion>),

    /// Pay method ids.
    Pays(Vec<String>),

    /// Channel label ids.
    ChannelLabels(Vec<String>),
}

impl ContainerNode {
    /// Container type of this node.
    pub const fn container_type(&self) -> ContainerType {
        match self {
            Self::Inner(_) => ContainerType::Inner,
            Self::Constraints(_) => ContainerType::Constraint,
            Self::TaskLabels(_) => ContainerType::TaskLabel,
            Self::Channels(_) => ContainerType::Channel,
            Self::Pays(_) => ContainerType::Pay,
            Self::ChannelLabels(_) => ContainerType::ChannelLabel,
        }
    }
}

/// A condition node.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    /// Container identifier.
    pub id: String,

    /// How criteria or children are combined.
    pub operator: ContainerOperator,

    /// Children or leaf criteria.
    pub node: ContainerNode,
}

impl Container {
    /// Create a container.
    pub fn new(id: impl Into<String>, operator: ContainerOperator, node: ContainerNode) -> Self {
        Self {
            id: id.into(),
            operator,
            node,
        }
    }

    /// Create an inner container over `children`.
    pub fn inner(
        id: impl Into<String>,
        operator: ContainerOperator,
        children: Vec<Container>,
    ) -> Self {
        Self::new(id, operator, ContainerNode::Inner(children))
    }

    /// Create a channel leaf.
    pub fn channels(
        id: impl Into<String>,
        operator: ContainerOperator,
        channels: Vec<ChannelCriterion>,
    ) -> Self {
        Self::new(id, operator, ContainerNode::Channels(channels))
    }

    /// Create a pay leaf.
    pub fn pays<S: Into<String>>(
        id: impl Into<String>,
        operator: ContainerOperator,
        pay_ids: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(
            id,
            operator,
            ContainerNode::Pays(pay_ids.into_iter().map(Into::into).collect()),
        )
    }

    /// Create a task label leaf.
    pub fn task_labels<S: Into<String>>(
        id: impl Into<String>,
        operator: ContainerOperator,
        labels: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(
            id,
            operator,
            ContainerNode::TaskLabels(labels.into_iter().map(Into::into).collect()),
        )
    }

    /// Create a channel label leaf.
    pub fn channel_labels<S: Into<String>>(
        id: impl Into<String>,
        operator: ContainerOperator,
        labels: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(
            id,
            operator,
            ContainerNode::ChannelLabels(labels.into_iter().map(Into::into).collect()),
        )
    }

    /// Create a constraint leaf.
    pub fn constraints(
        id: impl Into<String>,
        operator: ContainerOperator,
        constraints: Vec<Constraint>,
    ) -> Self {
        Self::new(id, operator, ContainerNode::Constraints(constraints))
    }

    /// Container type of this node.
    pub const fn container_type(&self) -> ContainerType {
        self.node.container_type()
    }

    /// Evaluate this container against `event`.
    pub fn satisfy(&self, event: &Event) -> ContainerResult {
        let mut result = ContainerResult::new(&self.id, self.container_type());

        match &self.node {
            ContainerNode::Inner(children) => {
                result.children = children.iter().map(|child| child.satisfy(event)).collect();
            }
            leaf => {
                classify(leaf, event, &mut result.matches, &mut result.mis_matches);

                debug!(
                    container_id = %self.id,
                    container_type = ?result.container_type,
                    matches = ?result.matches,
                    mis_matches = ?result.mis_matches,
                    "classified leaf container"
                );
            }
        }

        result.pass = self.operate(&result);
        result
    }

    /// Every criterion id configured in the leaves of this tree, with its leaf type.
    pub fn configured_ids(&self) -> Vec<(ContainerType, &str)> {
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids<'a>(&'a self, ids: &mut Vec<(ContainerType, &'a str)>) {
        let kind = self.container_type();

        match &self.node {
            ContainerNode::Inner(children) => {
                for child in children {
                    child.collect_ids(ids);
                }
            }
            ContainerNode::Constraints(constraints) => ids.extend(
                constraints
                    .iter()
                    .map(|constraint| (kind, constraint.constraint_type.as_str())),
            ),
            ContainerNode::Channels(channels) => {
                ids.extend(channels.iter().map(|channel| (kind, channel.id.as_str())));
            }
            ContainerNode::TaskLabels(values)
            | ContainerNode::Pays(values)
            | ContainerNode::ChannelLabels(values) => {
                ids.extend(values.iter().map(|value| (kind, value.as_str())));
            }
        }
    }

    fn operate(&self, result: &ContainerResult) -> bool {
        match (&self.node, self.operator) {
            (ContainerNode::Inner(_), ContainerOperator::And) => {
                result.children.iter().all(|child| child.pass)
            }
            (ContainerNode::Inner(_), ContainerOperator::Or) => {
                result.children.iter().any(|child| child.pass)
            }
            (ContainerNode::Inner(_), ContainerOperator::Not) => {
                error!(
                    container_id = %self.id,
                    "inner container cannot use the not operator, failing closed"
                );

                false
            }
            (_, ContainerOperator::And) => result.mis_matches.is_empty(),
            (_, ContainerOperator::Or) => !result.matches.is_empty(),
            (_, ContainerOperator::Not) => result.matches.is_empty(),
        }
    }
}

/// Split a leaf's configured criteria into matches and mismatches, in configured order.
fn classify(
    node: &ContainerNode,
    event: &Event,
    matches: &mut Vec<String>,
    mis_matches: &mut Vec<String>,
) {
    let mut record = |id: &str, hit: bool| {
        let bucket = if hit { &mut *matches } else { &mut *mis_matches };

        if !bucket.iter().any(|seen| seen == id) {
            bucket.push(id.to_string());
        }
    };

    match node {
        ContainerNode::Inner(_) => {}
        ContainerNode::Constraints(constraints) => {
            for constraint in constraints {
                record(
                    constraint.constraint_type.as_str(),
                    constraint.is_satisfied_by(event),
                );
            }
        }
        ContainerNode::TaskLabels(labels) => {
            let present = event.card_event.as_ref().map(|card| &card.task_labels);

            for label in labels {
                record(label, present.is_some_and(|set| set.contains(label)));
            }
        }
        ContainerNode::Channels(channels) => {
            for channel in channels {
                record(&channel.id, channel.is_hit_by(event));
            }
        }
        ContainerNode::Pays(pay_ids) => {
            for pay_id in pay_ids {
                let hit = event.pay_event.as_ref().is_some_and(|pay| {
                    matches!(pay.status, PayStatus::Use | PayStatus::Whatever)
                        || pay.pay_ids.contains(pay_id)
                });

                record(pay_id, hit);
            }
        }
        ContainerNode::ChannelLabels(labels) => {
            for label in labels {
                let hit = event
                    .channel_event
                    .as_ref()
                    .is_some_and(|channels| channels.has_label(label));

                record(label, hit);
            }
        }
    }
}

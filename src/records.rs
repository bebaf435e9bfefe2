//! Rule Records
//!
//! Persisted shape of promotion rules as stored by the catalog backend:
//! camelCase keys, integer-coded enumerations and loosely populated lists.
//! Converting a record into an [`Evaluation`] checks every structural rule
//! and fails loudly on the first violation.

use jiff::{civil::Weekday, tz::Offset};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    containers::{
        ChannelCriterion, Constraint, ConstraintType, Container, ContainerNode, ContainerOperator,
        ContainerType,
    },
    evaluations::{Evaluation, Owner, OwnerKind, ValidityWindow},
    feedback::{CalculateType, Feedback, RewardType},
    labels::LabelSet,
    payloads::{Payload, PayloadNode, PayloadOperator},
};

/// Channel labels resolved from the channel catalog, keyed by channel id.
pub type ChannelLabels = FxHashMap<String, LabelSet>;

const OWNERS: [OwnerKind; 3] = [OwnerKind::CardReward, OwnerKind::Pay, OwnerKind::Channel];
const REWARD_TYPES: [RewardType; 2] = [RewardType::Currency, RewardType::Point];
const PAYLOAD_OPERATORS: [PayloadOperator; 4] = [
    PayloadOperator::MaxAnd,
    PayloadOperator::MaxOr,
    PayloadOperator::Xor,
    PayloadOperator::Add,
];
const CONTAINER_OPERATORS: [ContainerOperator; 3] = [
    ContainerOperator::And,
    ContainerOperator::Or,
    ContainerOperator::Not,
];
const CONTAINER_TYPES: [ContainerType; 6] = [
    ContainerType::Inner,
    ContainerType::Constraint,
    ContainerType::TaskLabel,
    ContainerType::Channel,
    ContainerType::Pay,
    ContainerType::ChannelLabel,
];
const CALCULATE_TYPES: [CalculateType; 3] = [
    CalculateType::Multiply,
    CalculateType::Fixed,
    CalculateType::Area,
];
const CONSTRAINT_TYPES: [ConstraintType; 4] = [
    ConstraintType::NewCustomer,
    ConstraintType::Register,
    ConstraintType::LimitCount,
    ConstraintType::LimitWeekDay,
];

const SELF_PAYLOAD: i32 = 0;
const CONTAINER_PAYLOAD: i32 = 1;

/// Structural problems found while converting a rule record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// The evaluation has no root payload.
    #[error("evaluation {0} has no payload")]
    MissingPayload(String),

    /// A combining payload has no children.
    #[error("payload {0} combines no child payloads")]
    EmptyPayloads(String),

    /// An inner container has no children.
    #[error("container {0} nests no child containers")]
    EmptyContainers(String),

    /// A gate payload has no container.
    #[error("payload {0} has no container")]
    MissingContainer(String),

    /// A gate payload has no feedback rule.
    #[error("payload {0} has no feedback")]
    MissingFeedback(String),

    /// A leaf container has no criteria for its type.
    #[error("container {0} has no criteria")]
    MissingCriteria(String),

    /// A combining payload also carries a gate.
    #[error("payload {0} mixes child payloads with a feedback or container")]
    MixedPayload(String),

    /// A container carries both children and leaf criteria.
    #[error("container {0} mixes child containers with leaf criteria")]
    MixedContainer(String),

    /// Unknown payload type code.
    #[error("payload {id} has unknown payload type {code}")]
    UnknownPayloadType {
        /// Payload id.
        id: String,

        /// Stored code.
        code: i32,
    },

    /// Unknown payload operator code.
    #[error("payload {id} has unknown payload operator {code}")]
    UnknownPayloadOperator {
        /// Payload id.
        id: String,

        /// Stored code.
        code: i32,
    },

    /// Unknown container operator code.
    #[error("container {id} has unknown container operator {code}")]
    UnknownContainerOperator {
        /// Container id.
        id: String,

        /// Stored code.
        code: i32,
    },

    /// Unknown container type code.
    #[error("container {id} has unknown container type {code}")]
    UnknownContainerType {
        /// Container id.
        id: String,

        /// Stored code.
        code: i32,
    },

    /// Unknown calculate type code.
    #[error("payload {id} has unknown calculate type {code}")]
    UnknownCalculateType {
        /// Payload id.
        id: String,

        /// Stored code.
        code: i32,
    },

    /// Unknown constraint type code.
    #[error("container {id} has unknown constraint type {code}")]
    UnknownConstraintType {
        /// Container id.
        id: String,

        /// Stored code.
        code: i32,
    },

    /// Unknown owner code.
    #[error("evaluation {id} has unknown owner {code}")]
    UnknownOwner {
        /// Evaluation id.
        id: String,

        /// Stored code.
        code: i32,
    },

    /// Unknown reward type code.
    #[error("evaluation {id} has unknown reward type {code}")]
    UnknownRewardType {
        /// Evaluation id.
        id: String,

        /// Stored code.
        code: i32,
    },

    /// A week-day outside `0..=6`.
    #[error("container {id} has invalid week-day {day}")]
    InvalidWeekDay {
        /// Container id.
        id: String,

        /// Stored day.
        day: i32,
    },

    /// A UTC offset jiff cannot represent.
    #[error("container {id} has invalid UTC offset of {hours} hours")]
    InvalidOffset {
        /// Container id.
        id: String,

        /// Stored hours.
        hours: i32,
    },

    /// The validity window ends before it starts.
    #[error("evaluation {id} ends at {end} before it starts at {start}")]
    InvalidWindow {
        /// Evaluation id.
        id: String,

        /// Window start.
        start: i64,

        /// Window end.
        end: i64,
    },

    /// A channel id the catalog does not know.
    #[error("container {container_id} references unknown channel {channel_id}")]
    UnknownChannel {
        /// Container id.
        container_id: String,

        /// Channel id.
        channel_id: String,
    },
}

/// Stored promotion rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRecord {
    /// Evaluation id.
    pub id: String,

    /// Owner kind code.
    pub owner: i32,

    /// Owner id.
    #[serde(rename = "ownerID")]
    pub owner_id: String,

    /// Reward type code.
    #[serde(default)]
    pub reward_type: i32,

    /// Window start, epoch seconds.
    pub start_date: i64,

    /// Window end, epoch seconds.
    pub end_date: i64,

    /// Creation time, epoch seconds.
    #[serde(default)]
    pub create_date: i64,

    /// Update time, epoch seconds.
    #[serde(default)]
    pub update_date: i64,

    /// Root payload.
    #[serde(default)]
    pub payload: Option<PayloadRecord>,
}

/// Stored payload node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadRecord {
    /// Payload id.
    pub id: String,

    /// Operator code, used by combining payloads.
    #[serde(default)]
    pub payload_operator: i32,

    /// Type code: 0 combines children, 1 gates a container.
    #[serde(default)]
    pub payload_type: i32,

    /// Feedback rule of a gate payload.
    #[serde(default)]
    pub feedback: Option<FeedbackRecord>,

    /// Children of a combining payload.
    #[serde(default)]
    pub payloads: Vec<PayloadRecord>,

    /// Container of a gate payload.
    #[serde(default)]
    pub container: Option<ContainerRecord>,
}

/// Stored feedback rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    /// Calculate type code.
    #[serde(default)]
    pub calculate_type: i32,

    /// Minimum cost.
    #[serde(default)]
    pub min_cost: i64,

    /// Fixed amount.
    #[serde(default)]
    pub fixed: i64,

    /// Fractional percentage.
    #[serde(default)]
    pub percentage: Decimal,

    /// Return cap. Zero means uncapped.
    #[serde(default)]
    pub return_max: Decimal,
}

/// Stored container node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRecord {
    /// Container id.
    pub id: String,

    /// Operator code.
    #[serde(default)]
    pub container_operator: i32,

    /// Type code.
    #[serde(default)]
    pub container_type: i32,

    /// Children of an inner container.
    #[serde(default)]
    pub containers: Vec<ContainerRecord>,

    /// Task label ids.
    #[serde(default)]
    pub task_labels: Vec<String>,

    /// Channel label ids.
    #[serde(default)]
    pub channel_labels: Vec<String>,

    /// Channel ids, resolved to labels through the channel catalog.
    #[serde(default, rename = "channelIDs")]
    pub channel_ids: Vec<String>,

    /// Pay method ids.
    #[serde(default, rename = "payIDs")]
    pub pay_ids: Vec<String>,

    /// Constraints.
    #[serde(default)]
    pub constraints: Vec<ConstraintRecord>,
}

/// Stored constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintRecord {
    /// Constraint type code.
    #[serde(default)]
    pub constraint_type: i32,

    /// Name.
    #[serde(default)]
    pub constraint_name: String,

    /// Week-days, 0 = Sunday.
    #[serde(default)]
    pub week_days: Vec<i32>,

    /// Hours east of UTC the week-day is read in.
    #[serde(default)]
    pub utc_offset_hours: i32,
}

fn decode<T: Copy>(code: i32, table: &[T]) -> Option<T> {
    let index = usize::try_from(code).ok()?;

    table.get(index).copied()
}

impl EvaluationRecord {
    /// Every channel id referenced anywhere in this rule.
    pub fn channel_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();

        if let Some(payload) = &self.payload {
            payload.collect_channel_ids(&mut ids);
        }

        ids
    }

    /// Convert into an [`Evaluation`], resolving channel ids through `channels`.
    ///
    /// # Errors
    ///
    /// Returns a [`RecordError`] describing the first structural problem found.
    pub fn into_evaluation(self, channels: &ChannelLabels) -> Result<Evaluation, RecordError> {
        let kind = decode(self.owner, &OWNERS).ok_or_else(|| RecordError::UnknownOwner {
            id: self.id.clone(),
            code: self.owner,
        })?;

        let reward_type =
            decode(self.reward_type, &REWARD_TYPES).ok_or_else(|| RecordError::UnknownRewardType {
                id: self.id.clone(),
                code: self.reward_type,
            })?;

        if self.start_date > self.end_date {
            return Err(RecordError::InvalidWindow {
                id: self.id,
                start: self.start_date,
                end: self.end_date,
            });
        }

        let payload = self
            .payload
            .ok_or_else(|| RecordError::MissingPayload(self.id.clone()))?
            .into_payload(channels)?;

        Ok(Evaluation {
            id: self.id,
            owner: Owner::new(kind, self.owner_id),
            reward_type,
            window: ValidityWindow::new(self.start_date, self.end_date),
            payload,
            created_at: self.create_date,
            updated_at: self.update_date,
        })
    }
}

impl PayloadRecord {
    fn collect_channel_ids<'a>(&'a self, ids: &mut Vec<&'a str>) {
        for child in &self.payloads {
            child.collect_channel_ids(ids);
        }

        if let Some(container) = &self.container {
            container.collect_channel_ids(ids);
        }
    }

    fn into_payload(self, channels: &ChannelLabels) -> Result<Payload, RecordError> {
        match self.payload_type {
            SELF_PAYLOAD => {
                if self.feedback.is_some() || self.container.is_some() {
                    return Err(RecordError::MixedPayload(self.id));
                }

                if self.payloads.is_empty() {
                    return Err(RecordError::EmptyPayloads(self.id));
                }

                let operator = decode(self.payload_operator, &PAYLOAD_OPERATORS).ok_or_else(
                    || RecordError::UnknownPayloadOperator {
                        id: self.id.clone(),
                        code: self.payload_operator,
                    },
                )?;

                let children = self
                    .payloads
                    .into_iter()
                    .map(|child| child.into_payload(channels))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(Payload {
                    id: self.id,
                    node: PayloadNode::Combine { operator, children },
                })
            }
            CONTAINER_PAYLOAD => {
                if !self.payloads.is_empty() {
                    return Err(RecordError::MixedPayload(self.id));
                }

                let feedback = self
                    .feedback
                    .ok_or_else(|| RecordError::MissingFeedback(self.id.clone()))?
                    .into_feedback(&self.id)?;

                let container = self
                    .container
                    .ok_or_else(|| RecordError::MissingContainer(self.id.clone()))?
                    .into_container(channels)?;

                Ok(Payload::gate(self.id, feedback, container))
            }
            code => Err(RecordError::UnknownPayloadType { id: self.id, code }),
        }
    }
}

impl FeedbackRecord {
    fn into_feedback(self, payload_id: &str) -> Result<Feedback, RecordError> {
        let calculate_type = decode(self.calculate_type, &CALCULATE_TYPES).ok_or_else(|| {
            RecordError::UnknownCalculateType {
                id: payload_id.to_string(),
                code: self.calculate_type,
            }
        })?;

        let return_max = self
            .return_max
            .trunc()
            .to_i64()
            .filter(|cap| *cap > 0);

        Ok(Feedback {
            calculate_type,
            min_cost: self.min_cost,
            fixed: self.fixed,
            percentage: self.percentage,
            return_max,
        })
    }
}

impl ContainerRecord {
    fn collect_channel_ids<'a>(&'a self, ids: &mut Vec<&'a str>) {
        for child in &self.containers {
            child.collect_channel_ids(ids);
        }

        ids.extend(self.channel_ids.iter().map(String::as_str));
    }

    fn has_criteria(&self) -> bool {
        !(self.task_labels.is_empty()
            && self.channel_labels.is_empty()
            && self.channel_ids.is_empty()
            && self.pay_ids.is_empty()
            && self.constraints.is_empty())
    }

    fn into_container(self, channels: &ChannelLabels) -> Result<Container, RecordError> {
        let operator = decode(self.container_operator, &CONTAINER_OPERATORS).ok_or_else(|| {
            RecordError::UnknownContainerOperator {
                id: self.id.clone(),
                code: self.container_operator,
            }
        })?;

        let container_type = decode(self.container_type, &CONTAINER_TYPES).ok_or_else(|| {
            RecordError::UnknownContainerType {
                id: self.id.clone(),
                code: self.container_type,
            }
        })?;

        if container_type == ContainerType::Inner {
            if self.has_criteria() {
                return Err(RecordError::MixedContainer(self.id));
            }

            if self.containers.is_empty() {
                return Err(RecordError::EmptyContainers(self.id));
            }

            let children = self
                .containers
                .into_iter()
                .map(|child| child.into_container(channels))
                .collect::<Result<Vec<_>, _>>()?;

            return Ok(Container::inner(self.id, operator, children));
        }

        if !self.containers.is_empty() {
            return Err(RecordError::MixedContainer(self.id));
        }

        let node = match container_type {
            ContainerType::Constraint => ContainerNode::Constraints(
                self.constraints
                    .iter()
                    .map(|constraint| constraint.to_constraint(&self.id))
                    .collect::<Result<_, _>>()?,
            ),
            ContainerType::TaskLabel => ContainerNode::TaskLabels(self.task_labels),
            ContainerType::Channel => ContainerNode::Channels(
                self.channel_ids
                    .iter()
                    .map(|channel_id| {
                        channels
                            .get(channel_id)
                            .map(|labels| ChannelCriterion::new(channel_id.as_str(), labels.clone()))
                            .ok_or_else(|| RecordError::UnknownChannel {
                                container_id: self.id.clone(),
                                channel_id: channel_id.clone(),
                            })
                    })
                    .collect::<Result<_, _>>()?,
            ),
            ContainerType::Pay => ContainerNode::Pays(self.pay_ids),
            ContainerType::ChannelLabel => ContainerNode::ChannelLabels(self.channel_labels),
            ContainerType::Inner => ContainerNode::Inner(Vec::new()),
        };

        let is_empty = match &node {
            ContainerNode::Inner(children) => children.is_empty(),
            ContainerNode::Constraints(constraints) => constraints.is_empty(),
            ContainerNode::Channels(channels) => channels.is_empty(),
            ContainerNode::TaskLabels(values)
            | ContainerNode::Pays(values)
            | ContainerNode::ChannelLabels(values) => values.is_empty(),
        };

        if is_empty {
            return Err(RecordError::MissingCriteria(self.id));
        }

        Ok(Container::new(self.id, operator, node))
    }
}

impl ConstraintRecord {
    fn to_constraint(&self, container_id: &str) -> Result<Constraint, RecordError> {
        let constraint_type = decode(self.constraint_type, &CONSTRAINT_TYPES).ok_or_else(|| {
            RecordError::UnknownConstraintType {
                id: container_id.to_string(),
                code: self.constraint_type,
            }
        })?;

        let offset = i8::try_from(self.utc_offset_hours)
            .ok()
            .and_then(|hours| Offset::from_hours(hours).ok())
            .ok_or_else(|| RecordError::InvalidOffset {
                id: container_id.to_string(),
                hours: self.utc_offset_hours,
            })?;

        let week_days = self
            .week_days
            .iter()
            .map(|&day| {
                i8::try_from(day)
                    .ok()
                    .and_then(|day| Weekday::from_sunday_zero_offset(day).ok())
                    .ok_or_else(|| RecordError::InvalidWeekDay {
                        id: container_id.to_string(),
                        day,
                    })
            })
            .collect::<Result<_, _>>()?;

        Ok(Constraint {
            constraint_type,
            name: self.constraint_name.clone(),
            week_days,
            offset,
        })
    }
}

//! Reward engine prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    catalog::{CatalogError, ChannelCatalog, RuleStore},
    containers::{
        ChannelCriterion, Constraint, ConstraintType, Container, ContainerNode, ContainerOperator,
        ContainerType,
    },
    evaluations::{
        Evaluation, JudgeError, Owner, OwnerKind, RewardType, SubEvent, ValidityWindow,
    },
    events::{CardEvent, ChannelEvent, ChannelHit, Event, PayEvent, PayStatus},
    feedback::{CalculateType, Feedback, FeedbackResult, FeedbackStatus, calculate},
    fixtures::{Fixture, FixtureError},
    labels::LabelSet,
    payloads::{Payload, PayloadNode, PayloadOperator, combine},
    records::{EvaluationRecord, RecordError},
    registry::{Registry, RegistryError},
    results::{ContainerResult, EvaluationResult, PayloadResult},
    summary::{Summary, SummaryError, summarize},
};

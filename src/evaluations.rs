//! Evaluations
//!
//! A promotion rule bound to an owner, a validity window and a reward type,
//! with a single root [`Payload`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{events::Event, payloads::Payload, results::EvaluationResult};

pub use crate::feedback::RewardType;

/// Kind of catalog entity a promotion is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    /// A card reward.
    CardReward,

    /// A payment method.
    Pay,

    /// A channel.
    Channel,
}

/// Entity a promotion is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    /// Owner kind.
    pub kind: OwnerKind,

    /// Owner identifier.
    pub id: String,
}

impl Owner {
    /// Create an owner.
    pub fn new(kind: OwnerKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

/// Inclusive range of epoch seconds during which a promotion applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityWindow {
    /// First valid second.
    pub start: i64,

    /// Last valid second.
    pub end: i64,
}

impl ValidityWindow {
    /// Create a window. Callers are expected to pass `start <= end`.
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Whether `date` falls inside the window, bounds included.
    pub const fn contains(&self, date: i64) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Sub-event an evaluation requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubEvent {
    /// Card sub-event.
    Card,

    /// Channel sub-event.
    Channel,
}

impl fmt::Display for SubEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Card => f.write_str("card"),
            Self::Channel => f.write_str("channel"),
        }
    }
}

/// Reasons an event cannot be judged by an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JudgeError {
    /// A required sub-event is absent.
    #[error("event is missing its {0} sub-event")]
    MissingSubEvent(SubEvent),

    /// The event date is outside the validity window.
    #[error("event date {date} is outside the validity window [{start}, {end}]")]
    OutOfValidityWindow {
        /// Event date.
        date: i64,

        /// Window start.
        start: i64,

        /// Window end.
        end: i64,
    },

    /// The event asks for a different reward type.
    #[error("evaluation pays {expected} but the event asks for {actual}")]
    RewardTypeMismatch {
        /// Reward type of the evaluation.
        expected: RewardType,

        /// Reward type on the event.
        actual: RewardType,
    },
}

/// A loaded promotion rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Evaluation identifier.
    pub id: String,

    /// Entity this rule is attached to.
    pub owner: Owner,

    /// Reward type paid out.
    pub reward_type: RewardType,

    /// Validity window.
    pub window: ValidityWindow,

    /// Root payload.
    pub payload: Payload,

    /// Creation time in epoch seconds.
    pub created_at: i64,

    /// Last update time in epoch seconds.
    pub updated_at: i64,
}

impl Evaluation {
    /// Create an evaluation with zeroed timestamps.
    pub fn new(
        id: impl Into<String>,
        owner: Owner,
        reward_type: RewardType,
        window: ValidityWindow,
        payload: Payload,
    ) -> Self {
        Self {
            id: id.into(),
            owner,
            reward_type,
            window,
            payload,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Judge `event` against this promotion.
    ///
    /// # Errors
    ///
    /// Returns a [`JudgeError`] when the card or channel sub-event is missing,
    /// the event date falls outside the validity window, or the event asks for
    /// a different reward type.
    #[tracing::instrument(
        name = "evaluations.judge",
        skip(self, event),
        fields(
            evaluation_id = %self.id,
            owner_id = %self.owner.id,
            event_id = %event.id
        ),
        err
    )]
    pub fn judge(&self, event: &Event) -> Result<EvaluationResult, JudgeError> {
        let card = event
            .card_event
            .as_ref()
            .ok_or(JudgeError::MissingSubEvent(SubEvent::Card))?;

        if event.channel_event.is_none() {
            return Err(JudgeError::MissingSubEvent(SubEvent::Channel));
        }

        if !self.window.contains(event.date) {
            return Err(JudgeError::OutOfValidityWindow {
                date: event.date,
                start: self.window.start,
                end: self.window.end,
            });
        }

        if card.reward_type != self.reward_type {
            return Err(JudgeError::RewardTypeMismatch {
                expected: self.reward_type,
                actual: card.reward_type,
            });
        }

        let payload = self.payload.judge(event);

        debug!(
            pass = payload.pass,
            get_return = payload.feedback.get_return,
            status = ?payload.feedback.status,
            "judged event"
        );

        Ok(EvaluationResult {
            id: self.id.clone(),
            owner: self.owner.clone(),
            reward_type: self.reward_type,
            feedback: payload.feedback.clone(),
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        containers::{ChannelCriterion, Container, ContainerOperator},
        events::{CardEvent, ChannelEvent, ChannelHit},
        feedback::Feedback,
        labels::LabelSet,
    };

    use super::*;

    fn evaluation() -> Evaluation {
        Evaluation::new(
            "eval-1",
            Owner::new(OwnerKind::Channel, "owner-1"),
            RewardType::Currency,
            ValidityWindow::new(1_000, 2_000),
            Payload::gate(
                "gate",
                Feedback::fixed(25),
                Container::channels(
                    "channel",
                    ContainerOperator::Or,
                    vec![ChannelCriterion::new("c1", LabelSet::empty())],
                ),
            ),
        )
    }

    fn event(date: i64) -> Event {
        Event::new("e1", date, 300)
            .with_card(CardEvent::new(RewardType::Currency, LabelSet::empty()))
            .with_channel(ChannelEvent::new(vec![ChannelHit::new(
                "c1",
                LabelSet::empty(),
            )]))
    }

    #[test]
    fn judges_inside_window_bounds() -> TestResult {
        let evaluation = evaluation();

        for date in [1_000, 1_500, 2_000] {
            let result = evaluation.judge(&event(date))?;

            assert!(result.pass());
            assert_eq!(result.feedback.get_return, 25);
            assert_eq!(result.feedback, result.payload.feedback);
        }

        Ok(())
    }

    #[test]
    fn rejects_dates_outside_window() {
        let evaluation = evaluation();

        for date in [999, 2_001] {
            assert_eq!(
                evaluation.judge(&event(date)),
                Err(JudgeError::OutOfValidityWindow {
                    date,
                    start: 1_000,
                    end: 2_000
                })
            );
        }
    }

    #[test]
    fn requires_card_and_channel_sub_events() {
        let evaluation = evaluation();

        let mut no_card = event(1_500);
        no_card.card_event = None;

        let mut no_channel = event(1_500);
        no_channel.channel_event = None;

        assert_eq!(
            evaluation.judge(&no_card),
            Err(JudgeError::MissingSubEvent(SubEvent::Card))
        );
        assert_eq!(
            evaluation.judge(&no_channel),
            Err(JudgeError::MissingSubEvent(SubEvent::Channel))
        );
    }

    #[test]
    fn rejects_other_reward_type() {
        let mut event = event(1_500);
        event.card_event = Some(CardEvent::new(RewardType::Point, LabelSet::empty()));

        assert_eq!(
            evaluation().judge(&event),
            Err(JudgeError::RewardTypeMismatch {
                expected: RewardType::Currency,
                actual: RewardType::Point
            })
        );
    }

    #[test]
    fn checks_sub_events_before_window() {
        let mut event = event(5);
        event.card_event = None;

        assert_eq!(
            evaluation().judge(&event),
            Err(JudgeError::MissingSubEvent(SubEvent::Card))
        );
    }
}

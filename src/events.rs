//! Events
//!
//! A candidate transaction submitted for reward evaluation. Events are built
//! per request and never mutated by the engine.

use jiff::{Timestamp, civil::Weekday, tz::Offset};
use serde::{Deserialize, Serialize};

use crate::{feedback::RewardType, labels::LabelSet};

/// A single purchase-like event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event identifier, used for log correlation only.
    pub id: String,

    /// Transaction date in epoch seconds.
    pub date: i64,

    /// Amount spent, in minor units of an unspecified currency.
    pub cost: i64,

    /// Card-side facts: reward type and task labels on the purchase.
    #[serde(default)]
    pub card_event: Option<CardEvent>,

    /// Payment-method facts.
    #[serde(default)]
    pub pay_event: Option<PayEvent>,

    /// Channel facts.
    #[serde(default)]
    pub channel_event: Option<ChannelEvent>,
}

impl Event {
    /// Create an event with no sub-events attached.
    pub fn new(id: impl Into<String>, date: i64, cost: i64) -> Self {
        Self {
            id: id.into(),
            date,
            cost,
            card_event: None,
            pay_event: None,
            channel_event: None,
        }
    }

    /// Attach a card sub-event.
    #[must_use]
    pub fn with_card(mut self, card: CardEvent) -> Self {
        self.card_event = Some(card);
        self
    }

    /// Attach a pay sub-event.
    #[must_use]
    pub fn with_pay(mut self, pay: PayEvent) -> Self {
        self.pay_event = Some(pay);
        self
    }

    /// Attach a channel sub-event.
    #[must_use]
    pub fn with_channel(mut self, channel: ChannelEvent) -> Self {
        self.channel_event = Some(channel);
        self
    }

    /// Week-day of the event date as seen from `offset`.
    ///
    /// Returns `None` when the date is outside the representable range.
    pub fn weekday(&self, offset: Offset) -> Option<Weekday> {
        let timestamp = Timestamp::from_second(self.date).ok()?;

        Some(offset.to_datetime(timestamp).weekday())
    }
}

/// Card-side facts of an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardEvent {
    /// Reward type the caller is asking about.
    pub reward_type: RewardType,

    /// Task labels present on the purchased item.
    #[serde(default)]
    pub task_labels: LabelSet,
}

impl CardEvent {
    /// Create a card sub-event.
    pub fn new(reward_type: RewardType, task_labels: LabelSet) -> Self {
        Self {
            reward_type,
            task_labels,
        }
    }
}

/// Whether the event constrains payment method usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayStatus {
    /// The caller does not care which payment method is used.
    #[default]
    Whatever,

    /// A payment method is in use; every configured method counts.
    Use,

    /// Only the explicitly listed payment methods were used.
    No,
}

/// Payment-method facts of an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayEvent {
    /// Pay status.
    #[serde(default)]
    pub status: PayStatus,

    /// Payment methods used.
    #[serde(default)]
    pub pay_ids: LabelSet,
}

impl PayEvent {
    /// Create a pay sub-event.
    pub fn new(status: PayStatus, pay_ids: LabelSet) -> Self {
        Self { status, pay_ids }
    }
}

/// One channel the event went through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelHit {
    /// Channel identifier.
    pub channel_id: String,

    /// Labels carried by that channel.
    #[serde(default)]
    pub labels: LabelSet,
}

impl ChannelHit {
    /// Create a channel hit.
    pub fn new(channel_id: impl Into<String>, labels: LabelSet) -> Self {
        Self {
            channel_id: channel_id.into(),
            labels,
        }
    }
}

/// Channel facts of an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawChannelEvent")]
pub struct ChannelEvent {
    /// Per-channel records.
    pub channels: Vec<ChannelHit>,

    /// Flattened labels across all channels, plus any extra labels the caller supplied.
    pub labels: LabelSet,
}

/// Channel sub-event as received, before the per-channel labels are flattened.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawChannelEvent {
    #[serde(default)]
    channels: Vec<ChannelHit>,

    #[serde(default)]
    labels: LabelSet,
}

impl From<RawChannelEvent> for ChannelEvent {
    fn from(raw: RawChannelEvent) -> Self {
        let mut event = Self::new(raw.channels);
        event.labels |= raw.labels;
        event
    }
}

impl ChannelEvent {
    /// Create a channel sub-event, flattening every channel's labels.
    pub fn new(channels: Vec<ChannelHit>) -> Self {
        let labels = channels
            .iter()
            .fold(LabelSet::empty(), |acc, hit| acc | hit.labels.clone());

        Self { channels, labels }
    }

    /// Create a channel sub-event from labels only.
    pub fn from_labels(labels: LabelSet) -> Self {
        Self {
            channels: Vec::new(),
            labels,
        }
    }

    /// Whether the event went through `channel_id`.
    pub fn has_channel(&self, channel_id: &str) -> bool {
        self.channels.iter().any(|hit| hit.channel_id == channel_id)
    }

    /// Whether `label` is present in the flattened set or on any channel.
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label) || self.channels.iter().any(|hit| hit.labels.contains(label))
    }
}

//! Reward Engine
//!
//! Reward rule evaluation for card, channel and pay-method promotions. A rule
//! pairs a boolean condition tree over purchase events with a value tree that
//! turns the event's cost into a reward.

pub mod catalog;
pub mod containers;
pub mod evaluations;
pub mod events;
pub mod feedback;
pub mod fixtures;
pub mod labels;
pub mod payloads;
pub mod prelude;
pub mod records;
pub mod registry;
pub mod results;
pub mod summary;

//! Summary
//!
//! Caller-facing digest of an [`EvaluationResult`]: the final feedback plus
//! every task label, channel, channel label and pay method that matched.

use std::io;

use serde::Serialize;
use tabled::{
    builder::Builder,
    settings::{Alignment, Color, Style, object::Rows},
};
use thiserror::Error;

use crate::{
    containers::ContainerType,
    feedback::FeedbackResult,
    labels::LabelSet,
    results::{ContainerResult, EvaluationResult, PayloadResult},
};

/// Errors that can occur when rendering a summary.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Writing to the output failed.
    #[error("IO error")]
    IO,
}

/// Flattened view of an evaluation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Evaluation that produced this summary.
    pub evaluation_id: String,

    /// Whether the evaluation passed.
    pub pass: bool,

    /// Final feedback.
    pub feedback: FeedbackResult,

    /// Matched task labels.
    pub matched_task_labels: LabelSet,

    /// Matched channel ids.
    pub matched_channels: LabelSet,

    /// Matched channel labels.
    pub matched_channel_labels: LabelSet,

    /// Matched pay method ids.
    pub matched_pay_methods: LabelSet,
}

/// Summarize an evaluation result.
pub fn summarize(result: &EvaluationResult) -> Summary {
    let mut summary = Summary {
        evaluation_id: result.id.clone(),
        pass: result.pass(),
        feedback: result.feedback.clone(),
        matched_task_labels: LabelSet::empty(),
        matched_channels: LabelSet::empty(),
        matched_channel_labels: LabelSet::empty(),
        matched_pay_methods: LabelSet::empty(),
    };

    summary.collect_payload(&result.payload);
    summary
}

impl Summary {
    fn collect_payload(&mut self, payload: &PayloadResult) {
        if let Some(container) = &payload.container {
            self.collect_container(container);
        }

        for child in &payload.children {
            self.collect_payload(child);
        }
    }

    fn collect_container(&mut self, container: &ContainerResult) {
        let bucket = match container.container_type {
            ContainerType::TaskLabel => Some(&mut self.matched_task_labels),
            ContainerType::Channel => Some(&mut self.matched_channels),
            ContainerType::ChannelLabel => Some(&mut self.matched_channel_labels),
            ContainerType::Pay => Some(&mut self.matched_pay_methods),
            ContainerType::Inner | ContainerType::Constraint => None,
        };

        if let Some(bucket) = bucket {
            for id in &container.matches {
                bucket.insert(id.as_str());
            }
        }

        for child in &container.children {
            self.collect_container(child);
        }
    }

    /// Render the summary as a table.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), SummaryError> {
        let mut builder = Builder::default();

        builder.push_record(["", "Value"]);
        builder.push_record(["Evaluation".to_string(), self.evaluation_id.clone()]);
        builder.push_record(["Pass".to_string(), self.pass.to_string()]);
        builder.push_record(["Cost".to_string(), self.feedback.cost.to_string()]);
        builder.push_record(["Return".to_string(), self.feedback.get_return.to_string()]);
        builder.push_record([
            "Percentage".to_string(),
            self.feedback.get_percentage.to_string(),
        ]);
        builder.push_record(["Status".to_string(), format!("{:?}", self.feedback.status)]);
        builder.push_record(["Task labels".to_string(), self.matched_task_labels.to_string()]);
        builder.push_record(["Channels".to_string(), self.matched_channels.to_string()]);
        builder.push_record([
            "Channel labels".to_string(),
            self.matched_channel_labels.to_string(),
        ]);
        builder.push_record(["Pay methods".to_string(), self.matched_pay_methods.to_string()]);

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Rows::new(1..), Alignment::left());

        writeln!(out, "{table}").map_err(|_err| SummaryError::IO)
    }
}

//! Rule Fixtures

use serde::Deserialize;

use crate::records::EvaluationRecord;

/// Wrapper for stored rules in YAML
#[derive(Debug, Deserialize)]
pub struct RulesFixture {
    /// Rules in load order
    pub evaluations: Vec<EvaluationRecord>,
}

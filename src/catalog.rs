//! Catalog
//!
//! Read interfaces onto the external collaborators the registry loads from.

use mockall::automock;
use thiserror::Error;

use crate::{fixtures::FixtureError, labels::LabelSet, records::EvaluationRecord};

/// Errors raised by a catalog or rule store backend.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The backend could not be reached or answered with an error.
    #[error("catalog backend unavailable: {0}")]
    Unavailable(String),

    /// Fixture-backed catalog failed.
    #[error(transparent)]
    Fixture(#[from] FixtureError),
}

/// Channel reference data.
#[automock]
pub trait ChannelCatalog {
    /// Labels of `channel_id`, or `None` when the channel is unknown.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] when the backend fails.
    fn channel_labels(&self, channel_id: &str) -> Result<Option<LabelSet>, CatalogError>;
}

/// Persisted promotion rules.
#[automock]
pub trait RuleStore {
    /// Every stored rule.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] when the backend fails.
    fn evaluation_records(&self) -> Result<Vec<EvaluationRecord>, CatalogError>;
}

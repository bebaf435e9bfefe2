//! Evaluation Registry
//!
//! Holds every loaded [`Evaluation`] and resolves an event to the promotion
//! attached to an owner. The list is swapped wholesale on reload so in-flight
//! lookups keep the snapshot they started with.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::{error, info};

use crate::{
    catalog::{CatalogError, ChannelCatalog, RuleStore},
    evaluations::{Evaluation, JudgeError},
    events::Event,
    records::{ChannelLabels, RecordError},
    results::EvaluationResult,
    summary::{Summary, summarize},
};

/// Errors surfaced by the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No evaluation is attached to the owner.
    #[error("no evaluation found for owner {0}")]
    UnknownOwnerId(String),

    /// The evaluation rejected the event.
    #[error(transparent)]
    Judge(#[from] JudgeError),

    /// A stored rule is structurally invalid.
    #[error("malformed rule {evaluation_id}: {source}")]
    MalformedRule {
        /// Id of the offending evaluation.
        evaluation_id: String,

        /// What was wrong with it.
        source: RecordError,
    },

    /// The rule store failed.
    #[error("rule store failed: {0}")]
    Store(#[source] CatalogError),

    /// The channel catalog failed.
    #[error("channel catalog failed: {0}")]
    Catalog(#[source] CatalogError),
}

/// In-memory list of loaded evaluations.
#[derive(Debug, Default)]
pub struct Registry {
    evaluations: RwLock<Arc<Vec<Evaluation>>>,
}

impl Registry {
    /// Create a registry over already-built evaluations.
    pub fn new(evaluations: Vec<Evaluation>) -> Self {
        Self {
            evaluations: RwLock::new(Arc::new(evaluations)),
        }
    }

    /// Load every stored rule, resolving channel references through `catalog`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store or catalog fails, or if any stored rule
    /// is malformed. Nothing is loaded in that case.
    #[tracing::instrument(name = "registry.load", skip(store, catalog), err)]
    pub fn load(
        store: &impl RuleStore,
        catalog: &impl ChannelCatalog,
    ) -> Result<Self, RegistryError> {
        let evaluations = build(store, catalog)?;

        info!(count = evaluations.len(), "loaded evaluations");

        Ok(Self::new(evaluations))
    }

    /// Replace the loaded evaluations with a fresh load.
    ///
    /// Returns the number of evaluations now loaded.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Registry::load`]. The previous evaluations
    /// stay in place when loading fails.
    #[tracing::instrument(name = "registry.reload", skip(self, store, catalog), err)]
    pub fn reload(
        &self,
        store: &impl RuleStore,
        catalog: &impl ChannelCatalog,
    ) -> Result<usize, RegistryError> {
        let evaluations = build(store, catalog)?;
        let count = evaluations.len();

        *self.evaluations.write() = Arc::new(evaluations);

        info!(count, "reloaded evaluations");

        Ok(count)
    }

    fn snapshot(&self) -> Arc<Vec<Evaluation>> {
        Arc::clone(&self.evaluations.read())
    }

    /// Number of loaded evaluations.
    pub fn len(&self) -> usize {
        self.evaluations.read().len()
    }

    /// Whether no evaluations are loaded.
    pub fn is_empty(&self) -> bool {
        self.evaluations.read().is_empty()
    }

    /// Distinct owner ids, in load order.
    pub fn owner_ids(&self) -> Vec<String> {
        let snapshot = self.snapshot();
        let mut seen = FxHashSet::default();

        snapshot
            .iter()
            .map(|evaluation| evaluation.owner.id.as_str())
            .filter(|id| seen.insert(*id))
            .map(str::to_string)
            .collect()
    }

    /// Judge `event` against the first evaluation attached to `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownOwnerId`] when no evaluation is attached
    /// to the owner, or [`RegistryError::Judge`] when the evaluation rejects
    /// the event.
    pub fn judge_by_owner_id(
        &self,
        owner_id: &str,
        event: &Event,
    ) -> Result<EvaluationResult, RegistryError> {
        let snapshot = self.snapshot();

        let evaluation = snapshot
            .iter()
            .find(|evaluation| evaluation.owner.id == owner_id)
            .ok_or_else(|| RegistryError::UnknownOwnerId(owner_id.to_string()))?;

        Ok(evaluation.judge(event)?)
    }

    /// Judge `event` for `owner_id` and summarize the result.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Registry::judge_by_owner_id`].
    #[tracing::instrument(
        name = "registry.evaluate_by_owner_id",
        skip(self, event),
        fields(event_id = %event.id),
        err
    )]
    pub fn evaluate_by_owner_id(
        &self,
        owner_id: &str,
        event: &Event,
    ) -> Result<Summary, RegistryError> {
        let result = self.judge_by_owner_id(owner_id, event)?;

        Ok(summarize(&result))
    }
}

fn build(
    store: &impl RuleStore,
    catalog: &impl ChannelCatalog,
) -> Result<Vec<Evaluation>, RegistryError> {
    let records = store.evaluation_records().map_err(RegistryError::Store)?;

    let mut channels = ChannelLabels::default();

    for record in &records {
        for channel_id in record.channel_ids() {
            if channels.contains_key(channel_id) {
                continue;
            }

            if let Some(labels) = catalog
                .channel_labels(channel_id)
                .map_err(RegistryError::Catalog)?
            {
                channels.insert(channel_id.to_string(), labels);
            }
        }
    }

    records
        .into_iter()
        .map(|record| {
            let evaluation_id = record.id.clone();

            record.into_evaluation(&channels).map_err(|source| {
                error!(%evaluation_id, %source, "malformed rule");

                RegistryError::MalformedRule {
                    evaluation_id,
                    source,
                }
            })
        })
        .collect()
}

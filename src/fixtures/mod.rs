//! Fixtures
//!
//! YAML-backed rule store and channel catalog, read from
//! `<base>/rules/<set>.yml` and `<base>/channels/<set>.yml`.

use std::{fs, path::PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::{
    catalog::{CatalogError, ChannelCatalog, RuleStore},
    fixtures::{channels::ChannelsFixture, rules::RulesFixture},
    labels::LabelSet,
    records::{ChannelLabels, EvaluationRecord},
};

pub mod channels;
pub mod rules;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),
}

/// Fixture
#[derive(Debug, Clone)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Channel id -> labels
    channels: ChannelLabels,

    /// Stored rules in file order
    records: Vec<EvaluationRecord>,
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            channels: ChannelLabels::default(),
            records: Vec::new(),
        }
    }

    /// Load channels from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_channels(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("channels").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: ChannelsFixture = serde_norway::from_str(&contents)?;

        debug!(path = %file_path.display(), count = fixture.channels.len(), "loaded channels");

        for (channel_id, channel) in fixture.channels {
            self.channels.insert(channel_id, channel.labels);
        }

        Ok(self)
    }

    /// Load stored rules from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_rules(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("rules").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;
        let fixture: RulesFixture = serde_norway::from_str(&contents)?;

        debug!(path = %file_path.display(), count = fixture.evaluations.len(), "loaded rules");

        self.records.extend(fixture.evaluations);

        Ok(self)
    }

    /// Load a rule set and a channel set from the default base path
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_sets(rules: &str, channels: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.load_channels(channels)?.load_rules(rules)?;

        Ok(fixture)
    }

    /// Stored rules loaded so far
    pub fn records(&self) -> &[EvaluationRecord] {
        &self.records
    }

    /// Channels loaded so far
    pub fn channels(&self) -> &ChannelLabels {
        &self.channels
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelCatalog for Fixture {
    fn channel_labels(&self, channel_id: &str) -> Result<Option<LabelSet>, CatalogError> {
        Ok(self.channels.get(channel_id).cloned())
    }
}

impl RuleStore for Fixture {
    fn evaluation_records(&self) -> Result<Vec<EvaluationRecord>, CatalogError> {
        Ok(self.records.clone())
    }
}

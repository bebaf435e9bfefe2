//! Channel Fixtures

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::labels::LabelSet;

/// Wrapper for channels in YAML
#[derive(Debug, Deserialize)]
pub struct ChannelsFixture {
    /// Map of channel id -> channel fixture
    pub channels: FxHashMap<String, ChannelFixture>,
}

/// Channel fixture from YAML
#[derive(Debug, Deserialize)]
pub struct ChannelFixture {
    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Channel labels
    #[serde(default)]
    pub labels: LabelSet,
}

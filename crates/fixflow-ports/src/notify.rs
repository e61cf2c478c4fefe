//! Team chat notification records.

use serde::{Deserialize, Serialize};

/// How loudly a channel message should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Info,
    Warning,
    Critical,
}

/// A formatted message for the team channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub title: String,
    pub text: String,
    pub importance: Importance,
}

impl ChannelMessage {
    pub fn new(title: impl Into<String>, text: impl Into<String>, importance: Importance) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            importance,
        }
    }
}

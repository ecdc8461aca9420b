//! Outbound, localizable chat messages.
//!
//! A message is an ordered list of parts, each either literal text or a
//! translation key with positional arguments. Hosts render these however
//! their chat surface wants; the serialized form mirrors a `rawtext` array.

use serde::{Deserialize, Serialize};

/// Visual weight of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    Plain,
    Error,
    Header,
    Highlight,
}

/// One fragment of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    Translate { translate: String, with: Vec<String> },
}

/// A user-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub style: Style,
    #[serde(rename = "rawtext")]
    pub parts: Vec<Part>,
}

impl Message {
    pub fn new(style: Style) -> Self {
        Self {
            style,
            parts: Vec::new(),
        }
    }

    /// Single plain text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Style::Plain).with_text(text)
    }

    /// Single error-styled text part.
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Style::Error).with_text(text)
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(Part::Text { text: text.into() });
        self
    }

    #[must_use]
    pub fn with_translation<I, S>(mut self, key: &str, with: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parts.push(Part::Translate {
            translate: key.to_string(),
            with: with.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Flatten to text, rendering translations as `key(arg, ...)`.
    pub fn plain_text(&self) -> String {
        self.parts
            .iter()
            .map(|part| match part {
                Part::Text { text } => text.clone(),
                Part::Translate { translate, with } => format!("{translate}({})", with.join(", ")),
            })
            .collect()
    }
}

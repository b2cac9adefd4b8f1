// Capabilities offered by the language service and the request that selects them.
use std::collections::BTreeSet;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// One remote analysis operation. Variant order is the processing order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    #[value(name = "sentiment")]
    Sentiment,
    #[value(name = "entities")]
    EntityRecognition,
    #[value(name = "entity-sentiment")]
    EntitySentiment,
    #[value(name = "classification")]
    Classification,
    #[value(name = "moderation")]
    Moderation,
}

impl Capability {
    pub fn label(&self) -> &'static str {
        match self {
            Capability::Sentiment => "Sentiment Analysis",
            Capability::EntityRecognition => "Entity Recognition",
            Capability::EntitySentiment => "Entity Sentiment",
            Capability::Classification => "Content Classification",
            Capability::Moderation => "Moderate Text",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    text: String,
    capabilities: BTreeSet<Capability>,
}

impl AnalysisRequest {
    pub fn new<I>(text: impl Into<String>, capabilities: I) -> Result<Self, InputError>
    where
        I: IntoIterator<Item = Capability>,
    {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(InputError::EmptyText);
        }
        let capabilities: BTreeSet<Capability> = capabilities.into_iter().collect();
        if capabilities.is_empty() {
            return Err(InputError::NoCapabilities);
        }
        Ok(Self { text, capabilities })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Requested capabilities in processing order.
    pub fn capabilities(&self) -> impl Iterator<Item = Capability> + '_ {
        self.capabilities.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_iterate_in_processing_order() -> anyhow::Result<()> {
        let request = AnalysisRequest::new(
            "hello",
            [
                Capability::Moderation,
                Capability::Sentiment,
                Capability::EntitySentiment,
            ],
        )?;
        let order: Vec<Capability> = request.capabilities().collect();
        assert_eq!(
            order,
            vec![
                Capability::Sentiment,
                Capability::EntitySentiment,
                Capability::Moderation
            ]
        );
        Ok(())
    }

    #[test]
    fn test_rejects_blank_text() {
        let result = AnalysisRequest::new("   ", [Capability::Sentiment]);
        assert!(matches!(result, Err(InputError::EmptyText)));
    }

    #[test]
    fn test_rejects_empty_capability_set() {
        let result = AnalysisRequest::new("hello", Vec::<Capability>::new());
        assert!(matches!(result, Err(InputError::NoCapabilities)));
    }

    #[test]
    fn test_duplicate_capabilities_collapse() -> anyhow::Result<()> {
        let request =
            AnalysisRequest::new("hello", [Capability::Sentiment, Capability::Sentiment])?;
        let caps: Vec<Capability> = request.capabilities().collect();
        assert_eq!(caps, vec![Capability::Sentiment]);
        Ok(())
    }
}

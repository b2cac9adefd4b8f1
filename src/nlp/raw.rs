// Raw per-capability payloads as returned by the language service, before merging.
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CapabilityFailure;
use crate::nlp::Capability;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityType {
    Person,
    Location,
    Organization,
    Event,
    WorkOfArt,
    ConsumerGood,
    Number,
    Address,
    Price,
    Other,
    /// Any type name the service returns outside the known set, kept verbatim.
    Unrecognized(String),
}

impl EntityType {
    pub fn from_api_name(name: &str) -> Self {
        match name {
            "PERSON" => EntityType::Person,
            "LOCATION" => EntityType::Location,
            "ORGANIZATION" => EntityType::Organization,
            "EVENT" => EntityType::Event,
            "WORK_OF_ART" => EntityType::WorkOfArt,
            "CONSUMER_GOOD" => EntityType::ConsumerGood,
            "NUMBER" => EntityType::Number,
            "ADDRESS" => EntityType::Address,
            "PRICE" => EntityType::Price,
            "OTHER" => EntityType::Other,
            other => EntityType::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EntityType::Person => "PERSON",
            EntityType::Location => "LOCATION",
            EntityType::Organization => "ORGANIZATION",
            EntityType::Event => "EVENT",
            EntityType::WorkOfArt => "WORK_OF_ART",
            EntityType::ConsumerGood => "CONSUMER_GOOD",
            EntityType::Number => "NUMBER",
            EntityType::Address => "ADDRESS",
            EntityType::Price => "PRICE",
            EntityType::Other => "OTHER",
            EntityType::Unrecognized(name) => name,
        }
    }
}

impl From<String> for EntityType {
    fn from(value: String) -> Self {
        EntityType::from_api_name(&value)
    }
}

impl From<EntityType> for String {
    fn from(value: EntityType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub score: f64,
    pub magnitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceSentiment {
    pub text: String,
    pub score: f64,
    pub magnitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentPayload {
    pub document: SentimentScore,
    pub sentences: Vec<SentenceSentiment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMention {
    pub name: String,
    pub entity_type: EntityType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySentimentPair {
    pub name: String,
    pub entity_type: EntityType,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub name: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationScore {
    pub category: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawCapabilityResult {
    Sentiment(SentimentPayload),
    Entities(Vec<EntityMention>),
    EntitySentiment(Vec<EntitySentimentPair>),
    Categories(Vec<CategoryScore>),
    Moderation(Vec<ModerationScore>),
}

impl RawCapabilityResult {
    pub fn capability(&self) -> Capability {
        match self {
            RawCapabilityResult::Sentiment(_) => Capability::Sentiment,
            RawCapabilityResult::Entities(_) => Capability::EntityRecognition,
            RawCapabilityResult::EntitySentiment(_) => Capability::EntitySentiment,
            RawCapabilityResult::Categories(_) => Capability::Classification,
            RawCapabilityResult::Moderation(_) => Capability::Moderation,
        }
    }
}

pub type CapabilityOutcome = Result<RawCapabilityResult, CapabilityFailure>;

/// Outcome of every capability that was dispatched, keyed and ordered by capability.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResults {
    outcomes: BTreeMap<Capability, CapabilityOutcome>,
}

impl RawResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, capability: Capability, outcome: CapabilityOutcome) {
        self.outcomes.insert(capability, outcome);
    }

    pub fn with(mut self, outcome: RawCapabilityResult) -> Self {
        self.insert(outcome.capability(), Ok(outcome));
        self
    }

    pub fn with_failure(mut self, capability: Capability, message: impl Into<String>) -> Self {
        let failure = CapabilityFailure {
            capability,
            message: message.into(),
        };
        self.insert(capability, Err(failure));
        self
    }

    /// Successful payload for `capability`, if it was requested and did not fail.
    pub fn succeeded(&self, capability: Capability) -> Option<&RawCapabilityResult> {
        self.outcomes.get(&capability).and_then(|o| o.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &CapabilityFailure> {
        self.outcomes.values().filter_map(|o| o.as_ref().err())
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }
}

// Result aggregation: merges the per-capability payloads into one analysis record.
use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::nlp::raw::{
    CategoryScore, EntityType, ModerationScore, RawCapabilityResult, RawResults,
    SentenceSentiment, SentimentScore,
};
use crate::nlp::Capability;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_sentiment: Option<SentimentScore>,
    pub sentences: Vec<SentenceSentiment>,
    pub entities: Vec<EntityRecord>,
    pub categories: Vec<CategoryScore>,
    pub moderation: Vec<ModerationScore>,
}

impl AnalysisResult {
    fn empty(text: &str) -> Self {
        Self {
            text: text.to_string(),
            document_sentiment: None,
            sentences: Vec::new(),
            entities: Vec::new(),
            categories: Vec::new(),
            moderation: Vec::new(),
        }
    }
}

/// Entity-sentiment pairs discarded because no recognized entity had the same name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeDiagnostics {
    pub dropped_entity_sentiments: Vec<String>,
}

impl MergeDiagnostics {
    pub fn dropped(&self) -> usize {
        self.dropped_entity_sentiments.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub result: AnalysisResult,
    pub diagnostics: MergeDiagnostics,
}

pub fn aggregate(text: &str, results: &RawResults) -> Aggregation {
    let mut result = AnalysisResult::empty(text);
    let mut diagnostics = MergeDiagnostics::default();

    if let Some(RawCapabilityResult::Sentiment(payload)) = results.succeeded(Capability::Sentiment)
    {
        result.document_sentiment = Some(payload.document);
        result.sentences = payload.sentences.clone();
    }

    let mut recognized = false;
    if let Some(RawCapabilityResult::Entities(mentions)) =
        results.succeeded(Capability::EntityRecognition)
    {
        recognized = true;
        let mut seen = HashSet::new();
        for mention in mentions {
            if !seen.insert(mention.name.as_str()) {
                debug!("Skipping repeated entity '{}'", mention.name);
                continue;
            }
            result.entities.push(EntityRecord {
                name: mention.name.clone(),
                entity_type: mention.entity_type.clone(),
                sentiment: None,
            });
        }
    }

    if let Some(RawCapabilityResult::EntitySentiment(pairs)) =
        results.succeeded(Capability::EntitySentiment)
    {
        if recognized {
            for pair in pairs {
                match result.entities.iter_mut().find(|e| e.name == pair.name) {
                    Some(entity) => entity.sentiment = Some(pair.score),
                    None => diagnostics.dropped_entity_sentiments.push(pair.name.clone()),
                }
            }
        } else {
            let mut seen = HashSet::new();
            for pair in pairs {
                if !seen.insert(pair.name.as_str()) {
                    debug!("Skipping repeated entity '{}'", pair.name);
                    continue;
                }
                result.entities.push(EntityRecord {
                    name: pair.name.clone(),
                    entity_type: pair.entity_type.clone(),
                    sentiment: Some(pair.score),
                });
            }
        }
    }

    if let Some(RawCapabilityResult::Categories(categories)) =
        results.succeeded(Capability::Classification)
    {
        result.categories = categories.clone();
    }

    if let Some(RawCapabilityResult::Moderation(moderation)) =
        results.succeeded(Capability::Moderation)
    {
        result.moderation = moderation.clone();
    }

    if diagnostics.dropped() > 0 {
        warn!(
            "Dropped {} entity sentiment(s) with no matching entity: {}",
            diagnostics.dropped(),
            diagnostics.dropped_entity_sentiments.join(", ")
        );
    }

    Aggregation {
        result,
        diagnostics,
    }
}

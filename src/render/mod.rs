// Presentation mapper: turns an analysis result into four independent display sections.
//
// Sections carry styling hints (a color tag, a numeric precision) as data so that any
// writer (terminal, JSON, HTML) can present them without re-deriving formatting rules.
use std::collections::{BTreeSet, HashMap};

use clap::ValueEnum;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::error::CapabilityFailure;
use crate::nlp::aggregate::Aggregation;
use crate::nlp::raw::{EntityType, RawResults};
use crate::nlp::{AnalysisResult, MergeDiagnostics};

pub mod html;
pub mod json;
pub mod terminal;

pub const CATEGORIES_REFERENCE: &str = "https://cloud.google.com/natural-language/docs/categories";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayColor {
    Blue,
    Green,
    Purple,
    Orange,
    Red,
    Brown,
    Pink,
    Gray,
    Yellow,
}

static ENTITY_COLORS: Lazy<HashMap<&'static str, DisplayColor>> = Lazy::new(|| {
    [
        ("PERSON", DisplayColor::Blue),
        ("LOCATION", DisplayColor::Green),
        ("ORGANIZATION", DisplayColor::Purple),
        ("EVENT", DisplayColor::Orange),
        ("WORK_OF_ART", DisplayColor::Red),
        ("CONSUMER_GOOD", DisplayColor::Brown),
        ("NUMBER", DisplayColor::Blue),
        ("ADDRESS", DisplayColor::Pink),
        ("PRICE", DisplayColor::Red),
        ("OTHER", DisplayColor::Gray),
    ]
    .into_iter()
    .collect()
});

pub fn entity_color(entity_type: &EntityType) -> DisplayColor {
    ENTITY_COLORS
        .get(entity_type.as_str())
        .copied()
        .unwrap_or(DisplayColor::Gray)
}

/// A labelled number with a fixed precision, e.g. `Score: 0.800`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub label: &'static str,
    pub value: f64,
    pub precision: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<DisplayColor>,
    pub text: String,
}

impl Figure {
    pub fn new(label: &'static str, value: f64, precision: usize) -> Self {
        Self {
            label,
            value,
            precision,
            color: None,
            text: format!("{}: {:.*}", label, precision, value),
        }
    }

    pub fn colored(mut self, color: DisplayColor) -> Self {
        self.color = Some(color);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Badge {
    pub label: String,
    pub color: DisplayColor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityCard {
    pub name: String,
    pub badge: Badge,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Figure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentenceLine {
    pub text: String,
    pub score: Figure,
    pub magnitude: Figure,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendBand {
    pub label: &'static str,
    pub low: f64,
    pub high: f64,
    pub color: DisplayColor,
    pub text: &'static str,
}

pub const SENTIMENT_LEGEND: [LegendBand; 3] = [
    LegendBand {
        label: "Positive",
        low: 0.25,
        high: 1.0,
        color: DisplayColor::Green,
        text: "Positive (0.25 - 1.0)",
    },
    LegendBand {
        label: "Neutral",
        low: -0.25,
        high: 0.25,
        color: DisplayColor::Yellow,
        text: "Neutral (-0.25 - 0.25)",
    },
    LegendBand {
        label: "Negative",
        low: -1.0,
        high: -0.25,
        color: DisplayColor::Red,
        text: "Negative (-1.0 - -0.25)",
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentPanel {
    pub text: String,
    pub score: Figure,
    pub magnitude: Figure,
    pub sentences: Vec<SentenceLine>,
    pub legend: Vec<LegendBand>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreCard {
    pub name: String,
    pub confidence: Figure,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoriesPanel {
    pub cards: Vec<ScoreCard>,
    pub reference: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "content", rename_all = "snake_case")]
pub enum Section<T> {
    NotPerformed(&'static str),
    Performed(T),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sections {
    pub entities: Section<Vec<EntityCard>>,
    pub sentiment: Section<SentimentPanel>,
    pub moderation: Section<Vec<ScoreCard>>,
    pub categories: Section<CategoriesPanel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Entities,
    Sentiment,
    Moderation,
    Categories,
}

impl SectionKind {
    pub const ALL: [SectionKind; 4] = [
        SectionKind::Entities,
        SectionKind::Sentiment,
        SectionKind::Moderation,
        SectionKind::Categories,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::Entities => "Entities",
            SectionKind::Sentiment => "Sentiment",
            SectionKind::Moderation => "Moderation",
            SectionKind::Categories => "Categories",
        }
    }
}

/// Which sections a writer should show. Empty selection means all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionFilter {
    visible: BTreeSet<SectionKind>,
}

impl SectionFilter {
    pub fn new(selected: &[SectionKind]) -> Self {
        let visible = if selected.is_empty() {
            SectionKind::ALL.into_iter().collect()
        } else {
            selected.iter().copied().collect()
        };
        Self { visible }
    }

    pub fn shows(&self, kind: SectionKind) -> bool {
        self.visible.contains(&kind)
    }
}

impl Default for SectionFilter {
    fn default() -> Self {
        Self::new(&[])
    }
}

/// Everything a writer needs for one run: the sections plus the non-fatal problems.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub sections: Sections,
    pub warnings: Vec<CapabilityFailure>,
    pub diagnostics: MergeDiagnostics,
}

impl Report {
    pub fn new(aggregation: &Aggregation, raw: &RawResults) -> Self {
        Self {
            sections: render(&aggregation.result),
            warnings: raw.failures().cloned().collect(),
            diagnostics: aggregation.diagnostics.clone(),
        }
    }
}

pub fn render(result: &AnalysisResult) -> Sections {
    Sections {
        entities: entities_section(result),
        sentiment: sentiment_section(result),
        moderation: moderation_section(result),
        categories: categories_section(result),
    }
}

fn entities_section(result: &AnalysisResult) -> Section<Vec<EntityCard>> {
    if result.entities.is_empty() {
        return Section::NotPerformed("No entity recognition performed.");
    }
    Section::Performed(
        result
            .entities
            .iter()
            .map(|e| EntityCard {
                name: e.name.clone(),
                badge: Badge {
                    label: e.entity_type.to_string(),
                    color: entity_color(&e.entity_type),
                },
                sentiment: e.sentiment.map(|s| Figure::new("Sentiment", s, 2)),
            })
            .collect(),
    )
}

fn sentiment_section(result: &AnalysisResult) -> Section<SentimentPanel> {
    let Some(document) = result.document_sentiment else {
        return Section::NotPerformed("No sentiment analysis performed.");
    };
    Section::Performed(SentimentPanel {
        text: result.text.clone(),
        score: Figure::new("Score", document.score, 3).colored(DisplayColor::Green),
        magnitude: Figure::new("Magnitude", document.magnitude, 3).colored(DisplayColor::Blue),
        sentences: result
            .sentences
            .iter()
            .map(|s| SentenceLine {
                text: s.text.clone(),
                score: Figure::new("Score", s.score, 3).colored(DisplayColor::Green),
                magnitude: Figure::new("Magnitude", s.magnitude, 3).colored(DisplayColor::Blue),
            })
            .collect(),
        legend: SENTIMENT_LEGEND.to_vec(),
    })
}

fn moderation_section(result: &AnalysisResult) -> Section<Vec<ScoreCard>> {
    if result.moderation.is_empty() {
        return Section::NotPerformed("No moderation analysis performed.");
    }
    Section::Performed(
        result
            .moderation
            .iter()
            .map(|m| ScoreCard {
                name: m.category.clone(),
                confidence: Figure::new("Confidence", m.confidence, 6),
            })
            .collect(),
    )
}

fn categories_section(result: &AnalysisResult) -> Section<CategoriesPanel> {
    if result.categories.is_empty() {
        return Section::NotPerformed("No content classification performed.");
    }
    Section::Performed(CategoriesPanel {
        cards: result
            .categories
            .iter()
            .map(|c| ScoreCard {
                name: c.name.clone(),
                confidence: Figure::new("Confidence", c.confidence, 6),
            })
            .collect(),
        reference: CATEGORIES_REFERENCE,
    })
}

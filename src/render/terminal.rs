// Terminal writer: prints the visible sections with termcolor styling.
use std::io;

use termcolor::{Color, ColorSpec, WriteColor};

use super::{DisplayColor, Figure, Report, Section, SectionFilter, SectionKind};

fn term_color(color: DisplayColor) -> Color {
    match color {
        DisplayColor::Blue => Color::Blue,
        DisplayColor::Green => Color::Green,
        DisplayColor::Purple => Color::Magenta,
        DisplayColor::Orange => Color::Rgb(255, 165, 0),
        DisplayColor::Red => Color::Red,
        DisplayColor::Brown => Color::Rgb(165, 42, 42),
        DisplayColor::Pink => Color::Rgb(255, 105, 180),
        DisplayColor::Gray => Color::Rgb(128, 128, 128),
        DisplayColor::Yellow => Color::Yellow,
    }
}

fn write_colored<W: WriteColor>(
    out: &mut W,
    text: &str,
    color: DisplayColor,
    bold: bool,
) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(term_color(color))).set_bold(bold))?;
    write!(out, "{}", text)?;
    out.reset()
}

fn write_figure<W: WriteColor>(out: &mut W, figure: &Figure) -> io::Result<()> {
    match figure.color {
        Some(color) => write_colored(out, &figure.text, color, true),
        None => write!(out, "{}", figure.text),
    }
}

fn write_header<W: WriteColor>(out: &mut W, kind: SectionKind) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_bold(true).set_underline(true))?;
    write!(out, "{}", kind.title())?;
    out.reset()?;
    writeln!(out)
}

fn write_placeholder<W: WriteColor>(out: &mut W, message: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_dimmed(true))?;
    write!(out, "  {}", message)?;
    out.reset()?;
    writeln!(out)
}

pub fn write_report<W: WriteColor>(
    out: &mut W,
    report: &Report,
    filter: &SectionFilter,
) -> io::Result<()> {
    for failure in &report.warnings {
        write_colored(out, "warning", DisplayColor::Yellow, true)?;
        writeln!(out, ": {}", failure)?;
    }
    if report.diagnostics.dropped() > 0 {
        write_colored(out, "note", DisplayColor::Gray, true)?;
        writeln!(
            out,
            ": entity sentiment without a matching entity was dropped for {}",
            report.diagnostics.dropped_entity_sentiments.join(", ")
        )?;
    }

    let sections = &report.sections;
    for kind in SectionKind::ALL {
        if !filter.shows(kind) {
            continue;
        }
        writeln!(out)?;
        write_header(out, kind)?;
        match kind {
            SectionKind::Entities => match &sections.entities {
                Section::NotPerformed(message) => write_placeholder(out, message)?,
                Section::Performed(cards) => {
                    for card in cards {
                        write!(out, "  ")?;
                        out.set_color(ColorSpec::new().set_bold(true))?;
                        write!(out, "{}", card.name)?;
                        out.reset()?;
                        write!(out, " ")?;
                        let badge = format!("[{}]", card.badge.label);
                        write_colored(out, &badge, card.badge.color, false)?;
                        if let Some(sentiment) = &card.sentiment {
                            write!(out, "  ")?;
                            write_figure(out, sentiment)?;
                        }
                        writeln!(out)?;
                    }
                }
            },
            SectionKind::Sentiment => match &sections.sentiment {
                Section::NotPerformed(message) => write_placeholder(out, message)?,
                Section::Performed(panel) => {
                    writeln!(out, "  Entire document:")?;
                    writeln!(out, "  {}", panel.text)?;
                    write!(out, "    ")?;
                    write_figure(out, &panel.score)?;
                    write!(out, "  ")?;
                    write_figure(out, &panel.magnitude)?;
                    writeln!(out)?;
                    if !panel.sentences.is_empty() {
                        writeln!(out, "  Sentences:")?;
                        for sentence in &panel.sentences {
                            writeln!(out, "  {}", sentence.text)?;
                            write!(out, "    ")?;
                            write_figure(out, &sentence.score)?;
                            write!(out, "  ")?;
                            write_figure(out, &sentence.magnitude)?;
                            writeln!(out)?;
                        }
                    }
                    write!(out, "  Score range:")?;
                    for band in &panel.legend {
                        write!(out, "  ")?;
                        write_colored(out, band.text, band.color, false)?;
                    }
                    writeln!(out)?;
                }
            },
            SectionKind::Moderation => match &sections.moderation {
                Section::NotPerformed(message) => write_placeholder(out, message)?,
                Section::Performed(cards) => {
                    for card in cards {
                        writeln!(out, "  {}  {}", card.name, card.confidence.text)?;
                    }
                }
            },
            SectionKind::Categories => match &sections.categories {
                Section::NotPerformed(message) => write_placeholder(out, message)?,
                Section::Performed(panel) => {
                    for card in &panel.cards {
                        writeln!(out, "  {}  {}", card.name, card.confidence.text)?;
                    }
                    writeln!(
                        out,
                        "  See the complete list of categories: {}",
                        panel.reference
                    )?;
                }
            },
        }
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::aggregate::aggregate;
    use crate::nlp::raw::{
        EntityMention, EntityType, ModerationScore, RawCapabilityResult, RawResults,
        SentenceSentiment, SentimentPayload, SentimentScore,
    };
    use crate::nlp::Capability;
    use anyhow::Result;
    use termcolor::Buffer;

    fn report_for(raw: &RawResults) -> Report {
        Report::new(&aggregate("I love this product", raw), raw)
    }

    fn plain(report: &Report, filter: &SectionFilter) -> Result<String> {
        let mut buf = Buffer::no_color();
        write_report(&mut buf, report, filter)?;
        Ok(String::from_utf8(buf.into_inner())?)
    }

    #[test]
    fn test_sentiment_output() -> Result<()> {
        let raw = RawResults::new().with(RawCapabilityResult::Sentiment(SentimentPayload {
            document: SentimentScore {
                score: 0.8,
                magnitude: 1.2,
            },
            sentences: vec![SentenceSentiment {
                text: "I love this product".to_string(),
                score: 0.8,
                magnitude: 1.2,
            }],
        }));
        let text = plain(&report_for(&raw), &SectionFilter::default())?;

        assert!(text.contains("Score: 0.800"));
        assert!(text.contains("Magnitude: 1.200"));
        assert!(text.contains("Positive (0.25 - 1.0)"));
        assert!(text.contains("No entity recognition performed."));
        assert!(text.contains("No moderation analysis performed."));
        assert!(text.contains("No content classification performed."));
        Ok(())
    }

    #[test]
    fn test_failed_classification_prints_warning_and_placeholder() -> Result<()> {
        let raw = RawResults::new()
            .with_failure(Capability::Classification, "too few tokens")
            .with(RawCapabilityResult::Moderation(vec![ModerationScore {
                category: "Toxic".to_string(),
                confidence: 0.123456,
            }]));
        let text = plain(&report_for(&raw), &SectionFilter::default())?;

        assert!(text.starts_with("warning: Content Classification failed: too few tokens"));
        assert!(text.contains("No content classification performed."));
        assert!(text.contains("Toxic  Confidence: 0.123456"));
        Ok(())
    }

    #[test]
    fn test_hidden_sections_are_skipped() -> Result<()> {
        let raw = RawResults::new().with(RawCapabilityResult::Entities(vec![EntityMention {
            name: "Apple".to_string(),
            entity_type: EntityType::Organization,
        }]));
        let filter = SectionFilter::new(&[SectionKind::Entities]);
        let text = plain(&report_for(&raw), &filter)?;

        assert!(text.contains("Apple [ORGANIZATION]"));
        assert!(!text.contains("Sentiment"));
        assert!(!text.contains("Moderation"));
        Ok(())
    }

    #[test]
    fn test_colored_output_carries_escape_codes() -> Result<()> {
        let raw = RawResults::new().with(RawCapabilityResult::Entities(vec![EntityMention {
            name: "Lisbon".to_string(),
            entity_type: EntityType::Location,
        }]));
        let mut buf = Buffer::ansi();
        write_report(&mut buf, &report_for(&raw), &SectionFilter::default())?;
        let text = String::from_utf8(buf.into_inner())?;
        assert!(text.contains("\x1b["));
        assert!(text.contains("[LOCATION]"));
        Ok(())
    }
}

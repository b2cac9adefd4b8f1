// JSON writer: the visible sections plus warnings, for piping into other tools.
use serde_json::{json, Map, Value};

use super::{Report, SectionFilter, SectionKind};

pub fn to_json(report: &Report, filter: &SectionFilter) -> serde_json::Result<Value> {
    let mut sections = Map::new();
    for kind in SectionKind::ALL {
        if !filter.shows(kind) {
            continue;
        }
        let value = match kind {
            SectionKind::Entities => serde_json::to_value(&report.sections.entities)?,
            SectionKind::Sentiment => serde_json::to_value(&report.sections.sentiment)?,
            SectionKind::Moderation => serde_json::to_value(&report.sections.moderation)?,
            SectionKind::Categories => serde_json::to_value(&report.sections.categories)?,
        };
        let key = serde_json::to_value(kind)?
            .as_str()
            .unwrap_or(kind.title())
            .to_string();
        sections.insert(key, value);
    }

    let warnings: Vec<Value> = report
        .warnings
        .iter()
        .map(|w| json!({ "capability": w.capability, "message": w.message }))
        .collect();

    Ok(json!({
        "warnings": warnings,
        "dropped_entity_sentiments": report.diagnostics.dropped_entity_sentiments,
        "sections": sections,
    }))
}

// HTML writer: a standalone page with one card per result, rendered through minijinja.
use std::collections::BTreeMap;

use minijinja::{context, Environment};

use super::{Report, SectionFilter, SectionKind};

const REPORT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Text analysis</title>
<style>
body { font-family: sans-serif; max-width: 60rem; margin: 2rem auto; color: #222; }
.entity-card, .moderation-card, .category-card {
    background-color: white;
    border: 1px solid #ddd;
    border-radius: 5px;
    padding: 10px;
    margin: 10px 0;
    box-shadow: 0 2px 4px rgba(0,0,0,0.1);
}
.entity-name, .category-name { font-weight: bold; margin-right: 10px; }
.entity-type {
    color: white;
    padding: 2px 5px;
    border-radius: 3px;
    font-size: 12px;
    display: inline-block;
}
.confidence, .sentiment-score { float: right; color: #555; }
.sentiment-box {
    padding: 5px 10px;
    border-radius: 3px;
    color: white;
    display: inline-block;
    margin-right: 10px;
}
.warning { background: #fcf8e3; color: #8a6d3b; padding: 5px 10px; border-radius: 3px; }
.legend { display: flex; justify-content: space-between; margin-top: 10px; }
.legend div { width: 33%; height: 20px; }
.legend-labels { display: flex; justify-content: space-between; }
.placeholder { color: #777; }
</style>
</head>
<body>
<h1>Analysis results</h1>
{%- for warning in warnings %}
<p class="warning">{{ warning }}</p>
{%- endfor %}
{%- if show.entities %}
<section>
<h2>Entities</h2>
{%- if sections.entities.status == "performed" %}
{%- for card in sections.entities.content %}
<div class="entity-card">
    <span class="entity-name">{{ card.name }}</span>
    <span class="entity-type" style="background-color: {{ card.badge.color }};">{{ card.badge.label }}</span>
    {%- if card.sentiment %}
    <span class="sentiment-score">{{ card.sentiment.text }}</span>
    {%- endif %}
</div>
{%- endfor %}
{%- else %}
<p class="placeholder">{{ sections.entities.content }}</p>
{%- endif %}
</section>
{%- endif %}
{%- if show.sentiment %}
<section>
<h2>Sentiment</h2>
{%- if sections.sentiment.status == "performed" %}
{%- set panel = sections.sentiment.content %}
<h3>Document and sentence level sentiment</h3>
<p><strong>Entire document:</strong></p>
<p>{{ panel.text }}</p>
<div>
    <span class="sentiment-box" style="background-color: {{ panel.score.color }};">{{ panel.score.text }}</span>
    <span class="sentiment-box" style="background-color: {{ panel.magnitude.color }};">{{ panel.magnitude.text }}</span>
</div>
{%- if panel.sentences %}
<p><strong>Sentences:</strong></p>
{%- for sentence in panel.sentences %}
<p>{{ sentence.text }}</p>
<div>
    <span class="sentiment-box" style="background-color: {{ sentence.score.color }};">{{ sentence.score.text }}</span>
    <span class="sentiment-box" style="background-color: {{ sentence.magnitude.color }};">{{ sentence.magnitude.text }}</span>
</div>
{%- endfor %}
{%- endif %}
<h3>Score range</h3>
<div class="legend">
{%- for band in panel.legend %}
    <div style="background-color: {{ band.color }};"></div>
{%- endfor %}
</div>
<div class="legend-labels">
{%- for band in panel.legend %}
    <span>{{ band.text }}</span>
{%- endfor %}
</div>
{%- else %}
<p class="placeholder">{{ sections.sentiment.content }}</p>
{%- endif %}
</section>
{%- endif %}
{%- if show.moderation %}
<section>
<h2>Moderation</h2>
{%- if sections.moderation.status == "performed" %}
{%- for card in sections.moderation.content %}
<div class="moderation-card">
    <span class="category-name">{{ card.name }}</span>
    <span class="confidence">{{ card.confidence.text }}</span>
</div>
{%- endfor %}
{%- else %}
<p class="placeholder">{{ sections.moderation.content }}</p>
{%- endif %}
</section>
{%- endif %}
{%- if show.categories %}
<section>
<h2>Categories</h2>
{%- if sections.categories.status == "performed" %}
{%- for card in sections.categories.content.cards %}
<div class="category-card">
    <span class="category-name">{{ card.name }}</span>
    <span class="confidence">{{ card.confidence.text }}</span>
</div>
{%- endfor %}
<p><a href="{{ sections.categories.content.reference }}">See complete list of categories</a></p>
{%- else %}
<p class="placeholder">{{ sections.categories.content }}</p>
{%- endif %}
</section>
{%- endif %}
</body>
</html>
"#;

pub fn render_html(report: &Report, filter: &SectionFilter) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("report.html", REPORT_TEMPLATE)?;
    let template = env.get_template("report.html")?;

    let show: BTreeMap<String, bool> = SectionKind::ALL
        .into_iter()
        .map(|k| (k.title().to_ascii_lowercase(), filter.shows(k)))
        .collect();
    let warnings: Vec<String> = report.warnings.iter().map(|w| w.to_string()).collect();

    template.render(context! {
        sections => &report.sections,
        show => show,
        warnings => warnings,
    })
}

//! Shared building blocks for the HTML report: page shell, stat cards,
//! color scales and inline JSON embedding.

use maud::{html, Markup, PreEscaped, DOCTYPE};
use serde::Serialize;

/// Chart.js is loaded from its CDN; the report is otherwise self-contained.
pub const CHART_JS_CDN: &str = "https://cdn.jsdelivr.net/npm/chart.js";

const CSS_STYLES: &str = r#"
body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, Helvetica, Arial, sans-serif;
    margin: 0;
    background-color: #f4f6f8;
    color: #333;
    padding: 20px;
}
h1 {
    color: #3178c6;
    text-align: center;
}
h2 {
    border-bottom: 2px solid #3178c6;
    padding-bottom: 4px;
}
section {
    max-width: 1100px;
    margin: 0 auto 30px auto;
}
.stat-grid {
    display: grid;
    grid-template-columns: repeat(auto-fill, minmax(180px, 1fr));
    gap: 12px;
}
.stat-card {
    background-color: white;
    border-radius: 6px;
    box-shadow: 0 2px 8px rgba(0,0,0,0.08);
    padding: 12px 16px;
}
.stat-card .stat-label {
    font-size: 0.85em;
    color: #666;
}
.stat-card .stat-value {
    font-size: 1.4em;
    font-weight: bold;
}
.placeholder {
    color: #888;
    font-style: italic;
}
.chart-row {
    display: flex;
    flex-wrap: wrap;
    gap: 20px;
}
.chart-box {
    flex: 1 1 300px;
    background-color: white;
    border-radius: 6px;
    padding: 12px;
}
table {
    width: 100%;
    margin: 12px 0;
    border-collapse: collapse;
    background-color: white;
}
th, td {
    border: 1px solid #ddd;
    padding: 8px 10px;
    text-align: left;
}
th {
    background-color: #3178c6;
    color: white;
    position: relative;
}
tr:nth-child(even) {
    background-color: #f9f9f9;
}
.insights li {
    list-style: none;
    margin: 6px 0;
    padding: 8px 12px;
    border-left: 5px solid;
    background-color: white;
}
.severity-high { border-color: #d73a49; }
.severity-medium { border-color: #f0ad4e; }
.severity-info { border-color: #3178c6; }
.severity-positive { border-color: #28a745; }
.sortable-header {
    cursor: pointer;
}
.sortable-header::after {
    content: '\25b2\25bc';
    font-size: 0.9em;
    margin-left: 7px;
    color: #a0cfff;
    position: absolute;
    right: 8px;
    top: 50%;
    transform: translateY(-50%);
}
.sortable-header.sort-asc::after {
    content: '\25b2';
    color: #ffffff;
}
.sortable-header.sort-desc::after {
    content: '\25bc';
    color: #ffffff;
}
"#;

const TABLE_SORTING_JS: &str = r###"
document.addEventListener('DOMContentLoaded', function() {
    const getCellValue = (tr, idx, type) => {
        const cell = tr.children[idx];
        if (type === 'number') {
            const num = parseFloat(cell.dataset.value || cell.textContent);
            return isNaN(num) ? -Infinity : num;
        }
        return cell.textContent.trim().toLowerCase();
    };

    const comparer = (idx, asc, type) => (a, b) => {
        const vA = getCellValue(a, idx, type);
        const vB = getCellValue(b, idx, type);
        const comparison = type === 'number' ? vA - vB : vA.toString().localeCompare(vB.toString());
        return asc ? comparison : -comparison;
    };

    document.querySelectorAll('.sortable-table .sortable-header').forEach(th => {
        th.addEventListener('click', () => {
            const table = th.closest('table');
            const tbody = table.querySelector('tbody');
            if (!tbody) return;

            const columnIndex = parseInt(th.dataset.columnIndex);
            const sortType = th.dataset.sortType || 'string';
            const asc = !th.classList.contains('sort-asc');
            table.querySelectorAll('.sortable-header').forEach(other => {
                other.classList.remove('sort-asc', 'sort-desc');
            });
            th.classList.add(asc ? 'sort-asc' : 'sort-desc');

            Array.from(tbody.querySelectorAll('tr'))
                .sort(comparer(columnIndex, asc, sortType))
                .forEach(tr => tbody.appendChild(tr));
        });
    });
});
"###;

/// Renders a full HTML document. `scripts` is emitted at the end of the body,
/// after Chart.js has been loaded.
pub fn render_html_doc(title_text: &str, body_content: Markup, scripts: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title_text) }
                style { (PreEscaped(CSS_STYLES)) }
                script src=(CHART_JS_CDN) {}
            }
            body {
                h1 { (title_text) }
                (body_content)
                script { (PreEscaped(TABLE_SORTING_JS)) }
                (scripts)
            }
        }
    }
    .into_string()
}

/// A labelled value box.
pub fn stat_card(label: &str, value: impl maud::Render) -> Markup {
    html! {
        div class="stat-card" {
            div class="stat-label" { (label) }
            div class="stat-value" { (value) }
        }
    }
}

/// Placeholder for a section that is absent or errored.
pub fn placeholder(what: &str, error: Option<&str>) -> Markup {
    html! {
        p class="placeholder" {
            @match error {
                Some(error) => { (what) " could not be analyzed: " (error) }
                None => { (what) " not found." }
            }
        }
    }
}

/// Serializes `value` for embedding inside a `<script>` element.
///
/// `</` is escaped so that string content can never close the element.
pub fn embed_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

/// Background color on a red to green scale for `value` within `ranges`.
pub fn get_metric_cell_style(value: f64, ranges: &MetricRanges) -> String {
    let normalized_value = if ranges.max == ranges.min {
        0.5
    } else {
        (value - ranges.min) / (ranges.max - ranges.min)
    };

    let score = if ranges.higher_is_better {
        normalized_value
    } else {
        1.0 - normalized_value
    };

    // 0 is red, 120 is green
    let hue = score * 120.0;
    format!("background-color: hsl({:.0}, 100%, 85%);", hue.clamp(0.0, 120.0))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricRanges {
    pub min: f64,
    pub max: f64,
    pub higher_is_better: bool,
}

impl MetricRanges {
    pub fn from_values(values: &[f64], higher_is_better: bool) -> Option<Self> {
        let (&first, rest) = values.split_first()?;
        let (min, max) = rest
            .iter()
            .fold((first, first), |(min, max), &v| (min.min(v), max.max(v)));
        Some(Self {
            min,
            max,
            higher_is_better,
        })
    }
}

/// Renders a definition list explaining the metrics shown in the report.
pub fn render_metric_explanation_list(explanations: &[(&str, &str)]) -> Markup {
    html! {
        h2 { "Metric Explanations" }
        ul {
            @for (metric, explanation) in explanations {
                li {
                    strong { (metric) ": " } (explanation)
                }
            }
        }
    }
}

//! Terminal output: a box-drawn insight table and a one-line summary.

use crate::insights::{Insight, Severity};
use prettytable::{format, Attr, Cell, Row, Table};

/// Maximum width for the message column before truncation.
const MAX_MESSAGE_WIDTH: usize = 90;

/// Truncates a message to at most [`MAX_MESSAGE_WIDTH`] characters, ending
/// in `...` when shortened.
#[must_use]
fn truncate_message(message: &str) -> String {
    if message.chars().count() > MAX_MESSAGE_WIDTH {
        let kept: String = message.chars().take(MAX_MESSAGE_WIDTH.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        message.to_string()
    }
}

#[must_use]
const fn severity_color(severity: Severity) -> Attr {
    match severity {
        Severity::High => Attr::ForegroundColor(prettytable::color::RED),
        Severity::Medium => Attr::ForegroundColor(prettytable::color::YELLOW),
        Severity::Info => Attr::ForegroundColor(prettytable::color::BLUE),
        Severity::Positive => Attr::ForegroundColor(prettytable::color::GREEN),
    }
}

fn count(insights: &[Insight], severity: Severity) -> usize {
    insights.iter().filter(|i| i.severity == severity).count()
}

/// Renders a single-line summary of the insights.
///
/// ```
/// use pkglens_core::cli_report::render_summary_line;
/// use pkglens_core::insights::{Insight, Severity};
///
/// let insights = vec![Insight::new("Great job!", Severity::Positive)];
/// assert_eq!(
///     render_summary_line(&insights),
///     "1 insight (0 high, 0 medium, 0 info, 1 positive)"
/// );
/// ```
#[must_use]
pub fn render_summary_line(insights: &[Insight]) -> String {
    let total = insights.len();
    format!(
        "{} insight{} ({} high, {} medium, {} info, {} positive)",
        total,
        if total == 1 { "" } else { "s" },
        count(insights, Severity::High),
        count(insights, Severity::Medium),
        count(insights, Severity::Info),
        count(insights, Severity::Positive),
    )
}

/// Renders insights as a table, most severe first. Insights of equal
/// severity keep their rule order.
#[must_use]
pub fn render_insight_table(insights: &[Insight]) -> String {
    let mut table = Table::new();
    table.set_format(
        format::FormatBuilder::new()
            .column_separator('│')
            .borders('│')
            .separator(
                format::LinePosition::Top,
                format::LineSeparator::new('─', '┬', '┌', '┐'),
            )
            .separator(
                format::LinePosition::Title,
                format::LineSeparator::new('═', '╪', '╞', '╡'),
            )
            .separator(
                format::LinePosition::Intern,
                format::LineSeparator::new('─', '┼', '├', '┤'),
            )
            .separator(
                format::LinePosition::Bottom,
                format::LineSeparator::new('─', '┴', '└', '┘'),
            )
            .padding(1, 1)
            .build(),
    );

    table.set_titles(Row::new(vec![
        Cell::new("Severity").with_style(Attr::Bold),
        Cell::new("Insight").with_style(Attr::Bold),
    ]));

    for severity in Severity::ALL {
        for insight in insights.iter().filter(|i| i.severity == severity) {
            table.add_row(Row::new(vec![
                Cell::new(severity.label()).with_style(severity_color(severity)),
                Cell::new(&truncate_message(&insight.message)),
            ]));
        }
    }

    table.to_string()
}

//! Plain-text rendering for the terminal

use std::fmt::Write;

use crate::advisor::Assessment;
use crate::database::CacheEntry;
use crate::models::{Company, FinancialRecord};
use crate::normalizer::{format_amount, format_metric, MetricTable};

const UNAVAILABLE_MARK: &str = "*";

/// Metrics as rows, periods as columns; unreported cells are starred
pub fn render_table(company: &Company, table: &MetricTable) -> String {
    let labels = table.labels();
    let metric_width = table
        .metrics()
        .iter()
        .map(|m| m.display_name().chars().count())
        .max()
        .unwrap_or(0)
        .max("Metric".len());

    let rows: Vec<(String, Vec<String>)> = table
        .metrics()
        .iter()
        .map(|metric| {
            let cells = table
                .row(*metric)
                .into_iter()
                .map(|(_, cell)| {
                    let text = format_metric(*metric, cell.value);
                    if cell.available {
                        text
                    } else {
                        format!("{}{}", text, UNAVAILABLE_MARK)
                    }
                })
                .collect();
            (metric.display_name().to_string(), cells)
        })
        .collect();

    let column_widths: Vec<usize> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            rows.iter()
                .map(|(_, cells)| cells[i].chars().count())
                .chain(std::iter::once(label.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", company.name, company.code);

    let _ = write!(out, "{:<width$}", "Metric", width = metric_width);
    for (label, width) in labels.iter().zip(&column_widths) {
        let _ = write!(out, "  {:>width$}", label, width = *width);
    }
    out.push('\n');

    let mut any_unavailable = false;
    for (name, cells) in &rows {
        let _ = write!(out, "{:<width$}", name, width = metric_width);
        for (cell, width) in cells.iter().zip(&column_widths) {
            any_unavailable |= cell.ends_with(UNAVAILABLE_MARK);
            let _ = write!(out, "  {:>width$}", cell, width = *width);
        }
        out.push('\n');
    }

    if any_unavailable {
        let _ = writeln!(out, "{} not reported by the provider; shown as zero", UNAVAILABLE_MARK);
    }
    out
}

/// One cached record followed by its pre-screen flags
pub fn render_record(record: &FinancialRecord, assessment: &Assessment) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}) {}",
        record.company_name, record.company_code, record.period_label
    );
    let _ = writeln!(out, "  Debt Ratio:           {:.2}%", record.debt_ratio);
    let _ = writeln!(out, "  Operating Cash Flow:  {}", format_amount(record.operating_cash_flow));
    let _ = writeln!(out, "  Total Assets:         {}", format_amount(record.total_assets));
    let _ = writeln!(out, "  Revenue:              {}", format_amount(record.revenue));

    if assessment.is_clear() {
        let _ = writeln!(out, "✅ No pre-screen flags");
    } else {
        for flag in &assessment.flags {
            let _ = writeln!(out, "⚠️  {}", flag);
        }
    }
    out
}

pub fn render_cache_entries(entries: &[CacheEntry]) -> String {
    if entries.is_empty() {
        return "Cache is empty\n".to_string();
    }

    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(
            out,
            "{:<12} {:<24} {:>3} periods, latest {} (updated {})",
            entry.company_code,
            entry.company_name,
            entry.periods,
            entry.latest_period,
            entry.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    out
}

//! Output Formatting
//!
//! Human-readable terminal tables for an aggregate report:
//! - One section per operation with a comparison table per file
//! - Overall ranking across every measured group
//! - Errors and skipped entries with their reasons
//! - Coverage summary

use std::collections::BTreeSet;
use wavebench_core::Format;
use wavebench_ipc::Operation;
use wavebench_report::{
    AggregateReport, GroupTable, format_bytes, format_duration_ms, format_memory_kb,
    format_throughput,
};

const RULE_WIDTH: usize = 72;
const MAX_ERROR_WIDTH: usize = 80;

/// Format a report for terminal display
pub fn format_human_output(report: &AggregateReport) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("Waveform Parser Benchmark Results\n");
    output.push_str(&"=".repeat(RULE_WIDTH));
    output.push_str("\n\n");

    if report.groups.is_empty() {
        output.push_str("No successful measurements.\n\n");
    }

    for operation in Operation::ALL {
        let groups: Vec<&GroupTable> = report
            .groups
            .iter()
            .filter(|g| g.operation == operation)
            .collect();
        if groups.is_empty() {
            continue;
        }

        output.push_str(&format!("{}\n", operation.title()));
        output.push_str(&"-".repeat(RULE_WIDTH));
        output.push('\n');
        for group in groups {
            push_group(&mut output, group);
        }
    }

    push_overall(&mut output, report);
    push_failures(&mut output, report);
    push_summary(&mut output, report);

    output
}

fn push_group(output: &mut String, group: &GroupTable) {
    output.push_str(&format!(
        "  {} ({}, {}, {})\n",
        group.file,
        group.format.label(),
        group.scale,
        format_bytes(group.file_size_bytes)
    ));

    let name_width = group
        .rows
        .iter()
        .map(|r| r.library.len())
        .max()
        .unwrap_or(0)
        .max("Library".len());

    output.push_str(&format!(
        "    {:>4}  {:<width$}  {:<8}  {:>22}  {:>10}  {:>9}  {:>12}\n",
        "Rank",
        "Library",
        "Language",
        "Mean ± Stdev",
        "Throughput",
        "Memory",
        "Relative",
        width = name_width
    ));

    for row in &group.rows {
        let relative = if row.rank == 1 {
            "fastest".to_string()
        } else {
            format!("{:.2}x slower", row.relative_factor)
        };
        output.push_str(&format!(
            "    {:>4}  {:<width$}  {:<8}  {:>22}  {:>10}  {:>9}  {:>12}\n",
            row.rank,
            row.library,
            row.language,
            format!(
                "{} ± {}",
                format_duration_ms(row.mean_time),
                format_duration_ms(row.stdev)
            ),
            format_throughput(row.throughput),
            format_memory_kb(row.memory),
            relative,
            width = name_width
        ));
    }
    output.push('\n');
}

fn push_overall(output: &mut String, report: &AggregateReport) {
    if report.overall.is_empty() {
        return;
    }

    output.push_str("Overall Ranking\n");
    output.push_str(&"-".repeat(RULE_WIDTH));
    output.push('\n');

    let name_width = report
        .overall
        .iter()
        .map(|r| r.library.len())
        .max()
        .unwrap_or(0)
        .max("Library".len());

    output.push_str(&format!(
        "  {:>4}  {:<width$}  {:<8}  {:>12}  {:>6}  {:>12}\n",
        "Rank",
        "Library",
        "Language",
        "Avg Time",
        "Files",
        "Relative",
        width = name_width
    ));
    for row in &report.overall {
        output.push_str(&format!(
            "  {:>4}  {:<width$}  {:<8}  {:>12}  {:>6}  {:>11.2}x\n",
            row.rank,
            row.library,
            row.language,
            format_duration_ms(row.avg_time),
            row.files_tested,
            row.relative_factor,
            width = name_width
        ));
    }
    output.push('\n');
}

fn push_failures(output: &mut String, report: &AggregateReport) {
    if report.failures.is_empty() {
        return;
    }

    output.push_str("Errors and Failures\n");
    output.push_str(&"-".repeat(RULE_WIDTH));
    output.push('\n');

    for failure in &report.failures {
        let kind = failure
            .error_kind
            .map(|k| k.to_string())
            .unwrap_or_else(|| failure.status.to_string());
        output.push_str(&format!(
            "  ✗ {}/{}/{} [{}]\n",
            failure.library, failure.operation, failure.file, kind
        ));
        output.push_str(&format!("      {}\n", truncate(&failure.error)));
    }
    output.push('\n');
}

fn push_summary(output: &mut String, report: &AggregateReport) {
    let coverage = &report.coverage;
    output.push_str("Summary\n");
    output.push_str(&"-".repeat(RULE_WIDTH));
    output.push('\n');
    output.push_str(&format!(
        "  {} entries: {} measured, {} errored, {} skipped\n",
        coverage.total, coverage.measured, coverage.errored, coverage.skipped
    ));

    for format in [Format::Vcd, Format::Fst] {
        let libraries: BTreeSet<&str> = report
            .groups
            .iter()
            .filter(|g| g.format == format)
            .flat_map(|g| g.rows.iter().map(|r| r.library.as_str()))
            .collect();
        if libraries.is_empty() {
            continue;
        }
        output.push_str(&format!(
            "  {} tested: {}\n",
            format.label(),
            libraries.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }
}

/// First line of a message, cut to the table width
fn truncate(message: &str) -> String {
    let line = message.lines().next().unwrap_or_default();
    if line.chars().count() <= MAX_ERROR_WIDTH && !message.contains('\n') {
        return line.to_string();
    }
    let cut: String = line.chars().take(MAX_ERROR_WIDTH - 3).collect();
    format!("{}...", cut)
}

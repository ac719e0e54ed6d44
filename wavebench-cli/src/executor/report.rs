//! Aggregation
//!
//! Pure function from Result Store records to the aggregate report. Nothing
//! depends on record order: groups, rows, rankings and failures are all sorted
//! by value and name, so reordering the store yields an identical report.
//!
//! ```text
//! records ──filter──► ok ──► per-record stats ──► (file, operation) groups ──► ranks
//!                      │                                   │
//!                      │                                   └──► overall ranking
//!                      └──► error / skipped ──► failure table + coverage
//! ```

use super::statistics::compute_statistics;
use fxhash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use wavebench_core::{Format, Operation, Scale};
use wavebench_report::{
    AggregateFilter, AggregateReport, BenchmarkRecord, Coverage, FailureRow, GroupRow,
    GroupTable, OverallRow,
};
use wavebench_stats::{SummaryStatistics, rank_ascending, throughput_mb_per_sec};

/// Groups sort by operation first so terminal sections follow the canonical order
type GroupKey = (Operation, Scale, Format, String);

struct Measured<'a> {
    record: &'a BenchmarkRecord,
    stats: SummaryStatistics,
}

/// Build the aggregate report
pub fn build_aggregate(records: &[BenchmarkRecord], filter: &AggregateFilter) -> AggregateReport {
    let selected: Vec<&BenchmarkRecord> = records.iter().filter(|r| filter.matches(r)).collect();

    let mut coverage = Coverage::default();
    for record in &selected {
        coverage.add(record.status());
    }

    let measured_records: Vec<&BenchmarkRecord> = selected
        .iter()
        .copied()
        .filter(|r| !r.samples().is_empty())
        .collect();
    let stats = compute_statistics(&measured_records);

    let mut grouped: BTreeMap<GroupKey, Vec<Measured<'_>>> = BTreeMap::new();
    for (record, stats) in measured_records.into_iter().zip(stats) {
        let Some(stats) = stats else { continue };
        grouped
            .entry((record.operation, record.scale, record.format, record.file.clone()))
            .or_default()
            .push(Measured { record, stats });
    }

    let groups: Vec<GroupTable> = grouped
        .into_iter()
        .map(|((operation, scale, format, file), members)| {
            build_group(operation, scale, format, file, members)
        })
        .collect();

    let overall = build_overall(&groups);

    let mut failures: Vec<FailureRow> = selected
        .iter()
        .filter_map(|record| {
            let error = record.error_message()?;
            Some(FailureRow {
                library: record.library.clone(),
                operation: record.operation,
                file: record.file.clone(),
                status: record.status(),
                error_kind: record.error_category(),
                error: error.to_string(),
            })
        })
        .collect();
    failures.sort_by(|a, b| {
        (&a.library, a.operation, &a.file).cmp(&(&b.library, b.operation, &b.file))
    });

    AggregateReport {
        filter: *filter,
        groups,
        overall,
        failures,
        coverage,
    }
}

fn build_group(
    operation: Operation,
    scale: Scale,
    format: Format,
    file: String,
    members: Vec<Measured<'_>>,
) -> GroupTable {
    // All records of one file were planned from the same input; take the
    // largest size seen so a hand-edited store still aggregates deterministically.
    let file_size_bytes = members
        .iter()
        .map(|m| m.record.file_size_bytes)
        .max()
        .unwrap_or(0);

    let by_library: FxHashMap<&str, &Measured<'_>> = members
        .iter()
        .map(|m| (m.record.library.as_str(), m))
        .collect();

    let ranked = rank_ascending(
        members
            .iter()
            .map(|m| (m.record.library.as_str(), m.stats.mean)),
    );

    let rows = ranked
        .into_iter()
        .filter_map(|position| {
            let member = by_library.get(position.key)?;
            Some(GroupRow {
                library: member.record.library.clone(),
                language: member.record.language.clone(),
                format: member.record.format,
                mean_time: member.stats.mean,
                stdev: member.stats.std_dev,
                median_time: member.stats.median,
                min_time: member.stats.min,
                max_time: member.stats.max,
                throughput: throughput_mb_per_sec(file_size_bytes, member.stats.mean),
                memory: member.record.peak_memory_kb(),
                rank: position.rank,
                relative_factor: position.relative_factor,
                samples: member.stats.sample_count,
            })
        })
        .collect();

    GroupTable {
        file,
        operation,
        scale,
        format,
        file_size_bytes,
        rows,
    }
}

#[derive(Default)]
struct LibraryTotals<'a> {
    language: &'a str,
    sum_ms: f64,
    groups: usize,
    files: BTreeSet<&'a str>,
}

/// Each library's average over the groups it measured; ranked like a group
fn build_overall(groups: &[GroupTable]) -> Vec<OverallRow> {
    let mut totals: BTreeMap<&str, LibraryTotals<'_>> = BTreeMap::new();
    for group in groups {
        for row in &group.rows {
            let entry = totals.entry(row.library.as_str()).or_default();
            entry.language = row.language.as_str();
            entry.sum_ms += row.mean_time;
            entry.groups += 1;
            entry.files.insert(group.file.as_str());
        }
    }

    let ranked = rank_ascending(
        totals
            .iter()
            .map(|(library, t)| (*library, t.sum_ms / t.groups as f64)),
    );

    ranked
        .into_iter()
        .filter_map(|position| {
            let t = totals.get(position.key)?;
            Some(OverallRow {
                library: position.key.to_string(),
                language: t.language.to_string(),
                avg_time: position.value,
                files_tested: t.files.len(),
                groups_measured: t.groups,
                relative_factor: position.relative_factor,
                rank: position.rank,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavebench_report::{ErrorCategory, Outcome, RecordStatus, SampleRecord};

    fn record(
        library: &str,
        file: &str,
        format: Format,
        operation: Operation,
        outcome: Outcome,
    ) -> BenchmarkRecord {
        BenchmarkRecord {
            library: library.to_string(),
            language: "rust".to_string(),
            format,
            operation,
            file: file.to_string(),
            scale: Scale::Small,
            file_size_bytes: 2 * 1024 * 1024,
            outcome,
        }
    }

    fn times(ms: &[f64]) -> Outcome {
        Outcome::Measured(
            ms.iter()
                .map(|&time_ms| SampleRecord {
                    time_ms,
                    memory_kb: Some(1024),
                })
                .collect(),
        )
    }

    fn fixture() -> Vec<BenchmarkRecord> {
        vec![
            record("a", "bench_small.vcd", Format::Vcd, Operation::FullParse, times(&[2.0])),
            record("b", "bench_small.vcd", Format::Vcd, Operation::FullParse, times(&[20.0])),
            record(
                "c",
                "bench_small.vcd",
                Format::Vcd,
                Operation::FullParse,
                Outcome::Failed {
                    category: ErrorCategory::Timeout,
                    message: "timed out after 60.0s".to_string(),
                },
            ),
            record("a", "bench_small.fst", Format::Fst, Operation::SignalList, times(&[4.0])),
            record(
                "d",
                "bench_small.fst",
                Format::Fst,
                Operation::SignalList,
                Outcome::Skipped {
                    reason: "not installed".to_string(),
                },
            ),
        ]
    }

    #[test]
    fn test_relative_factor_against_fastest() {
        let report = build_aggregate(&fixture(), &AggregateFilter::default());
        let group = report
            .group("bench_small.vcd", Operation::FullParse)
            .unwrap();

        assert_eq!(group.rows.len(), 2);
        let a = group.row("a").unwrap();
        let b = group.row("b").unwrap();
        assert_eq!(a.rank, 1);
        assert_eq!(a.relative_factor, 1.0);
        assert_eq!(b.rank, 2);
        assert!((b.relative_factor - 10.0).abs() < 1e-9);
        assert!((a.throughput.unwrap() - 1000.0).abs() < 1e-6);
        assert_eq!(a.memory, Some(1024));
    }

    #[test]
    fn test_errors_never_contribute_to_statistics() {
        let report = build_aggregate(&fixture(), &AggregateFilter::default());

        assert!(report.groups.iter().all(|g| g.row("c").is_none()));
        assert!(report.overall.iter().all(|o| o.library != "c"));
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].library, "c");
        assert_eq!(report.failures[0].status, RecordStatus::Error);
        assert_eq!(report.failures[1].status, RecordStatus::Skipped);
        assert_eq!(
            report.coverage,
            Coverage {
                total: 5,
                measured: 3,
                errored: 1,
                skipped: 1
            }
        );
    }

    #[test]
    fn test_sample_scenario() {
        let records = vec![record(
            "solo",
            "bench_small.vcd",
            Format::Vcd,
            Operation::FullParse,
            times(&[2.0, 2.0, 3.0]),
        )];
        let report = build_aggregate(&records, &AggregateFilter::default());
        let row = &report.groups[0].rows[0];

        assert!((row.mean_time - 2.33).abs() < 0.01);
        assert!((row.stdev - 0.577).abs() < 0.01);
        assert_eq!(row.rank, 1);
        assert_eq!(row.samples, 3);
    }

    #[test]
    fn test_order_independent() {
        let forward = fixture();
        let mut backward = fixture();
        backward.reverse();

        let a = build_aggregate(&forward, &AggregateFilter::default());
        let b = build_aggregate(&backward, &AggregateFilter::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_overall_ranking() {
        let report = build_aggregate(&fixture(), &AggregateFilter::default());

        assert_eq!(report.overall.len(), 2);
        let a = &report.overall[0];
        assert_eq!(a.library, "a");
        assert_eq!(a.rank, 1);
        assert_eq!(a.files_tested, 2);
        assert_eq!(a.groups_measured, 2);
        assert!((a.avg_time - 3.0).abs() < 1e-9);

        let b = &report.overall[1];
        assert_eq!(b.files_tested, 1);
        assert!((b.relative_factor - 20.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_filter_by_format() {
        let filter = AggregateFilter {
            scale: None,
            format: Some(Format::Fst),
        };
        let report = build_aggregate(&fixture(), &filter);

        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].format, Format::Fst);
        assert_eq!(report.coverage.total, 2);
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn test_groups_follow_operation_order() {
        let report = build_aggregate(&fixture(), &AggregateFilter::default());
        let ops: Vec<_> = report.groups.iter().map(|g| g.operation).collect();
        assert_eq!(ops, vec![Operation::FullParse, Operation::SignalList]);
    }
}

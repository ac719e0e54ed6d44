//! JSON Output

use crate::aggregate::AggregateReport;

/// Generate the prettified aggregate report
pub fn generate_json_report(report: &AggregateReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

//! CSV export of performance rows, in the column layout the collector
//! writes its `performance_data_*.csv` files with.

use crate::error::PerfdashError;
use crate::synth::model::PerformanceRecord;

/// Render performance rows as CSV with a header line.
pub fn performance_csv(records: &[PerformanceRecord]) -> Result<String, PerfdashError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    // An empty slice still gets a header.
    if records.is_empty() {
        writer.write_record([
            "id",
            "model",
            "prompt_tokens",
            "cached_tokens",
            "completion_tokens",
            "ttft_ms",
            "tpot_ms",
            "tps",
            "e2e_latency_ms",
            "arrival_time",
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| PerfdashError::Internal(format!("CSV flush failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| PerfdashError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: u64) -> PerformanceRecord {
        PerformanceRecord {
            id,
            model: "gpt-4o-2026-01-01".to_string(),
            prompt_tokens: 1200,
            cached_tokens: 800,
            completion_tokens: 300,
            ttft_ms: 92.4,
            tpot_ms: 18.6,
            tps: 68.5,
            e2e_latency_ms: 1285.7,
            arrival_time: "2026-02-01 10:00:00".to_string(),
        }
    }

    #[test]
    fn header_then_one_line_per_row() {
        let csv = performance_csv(&[row(1), row(2)]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,model,prompt_tokens,cached_tokens"));
        assert!(lines[1].starts_with("1,gpt-4o-2026-01-01,1200,800,300,92.4"));
        assert!(lines[2].ends_with("2026-02-01 10:00:00"));
    }

    #[test]
    fn empty_input_still_has_header() {
        let csv = performance_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.starts_with("id,model"));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ModelbenchError, Result};

/// Memory readings for every target of one sampling session.
///
/// Readings are in bytes and stored in the order they were taken. A target
/// that was never successfully read keeps an empty sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSeries {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Number of completed polling passes over the target set
    #[serde(default)]
    pub passes: u64,
    /// Whether the session ended because its timeout expired
    #[serde(default)]
    pub timed_out: bool,
    readings: BTreeMap<u32, Vec<u64>>,
}

/// Aggregates for a single target, as shown in reports.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSummary {
    pub pid: u32,
    pub samples: usize,
    pub peak: Option<u64>,
    pub average: Option<f64>,
}

impl SampleSeries {
    pub fn new<I>(session_id: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        Self {
            session_id: session_id.into(),
            started_at: Utc::now(),
            finished_at: None,
            passes: 0,
            timed_out: false,
            readings: targets.into_iter().map(|pid| (pid, Vec::new())).collect(),
        }
    }

    /// Appends a reading for `pid`. Readings for pids outside the session are ignored.
    pub fn record(&mut self, pid: u32, bytes: u64) {
        if let Some(readings) = self.readings.get_mut(&pid) {
            readings.push(bytes);
        }
    }

    pub fn finish(&mut self, timed_out: bool) {
        self.finished_at = Some(Utc::now());
        self.timed_out = timed_out;
    }

    pub fn targets(&self) -> impl Iterator<Item = u32> + '_ {
        self.readings.keys().copied()
    }

    pub fn readings(&self, pid: u32) -> Result<&[u64]> {
        self.readings
            .get(&pid)
            .map(Vec::as_slice)
            .ok_or(ModelbenchError::UnknownTarget(pid))
    }

    /// Highest reading for `pid`.
    ///
    /// # Errors
    ///
    /// `UnknownTarget` if `pid` was not sampled, `EmptySeries` if it was but
    /// no reading ever succeeded.
    pub fn peak(&self, pid: u32) -> Result<u64> {
        self.readings(pid)?
            .iter()
            .copied()
            .max()
            .ok_or(ModelbenchError::EmptySeries(pid))
    }

    pub fn average(&self, pid: u32) -> Result<f64> {
        let readings = self.readings(pid)?;
        if readings.is_empty() {
            return Err(ModelbenchError::EmptySeries(pid));
        }
        let total: u128 = readings.iter().map(|&r| r as u128).sum();
        Ok(total as f64 / readings.len() as f64)
    }

    pub fn summaries(&self) -> Vec<TargetSummary> {
        self.readings
            .iter()
            .map(|(&pid, readings)| TargetSummary {
                pid,
                samples: readings.len(),
                peak: self.peak(pid).ok(),
                average: self.average(pid).ok(),
            })
            .collect()
    }

    /// Sum of per-target peaks, skipping targets with no readings.
    pub fn total_peak(&self) -> u64 {
        self.readings
            .values()
            .filter_map(|readings| readings.iter().copied().max())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series_with(pid: u32, readings: &[u64]) -> SampleSeries {
        let mut series = SampleSeries::new("test", [pid]);
        for &r in readings {
            series.record(pid, r);
        }
        series
    }

    #[test]
    fn test_new_series_has_empty_sequence_per_target() {
        let series = SampleSeries::new("test", [1, 2, 3]);
        assert_eq!(series.targets().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(series.readings(2).unwrap().is_empty());
    }

    #[test]
    fn test_peak_of_known_sequence() {
        let series = series_with(111, &[100, 150, 120]);
        assert_eq!(series.peak(111).unwrap(), 150);
    }

    #[test]
    fn test_average_of_known_sequence() {
        let series = series_with(111, &[100, 150, 120]);
        assert!((series.average(111).unwrap() - 123.333).abs() < 0.001);
    }

    #[test]
    fn test_peak_on_empty_sequence_fails() {
        let series = SampleSeries::new("test", [7]);
        assert!(matches!(series.peak(7), Err(ModelbenchError::EmptySeries(7))));
        assert!(matches!(
            series.average(7),
            Err(ModelbenchError::EmptySeries(7))
        ));
    }

    #[test]
    fn test_peak_on_unknown_target_fails() {
        let series = series_with(1, &[10]);
        assert!(matches!(
            series.peak(2),
            Err(ModelbenchError::UnknownTarget(2))
        ));
    }

    #[test]
    fn test_record_preserves_order() {
        let series = series_with(5, &[3, 1, 2]);
        assert_eq!(series.readings(5).unwrap(), &[3, 1, 2]);
    }

    #[test]
    fn test_record_ignores_unknown_pid() {
        let mut series = SampleSeries::new("test", [1]);
        series.record(2, 100);
        assert!(series.readings(2).is_err());
        assert!(series.readings(1).unwrap().is_empty());
    }

    #[test]
    fn test_summaries_report_missing_data_as_none() {
        let mut series = SampleSeries::new("test", [1, 2]);
        series.record(1, 50);

        let summaries = series.summaries();
        assert_eq!(summaries[0].peak, Some(50));
        assert_eq!(summaries[0].samples, 1);
        assert_eq!(summaries[1].peak, None);
        assert_eq!(summaries[1].average, None);
    }

    #[test]
    fn test_total_peak_sums_targets_with_data() {
        let mut series = SampleSeries::new("test", [1, 2, 3]);
        series.record(1, 10);
        series.record(1, 30);
        series.record(2, 5);

        assert_eq!(series.total_peak(), 35);
    }

    #[test]
    fn test_series_json_keeps_integer_targets() {
        let series = series_with(42, &[1, 2]);
        let json = serde_json::to_string(&series).unwrap();
        assert!(json.contains("\"42\":[1,2]"));

        let restored: SampleSeries = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, series);
    }
}

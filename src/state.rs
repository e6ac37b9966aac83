//! Per-metric daily alert quota state

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::sampler::Metric;

/// Tracks how many alerts each metric has fired today.
///
/// Counts increment on every alert-worthy event, whether or not delivery
/// ultimately succeeds, and reset to zero once per calendar day.
#[derive(Debug)]
pub struct AlertQuotas {
    counts: HashMap<Metric, u32>,
    last_reset: NaiveDate,
}

impl AlertQuotas {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            counts: HashMap::new(),
            last_reset: today,
        }
    }

    /// Alerts fired for `metric` since the last daily reset
    pub fn sent_today(&self, metric: Metric) -> u32 {
        self.counts.get(&metric).copied().unwrap_or(0)
    }

    /// Record one fired alert for `metric`
    pub fn record_sent(&mut self, metric: Metric) {
        *self.counts.entry(metric).or_insert(0) += 1;
    }

    /// Zero all counters if the calendar date has changed since the last
    /// reset. Idempotent within a day: repeated calls with the same date do
    /// nothing. Returns whether a reset happened.
    pub fn reset_if_new_day(&mut self, today: NaiveDate) -> bool {
        if today == self.last_reset {
            return false;
        }
        self.counts.clear();
        self.last_reset = today;
        true
    }
}

/// Thread-safe quota handle shared by the metric loops and the reset loop
pub type QuotaHandle = Arc<RwLock<AlertQuotas>>;

pub fn new_quota_handle(today: NaiveDate) -> QuotaHandle {
    Arc::new(RwLock::new(AlertQuotas::new(today)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    #[test]
    fn counts_start_at_zero() {
        let quotas = AlertQuotas::new(day(14));
        assert_eq!(quotas.sent_today(Metric::Disk), 0);
        assert_eq!(quotas.sent_today(Metric::Cpu), 0);
        assert_eq!(quotas.sent_today(Metric::Memory), 0);
    }

    #[test]
    fn record_sent_increments_only_that_metric() {
        let mut quotas = AlertQuotas::new(day(14));
        quotas.record_sent(Metric::Disk);
        quotas.record_sent(Metric::Disk);
        quotas.record_sent(Metric::Cpu);

        assert_eq!(quotas.sent_today(Metric::Disk), 2);
        assert_eq!(quotas.sent_today(Metric::Cpu), 1);
        assert_eq!(quotas.sent_today(Metric::Memory), 0);
    }

    #[test]
    fn reset_clears_counts_on_date_change() {
        let mut quotas = AlertQuotas::new(day(14));
        quotas.record_sent(Metric::Memory);
        quotas.record_sent(Metric::Memory);

        assert!(quotas.reset_if_new_day(day(15)));
        assert_eq!(quotas.sent_today(Metric::Memory), 0);
    }

    #[test]
    fn reset_is_idempotent_within_a_day() {
        let mut quotas = AlertQuotas::new(day(14));
        assert!(!quotas.reset_if_new_day(day(14)));

        quotas.record_sent(Metric::Disk);
        assert!(quotas.reset_if_new_day(day(15)));
        quotas.record_sent(Metric::Disk);

        // Same day again: counters must survive
        assert!(!quotas.reset_if_new_day(day(15)));
        assert_eq!(quotas.sent_today(Metric::Disk), 1);
    }
}

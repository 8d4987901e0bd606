//! Proxy balancer line tracking.
//!
//! `mod_proxy_balancer` reports a two-level hierarchy through flat keys of
//! the form `ProxyBalancer[i]Name` and `ProxyBalancer[i]Worker[j]Field`.
//! The numeric indices only order lines within one scrape, so the tracker
//! keeps the most recently seen balancer and worker names and attributes
//! subsequent field lines to that pair.

use crate::snapshot::BalancerWorker;

const BALANCER_PREFIX: &str = "ProxyBalancer[";
const WORKER_MARKER: &str = "]Worker[";

/// A recognized field within the proxy balancer key family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BalancerField {
    /// `ProxyBalancer[i]Name` — starts a new balancer context.
    BalancerName,
    /// `ProxyBalancer[i]Worker[j]Name` — starts a new worker context.
    WorkerName,
    /// Worker status string.
    Status,
    /// Requests elected to the worker.
    Elected,
    /// Requests currently in flight.
    Busy,
    /// Kilobytes sent (value may carry a `k`/`K` suffix).
    Sent,
    /// Kilobytes received (value may carry a `k`/`K` suffix).
    Rcvd,
}

impl BalancerField {
    /// Classifies a key within the indexed balancer family.
    ///
    /// Returns `None` for keys outside the family, and for family keys
    /// whose trailing field name is not modeled here.
    pub(crate) fn classify(key: &str) -> Option<Self> {
        if !key.starts_with(BALANCER_PREFIX) {
            return None;
        }
        if key.ends_with("]Name") {
            if key.contains(WORKER_MARKER) {
                return Some(Self::WorkerName);
            }
            return Some(Self::BalancerName);
        }
        match key.rsplit(']').next() {
            Some("Status") => Some(Self::Status),
            Some("Elected") => Some(Self::Elected),
            Some("Busy") => Some(Self::Busy),
            Some("Sent") => Some(Self::Sent),
            Some("Rcvd") => Some(Self::Rcvd),
            _ => None,
        }
    }
}

/// Carry-over state for one scan of the status text.
///
/// Scoped to a single scrape; a fresh tracker is created per parse so
/// names can never leak between scrapes. Field lines arriving before any
/// name line attribute to empty-string identifiers rather than failing,
/// which keeps malformed input survivable.
#[derive(Debug, Default)]
pub(crate) struct BalancerTracker {
    balancer: String,
    worker: String,
    records: Vec<BalancerWorker>,
}

impl BalancerTracker {
    /// Enters a new balancer context and clears the worker context.
    pub(crate) fn enter_balancer(&mut self, name: &str) {
        self.balancer = name.to_string();
        self.worker.clear();
    }

    /// Enters a new worker context under the current balancer.
    pub(crate) fn enter_worker(&mut self, name: &str) {
        self.worker = name.to_string();
    }

    /// The record for the current (balancer, worker) pair, created on
    /// first use and kept in first-seen order.
    pub(crate) fn current(&mut self) -> &mut BalancerWorker {
        let position = self
            .records
            .iter()
            .position(|record| record.balancer == self.balancer && record.worker == self.worker);
        let index = match position {
            Some(index) => index,
            None => {
                self.records
                    .push(BalancerWorker::named(&self.balancer, &self.worker));
                self.records.len() - 1
            }
        };
        &mut self.records[index]
    }

    /// Consumes the tracker, yielding all records in first-seen order.
    pub(crate) fn into_records(self) -> Vec<BalancerWorker> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_family_keys() {
        assert_eq!(
            BalancerField::classify("ProxyBalancer[0]Name"),
            Some(BalancerField::BalancerName)
        );
        assert_eq!(
            BalancerField::classify("ProxyBalancer[0]Worker[1]Name"),
            Some(BalancerField::WorkerName)
        );
        assert_eq!(
            BalancerField::classify("ProxyBalancer[2]Worker[0]Elected"),
            Some(BalancerField::Elected)
        );
        assert_eq!(
            BalancerField::classify("ProxyBalancer[0]Worker[0]Rcvd"),
            Some(BalancerField::Rcvd)
        );
    }

    #[test]
    fn test_classify_rejects_foreign_keys() {
        assert_eq!(BalancerField::classify("Total Accesses"), None);
        assert_eq!(BalancerField::classify("ProxyBalancer[0]Unmodeled"), None);
    }

    #[test]
    fn test_worker_context_scoped_to_balancer() {
        let mut tracker = BalancerTracker::default();
        tracker.enter_balancer("balancer://a");
        tracker.enter_worker("http://w1");
        tracker.current().busy = Some(1.0);

        // A new balancer clears the worker context.
        tracker.enter_balancer("balancer://b");
        tracker.current().busy = Some(2.0);

        let records = tracker.into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].worker, "http://w1");
        assert_eq!(records[1].worker, "");
    }

    #[test]
    fn test_fields_without_name_line_use_empty_identifiers() {
        let mut tracker = BalancerTracker::default();
        tracker.current().elected = Some(3.0);

        let records = tracker.into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].balancer, "");
        assert_eq!(records[0].worker, "");
        assert_eq!(records[0].elected, Some(3.0));
    }

    #[test]
    fn test_repeated_fields_reuse_record() {
        let mut tracker = BalancerTracker::default();
        tracker.enter_balancer("balancer://a");
        tracker.enter_worker("http://w1");
        tracker.current().elected = Some(1.0);
        tracker.current().busy = Some(0.0);

        assert_eq!(tracker.into_records().len(), 1);
    }
}

//! Worker scoreboard decoding.
//!
//! `mod_status` packs the state of every worker slot into one string, one
//! character per slot. Decoding produces a histogram over the known status
//! labels. The full label set is always present, zeros included, because
//! downstream consumers rely on a stable set of time series.

use std::collections::BTreeMap;

/// Scoreboard character to status label, as published by `mod_status`.
const SCOREBOARD_LABELS: &[(char, &str)] = &[
    ('_', "idle"),
    ('S', "startup"),
    ('R', "read"),
    ('W', "reply"),
    ('K', "keepalive"),
    ('D', "dns"),
    ('C', "closing"),
    ('L', "logging"),
    ('G', "graceful_stop"),
    ('I', "idle_cleanup"),
    ('.', "open_slot"),
];

/// Histogram of worker slots by status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scoreboard {
    counts: BTreeMap<String, u64>,
}

impl Scoreboard {
    /// Decodes a scoreboard string into per-status counts.
    ///
    /// Every known label starts at zero, so the output key set is stable
    /// even when a status never occurs. A character outside the known
    /// alphabet counts under its literal character, which keeps the
    /// decoder total over any input.
    pub fn decode(input: &str) -> Self {
        let mut counts: BTreeMap<String, u64> = SCOREBOARD_LABELS
            .iter()
            .map(|(_, label)| ((*label).to_string(), 0))
            .collect();

        for slot in input.chars() {
            let label = SCOREBOARD_LABELS
                .iter()
                .find(|(ch, _)| *ch == slot)
                .map(|(_, label)| (*label).to_string())
                .unwrap_or_else(|| slot.to_string());
            *counts.entry(label).or_insert(0) += 1;
        }

        Self { counts }
    }

    /// Per-label counts in stable (sorted) order.
    pub fn counts(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }

    /// Total decoded slots; equals the input length in characters.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

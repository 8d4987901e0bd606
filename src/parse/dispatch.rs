//! Key dispatch and per-scrape accumulation.
//!
//! The dispatcher is a static lookup table from exact key to a handler
//! tag, plus the indexed proxy-balancer prefix family. Adding a new
//! recognized field is a data change in [`FIELD_TABLE`], not a new branch.
//! Unrecognized keys are ignored so that status-page fields not modeled
//! here stay forward-compatible.

use super::balancer::{BalancerField, BalancerTracker};
use super::scoreboard::Scoreboard;
use super::ParseError;
use crate::snapshot::{ConnectionCounts, CpuTotals, StatusSnapshot};

/// Handler tag for a recognized flat key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    ServerVersion,
    ServerMpm,
    GenerationConfig,
    GenerationMpm,
    Load1,
    Load5,
    Load15,
    AccessesTotal,
    KBytesTotal,
    DurationTotal,
    CpuUser,
    CpuChildrenUser,
    CpuSystem,
    CpuChildrenSystem,
    CpuLoad,
    Uptime,
    WorkersBusy,
    WorkersIdle,
    ProcessesAll,
    ProcessesStopping,
    ConnsTotal,
    ConnsWriting,
    ConnsKeepalive,
    ConnsClosing,
    Scoreboard,
}

/// Exact status keys and their handler tags.
const FIELD_TABLE: &[(&str, FieldKind)] = &[
    ("ServerVersion", FieldKind::ServerVersion),
    ("ServerMPM", FieldKind::ServerMpm),
    ("ParentServerConfigGeneration", FieldKind::GenerationConfig),
    ("ParentServerMPMGeneration", FieldKind::GenerationMpm),
    ("Load1", FieldKind::Load1),
    ("Load5", FieldKind::Load5),
    ("Load15", FieldKind::Load15),
    ("Total Accesses", FieldKind::AccessesTotal),
    ("Total kBytes", FieldKind::KBytesTotal),
    ("Total Duration", FieldKind::DurationTotal),
    ("CPUUser", FieldKind::CpuUser),
    ("CPUChildrenUser", FieldKind::CpuChildrenUser),
    ("CPUSystem", FieldKind::CpuSystem),
    ("CPUChildrenSystem", FieldKind::CpuChildrenSystem),
    ("CPULoad", FieldKind::CpuLoad),
    ("Uptime", FieldKind::Uptime),
    ("BusyWorkers", FieldKind::WorkersBusy),
    ("IdleWorkers", FieldKind::WorkersIdle),
    ("Processes", FieldKind::ProcessesAll),
    ("Stopping", FieldKind::ProcessesStopping),
    ("ConnsTotal", FieldKind::ConnsTotal),
    ("ConnsAsyncWriting", FieldKind::ConnsWriting),
    ("ConnsAsyncKeepAlive", FieldKind::ConnsKeepalive),
    ("ConnsAsyncClosing", FieldKind::ConnsClosing),
    ("Scoreboard", FieldKind::Scoreboard),
];

fn classify(key: &str) -> Option<FieldKind> {
    FIELD_TABLE
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, kind)| *kind)
}

/// Mutable accumulator for one scrape.
///
/// Created fresh per parse and discarded after [`finish`](Self::finish);
/// the balancer tracker's carry-over names therefore never leak across
/// scrapes.
#[derive(Debug, Default)]
pub(crate) struct ScrapeContext {
    snapshot: StatusSnapshot,
    cpu_user: f64,
    cpu_system: f64,
    cpu_seen: bool,
    connections: ConnectionCounts,
    connections_seen: bool,
    balancers: BalancerTracker,
}

impl ScrapeContext {
    /// Dispatches one parsed key/value pair.
    ///
    /// A numeric parse failure on a recognized field is fatal to the
    /// scrape; unrecognized keys return `Ok` untouched.
    pub(crate) fn apply(&mut self, key: &str, value: &str) -> Result<(), ParseError> {
        if let Some(kind) = classify(key) {
            return self.apply_field(kind, key, value);
        }
        if let Some(field) = BalancerField::classify(key) {
            return self.apply_balancer(field, key, value);
        }
        Ok(())
    }

    fn apply_field(&mut self, kind: FieldKind, key: &str, value: &str) -> Result<(), ParseError> {
        match kind {
            FieldKind::ServerVersion => {
                self.snapshot.server_version = Some(value.to_string());
                match encode_version(value) {
                    Some(encoded) => self.snapshot.version_num = Some(encoded),
                    None => tracing::warn!(value, "unparseable server version"),
                }
            }
            FieldKind::ServerMpm => self.snapshot.mpm = Some(value.to_string()),
            FieldKind::GenerationConfig => {
                self.snapshot.generation_config = Some(parse_number(key, value)?)
            }
            FieldKind::GenerationMpm => {
                self.snapshot.generation_mpm = Some(parse_number(key, value)?)
            }
            FieldKind::Load1 => self.snapshot.load_1m = Some(parse_number(key, value)?),
            FieldKind::Load5 => self.snapshot.load_5m = Some(parse_number(key, value)?),
            FieldKind::Load15 => self.snapshot.load_15m = Some(parse_number(key, value)?),
            FieldKind::AccessesTotal => {
                self.snapshot.accesses_total = Some(parse_number(key, value)?)
            }
            FieldKind::KBytesTotal => self.snapshot.kbytes_total = Some(parse_number(key, value)?),
            FieldKind::DurationTotal => {
                self.snapshot.duration_total = Some(parse_number(key, value)?)
            }
            FieldKind::CpuUser | FieldKind::CpuChildrenUser => {
                self.cpu_user += parse_number(key, value)?;
                self.cpu_seen = true;
            }
            FieldKind::CpuSystem | FieldKind::CpuChildrenSystem => {
                self.cpu_system += parse_number(key, value)?;
                self.cpu_seen = true;
            }
            FieldKind::CpuLoad => self.snapshot.cpu_load = Some(parse_number(key, value)?),
            FieldKind::Uptime => self.snapshot.uptime = Some(parse_number(key, value)?),
            FieldKind::WorkersBusy => self.snapshot.workers_busy = Some(parse_number(key, value)?),
            FieldKind::WorkersIdle => self.snapshot.workers_idle = Some(parse_number(key, value)?),
            FieldKind::ProcessesAll => {
                self.snapshot.processes_all = Some(parse_number(key, value)?)
            }
            FieldKind::ProcessesStopping => {
                self.snapshot.processes_stopping = Some(parse_number(key, value)?)
            }
            FieldKind::ConnsTotal => {
                self.connections.total = parse_number(key, value)?;
                self.connections_seen = true;
            }
            FieldKind::ConnsWriting => {
                self.connections.writing = parse_number(key, value)?;
                self.connections_seen = true;
            }
            FieldKind::ConnsKeepalive => {
                self.connections.keepalive = parse_number(key, value)?;
                self.connections_seen = true;
            }
            FieldKind::ConnsClosing => {
                self.connections.closing = parse_number(key, value)?;
                self.connections_seen = true;
            }
            FieldKind::Scoreboard => self.snapshot.scoreboard = Some(Scoreboard::decode(value)),
        }
        Ok(())
    }

    fn apply_balancer(
        &mut self,
        field: BalancerField,
        key: &str,
        value: &str,
    ) -> Result<(), ParseError> {
        match field {
            BalancerField::BalancerName => self.balancers.enter_balancer(value),
            BalancerField::WorkerName => self.balancers.enter_worker(value),
            BalancerField::Status => self.balancers.current().status = Some(value.to_string()),
            BalancerField::Elected => {
                self.balancers.current().elected = Some(parse_number(key, value)?)
            }
            BalancerField::Busy => self.balancers.current().busy = Some(parse_number(key, value)?),
            BalancerField::Sent => {
                let trimmed = value.trim_end_matches(['k', 'K']);
                self.balancers.current().sent_kbytes = Some(parse_number(key, trimmed)?);
            }
            BalancerField::Rcvd => {
                let trimmed = value.trim_end_matches(['k', 'K']);
                self.balancers.current().rcvd_kbytes = Some(parse_number(key, trimmed)?);
            }
        }
        Ok(())
    }

    /// Seals the accumulator into an immutable snapshot, applying the
    /// observed-flag suppression for the CPU and connection groups.
    pub(crate) fn finish(mut self) -> StatusSnapshot {
        if self.cpu_seen {
            self.snapshot.cpu = Some(CpuTotals {
                user: self.cpu_user,
                system: self.cpu_system,
            });
        }
        if self.connections_seen {
            self.snapshot.connections = Some(self.connections);
        }
        self.snapshot.balancer_workers = self.balancers.into_records();
        self.snapshot
    }
}

fn parse_number(key: &str, value: &str) -> Result<f64, ParseError> {
    value.parse().map_err(|source| ParseError::InvalidNumber {
        key: key.to_string(),
        value: value.to_string(),
        source,
    })
}

/// Encodes `Product/major.minor.patch (...)` as a sortable float.
///
/// The minor component is zero-padded to two digits and the patch to
/// three, so `Apache/2.4.23 (Unix)` becomes `2.04023` and version order
/// matches numeric order. Returns `None` when the value does not carry
/// all three components.
fn encode_version(raw: &str) -> Option<f64> {
    let release = raw.split('/').nth(1)?;
    let release = release.split(' ').next()?;
    let mut parts = release.split('.');
    let major = parts.next()?;
    let minor = parts.next()?;
    let patch = parts.next()?;
    format!("{}.{:0>2}{:0>3}", major, minor, patch).parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_encoding() {
        assert_eq!(encode_version("Apache/2.4.23 (Unix)"), Some(2.04023));
        assert_eq!(encode_version("Apache/2.4.23 (Unix) OpenSSL/1.0.2h"), Some(2.04023));
        assert_eq!(encode_version("Apache/2.10.3"), Some(2.10003));
    }

    #[test]
    fn test_version_encoding_rejects_short_values() {
        assert_eq!(encode_version("Apache/2.4"), None);
        assert_eq!(encode_version("nginx"), None);
        assert_eq!(encode_version(""), None);
    }

    #[test]
    fn test_unparseable_version_does_not_abort() {
        let mut context = ScrapeContext::default();
        context.apply("ServerVersion", "nginx").unwrap();

        let snapshot = context.finish();
        assert_eq!(snapshot.server_version.as_deref(), Some("nginx"));
        assert_eq!(snapshot.version_num, None);
    }

    #[test]
    fn test_cpu_fields_accumulate() {
        let mut context = ScrapeContext::default();
        context.apply("CPUUser", ".25").unwrap();
        context.apply("CPUChildrenUser", ".05").unwrap();
        context.apply("CPUSystem", ".15").unwrap();

        let snapshot = context.finish();
        let cpu = snapshot.cpu.unwrap();
        assert!((cpu.user - 0.30).abs() < 1e-9);
        assert!((cpu.system - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_cpu_absent_without_cpu_keys() {
        let mut context = ScrapeContext::default();
        context.apply("Total Accesses", "10").unwrap();
        assert_eq!(context.finish().cpu, None);
    }

    #[test]
    fn test_connections_default_zero_within_observed_group() {
        let mut context = ScrapeContext::default();
        context.apply("ConnsTotal", "7").unwrap();

        let connections = context.finish().connections.unwrap();
        assert_eq!(connections.total, 7.0);
        assert_eq!(connections.writing, 0.0);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let mut context = ScrapeContext::default();
        context.apply("ReqPerSec", ".294382").unwrap();
        context.apply("CacheType", "SHMCB").unwrap();
        assert_eq!(context.finish(), StatusSnapshot::default());
    }

    #[test]
    fn test_invalid_number_is_fatal() {
        let mut context = ScrapeContext::default();
        let err = context.apply("Load1", "fast").unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { .. }));
    }

    #[test]
    fn test_sent_suffix_stripped() {
        let mut context = ScrapeContext::default();
        context.apply("ProxyBalancer[0]Worker[0]Sent", "5588K").unwrap();
        context.apply("ProxyBalancer[0]Worker[0]Rcvd", "8335k").unwrap();

        let records = context.finish().balancer_workers;
        assert_eq!(records[0].sent_kbytes, Some(5588.0));
        assert_eq!(records[0].rcvd_kbytes, Some(8335.0));
    }
}

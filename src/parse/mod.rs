//! Status text decoding.
//!
//! This module converts the machine-readable `mod_status` page into a
//! [`StatusSnapshot`]. The format is line-oriented: flat `key: value`
//! pairs, a packed scoreboard string, and implicitly-indexed keys for
//! proxy balancer workers. The decoder scans lines in order, feeding each
//! through the field splitter and the key dispatcher.
//!
//! Unrecognized keys never fail; a malformed numeric value in a
//! recognized field aborts the whole scrape, matching the contract that
//! every recognized numeric field must be well-formed.

mod balancer;
mod dispatch;
mod line;
mod scoreboard;

pub use line::split_field;
pub use scoreboard::Scoreboard;

use crate::snapshot::StatusSnapshot;
use dispatch::ScrapeContext;
use thiserror::Error;

/// Errors produced while decoding a status page.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A recognized field carried a value that is not a number.
    #[error("invalid numeric value {value:?} for key {key:?}")]
    InvalidNumber {
        /// The status key whose value failed to parse.
        key: String,
        /// The offending value text.
        value: String,
        /// The underlying float parse failure.
        source: std::num::ParseFloatError,
    },
}

/// Decodes one full status page into a snapshot.
///
/// Lines are processed in original order so the proxy balancer tracker
/// can attribute field lines to the most recently seen balancer and
/// worker names. Blank lines and section banners fall out as empty or
/// unrecognized keys.
pub fn parse_status(body: &str) -> Result<StatusSnapshot, ParseError> {
    let mut context = ScrapeContext::default();

    for raw_line in body.lines() {
        let (key, value) = split_field(raw_line);
        if key.is_empty() {
            continue;
        }
        context.apply(key, value)?;
    }

    Ok(context.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Status pages captured from real servers: Apache 2.4 with the event
    // MPM, the same with mod_proxy_balancer enabled, and a bare 2.2 page.
    const APACHE_24_EVENT: &str = "\
localhost
ServerVersion: Apache/2.4.23 (Unix)
ServerMPM: event
Server Built: Jul 29 2016 04:26:14
CurrentTime: Friday, 29-Jul-2016 14:06:15 UTC
RestartTime: Friday, 29-Jul-2016 13:58:49 UTC
ParentServerConfigGeneration: 1
ParentServerMPMGeneration: 0
ServerUptimeSeconds: 445
ServerUptime: 7 minutes 25 seconds
Load1: 0.02
Load5: 0.02
Load15: 0.00
Total Accesses: 131
Total kBytes: 138
Total Duration: 12930
CPUUser: .25
CPUSystem: .15
CPUChildrenUser: 0
CPUChildrenSystem: 0
CPULoad: .0898876
Uptime: 445
ReqPerSec: .294382
BytesPerSec: 317.555
BytesPerReq: 1078.72
DurationPerReq: 98.7022
BusyWorkers: 1
IdleWorkers: 74
Processes: 5
Stopping: 0
ConnsTotal: 0
ConnsAsyncWriting: 0
ConnsAsyncKeepAlive: 0
ConnsAsyncClosing: 0
Scoreboard: _W___
";

    const APACHE_24_PROXY: &str = "\
localhost
ServerVersion: Apache/2.4.23 (Unix)
ServerMPM: event
Total Accesses: 131
Uptime: 445
Scoreboard: _W___
ProxyBalancer[0]Name: balancer://myproxy1
ProxyBalancer[0]Worker[0]Name: https://app-01:9143
ProxyBalancer[0]Worker[0]Status: Init Ok
ProxyBalancer[0]Worker[0]Elected: 5808
ProxyBalancer[0]Worker[0]Busy: 0
ProxyBalancer[0]Worker[0]Sent: 5588K
ProxyBalancer[0]Worker[0]Rcvd: 8335K
ProxyBalancer[0]Worker[1]Name: https://app-02:9143
ProxyBalancer[0]Worker[1]Status: Init Ok
ProxyBalancer[0]Worker[1]Elected: 5722
ProxyBalancer[0]Worker[1]Busy: 0
ProxyBalancer[0]Worker[1]Sent: 5167K
ProxyBalancer[0]Worker[1]Rcvd: 8267K
ProxyBalancer[1]Name: balancer://myproxy2
ProxyBalancer[1]Worker[0]Name: https://app-01:8143
ProxyBalancer[1]Worker[0]Status: Init Ok
ProxyBalancer[1]Worker[0]Elected: 5808
ProxyBalancer[1]Worker[0]Busy: 0
ProxyBalancer[1]Worker[0]Sent: 5588K
ProxyBalancer[1]Worker[0]Rcvd: 8335K
ProxyBalancer[1]Worker[1]Name: https://app-02:8143
ProxyBalancer[1]Worker[1]Status: Init Ok
ProxyBalancer[1]Worker[1]Elected: 5722
ProxyBalancer[1]Worker[1]Busy: 0
ProxyBalancer[1]Worker[1]Sent: 5167K
ProxyBalancer[1]Worker[1]Rcvd: 8267K
";

    const APACHE_22: &str = "\
Total Accesses: 302311
Total kBytes: 1677830
CPULoad: 27.4052
Uptime: 45683
ReqPerSec: 6.61758
BytesPerSec: 37609.1
BytesPerReq: 5683.21
BusyWorkers: 2
IdleWorkers: 8
Scoreboard: _W_______K......
";

    #[test]
    fn test_apache_24_event_page() {
        let snapshot = parse_status(APACHE_24_EVENT).unwrap();

        assert_eq!(snapshot.server_version.as_deref(), Some("Apache/2.4.23 (Unix)"));
        assert_eq!(snapshot.version_num, Some(2.04023));
        assert_eq!(snapshot.mpm.as_deref(), Some("event"));
        assert_eq!(snapshot.generation_config, Some(1.0));
        assert_eq!(snapshot.generation_mpm, Some(0.0));
        assert_eq!(snapshot.load_1m, Some(0.02));
        assert_eq!(snapshot.load_15m, Some(0.0));
        assert_eq!(snapshot.accesses_total, Some(131.0));
        assert_eq!(snapshot.kbytes_total, Some(138.0));
        assert_eq!(snapshot.duration_total, Some(12930.0));
        assert_eq!(snapshot.uptime, Some(445.0));
        assert_eq!(snapshot.workers_busy, Some(1.0));
        assert_eq!(snapshot.workers_idle, Some(74.0));
        assert_eq!(snapshot.processes_all, Some(5.0));
        assert_eq!(snapshot.processes_stopping, Some(0.0));

        let cpu = snapshot.cpu.unwrap();
        assert!((cpu.user - 0.25).abs() < 1e-9);
        assert!((cpu.system - 0.15).abs() < 1e-9);
        assert_eq!(snapshot.cpu_load, Some(0.0898876));

        let connections = snapshot.connections.unwrap();
        assert_eq!(connections.total, 0.0);

        let scoreboard = snapshot.scoreboard.unwrap();
        assert_eq!(scoreboard.total(), 5);
        assert_eq!(scoreboard.counts()["reply"], 1);
        assert!(snapshot.balancer_workers.is_empty());
    }

    #[test]
    fn test_apache_22_page_suppresses_unsupported_groups() {
        let snapshot = parse_status(APACHE_22).unwrap();

        assert_eq!(snapshot.accesses_total, Some(302311.0));
        assert_eq!(snapshot.cpu_load, Some(27.4052));
        // 2.2 reports neither CPU time nor async connections.
        assert_eq!(snapshot.cpu, None);
        assert_eq!(snapshot.connections, None);
        assert_eq!(snapshot.server_version, None);
        assert_eq!(snapshot.version_num, None);
    }

    #[test]
    fn test_proxy_page_attributes_all_worker_pairs() {
        let snapshot = parse_status(APACHE_24_PROXY).unwrap();
        let records = &snapshot.balancer_workers;

        // Worker indices repeat across balancers; the (balancer, worker)
        // name pair is what identifies a record.
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].balancer, "balancer://myproxy1");
        assert_eq!(records[0].worker, "https://app-01:9143");
        assert_eq!(records[0].status.as_deref(), Some("Init Ok"));
        assert_eq!(records[0].elected, Some(5808.0));
        assert_eq!(records[0].busy, Some(0.0));
        assert_eq!(records[0].sent_kbytes, Some(5588.0));
        assert_eq!(records[0].rcvd_kbytes, Some(8335.0));

        assert_eq!(records[2].balancer, "balancer://myproxy2");
        assert_eq!(records[2].worker, "https://app-01:8143");
        assert_eq!(records[3].worker, "https://app-02:8143");
        assert_eq!(records[3].elected, Some(5722.0));
    }

    #[test]
    fn test_malformed_numeric_field_aborts_scrape() {
        let err = parse_status("Load5: quite high\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { ref key, .. } if key == "Load5"));
    }

    #[test]
    fn test_blank_lines_and_banners_ignored() {
        let snapshot = parse_status("\nlocalhost\n\nUptime: 10\n").unwrap();
        assert_eq!(snapshot.uptime, Some(10.0));
    }

    #[test]
    fn test_empty_page_yields_empty_snapshot() {
        assert_eq!(parse_status("").unwrap(), StatusSnapshot::default());
    }
}

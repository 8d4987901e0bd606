//! Point-in-time measurement snapshot.
//!
//! A [`StatusSnapshot`] is the immutable result of decoding one status
//! page. Every field is optional: a value is present only if the
//! corresponding key appeared in the scraped text, so downstream rendering
//! can distinguish "zero activity" from "field unsupported by this server
//! version or module set".

use crate::parse::Scoreboard;

/// Decoded contents of one `mod_status` page.
///
/// Produced by [`parse_status`](crate::parse::parse_status) and consumed by
/// [`MetricsRegistry::render`](crate::metrics::MetricsRegistry::render).
/// Nothing here outlives a single scrape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusSnapshot {
    /// Cumulative request count (`Total Accesses`).
    pub accesses_total: Option<f64>,
    /// Cumulative kilobytes sent (`Total kBytes`).
    pub kbytes_total: Option<f64>,
    /// Cumulative request duration in milliseconds (`Total Duration`).
    pub duration_total: Option<f64>,
    /// Server uptime in seconds (`Uptime`).
    pub uptime: Option<f64>,
    /// Accumulated CPU time, present iff any CPU field was observed.
    pub cpu: Option<CpuTotals>,
    /// Percentage CPU used across all workers (`CPULoad`).
    pub cpu_load: Option<f64>,
    /// One-minute load average (`Load1`).
    pub load_1m: Option<f64>,
    /// Five-minute load average (`Load5`).
    pub load_5m: Option<f64>,
    /// Fifteen-minute load average (`Load15`).
    pub load_15m: Option<f64>,
    /// Configuration restart generation (`ParentServerConfigGeneration`).
    pub generation_config: Option<f64>,
    /// MPM restart generation (`ParentServerMPMGeneration`).
    pub generation_mpm: Option<f64>,
    /// Workers currently serving a request (`BusyWorkers`).
    pub workers_busy: Option<f64>,
    /// Workers waiting for a request (`IdleWorkers`).
    pub workers_idle: Option<f64>,
    /// Total server processes (`Processes`).
    pub processes_all: Option<f64>,
    /// Processes that are shutting down (`Stopping`).
    pub processes_stopping: Option<f64>,
    /// Async connection counts, present iff any `Conns*` field was observed.
    pub connections: Option<ConnectionCounts>,
    /// Decoded worker-slot scoreboard, present iff `Scoreboard` was observed.
    pub scoreboard: Option<Scoreboard>,
    /// Raw `ServerVersion` string.
    pub server_version: Option<String>,
    /// Sortable numeric encoding of the server version (e.g. `2.04023`).
    pub version_num: Option<f64>,
    /// Raw `ServerMPM` string.
    pub mpm: Option<String>,
    /// Per-worker proxy balancer records, in first-seen order.
    pub balancer_workers: Vec<BalancerWorker>,
}

/// CPU time totals in seconds, summed over primary and children processes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuTotals {
    /// User-mode CPU time (`CPUUser` + `CPUChildrenUser`).
    pub user: f64,
    /// System-mode CPU time (`CPUSystem` + `CPUChildrenSystem`).
    pub system: f64,
}

/// Async connection counts by state.
///
/// Members that did not appear in an otherwise-observed group default to
/// zero, so the emitted label set stays complete and stable.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConnectionCounts {
    /// Total open connections (`ConnsTotal`).
    pub total: f64,
    /// Connections currently writing (`ConnsAsyncWriting`).
    pub writing: f64,
    /// Connections in keepalive (`ConnsAsyncKeepAlive`).
    pub keepalive: f64,
    /// Connections closing (`ConnsAsyncClosing`).
    pub closing: f64,
}

/// One backend target of a proxy balancer group.
///
/// Identified by the (balancer, worker) name pair; the numeric indices in
/// the source keys only order records within one scrape and are not kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalancerWorker {
    /// Balancer group name (e.g. `balancer://myproxy1`).
    pub balancer: String,
    /// Worker target name (e.g. `https://app-01:9143`).
    pub worker: String,
    /// Worker status string (e.g. `Init Ok`).
    pub status: Option<String>,
    /// Requests elected to this worker.
    pub elected: Option<f64>,
    /// Requests currently in flight.
    pub busy: Option<f64>,
    /// Kilobytes sent to the worker.
    pub sent_kbytes: Option<f64>,
    /// Kilobytes received from the worker.
    pub rcvd_kbytes: Option<f64>,
}

impl BalancerWorker {
    /// Creates an empty record for the given (balancer, worker) pair.
    pub fn named(balancer: &str, worker: &str) -> Self {
        Self {
            balancer: balancer.to_string(),
            worker: worker.to_string(),
            ..Self::default()
        }
    }
}

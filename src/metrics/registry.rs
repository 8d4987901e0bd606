//! Snapshot rendering into the Prometheus text format.

use crate::snapshot::StatusSnapshot;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, GaugeVec, IntCounter, Opts, Registry, TextEncoder,
};
use thiserror::Error;

/// Metric namespace prefix.
const NAMESPACE: &str = "apache";

const UP_HELP: &str = "Could the apache server be reached";

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Renders scrape outcomes as Prometheus exposition text.
///
/// Every call builds a fresh registry holding only the families present
/// in the snapshot, so metric values pass straight through from the
/// origin and suppressed groups (CPU, connections) simply never appear.
/// Only the scrape failure counter persists across scrapes.
pub struct MetricsRegistry {
    scrape_failures: IntCounter,
}

impl MetricsRegistry {
    /// Creates a registry with the persistent failure counter.
    pub fn new() -> Result<Self, MetricsError> {
        let scrape_failures = IntCounter::with_opts(opts(
            "exporter_scrape_failures_total",
            "Number of errors while scraping apache.",
        ))?;
        Ok(Self { scrape_failures })
    }

    /// Number of failed scrapes so far.
    pub fn scrape_failures(&self) -> u64 {
        self.scrape_failures.get()
    }

    /// Renders a successful scrape.
    pub fn render(&self, snapshot: &StatusSnapshot) -> Result<String, MetricsError> {
        let registry = Registry::new();
        registry.register(Box::new(self.scrape_failures.clone()))?;
        register_gauge(&registry, "up", UP_HELP, 1.0)?;

        if let Some(version) = snapshot.version_num {
            register_gauge(&registry, "version", "Apache server version", version)?;
        }

        let info = GaugeVec::new(
            opts("info", "Apache version information"),
            &["version", "mpm"],
        )?;
        info.with_label_values(&[
            snapshot.server_version.as_deref().unwrap_or("UNKNOWN"),
            snapshot.mpm.as_deref().unwrap_or("UNKNOWN"),
        ])
        .set(1.0);
        registry.register(Box::new(info))?;

        let mut generation = Vec::new();
        if let Some(value) = snapshot.generation_config {
            generation.push((vec!["config"], value));
        }
        if let Some(value) = snapshot.generation_mpm {
            generation.push((vec!["mpm"], value));
        }
        register_gauge_vec(
            &registry,
            "generation",
            "Apache restart generation",
            &["type"],
            &generation,
        )?;

        let mut load = Vec::new();
        if let Some(value) = snapshot.load_1m {
            load.push((vec!["1min"], value));
        }
        if let Some(value) = snapshot.load_5m {
            load.push((vec!["5min"], value));
        }
        if let Some(value) = snapshot.load_15m {
            load.push((vec!["15min"], value));
        }
        register_gauge_vec(&registry, "load", "Apache server load", &["interval"], &load)?;

        if let Some(value) = snapshot.accesses_total {
            register_counter(
                &registry,
                "accesses_total",
                "Current total apache accesses (*)",
                value,
            )?;
        }
        if let Some(value) = snapshot.kbytes_total {
            register_counter(
                &registry,
                "sent_kilobytes_total",
                "Current total kbytes sent (*)",
                value,
            )?;
        }
        if let Some(value) = snapshot.duration_total {
            register_counter(
                &registry,
                "duration_ms_total",
                "Total duration of all registered requests in ms",
                value,
            )?;
        }
        if let Some(value) = snapshot.uptime {
            register_counter(
                &registry,
                "uptime_seconds_total",
                "Current uptime in seconds (*)",
                value,
            )?;
        }

        if let Some(cpu) = &snapshot.cpu {
            // The source reports seconds; the exposed counters are ms.
            register_counter_vec(
                &registry,
                "cpu_time_ms_total",
                "Apache CPU time",
                &["type"],
                &[
                    (vec!["user"], 1000.0 * cpu.user),
                    (vec!["system"], 1000.0 * cpu.system),
                ],
            )?;
        }
        if let Some(value) = snapshot.cpu_load {
            register_gauge(
                &registry,
                "cpuload",
                "The current percentage CPU used by each worker and in total by all workers combined (*)",
                value,
            )?;
        }

        let mut workers = Vec::new();
        if let Some(value) = snapshot.workers_busy {
            workers.push((vec!["busy"], value));
        }
        if let Some(value) = snapshot.workers_idle {
            workers.push((vec!["idle"], value));
        }
        register_gauge_vec(
            &registry,
            "workers",
            "Apache worker statuses",
            &["state"],
            &workers,
        )?;

        let mut processes = Vec::new();
        if let Some(value) = snapshot.processes_all {
            processes.push((vec!["all"], value));
        }
        if let Some(value) = snapshot.processes_stopping {
            processes.push((vec!["stopping"], value));
        }
        register_gauge_vec(
            &registry,
            "processes",
            "Apache process count",
            &["state"],
            &processes,
        )?;

        if let Some(connections) = &snapshot.connections {
            register_gauge_vec(
                &registry,
                "connections",
                "Apache connection statuses",
                &["state"],
                &[
                    (vec!["total"], connections.total),
                    (vec!["writing"], connections.writing),
                    (vec!["keepalive"], connections.keepalive),
                    (vec!["closing"], connections.closing),
                ],
            )?;
        }

        if let Some(scoreboard) = &snapshot.scoreboard {
            let samples: Vec<(Vec<&str>, f64)> = scoreboard
                .counts()
                .iter()
                .map(|(state, count)| (vec![state.as_str()], *count as f64))
                .collect();
            register_gauge_vec(
                &registry,
                "scoreboard",
                "Apache scoreboard statuses",
                &["state"],
                &samples,
            )?;
        }

        let mut status = Vec::new();
        let mut elected = Vec::new();
        let mut busy = Vec::new();
        let mut sent = Vec::new();
        let mut rcvd = Vec::new();
        for record in &snapshot.balancer_workers {
            let pair = || vec![record.balancer.as_str(), record.worker.as_str()];
            if let Some(state) = &record.status {
                status.push((
                    vec![record.balancer.as_str(), record.worker.as_str(), state.as_str()],
                    1.0,
                ));
            }
            if let Some(value) = record.elected {
                elected.push((pair(), value));
            }
            if let Some(value) = record.busy {
                busy.push((pair(), value));
            }
            if let Some(value) = record.sent_kbytes {
                sent.push((pair(), value));
            }
            if let Some(value) = record.rcvd_kbytes {
                rcvd.push((pair(), value));
            }
        }
        register_gauge_vec(
            &registry,
            "proxy_balancer_status",
            "Apache Proxy Balancer Statuses",
            &["balancer", "worker", "status"],
            &status,
        )?;
        register_counter_vec(
            &registry,
            "proxy_balancer_accesses_total",
            "Apache Proxy Balancer Request Count",
            &["balancer", "worker"],
            &elected,
        )?;
        register_gauge_vec(
            &registry,
            "proxy_balancer_busy",
            "Apache Proxy Balancer Active Requests",
            &["balancer", "worker"],
            &busy,
        )?;
        register_counter_vec(
            &registry,
            "proxy_balancer_request_kbytes_total",
            "Apache Proxy Balancer Request Kilobytes",
            &["balancer", "worker"],
            &sent,
        )?;
        register_counter_vec(
            &registry,
            "proxy_balancer_response_kbytes_total",
            "Apache Proxy Balancer Response Kilobytes",
            &["balancer", "worker"],
            &rcvd,
        )?;

        encode(&registry)
    }

    /// Renders a failed scrape and bumps the failure counter.
    ///
    /// Only the liveness gauge and the failure counter are exposed, so
    /// consumers can distinguish "server unreachable" from "server
    /// reachable but metrics stale" without seeing stale values.
    pub fn render_failure(&self, reachable: bool) -> Result<String, MetricsError> {
        self.scrape_failures.inc();

        let registry = Registry::new();
        registry.register(Box::new(self.scrape_failures.clone()))?;
        register_gauge(&registry, "up", UP_HELP, if reachable { 1.0 } else { 0.0 })?;
        encode(&registry)
    }
}

fn opts(name: &str, help: &str) -> Opts {
    Opts::new(name, help).namespace(NAMESPACE)
}

fn register_gauge(
    registry: &Registry,
    name: &str,
    help: &str,
    value: f64,
) -> Result<(), prometheus::Error> {
    let gauge = Gauge::with_opts(opts(name, help))?;
    gauge.set(value);
    registry.register(Box::new(gauge))
}

fn register_counter(
    registry: &Registry,
    name: &str,
    help: &str,
    value: f64,
) -> Result<(), prometheus::Error> {
    let counter = Counter::with_opts(opts(name, help))?;
    counter.inc_by(value.max(0.0));
    registry.register(Box::new(counter))
}

fn register_gauge_vec(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
    samples: &[(Vec<&str>, f64)],
) -> Result<(), prometheus::Error> {
    if samples.is_empty() {
        return Ok(());
    }
    let vec = GaugeVec::new(opts(name, help), labels)?;
    for (label_values, value) in samples {
        vec.with_label_values(label_values).set(*value);
    }
    registry.register(Box::new(vec))
}

fn register_counter_vec(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
    samples: &[(Vec<&str>, f64)],
) -> Result<(), prometheus::Error> {
    if samples.is_empty() {
        return Ok(());
    }
    let vec = CounterVec::new(opts(name, help), labels)?;
    for (label_values, value) in samples {
        vec.with_label_values(label_values).inc_by(value.max(0.0));
    }
    registry.register(Box::new(vec))
}

fn encode(registry: &Registry) -> Result<String, MetricsError> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

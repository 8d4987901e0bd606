//! Prometheus exposition for scraped status pages.
//!
//! This module turns a [`StatusSnapshot`](crate::snapshot::StatusSnapshot)
//! into Prometheus text format and serves it over HTTP.
//!
//! # Metrics Exposed
//!
//! ## Liveness
//! - `apache_up` - Could the apache server be reached (1/0)
//! - `apache_exporter_scrape_failures_total` - Failed scrapes
//!
//! ## Server totals
//! - `apache_accesses_total` - Cumulative request count
//! - `apache_sent_kilobytes_total` - Cumulative kilobytes sent
//! - `apache_duration_ms_total` - Cumulative request duration
//! - `apache_uptime_seconds_total` - Server uptime
//! - `apache_cpu_time_ms_total{type}` - CPU time by user/system
//! - `apache_cpuload` - Percentage CPU across all workers
//!
//! ## Server state
//! - `apache_version` / `apache_info{version,mpm}` - Version information
//! - `apache_generation{type}` - Restart generations
//! - `apache_load{interval}` - Load averages
//! - `apache_workers{state}` / `apache_processes{state}` - Worker/process counts
//! - `apache_connections{state}` - Async connection counts
//! - `apache_scoreboard{state}` - Worker slots by scoreboard status
//!
//! ## Proxy balancer
//! - `apache_proxy_balancer_status{balancer,worker,status}`
//! - `apache_proxy_balancer_accesses_total{balancer,worker}`
//! - `apache_proxy_balancer_busy{balancer,worker}`
//! - `apache_proxy_balancer_request_kbytes_total{balancer,worker}`
//! - `apache_proxy_balancer_response_kbytes_total{balancer,worker}`
//!
//! Groups with an observed flag (CPU, connections) are only present when
//! the source reported them, and a failed scrape exposes nothing beyond
//! liveness, so absent never masquerades as zero.

mod registry;
mod server;

pub use registry::{MetricsError, MetricsRegistry};
pub use server::{MetricsServer, MetricsServerConfig, ServerError};

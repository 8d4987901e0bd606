//! Apache httpd Status Exporter Library
//!
//! Scrapes the machine-readable `mod_status` page of an Apache httpd
//! server and converts it into Prometheus metrics: request totals,
//! worker and process state, connection states, the worker scoreboard,
//! and proxy balancer health.
//!
//! # Architecture
//!
//! The system follows an explicit data flow:
//!
//! ```text
//! scraper (HTTP GET) → parse (lines → snapshot) → metrics (render + serve)
//! ```
//!
//! # Design Principles
//!
//! - **Pass-through values**: counters already accumulated by the origin
//!   server are exposed as-is, never recomputed across scrapes
//! - **Absent is not zero**: metric groups appear only when the source
//!   reported them, so unsupported fields never read as idle activity
//! - **Tolerant scanning**: unrecognized status keys are ignored, keeping
//!   the decoder forward-compatible with new server versions and modules
//! - **Strict values**: a malformed numeric value in a recognized field
//!   fails the whole scrape rather than surfacing partial data
//!
//! # Example
//!
//! ```
//! use apache_exporter::parse::parse_status;
//!
//! let snapshot = parse_status("Total Accesses: 131\nScoreboard: _W_\n").unwrap();
//!
//! assert_eq!(snapshot.accesses_total, Some(131.0));
//! assert_eq!(snapshot.scoreboard.unwrap().counts()["reply"], 1);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod metrics;
pub mod parse;
pub mod scraper;
pub mod snapshot;

// Re-export commonly used types at crate root
pub use metrics::{MetricsRegistry, MetricsServer, MetricsServerConfig};
pub use parse::{parse_status, Scoreboard};
pub use scraper::{FileConfig, ScrapeConfig, ScrapeError, StatusScraper};
pub use snapshot::{BalancerWorker, ConnectionCounts, CpuTotals, StatusSnapshot};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

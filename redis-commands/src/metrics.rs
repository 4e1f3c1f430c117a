//! Built-in histogram metrics, available with the `metrics` feature.

use histogram::Histogram;

use crate::client::CommandResult;

/// Latency and outcome counters for commands executed by a client. Not
/// registered globally; the caller decides how to expose them.
pub struct ClientMetrics {
    /// Request latency in nanoseconds.
    pub latency: Histogram,
    /// Total commands executed.
    pub requests: u64,
    /// Commands that failed for any reason.
    pub errors: u64,
    /// Commands the server answered with an error reply.
    pub server_errors: u64,
}

impl ClientMetrics {
    pub(crate) fn new() -> Self {
        Self {
            latency: new_histogram(),
            requests: 0,
            errors: 0,
            server_errors: 0,
        }
    }

    pub(crate) fn record(&mut self, result: &CommandResult) {
        self.requests += 1;
        let _ = self.latency.increment(result.latency_ns);
        if !result.success {
            self.errors += 1;
        }
        if result.server_error {
            self.server_errors += 1;
        }
    }
}

fn new_histogram() -> Histogram {
    match Histogram::new(7, 64) {
        Ok(histogram) => histogram,
        Err(_) => unreachable!("valid histogram configuration"),
    }
}

//! Prometheus counters for feed runs. Every hook is a no-op without the
//! `metrics` feature.

use crate::RunState;

#[cfg(feature = "metrics")]
mod registry {
    use lazy_static::lazy_static;
    use prometheus::{
        register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
        IntCounterVec, IntGauge,
    };

    lazy_static! {
        pub static ref TOKENS_READ: IntCounter = register_int_counter!(
            "transit_feed_tokens_total",
            "Total number of JSON tokens pulled from feeds"
        )
        .expect("register transit_feed_tokens_total");
        pub static ref RECORDS_EMITTED: IntCounter = register_int_counter!(
            "transit_feed_records_total",
            "Total number of records emitted"
        )
        .expect("register transit_feed_records_total");
        pub static ref RUNS: IntCounterVec = register_int_counter_vec!(
            "transit_feed_runs_total",
            "Feed runs by terminal state",
            &["state"]
        )
        .expect("register transit_feed_runs_total");
        pub static ref BUFFER_SIZE_GAUGE: IntGauge = register_int_gauge!(
            "transit_feed_buffer_size_bytes",
            "Current size of the tokenizer read buffer in bytes"
        )
        .expect("register transit_feed_buffer_size_bytes");
    }
}

pub(crate) fn inc_tokens() {
    #[cfg(feature = "metrics")]
    registry::TOKENS_READ.inc();
}

pub(crate) fn inc_records() {
    #[cfg(feature = "metrics")]
    registry::RECORDS_EMITTED.inc();
}

pub(crate) fn inc_runs(state: RunState) {
    #[cfg(feature = "metrics")]
    registry::RUNS.with_label_values(&[state.as_str()]).inc();
    #[cfg(not(feature = "metrics"))]
    let _ = state;
}

pub(crate) fn set_buffer_size(len: usize) {
    #[cfg(feature = "metrics")]
    registry::BUFFER_SIZE_GAUGE.set(len as i64);
    #[cfg(not(feature = "metrics"))]
    let _ = len;
}

/// Renders all registered metrics in the Prometheus text format.
#[cfg(feature = "metrics")]
pub fn gather_metrics() -> String {
    use prometheus::{Encoder, TextEncoder};

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::warn!(error = %e, "failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

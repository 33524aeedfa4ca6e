//! Optional metrics instrumentation.
//!
//! When the `observe` feature is enabled, subscriptions and writes emit
//! counters and histograms via the [`metrics`] crate. A downstream
//! application must install a metrics recorder to collect them.
//!
//! Without the feature every function here is a zero-cost no-op.

/// Record one applied change batch.
///
/// - `roomfeed.batches_applied_total` – counter
/// - `roomfeed.events_applied_total` – counter
/// - `roomfeed.batch_apply_duration_seconds` – histogram
#[inline]
pub fn record_batch_applied(duration: std::time::Duration, events: u64) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("roomfeed.batches_applied_total").increment(1);
        metrics::counter!("roomfeed.events_applied_total").increment(events);
        metrics::histogram!("roomfeed.batch_apply_duration_seconds")
            .record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (duration, events);
    }
}

/// - `roomfeed.subscriptions_opened_total` – counter
/// - `roomfeed.subscriptions_active` – gauge
#[inline]
pub fn record_subscription_opened() {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("roomfeed.subscriptions_opened_total").increment(1);
        metrics::gauge!("roomfeed.subscriptions_active").increment(1.0);
    }
}

/// - `roomfeed.subscriptions_active` – gauge
#[inline]
pub fn record_subscription_closed() {
    #[cfg(feature = "observe")]
    {
        metrics::gauge!("roomfeed.subscriptions_active").decrement(1.0);
    }
}

/// Record a subscription that ended on an error.
///
/// - `roomfeed.subscriptions_failed_total` – counter with `reason` label
#[inline]
pub fn record_subscription_failed(protocol_violation: bool) {
    #[cfg(feature = "observe")]
    {
        let reason = if protocol_violation { "protocol" } else { "feed" };
        metrics::counter!("roomfeed.subscriptions_failed_total", "reason" => reason).increment(1);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = protocol_violation;
    }
}

/// Record a document write and whether the store accepted it.
///
/// - `roomfeed.writes_total` – counter with `outcome` label
#[inline]
pub fn record_write(accepted: bool) {
    #[cfg(feature = "observe")]
    {
        let outcome = if accepted { "ok" } else { "rejected" };
        metrics::counter!("roomfeed.writes_total", "outcome" => outcome).increment(1);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = accepted;
    }
}
